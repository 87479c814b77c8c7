use inotify::{EventMask, Inotify, WatchMask};
use tokio::sync::mpsc::Sender;

#[derive(Debug, Clone)]
pub enum WatchEvent {
    Create { name: String, base_path: String },
    Modify { name: String, base_path: String },
    Delete { name: String, base_path: String },
}

/// Watch for filesystem changes on the given path, sending [WatchEvent]
/// to the given channel. Runs blocking reads, so callers should put this
/// on a blocking task.
pub fn watch(path: String, tx: Sender<WatchEvent>) {
    let mut inotify = Inotify::init().expect("Failed to initialize inotify");

    if let Err(e) = inotify.watches().add(
        path.clone(),
        WatchMask::CREATE | WatchMask::DELETE | WatchMask::CLOSE_WRITE | WatchMask::MOVED_TO,
    ) {
        log::error!("Unable to add inotify watcher for path: {path}. Got error {e:?}");
        return;
    }

    // Listen for watch events
    let mut buffer = [0u8; 4096];
    loop {
        let events = inotify
            .read_events_blocking(&mut buffer)
            .expect("Failed to read inotify events");

        for event in events {
            let Some(name) = event.name.and_then(|n| n.to_str()).map(String::from) else {
                continue;
            };

            if event.mask.contains(EventMask::CREATE) || event.mask.contains(EventMask::MOVED_TO) {
                log::debug!("inotify CREATE: {name:?}");
                let value = WatchEvent::Create {
                    name,
                    base_path: path.clone(),
                };
                if let Err(e) = tx.blocking_send(value) {
                    log::error!("Error sending event: {e}");
                }
            } else if event.mask.contains(EventMask::CLOSE_WRITE) {
                log::debug!("inotify CLOSE_WRITE: {name:?}");
                let value = WatchEvent::Modify {
                    name,
                    base_path: path.clone(),
                };
                if let Err(e) = tx.blocking_send(value) {
                    log::error!("Error sending event: {e}");
                }
            } else if event.mask.contains(EventMask::DELETE) {
                log::debug!("inotify DELETE: {name:?}");
                let value = WatchEvent::Delete {
                    name,
                    base_path: path.clone(),
                };
                if let Err(e) = tx.blocking_send(value) {
                    log::error!("Error sending event: {e}");
                }
            }
        }
    }
}
