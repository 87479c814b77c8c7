use std::env;
use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tokio::sync::{mpsc, watch};
use zbus::Connection;

use crate::config::Config;
use crate::constants::{BUS_NAME, BUS_PREFIX};
use crate::dbus::interface::manager::ManagerInterface;
use crate::input::manager::{Manager, ManagerCommand};
use crate::input::sample::GamepadSample;
use crate::input::source::evdev::GamepadDevice;
use crate::input::target::mouse::MouseDevice;

mod config;
mod constants;
mod dbus;
mod input;
mod watcher;

#[derive(Parser, Debug)]
#[command(name = "joymouse", version, about = "Gamepad-to-mouse daemon")]
struct Args {
    /// Gamepad event device to read from (e.g. /dev/input/event3).
    /// Defaults to the first gamepad found.
    #[arg(long)]
    device: Option<String>,
    /// Config file to use instead of the XDG default
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let args = Args::parse();

    let log_level = match env::var("LOG_LEVEL") {
        Ok(value) => value,
        Err(_) => "info".to_string(),
    };
    env::set_var("RUST_LOG", log_level);
    env_logger::init();
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    log::info!("Starting JoyMouse v{}", VERSION);

    // Load and normalize the configuration
    let config = Config::load(args.config.as_deref());

    // Find a gamepad to read samples from
    let Some(device_path) = args
        .device
        .clone()
        .or_else(crate::input::source::evdev::discover)
    else {
        log::error!("No gamepad device found. Connect one or pass --device.");
        return Err("no gamepad device found".into());
    };

    // Latest-sample channel between the gamepad reader and the manager
    let (sample_tx, sample_rx) = watch::channel(GamepadSample::default());
    let gamepad = GamepadDevice::new(&device_path, sample_tx)?;
    tokio::spawn(gamepad.run());

    // Virtual mouse the engine's commands are written to
    let mouse = MouseDevice::new()?;

    // The manager owns the engine and the sampling loop
    let mut manager = Manager::new(config, args.config.clone(), mouse, sample_rx);
    let manager_tx = manager.transmitter();

    // Stop on ctrl-c so held clicks are released before exit
    let tx = manager_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Shutting down");
            let _ = tx.send(ManagerCommand::Stop).await;
        }
    });

    // Watch the config directory so settings edits apply live
    if args.config.is_none() {
        watch_config(manager_tx.clone());
    }

    // Configure the DBus connection and expose the control interface
    let connection = Connection::session().await?;
    let iface = ManagerInterface::new(manager_tx.clone());
    let manager_path = format!("{}/Manager", BUS_PREFIX);
    connection.object_server().at(manager_path, iface).await?;

    let (run_result, request_name_result) = tokio::join!(
        // Run the sampling loop
        manager.run(),
        // Request the named bus
        connection.request_name(BUS_NAME)
    );

    if let Err(e) = request_name_result {
        log::warn!("Unable to claim {BUS_NAME} on the session bus: {e}");
    }
    run_result?;

    log::info!("JoyMouse stopped");

    Ok(())
}

/// Starts a watcher on the config directory that reloads the configuration
/// whenever the config file is rewritten.
fn watch_config(manager_tx: mpsc::Sender<ManagerCommand>) {
    let Some(config_dir) = config::config_dir() else {
        log::warn!("Unable to determine config directory; live reload disabled");
        return;
    };

    let (watcher_tx, mut watcher_rx) = mpsc::channel(32);
    let path = config_dir.display().to_string();
    tokio::task::spawn_blocking(move || {
        log::debug!("Started watcher thread");
        watcher::watch(path, watcher_tx)
    });

    tokio::spawn(async move {
        while let Some(event) = watcher_rx.recv().await {
            log::debug!("Received watch event: {:?}", event);
            match event {
                watcher::WatchEvent::Create { name, .. }
                | watcher::WatchEvent::Modify { name, .. }
                    if name == config::config_file_name() =>
                {
                    if let Err(e) = manager_tx.send(ManagerCommand::ReloadConfig).await {
                        log::error!("Unable to send command: {e:?}");
                    }
                }
                _ => (),
            }
        }
    });
}
