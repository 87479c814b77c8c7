use std::time::Duration;

use tokio::sync::mpsc;
use zbus::fdo;
use zbus_macros::interface;

use crate::input::manager::ManagerCommand;

/// The [ManagerInterface] provides a DBus interface that can be exposed for
/// controlling the [Manager]. It works by sending command messages to a
/// channel that the [Manager] is listening on, so settings surfaces and
/// global hotkey daemons on any thread can flip the master enable without
/// touching engine state directly.
pub struct ManagerInterface {
    tx: mpsc::Sender<ManagerCommand>,
}

impl ManagerInterface {
    pub fn new(tx: mpsc::Sender<ManagerCommand>) -> ManagerInterface {
        ManagerInterface { tx }
    }
}

#[interface(
    name = "org.shadowblip.JoyMouse.Manager",
    proxy(
        default_service = "org.shadowblip.JoyMouse",
        default_path = "/org/shadowblip/JoyMouse/Manager"
    )
)]
impl ManagerInterface {
    #[zbus(property)]
    async fn version(&self) -> fdo::Result<String> {
        const VERSION: &str = env!("CARGO_PKG_VERSION");
        Ok(VERSION.to_string())
    }

    /// Whether gamepad-to-mouse translation is enabled at all. The in-game
    /// latch button only works while this is true.
    #[zbus(property)]
    async fn enabled(&self) -> fdo::Result<bool> {
        let (sender, mut receiver) = mpsc::channel(1);
        self.tx
            .send_timeout(
                ManagerCommand::GetEnabled { sender },
                Duration::from_millis(500),
            )
            .await
            .map_err(|err| fdo::Error::Failed(err.to_string()))?;

        // Read the response from the manager
        let Some(enabled) = receiver.recv().await else {
            return Err(fdo::Error::Failed("No response from manager".to_string()));
        };
        Ok(enabled)
    }

    #[zbus(property)]
    async fn set_enabled(&self, value: bool) -> zbus::Result<()> {
        self.tx
            .send_timeout(
                ManagerCommand::SetEnabled(value),
                Duration::from_millis(500),
            )
            .await
            .map_err(|err| zbus::Error::Failure(err.to_string()))?;
        Ok(())
    }

    /// Reload the configuration from disk
    async fn reload_config(&self) -> fdo::Result<()> {
        self.tx
            .send_timeout(ManagerCommand::ReloadConfig, Duration::from_millis(500))
            .await
            .map_err(|err| fdo::Error::Failed(err.to_string()))?;
        Ok(())
    }

    /// Stop the daemon, releasing any held synthetic buttons
    async fn stop(&self) -> fdo::Result<()> {
        self.tx
            .send_timeout(ManagerCommand::Stop, Duration::from_millis(500))
            .await
            .map_err(|err| fdo::Error::Failed(err.to_string()))?;
        Ok(())
    }
}
