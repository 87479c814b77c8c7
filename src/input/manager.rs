use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::config::Config;
use crate::constants::SAMPLE_RATE_HZ;
use crate::input::command::OutputCommand;
use crate::input::engine::Engine;
use crate::input::sample::GamepadSample;
use crate::input::target::mouse::MouseDevice;

const BUFFER_SIZE: usize = 64;

/// ManagerCommand messages define all the different ways to interact with
/// [Manager] over a channel. Control surfaces (DBus, the config watcher,
/// signal handlers) send these; the manager applies them between sample
/// ticks so engine state is never touched from another task.
#[derive(Debug)]
pub enum ManagerCommand {
    SetEnabled(bool),
    GetEnabled { sender: mpsc::Sender<bool> },
    ReloadConfig,
    Stop,
}

/// Owns the translation [Engine] and the sampling loop.
///
/// Ticks at [SAMPLE_RATE_HZ], reading the latest gamepad sample from a
/// watch channel, stepping the engine, and writing the resulting commands
/// to the virtual mouse. Write failures are logged and dropped; a retry
/// would double-apply relative deltas.
pub struct Manager {
    config: Config,
    config_path: Option<PathBuf>,
    engine: Engine,
    mouse: MouseDevice,
    tx: mpsc::Sender<ManagerCommand>,
    rx: mpsc::Receiver<ManagerCommand>,
    sample_rx: watch::Receiver<GamepadSample>,
}

impl Manager {
    /// Returns a new [Manager] reading samples from the given channel and
    /// writing to the given virtual mouse.
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        mouse: MouseDevice,
        sample_rx: watch::Receiver<GamepadSample>,
    ) -> Manager {
        let (tx, rx) = mpsc::channel(BUFFER_SIZE);
        Manager {
            config,
            config_path,
            engine: Engine::new(),
            mouse,
            tx,
            rx,
            sample_rx,
        }
    }

    /// Returns a transmitter channel that can be used to send commands to
    /// this manager
    pub fn transmitter(&self) -> mpsc::Sender<ManagerCommand> {
        self.tx.clone()
    }

    /// Runs the sampling loop until a stop command arrives or every
    /// command sender is gone.
    pub async fn run(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let period = Duration::from_micros(1_000_000 / SAMPLE_RATE_HZ);
        let mut tick = tokio::time::interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::debug!("Sampling at {SAMPLE_RATE_HZ}Hz");

        'sampling: loop {
            tick.tick().await;

            // Apply any control messages that arrived since the last tick
            loop {
                match self.rx.try_recv() {
                    Ok(command) => {
                        log::debug!("Received command: {command:?}");
                        if !self.handle_command(command) {
                            break 'sampling;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => break 'sampling,
                }
            }

            self.process_sample();
        }

        // Never exit with a synthetic button held down
        for command in self.engine.force_release() {
            self.dispatch(&command);
        }
        log::info!("Manager stopped");

        Ok(())
    }

    /// Applies a single control command. Returns false when the manager
    /// should stop.
    fn handle_command(&mut self, command: ManagerCommand) -> bool {
        match command {
            ManagerCommand::SetEnabled(enabled) => {
                log::info!("Master enable set to {enabled}");
                self.engine.set_master_enabled(enabled);
            }
            ManagerCommand::GetEnabled { sender } => {
                let _ = sender.try_send(self.engine.master_enabled());
            }
            ManagerCommand::ReloadConfig => {
                self.config = Config::load(self.config_path.as_deref());
                log::info!("Configuration reloaded");
            }
            ManagerCommand::Stop => return false,
        }
        true
    }

    /// Steps the engine over the latest sample and dispatches its commands
    fn process_sample(&mut self) {
        let sample = *self.sample_rx.borrow();
        let commands = self.engine.step(&sample, &self.config, Instant::now());
        for command in commands {
            self.dispatch(&command);
        }
    }

    fn dispatch(&mut self, command: &OutputCommand) {
        match command {
            OutputCommand::ToggleKeyboard => self.toggle_keyboard(),
            command => {
                // Fire-and-forget: a failed injection is logged and
                // dropped, never retried
                if let Err(e) = self.mouse.write(command) {
                    log::warn!("Unable to write {command:?} to virtual mouse: {e:?}");
                }
            }
        }
    }

    /// Launches the configured on-screen keyboard command without blocking
    /// the sampling loop
    fn toggle_keyboard(&self) {
        let command_line = self.config.keyboard_command.trim().to_string();
        if command_line.is_empty() {
            log::debug!("No keyboard command configured");
            return;
        }

        tokio::spawn(async move {
            let mut parts = command_line.split_whitespace();
            let Some(program) = parts.next() else {
                return;
            };
            let args: Vec<&str> = parts.collect();
            log::info!("Launching keyboard command: {command_line}");
            match tokio::process::Command::new(program).args(args).spawn() {
                Ok(mut child) => {
                    let _ = child.wait().await;
                }
                Err(e) => log::warn!("Unable to launch keyboard command: {e}"),
            }
        });
    }
}
