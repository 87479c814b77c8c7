pub mod activation;
pub mod channel;
pub mod clicks;
pub mod keyboard;
pub mod pointer;
pub mod scroll;

#[cfg(test)]
mod engine_test;

use std::time::Instant;

use crate::config::Config;
use crate::input::command::OutputCommand;
use crate::input::sample::{button, GamepadSample};

use activation::{ActivationChange, ActivationTracker};
use clicks::ClickMapper;
use keyboard::KeyboardToggle;
use pointer::PointerChannel;
use scroll::ScrollChannel;

/// The input-shaping engine. Owns all per-sample state and translates one
/// [GamepadSample] at a time into a list of [OutputCommand]s.
///
/// [Engine::step] is deterministic over (state, sample, config, time) and
/// touches nothing OS-facing, so the whole state machine can be driven in
/// unit tests without a device in sight. The manager owns the one instance
/// and is the only task that ever mutates it.
#[derive(Debug, Default)]
pub struct Engine {
    activation: ActivationTracker,
    pointer: PointerChannel,
    scroll: ScrollChannel,
    clicks: ClickMapper,
    keyboard: KeyboardToggle,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether translation is enabled at all, independent of the latch
    pub fn master_enabled(&self) -> bool {
        self.activation.master_enabled()
    }

    /// Sets the master enable flag. Takes effect on the next step; an
    /// active→inactive transition releases held clicks there.
    pub fn set_master_enabled(&mut self, enabled: bool) {
        self.activation.set_master_enabled(enabled);
    }

    /// Processes one sample and returns the commands to dispatch.
    ///
    /// The activation tracker runs first so channel state is reset on every
    /// transition and click releases from a deactivation are emitted before
    /// anything else. The shaping channels and click mapper only run while
    /// active; the keyboard toggle runs according to its gating config.
    pub fn step(
        &mut self,
        sample: &GamepadSample,
        config: &Config,
        now: Instant,
    ) -> Vec<OutputCommand> {
        let mut commands = Vec::new();

        let (active, change) = self.activation.update(sample.buttons);
        match change {
            ActivationChange::Activated => {
                self.pointer.reset(Some(now));
                self.scroll.reset(Some(now));
            }
            ActivationChange::Deactivated => {
                self.clicks.force_release(&mut commands);
                self.pointer.reset(None);
                self.scroll.reset(None);
            }
            ActivationChange::None => (),
        }

        if active {
            if let Some((dx, dy)) = self
                .pointer
                .process(sample.left_x, sample.left_y, config, now)
            {
                commands.push(OutputCommand::Move { dx, dy });
            }
            self.scroll.process(sample, config, now, &mut commands);
            self.clicks.process(sample.buttons, &mut commands);
        }

        let armed = active || config.keyboard_while_inactive;
        if self
            .keyboard
            .update(sample.pressed(button::KEYBOARD), armed, now)
        {
            commands.push(OutputCommand::ToggleKeyboard);
        }

        commands
    }

    /// Releases any held clicks. Called by the manager on shutdown so a
    /// dying daemon cannot leave a button down.
    pub fn force_release(&mut self) -> Vec<OutputCommand> {
        let mut commands = Vec::new();
        self.clicks.force_release(&mut commands);
        commands
    }

    #[cfg(test)]
    pub fn active(&self) -> bool {
        self.activation.active()
    }

    #[cfg(test)]
    pub fn pointer(&self) -> &PointerChannel {
        &self.pointer
    }

    #[cfg(test)]
    pub fn scroll(&self) -> &ScrollChannel {
        &self.scroll
    }

    #[cfg(test)]
    pub fn clicks(&self) -> &ClickMapper {
        &self.clicks
    }
}
