use crate::input::sample::button;

/// How the activation signal changed relative to the previous sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationChange {
    None,
    Activated,
    Deactivated,
}

/// Tracks the mouse-mode latch and combines it with the master enable flag
/// into a single "active" signal.
///
/// The latch flips on the toggle button's release edge, not its press, so a
/// held bumper never oscillates the mode. The master flag arrives from the
/// control surface and is only read here, on the sampling loop.
#[derive(Debug)]
pub struct ActivationTracker {
    master_enabled: bool,
    latched: bool,
    toggle_held: bool,
    prev_buttons: u16,
    prev_active: bool,
}

impl Default for ActivationTracker {
    fn default() -> Self {
        Self {
            master_enabled: true,
            latched: false,
            toggle_held: false,
            prev_buttons: 0,
            prev_active: false,
        }
    }
}

impl ActivationTracker {
    pub fn master_enabled(&self) -> bool {
        self.master_enabled
    }

    pub fn set_master_enabled(&mut self, enabled: bool) {
        self.master_enabled = enabled;
    }

    pub fn active(&self) -> bool {
        self.prev_active
    }

    /// Consumes one sample's button bitmask and returns the activation
    /// signal for this sample along with any transition.
    pub fn update(&mut self, buttons: u16) -> (bool, ActivationChange) {
        let toggle_now = buttons & button::TOGGLE != 0;
        let toggle_was = self.prev_buttons & button::TOGGLE != 0;

        if toggle_now && !toggle_was {
            self.toggle_held = true;
        } else if !toggle_now && toggle_was {
            if self.toggle_held {
                self.latched = !self.latched;
                log::info!(
                    "Mouse mode {}",
                    if self.latched { "latched on" } else { "latched off" }
                );
            }
            self.toggle_held = false;
        }
        self.prev_buttons = buttons;

        let active = self.master_enabled && self.latched;
        let change = match (self.prev_active, active) {
            (false, true) => ActivationChange::Activated,
            (true, false) => ActivationChange::Deactivated,
            _ => ActivationChange::None,
        };
        self.prev_active = active;

        (active, change)
    }
}
