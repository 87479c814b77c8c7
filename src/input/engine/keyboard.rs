use std::time::{Duration, Instant};

/// Minimum interval between keyboard toggles. Release edges inside the
/// window are ignored so controller chatter cannot flap the keyboard.
const REFRACTORY: Duration = Duration::from_millis(300);

/// Debounced dispatch of the on-screen keyboard toggle, triggered on the
/// keyboard button's release edge.
#[derive(Debug, Default)]
pub struct KeyboardToggle {
    last_trigger: Option<Instant>,
    prev_pressed: bool,
}

impl KeyboardToggle {
    /// Tracks one sample's button state. Returns true when the toggle
    /// should fire. An unarmed release edge is swallowed without consuming
    /// the refractory window.
    pub fn update(&mut self, pressed: bool, armed: bool, now: Instant) -> bool {
        let released = self.prev_pressed && !pressed;
        self.prev_pressed = pressed;

        if !released || !armed {
            return false;
        }
        if let Some(last) = self.last_trigger {
            if now.saturating_duration_since(last) <= REFRACTORY {
                return false;
            }
        }
        self.last_trigger = Some(now);
        true
    }
}
