use std::time::Instant;

use crate::config::Config;

use super::channel::ChannelState;

/// Base cursor speed in pixels/sec at full deflection, before the
/// configured multiplier
const BASE_PIXELS_PER_SEC: f64 = 900.0;
/// Largest pixel step a single sample may emit per axis
const MAX_STEP_PX: f64 = 18.0;

/// Turns the left stick into relative pointer motion.
///
/// Deflection magnitude is deadzone-compensated, eased with a cubic curve
/// for fine control near center, smoothed with an EMA, then integrated into
/// sub-pixel accumulators that emit whole pixels and carry the remainder.
#[derive(Debug, Default)]
pub struct PointerChannel {
    state: ChannelState,
}

impl PointerChannel {
    pub fn reset(&mut self, now: Option<Instant>) {
        self.state.reset(now);
    }

    #[cfg(test)]
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Processes one stick sample, returning the whole-pixel delta to emit,
    /// if any. `(x, y)` is the stick vector with up as positive Y.
    pub fn process(&mut self, x: f64, y: f64, config: &Config, now: Instant) -> Option<(i32, i32)> {
        let dt = self.state.elapsed(now);

        let mag = (x * x + y * y).sqrt();
        if mag < config.deadzone {
            // Inside the deadzone: drop velocity and remainder so nothing
            // carries through to the next deflection.
            self.state.filtered = (0.0, 0.0);
            self.state.accum = (0.0, 0.0);
            return None;
        }

        let scaled = (mag - config.deadzone) / (1.0 - config.deadzone);
        let curved = scaled * scaled * scaled;
        let pps = BASE_PIXELS_PER_SEC * config.pointer_speed;

        // Stick-up is positive Y but screen-up is negative; the sign flips
        // here and nowhere else.
        let ux = x / mag;
        let uy = y / mag;
        let target = (ux * curved * pps, -uy * curved * pps);

        self.state.snap_on_reversal(target);
        self.state.smooth(target, config.pointer_alpha);
        self.state.integrate(dt);

        // Clamp the accumulator itself so a stall cannot turn into a spike
        // and the post-emission remainder stays below one pixel.
        self.state.accum.0 = self.state.accum.0.clamp(-MAX_STEP_PX, MAX_STEP_PX);
        self.state.accum.1 = self.state.accum.1.clamp(-MAX_STEP_PX, MAX_STEP_PX);

        let dx = self.state.accum.0.trunc();
        let dy = self.state.accum.1.trunc();
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        self.state.accum.0 -= dx;
        self.state.accum.1 -= dy;

        Some((dx as i32, dy as i32))
    }
}
