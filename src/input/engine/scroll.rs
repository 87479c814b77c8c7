use std::time::Instant;

use crate::config::Config;
use crate::input::command::{OutputCommand, WHEEL_DELTA};
use crate::input::sample::{button, GamepadSample};

use super::channel::ChannelState;

/// Vertical notch rate in notches/sec at full drive, before the configured
/// multiplier
const BASE_NOTCHES_V: f64 = 18.0;
/// Horizontal notch rate in notches/sec at full drive
const BASE_NOTCHES_H: f64 = 16.0;

/// Turns the right stick plus the d-pad into discrete scroll notches on two
/// axes.
///
/// Analog deflection is deadzone-compensated with a linear remap (no cubic
/// easing), summed with the digital directions, gamma-shaped, smoothed, and
/// integrated into notch accumulators. One `Scroll`/`HScroll` command is
/// emitted per whole notch crossed.
#[derive(Debug, Default)]
pub struct ScrollChannel {
    /// Axis 0 is horizontal, axis 1 vertical
    state: ChannelState,
}

impl ScrollChannel {
    pub fn reset(&mut self, now: Option<Instant>) {
        self.state.reset(now);
    }

    #[cfg(test)]
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Processes one sample, pushing notch commands onto `commands`.
    pub fn process(
        &mut self,
        sample: &GamepadSample,
        config: &Config,
        now: Instant,
        commands: &mut Vec<OutputCommand>,
    ) {
        let dt = self.state.elapsed(now);

        let up = sample.pressed(button::DPAD_UP);
        let down = sample.pressed(button::DPAD_DOWN);
        let left = sample.pressed(button::DPAD_LEFT);
        let right = sample.pressed(button::DPAD_RIGHT);

        let (rx, ry) = (sample.right_x, sample.right_y);
        let mag = (rx * rx + ry * ry).sqrt();

        // Idle reset: nothing driving either axis means no residual drift
        // scrolling is allowed to leak out of the filters.
        if mag < config.deadzone && !up && !down && !left && !right {
            self.state.filtered = (0.0, 0.0);
            self.state.accum = (0.0, 0.0);
            return;
        }

        // Analog contribution, linear remap along the stick direction
        let (sx, sy) = if mag >= config.deadzone {
            let scaled = (mag - config.deadzone) / (1.0 - config.deadzone);
            (rx / mag * scaled, ry / mag * scaled)
        } else {
            (0.0, 0.0)
        };

        // Digital contribution
        let mut dv = 0.0;
        if up {
            dv += 1.0;
        }
        if down {
            dv -= 1.0;
        }
        let mut dh = 0.0;
        if right {
            dh += 1.0;
        }
        if left {
            dh -= 1.0;
        }

        // Stick-up and d-pad-up both drive positive vertical scroll
        let v_drive = (sy + dv).clamp(-1.0, 1.0);
        let h_drive = (sx + dh).clamp(-1.0, 1.0);

        // Gamma shaping preserving sign; gamma > 1 suppresses small
        // accidental deflections without losing full-deflection rate
        let v_shaped = v_drive.signum() * v_drive.abs().powf(config.scroll_gamma);
        let h_shaped = h_drive.signum() * h_drive.abs().powf(config.scroll_gamma);

        let mut target_v = v_shaped * BASE_NOTCHES_V * config.scroll_speed_v;
        let mut target_h = h_shaped * BASE_NOTCHES_H * config.scroll_speed_h;
        if config.invert_scroll_v {
            target_v = -target_v;
        }
        if config.invert_scroll_h {
            target_h = -target_h;
        }

        self.state.snap_on_reversal((target_h, target_v));
        self.state.smooth((target_h, target_v), config.scroll_alpha);
        self.state.integrate(dt);

        // One discrete notch per whole unit crossed; the loops handle
        // multiple notches per sample at low sample rates.
        while self.state.accum.1 >= 1.0 {
            commands.push(OutputCommand::Scroll(WHEEL_DELTA));
            self.state.accum.1 -= 1.0;
        }
        while self.state.accum.1 <= -1.0 {
            commands.push(OutputCommand::Scroll(-WHEEL_DELTA));
            self.state.accum.1 += 1.0;
        }
        while self.state.accum.0 >= 1.0 {
            commands.push(OutputCommand::HScroll(WHEEL_DELTA));
            self.state.accum.0 -= 1.0;
        }
        while self.state.accum.0 <= -1.0 {
            commands.push(OutputCommand::HScroll(-WHEEL_DELTA));
            self.state.accum.0 += 1.0;
        }
    }
}
