use std::time::Instant;

/// Floor on elapsed time between samples to avoid division blow-ups
const MIN_DT: f64 = 0.001;
/// Ceiling on elapsed time so a stalled loop cannot synthesize a huge jump
const MAX_DT: f64 = 0.250;

/// Shared filter state for one two-axis channel: an exponentially smoothed
/// velocity and a sub-unit accumulator per axis, plus the timestamp of the
/// last update.
///
/// Invariant: after every emission the per-axis accumulator magnitude is
/// below one unit. The fractional remainder is carried forward, never
/// dropped or duplicated.
#[derive(Debug, Default)]
pub struct ChannelState {
    /// Filtered velocity in units/sec, one entry per axis
    pub filtered: (f64, f64),
    /// Sub-unit accumulator, one entry per axis
    pub accum: (f64, f64),
    /// When this channel last processed a sample
    pub last_update: Option<Instant>,
}

impl ChannelState {
    /// Zeroes the filter and accumulator. `now` seeds the timebase on an
    /// inactive→active transition; `None` clears it on deactivation.
    pub fn reset(&mut self, now: Option<Instant>) {
        self.filtered = (0.0, 0.0);
        self.accum = (0.0, 0.0);
        self.last_update = now;
    }

    /// Returns the clamped elapsed seconds since the last update and
    /// advances the timebase to `now`.
    pub fn elapsed(&mut self, now: Instant) -> f64 {
        let dt = match self.last_update {
            Some(last) => now.saturating_duration_since(last).as_secs_f64(),
            None => MIN_DT,
        };
        self.last_update = Some(now);
        dt.clamp(MIN_DT, MAX_DT)
    }

    /// Zero-cross snap: when the target velocity reverses sign on an axis,
    /// the filtered velocity and accumulator on that axis are forced to
    /// zero before smoothing so the reversal does not overshoot.
    pub fn snap_on_reversal(&mut self, target: (f64, f64)) {
        if self.filtered.0 != 0.0 && target.0 != 0.0 && self.filtered.0.signum() != target.0.signum()
        {
            self.filtered.0 = 0.0;
            self.accum.0 = 0.0;
        }
        if self.filtered.1 != 0.0 && target.1 != 0.0 && self.filtered.1.signum() != target.1.signum()
        {
            self.filtered.1 = 0.0;
            self.accum.1 = 0.0;
        }
    }

    /// Single-pole low-pass step toward the target velocity
    pub fn smooth(&mut self, target: (f64, f64), alpha: f64) {
        self.filtered.0 += alpha * (target.0 - self.filtered.0);
        self.filtered.1 += alpha * (target.1 - self.filtered.1);
    }

    /// Integrates the filtered velocity into the accumulators
    pub fn integrate(&mut self, dt: f64) {
        self.accum.0 += self.filtered.0 * dt;
        self.accum.1 += self.filtered.1 * dt;
    }
}
