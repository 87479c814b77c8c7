/// Wheel units per scroll notch, matching the legacy wheel APIs most
/// toolkits still expect.
pub const WHEEL_DELTA: i32 = 120;

/// An [OutputCommand] is a single synthetic input action produced by the
/// engine for one sample. Commands are dispatched fire-and-forget by the
/// manager; pointer and wheel deltas are never retried because a retry
/// would double-apply them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCommand {
    /// Relative pointer motion in pixels
    Move { dx: i32, dy: i32 },
    LeftDown,
    LeftUp,
    RightDown,
    RightUp,
    /// One vertical scroll notch, `±WHEEL_DELTA`. Positive scrolls up.
    Scroll(i32),
    /// One horizontal scroll notch, `±WHEEL_DELTA`. Positive scrolls right.
    HScroll(i32),
    /// Toggle the on-screen keyboard
    ToggleKeyboard,
}
