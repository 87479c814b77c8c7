/// Well-known name claimed on the session bus
pub const BUS_NAME: &str = "org.shadowblip.JoyMouse";
/// Prefix for all DBus objects exposed by the daemon
pub const BUS_PREFIX: &str = "/org/shadowblip/JoyMouse";

/// Rate at which gamepad state is sampled and translated into mouse output
pub const SAMPLE_RATE_HZ: u64 = 120;
