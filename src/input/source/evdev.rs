use std::collections::HashMap;
use std::error::Error;

use evdev::{AbsInfo, AbsoluteAxisCode, Device, EventType, InputEvent, KeyCode};
use tokio::sync::watch;

use crate::input::sample::{button, GamepadSample};

/// Source device implementation for evdev gamepads.
///
/// Reads raw input events from the device, folds them into a single
/// [GamepadSample], and publishes one sample per `SYN_REPORT` into a watch
/// channel the sampling loop reads from. Axes are normalized using the
/// device's absolute axis ranges; evdev's down-positive Y is flipped so the
/// published samples use stick-up = positive Y.
pub struct GamepadDevice {
    device: Device,
    axes_info: HashMap<AbsoluteAxisCode, AbsInfo>,
    state: GamepadSample,
    tx: watch::Sender<GamepadSample>,
}

impl GamepadDevice {
    /// Create a new [GamepadDevice] from the given device path
    pub fn new(
        path: &str,
        tx: watch::Sender<GamepadSample>,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        log::debug!("Opening device at: {path}");
        let device = Device::open(path)?;
        if let Some(name) = device.name() {
            log::info!("Reading gamepad input from '{name}' ({path})");
        }

        // Query information about the device to get the absolute ranges
        let mut axes_info = HashMap::new();
        for (axis, info) in device.get_absinfo()? {
            log::trace!("Found axis: {:?} with info: {:?}", axis, info);
            axes_info.insert(axis, info);
        }

        Ok(Self {
            device,
            axes_info,
            state: GamepadSample::default(),
            tx,
        })
    }

    /// Reads events until the device goes away. On a read error (e.g. the
    /// controller disconnected) a neutral sample is published so the engine
    /// decays to rest, and the task ends; the daemon keeps running.
    pub async fn run(self) {
        let Self {
            device,
            axes_info,
            mut state,
            tx,
        } = self;

        let mut events = match device.into_event_stream() {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("Error reading gamepad event stream: {e}");
                return;
            }
        };

        loop {
            match events.next_event().await {
                Ok(event) => {
                    if process_event(&axes_info, &mut state, &event) {
                        tx.send_replace(state);
                    }
                }
                Err(e) => {
                    log::warn!("Error reading gamepad events: {e}");
                    break;
                }
            }
        }

        tx.send_replace(GamepadSample::default());
        log::info!("Gamepad device closed");
    }
}

/// Looks for the first event device that looks like a gamepad: something
/// with a south button and an absolute X axis.
pub fn discover() -> Option<String> {
    for (path, device) in evdev::enumerate() {
        let Some(keys) = device.supported_keys() else {
            continue;
        };
        if !keys.contains(KeyCode::BTN_SOUTH) {
            continue;
        }
        let has_stick = device
            .supported_absolute_axes()
            .map(|axes| axes.contains(AbsoluteAxisCode::ABS_X))
            .unwrap_or(false);
        if !has_stick {
            continue;
        }
        log::debug!(
            "Discovered gamepad '{}' at {}",
            device.name().unwrap_or("unknown"),
            path.display()
        );
        return Some(path.display().to_string());
    }
    None
}

/// Folds one raw event into the sample state. Returns true on a sync
/// report, meaning the sample is complete and should be published.
fn process_event(
    axes_info: &HashMap<AbsoluteAxisCode, AbsInfo>,
    state: &mut GamepadSample,
    event: &InputEvent,
) -> bool {
    match event.event_type() {
        EventType::SYNCHRONIZATION => return true,
        EventType::ABSOLUTE => {
            let axis = AbsoluteAxisCode(event.code());
            let value = event.value();
            match axis {
                // Sticks; evdev Y grows downward, samples are up-positive
                AbsoluteAxisCode::ABS_X => state.left_x = normalize(axes_info, axis, value),
                AbsoluteAxisCode::ABS_Y => state.left_y = -normalize(axes_info, axis, value),
                AbsoluteAxisCode::ABS_RX => state.right_x = normalize(axes_info, axis, value),
                AbsoluteAxisCode::ABS_RY => state.right_y = -normalize(axes_info, axis, value),
                // D-pad reported as a hat
                AbsoluteAxisCode::ABS_HAT0X => {
                    set_button(state, button::DPAD_LEFT, value < 0);
                    set_button(state, button::DPAD_RIGHT, value > 0);
                }
                AbsoluteAxisCode::ABS_HAT0Y => {
                    set_button(state, button::DPAD_UP, value < 0);
                    set_button(state, button::DPAD_DOWN, value > 0);
                }
                _ => (),
            }
        }
        EventType::KEY => {
            let pressed = event.value() != 0;
            let mask = match KeyCode(event.code()) {
                KeyCode::BTN_SOUTH => button::CLICK_LEFT,
                KeyCode::BTN_EAST => button::CLICK_RIGHT,
                KeyCode::BTN_TR => button::TOGGLE,
                KeyCode::BTN_SELECT => button::KEYBOARD,
                // D-pad reported as keys
                KeyCode::BTN_DPAD_UP => button::DPAD_UP,
                KeyCode::BTN_DPAD_DOWN => button::DPAD_DOWN,
                KeyCode::BTN_DPAD_LEFT => button::DPAD_LEFT,
                KeyCode::BTN_DPAD_RIGHT => button::DPAD_RIGHT,
                _ => return false,
            };
            set_button(state, mask, pressed);
        }
        _ => (),
    }

    false
}

/// Normalizes an absolute axis value into `[-1.0, 1.0]` using the device's
/// reported range.
fn normalize(
    axes_info: &HashMap<AbsoluteAxisCode, AbsInfo>,
    axis: AbsoluteAxisCode,
    value: i32,
) -> f64 {
    let Some(info) = axes_info.get(&axis) else {
        return 0.0;
    };
    let min = info.minimum() as f64;
    let max = info.maximum() as f64;
    if max <= min {
        return 0.0;
    }
    let normalized = (value as f64 - min) / (max - min) * 2.0 - 1.0;
    normalized.clamp(-1.0, 1.0)
}

fn set_button(state: &mut GamepadSample, mask: u16, pressed: bool) {
    if pressed {
        state.buttons |= mask;
    } else {
        state.buttons &= !mask;
    }
}
