use std::error::Error;

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AttributeSet, EventType, InputEvent, KeyCode, RelativeAxisCode, SynchronizationCode,
    SynchronizationEvent,
};

use crate::input::command::{OutputCommand, WHEEL_DELTA};

/// The virtual uinput mouse that engine commands are written to. Exposes
/// relative motion, both wheels, and the two buttons the click mapper
/// drives.
pub struct MouseDevice {
    device: VirtualDevice,
}

impl MouseDevice {
    /// Creates the virtual mouse device
    pub fn new() -> Result<Self, Box<dyn Error + Send + Sync>> {
        log::debug!("Creating virtual mouse");
        let device = VirtualDeviceBuilder::new()?
            .name("JoyMouse Mouse")
            .with_relative_axes(&AttributeSet::from_iter([
                RelativeAxisCode::REL_X,
                RelativeAxisCode::REL_Y,
                RelativeAxisCode::REL_WHEEL,
                RelativeAxisCode::REL_HWHEEL,
            ]))?
            .with_keys(&AttributeSet::from_iter([
                KeyCode::BTN_LEFT,
                KeyCode::BTN_RIGHT,
            ]))?
            .build()?;

        Ok(Self { device })
    }

    /// Writes a single command to the virtual device followed by a sync
    /// report. Callers treat failures as fire-and-forget.
    pub fn write(&mut self, command: &OutputCommand) -> Result<(), Box<dyn Error + Send + Sync>> {
        let events = match command {
            OutputCommand::Move { dx, dy } => vec![
                InputEvent::new(EventType::RELATIVE.0, RelativeAxisCode::REL_X.0, *dx),
                InputEvent::new(EventType::RELATIVE.0, RelativeAxisCode::REL_Y.0, *dy),
            ],
            OutputCommand::LeftDown => {
                vec![InputEvent::new(EventType::KEY.0, KeyCode::BTN_LEFT.0, 1)]
            }
            OutputCommand::LeftUp => {
                vec![InputEvent::new(EventType::KEY.0, KeyCode::BTN_LEFT.0, 0)]
            }
            OutputCommand::RightDown => {
                vec![InputEvent::new(EventType::KEY.0, KeyCode::BTN_RIGHT.0, 1)]
            }
            OutputCommand::RightUp => {
                vec![InputEvent::new(EventType::KEY.0, KeyCode::BTN_RIGHT.0, 0)]
            }
            OutputCommand::Scroll(delta) => vec![InputEvent::new(
                EventType::RELATIVE.0,
                RelativeAxisCode::REL_WHEEL.0,
                delta / WHEEL_DELTA,
            )],
            OutputCommand::HScroll(delta) => vec![InputEvent::new(
                EventType::RELATIVE.0,
                RelativeAxisCode::REL_HWHEEL.0,
                delta / WHEEL_DELTA,
            )],
            OutputCommand::ToggleKeyboard => {
                // Not a mouse command; the manager dispatches it elsewhere
                return Ok(());
            }
        };

        self.device.emit(events.as_slice())?;
        self.device
            .emit(&[SynchronizationEvent::new(SynchronizationCode::SYN_REPORT, 0).into()])?;
        Ok(())
    }
}
