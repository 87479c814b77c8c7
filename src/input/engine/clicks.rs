use crate::input::command::OutputCommand;
use crate::input::sample::button;

/// Maps two face buttons to left/right mouse clicks while tracking what was
/// pressed, so every emitted `Down` has exactly one matching `Up` and
/// deactivation can never leave a synthetic button stuck.
#[derive(Debug, Default)]
pub struct ClickMapper {
    left_down: bool,
    right_down: bool,
}

impl ClickMapper {
    pub fn left_down(&self) -> bool {
        self.left_down
    }

    pub fn right_down(&self) -> bool {
        self.right_down
    }

    /// Processes one sample's buttons, emitting `Down`/`Up` transitions
    pub fn process(&mut self, buttons: u16, commands: &mut Vec<OutputCommand>) {
        let left_now = buttons & button::CLICK_LEFT != 0;
        if left_now && !self.left_down {
            commands.push(OutputCommand::LeftDown);
            self.left_down = true;
        }
        if !left_now && self.left_down {
            commands.push(OutputCommand::LeftUp);
            self.left_down = false;
        }

        let right_now = buttons & button::CLICK_RIGHT != 0;
        if right_now && !self.right_down {
            commands.push(OutputCommand::RightDown);
            self.right_down = true;
        }
        if !right_now && self.right_down {
            commands.push(OutputCommand::RightUp);
            self.right_down = false;
        }
    }

    /// Releases anything currently held. Called on deactivation and on
    /// shutdown so no click outlives the engine.
    pub fn force_release(&mut self, commands: &mut Vec<OutputCommand>) {
        if self.left_down {
            commands.push(OutputCommand::LeftUp);
            self.left_down = false;
        }
        if self.right_down {
            commands.push(OutputCommand::RightUp);
            self.right_down = false;
        }
    }
}
