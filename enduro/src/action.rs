use std::fmt::{Display, Formatter};

use anyhow::Result;
use ql::prelude::{Action, ModelActionType, QlError};

/// The subset of the Atari joystick inputs which is meaningful for Enduro.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum EnduroAction {
    Noop,
    /// FIRE
    Accelerate,
    /// DOWN
    Brake,
    /// RIGHT_FIRE
    Right,
    /// LEFT_FIRE
    Left,
}

/// Actions offered to a policy
pub const ACTION_SET: [EnduroAction; 4] = [
    EnduroAction::Accelerate,
    EnduroAction::Right,
    EnduroAction::Left,
    EnduroAction::Brake,
];

impl EnduroAction {
    /// Joystick code as understood by the emulator
    pub fn emulator_code(&self) -> u8 {
        use EnduroAction::*;
        match self {
            Noop => 0,
            Accelerate => 1,
            Brake => 5,
            Right => 11,
            Left => 12,
        }
    }
}

impl Display for EnduroAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use EnduroAction::*;
        f.write_str(match self {
            Noop => "NOOP",
            Accelerate => "ACCELERATE",
            Brake => "BREAK",
            Right => "RIGHT",
            Left => "LEFT",
        })
    }
}

impl Action for EnduroAction {
    const ACTION_SPACE: ModelActionType = 5;

    fn numeric(&self) -> ModelActionType {
        use EnduroAction::*;
        match self {
            Noop => 0,
            Accelerate => 1,
            Brake => 2,
            Right => 3,
            Left => 4,
        }
    }

    fn try_from_numeric(value: ModelActionType) -> Result<Self> {
        use EnduroAction::*;
        match value {
            0 => Ok(Noop),
            1 => Ok(Accelerate),
            2 => Ok(Brake),
            3 => Ok(Right),
            4 => Ok(Left),
            _ => Err(QlError(format!("value {} out of range", value)).into()),
        }
    }
}
