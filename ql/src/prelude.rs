use std::fmt::{Display, Formatter};
use std::hash::Hash;

use anyhow::Result;
use console_engine::screen::Screen;

/// Data type we use to encode an `Action` for table lookups.
pub type ModelActionType = u8;

pub trait Action: Display + Sized + Clone + Copy + Hash + PartialEq + Eq {
    /// Number of possible actions
    const ACTION_SPACE: ModelActionType;
    /// Identifying the Action as a unique value in range (0..Self::ACTION_SPACE)
    fn numeric(&self) -> ModelActionType;
    fn try_from_numeric(value: ModelActionType) -> Result<Self>;
}

/// Human readable views on a state
pub trait DebugVisualizer {
    fn one_line_info(&self) -> String;
    fn render_to_console(&self) -> Screen;
}

#[derive(Debug)]
pub struct QlError(pub String);

impl QlError {
    pub fn from(msg: &str) -> Self { QlError(msg.to_string()) }
}

impl Display for QlError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for QlError {}
