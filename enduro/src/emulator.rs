use std::path::PathBuf;

use anyhow::Result;

use crate::action::EnduroAction;
use crate::vision::Frame;

/// One-time emulator configuration
#[derive(Clone, Debug, PartialEq)]
pub struct EmulatorSettings {
    pub seed: u64,
    /// Probability of the emulator ignoring a new action and repeating the previous one
    pub repeat_action_probability: f32,
    pub rom: PathBuf,
}

impl Default for EmulatorSettings {
    fn default() -> Self {
        Self {
            seed: 123,
            repeat_action_probability: 0.0,
            rom: PathBuf::from("roms/enduro.bin"),
        }
    }
}

/// The game backend, as far as the agent needs to know it.
///
/// All calls are blocking. Frame numbers are counted by the emulator and keep growing across
/// episode resets.
pub trait Emulator {
    fn configure(&mut self, settings: &EmulatorSettings) -> Result<()>;

    /// Current screen content
    fn capture_frame(&mut self) -> Result<Frame>;

    /// `(width, height)` of captured frames
    fn frame_dimensions(&self) -> (u32, u32);

    /// Advances the game by one frame applying `action`. Returns the reward for that frame.
    fn step(&mut self, action: EnduroAction) -> Result<f32>;

    fn is_episode_over(&self) -> bool;

    fn reset_episode(&mut self) -> Result<()>;

    fn current_frame_number(&self) -> u64;
}
