//! The control loop: feeds the emulator's frames through the vision pipeline into a policy and
//! carries the policy's actions back to the emulator.

pub use action_repeater::{ActionRepeatParameter, ActionRepeater, EmulatorMover};
pub use episode::{EpisodeController, EpisodeParameter, EpisodePhase, EpisodeSummary};

pub mod action_repeater;
pub mod episode;
