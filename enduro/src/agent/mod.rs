//! Policies driving the car, one decision per control loop iteration.

use anyhow::Result;

use crate::action::EnduroAction;
use crate::vision::OccupancyGrid;

pub use keyboard::{ConsoleKeySource, KeySource, KeyboardPolicy};
pub use q_learning::{GridKey, QLearningParameter, QLearningPolicy};
pub use random::RandomPolicy;

pub mod keyboard;
pub mod q_learning;
pub mod random;

/// The control loop's handle for executing an action
pub trait Mover {
    /// Actions a policy may choose from
    fn actions_set(&self) -> &[EnduroAction];

    /// Executes `action` (possibly for several frames) and returns the collected reward
    fn do_move(&mut self, action: EnduroAction) -> Result<f32>;
}

pub trait Policy {
    /// Called with the first grid of every episode
    fn initialise(&mut self, grid: &OccupancyGrid);

    /// Chooses an action and performs it through `mover`
    fn act(&mut self, mover: &mut dyn Mover) -> Result<EnduroAction>;

    /// Grid observed after the last action
    fn sense(&mut self, grid: &OccupancyGrid);

    fn learn(&mut self);

    /// Reporting hook, called once per iteration. `episode` counts from 1, `iteration` is the
    /// number of frames played in the episode so far.
    fn callback(&mut self, learn: bool, episode: usize, iteration: u64);

    /// Called once after the last iteration of `episode`, before the emulator is reset
    fn episode_finished(&mut self, episode: usize);
}

#[derive(Clone, Debug, PartialEq)]
pub enum PolicyKind {
    Keyboard,
    Random { seed: u64 },
    QLearning(QLearningParameter),
}

impl PolicyKind {
    pub fn build(&self) -> Result<Box<dyn Policy>> {
        Ok(match self {
            PolicyKind::Keyboard => Box::new(KeyboardPolicy::new(ConsoleKeySource::new()?)),
            PolicyKind::Random { seed } => Box::new(RandomPolicy::new(*seed)),
            PolicyKind::QLearning(param) => Box::new(QLearningPolicy::new(param.clone())),
        })
    }
}
