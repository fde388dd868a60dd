use anyhow::Result;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ql::prelude::QlError;

use crate::action::EnduroAction;
use crate::agent::{Mover, Policy};
use crate::vision::OccupancyGrid;

/// Picks uniformly among the available actions
pub struct RandomPolicy {
    rng: StdRng,
    total_reward: f32,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            total_reward: 0.0,
        }
    }

    /// Reward collected in the current episode
    pub fn total_reward(&self) -> f32 {
        self.total_reward
    }
}

impl Policy for RandomPolicy {
    fn initialise(&mut self, _grid: &OccupancyGrid) {
        self.total_reward = 0.0;
    }

    fn act(&mut self, mover: &mut dyn Mover) -> Result<EnduroAction> {
        let action = *mover.actions_set()
            .choose(&mut self.rng)
            .ok_or_else(|| QlError::from("empty action set"))?;
        self.total_reward += mover.do_move(action)?;
        Ok(action)
    }

    fn sense(&mut self, _grid: &OccupancyGrid) {}

    fn learn(&mut self) {}

    fn callback(&mut self, _learn: bool, episode: usize, iteration: u64) {
        log::info!("{}/{}: {}", episode, iteration, self.total_reward);
    }

    fn episode_finished(&mut self, episode: usize) {
        log::info!("Total reward of episode {}: {}", episode, self.total_reward);
    }
}
