use anyhow::Result;
use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ql::learn::epsilon::EpsilonGreedy;
use ql::learn::q_table::QTable;
use ql::prelude::QlError;

use crate::action::EnduroAction;
use crate::agent::{Mover, Policy};
use crate::vision::OccupancyGrid;

#[derive(Clone, Debug, PartialEq)]
pub struct QLearningParameter {
    /// learning rate
    pub alpha: f32,
    /// discount factor for future rewards
    pub gamma: f32,
    pub epsilon_max: f32,
    pub epsilon_min: f32,
    pub pure_random_steps: usize,
    pub epsilon_decay_steps: f32,
    /// Number of grid rows in front of the player which make up the state
    pub lookahead_rows: usize,
    pub seed: u64,
    /// Value of unseen state-action pairs
    pub initial_q: f32,
}

impl Default for QLearningParameter {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            epsilon_max: 1.0,
            epsilon_min: 0.05,
            pure_random_steps: 0,
            epsilon_decay_steps: 20_000.0,
            lookahead_rows: 4,
            seed: 42,
            initial_q: 0.0,
        }
    }
}

/// Compact state: where the player is and which cells right in front are taken.
///
/// Opponents are stored as a bitset over the first `lookahead_rows` grid rows (`row * columns + column`),
/// cells beyond bit 63 are not represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey {
    /// `u8::MAX` if the grid has no player
    pub player_column: u8,
    pub opponents: u64,
}

impl GridKey {
    pub fn from_grid(grid: &OccupancyGrid, lookahead_rows: usize) -> Self {
        let player_column = grid.player_position()
            .map_or(u8::MAX, |(_, column)| column as u8);
        let opponents = grid.opponents()
            .filter(|&(row, _)| row < lookahead_rows)
            .map(|(row, column)| row * grid.columns() + column)
            .filter(|&bit| bit < 64)
            .fold(0_u64, |bits, bit| bits | 1 << bit);
        Self { player_column, opponents }
    }
}

/// Tabular Q-learning over `GridKey` states with epsilon-greedy exploration
pub struct QLearningPolicy {
    param: QLearningParameter,
    table: QTable<GridKey, EnduroAction>,
    schedule: EpsilonGreedy,
    rng: StdRng,
    previous_state: Option<GridKey>,
    state: Option<GridKey>,
    last_action: Option<EnduroAction>,
    /// reward collected since the last Q update
    pending_reward: f32,
    total_reward: f32,
    /// total reward of every finished episode
    episode_rewards: Vec<f32>,
}

impl QLearningPolicy {
    pub fn new(param: QLearningParameter) -> Self {
        let table = QTable::new(param.initial_q);
        Self::with_table(param, table)
    }

    /// Continues with an already trained table
    pub fn with_table(param: QLearningParameter, table: QTable<GridKey, EnduroAction>) -> Self {
        let schedule = EpsilonGreedy::new(
            param.epsilon_max,
            param.epsilon_min,
            param.pure_random_steps,
            param.epsilon_decay_steps,
        );
        let rng = StdRng::seed_from_u64(param.seed);
        Self {
            param,
            table,
            schedule,
            rng,
            previous_state: None,
            state: None,
            last_action: None,
            pending_reward: 0.0,
            total_reward: 0.0,
            episode_rewards: vec![],
        }
    }

    pub fn table(&self) -> &QTable<GridKey, EnduroAction> {
        &self.table
    }

    pub fn into_table(self) -> QTable<GridKey, EnduroAction> {
        self.table
    }

    /// Switches exploration off, e.g. for evaluating a trained table
    pub fn set_greedy(&mut self) {
        self.schedule = EpsilonGreedy::greedy();
    }

    pub fn epsilon(&self) -> f32 {
        self.schedule.epsilon()
    }

    pub fn total_reward(&self) -> f32 {
        self.total_reward
    }

    /// Learning curve: total rewards of the finished episodes
    pub fn episode_rewards(&self) -> &[f32] {
        &self.episode_rewards
    }

    fn choose_action(&mut self, actions: &[EnduroAction]) -> Result<EnduroAction> {
        let greedy = match self.state {
            Some(state) if !self.schedule.explore(&mut self.rng) => self.table.best_action(&state, actions),
            _ => None,
        };
        match greedy {
            Some(action) => Ok(action),
            None => actions.choose(&mut self.rng)
                .copied()
                .ok_or_else(|| QlError::from("empty action set").into()),
        }
    }
}

impl Policy for QLearningPolicy {
    fn initialise(&mut self, grid: &OccupancyGrid) {
        self.total_reward = 0.0;
        self.previous_state = None;
        self.last_action = None;
        self.pending_reward = 0.0;
        self.state = Some(GridKey::from_grid(grid, self.param.lookahead_rows));
    }

    fn act(&mut self, mover: &mut dyn Mover) -> Result<EnduroAction> {
        let action = self.choose_action(mover.actions_set())?;
        let reward = mover.do_move(action)?;
        self.last_action = Some(action);
        // frames skipped by the controller leave their reward for the next update
        self.pending_reward += reward;
        self.total_reward += reward;
        Ok(action)
    }

    fn sense(&mut self, grid: &OccupancyGrid) {
        self.previous_state = self.state.replace(GridKey::from_grid(grid, self.param.lookahead_rows));
    }

    fn learn(&mut self) {
        if let (Some(previous), Some(action), Some(state)) = (self.previous_state, self.last_action.take(), self.state) {
            let value = self.table.update(
                &previous,
                action,
                self.pending_reward,
                Some(&state),
                self.param.alpha,
                self.param.gamma,
            );
            self.pending_reward = 0.0;
            log::trace!("Q({:?}, {}) = {}", previous, action, value);
        }
    }

    fn callback(&mut self, learn: bool, episode: usize, iteration: u64) {
        log::debug!(
            "{}/{}: {} (epsilon: {:.3}, states: {}, learning: {})",
            episode, iteration, self.total_reward, self.schedule.epsilon(), self.table.len(), learn
        );
    }

    fn episode_finished(&mut self, episode: usize) {
        log::info!("episode {}: total reward {}", episode, self.total_reward);
        self.episode_rewards.push(self.total_reward);
    }
}
