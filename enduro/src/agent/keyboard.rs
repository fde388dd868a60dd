use anyhow::Result;
use console_engine::{ConsoleEngine, KeyCode};
use lazy_static::lazy_static;

use ql::prelude::{DebugVisualizer, QlError};

use crate::action::EnduroAction;
use crate::agent::{Mover, Policy};
use crate::vision::OccupancyGrid;

lazy_static!(
    pub static ref KEY_BINDINGS: Vec<(char, EnduroAction)> = vec![
        ('a', EnduroAction::Left),
        ('d', EnduroAction::Right),
        ('w', EnduroAction::Accelerate),
        ('s', EnduroAction::Brake),
    ];
);

/// Key used for "do nothing" by interactive key sources
pub const NOOP_KEY: char = ' ';

pub fn action_for_key(key: char) -> EnduroAction {
    KEY_BINDINGS.iter()
        .find(|(k, _)| *k == key)
        .map_or(EnduroAction::Noop, |(_, action)| *action)
}

/// Where the keyboard policy gets its keys from and shows what is going on
pub trait KeySource {
    /// Blocks until a key was pressed. `None` means the player wants to quit.
    fn wait_key(&mut self) -> Result<Option<char>>;

    fn show(&mut self, grid: &OccupancyGrid);
}

/// Lets a human drive
pub struct KeyboardPolicy<K: KeySource> {
    keys: K,
    total_reward: f32,
}

impl<K: KeySource> KeyboardPolicy<K> {
    pub fn new(keys: K) -> Self {
        Self { keys, total_reward: 0.0 }
    }

    pub fn total_reward(&self) -> f32 {
        self.total_reward
    }
}

impl<K: KeySource> Policy for KeyboardPolicy<K> {
    fn initialise(&mut self, grid: &OccupancyGrid) {
        self.total_reward = 0.0;
        self.keys.show(grid);
    }

    fn act(&mut self, mover: &mut dyn Mover) -> Result<EnduroAction> {
        let key = self.keys.wait_key()?
            .ok_or_else(|| QlError::from("player quit"))?;
        let action = action_for_key(key);
        self.total_reward += mover.do_move(action)?;
        Ok(action)
    }

    fn sense(&mut self, grid: &OccupancyGrid) {
        self.keys.show(grid);
    }

    fn learn(&mut self) {}

    fn callback(&mut self, _learn: bool, episode: usize, iteration: u64) {
        log::info!("{}/{}: {}", episode, iteration, self.total_reward);
    }

    fn episode_finished(&mut self, episode: usize) {
        log::info!("Total reward of episode {}: {}", episode, self.total_reward);
    }
}

/// Terminal based key source; shows the occupancy grid with the nearest row at the bottom
pub struct ConsoleKeySource {
    engine: ConsoleEngine,
}

impl ConsoleKeySource {
    pub fn new() -> Result<Self> {
        let engine = ConsoleEngine::init(20, 12, 30)?;
        Ok(Self { engine })
    }
}

impl KeySource for ConsoleKeySource {
    fn wait_key(&mut self) -> Result<Option<char>> {
        loop {
            self.engine.wait_frame();
            if self.engine.is_key_pressed(KeyCode::Esc) {
                return Ok(None);
            }
            let pressed = KEY_BINDINGS.iter()
                .map(|(k, _)| *k)
                .chain([NOOP_KEY])
                .find(|&k| self.engine.is_key_pressed(KeyCode::Char(k)));
            if pressed.is_some() {
                return Ok(pressed);
            }
        }
    }

    fn show(&mut self, grid: &OccupancyGrid) {
        self.engine.set_screen(&grid.render_to_console());
        self.engine.draw();
    }
}
