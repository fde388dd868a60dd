use anyhow::Result;

use crate::action::{EnduroAction, ACTION_SET};
use crate::agent::Mover;
use crate::emulator::Emulator;

/// How many frames a single policy decision lasts
#[derive(Clone, Debug, PartialEq)]
pub struct ActionRepeatParameter {
    pub accelerate_repeats: usize,
    pub default_repeats: usize,
}

impl Default for ActionRepeatParameter {
    fn default() -> Self {
        Self {
            accelerate_repeats: 4,
            default_repeats: 8,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ActionRepeater {
    param: ActionRepeatParameter,
}

impl ActionRepeater {
    pub fn new(param: ActionRepeatParameter) -> Self {
        Self { param }
    }

    pub fn repeats(&self, action: EnduroAction) -> usize {
        match action {
            EnduroAction::Accelerate => self.param.accelerate_repeats,
            _ => self.param.default_repeats,
        }
    }

    /// Steps the emulator `repeats(action)` times, returns the summed reward
    pub fn apply<E: Emulator + ?Sized>(&self, emulator: &mut E, action: EnduroAction) -> Result<f32> {
        let mut reward = 0.0;
        for _ in 0..self.repeats(action) {
            reward += emulator.step(action)?;
        }
        Ok(reward)
    }
}

/// `Mover` handed to the policy for one `act` call
pub struct EmulatorMover<'a, E: Emulator + ?Sized> {
    emulator: &'a mut E,
    repeater: &'a ActionRepeater,
    reward: f32,
    moves: usize,
}

impl<'a, E: Emulator + ?Sized> EmulatorMover<'a, E> {
    pub fn new(emulator: &'a mut E, repeater: &'a ActionRepeater) -> Self {
        Self { emulator, repeater, reward: 0.0, moves: 0 }
    }

    /// Reward collected through this mover
    pub fn reward(&self) -> f32 {
        self.reward
    }

    pub fn moves(&self) -> usize {
        self.moves
    }
}

impl<'a, E: Emulator + ?Sized> Mover for EmulatorMover<'a, E> {
    fn actions_set(&self) -> &[EnduroAction] {
        &ACTION_SET
    }

    fn do_move(&mut self, action: EnduroAction) -> Result<f32> {
        let reward = self.repeater.apply(&mut *self.emulator, action)?;
        self.reward += reward;
        self.moves += 1;
        Ok(reward)
    }
}
