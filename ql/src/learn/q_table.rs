use std::hash::Hash;
use std::marker::PhantomData;

use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::prelude::Action;

/// Tabular action-value function `Q(s, a)`.
///
/// Unseen states evaluate to `initial_value` for every action.
#[derive(Clone, Debug)]
pub struct QTable<S, A>
where
    S: Hash + Eq + Clone,
    A: Action,
{
    initial_value: f32,
    table: FxHashMap<S, Vec<f32>>,
    _action: PhantomData<A>,
}

impl<S, A> QTable<S, A>
where
    S: Hash + Eq + Clone,
    A: Action,
{
    pub fn new(initial_value: f32) -> Self {
        Self {
            initial_value,
            table: FxHashMap::default(),
            _action: PhantomData,
        }
    }

    /// Number of states visited so far
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, state: &S, action: A) -> f32 {
        self.table
            .get(state)
            .map(|values| values[action.numeric() as usize])
            .unwrap_or(self.initial_value)
    }

    /// Highest action value for `state`
    pub fn max_value(&self, state: &S) -> f32 {
        match self.table.get(state) {
            None => self.initial_value,
            Some(values) => values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        }
    }

    /// Best action among `candidates` for `state`; ties go to the candidate listed first.
    pub fn best_action(&self, state: &S, candidates: &[A]) -> Option<A> {
        candidates.iter().copied().fold(None, |best: Option<(A, f32)>, a| {
            let value = self.get(state, a);
            match best {
                Some((_, best_value)) if best_value >= value => best,
                _ => Some((a, value)),
            }
        })
            .map(|(a, _)| a)
    }

    pub fn set(&mut self, state: S, action: A, value: f32) {
        let initial_value = self.initial_value;
        let values = self.table
            .entry(state)
            .or_insert_with(|| vec![initial_value; A::ACTION_SPACE as usize]);
        values[action.numeric() as usize] = value;
    }

    /// One temporal-difference update:
    /// `Q(s,a) += alpha * (reward + gamma * max_a' Q(s',a') - Q(s,a))`
    ///
    /// `next_state = None` marks a terminal transition (no future reward).
    /// Returns the updated value.
    pub fn update(
        &mut self,
        state: &S,
        action: A,
        reward: f32,
        next_state: Option<&S>,
        alpha: f32,
        gamma: f32,
    ) -> f32 {
        let future = next_state.map_or(0.0, |s| self.max_value(s));
        let current = self.get(state, action);
        let updated = current + alpha * (reward + gamma * future - current);
        self.set(state.clone(), action, updated);
        updated
    }

    /// Visited states in a stable order, for reports.
    pub fn states_sorted_by_value(&self) -> Vec<(&S, f32)> {
        self.table
            .iter()
            .map(|(s, values)| (s, values.iter().copied().fold(f32::NEG_INFINITY, f32::max)))
            .sorted_by(|(_, l), (_, r)| r.total_cmp(l))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::{Display, Formatter};

    use anyhow::Result;

    use crate::prelude::{ModelActionType, QlError};

    use super::*;

    #[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
    enum Move {
        Stay,
        Go,
    }

    impl Display for Move {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Action for Move {
        const ACTION_SPACE: ModelActionType = 2;

        fn numeric(&self) -> ModelActionType {
            match self {
                Move::Stay => 0,
                Move::Go => 1,
            }
        }

        fn try_from_numeric(value: ModelActionType) -> Result<Self> {
            match value {
                0 => Ok(Move::Stay),
                1 => Ok(Move::Go),
                _ => Err(QlError(format!("value {} out of range", value)).into()),
            }
        }
    }

    #[test]
    fn test_unseen_state_has_initial_value() {
        let table = QTable::<u32, Move>::new(0.5);
        assert_eq!(table.get(&3, Move::Go), 0.5);
        assert_eq!(table.max_value(&3), 0.5);
        assert!(table.is_empty());
    }

    #[test]
    fn test_update_moves_towards_target() {
        let mut table = QTable::<u32, Move>::new(0.0);
        table.set(2, Move::Go, 10.0);

        let v = table.update(&1, Move::Go, 1.0, Some(&2), 0.5, 0.9);
        // 0 + 0.5 * (1 + 0.9 * 10 - 0)
        assert!((v - 5.0).abs() < 1e-6);
        assert_eq!(table.get(&1, Move::Go), v);
        assert_eq!(table.get(&1, Move::Stay), 0.0);

        let v = table.update(&1, Move::Go, 1.0, None, 0.5, 0.9);
        assert!((v - 3.0).abs() < 1e-6);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_best_action_prefers_first_on_tie() {
        let mut table = QTable::<u32, Move>::new(0.0);
        assert_eq!(table.best_action(&0, &[Move::Go, Move::Stay]), Some(Move::Go));
        table.set(0, Move::Stay, 1.0);
        assert_eq!(table.best_action(&0, &[Move::Go, Move::Stay]), Some(Move::Stay));
        assert_eq!(table.best_action(&0, &[]), None);
    }

    #[test]
    fn test_states_sorted_by_value() {
        let mut table = QTable::<u32, Move>::new(0.0);
        table.set(1, Move::Go, 1.0);
        table.set(2, Move::Stay, 3.0);
        table.set(3, Move::Go, -1.0);
        let order: Vec<u32> = table.states_sorted_by_value().into_iter().map(|(s, _)| *s).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }
}
