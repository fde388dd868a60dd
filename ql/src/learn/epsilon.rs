use rand::Rng;

/// Linear epsilon-greedy exploration schedule.
///
/// During the first `pure_random_steps` every decision explores.
/// Afterwards epsilon decays linearly from `epsilon_max` to `epsilon_min` over `decay_steps`.
#[derive(Clone, Debug, PartialEq)]
pub struct EpsilonGreedy {
    pub epsilon_max: f32,
    pub epsilon_min: f32,
    pub pure_random_steps: usize,
    pub decay_steps: f32,
    epsilon: f32,
    step_count: usize,
}

impl EpsilonGreedy {
    pub fn new(epsilon_max: f32, epsilon_min: f32, pure_random_steps: usize, decay_steps: f32) -> Self {
        assert!(epsilon_min <= epsilon_max);
        assert!(decay_steps > 0.0);
        Self {
            epsilon_max,
            epsilon_min,
            pure_random_steps,
            decay_steps,
            epsilon: epsilon_max,
            step_count: 0,
        }
    }

    /// A schedule which never explores
    pub fn greedy() -> Self {
        Self::new(0.0, 0.0, 0, 1.0)
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    fn epsilon_interval(&self) -> f32 {
        self.epsilon_max - self.epsilon_min
    }

    /// Decides whether the next action shall be a random one and advances the schedule by one step.
    pub fn explore<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.step_count += 1;
        let explore = self.step_count <= self.pure_random_steps || self.epsilon > rng.gen::<f32>();

        if self.step_count > self.pure_random_steps {
            self.epsilon = f32::max(
                self.epsilon - self.epsilon_interval() / self.decay_steps,
                self.epsilon_min,
            );
        }
        explore
    }
}
