use anyhow::{bail, Result};

use ql::prelude::DebugVisualizer;
use ql::util::format::format_count;

use crate::action::EnduroAction;
use crate::agent::Policy;
use crate::control::action_repeater::{ActionRepeatParameter, ActionRepeater, EmulatorMover};
use crate::emulator::{Emulator, EmulatorSettings};
use crate::vision::{ExtractorParameter, Frame, OccupancyGrid, StateExtractor};

#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeParameter {
    pub episodes: usize,
    /// Emulator frames per episode
    pub frames_per_episode: u64,
    /// Whether `Policy::learn` is called
    pub learn: bool,
    /// Whether extraction draws the overlay image
    pub draw: bool,
    /// Noop moves to wait for a readable first frame before giving up
    pub initial_observation_attempts: usize,
    /// End an episode early when the emulator says the game is over
    pub stop_on_game_over: bool,
    pub emulator: EmulatorSettings,
    pub action_repeat: ActionRepeatParameter,
    pub extractor: ExtractorParameter,
}

impl Default for EpisodeParameter {
    fn default() -> Self {
        Self {
            episodes: 1,
            frames_per_episode: 6500,
            learn: false,
            draw: false,
            initial_observation_attempts: 100,
            stop_on_game_over: false,
            emulator: EmulatorSettings::default(),
            action_repeat: ActionRepeatParameter::default(),
            extractor: ExtractorParameter::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpisodePhase {
    AwaitingInitialObservation,
    Acting,
    Sensing,
    Learning,
    Reporting,
    EpisodeComplete,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EpisodeSummary {
    /// 1-based
    pub episode: usize,
    pub iterations: u64,
    /// Iterations without a usable frame
    pub skipped_iterations: u64,
    pub frames: u64,
    pub total_reward: f32,
}

/// Runs episodes: observe, act, sense, learn, report - until the frame budget is used up.
///
/// Frames which cannot be turned into a grid are skipped: the policy neither senses, learns nor
/// reports in that iteration and the previous grid stays the current one.
pub struct EpisodeController<E: Emulator> {
    emulator: E,
    extractor: StateExtractor,
    repeater: ActionRepeater,
    param: EpisodeParameter,
    phase: EpisodePhase,
    last_grid: Option<OccupancyGrid>,
    last_image: Option<Frame>,
}

impl<E: Emulator> EpisodeController<E> {
    pub fn new(mut emulator: E, param: EpisodeParameter) -> Result<Self> {
        emulator.configure(&param.emulator)?;
        let extractor = StateExtractor::new(param.extractor.clone())?;
        let repeater = ActionRepeater::new(param.action_repeat.clone());
        Ok(Self {
            emulator,
            extractor,
            repeater,
            param,
            phase: EpisodePhase::EpisodeComplete,
            last_grid: None,
            last_image: None,
        })
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    /// Most recent successfully extracted grid
    pub fn last_grid(&self) -> Option<&OccupancyGrid> {
        self.last_grid.as_ref()
    }

    /// Frame (or overlay, when drawing) belonging to `last_grid`
    pub fn last_image(&self) -> Option<&Frame> {
        self.last_image.as_ref()
    }

    pub fn emulator(&self) -> &E {
        &self.emulator
    }

    pub fn into_emulator(self) -> E {
        self.emulator
    }

    pub fn run(&mut self, policy: &mut dyn Policy) -> Result<Vec<EpisodeSummary>> {
        let mut summaries = Vec::with_capacity(self.param.episodes);
        for episode in 1..=self.param.episodes {
            summaries.push(self.run_episode(policy, episode)?);
        }
        Ok(summaries)
    }

    pub fn run_episode(&mut self, policy: &mut dyn Policy, episode: usize) -> Result<EpisodeSummary> {
        self.enter(EpisodePhase::AwaitingInitialObservation);
        let grid = self.initial_observation()?;
        policy.initialise(&grid);
        self.last_grid = Some(grid);

        let start = self.emulator.current_frame_number();
        let mut summary = EpisodeSummary {
            episode,
            iterations: 0,
            skipped_iterations: 0,
            frames: 0,
            total_reward: 0.0,
        };

        while self.frames_played(start) < self.param.frames_per_episode {
            if self.param.stop_on_game_over && self.emulator.is_episode_over() {
                log::info!("game over after {} frames", format_count(self.frames_played(start)));
                break;
            }

            self.enter(EpisodePhase::Acting);
            let mut mover = EmulatorMover::new(&mut self.emulator, &self.repeater);
            policy.act(&mut mover)?;
            summary.total_reward += mover.reward();
            summary.iterations += 1;

            self.enter(EpisodePhase::Sensing);
            let Some(grid) = self.observe()? else {
                summary.skipped_iterations += 1;
                continue;
            };
            policy.sense(&grid);

            if self.param.learn {
                self.enter(EpisodePhase::Learning);
                policy.learn();
            }

            self.enter(EpisodePhase::Reporting);
            policy.callback(self.param.learn, episode, self.frames_played(start));
            self.last_grid = Some(grid);
        }

        summary.frames = self.frames_played(start);
        self.enter(EpisodePhase::EpisodeComplete);
        policy.episode_finished(episode);
        log::info!(
            "episode {}: {} frames, {} iterations ({} skipped), total reward: {}",
            episode,
            format_count(summary.frames),
            format_count(summary.iterations),
            format_count(summary.skipped_iterations),
            summary.total_reward
        );
        if let Some(grid) = &self.last_grid {
            log::debug!("last grid: {}", grid.one_line_info());
        }

        self.emulator.reset_episode()?;
        Ok(summary)
    }

    fn frames_played(&self, start: u64) -> u64 {
        self.emulator.current_frame_number().saturating_sub(start)
    }

    fn enter(&mut self, phase: EpisodePhase) {
        log::trace!("{:?} => {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Waits (doing nothing) for the first readable frame of an episode
    fn initial_observation(&mut self) -> Result<OccupancyGrid> {
        for _ in 0..self.param.initial_observation_attempts {
            if let Some(grid) = self.observe()? {
                return Ok(grid);
            }
            self.repeater.apply(&mut self.emulator, EnduroAction::Noop)?;
        }
        bail!(
            "no usable frame within {} attempts (frame {})",
            self.param.initial_observation_attempts,
            format_count(self.emulator.current_frame_number())
        )
    }

    /// Extracts the grid of the current frame; `None` if this frame shows no usable state
    fn observe(&mut self) -> Result<Option<OccupancyGrid>> {
        let frame = self.emulator.capture_frame()?;
        match self.extractor.run(frame, self.param.draw) {
            Ok(extraction) => {
                self.last_image = Some(extraction.image);
                Ok(Some(extraction.grid))
            }
            Err(e) if e.is_recoverable() => {
                log::warn!("frame {}: {}", format_count(self.emulator.current_frame_number()), e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::agent::Mover;
    use crate::simulation::{render_scene, RoadGeometry};
    use crate::vision::{BoundingBox, Cell, ExtractionError};

    use super::*;

    /// Shows a fixed scene; frames listed in `unreadable` show an empty road
    struct ScriptedEmulator {
        frame_number: u64,
        unreadable: Vec<u64>,
        /// From this frame on the captured frames have no pixels
        broken_from: Option<u64>,
        resets: usize,
        configured_seed: Option<u64>,
    }

    impl ScriptedEmulator {
        fn new(unreadable: Vec<u64>) -> Self {
            Self { frame_number: 0, unreadable, broken_from: None, resets: 0, configured_seed: None }
        }
    }

    impl Emulator for ScriptedEmulator {
        fn configure(&mut self, settings: &EmulatorSettings) -> Result<()> {
            self.configured_seed = Some(settings.seed);
            Ok(())
        }

        fn capture_frame(&mut self) -> Result<Frame> {
            if self.broken_from.is_some_and(|n| self.frame_number >= n) {
                return Ok(Frame::new(0, 0));
            }
            let geometry = RoadGeometry::default();
            let player = if self.unreadable.contains(&self.frame_number) {
                BoundingBox::new(0, 0, 0, 0)
            } else {
                BoundingBox::new(74, 135, 16, 10)
            };
            Ok(render_scene(&geometry, &player, &[BoundingBox::new(81, 98, 6, 4)]))
        }

        fn frame_dimensions(&self) -> (u32, u32) {
            (160, 210)
        }

        fn step(&mut self, _action: EnduroAction) -> Result<f32> {
            self.frame_number += 1;
            Ok(0.25)
        }

        fn is_episode_over(&self) -> bool {
            self.frame_number >= 20
        }

        fn reset_episode(&mut self) -> Result<()> {
            self.resets += 1;
            Ok(())
        }

        fn current_frame_number(&self) -> u64 {
            self.frame_number
        }
    }

    #[derive(Default)]
    struct RecordingPolicy {
        initialised: usize,
        sensed: Vec<OccupancyGrid>,
        learned: usize,
        callbacks: Vec<(bool, usize, u64)>,
        finished: Vec<usize>,
    }

    impl Policy for RecordingPolicy {
        fn initialise(&mut self, _grid: &OccupancyGrid) {
            self.initialised += 1;
        }

        fn act(&mut self, mover: &mut dyn Mover) -> Result<EnduroAction> {
            mover.do_move(EnduroAction::Accelerate)?;
            Ok(EnduroAction::Accelerate)
        }

        fn sense(&mut self, grid: &OccupancyGrid) {
            self.sensed.push(grid.clone());
        }

        fn learn(&mut self) {
            self.learned += 1;
        }

        fn callback(&mut self, learn: bool, episode: usize, iteration: u64) {
            self.callbacks.push((learn, episode, iteration));
        }

        fn episode_finished(&mut self, episode: usize) {
            self.finished.push(episode);
        }
    }

    fn controller(unreadable: Vec<u64>, param: EpisodeParameter) -> EpisodeController<ScriptedEmulator> {
        EpisodeController::new(ScriptedEmulator::new(unreadable), param).unwrap()
    }

    #[test]
    fn test_episode_loop() {
        let param = EpisodeParameter {
            episodes: 2,
            frames_per_episode: 40,
            learn: true,
            ..EpisodeParameter::default()
        };
        let mut controller = controller(vec![], param);
        let mut policy = RecordingPolicy::default();

        let summaries = controller.run(&mut policy).unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0], EpisodeSummary {
            episode: 1,
            iterations: 10,
            skipped_iterations: 0,
            frames: 40,
            total_reward: 10.0,
        });
        assert_eq!(summaries[1].episode, 2);
        assert_eq!(policy.initialised, 2);
        assert_eq!(policy.finished, vec![1, 2]);
        assert_eq!(policy.learned, 20);
        assert_eq!(policy.callbacks[0], (true, 1, 4));
        assert_eq!(policy.callbacks[9], (true, 1, 40));
        assert_eq!(policy.callbacks[10], (true, 2, 4));
        assert!(policy.sensed.iter().all(|g| g.get(0, 5) == Cell::Player && g.get(4, 5) == Cell::Opponent));
        assert_eq!(controller.phase(), EpisodePhase::EpisodeComplete);
        assert_eq!(controller.emulator().resets, 2);
        assert_eq!(controller.emulator().configured_seed, Some(123));
    }

    #[test]
    fn test_budget_is_not_exceeded_by_more_than_one_move() {
        let param = EpisodeParameter {
            frames_per_episode: 10,
            ..EpisodeParameter::default()
        };
        let mut controller = controller(vec![], param);
        let mut policy = RecordingPolicy::default();

        let summaries = controller.run(&mut policy).unwrap();

        // 4 frames per iteration: stops at the first frame count >= 10
        assert_eq!(summaries[0].frames, 12);
        assert_eq!(summaries[0].iterations, 3);
        assert_eq!(policy.learned, 0);
        assert!(policy.callbacks.iter().all(|&(learn, _, _)| !learn));
    }

    #[test]
    fn test_unreadable_frames_are_skipped() {
        let param = EpisodeParameter {
            frames_per_episode: 20,
            learn: true,
            ..EpisodeParameter::default()
        };
        let mut controller = controller(vec![8, 12], param);
        let mut policy = RecordingPolicy::default();

        let summaries = controller.run(&mut policy).unwrap();

        assert_eq!(summaries[0].iterations, 5);
        assert_eq!(summaries[0].skipped_iterations, 2);
        assert_eq!(policy.sensed.len(), 3);
        assert_eq!(policy.learned, 3);
        assert_eq!(policy.callbacks.iter().map(|c| c.2).collect::<Vec<_>>(), vec![4, 16, 20]);
        assert!(controller.last_grid().is_some());
    }

    #[test]
    fn test_waits_for_the_first_readable_frame() {
        let param = EpisodeParameter {
            frames_per_episode: 8,
            draw: true,
            ..EpisodeParameter::default()
        };
        // the Noop repeater moves 8 frames per attempt
        let mut controller = controller(vec![0, 8], param);
        let mut policy = RecordingPolicy::default();

        let summaries = controller.run(&mut policy).unwrap();

        assert_eq!(policy.initialised, 1);
        assert_eq!(summaries[0].frames, 8);
        assert_eq!(controller.emulator().current_frame_number(), 24);
        assert_eq!(controller.last_image().map(|i| i.dimensions()), Some((640, 840)));
    }

    #[test]
    fn test_gives_up_without_readable_frame() {
        let param = EpisodeParameter {
            initial_observation_attempts: 3,
            ..EpisodeParameter::default()
        };
        let mut controller = controller(vec![0, 8, 16], param);

        assert!(controller.run(&mut RecordingPolicy::default()).is_err());
        assert_eq!(controller.phase(), EpisodePhase::AwaitingInitialObservation);
    }

    #[test]
    fn test_empty_frame_ends_the_run() {
        let param = EpisodeParameter {
            frames_per_episode: 40,
            ..EpisodeParameter::default()
        };
        let mut emulator = ScriptedEmulator::new(vec![]);
        emulator.broken_from = Some(8);
        let mut controller = EpisodeController::new(emulator, param).unwrap();
        let mut policy = RecordingPolicy::default();

        let error = controller.run(&mut policy).unwrap_err();

        assert_eq!(
            error.downcast_ref::<ExtractionError>(),
            Some(&ExtractionError::EmptyFrame { width: 0, height: 0 })
        );
        assert_eq!(policy.callbacks, vec![(false, 1, 4)]);
        assert!(policy.finished.is_empty());
    }

    #[test]
    fn test_stop_on_game_over() {
        let param = EpisodeParameter {
            stop_on_game_over: true,
            ..EpisodeParameter::default()
        };
        let mut controller = controller(vec![], param);

        let summaries = controller.run(&mut RecordingPolicy::default()).unwrap();

        assert_eq!(summaries[0].frames, 20);
    }
}
