use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::action::EnduroAction;
use crate::emulator::{Emulator, EmulatorSettings};
use crate::simulation::render::{render_scene, RoadGeometry};
use crate::vision::{BoundingBox, Frame};

const PLAYER_WIDTH: f64 = 16.0;
const PLAYER_HEIGHT: f64 = 10.0;
/// Lanes the opponents drive on
const OPPONENT_LANES: [f64; 3] = [-0.45, 0.0, 0.45];

#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticRoadParameter {
    pub geometry: RoadGeometry,
    /// Top row of the player's car
    pub player_top: u32,
    /// Frames after which an episode is over. `None` plays forever.
    pub episode_frames: Option<u64>,
    /// Speeds are measured in road depth per frame
    pub max_speed: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    pub opponent_speed: f64,
    pub steering_step: f64,
    /// Maximum distance of the player's car center from the middle of the road
    pub max_lateral: f64,
    pub spawn_probability: f64,
    pub max_opponents: usize,
}

impl Default for SyntheticRoadParameter {
    fn default() -> Self {
        Self {
            geometry: RoadGeometry::default(),
            player_top: 135,
            episode_frames: None,
            max_speed: 0.02,
            acceleration: 0.001,
            deceleration: 0.003,
            opponent_speed: 0.008,
            steering_step: 0.05,
            max_lateral: 0.6,
            spawn_probability: 0.02,
            max_opponents: 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Opponent {
    lateral: f64,
    /// 0 = horizon, 1 = dashboard
    depth: f64,
}

#[derive(Clone, Debug, PartialEq)]
struct RoadState {
    speed: f64,
    lateral: f64,
    opponents: Vec<Opponent>,
    last_action: EnduroAction,
    episode_frame: u64,
}

impl Default for RoadState {
    fn default() -> Self {
        Self {
            speed: 0.0,
            lateral: 0.0,
            opponents: vec![],
            last_action: EnduroAction::Noop,
            episode_frame: 0,
        }
    }
}

/// Enduro look-alike: the player passes opponents on a straight road.
///
/// Passing an opponent gives a reward of 1, being passed costs 1. Driving into an opponent stops
/// the car.
pub struct SyntheticRoad {
    param: SyntheticRoadParameter,
    settings: EmulatorSettings,
    state: RoadState,
    rng: StdRng,
    frame_number: u64,
}

impl SyntheticRoad {
    pub fn new(param: SyntheticRoadParameter) -> Self {
        let settings = EmulatorSettings::default();
        let rng = StdRng::seed_from_u64(settings.seed);
        Self {
            param,
            settings,
            state: RoadState::default(),
            rng,
            frame_number: 0,
        }
    }

    pub fn speed(&self) -> f64 {
        self.state.speed
    }

    pub fn lateral(&self) -> f64 {
        self.state.lateral
    }

    pub fn opponent_count(&self) -> usize {
        self.state.opponents.len()
    }

    fn player_depth(&self) -> f64 {
        let geometry = &self.param.geometry;
        geometry.depth_at(self.param.player_top as f64 + PLAYER_HEIGHT / 2.0)
    }

    fn player_box(&self) -> BoundingBox {
        let geometry = &self.param.geometry;
        let center_y = self.param.player_top as f64 + PLAYER_HEIGHT / 2.0;
        let center_x = geometry.x_at(center_y, self.state.lateral);
        BoundingBox::new(
            (center_x - PLAYER_WIDTH / 2.0).round() as i32,
            self.param.player_top as i32,
            PLAYER_WIDTH as i32,
            PLAYER_HEIGHT as i32,
        )
    }

    /// Opponents shrink towards the horizon like the road does
    fn opponent_box(&self, opponent: &Opponent) -> BoundingBox {
        let geometry = &self.param.geometry;
        let center_y = geometry.row_at(opponent.depth);
        let player_y = self.param.player_top as f64 + PLAYER_HEIGHT / 2.0;
        let scale = geometry.half_width(center_y) / geometry.half_width(player_y);
        let width = (PLAYER_WIDTH * scale).round().max(2.0);
        let height = (PLAYER_HEIGHT * scale).round().max(2.0);
        let center_x = geometry.x_at(center_y, opponent.lateral);
        BoundingBox::new(
            (center_x - width / 2.0).round() as i32,
            (center_y - height / 2.0).round() as i32,
            width as i32,
            height as i32,
        )
    }

    fn apply(&mut self, action: EnduroAction) {
        let p = &self.param;
        let state = &mut self.state;
        match action {
            EnduroAction::Accelerate => state.speed = (state.speed + p.acceleration).min(p.max_speed),
            EnduroAction::Brake => state.speed = (state.speed - p.deceleration).max(0.0),
            EnduroAction::Left => state.lateral = (state.lateral - p.steering_step).max(-p.max_lateral),
            EnduroAction::Right => state.lateral = (state.lateral + p.steering_step).min(p.max_lateral),
            EnduroAction::Noop => {}
        }
    }

    /// Moves the traffic by one frame and returns the reward
    fn advance_traffic(&mut self) -> f32 {
        let relative_speed = self.state.speed - self.param.opponent_speed;
        let player_depth = self.player_depth();
        let lateral = self.state.lateral;

        let mut collided = false;
        for opponent in self.state.opponents.iter_mut() {
            let before = opponent.depth;
            opponent.depth += relative_speed;
            let crossed_player = (before < player_depth) != (opponent.depth < player_depth);
            if crossed_player && (opponent.lateral - lateral).abs() < 0.25 {
                collided = true;
                opponent.depth = player_depth - 0.06;
            }
        }
        if collided {
            log::debug!("collision at frame {}", self.frame_number);
            self.state.speed = 0.0;
        }

        let mut reward = 0.0;
        self.state.opponents.retain(|o| {
            if o.depth > 1.0 {
                reward += 1.0;
                false
            } else if o.depth < 0.0 {
                reward -= 1.0;
                false
            } else {
                true
            }
        });

        self.spawn_opponent(relative_speed);
        reward
    }

    /// New opponents show up at the horizon when we are faster than them, behind us otherwise
    fn spawn_opponent(&mut self, relative_speed: f64) {
        if relative_speed == 0.0
            || self.state.opponents.len() >= self.param.max_opponents
            || !self.rng.gen_bool(self.param.spawn_probability) {
            return;
        }
        let depth = if relative_speed > 0.0 { 0.0 } else { 1.0 };
        if self.state.opponents.iter().any(|o| (o.depth - depth).abs() < 0.1) {
            return;
        }
        let lateral = OPPONENT_LANES[self.rng.gen_range(0..OPPONENT_LANES.len())];
        self.state.opponents.push(Opponent { lateral, depth });
    }
}

impl Default for SyntheticRoad {
    fn default() -> Self {
        SyntheticRoad::new(SyntheticRoadParameter::default())
    }
}

impl Emulator for SyntheticRoad {
    fn configure(&mut self, settings: &EmulatorSettings) -> Result<()> {
        log::debug!(
            "synthetic road with seed {}, repeat probability {}, rom {} is not loaded",
            settings.seed, settings.repeat_action_probability, settings.rom.display()
        );
        self.settings = settings.clone();
        self.rng = StdRng::seed_from_u64(settings.seed);
        self.state = RoadState::default();
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<Frame> {
        let opponents = self.state.opponents
            .iter()
            .map(|o| self.opponent_box(o))
            .collect::<Vec<_>>();
        Ok(render_scene(&self.param.geometry, &self.player_box(), &opponents))
    }

    fn frame_dimensions(&self) -> (u32, u32) {
        (self.param.geometry.width, self.param.geometry.height)
    }

    fn step(&mut self, action: EnduroAction) -> Result<f32> {
        let action = if self.settings.repeat_action_probability > 0.0
            && self.rng.gen::<f32>() < self.settings.repeat_action_probability {
            self.state.last_action
        } else {
            action
        };
        log::trace!("frame {}: joystick {} ({})", self.frame_number, action.emulator_code(), action);
        self.apply(action);
        self.state.last_action = action;

        let reward = self.advance_traffic();
        self.state.episode_frame += 1;
        self.frame_number += 1;
        Ok(reward)
    }

    fn is_episode_over(&self) -> bool {
        self.param.episode_frames.map_or(false, |n| self.state.episode_frame >= n)
    }

    fn reset_episode(&mut self) -> Result<()> {
        self.state = RoadState::default();
        Ok(())
    }

    fn current_frame_number(&self) -> u64 {
        self.frame_number
    }
}
