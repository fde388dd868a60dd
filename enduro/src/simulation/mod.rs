//! A small stand-in for the Enduro game, drawing frames which look alike enough to run the
//! vision pipeline and the control loop without the real emulator.

pub use render::{render_scene, RoadGeometry};
pub use synthetic_road::{SyntheticRoad, SyntheticRoadParameter};

pub mod render;
pub mod synthetic_road;
