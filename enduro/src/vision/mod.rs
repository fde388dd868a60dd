//! Frame => occupancy grid pipeline
//!
//! `offroad` => `road_grid` => `road_mask` => `vehicles` => `grid_mapper`, orchestrated by `extractor`.

use image::{GrayImage, RgbImage};

pub use error::ExtractionError;
pub use extractor::{Extraction, ExtractorParameter, StateExtractor};
pub use occupancy::{Cell, OccupancyGrid};
pub use types::{BoundingBox, GridPoint, RoadGrid, VehicleSet};

pub mod error;
pub mod extractor;
pub mod grid_mapper;
pub mod occupancy;
pub mod offroad;
pub mod overlay;
pub mod road_grid;
pub mod road_mask;
pub mod types;
pub mod vehicles;

/// Raw RGB screen content
pub type Frame = RgbImage;

/// Binary mask: `MASK_ON` for selected pixels, 0 otherwise
pub type Mask = GrayImage;

pub const MASK_ON: u8 = 255;
