use anyhow::Result;
use itertools::Itertools;
use ql::prelude::QlError;

use crate::vision::{ExtractionError, Frame, GridPoint, RoadGrid};

/// Where to probe the road.
///
/// The row heights are tuned to the perspective of the Enduro road: dense near the horizon,
/// sparse close to the player.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadGridParameter {
    /// Scanline heights relative to the frame height, top to bottom
    pub row_heights: Vec<f64>,
    /// Positions of the grid points between the left (0) and right (100) road edge
    pub column_percents: Vec<u32>,
}

impl Default for RoadGridParameter {
    fn default() -> Self {
        Self {
            row_heights: vec![0.33, 0.34, 0.36, 0.38, 0.4, 0.43, 0.46, 0.49, 0.53, 0.57, 0.63, 0.7],
            column_percents: (0..=100).step_by(10).collect(),
        }
    }
}

impl RoadGridParameter {
    pub fn validate(&self) -> Result<()> {
        if self.row_heights.len() < 2 || self.column_percents.len() < 2 {
            return Err(QlError::from("road grid needs at least two rows and two columns").into());
        }
        if !self.row_heights.iter().all(|h| (0.0..1.0).contains(h))
            || !self.row_heights.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(QlError::from("row heights must be strictly increasing within [0, 1)").into());
        }
        if self.column_percents.iter().any(|&p| p > 100)
            || !self.column_percents.iter().tuple_windows().all(|(a, b)| a <= b) {
            return Err(QlError::from("column percents must be non-decreasing within [0, 100]").into());
        }
        Ok(())
    }

    /// Nominal scanline rows for a frame of `height`
    pub fn probe_rows(&self, height: u32) -> Vec<u32> {
        self.row_heights
            .iter()
            .map(|&h| (h * height as f64) as u32)
            .collect()
    }
}

/// Builds the road grid from a frame with the offroad background removed.
///
/// Every scanline keeps its nominal y, even if the edges had to be taken from a row further down.
pub fn detect_road_grid(masked: &Frame, param: &RoadGridParameter) -> Result<RoadGrid, ExtractionError> {
    let lines = param.probe_rows(masked.height())
        .into_iter()
        .map(|y| -> Result<Vec<GridPoint>, ExtractionError> {
            let (left, right) = intersect_road(masked, y)?;
            Ok(param.column_percents
                .iter()
                .map(|&p| GridPoint::new(interpolate(left, right, p), y as i32))
                .collect())
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RoadGrid::new(lines))
}

/// Left and right road edge on scanline `y`.
///
/// Aliasing may leave a scanline with less than two edge pixels; then we continue with the rows
/// below (towards the player) until the bottom of the frame.
pub fn intersect_road(masked: &Frame, y: u32) -> Result<(u32, u32), ExtractionError> {
    for row in y..masked.height() {
        match road_edges(masked, row) {
            Some(edges) => {
                if row != y {
                    log::trace!("scanline {} degenerated, took edges from row {}", y, row);
                }
                return Ok(edges);
            }
            None => continue,
        }
    }
    Err(ExtractionError::DegenerateScanline { row: y })
}

/// First and last non-black pixel of row `y`, if there are at least two of them
fn road_edges(masked: &Frame, y: u32) -> Option<(u32, u32)> {
    let mut non_background = (0..masked.width()).filter(|&x| masked.get_pixel(x, y).0 != [0, 0, 0]);
    let first = non_background.next()?;
    let last = non_background.last()?;
    Some((first, last))
}

/// `left + (right - left) * percent / 100`, floored
fn interpolate(left: u32, right: u32, percent: u32) -> i32 {
    (left + (right - left) * percent / 100) as i32
}
