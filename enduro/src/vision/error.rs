use std::fmt::{Display, Formatter};

use crate::vision::GridPoint;

/// Reasons why a frame yields no usable state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// The emulator delivered a frame without pixels
    EmptyFrame { width: u32, height: u32 },
    /// No scanline from `row` down to the bottom of the frame shows both road edges
    DegenerateScanline { row: u32 },
    /// Nothing inside the road region looks like the player's car
    NoSelfVehicleDetected,
    /// The player's car center lies outside every road grid cell
    UnresolvableCellMapping { center: GridPoint },
}

impl ExtractionError {
    /// Whether the failure only concerns the current frame, so the next one may well succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            ExtractionError::DegenerateScanline { .. }
            | ExtractionError::NoSelfVehicleDetected
            | ExtractionError::UnresolvableCellMapping { .. } => true,
            ExtractionError::EmptyFrame { .. } => false,
        }
    }
}

impl Display for ExtractionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionError::EmptyFrame { width, height } =>
                write!(f, "empty frame of {}x{} pixels", width, height),
            ExtractionError::DegenerateScanline { row } =>
                write!(f, "no road edges found on scanline {} or below", row),
            ExtractionError::NoSelfVehicleDetected =>
                f.write_str("player vehicle not detected"),
            ExtractionError::UnresolvableCellMapping { center } =>
                write!(f, "player vehicle center ({}, {}) is outside of the road grid", center.x, center.y),
        }
    }
}

impl std::error::Error for ExtractionError {}
