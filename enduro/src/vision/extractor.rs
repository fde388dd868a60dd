use std::path::Path;

use anyhow::{Context, Result};

use crate::vision::grid_mapper::map_vehicles;
use crate::vision::offroad::{remove_offroad_regions, OffroadParameter};
use crate::vision::overlay::{draw_overlay, OverlayParameter};
use crate::vision::road_grid::{detect_road_grid, RoadGridParameter};
use crate::vision::road_mask::{build_road_mask, RoadMaskParameter};
use crate::vision::vehicles::{detect_vehicles, VehicleParameter};
use crate::vision::{ExtractionError, Frame, OccupancyGrid, RoadGrid, VehicleSet};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtractorParameter {
    pub offroad: OffroadParameter,
    pub road_grid: RoadGridParameter,
    pub road_mask: RoadMaskParameter,
    pub vehicles: VehicleParameter,
    pub overlay: OverlayParameter,
}

/// Result of one successful extraction
#[derive(Clone, Debug)]
pub struct Extraction {
    pub grid: OccupancyGrid,
    pub road_grid: RoadGrid,
    pub vehicles: VehicleSet,
    /// The raw frame, or the annotated overlay if drawing was requested
    pub image: Frame,
}

impl Extraction {
    pub fn save_image(&self, path: &Path) -> Result<()> {
        self.image.save(path)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

/// Turns emulator frames into occupancy grids
pub struct StateExtractor {
    param: ExtractorParameter,
}

impl StateExtractor {
    pub fn new(param: ExtractorParameter) -> Result<Self> {
        param.road_grid.validate()?;
        Ok(Self { param })
    }

    pub fn param(&self) -> &ExtractorParameter {
        &self.param
    }

    /// Runs the full pipeline on `frame`.
    ///
    /// Fails if the frame offers no usable state: never treat such a frame as an empty road.
    pub fn run(&self, frame: Frame, draw: bool) -> Result<Extraction, ExtractionError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(ExtractionError::EmptyFrame { width: frame.width(), height: frame.height() });
        }

        let masked = remove_offroad_regions(&frame, &self.param.offroad);
        let road_grid = detect_road_grid(&masked, &self.param.road_grid)?;
        let road_mask = build_road_mask(&road_grid, masked.width(), masked.height(), &self.param.road_mask);
        let vehicles = detect_vehicles(&masked, &road_mask, &self.param.vehicles)?;
        let grid = map_vehicles(&road_grid, &vehicles)?;

        let image = if draw {
            draw_overlay(&frame, &road_grid, &vehicles, &self.param.overlay)
        } else {
            frame
        };

        Ok(Extraction {
            grid,
            road_grid,
            vehicles,
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::simulation::render::{render_scene, RoadGeometry};
    use crate::vision::{BoundingBox, Cell, GridPoint};

    use super::*;

    fn extractor() -> StateExtractor {
        StateExtractor::new(ExtractorParameter::default()).unwrap()
    }

    #[test]
    fn test_player_alone_on_the_road() {
        let geometry = RoadGeometry::default();
        let player = BoundingBox::new(74, 135, 16, 10);
        let frame = render_scene(&geometry, &player, &[]);

        let extraction = extractor().run(frame, false).unwrap();

        assert_eq!(extraction.vehicles, VehicleSet { self_vehicle: player, others: vec![] });
        assert_eq!((extraction.grid.rows(), extraction.grid.columns()), (11, 10));
        assert_eq!(extraction.grid.count(Cell::Player), 1);
        assert_eq!(extraction.grid.count(Cell::Opponent), 0);
        assert_eq!(extraction.grid.player_position(), Some((0, 5)));
    }

    #[test]
    fn test_road_grid_follows_road_edges() {
        let geometry = RoadGeometry::default();
        let frame = render_scene(&geometry, &BoundingBox::new(74, 135, 16, 10), &[]);

        let extraction = extractor().run(frame, false).unwrap();

        let road_grid = &extraction.road_grid;
        assert_eq!((road_grid.rows(), road_grid.columns()), (12, 11));
        assert_eq!(road_grid.left_edge(10), GridPoint::new(35, 132));
        assert_eq!(road_grid.right_edge(10), GridPoint::new(125, 132));
        assert_eq!(road_grid.left_edge(11), GridPoint::new(27, 147));
        assert_eq!(road_grid.right_edge(11), GridPoint::new(133, 147));
        for line in road_grid.lines() {
            assert!(line.iter().tuple_windows().all(|(a, b)| a.x <= b.x));
        }
    }

    #[test]
    fn test_opponents_ahead() {
        let geometry = RoadGeometry::default();
        let player = BoundingBox::new(74, 135, 16, 10);
        let opponent = BoundingBox::new(81, 98, 6, 4);
        let frame = render_scene(&geometry, &player, &[opponent]);

        let extraction = extractor().run(frame, false).unwrap();

        assert_eq!(extraction.vehicles.others, vec![opponent]);
        assert_eq!(extraction.grid.get(4, 5), Cell::Opponent);
        assert_eq!(extraction.grid.count(Cell::Opponent), 1);
    }

    #[test]
    fn test_missing_player_is_reported() {
        let geometry = RoadGeometry::default();
        // player car below the road grid
        let frame = render_scene(&geometry, &BoundingBox::new(74, 185, 16, 10), &[]);

        let result = extractor().run(frame, false);

        assert_eq!(result.err(), Some(ExtractionError::NoSelfVehicleDetected));
    }

    #[test]
    fn test_drawing_does_not_change_the_grid() {
        let geometry = RoadGeometry::default();
        let frame = render_scene(&geometry, &BoundingBox::new(74, 135, 16, 10), &[BoundingBox::new(81, 98, 6, 4)]);

        let plain = extractor().run(frame.clone(), false).unwrap();
        let drawn = extractor().run(frame.clone(), true).unwrap();

        assert_eq!(plain.grid, drawn.grid);
        assert_eq!(plain.image, frame);
        assert_eq!(drawn.image.dimensions(), (640, 840));
    }

    #[test]
    fn test_save_image() {
        let geometry = RoadGeometry::default();
        let frame = render_scene(&geometry, &BoundingBox::new(74, 135, 16, 10), &[]);
        let extraction = extractor().run(frame, true).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.png");

        extraction.save_image(&path).unwrap();

        assert_eq!(image::open(&path).unwrap().to_rgb8(), extraction.image);
    }

    #[test]
    fn test_empty_frame() {
        assert_eq!(extractor().run(Frame::new(0, 0), false).err(), Some(ExtractionError::EmptyFrame { width: 0, height: 0 }));
    }
}
