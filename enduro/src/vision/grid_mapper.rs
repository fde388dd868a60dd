use itertools::Itertools;

use crate::vision::{Cell, ExtractionError, GridPoint, OccupancyGrid, RoadGrid, VehicleSet};

/// Places the detected vehicles into the occupancy grid.
///
/// The grid has one row less and one column less than the road grid, row 0 being the row
/// closest to the player. An opponent landing on the player's cell is pushed further ahead to
/// the next free cell, so a near-collision still shows up in the grid. Opponents outside the road
/// grid are dropped.
pub fn map_vehicles(road_grid: &RoadGrid, vehicles: &VehicleSet) -> Result<OccupancyGrid, ExtractionError> {
    let rows = road_grid.rows() - 1;
    let mut grid = OccupancyGrid::new(rows, road_grid.columns() - 1);

    let center = vehicles.self_vehicle.center();
    let (row, column) = locate_cell(road_grid, center)
        .ok_or(ExtractionError::UnresolvableCellMapping { center })?;
    grid.set(proximity_row(road_grid, row), column, Cell::Player);

    for other in &vehicles.others {
        let center = other.center();
        let Some((row, column)) = locate_cell(road_grid, center) else {
            log::debug!("vehicle at ({}, {}) is off the road grid", center.x, center.y);
            continue;
        };
        let mut row = proximity_row(road_grid, row);

        if grid.get(row, column) == Cell::Player {
            while row < rows && grid.get(row, column) != Cell::Empty {
                row += 1;
            }
            if row == rows {
                log::debug!("no free cell ahead of the player for vehicle at ({}, {})", center.x, center.y);
                continue;
            }
            log::trace!("collision: vehicle at ({}, {}) moved to row {}", center.x, center.y, row);
        }
        grid.set(row, column, Cell::Opponent);
    }

    Ok(grid)
}

/// Road grid scanline index (top = far) => occupancy row (0 = near)
fn proximity_row(road_grid: &RoadGrid, row: usize) -> usize {
    road_grid.rows() - row - 2
}

/// First road grid cell `(row, column)` containing `point`, scanning rows top-down and
/// columns left to right. Points on a shared border belong to the first cell found.
pub fn locate_cell(road_grid: &RoadGrid, point: GridPoint) -> Option<(usize, usize)> {
    (0..road_grid.rows() - 1)
        .cartesian_product(0..road_grid.columns() - 1)
        .find(|&(row, column)| point_in_polygon(&road_grid.cell_polygon(row, column), point))
}

/// Inside-or-on-border test for a simple polygon
pub fn point_in_polygon(polygon: &[GridPoint], p: GridPoint) -> bool {
    let edges = || polygon.iter().zip(polygon.iter().cycle().skip(1));

    if edges().any(|(a, b)| on_segment(*a, *b, p)) {
        return true;
    }

    edges()
        .filter(|(a, b)| (a.y > p.y) != (b.y > p.y))
        .filter(|(a, b)| {
            let x_cross = a.x as f64 + (p.y - a.y) as f64 * (b.x - a.x) as f64 / (b.y - a.y) as f64;
            (p.x as f64) < x_cross
        })
        .count() % 2 == 1
}

fn on_segment(a: GridPoint, b: GridPoint, p: GridPoint) -> bool {
    let cross = (b.x - a.x) as i64 * (p.y - a.y) as i64 - (b.y - a.y) as i64 * (p.x - a.x) as i64;
    cross == 0
        && p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
