use image::Luma;
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

use crate::vision::{GridPoint, Mask, MASK_ON, RoadGrid};

#[derive(Clone, Debug, PartialEq)]
pub struct RoadMaskParameter {
    /// Minimum number of pixels the road edges are moved inwards.
    /// Scanline `i` (counted from the top) is shrunk by `max(min_edge_shrink, i)` on each side.
    pub min_edge_shrink: i32,
}

impl Default for RoadMaskParameter {
    fn default() -> Self {
        Self { min_edge_shrink: 5 }
    }
}

/// Outline of the drivable area, with the noisy road edges cut off.
///
/// Traces the top scanline left to right, the right edge down, the bottom scanline right to left
/// and the left edge up. Repeated corners are collapsed and the polygon is left open.
pub fn road_polygon(grid: &RoadGrid, param: &RoadMaskParameter) -> Vec<Point<i32>> {
    let last = grid.rows() - 1;
    let shrunk = |row: usize, column: usize| -> Point<i32> {
        let GridPoint { x, y } = grid.point(row, column);
        let shrink = param.min_edge_shrink.max(row as i32);
        if column == 0 {
            Point::new(x + shrink, y)
        } else if column == grid.columns() - 1 {
            Point::new(x - shrink, y)
        } else {
            Point::new(x, y)
        }
    };
    let right = grid.columns() - 1;

    let mut polygon: Vec<Point<i32>> = (0..grid.columns()).map(|j| shrunk(0, j))
        .chain((0..grid.rows()).map(|i| shrunk(i, right)))
        .chain((0..grid.columns()).rev().map(|j| shrunk(last, j)))
        .chain((0..grid.rows()).rev().map(|i| shrunk(i, 0)))
        .collect();

    polygon.dedup();
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    polygon
}

/// Filled road polygon (boundary included) as a mask of `width` x `height`
pub fn build_road_mask(grid: &RoadGrid, width: u32, height: u32, param: &RoadMaskParameter) -> Mask {
    let mut mask = Mask::new(width, height);
    let polygon = road_polygon(grid, param);
    if polygon.len() < 3 {
        log::debug!("road polygon degenerated to {} points", polygon.len());
        return mask;
    }
    draw_polygon_mut(&mut mask, &polygon, Luma([MASK_ON]));
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trapezoid_grid() -> RoadGrid {
        RoadGrid::new(vec![
            vec![GridPoint::new(40, 10), GridPoint::new(50, 10), GridPoint::new(60, 10)],
            vec![GridPoint::new(30, 20), GridPoint::new(50, 20), GridPoint::new(70, 20)],
            vec![GridPoint::new(20, 30), GridPoint::new(50, 30), GridPoint::new(80, 30)],
        ])
    }

    #[test]
    fn test_polygon_trace() {
        let polygon = road_polygon(&trapezoid_grid(), &RoadMaskParameter::default());
        assert_eq!(
            polygon,
            vec![
                Point::new(45, 10), Point::new(50, 10), Point::new(55, 10),
                Point::new(65, 20), Point::new(75, 30),
                Point::new(50, 30), Point::new(25, 30),
                Point::new(35, 20),
            ]
        );
    }

    #[test]
    fn test_shrink_grows_with_row_index() {
        let lines = (0..8)
            .map(|i| vec![GridPoint::new(10, i * 5), GridPoint::new(90, i * 5)])
            .collect();
        let polygon = road_polygon(&RoadGrid::new(lines), &RoadMaskParameter::default());
        // bottom row (index 7) is cut by 7 pixels, the top rows by the minimum of 5
        assert!(polygon.contains(&Point::new(17, 35)));
        assert!(polygon.contains(&Point::new(83, 35)));
        assert!(polygon.contains(&Point::new(15, 0)));
        assert!(polygon.contains(&Point::new(85, 25)));
    }

    #[test]
    fn test_mask_covers_shrunk_road_only() {
        let mask = build_road_mask(&trapezoid_grid(), 100, 40, &RoadMaskParameter::default());
        assert_eq!(mask.dimensions(), (100, 40));

        let on = |x, y| mask.get_pixel(x, y).0[0] == MASK_ON;
        assert!(on(50, 20));
        assert!(on(45, 10));
        assert!(on(75, 30));
        assert!(!on(40, 10));
        assert!(!on(22, 30));
        assert!(!on(50, 5));
        assert!(!on(50, 35));
    }
}
