use imageproc::point::Point;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<GridPoint> for Point<i32> {
    fn from(p: GridPoint) -> Self {
        Point::new(p.x, p.y)
    }
}

/// Perspective mesh of reference points along the road.
///
/// `lines[i][j]`: scanline `i` (top = farthest away from the player) and column `j` (left to right).
/// All scanlines have the same number of points and x is non-decreasing within a scanline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoadGrid {
    lines: Vec<Vec<GridPoint>>,
}

impl RoadGrid {
    pub fn new(lines: Vec<Vec<GridPoint>>) -> Self {
        assert!(lines.len() >= 2, "a road grid needs at least two scanlines");
        let columns = lines[0].len();
        assert!(columns >= 2, "a road grid needs at least two columns");
        assert!(lines.iter().all(|l| l.len() == columns), "scanlines must have equal length");
        Self { lines }
    }

    /// Number of scanlines
    pub fn rows(&self) -> usize {
        self.lines.len()
    }

    /// Number of points per scanline
    pub fn columns(&self) -> usize {
        self.lines[0].len()
    }

    pub fn lines(&self) -> &[Vec<GridPoint>] {
        &self.lines
    }

    pub fn point(&self, row: usize, column: usize) -> GridPoint {
        self.lines[row][column]
    }

    pub fn left_edge(&self, row: usize) -> GridPoint {
        self.lines[row][0]
    }

    pub fn right_edge(&self, row: usize) -> GridPoint {
        self.lines[row][self.columns() - 1]
    }

    /// Corners of cell `(row, column)` in polygon order:
    /// top-left, bottom-left, bottom-right, top-right
    pub fn cell_polygon(&self, row: usize, column: usize) -> [GridPoint; 4] {
        [
            self.lines[row][column],
            self.lines[row + 1][column],
            self.lines[row + 1][column + 1],
            self.lines[row][column + 1],
        ]
    }
}

/// Axis-aligned pixel rectangle. `width`/`height` count pixels, so a single pixel has size 1x1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest box containing all `points`
    pub fn enclosing<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point<i32>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min_x, min_y, max_x, max_y) = points.fold(
            (first.x, first.y, first.x, first.y),
            |(min_x, min_y, max_x, max_y), p| (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y)),
        );
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Center, rounded towards the top-left corner
    pub fn center(&self) -> GridPoint {
        GridPoint::new(self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// Vehicles detected in one frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VehicleSet {
    pub self_vehicle: BoundingBox,
    pub others: Vec<BoundingBox>,
}
