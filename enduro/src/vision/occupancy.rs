use std::fmt::{Display, Formatter};

use console_engine::pixel;
use console_engine::screen::Screen;
use console_engine::Color;
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use ql::prelude::DebugVisualizer;

use crate::vision::overlay::{GRID_LINE_COLOR, OTHER_VEHICLE_COLOR, SELF_VEHICLE_COLOR};

pub const DEFAULT_CELL_SIZE: u32 = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Cell {
    Empty = 0,
    Opponent = 1,
    Player = 2,
}

/// Discretized view on the road around the player.
///
/// Row 0 is the row the player is driving in, higher rows are farther ahead.
/// Columns run from the left to the right road edge.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OccupancyGrid {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

impl OccupancyGrid {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![Cell::Empty; rows * columns],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: usize, column: usize) -> Cell {
        self.cells[self.index(row, column)]
    }

    pub fn set(&mut self, row: usize, column: usize, cell: Cell) {
        let i = self.index(row, column);
        self.cells[i] = cell;
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        &self.cells[row * self.columns..(row + 1) * self.columns]
    }

    /// `(row, column)` of the player cell
    pub fn player_position(&self) -> Option<(usize, usize)> {
        self.cells
            .iter()
            .position(|&c| c == Cell::Player)
            .map(|i| (i / self.columns, i % self.columns))
    }

    /// Positions of all opponent cells, nearest row first
    pub fn opponents(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == Cell::Opponent)
            .map(|(i, _)| (i / self.columns, i % self.columns))
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    fn index(&self, row: usize, column: usize) -> usize {
        assert!(row < self.rows && column < self.columns, "cell ({row}, {column}) out of bounds");
        row * self.columns + column
    }

    /// Colored rendering with `cell_size` pixels per cell (see [DEFAULT_CELL_SIZE]); row 0 ends up at the bottom.
    /// A `cell_size` of 0 gives an empty image.
    pub fn to_image(&self, cell_size: u32) -> RgbImage {
        if cell_size == 0 {
            return RgbImage::new(0, 0);
        }
        let width = self.columns as u32 * cell_size;
        let height = self.rows as u32 * cell_size;
        let mut image = RgbImage::from_pixel(width, height, Rgb([1, 1, 1]));

        for row in 0..self.rows {
            for column in 0..self.columns {
                let color = match self.get(row, column) {
                    Cell::Empty => continue,
                    Cell::Player => SELF_VEHICLE_COLOR,
                    Cell::Opponent => OTHER_VEHICLE_COLOR,
                };
                let rect = Rect::at((column as u32 * cell_size) as i32, (row as u32 * cell_size) as i32)
                    .of_size(cell_size, cell_size);
                draw_filled_rect_mut(&mut image, rect, color);
            }
        }
        for row in 0..self.rows as u32 {
            let y = (row * cell_size) as f32;
            draw_line_segment_mut(&mut image, (0.0, y), (width as f32, y), GRID_LINE_COLOR);
        }
        for column in 0..self.columns as u32 {
            let x = (column * cell_size) as f32;
            draw_line_segment_mut(&mut image, (x, 0.0), (x, height as f32), GRID_LINE_COLOR);
        }

        imageops::flip_vertical(&image)
    }
}

/// One text line per row, farthest row first: `.` empty, `o` opponent, `X` player
impl Display for OccupancyGrid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for row in (0..self.rows).rev() {
            let line: String = self.row(row)
                .iter()
                .map(|c| match c {
                    Cell::Empty => '.',
                    Cell::Opponent => 'o',
                    Cell::Player => 'X',
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl DebugVisualizer for OccupancyGrid {
    fn one_line_info(&self) -> String {
        let nearest_opponent_row = self.opponents().map(|(row, _)| row).min();
        match (self.player_position(), nearest_opponent_row) {
            (Some((_, column)), Some(row)) =>
                format!("player in column {}, {} opponents, nearest {} rows ahead", column, self.count(Cell::Opponent), row),
            (Some((_, column)), None) => format!("player in column {}, free road", column),
            (None, _) => "no player".to_string(),
        }
    }

    fn render_to_console(&self) -> Screen {
        let mut screen = Screen::new_empty(self.columns as u32, self.rows as u32);
        screen.clear();

        for row in 0..self.rows {
            for column in 0..self.columns {
                let pixel = match self.get(row, column) {
                    Cell::Empty => continue,
                    Cell::Player => pixel::pxl_fg('●', Color::Green),
                    Cell::Opponent => pixel::pxl_fg('■', Color::Red),
                };
                // row 0 at the bottom
                screen.set_pxl(column as i32, (self.rows - 1 - row) as i32, pixel);
            }
        }
        screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> OccupancyGrid {
        let mut grid = OccupancyGrid::new(3, 4);
        grid.set(0, 1, Cell::Player);
        grid.set(2, 3, Cell::Opponent);
        grid.set(1, 0, Cell::Opponent);
        grid
    }

    #[test]
    fn test_positions() {
        let grid = sample_grid();
        assert_eq!(grid.player_position(), Some((0, 1)));
        assert_eq!(grid.opponents().collect::<Vec<_>>(), vec![(1, 0), (2, 3)]);
        assert_eq!(grid.count(Cell::Empty), 9);
        assert_eq!(grid.row(2), &[Cell::Empty, Cell::Empty, Cell::Empty, Cell::Opponent]);
    }

    #[test]
    fn test_display_puts_nearest_row_last() {
        assert_eq!(sample_grid().to_string(), "...o\no...\n.X..\n");
    }

    #[test]
    fn test_one_line_info() {
        assert_eq!(sample_grid().one_line_info(), "player in column 1, 2 opponents, nearest 1 rows ahead");
        assert_eq!(OccupancyGrid::new(2, 2).one_line_info(), "no player");
    }

    #[test]
    fn test_to_image_is_flipped() {
        let image = sample_grid().to_image(10);
        assert_eq!(image.dimensions(), (40, 30));
        assert_eq!(sample_grid().to_image(0).dimensions(), (0, 0));
        // player cell (row 0, column 1) is drawn in the bottom band
        assert_eq!(*image.get_pixel(15, 25), SELF_VEHICLE_COLOR);
        // opponent (row 2, column 3) in the top band
        assert_eq!(*image.get_pixel(35, 5), OTHER_VEHICLE_COLOR);
        assert_eq!(*image.get_pixel(5, 25), Rgb([1, 1, 1]));
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds() {
        OccupancyGrid::new(2, 2).get(2, 0);
    }
}
