use image::Rgb;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::vision::{BoundingBox, Frame};

pub const BACKGROUND_COLOR: Rgb<u8> = Rgb([110, 156, 66]);
pub const SKY_COLOR: Rgb<u8> = Rgb([45, 50, 184]);
pub const DASHBOARD_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
pub const ROAD_EDGE_COLOR: Rgb<u8> = Rgb([150, 150, 150]);
pub const PLAYER_COLOR: Rgb<u8> = Rgb([236, 236, 236]);
pub const OPPONENT_COLORS: [Rgb<u8>; 3] = [
    Rgb([214, 92, 92]),
    Rgb([66, 72, 200]),
    Rgb([162, 98, 33]),
];

/// Perspective of the road: a trapezoid between the horizon and the dashboard
#[derive(Clone, Debug, PartialEq)]
pub struct RoadGeometry {
    pub width: u32,
    pub height: u32,
    /// First row showing the road
    pub horizon: u32,
    /// First row of the dashboard, below the road
    pub bottom: u32,
    pub center_x: f64,
    pub horizon_half_width: f64,
    pub bottom_half_width: f64,
}

impl Default for RoadGeometry {
    fn default() -> Self {
        Self {
            width: 160,
            height: 210,
            horizon: 52,
            bottom: 180,
            center_x: 80.0,
            horizon_half_width: 4.0,
            bottom_half_width: 70.0,
        }
    }
}

impl RoadGeometry {
    pub fn half_width(&self, y: f64) -> f64 {
        let t = (y - self.horizon as f64) / (self.bottom - self.horizon) as f64;
        self.horizon_half_width + (self.bottom_half_width - self.horizon_half_width) * t
    }

    pub fn left_edge(&self, y: u32) -> i32 {
        (self.center_x - self.half_width(y as f64)).round() as i32
    }

    pub fn right_edge(&self, y: u32) -> i32 {
        (self.center_x + self.half_width(y as f64)).round() as i32
    }

    /// x coordinate of `lateral` (-1 = left edge, 1 = right edge) on row `y`
    pub fn x_at(&self, y: f64, lateral: f64) -> f64 {
        self.center_x + lateral * self.half_width(y)
    }

    /// Row of `depth` (0 = horizon, 1 = dashboard)
    pub fn row_at(&self, depth: f64) -> f64 {
        self.horizon as f64 + depth * (self.bottom - self.horizon) as f64
    }

    pub fn depth_at(&self, y: f64) -> f64 {
        (y - self.horizon as f64) / (self.bottom - self.horizon) as f64
    }
}

/// Draws the road with the player's car and the `opponents` (in this order, back to front).
/// Boxes reaching out of the frame are clipped.
pub fn render_scene(geometry: &RoadGeometry, player: &BoundingBox, opponents: &[BoundingBox]) -> Frame {
    let mut frame = Frame::from_pixel(geometry.width, geometry.height, BACKGROUND_COLOR);

    fill_rows(&mut frame, 0, geometry.horizon, SKY_COLOR);
    fill_rows(&mut frame, geometry.bottom, geometry.height, DASHBOARD_COLOR);

    for y in geometry.horizon..geometry.bottom.min(geometry.height) {
        for x in [geometry.left_edge(y), geometry.right_edge(y)] {
            if x >= 0 && (x as u32) < geometry.width {
                frame.put_pixel(x as u32, y, ROAD_EDGE_COLOR);
            }
        }
    }

    for (i, opponent) in opponents.iter().enumerate() {
        fill_box(&mut frame, opponent, OPPONENT_COLORS[i % OPPONENT_COLORS.len()]);
    }
    fill_box(&mut frame, player, PLAYER_COLOR);
    frame
}

fn fill_rows(frame: &mut Frame, from: u32, to: u32, color: Rgb<u8>) {
    for y in from..to.min(frame.height()) {
        for x in 0..frame.width() {
            frame.put_pixel(x, y, color);
        }
    }
}

fn fill_box(frame: &mut Frame, bbox: &BoundingBox, color: Rgb<u8>) {
    if bbox.width <= 0 || bbox.height <= 0 {
        return;
    }
    draw_filled_rect_mut(frame, Rect::at(bbox.x, bbox.y).of_size(bbox.width as u32, bbox.height as u32), color);
}
