use image::imageops::{self, FilterType};
use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use itertools::Itertools;

use crate::vision::{BoundingBox, Frame, GridPoint, RoadGrid, VehicleSet};

pub const GRID_LINE_COLOR: Rgb<u8> = Rgb([0xE8, 0xE8, 0xE8]);
pub const SELF_VEHICLE_COLOR: Rgb<u8> = Rgb([0x50, 0x70, 0x0F]);
pub const OTHER_VEHICLE_COLOR: Rgb<u8> = Rgb([0xAE, 0x04, 0x43]);

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayParameter {
    pub scale: f32,
    /// Extra space around vehicle boxes, in scaled pixels
    pub box_margin: i32,
    pub box_thickness: i32,
}

impl Default for OverlayParameter {
    fn default() -> Self {
        Self {
            scale: 4.0,
            box_margin: 5,
            box_thickness: 2,
        }
    }
}

/// Scaled copy of `frame` with the road grid and the vehicle boxes drawn on top
pub fn draw_overlay(frame: &Frame, road_grid: &RoadGrid, vehicles: &VehicleSet, param: &OverlayParameter) -> Frame {
    let width = (frame.width() as f32 * param.scale).round().max(1.0) as u32;
    let height = (frame.height() as f32 * param.scale).round().max(1.0) as u32;
    let mut image = imageops::resize(frame, width, height, FilterType::Triangle);

    draw_road_grid(&mut image, road_grid, param.scale);
    draw_vehicle(&mut image, &vehicles.self_vehicle, SELF_VEHICLE_COLOR, param);
    for other in &vehicles.others {
        draw_vehicle(&mut image, other, OTHER_VEHICLE_COLOR, param);
    }
    image
}

fn draw_road_grid(image: &mut Frame, road_grid: &RoadGrid, scale: f32) {
    let scaled = |p: GridPoint| (p.x as f32 * scale, p.y as f32 * scale);

    for row in 0..road_grid.rows() {
        draw_line_segment_mut(image, scaled(road_grid.left_edge(row)), scaled(road_grid.right_edge(row)), GRID_LINE_COLOR);
    }
    for (upper, lower) in road_grid.lines().iter().tuple_windows() {
        for (a, b) in upper.iter().zip(lower.iter()) {
            draw_line_segment_mut(image, scaled(*a), scaled(*b), GRID_LINE_COLOR);
        }
    }
}

fn draw_vehicle(image: &mut Frame, bbox: &BoundingBox, color: Rgb<u8>, param: &OverlayParameter) {
    let left = (param.scale * bbox.x as f32) as i32 - param.box_margin;
    let top = (param.scale * bbox.y as f32) as i32 - param.box_margin;
    let right = (param.scale * (bbox.x + bbox.width) as f32) as i32 + param.box_margin;
    let bottom = (param.scale * (bbox.y + bbox.height) as f32) as i32 + param.box_margin;

    for i in 0..param.box_thickness {
        let width = right - left - 2 * i;
        let height = bottom - top - 2 * i;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(left + i, top + i).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}
