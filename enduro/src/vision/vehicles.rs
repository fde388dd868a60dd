use image::{imageops, GrayImage, Rgb};
use imageproc::contours::{find_contours_with_threshold, BorderType};
use imageproc::point::Point;

use crate::vision::{BoundingBox, ExtractionError, Frame, Mask, VehicleSet};

/// Brightness thresholds for telling cars apart from the road
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleParameter {
    /// A pixel belongs to the player's (white) car if all channels exceed this value
    pub self_channel_threshold: u8,
    /// Luma threshold applied to the player's car candidate pixels
    pub self_luma_threshold: u8,
    /// Luma threshold for everything else on the road
    pub others_luma_threshold: u8,
}

impl Default for VehicleParameter {
    fn default() -> Self {
        Self {
            self_channel_threshold: 180,
            self_luma_threshold: 170,
            others_luma_threshold: 64,
        }
    }
}

/// Finds the player's car and all other cars on the road.
///
/// Only pixels inside `road_mask` are considered. Near-white pixels are candidates for the
/// player's car and the biggest blob of them wins. All remaining pixels bright enough form the
/// other cars, one per blob.
pub fn detect_vehicles(
    masked: &Frame,
    road_mask: &Mask,
    param: &VehicleParameter,
) -> Result<VehicleSet, ExtractionError> {
    let road = apply_mask(masked, road_mask);
    let near_white = |p: &Rgb<u8>| p.0.iter().all(|&c| c > param.self_channel_threshold);

    let self_candidates = keep_pixels(&road, near_white);
    let self_vehicle = external_contours(&imageops::grayscale(&self_candidates), param.self_luma_threshold)
        .into_iter()
        .fold(None, |largest: Option<(f64, Vec<Point<i32>>)>, contour| {
            let area = contour_area(&contour);
            match largest {
                Some((largest_area, _)) if largest_area >= area => largest,
                _ => Some((area, contour)),
            }
        })
        .and_then(|(_, contour)| BoundingBox::enclosing(&contour))
        .ok_or(ExtractionError::NoSelfVehicleDetected)?;

    let other_candidates = keep_pixels(&road, |p| !near_white(p));
    let others = external_contours(&imageops::grayscale(&other_candidates), param.others_luma_threshold)
        .iter()
        .filter_map(|contour| BoundingBox::enclosing(contour))
        .collect::<Vec<_>>();

    log::trace!("self vehicle: {:?}, {} others", self_vehicle, others.len());
    Ok(VehicleSet { self_vehicle, others })
}

fn apply_mask(frame: &Frame, mask: &Mask) -> Frame {
    debug_assert_eq!(frame.dimensions(), mask.dimensions());
    let mut result = frame.clone();
    result.pixels_mut()
        .zip(mask.pixels())
        .filter(|(_, m)| m.0[0] == 0)
        .for_each(|(p, _)| *p = Rgb([0, 0, 0]));
    result
}

fn keep_pixels<F>(frame: &Frame, keep: F) -> Frame
where
    F: Fn(&Rgb<u8>) -> bool,
{
    let mut result = frame.clone();
    result.pixels_mut()
        .filter(|p| !keep(p))
        .for_each(|p| *p = Rgb([0, 0, 0]));
    result
}

/// Outer borders of all top-level blobs brighter than `threshold`, in raster scan order
fn external_contours(gray: &GrayImage, threshold: u8) -> Vec<Vec<Point<i32>>> {
    find_contours_with_threshold::<i32>(gray, threshold)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Area enclosed by a closed contour (shoelace formula)
pub fn contour_area(contour: &[Point<i32>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }
    let twice_area: i64 = contour.iter()
        .zip(contour.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice_area.abs() as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    use crate::vision::MASK_ON;

    use super::*;

    const WHITE: Rgb<u8> = Rgb([236, 236, 236]);
    const RED: Rgb<u8> = Rgb([214, 92, 92]);
    const DARK: Rgb<u8> = Rgb([40, 40, 40]);

    fn full_mask(frame: &Frame) -> Mask {
        Mask::from_pixel(frame.width(), frame.height(), Luma([MASK_ON]))
    }

    fn fill(frame: &mut Frame, bbox: BoundingBox, color: Rgb<u8>) {
        draw_filled_rect_mut(frame, Rect::at(bbox.x, bbox.y).of_size(bbox.width as u32, bbox.height as u32), color);
    }

    #[test]
    fn test_contour_area() {
        let square = [Point::new(0, 0), Point::new(0, 4), Point::new(4, 4), Point::new(4, 0)];
        assert_eq!(contour_area(&square), 16.0);
        assert_eq!(contour_area(&[Point::new(3, 3)]), 0.0);
    }

    #[test]
    fn test_single_white_rectangle() {
        let mut frame = Frame::new(60, 40);
        let car = BoundingBox::new(20, 25, 16, 10);
        fill(&mut frame, car, WHITE);

        let vehicles = detect_vehicles(&frame, &full_mask(&frame), &VehicleParameter::default()).unwrap();

        assert_eq!(vehicles, VehicleSet { self_vehicle: car, others: vec![] });
    }

    #[test]
    fn test_largest_white_blob_is_self() {
        let mut frame = Frame::new(60, 40);
        let small = BoundingBox::new(2, 2, 4, 4);
        let big = BoundingBox::new(20, 25, 16, 10);
        fill(&mut frame, small, WHITE);
        fill(&mut frame, big, WHITE);

        let vehicles = detect_vehicles(&frame, &full_mask(&frame), &VehicleParameter::default()).unwrap();

        assert_eq!(vehicles.self_vehicle, big);
        // the smaller white blob is no "other" car
        assert!(vehicles.others.is_empty());
    }

    #[test]
    fn test_others_and_dark_pixels() {
        let mut frame = Frame::new(60, 40);
        let car = BoundingBox::new(20, 25, 16, 10);
        let red1 = BoundingBox::new(5, 3, 6, 4);
        let red2 = BoundingBox::new(40, 10, 8, 5);
        fill(&mut frame, car, WHITE);
        fill(&mut frame, red1, RED);
        fill(&mut frame, red2, RED);
        fill(&mut frame, BoundingBox::new(30, 2, 5, 5), DARK);

        let vehicles = detect_vehicles(&frame, &full_mask(&frame), &VehicleParameter::default()).unwrap();

        assert_eq!(vehicles.self_vehicle, car);
        assert_eq!(vehicles.others.len(), 2);
        assert!(vehicles.others.contains(&red1));
        assert!(vehicles.others.contains(&red2));
    }

    #[test]
    fn test_pixels_outside_mask_are_ignored() {
        let mut frame = Frame::new(60, 40);
        fill(&mut frame, BoundingBox::new(20, 25, 16, 10), WHITE);
        let mut mask = Mask::new(60, 40);
        draw_filled_rect_mut(&mut mask, Rect::at(0, 0).of_size(60, 20), Luma([MASK_ON]));

        let result = detect_vehicles(&frame, &mask, &VehicleParameter::default());

        assert_eq!(result, Err(ExtractionError::NoSelfVehicleDetected));
    }
}
