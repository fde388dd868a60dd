use image::Rgb;

use crate::vision::Frame;

/// Location of a pixel which always shows the offroad background, relative to the frame size
#[derive(Clone, Debug, PartialEq)]
pub struct OffroadParameter {
    pub reference_x: f64,
    pub reference_y: f64,
}

impl Default for OffroadParameter {
    fn default() -> Self {
        Self {
            reference_x: 0.99,
            reference_y: 0.5,
        }
    }
}

impl OffroadParameter {
    pub fn reference_point(&self, width: u32, height: u32) -> (u32, u32) {
        let x = (self.reference_x * width as f64) as u32;
        let y = (self.reference_y * height as f64) as u32;
        (x.min(width.saturating_sub(1)), y.min(height.saturating_sub(1)))
    }
}

/// Blacks out every pixel having exactly the background color.
///
/// `frame` must not be empty.
pub fn remove_offroad_regions(frame: &Frame, param: &OffroadParameter) -> Frame {
    let (x, y) = param.reference_point(frame.width(), frame.height());
    let background = *frame.get_pixel(x, y);

    let mut masked = frame.clone();
    masked.pixels_mut()
        .filter(|p| **p == background)
        .for_each(|p| *p = Rgb([0, 0, 0]));
    masked
}
