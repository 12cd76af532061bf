//! Colour-space conversion and resizing for scoring frames

use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};

/// Frame width that automatic downscaling aims for
pub const DEFAULT_MIN_WIDTH: u32 = 256;

/// A frame split into its hue, saturation and value (luminance) planes.
///
/// Uses the 8-bit convention common to video tooling: hue is stored as
/// degrees / 2 in `0..180`, saturation and value span `0..=255`.
#[derive(Debug, Clone)]
pub struct HsvPlanes {
    pub hue: GrayImage,
    pub saturation: GrayImage,
    pub luminance: GrayImage,
}

impl HsvPlanes {
    /// Plane dimensions as `(width, height)`
    pub fn dimensions(&self) -> (u32, u32) {
        self.hue.dimensions()
    }
}

/// Splits an RGB frame into HSV planes
pub fn split_hsv(frame: &RgbImage) -> HsvPlanes {
    let (width, height) = frame.dimensions();
    let len = (width as usize) * (height as usize);
    let mut hue = Vec::with_capacity(len);
    let mut saturation = Vec::with_capacity(len);
    let mut luminance = Vec::with_capacity(len);

    for pixel in frame.pixels() {
        let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        hue.push(h);
        saturation.push(s);
        luminance.push(v);
    }

    HsvPlanes {
        hue: plane(width, height, hue),
        saturation: plane(width, height, saturation),
        luminance: plane(width, height, luminance),
    }
}

fn plane(width: u32, height: u32, data: Vec<u8>) -> GrayImage {
    GrayImage::from_raw(width, height, data)
        .unwrap_or_else(|| GrayImage::new(width, height))
}

/// Converts one RGB pixel to 8-bit HSV
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = f32::from(max - min);

    let saturation = if max == 0 {
        0
    } else {
        (255.0 * chroma / f32::from(max)).round() as u8
    };

    if chroma == 0.0 {
        return (0, saturation, max);
    }

    let (r, g, b) = (f32::from(r), f32::from(g), f32::from(b));
    let mut degrees = if max as f32 == r {
        60.0 * (g - b) / chroma
    } else if max as f32 == g {
        120.0 + 60.0 * (b - r) / chroma
    } else {
        240.0 + 60.0 * (r - g) / chroma
    };
    if degrees < 0.0 {
        degrees += 360.0;
    }

    let hue = ((degrees / 2.0).round() as u32 % 180) as u8;
    (hue, saturation, max)
}

/// Integer factor by which to shrink a frame so its width lands near `effective_width`.
///
/// Frames already narrower than `effective_width` are not shrunk.
pub fn compute_downscale_factor(frame_width: u32, effective_width: u32) -> u32 {
    if effective_width == 0 || frame_width < effective_width {
        1
    } else {
        frame_width / effective_width
    }
}

/// Resizes a frame with bilinear interpolation
pub fn resize_bilinear(frame: &RgbImage, width: u32, height: u32) -> RgbImage {
    imageops::resize(frame, width, height, FilterType::Triangle)
}

/// Shrinks a frame by an integer factor; a factor of 1 or less returns the frame as is
pub fn downscale(frame: RgbImage, factor: u32) -> RgbImage {
    if factor <= 1 {
        return frame;
    }
    let width = ((f64::from(frame.width()) / f64::from(factor)).round() as u32).max(1);
    let height = ((f64::from(frame.height()) / f64::from(factor)).round() as u32).max(1);
    resize_bilinear(&frame, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_primary_colours() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0, 255, 255));
        assert_eq!(rgb_to_hsv(0, 255, 0), (60, 255, 255));
        assert_eq!(rgb_to_hsv(0, 0, 255), (120, 255, 255));
        assert_eq!(rgb_to_hsv(0, 0, 0), (0, 0, 0));
        assert_eq!(rgb_to_hsv(128, 128, 128), (0, 0, 128));
    }

    #[test]
    fn test_split_hsv_keeps_dimensions() {
        let frame = RgbImage::from_pixel(8, 4, Rgb([255, 255, 0]));
        let planes = split_hsv(&frame);

        assert_eq!(planes.dimensions(), (8, 4));
        assert!(planes.hue.pixels().all(|p| p[0] == 30));
        assert!(planes.saturation.pixels().all(|p| p[0] == 255));
        assert!(planes.luminance.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_downscale_factor() {
        assert_eq!(compute_downscale_factor(1920, DEFAULT_MIN_WIDTH), 7);
        assert_eq!(compute_downscale_factor(512, DEFAULT_MIN_WIDTH), 2);
        assert_eq!(compute_downscale_factor(256, DEFAULT_MIN_WIDTH), 1);
        assert_eq!(compute_downscale_factor(100, DEFAULT_MIN_WIDTH), 1);
    }

    #[test]
    fn test_downscale() {
        let frame = RgbImage::from_pixel(640, 360, Rgb([10, 20, 30]));
        let small = downscale(frame.clone(), 2);
        assert_eq!(small.dimensions(), (320, 180));
        assert_eq!(*small.get_pixel(5, 5), Rgb([10, 20, 30]));

        let same = downscale(frame, 1);
        assert_eq!(same.dimensions(), (640, 360));
    }
}
