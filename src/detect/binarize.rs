use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology;

use crate::core::config::{DetectionConfig, ThresholdMode};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Turns a grayscale page into an ink mask (ink = 255), then closes and
/// opens it to merge nearby fragments and drop speckles.
pub fn binarize(gray: &GrayImage, config: &DetectionConfig) -> GrayImage {
    let mask = match config.threshold {
        ThresholdMode::Adaptive { block_size, c } => adaptive_threshold(gray, block_size, c),
        ThresholdMode::Global { level } => global_threshold(gray, level),
    };

    if config.morph_radius == 0 {
        return mask;
    }
    let closed = morphology::close(&mask, Norm::LInf, config.morph_radius);
    morphology::open(&closed, Norm::LInf, config.morph_radius)
}

fn global_threshold(gray: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        ink_if(gray.get_pixel(x, y)[0] <= level)
    })
}

fn adaptive_threshold(gray: &GrayImage, block_size: u32, c: f32) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, block_sigma(block_size));
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y)[0] as f32;
        let mean = local_mean.get_pixel(x, y)[0] as f32;
        ink_if(value <= mean - c)
    })
}

/// Sigma a Gaussian window of `block_size` pixels gets by default.
fn block_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn ink_if(is_ink: bool) -> Luma<u8> {
    Luma([if is_ink { FOREGROUND } else { BACKGROUND }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page_with_block(x0: u32, y0: u32, w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(120, 100, |x, y| {
            let inside = x >= x0 && x < x0 + w && y >= y0 && y < y0 + h;
            Luma([if inside { 0 } else { 255 }])
        })
    }

    #[test]
    fn blank_page_has_no_ink() {
        let page = GrayImage::from_pixel(64, 48, Luma([255]));
        let mask = binarize(&page, &DetectionConfig::default());
        assert_eq!(mask.dimensions(), (64, 48));
        assert!(mask.pixels().all(|p| p[0] == BACKGROUND));
    }

    #[test]
    fn adaptive_mode_marks_block_edges() {
        let page = page_with_block(30, 20, 40, 30);
        let mask = binarize(&page, &DetectionConfig::default());
        assert_eq!(mask.get_pixel(30, 35)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(69, 35)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(5, 5)[0], BACKGROUND);
    }

    #[test]
    fn global_mode_fills_whole_block() {
        let page = page_with_block(30, 20, 40, 30);
        let config = DetectionConfig {
            threshold: ThresholdMode::Global { level: 200 },
            ..Default::default()
        };
        let mask = binarize(&page, &config);
        let ink = mask.pixels().filter(|p| p[0] == FOREGROUND).count();
        assert_eq!(ink, 40 * 30);
    }

    #[test]
    fn opening_removes_speckles() {
        let mut page = GrayImage::from_pixel(40, 40, Luma([255]));
        page.put_pixel(20, 20, Luma([0]));
        let config = DetectionConfig {
            threshold: ThresholdMode::Global { level: 200 },
            ..Default::default()
        };
        let mask = binarize(&page, &config);
        assert!(mask.pixels().all(|p| p[0] == BACKGROUND));
    }

    #[test]
    fn default_block_sigma() {
        assert!((block_sigma(11) - 2.0).abs() < 1e-5);
    }
}
