//! Darkens and thickens "heavy" stroke images in place.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetouchOptions {
    /// Passes of a 3x3 max filter over the alpha channel.
    pub dilate_passes: u8,
    /// RGB multiplier; below 1.0 darkens.
    pub brightness: f32,
    /// Spread around the mean luminance; above 1.0 increases contrast.
    pub contrast: f32,
}

impl Default for RetouchOptions {
    fn default() -> Self {
        Self {
            dilate_passes: 2,
            brightness: 0.3,
            contrast: 2.0,
        }
    }
}

pub fn thicken(img: &RgbaImage, options: &RetouchOptions) -> RgbaImage {
    let alpha = GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([img.get_pixel(x, y)[3]])
    });
    let alpha = if options.dilate_passes == 0 {
        alpha
    } else {
        morphology::dilate(&alpha, Norm::LInf, options.dilate_passes)
    };

    let darker = RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let scale = |c: u8| (c as f32 * options.brightness).round().clamp(0.0, 255.0) as u8;
        Rgba([scale(r), scale(g), scale(b), a])
    });

    let mean = mean_luma(&darker);
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, _] = darker.get_pixel(x, y).0;
        let stretch = |c: u8| {
            (mean + (c as f32 - mean) * options.contrast)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgba([stretch(r), stretch(g), stretch(b), alpha.get_pixel(x, y)[0]])
    })
}

/// Mean luminance of every pixel, rounded the way an 8-bit histogram mean is.
fn mean_luma(img: &RgbaImage) -> f32 {
    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return 0.0;
    }
    let total: u64 = img
        .pixels()
        .map(|p| {
            let [r, g, b, _] = p.0;
            (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u64
        })
        .sum();
    (total as f32 / count as f32).round()
}

#[derive(Debug, Default)]
pub struct RetouchSummary {
    pub processed: Vec<PathBuf>,
    pub missing: Vec<String>,
}

/// Retouches `<label>.png` for each label in `dir`, keeping the first
/// untouched copy as `<label>_original.png`.
pub fn thicken_labels(
    dir: &Path,
    labels: &[String],
    options: &RetouchOptions,
) -> Result<RetouchSummary> {
    let mut summary = RetouchSummary::default();
    for label in labels {
        let path = dir.join(format!("{label}.png"));
        if !path.is_file() {
            tracing::warn!(label = %label, "stroke image not found");
            summary.missing.push(label.clone());
            continue;
        }

        let backup = dir.join(format!("{label}_original.png"));
        if !backup.exists() {
            fs::copy(&path, &backup)
                .with_context(|| format!("failed to back up {}", path.display()))?;
            tracing::info!(backup = %backup.display(), "backed up original");
        }

        let img = image::open(&path)
            .with_context(|| format!("failed to read {}", path.display()))?
            .to_rgba8();
        thicken(&img, options)
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        summary.processed.push(path);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    use pretty_assertions::assert_eq;

    fn stroke() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 0]));
        for y in 5..15 {
            img.put_pixel(10, y, Rgba([120, 120, 120, 255]));
        }
        img
    }

    #[test]
    fn alpha_grows_by_dilation() {
        let out = thicken(&stroke(), &RetouchOptions::default());
        assert_eq!(out.get_pixel(8, 10)[3], 255);
        assert_eq!(out.get_pixel(12, 4)[3], 255);
        assert_eq!(out.get_pixel(13, 10)[3], 0);
    }

    #[test]
    fn stroke_gets_darker() {
        let original = stroke();
        let out = thicken(&original, &RetouchOptions::default());
        assert!(out.get_pixel(10, 10)[0] < original.get_pixel(10, 10)[0]);
    }

    #[test]
    fn backs_up_once_and_reports_missing() -> Result<()> {
        let mut dir = std::env::temp_dir();
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
        dir.push(format!("strokeharvest-retouch-{}-{now}", std::process::id()));
        fs::create_dir_all(&dir)?;
        stroke().save(dir.join("B.png"))?;

        let labels = vec!["B".to_string(), "D".to_string()];
        let summary = thicken_labels(&dir, &labels, &RetouchOptions::default())?;
        assert_eq!(summary.processed, vec![dir.join("B.png")]);
        assert_eq!(summary.missing, vec!["D".to_string()]);

        let backup = image::open(dir.join("B_original.png"))?.to_rgba8();
        assert_eq!(backup, stroke());

        thicken_labels(&dir, &labels, &RetouchOptions::default())?;
        let backup = image::open(dir.join("B_original.png"))?.to_rgba8();
        assert_eq!(backup, stroke());

        let _ = fs::remove_dir_all(&dir);
        Ok(())
    }
}
