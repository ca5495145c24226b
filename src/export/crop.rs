use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};

use crate::core::model::{Assignment, ManifestEntry};

/// Writes one padded crop per assigned label.
#[derive(Debug, Clone)]
pub struct StrokeExporter {
    out_dir: PathBuf,
    suffix: String,
    padding: u32,
}

impl StrokeExporter {
    pub fn new(out_dir: PathBuf, padding: u32) -> Self {
        Self {
            out_dir,
            suffix: String::new(),
            padding,
        }
    }

    /// Appended to the label in file names, e.g. `_professional`.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn file_name(&self, label: &str) -> String {
        format!("{label}{}.png", self.suffix)
    }

    /// Crops `page` around the assigned region and saves it, replacing any
    /// file of the same name.
    pub fn export(
        &self,
        page: &DynamicImage,
        page_id: &str,
        assignment: &Assignment,
    ) -> Result<ManifestEntry> {
        let (img_width, img_height) = page.dimensions();
        let crop = assignment
            .region
            .bbox
            .padded(self.padding, img_width, img_height);
        if crop.width == 0 || crop.height == 0 {
            anyhow::bail!(
                "region for {} lies outside the {img_width}x{img_height} page",
                assignment.label
            );
        }

        let cropped = page.crop_imm(crop.x, crop.y, crop.width, crop.height);

        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(self.file_name(&assignment.label));
        cropped
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        let bytes = fs::metadata(&path)?.len();

        Ok(ManifestEntry {
            label: assignment.label.clone(),
            path,
            page_id: page_id.to_string(),
            width: crop.width,
            height: crop.height,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    use image::{Rgb, RgbImage};
    use pretty_assertions::assert_eq;

    use crate::core::geometry::BBox;
    use crate::core::model::Region;

    fn temp_output_dir(prefix: &str) -> PathBuf {
        let mut out = std::env::temp_dir();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let pid = std::process::id();
        out.push(format!("{prefix}-{pid}-{now}"));
        out
    }

    fn assignment(label: &str, bbox: BBox) -> Assignment {
        Assignment {
            label: label.to_string(),
            region: Region::new(bbox, bbox.area() as f32),
            distance: None,
        }
    }

    #[test]
    fn writes_padded_crop_clamped_to_page() -> Result<()> {
        let out = temp_output_dir("strokeharvest-crop");
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 80, Rgb([255, 255, 255])));
        let exporter = StrokeExporter::new(out.clone(), 10).with_suffix("_professional");

        let entry = exporter.export(&page, "009", &assignment("P", BBox::new(4, 30, 20, 40)))?;

        assert_eq!(entry.path, out.join("P_professional.png"));
        assert_eq!((entry.width, entry.height), (34, 60));
        assert_eq!(image::image_dimensions(&entry.path)?, (34, 60));
        assert!(entry.bytes > 0);

        let _ = fs::remove_dir_all(&out);
        Ok(())
    }

    #[test]
    fn region_off_page_is_an_error() {
        let out = temp_output_dir("strokeharvest-crop-off");
        let page = DynamicImage::ImageRgb8(RgbImage::new(50, 50));
        let exporter = StrokeExporter::new(out.clone(), 0);
        assert!(exporter
            .export(&page, "1", &assignment("X", BBox::new(60, 60, 10, 10)))
            .is_err());
        let _ = fs::remove_dir_all(&out);
    }
}
