pub mod binarize;
pub mod filter;
pub mod overlay;
pub mod regions;

use image::GrayImage;

use crate::core::config::DetectionConfig;
use crate::core::model::Region;

/// Regions found on one page before and after filtering.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    pub detected: usize,
    /// Kept regions in reading order.
    pub regions: Vec<Region>,
    /// Candidates dropped by the area, aspect or overlap checks.
    pub rejected: Vec<Region>,
}

#[derive(Debug, Clone)]
pub struct StrokeDetector {
    config: DetectionConfig,
}

impl StrokeDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, gray: &GrayImage) -> Detection {
        let mask = binarize::binarize(gray, &self.config);
        let candidates = regions::detect_regions(&mask);
        let selected = filter::select_regions(&candidates, &self.config);

        let mut rejected: Vec<Region> = candidates
            .iter()
            .filter(|c| !selected.contains(c))
            .copied()
            .collect();
        filter::reading_order(&mut rejected, self.config.row_bucket);

        tracing::debug!(
            detected = candidates.len(),
            kept = selected.len(),
            rejected = rejected.len(),
            "region detection finished"
        );
        Detection {
            detected: candidates.len(),
            regions: selected,
            rejected,
        }
    }
}
