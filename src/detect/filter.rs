use std::cmp::Ordering;

use crate::core::config::{AreaPass, DetectionConfig};
use crate::core::model::Region;

/// Keeps regions strictly inside the area band and, when given, at least
/// `min_aspect` elongated.
pub fn filter_regions(regions: &[Region], pass: &AreaPass, min_aspect: Option<f32>) -> Vec<Region> {
    regions
        .iter()
        .filter(|r| pass.contains(r.area))
        .filter(|r| min_aspect.is_none_or(|min| r.aspect_ratio >= min))
        .copied()
        .collect()
}

/// Drops every region whose box is covered more than `overlap_ratio` by a
/// larger region that was kept.
pub fn dedup_regions(mut regions: Vec<Region>, overlap_ratio: f32) -> Vec<Region> {
    regions.sort_by(largest_first);

    let mut kept: Vec<Region> = Vec::with_capacity(regions.len());
    for region in regions {
        let duplicate = kept
            .iter()
            .any(|k| region.bbox.overlap_ratio(&k.bbox) > overlap_ratio);
        if !duplicate {
            kept.push(region);
        }
    }
    kept
}

/// Rows of `row_bucket` pixels top to bottom, left to right within a row.
pub fn reading_order(regions: &mut [Region], row_bucket: u32) {
    let bucket = row_bucket.max(1);
    regions.sort_by_key(|r| (r.bbox.y / bucket, r.bbox.x, r.bbox.y));
}

/// Runs every area pass, merges the survivors, removes duplicates and
/// returns them in reading order.
pub fn select_regions(regions: &[Region], config: &DetectionConfig) -> Vec<Region> {
    let merged: Vec<Region> = config
        .passes
        .iter()
        .flat_map(|pass| filter_regions(regions, pass, config.min_aspect_ratio))
        .collect();

    let mut unique = dedup_regions(merged, config.overlap_ratio);
    reading_order(&mut unique, config.row_bucket);
    unique
}

fn largest_first(a: &Region, b: &Region) -> Ordering {
    b.area
        .total_cmp(&a.area)
        .then_with(|| b.bbox.area().cmp(&a.bbox.area()))
        .then_with(|| a.bbox.y.cmp(&b.bbox.y))
        .then_with(|| a.bbox.x.cmp(&b.bbox.x))
}
