use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};

use crate::core::geometry::BBox;
use crate::core::model::Region;

/// Outer borders of top-level ink components. Holes and anything nested
/// inside another component are skipped. Order is unspecified.
pub fn detect_regions(mask: &GrayImage) -> Vec<Region> {
    find_contours::<u32>(mask)
        .iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(region_from_contour)
        .collect()
}

fn region_from_contour(contour: &Contour<u32>) -> Option<Region> {
    let bbox = BBox::from_points(contour.points.iter().map(|p| (p.x, p.y)))?;
    Some(Region::new(bbox, polygon_area(contour)))
}

/// Shoelace area of the border polygon.
fn polygon_area(contour: &Contour<u32>) -> f32 {
    let points = &contour.points;
    if points.len() < 3 {
        return 0.0;
    }
    let twice: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64)
        .sum();
    (twice.abs() * 0.5) as f32
}
