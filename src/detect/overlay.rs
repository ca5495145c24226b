//! Debug rendering of a page's detection result.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::core::geometry::BBox;
use crate::detect::Detection;

pub const KEPT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const REJECTED_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Rejected candidates at or below this contour area are not drawn.
pub const MIN_REJECTED_AREA: f32 = 500.0;

const KEPT_THICKNESS: u32 = 3;
const REJECTED_THICKNESS: u32 = 2;

/// Copy of `page` with kept regions boxed in green and larger rejected
/// candidates boxed in red. Boxes are drawn on and outside the region edge.
pub fn draw_detection(page: &RgbImage, detection: &Detection) -> RgbImage {
    let mut canvas = page.clone();

    for region in detection
        .rejected
        .iter()
        .filter(|r| r.area > MIN_REJECTED_AREA)
    {
        draw_box(&mut canvas, &region.bbox, REJECTED_COLOR, REJECTED_THICKNESS);
        tracing::debug!(
            x = region.bbox.x,
            y = region.bbox.y,
            area = region.area,
            "rejected region"
        );
    }
    for (idx, region) in detection.regions.iter().enumerate() {
        draw_box(&mut canvas, &region.bbox, KEPT_COLOR, KEPT_THICKNESS);
        tracing::debug!(
            number = idx + 1,
            x = region.bbox.x,
            y = region.bbox.y,
            area = region.area,
            "kept region"
        );
    }
    canvas
}

fn draw_box(img: &mut RgbImage, bbox: &BBox, color: Rgb<u8>, thickness: u32) {
    if bbox.width == 0 || bbox.height == 0 {
        return;
    }
    for t in 0..thickness {
        let rect = Rect::at(bbox.x as i32 - t as i32, bbox.y as i32 - t as i32)
            .of_size(bbox.width + 2 * t, bbox.height + 2 * t);
        draw_hollow_rect_mut(img, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Region;
    use pretty_assertions::assert_eq;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn detection() -> Detection {
        Detection {
            detected: 3,
            regions: vec![Region::new(BBox::new(20, 20, 40, 60), 2301.0)],
            rejected: vec![
                Region::new(BBox::new(100, 20, 30, 30), 841.0),
                Region::new(BBox::new(150, 80, 10, 10), 81.0),
            ],
        }
    }

    #[test]
    fn boxes_kept_and_large_rejected_regions() {
        let page = RgbImage::from_pixel(200, 120, WHITE);
        let overlay = draw_detection(&page, &detection());

        assert_eq!(overlay.dimensions(), page.dimensions());
        assert_eq!(*overlay.get_pixel(20, 50), KEPT_COLOR);
        assert_eq!(*overlay.get_pixel(18, 50), KEPT_COLOR);
        assert_eq!(*overlay.get_pixel(40, 50), WHITE);
        assert_eq!(*overlay.get_pixel(100, 35), REJECTED_COLOR);
        assert_eq!(*overlay.get_pixel(150, 85), WHITE);
    }

    #[test]
    fn boxes_at_page_edge_are_clipped() {
        let page = RgbImage::from_pixel(50, 50, WHITE);
        let detection = Detection {
            detected: 1,
            regions: vec![Region::new(BBox::new(0, 0, 50, 50), 2401.0)],
            rejected: Vec::new(),
        };
        let overlay = draw_detection(&page, &detection);
        assert_eq!(*overlay.get_pixel(0, 25), KEPT_COLOR);
        assert_eq!(*overlay.get_pixel(25, 25), WHITE);
    }
}
