use image::{DynamicImage, GrayImage, Luma};

/// Flattens transparency onto white, converts to gray and thresholds to a
/// pure black-on-white bitmap: anything darker than `level` becomes black.
pub fn prepare_bitmap(img: &DynamicImage, level: u8) -> GrayImage {
    let rgba = img.to_rgba8();
    GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let flatten = |c: u8| c as f32 * alpha + 255.0 * (1.0 - alpha);
        let luma = 0.299 * flatten(r) + 0.587 * flatten(g) + 0.114 * flatten(b);
        Luma([if luma < level as f32 { 0 } else { 255 }])
    })
}
