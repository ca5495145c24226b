use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box covering every point. `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut iter = points.into_iter();
        let (fx, fy) = iter.next()?;
        let (mut x0, mut y0, mut x1, mut y1) = (fx, fy, fx, fy);
        for (x, y) in iter {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        Some(Self::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 * 0.5,
            self.y as f32 + self.height as f32 * 0.5,
        )
    }

    pub fn aspect_ratio(&self) -> f32 {
        let long = self.width.max(self.height) as f32;
        let short = self.width.min(self.height).max(1) as f32;
        long / short
    }

    pub fn overlap_area(&self, other: &Self) -> u64 {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            0
        } else {
            (x1 - x0) as u64 * (y1 - y0) as u64
        }
    }

    /// Share of this box's area covered by `other`.
    pub fn overlap_ratio(&self, other: &Self) -> f32 {
        let area = self.area();
        if area == 0 {
            return 0.0;
        }
        self.overlap_area(other) as f32 / area as f32
    }

    pub fn distance_to(&self, (px, py): (f32, f32)) -> f32 {
        let (cx, cy) = self.center();
        ((cx - px).powi(2) + (cy - py).powi(2)).sqrt()
    }

    /// Grows the box by `padding` on every side, clamped to a
    /// `bound_width` x `bound_height` image.
    pub fn padded(&self, padding: u32, bound_width: u32, bound_height: u32) -> Self {
        let x0 = self.x.saturating_sub(padding).min(bound_width);
        let y0 = self.y.saturating_sub(padding).min(bound_height);
        let x1 = self.right().saturating_add(padding).min(bound_width);
        let y1 = self.bottom().saturating_add(padding).min(bound_height);
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn computes_overlap() {
        let a = BBox::new(0, 0, 10, 10);
        let b = BBox::new(5, 5, 10, 10);
        assert_eq!(a.overlap_area(&b), 25);
        assert_eq!(a.overlap_ratio(&b), 0.25);
        assert_eq!(a.overlap_area(&BBox::new(10, 0, 5, 5)), 0);
    }

    #[test]
    fn padding_is_clamped_to_bounds() {
        let b = BBox::new(3, 40, 20, 10);
        assert_eq!(b.padded(10, 100, 55), BBox::new(0, 30, 33, 25));
        assert_eq!(b.padded(0, 100, 55), b);
    }

    #[test]
    fn bbox_from_points_is_inclusive() {
        let b = BBox::from_points([(4, 7), (10, 2), (6, 9)]).unwrap();
        assert_eq!(b, BBox::new(4, 2, 7, 8));
        assert!(BBox::from_points(Vec::<(u32, u32)>::new()).is_none());
    }

    #[test]
    fn aspect_ratio_guards_zero_side() {
        assert_eq!(BBox::new(0, 0, 30, 10).aspect_ratio(), 3.0);
        assert_eq!(BBox::new(0, 0, 10, 30).aspect_ratio(), 3.0);
        assert_eq!(BBox::new(0, 0, 5, 0).aspect_ratio(), 5.0);
    }
}
