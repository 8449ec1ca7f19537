/// Axis-aligned box in pixel coordinates, `(x1, y1)` top-left and
/// `(x2, y2)` bottom-right. No ordering is enforced: an inverted box
/// simply has zero area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn area(&self) -> i64 {
        let w = (self.x2 - self.x1).max(0) as i64;
        let h = (self.y2 - self.y1).max(0) as i64;
        w * h
    }

    /// Overlap area with `other`. Boxes that only touch at an edge do not
    /// overlap.
    pub fn intersection(&self, other: &PixelBox) -> i64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);
        if x2 <= x1 || y2 <= y1 {
            return 0;
        }
        (x2 - x1) as i64 * (y2 - y1) as i64
    }

    /// Fraction of this box's own area that lies inside `outer`, in `[0, 1]`.
    /// A degenerate box yields 0, the epsilon keeps the division defined.
    pub fn containment_ratio(&self, outer: &PixelBox) -> f64 {
        let inter = self.intersection(outer) as f64;
        inter / (self.area() as f64 + 1e-6)
    }

    /// Expand by `px` on every side; negative `px` shrinks.
    pub fn pad(&self, px: i32) -> PixelBox {
        PixelBox {
            x1: self.x1 - px,
            y1: self.y1 - px,
            x2: self.x2 + px,
            y2: self.y2 + px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area() {
        assert_eq!(PixelBox::new(0, 0, 10, 10).area(), 100);
        assert_eq!(PixelBox::new(0, 0, 0, 10).area(), 0);
        assert_eq!(PixelBox::new(0, 0, 10, 0).area(), 0);
        // inverted box degrades to zero, never negative
        assert_eq!(PixelBox::new(10, 10, 0, 0).area(), 0);
        assert_eq!(PixelBox::new(5, 5, 5, 5).area(), 0);
    }

    #[test]
    fn test_intersection() {
        let a = PixelBox::new(0, 0, 10, 10);
        let b = PixelBox::new(5, 5, 15, 15);
        assert_eq!(a.intersection(&b), 25);
        assert_eq!(b.intersection(&a), 25);

        // disjoint
        assert_eq!(
            PixelBox::new(0, 0, 5, 5).intersection(&PixelBox::new(10, 10, 15, 15)),
            0
        );
        // edge touch does not count as overlap
        assert_eq!(
            PixelBox::new(0, 0, 5, 5).intersection(&PixelBox::new(5, 0, 10, 5)),
            0
        );
        // contained box
        assert_eq!(a.intersection(&PixelBox::new(2, 2, 8, 8)), 36);
    }

    #[test]
    fn test_intersection_bounded_by_smaller_area() {
        let a = PixelBox::new(0, 0, 10, 10);
        let b = PixelBox::new(3, 3, 100, 100);
        assert!(a.intersection(&b) <= a.area().min(b.area()));
    }

    #[test]
    fn test_containment_ratio() {
        let outer = PixelBox::new(0, 0, 10, 10);
        // fully contained
        assert!((PixelBox::new(2, 2, 8, 8).containment_ratio(&outer) - 1.0).abs() < 1e-4);
        // half in, half out
        let ratio = PixelBox::new(5, 0, 15, 10).containment_ratio(&outer);
        assert!((ratio - 0.5).abs() < 1e-4);
        // no overlap
        assert_eq!(
            PixelBox::new(10, 10, 15, 15).containment_ratio(&PixelBox::new(0, 0, 5, 5)),
            0.0
        );
        // degenerate inner box is 0, not NaN
        let degenerate = PixelBox::new(5, 5, 5, 5).containment_ratio(&outer);
        assert_eq!(degenerate, 0.0);
    }

    #[test]
    fn test_pad() {
        let b = PixelBox::new(0, 0, 10, 10);
        assert_eq!(b.pad(5), PixelBox::new(-5, -5, 15, 15));
        assert_eq!(b.pad(0), b);
        assert_eq!(b.pad(-2), PixelBox::new(2, 2, 8, 8));
        // padding then unpadding round-trips
        assert_eq!(b.pad(7).pad(-7), b);
    }
}
