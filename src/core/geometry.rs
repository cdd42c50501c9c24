#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Builds a box from the `(left, top, width, height)` form OCR engines report.
    pub fn from_ltwh(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::new(left, top, left + width.max(0.0), top + height.max(0.0))
    }

    pub fn left(&self) -> f32 {
        self.x0
    }

    pub fn top(&self) -> f32 {
        self.y0
    }

    pub fn right(&self) -> f32 {
        self.x1
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    pub fn vertical_center(&self) -> f32 {
        (self.y0 + self.y1) * 0.5
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn contains(&self, other: &Self) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }

    /// Distance between the top-left corners of two boxes.
    pub fn top_left_distance(&self, other: &Self) -> f32 {
        ((self.x0 - other.x0).powi(2) + (self.y0 - other.y0).powi(2)).sqrt()
    }

    /// Whether both boxes sit on the same text line, judged by vertical centers.
    pub fn same_line(&self, other: &Self, tolerance: f32) -> bool {
        (self.vertical_center() - other.vertical_center()).abs() <= tolerance
    }

    /// Horizontal gap from the right edge of `self` to the left edge of `next`.
    /// Negative when the boxes overlap.
    pub fn gap_to(&self, next: &Self) -> f32 {
        next.x0 - self.x1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn union_spans_both_boxes() {
        let a = BBox::from_ltwh(10.0, 10.0, 20.0, 8.0);
        let b = BBox::from_ltwh(40.0, 12.0, 10.0, 10.0);
        let u = a.union(&b);
        assert_eq!(u, BBox::new(10.0, 10.0, 50.0, 22.0));
        assert!(u.contains(&a));
        assert!(u.contains(&b));
    }

    #[test]
    fn measures_top_left_distance() {
        let a = BBox::from_ltwh(0.0, 0.0, 5.0, 5.0);
        let b = BBox::from_ltwh(3.0, 4.0, 1.0, 1.0);
        assert_eq!(a.top_left_distance(&b), 5.0);
    }

    #[test]
    fn same_line_uses_vertical_centers() {
        let a = BBox::from_ltwh(0.0, 100.0, 10.0, 10.0);
        let b = BBox::from_ltwh(50.0, 104.0, 10.0, 10.0);
        let c = BBox::from_ltwh(50.0, 110.0, 10.0, 10.0);
        assert!(a.same_line(&b, 5.0));
        assert!(!a.same_line(&c, 5.0));
        assert_eq!(a.gap_to(&b), 40.0);
    }
}
