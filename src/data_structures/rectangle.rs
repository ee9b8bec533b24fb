use crate::{
    assert_len, data_structures::Matrix, error::PdfResult, geometry::Point, objects::Object,
    FromObj, Resolve,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub lower_left_x: f32,
    pub lower_left_y: f32,
    pub upper_right_x: f32,
    pub upper_right_y: f32,
}

impl FromObj for Rectangle {
    fn from_obj(obj: Object, resolver: &mut dyn Resolve) -> PdfResult<Self> {
        let mut arr = resolver.assert_arr(obj)?;

        assert_len(arr.len(), 4)?;

        let upper_right_y = resolver.assert_number(arr.pop().unwrap())?;
        let upper_right_x = resolver.assert_number(arr.pop().unwrap())?;
        let lower_left_y = resolver.assert_number(arr.pop().unwrap())?;
        let lower_left_x = resolver.assert_number(arr.pop().unwrap())?;

        Ok(Rectangle::new(
            lower_left_x,
            lower_left_y,
            upper_right_x,
            upper_right_y,
        ))
    }
}

impl Default for Rectangle {
    fn default() -> Self {
        Self::empty()
    }
}

impl Rectangle {
    pub fn new(
        lower_left_x: f32,
        lower_left_y: f32,
        upper_right_x: f32,
        upper_right_y: f32,
    ) -> Self {
        // coordinates may arrive in any corner order
        Self {
            lower_left_x: lower_left_x.min(upper_right_x),
            lower_left_y: lower_left_y.min(upper_right_y),
            upper_right_x: lower_left_x.max(upper_right_x),
            upper_right_y: lower_left_y.max(upper_right_y),
        }
    }

    pub const fn empty() -> Self {
        Self {
            lower_left_x: 0.0,
            lower_left_y: 0.0,
            upper_right_x: 0.0,
            upper_right_y: 0.0,
        }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f32 {
        self.upper_right_x - self.lower_left_x
    }

    pub fn height(&self) -> f32 {
        self.upper_right_y - self.lower_left_y
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.lower_left_x
            && point.x <= self.upper_right_x
            && point.y >= self.lower_left_y
            && point.y <= self.upper_right_y
    }

    pub fn intersects(&self, other: Rectangle) -> bool {
        self.lower_left_x < other.upper_right_x
            && other.lower_left_x < self.upper_right_x
            && self.lower_left_y < other.upper_right_y
            && other.lower_left_y < self.upper_right_y
    }

    pub fn intersection(&self, other: Rectangle) -> Rectangle {
        if !self.intersects(other) {
            return Rectangle::empty();
        }

        Rectangle {
            lower_left_x: self.lower_left_x.max(other.lower_left_x),
            lower_left_y: self.lower_left_y.max(other.lower_left_y),
            upper_right_x: self.upper_right_x.min(other.upper_right_x),
            upper_right_y: self.upper_right_y.min(other.upper_right_y),
        }
    }

    pub fn merge(&self, other: Rectangle) -> Rectangle {
        if self.is_empty() {
            return other;
        }

        if other.is_empty() {
            return *self;
        }

        Rectangle {
            lower_left_x: self.lower_left_x.min(other.lower_left_x),
            lower_left_y: self.lower_left_y.min(other.lower_left_y),
            upper_right_x: self.upper_right_x.max(other.upper_right_x),
            upper_right_y: self.upper_right_y.max(other.upper_right_y),
        }
    }

    /// The axis-aligned bounds of this rectangle's four transformed corners
    pub fn transform(&self, matrix: Matrix) -> Rectangle {
        let corners = [
            matrix.apply(Point::new(self.lower_left_x, self.lower_left_y)),
            matrix.apply(Point::new(self.upper_right_x, self.lower_left_y)),
            matrix.apply(Point::new(self.lower_left_x, self.upper_right_y)),
            matrix.apply(Point::new(self.upper_right_x, self.upper_right_y)),
        ];

        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        for corner in corners {
            min_x = min_x.min(corner.x);
            min_y = min_y.min(corner.y);
            max_x = max_x.max(corner.x);
            max_y = max_y.max(corner.y);
        }

        Rectangle {
            lower_left_x: min_x,
            lower_left_y: min_y,
            upper_right_x: max_x,
            upper_right_y: max_y,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn disordered_corners_are_normalized() {
        let rect = Rectangle::new(10.0, 20.0, 0.0, 5.0);

        assert_eq!(rect.lower_left_x, 0.0);
        assert_eq!(rect.upper_right_y, 20.0);
        assert_eq!(rect.width(), 10.0);
        assert_eq!(rect.height(), 15.0);
    }

    #[test]
    fn intersection_of_disjoint_rects_is_empty() {
        let a = Rectangle::new(0.0, 0.0, 1.0, 1.0);
        let b = Rectangle::new(2.0, 2.0, 3.0, 3.0);

        assert!(a.intersection(b).is_empty());
    }
}
