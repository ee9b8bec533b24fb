use crate::data_structures::{Matrix, Rectangle};

use super::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    CubicTo {
        first_control_point: Point,
        second_control_point: Point,
        end: Point,
    },
    Close,
}

/// A sequence of sub-paths accumulated by the path-construction operators.
///
/// Segments are replayed verbatim by the canvas; the interpreter only ever
/// appends, transforms, and inspects bounds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub segments: Vec<PathSegment>,
    current_point: Point,
    subpath_start: Point,
}

impl Path {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            current_point: Point::origin(),
            subpath_start: Point::origin(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn current_point(&self) -> Point {
        self.current_point
    }

    pub fn move_to(&mut self, point: Point) {
        self.segments.push(PathSegment::MoveTo(point));
        self.current_point = point;
        self.subpath_start = point;
    }

    pub fn line_to(&mut self, point: Point) {
        self.segments.push(PathSegment::LineTo(point));
        self.current_point = point;
    }

    pub fn cubic_curve_to(
        &mut self,
        first_control_point: Point,
        second_control_point: Point,
        end: Point,
    ) {
        self.segments.push(PathSegment::CubicTo {
            first_control_point,
            second_control_point,
            end,
        });
        self.current_point = end;
    }

    /// `v`: the current point doubles as the first control point
    pub fn cubic_curve_to_replicate_initial(&mut self, second_control_point: Point, end: Point) {
        self.cubic_curve_to(self.current_point, second_control_point, end);
    }

    /// `y`: the endpoint doubles as the second control point
    pub fn cubic_curve_to_replicate_final(&mut self, first_control_point: Point, end: Point) {
        self.cubic_curve_to(first_control_point, end, end);
    }

    pub fn close(&mut self) {
        self.segments.push(PathSegment::Close);
        self.current_point = self.subpath_start;
    }

    /// `re`: a complete rectangular subpath
    pub fn rect(&mut self, rect: Rectangle) {
        self.move_to(Point::new(rect.lower_left_x, rect.lower_left_y));
        self.line_to(Point::new(rect.upper_right_x, rect.lower_left_y));
        self.line_to(Point::new(rect.upper_right_x, rect.upper_right_y));
        self.line_to(Point::new(rect.lower_left_x, rect.upper_right_y));
        self.close();
    }

    pub fn from_rect(rect: Rectangle) -> Self {
        let mut path = Path::new();
        path.rect(rect);
        path
    }

    pub fn apply_transform(&mut self, matrix: Matrix) {
        for segment in &mut self.segments {
            match segment {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => *p = matrix.apply(*p),
                PathSegment::CubicTo {
                    first_control_point,
                    second_control_point,
                    end,
                } => {
                    *first_control_point = matrix.apply(*first_control_point);
                    *second_control_point = matrix.apply(*second_control_point);
                    *end = matrix.apply(*end);
                }
                PathSegment::Close => {}
            }
        }

        self.current_point = matrix.apply(self.current_point);
        self.subpath_start = matrix.apply(self.subpath_start);
    }

    /// Control-point bounds. A conservative bounding box: control points of
    /// cubic segments are included even when the curve does not reach them
    pub fn bounding_box(&self) -> Rectangle {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;

        let mut merge = |p: Point| {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        };

        for segment in &self.segments {
            match segment {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => merge(*p),
                PathSegment::CubicTo {
                    first_control_point,
                    second_control_point,
                    end,
                } => {
                    merge(*first_control_point);
                    merge(*second_control_point);
                    merge(*end);
                }
                PathSegment::Close => {}
            }
        }

        if min_x > max_x {
            return Rectangle::empty();
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
    fn rect_subpath_is_closed() {
        let path = Path::from_rect(Rectangle::new(10.0, 10.0, 110.0, 60.0));

        assert_eq!(path.segments.len(), 5);
        assert_eq!(path.segments[4], PathSegment::Close);
        assert_eq!(
            path.bounding_box(),
            Rectangle::new(10.0, 10.0, 110.0, 60.0)
        );
    }

    #[test]
    fn close_resets_current_point_to_subpath_start() {
        let mut path = Path::new();
        path.move_to(Point::new(1.0, 2.0));
        path.line_to(Point::new(5.0, 5.0));
        path.close();

        assert_eq!(path.current_point(), Point::new(1.0, 2.0));
    }
}
