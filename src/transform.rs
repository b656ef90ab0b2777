// ============================================================================
// 2D TRANSFORMS
// ============================================================================

//! Affine transforms and the save/restore stack used by the composer.
//!
//! Coordinates are y-down, like the pixel buffer. A positive rotation turns
//! clockwise on screen.

use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Applies `local` first, then `self`.
    pub fn then(self, local: Transform) -> Transform {
        Transform {
            a: self.a * local.a + self.c * local.b,
            b: self.b * local.a + self.d * local.b,
            c: self.a * local.c + self.c * local.d,
            d: self.b * local.c + self.d * local.d,
            e: self.a * local.e + self.c * local.f + self.e,
            f: self.b * local.e + self.d * local.f + self.f,
        }
    }

    pub fn translate(self, dx: f64, dy: f64) -> Transform {
        self.then(Transform {
            e: dx,
            f: dy,
            ..Self::IDENTITY
        })
    }

    pub fn scale(self, sx: f64, sy: f64) -> Transform {
        self.then(Transform {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        })
    }

    /// Clockwise rotation in degrees. Quarter turns are exact.
    pub fn rotate(self, degrees: f64) -> Transform {
        let (sin, cos) = match degrees.rem_euclid(360.0) {
            r if r == 0.0 => (0.0, 1.0),
            r if r == 90.0 => (1.0, 0.0),
            r if r == 180.0 => (0.0, -1.0),
            r if r == 270.0 => (-1.0, 0.0),
            _ => degrees.to_radians().sin_cos(),
        };
        self.then(Transform {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            ..Self::IDENTITY
        })
    }

    pub fn map(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Clockwise rotation carried by this transform, in degrees.
    pub fn rotation_degrees(&self) -> f64 {
        self.b.atan2(self.a).to_degrees()
    }

    /// Length of a unit vector after mapping; transforms here scale uniformly.
    pub fn scale_factor(&self) -> f64 {
        self.a.hypot(self.b)
    }
}

/// Current transform plus a stack of saved ones.
///
/// Steps run inside [`TransformStack::scoped`], which hands back the saved
/// value itself on exit rather than undoing operations one by one, so
/// sibling steps always start from the identical transform.
#[derive(Debug, Clone)]
pub struct TransformStack {
    current: Transform,
    saved: Vec<Transform>,
}

impl TransformStack {
    pub fn new(base: Transform) -> Self {
        Self {
            current: base,
            saved: Vec::new(),
        }
    }

    pub fn current(&self) -> Transform {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn save(&mut self) {
        self.saved.push(self.current);
    }

    /// Returns `false` when there is nothing to restore.
    pub fn restore(&mut self) -> bool {
        match self.saved.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    /// Runs `step` between a save and its matching restore. Saves the step
    /// leaves open are discarded.
    pub fn scoped<R>(&mut self, step: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.saved.len();
        self.save();
        let result = step(self);
        self.saved.truncate(depth + 1);
        self.restore();
        result
    }

    pub fn rotate(&mut self, degrees: f64) {
        self.current = self.current.rotate(degrees);
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.current = self.current.scale(sx, sy);
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.current = self.current.translate(dx, dy);
    }

    /// Switches to the label frame: undoes the aggregate `zoom` and moves
    /// the origin back to the device corner, keeping any rotation about
    /// `center`.
    pub fn overlay(&mut self, zoom: f64, center: Point) {
        self.scale(1.0 / zoom, 1.0 / zoom);
        self.translate(-center.x, -center.y);
    }

    pub fn map(&self, p: Point) -> Point {
        self.current.map(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rotation_turns_clockwise_on_screen() {
        let t = Transform::IDENTITY.rotate(90.0);
        assert_eq!(t.map(Point::new(1.0, 0.0)), Point::new(0.0, 1.0));
        let t = Transform::IDENTITY.rotate(30.0);
        assert_relative_eq!(t.rotation_degrees(), 30.0, epsilon = 1e-12);
    }

    #[test]
    fn local_operations_apply_before_outer_ones() {
        let t = Transform::IDENTITY.translate(100.0, 50.0).scale(10.0, 10.0);
        assert_eq!(t.map(Point::new(1.0, -1.0)), Point::new(110.0, 40.0));
        assert_eq!(t.scale_factor(), 10.0);
    }

    #[test]
    fn scoped_restores_the_exact_value() {
        let base = Transform::IDENTITY.translate(150.0, 150.0).scale(300.0, 300.0);
        let mut stack = TransformStack::new(base);
        stack.scoped(|s| {
            s.rotate(33.3);
            s.overlay(300.0, Point::new(150.0, 150.0));
            s.save();
            s.rotate(-12.0);
        });
        assert_eq!(stack.current(), base);
        assert_eq!(stack.depth(), 0);
        assert!(!stack.restore());
    }

    #[test]
    fn overlay_frame_is_pure_rotation_about_center() {
        let center = Point::new(200.0, 200.0);
        let mut stack = TransformStack::new(
            Transform::IDENTITY
                .translate(center.x, center.y)
                .scale(400.0, 400.0),
        );
        stack.rotate(90.0);
        stack.overlay(400.0, center);
        let mapped = stack.map(Point::new(300.0, 200.0));
        assert_relative_eq!(mapped.x, 200.0, epsilon = 1e-9);
        assert_relative_eq!(mapped.y, 300.0, epsilon = 1e-9);
        assert_relative_eq!(stack.current().scale_factor(), 1.0, epsilon = 1e-12);
    }
}
