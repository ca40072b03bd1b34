use nalgebra::UnitQuaternion;

use crate::types::{Point, Value, Vector};

// Euclidean distance between two points
pub fn distance(a: &Point, b: &Point) -> Value {
    (b - a).norm()
}

// Point half-way between a and b
pub fn midpoint(a: &Point, b: &Point) -> Point {
    nalgebra::center(a, b)
}

/// Rotation that turns local `-Z` towards `to` when placed at `from`.
///
/// This is what a look-at constraint resolves to for line artifacts. Vertical
/// segments are handled like any other direction, and coincident points yield
/// the identity so degenerate segments never produce NaNs.
///
/// ```text
///   from ●───────────▶ to
///        local -Z
/// ```
pub fn look_rotation(from: &Point, to: &Point) -> UnitQuaternion<Value> {
    let Some(direction) = (to - from).try_normalize(Value::EPSILON) else {
        return UnitQuaternion::identity();
    };

    let forward = -Vector::z();
    // rotation_between is undefined for opposite vectors, i.e. pointing at +Z.
    UnitQuaternion::rotation_between(&forward, &direction).unwrap_or_else(|| {
        UnitQuaternion::from_axis_angle(&Vector::y_axis(), std::f64::consts::PI)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_3_4_5() {
        let a = Point::origin();
        let b = Point::new(3.0, 4.0, 0.0);
        assert_relative_eq!(distance(&a, &b), 5.0);
        assert_relative_eq!(distance(&b, &a), 5.0);
    }

    #[test]
    fn test_midpoint() {
        let m = midpoint(&Point::new(0.0, 0.0, 0.0), &Point::new(2.0, -4.0, 1.0));
        assert_relative_eq!(m, Point::new(1.0, -2.0, 0.5));
    }

    #[test]
    fn test_look_rotation_points_forward_at_target() {
        let cases = [
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.0, -2.0, 0.0),
            Point::new(0.0, 0.0, 3.0),
            Point::new(0.0, 0.0, -3.0),
            Point::new(-1.0, 2.0, 0.5),
        ];
        for target in cases {
            let rotation = look_rotation(&Point::origin(), &target);
            let forward = rotation * -Vector::z();
            let expected = target.coords.normalize();
            assert_relative_eq!(forward, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_look_rotation_degenerate_is_identity() {
        let p = Point::new(0.4, 0.1, -2.0);
        let rotation = look_rotation(&p, &p);
        assert_eq!(rotation, UnitQuaternion::identity());
    }
}
