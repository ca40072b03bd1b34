use bevy::math::{Quat, Vec3};
use nalgebra::UnitQuaternion;

use crate::types::{Point, Value, Vector};

/// Converts a world-space [`Point`] into Bevy's single-precision [`Vec3`].
#[inline]
pub fn point_to_vec3(p: &Point) -> Vec3 {
    Vec3::new(p.x as f32, p.y as f32, p.z as f32)
}

/// Converts a local offset into Bevy's [`Vec3`].
#[inline]
pub fn vector_to_vec3(v: &Vector) -> Vec3 {
    Vec3::new(v.x as f32, v.y as f32, v.z as f32)
}

/// Widens a Bevy position, e.g. a ray hit, into a [`Point`].
#[inline]
pub fn vec3_to_point(v: Vec3) -> Point {
    Point::new(v.x as Value, v.y as Value, v.z as Value)
}

/// Converts a rotation into Bevy's [`Quat`].
///
/// nalgebra stores quaternion coordinates as `[i, j, k, w]`, which lines up
/// with glam's `[x, y, z, w]`.
#[inline]
pub fn rotation_to_quat(q: &UnitQuaternion<Value>) -> Quat {
    let c = q.quaternion().coords;
    Quat::from_xyzw(c.x as f32, c.y as f32, c.z as f32, c.w as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::look_rotation;

    #[test]
    fn test_point_round_trip() {
        let v = Vec3::new(1.5, -2.0, 0.25);
        assert_eq!(point_to_vec3(&vec3_to_point(v)), v);
    }

    #[test]
    fn test_rotation_matches_glam() {
        let rotation = look_rotation(&Point::origin(), &Point::new(1.0, 0.0, 0.0));
        let quat = rotation_to_quat(&rotation);
        let forward = quat * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(Vec3::X, 1e-6));
    }
}
