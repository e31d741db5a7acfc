use macroquad::math::{Quat, Vec3};
use std::f32::consts::PI;

/// Linear interpolation between two f32 values
pub fn lerp(start: f32, end: f32, alpha: f32) -> f32 {
    start + (end - start) * alpha
}

/// Linear interpolation between two points
pub fn lerp_vec3(start: Vec3, end: Vec3, alpha: f32) -> Vec3 {
    Vec3::new(
        lerp(start.x, end.x, alpha),
        lerp(start.y, end.y, alpha),
        lerp(start.z, end.z, alpha),
    )
}

/// Wraps an angle in radians into (-PI, PI]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut wrapped = angle % (2.0 * PI);
    if wrapped <= -PI {
        wrapped += 2.0 * PI;
    } else if wrapped > PI {
        wrapped -= 2.0 * PI;
    }
    wrapped
}

/// Heading of a direction on the ground plane. Zero faces +Z, positive turns toward +X.
pub fn heading(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

/// Yaw of a rotation, measured the same way as [`heading`].
pub fn yaw_of(rotation: Quat) -> f32 {
    heading(rotation * Vec3::Z)
}

/// Unit direction on the ground plane for a heading.
pub fn heading_vector(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Drops the vertical component and normalizes. Zero-length input stays zero.
pub fn flatten(direction: Vec3) -> Vec3 {
    Vec3::new(direction.x, 0.0, direction.z).normalize_or_zero()
}

/// Distance between two points measured on the ground plane
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    Vec3::new(b.x - a.x, 0.0, b.z - a.z).length()
}

/// Unsigned angle between two directions on the ground plane, in [0, PI]
pub fn planar_angle_between(a: Vec3, b: Vec3) -> f32 {
    wrap_angle(heading(b) - heading(a)).abs()
}

/// Turn input that rotates `forward` toward `target` along the shorter arc.
///
/// Uses the sign of the vertical component of `forward x target`. Returns 0
/// when the target is straight ahead; a target straight behind turns positive.
pub fn turn_sign(forward: Vec3, target: Vec3) -> f32 {
    let cross_y = forward.cross(target).y;
    if cross_y > f32::EPSILON {
        1.0
    } else if cross_y < -f32::EPSILON {
        -1.0
    } else if forward.dot(target) < 0.0 {
        1.0
    } else {
        0.0
    }
}
