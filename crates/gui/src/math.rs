//! Small vector helpers on top of `glam::DVec3` used by camera navigation.

use glam::DVec3;

pub fn vec3(v: [f64; 3]) -> DVec3 {
    DVec3::from_array(v)
}

/// Euclidean distance between two points
pub fn point_distance(a: DVec3, b: DVec3) -> f64 {
    (a - b).length()
}

/// Remove the component of `v` along the unit vector `axis`
pub fn project_on_plane(v: DVec3, axis: DVec3) -> DVec3 {
    v - axis * v.dot(axis)
}

/// Distance between `a` and `b` measured in the plane orthogonal to `axis`
pub fn planar_separation(a: DVec3, b: DVec3, axis: DVec3) -> f64 {
    point_distance(project_on_plane(a, axis), project_on_plane(b, axis))
}

/// Height of `a` above `b` along `axis` (negative when below)
pub fn signed_height(a: DVec3, b: DVec3, axis: DVec3) -> f64 {
    (a - b).dot(axis)
}

/// `(x, y, z) -> (z, x, y)`
pub fn rotate_right(v: DVec3) -> DVec3 {
    DVec3::new(v.z, v.x, v.y)
}

/// `(x, y, z) -> (y, z, x)`
pub fn rotate_left(v: DVec3) -> DVec3 {
    DVec3::new(v.y, v.z, v.x)
}

/// Rotate `v` around the unit vector `axis` by `angle` radians (Rodrigues)
pub fn rotate_around(v: DVec3, axis: DVec3, angle: f64) -> DVec3 {
    let (sin, cos) = angle.sin_cos();
    v * cos + axis.cross(v) * sin + axis * axis.dot(v) * (1.0 - cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).length() < 1e-9
    }

    #[test]
    fn test_point_distance() {
        assert_eq!(point_distance(DVec3::ZERO, DVec3::new(3.0, 4.0, 0.0)), 5.0);
    }

    #[test]
    fn test_planar_separation_ignores_axis() {
        let a = DVec3::new(1.0, 10.0, 0.0);
        let b = DVec3::new(1.0, -3.0, 0.0);
        assert_eq!(planar_separation(a, b, DVec3::Y), 0.0);
        assert_eq!(planar_separation(a, b, DVec3::X), 13.0);
    }

    #[test]
    fn test_signed_height() {
        let a = DVec3::new(0.0, 0.0, 2.0);
        assert_eq!(signed_height(a, DVec3::ZERO, DVec3::Z), 2.0);
        assert_eq!(signed_height(a, DVec3::ZERO, DVec3::NEG_Z), -2.0);
    }

    #[test]
    fn test_component_rotation() {
        let v = DVec3::new(1.0, 2.0, 3.0);
        assert_eq!(rotate_right(v), DVec3::new(3.0, 1.0, 2.0));
        assert_eq!(rotate_left(v), DVec3::new(2.0, 3.0, 1.0));
        assert_eq!(rotate_left(rotate_right(v)), v);
    }

    #[test]
    fn test_rotate_around() {
        let v = rotate_around(DVec3::X, DVec3::Z, std::f64::consts::FRAC_PI_2);
        assert!(approx(v, DVec3::Y));
        let v = rotate_around(DVec3::Z, DVec3::Z, 1.0);
        assert!(approx(v, DVec3::Z));
    }
}
