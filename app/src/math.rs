use glam::Vec3A;

use crate::HasGlamPosition;

/// Rays shorter than this are treated as degenerate.
pub const EPSILON: f32 = 0.000001;

/// Angle reported for degenerate geometry, e.g. two landmarks on top of each other.
pub const DEGENERATE_ANGLE: f32 = 0.0;

/// Angle at vertex `b` between the rays `b -> a` and `b -> c`, in degrees.
///
/// The result always lies in `[0, 180]`. The cosine is clamped before `acos` so
/// rounding error on (anti)parallel rays can't produce NaN. If either ray has
/// (near) zero length the angle is undefined and [`DEGENERATE_ANGLE`] is returned.
pub fn angle_at(a: Vec3A, b: Vec3A, c: Vec3A) -> f32 {
    let ba = a - b;
    let bc = c - b;

    let (norm_ba, norm_bc) = (ba.length(), bc.length());
    if norm_ba < EPSILON || norm_bc < EPSILON {
        return DEGENERATE_ANGLE;
    }

    let cosine = (ba.dot(bc) / (norm_ba * norm_bc)).clamp(-1.0, 1.0);
    cosine.acos().to_degrees()
}

pub fn joint_angle<P: HasGlamPosition>(a: &P, b: &P, c: &P) -> f32 {
    angle_at(a.pos(), b.pos(), c.pos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(expected: f32, actual: f32) {
        assert!(
            (expected - actual).abs() < 1e-3,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn collinear_points_are_straight() {
        let a = Vec3A::new(0.0, 0.0, 0.0);
        let b = Vec3A::new(1.0, 1.0, 0.5);
        let c = Vec3A::new(2.0, 2.0, 1.0);

        assert_close(180.0, angle_at(a, b, c));
    }

    #[test]
    fn coincident_ends_fold_back() {
        let a = Vec3A::new(0.3, 0.7, -0.1);
        let b = Vec3A::new(0.5, 0.5, 0.0);

        assert_eq!(0.0, angle_at(a, b, a));
    }

    #[test]
    fn right_angle() {
        let a = Vec3A::new(1.0, 0.0, 0.0);
        let b = Vec3A::ZERO;
        let c = Vec3A::new(0.0, 0.0, 2.0);

        assert_close(90.0, angle_at(a, b, c));
    }

    #[test]
    fn degenerate_rays_use_sentinel() {
        let b = Vec3A::new(0.1, 0.2, 0.3);
        let c = Vec3A::new(0.4, 0.2, 0.3);

        assert_eq!(DEGENERATE_ANGLE, angle_at(b, b, c));
        assert_eq!(DEGENERATE_ANGLE, angle_at(c, b, b));
        assert_eq!(DEGENERATE_ANGLE, angle_at(b, b, b));
    }

    #[test]
    fn nearly_parallel_rays_never_nan() {
        let a = Vec3A::new(-1e-3, 0.0, 0.0);
        let b = Vec3A::ZERO;
        let c = Vec3A::new(1e3, 1e-9, 0.0);

        let angle = angle_at(a, b, c);
        assert!(!angle.is_nan());
        assert!((0.0..=180.0).contains(&angle));
    }
}
