//! # Planar geometry module
//!
//! Stateless 2D vector helpers used to compute the distance and signed heading errors between the
//! base and its goal. All angles are in radians.
//!
//! None of these functions validate their inputs. NaNs propagate through to the result rather
//! than being trapped.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Quaternion, Rotation2, Vector2};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Component-wise difference `a - b`.
pub fn subtract(a: &Vector2<f64>, b: &Vector2<f64>) -> Vector2<f64> {
    a - b
}

/// Euclidean norm of the vector, `sqrt(v . v)`.
pub fn length(v: &Vector2<f64>) -> f64 {
    v.dot(v).sqrt()
}

/// Unsigned angle between two vectors, in the range `[0, pi]`.
///
/// The cosine is clamped into `[-1, 1]` before `acos` is taken, as rounding regularly pushes it
/// just outside that range for (anti)parallel vectors. A zero-length input gives NaN.
pub fn angle_between(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    let cos = a.dot(b) / (length(a) * length(b));

    if cos > 1.0 {
        0.0
    } else if cos < -1.0 {
        std::f64::consts::PI
    } else {
        cos.acos()
    }
}

/// Rotate the vector anticlockwise by the given angle.
pub fn rotate(v: &Vector2<f64>, angle_rad: f64) -> Vector2<f64> {
    Rotation2::new(angle_rad) * *v
}

/// Yaw of the quaternion, i.e. the planar heading of the body it describes.
///
/// Roll and pitch are ignored. The quaternion is not normalised first.
pub fn heading_from_quaternion(q: &Quaternion<f64>) -> f64 {
    (2.0 * (q.i * q.j + q.k * q.w)).atan2(1.0 - 2.0 * (q.j * q.j + q.k * q.k))
}

/// Unit vector pointing along the given heading.
pub fn heading_vector(heading_rad: f64) -> Vector2<f64> {
    Vector2::new(heading_rad.cos(), heading_rad.sin())
}

/// Signed angle to turn `head` onto `path`, positive anticlockwise.
///
/// `angle_between` cannot tell a clockwise from an anticlockwise difference, so the heading is
/// rotated by the unsigned angle and compared with the path again. If they are still further apart
/// than `align_tol_rad` the turn must be clockwise and the angle is negated.
///
/// For errors smaller than the tolerance both rotations land within it, so the clockwise rotation
/// is also tried and whichever lands closer to the path decides the sign.
pub fn signed_heading_error(head: &Vector2<f64>, path: &Vector2<f64>, align_tol_rad: f64) -> f64 {
    let angle_rad = angle_between(head, path);

    let acw_miss_rad = angle_between(path, &rotate(head, angle_rad));
    let cw_miss_rad = angle_between(path, &rotate(head, -angle_rad));

    if acw_miss_rad > align_tol_rad || cw_miss_rad < acw_miss_rad {
        -angle_rad
    } else {
        angle_rad
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const TOL: f64 = 1e-9;

    #[test]
    fn test_length_and_subtract() {
        let a = Vector2::new(4.0, 6.0);
        let b = Vector2::new(1.0, 2.0);

        assert_eq!(subtract(&a, &b), Vector2::new(3.0, 4.0));
        assert_eq!(length(&subtract(&a, &b)), 5.0);
        assert!(length(&Vector2::new(f64::NAN, 0.0)).is_nan());
    }

    #[test]
    fn test_angle_between() {
        let vecs = [
            Vector2::new(1.0, 0.0),
            Vector2::new(0.3, -2.0),
            Vector2::new(-1.0, 1e-9),
            Vector2::new(-5.0, -5.0),
            Vector2::new(1e-3, 7.0),
        ];

        for a in vecs.iter() {
            for b in vecs.iter() {
                let ab = angle_between(a, b);
                assert_eq!(ab, angle_between(b, a));
                assert!((0.0..=PI).contains(&ab), "angle {} out of range", ab);
            }
        }

        assert!((angle_between(&Vector2::new(1.0, 0.0), &Vector2::new(1.0, 1.0)) - FRAC_PI_4).abs() < TOL);
    }

    #[test]
    fn test_angle_between_clamps() {
        let cos = |a: &Vector2<f64>, b: &Vector2<f64>| a.dot(b) / (length(a) * length(b));

        let a = Vector2::new(0.1, 0.7);
        let b = Vector2::new(0.3, 2.1);
        let c = -b;

        // Rounding pushes the raw cosine outside [-1, 1] for these
        assert!(cos(&a, &b) > 1.0);
        assert!(cos(&a, &c) < -1.0);
        assert!(cos(&a, &b).acos().is_nan());

        assert_eq!(angle_between(&a, &b), 0.0);
        assert_eq!(angle_between(&a, &c), PI);

        // Exact parallel and antiparallel vectors land on the boundaries
        let x = Vector2::new(3.0, 0.0);
        assert_eq!(angle_between(&x, &Vector2::new(1.0, 0.0)), 0.0);
        assert_eq!(angle_between(&x, &Vector2::new(-1.0, 0.0)), PI);
    }

    #[test]
    fn test_rotate() {
        let v = rotate(&Vector2::new(1.0, 0.0), FRAC_PI_2);
        assert!((v - Vector2::new(0.0, 1.0)).norm() < TOL);

        let v = rotate(&Vector2::new(0.0, 2.0), -FRAC_PI_2);
        assert!((v - Vector2::new(2.0, 0.0)).norm() < TOL);
    }

    #[test]
    fn test_heading_from_quaternion() {
        // Pure yaw rotations, [x, y, z, w] = [0, 0, sin(h/2), cos(h/2)]
        for &h in [0.0, 0.5, FRAC_PI_2, -2.0, 3.0].iter() {
            let q = Quaternion::new((h / 2.0).cos(), 0.0, 0.0, (h / 2.0).sin());
            assert!((heading_from_quaternion(&q) - h).abs() < TOL);
        }

        // An all-zero quaternion, as held before the first pose arrives, points along X
        assert_eq!(heading_from_quaternion(&Quaternion::new(0.0, 0.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_signed_heading_error() {
        let head = Vector2::new(1.0, 0.0);

        let left = signed_heading_error(&head, &Vector2::new(0.0, 1.0), 1e-6);
        let right = signed_heading_error(&head, &Vector2::new(0.0, -1.0), 1e-6);

        assert!((left - FRAC_PI_2).abs() < TOL);
        assert!((right + FRAC_PI_2).abs() < TOL);

        // Off-axis heading and path
        let head = heading_vector(2.0);
        let path: Vector2<f64> = Vector2::new(-3.0, -1.0);
        let expected = path.y.atan2(path.x) - 2.0;
        let expected = if expected < -PI { expected + 2.0 * PI } else { expected };
        assert!((signed_heading_error(&head, &path, 1e-6) - expected).abs() < 1e-6);

        // Already aligned
        assert!(signed_heading_error(&head, &(head * 4.0), 1e-6).abs() < 1e-6);
    }

    #[test]
    fn test_signed_heading_error_below_tolerance() {
        let head = Vector2::new(1.0, 0.0);

        // Both errors are smaller than the tolerance but the sign must still follow the turn
        for &tol in [1e-6, 0.0].iter() {
            let right = signed_heading_error(&head, &Vector2::new(1.0, -3e-7), tol);
            let left = signed_heading_error(&head, &Vector2::new(1.0, 3e-7), tol);

            assert!(right < 0.0, "tol {}: expected clockwise, got {}", tol, right);
            assert!(left > 0.0, "tol {}: expected anticlockwise, got {}", tol, left);
            assert!((right + 3e-7).abs() < 1e-8);
            assert!((left - 3e-7).abs() < 1e-8);
        }
    }
}
