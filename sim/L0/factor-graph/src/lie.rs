//! SE(3) Lie-group utilities for 6D motion and force vectors.
//!
//! Tangent vectors are ordered `[ω; v]` (angular first). Poses are
//! [`Isometry3`]; retraction is right-multiplication `x · Exp(ξ)` and local
//! coordinates are `Log(x⁻¹ y)`.

use nalgebra::{Isometry3, Matrix3, Matrix6, Translation3, UnitQuaternion, Vector3, Vector6};

/// 6D spatial vector: `[angular (3), linear (3)]`.
///
/// - Motion vectors: `[ω, v]` (twist, screw axis)
/// - Force vectors: `[τ, f]` (wrench)
pub type SpatialVector = Vector6<f64>;

const SMALL_ANGLE: f64 = 1e-3;

/// Skew-symmetric matrix such that `skew(a) * b = a × b`.
#[must_use]
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Angular part of a spatial vector.
#[must_use]
pub fn angular(v: &SpatialVector) -> Vector3<f64> {
    v.fixed_rows::<3>(0).into_owned()
}

/// Linear part of a spatial vector.
#[must_use]
pub fn linear(v: &SpatialVector) -> Vector3<f64> {
    v.fixed_rows::<3>(3).into_owned()
}

/// Stack angular and linear parts.
#[must_use]
pub fn spatial(angular: &Vector3<f64>, linear: &Vector3<f64>) -> SpatialVector {
    SpatialVector::new(
        angular.x, angular.y, angular.z, linear.x, linear.y, linear.z,
    )
}

/// Twist of a unit rotation about axis `w` through point `p`: `[w; p × w]`.
#[must_use]
pub fn unit_twist(w: &Vector3<f64>, p: &Vector3<f64>) -> SpatialVector {
    spatial(w, &p.cross(w))
}

/// Left Jacobian `V(ω)` relating the tangent translation to the pose translation.
fn left_jacobian(omega: &Vector3<f64>) -> Matrix3<f64> {
    let theta = omega.norm();
    let w = skew(omega);
    let (a, b) = if theta < SMALL_ANGLE {
        let t2 = theta * theta;
        (0.5 - t2 / 24.0, 1.0 / 6.0 - t2 / 120.0)
    } else {
        let t2 = theta * theta;
        ((1.0 - theta.cos()) / t2, (theta - theta.sin()) / (t2 * theta))
    };
    Matrix3::identity() + w * a + w * w * b
}

/// Inverse of [`left_jacobian`].
fn left_jacobian_inverse(omega: &Vector3<f64>) -> Matrix3<f64> {
    let theta = omega.norm();
    let w = skew(omega);
    let c = if theta < SMALL_ANGLE {
        1.0 / 12.0 + theta * theta / 720.0
    } else {
        let t2 = theta * theta;
        (1.0 - theta * theta.sin() / (2.0 * (1.0 - theta.cos()))) / t2
    };
    Matrix3::identity() - w * 0.5 + w * w * c
}

/// Exponential map from `se(3)` to `SE(3)`.
#[must_use]
pub fn se3_exp(xi: &SpatialVector) -> Isometry3<f64> {
    let omega = angular(xi);
    let v = linear(xi);
    let rotation = UnitQuaternion::from_scaled_axis(omega);
    let translation = left_jacobian(&omega) * v;
    Isometry3::from_parts(Translation3::from(translation), rotation)
}

/// Logarithm map from `SE(3)` to `se(3)`.
#[must_use]
pub fn se3_log(pose: &Isometry3<f64>) -> SpatialVector {
    let omega = pose.rotation.scaled_axis();
    let v = left_jacobian_inverse(&omega) * pose.translation.vector;
    spatial(&omega, &v)
}

/// Retract a pose along a body-frame tangent vector: `x · Exp(ξ)`.
#[must_use]
pub fn pose_retract(pose: &Isometry3<f64>, xi: &SpatialVector) -> Isometry3<f64> {
    pose * se3_exp(xi)
}

/// Body-frame tangent vector from `x` to `y`: `Log(x⁻¹ y)`.
#[must_use]
pub fn pose_local(x: &Isometry3<f64>, y: &Isometry3<f64>) -> SpatialVector {
    se3_log(&(x.inverse() * y))
}

/// Adjoint map `Ad_T = [[R, 0], [p̂ R, R]]` transforming twists from the
/// frame `T` maps from into the frame it maps to.
#[must_use]
pub fn adjoint(pose: &Isometry3<f64>) -> Matrix6<f64> {
    let r = pose.rotation.to_rotation_matrix().into_inner();
    let p_hat = skew(&pose.translation.vector);
    let mut ad = Matrix6::zeros();
    ad.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
    ad.fixed_view_mut::<3, 3>(3, 0).copy_from(&(p_hat * r));
    ad.fixed_view_mut::<3, 3>(3, 3).copy_from(&r);
    ad
}

/// Twist bracket matrix `ad(V) = [[ω̂, 0], [v̂, ω̂]]`.
#[must_use]
pub fn ad(twist: &SpatialVector) -> Matrix6<f64> {
    let w_hat = skew(&angular(twist));
    let v_hat = skew(&linear(twist));
    let mut m = Matrix6::zeros();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&w_hat);
    m.fixed_view_mut::<3, 3>(3, 0).copy_from(&v_hat);
    m.fixed_view_mut::<3, 3>(3, 3).copy_from(&w_hat);
    m
}

/// Spatial cross product for motion vectors: `v × s = ad(v) s`.
#[must_use]
pub fn spatial_cross_motion(v: &SpatialVector, s: &SpatialVector) -> SpatialVector {
    let w = angular(v);
    let v_lin = linear(v);
    let s_ang = angular(s);
    let s_lin = linear(s);

    let result_ang = w.cross(&s_ang);
    let result_lin = w.cross(&s_lin) + v_lin.cross(&s_ang);
    spatial(&result_ang, &result_lin)
}

/// Spatial cross product for force vectors: `v ×* f = -ad(v)ᵀ f`.
#[must_use]
pub fn spatial_cross_force(v: &SpatialVector, f: &SpatialVector) -> SpatialVector {
    let w = angular(v);
    let v_lin = linear(v);
    let f_ang = angular(f);
    let f_lin = linear(f);

    let result_ang = w.cross(&f_ang) + v_lin.cross(&f_lin);
    let result_lin = w.cross(&f_lin);
    spatial(&result_ang, &result_lin)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_pose() -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::new(0.3, -1.2, 2.0),
            UnitQuaternion::from_scaled_axis(Vector3::new(0.4, -0.2, 0.9)),
        )
    }

    #[test]
    fn test_exp_log_round_trip() {
        for xi in [
            SpatialVector::new(0.1, -0.3, 0.2, 1.0, 2.0, -0.5),
            SpatialVector::new(1e-6, 0.0, -2e-6, 0.5, 0.0, 0.0),
            SpatialVector::new(0.0, 0.0, 3.0, 0.0, 1.0, 0.0),
        ] {
            let back = se3_log(&se3_exp(&xi));
            assert_relative_eq!(back, xi, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_pure_translation_exp() {
        let xi = SpatialVector::new(0.0, 0.0, 0.0, 1.0, 2.0, 3.0);
        let pose = se3_exp(&xi);
        assert_relative_eq!(pose.translation.vector, Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_retract_local_inverse() {
        let x = sample_pose();
        let xi = SpatialVector::new(0.05, 0.1, -0.2, 0.3, -0.1, 0.4);
        let y = pose_retract(&x, &xi);
        assert_relative_eq!(pose_local(&x, &y), xi, epsilon = 1e-9);
    }

    #[test]
    fn test_adjoint_conjugation() {
        // T Exp(ξ) T⁻¹ = Exp(Ad_T ξ)
        let t = sample_pose();
        let xi = SpatialVector::new(0.1, 0.2, -0.1, 0.5, -0.4, 0.3);
        let lhs = t * se3_exp(&xi) * t.inverse();
        let rhs = se3_exp(&(adjoint(&t) * xi));
        assert_relative_eq!(lhs.to_homogeneous(), rhs.to_homogeneous(), epsilon = 1e-9);
    }

    #[test]
    fn test_cross_products_match_bracket() {
        let v = SpatialVector::new(0.3, -0.2, 0.9, 1.0, 0.5, -0.7);
        let s = SpatialVector::new(-0.1, 0.4, 0.2, 0.3, -0.6, 0.8);
        assert_relative_eq!(spatial_cross_motion(&v, &s), ad(&v) * s, epsilon = 1e-12);
        assert_relative_eq!(
            spatial_cross_force(&v, &s),
            -(ad(&v).transpose() * s),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_unit_twist() {
        let s = unit_twist(&Vector3::z(), &Vector3::new(-1.0, 0.0, 0.0));
        assert_relative_eq!(s, SpatialVector::new(0.0, 0.0, 1.0, 0.0, 1.0, 0.0));
    }
}
