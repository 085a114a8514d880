//! Newton-Euler wrench balance of a single link.

use nalgebra::{DVector, Matrix6, Vector3};
use sim_factor_graph::lie::{ad, angular, linear, skew, SpatialVector};
use sim_factor_graph::{Factor, Jacobians, Key, NoiseModel, Values};
use smallvec::SmallVec;

use super::{dense, residual};

/// Largest number of joint wrenches one balance factor accepts.
pub const MAX_WRENCHES: usize = 4;

/// Residual `G A - ad(V)ᵀ G V - Σ F_i - [0; m Rᵀ g]` in the link COM frame.
///
/// Keys: twist, twist acceleration, one wrench per incident joint, and the
/// link pose when gravity is present.
#[derive(Debug, Clone)]
pub struct WrenchFactor {
    keys: SmallVec<[Key; 7]>,
    noise: NoiseModel,
    inertia: Matrix6<f64>,
    mass: f64,
    gravity: Option<Vector3<f64>>,
}

impl WrenchFactor {
    /// Create a wrench balance factor from the spatial inertia
    /// `blockdiag(I, m·1)`.
    ///
    /// Returns `None` when more than [`MAX_WRENCHES`] wrenches are given.
    /// `gravity` adds the link pose as the last key.
    #[must_use]
    pub fn new(
        twist: Key,
        twist_accel: Key,
        wrenches: &[Key],
        pose: Key,
        noise: NoiseModel,
        inertia: Matrix6<f64>,
        gravity: Option<Vector3<f64>>,
    ) -> Option<Self> {
        if wrenches.len() > MAX_WRENCHES {
            return None;
        }
        let mut keys: SmallVec<[Key; 7]> = SmallVec::new();
        keys.push(twist);
        keys.push(twist_accel);
        keys.extend_from_slice(wrenches);
        if gravity.is_some() {
            keys.push(pose);
        }
        Some(Self {
            keys,
            noise,
            mass: inertia[(3, 3)],
            inertia,
            gravity,
        })
    }

    /// Number of joint wrenches.
    #[must_use]
    pub fn num_wrenches(&self) -> usize {
        self.keys.len() - 2 - usize::from(self.gravity.is_some())
    }
}

/// Derivative of `ad(V)ᵀ w` with respect to `V`.
fn coadjoint_twist_jacobian(w: &SpatialVector) -> Matrix6<f64> {
    let w_tau = skew(&angular(w));
    let w_f = skew(&linear(w));
    let mut m = Matrix6::zeros();
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(&w_tau);
    m.fixed_view_mut::<3, 3>(0, 3).copy_from(&w_f);
    m.fixed_view_mut::<3, 3>(3, 0).copy_from(&w_f);
    m
}

impl Factor for WrenchFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim(&self) -> usize {
        6
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise
    }

    fn name(&self) -> &'static str {
        "wrench"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        let twist = values.vector6(self.keys[0])?;
        let accel = values.vector6(self.keys[1])?;
        let n = self.num_wrenches();

        let g_v = self.inertia * twist;
        let mut e = self.inertia * accel - ad(&twist).transpose() * g_v;
        for key in &self.keys[2..2 + n] {
            e -= values.vector6(*key)?;
        }

        let mut gravity_jacobian = None;
        if let Some(g) = self.gravity {
            let pose = values.pose(self.keys[2 + n])?;
            let g_body = pose.rotation.inverse() * g;
            let mut force = SpatialVector::zeros();
            force.fixed_rows_mut::<3>(3).copy_from(&(g_body * self.mass));
            e -= force;

            let mut h = Matrix6::<f64>::zeros();
            h.fixed_view_mut::<3, 3>(3, 0)
                .copy_from(&(skew(&g_body) * -self.mass));
            gravity_jacobian = Some(h);
        }

        if let Some(h) = jacobians {
            h.clear();
            h.push(dense(
                &-(ad(&twist).transpose() * self.inertia + coadjoint_twist_jacobian(&g_v)),
            ));
            h.push(dense(&self.inertia));
            for _ in 0..n {
                h.push(dense(&-Matrix6::<f64>::identity()));
            }
            if let Some(g) = gravity_jacobian {
                h.push(dense(&g));
            }
        }
        Ok(residual(&e))
    }
}
