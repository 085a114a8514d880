//! Planar mechanism constraint on joint wrenches.

use nalgebra::{DMatrix, DVector};
use sim_factor_graph::{Factor, Jacobians, Key, NoiseModel, Values};
use sim_types::PlanarAxis;

/// Residual: the three wrench components that would move a planar
/// mechanism out of its plane.
#[derive(Debug, Clone)]
pub struct WrenchPlanarFactor {
    keys: [Key; 1],
    noise: NoiseModel,
    axis: PlanarAxis,
}

impl WrenchPlanarFactor {
    /// Create a planar factor on a child-side joint wrench.
    #[must_use]
    pub fn new(wrench: Key, noise: NoiseModel, axis: PlanarAxis) -> Self {
        Self {
            keys: [wrench],
            noise,
            axis,
        }
    }
}

impl Factor for WrenchPlanarFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }

    fn dim(&self) -> usize {
        3
    }

    fn noise_model(&self) -> &NoiseModel {
        &self.noise
    }

    fn name(&self) -> &'static str {
        "wrench_planar"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        let wrench = values.vector6(self.keys[0])?;
        let rows = self.axis.out_of_plane_components();
        if let Some(h) = jacobians {
            let mut selection = DMatrix::zeros(3, 6);
            for (i, &c) in rows.iter().enumerate() {
                selection[(i, c)] = 1.0;
            }
            *h = vec![selection];
        }
        Ok(DVector::from_iterator(3, rows.iter().map(|&c| wrench[c])))
    }
}
