//! Soft objective on the pose of a frame rigidly attached to a link.

use nalgebra::{DVector, Isometry3};
use sim_factor_graph::lie::pose_local;
use sim_factor_graph::{numerical_jacobians, Factor, Jacobians, Key, NoiseModel, Values};

use super::residual;

/// Residual `local(goal, wTcom · comTgoal)`.
#[derive(Debug, Clone)]
pub struct PoseGoalFactor {
    keys: [Key; 1],
    noise: NoiseModel,
    goal: Isometry3<f64>,
    com_t_goal: Isometry3<f64>,
}

impl PoseGoalFactor {
    /// Pull the frame `com_t_goal` of the link whose COM pose is `pose` to `goal`.
    #[must_use]
    pub fn new(pose: Key, noise: NoiseModel, goal: Isometry3<f64>, com_t_goal: Isometry3<f64>) -> Self {
        Self {
            keys: [pose],
            noise,
            goal,
            com_t_goal,
        }
    }

    /// The world pose being pursued.
    #[must_use]
    pub fn goal(&self) -> &Isometry3<f64> {
        &self.goal
    }

    fn evaluate(&self, values: &Values) -> sim_factor_graph::Result<DVector<f64>> {
        let w_t_goal = values.pose(self.keys[0])? * self.com_t_goal;
        Ok(residual(&pose_local(&self.goal, &w_t_goal)))
    }
}

impl Factor for PoseGoalFactor {
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
        "pose_goal"
    }

    fn unwhitened_error(
        &self,
        values: &Values,
        jacobians: Option<&mut Jacobians>,
    ) -> sim_factor_graph::Result<DVector<f64>> {
        if let Some(h) = jacobians {
            *h = numerical_jacobians(|v| self.evaluate(v), &self.keys, values)?;
        }
        self.evaluate(values)
    }
}
