//! Constraint-manifold reduction.
//!
//! Hard equality constraints couple variables into connected components.
//! Each component is replaced by one manifold-valued variable whose tangent
//! space is the null space of the linearized constraints, and every soft
//! cost is rewritten over those variables.

mod component;
mod constraint_manifold;
mod optimizer;
mod params;
mod substitute;

pub use component::ConnectedComponent;
pub use constraint_manifold::ConstraintManifold;
pub use optimizer::{ManifoldOptimizer, ManifoldOptimizerParams, ManifoldProblem};
pub use params::{BasisType, ManifoldParams, RetractType};
pub use substitute::SubstituteFactor;
