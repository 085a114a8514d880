//! Generic factors.

mod between;
mod custom;
mod prior;
mod reweighted;

pub use between::{between, BetweenFactor};
pub use custom::{CustomFactor, ErrorFunction};
pub use prior::PriorFactor;
pub use reweighted::ReweightedFactor;
