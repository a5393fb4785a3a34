//! Target axes and the target space they span.
//!
//! The registry declares the orthogonal dimensions of the build and
//! enumerates their cross product lazily. Rules and selectors carve subsets
//! out of that space per project and per solution.

mod registry;
mod types;

pub use registry::{AxisRegistry, TargetIter, is_excluded};
pub use types::{Axis, AxisError, RuleAction, Target, TargetPattern, TargetRule, TargetSelector};
