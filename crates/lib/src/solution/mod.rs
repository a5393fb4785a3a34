//! Solutions: which projects and targets end up in the generated files.

mod assembler;
mod types;

pub use assembler::Assembler;
pub use types::{AssembleError, Assembly, ProjectSummary, SolutionDecl, SolutionFile};
