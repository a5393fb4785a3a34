//! Project descriptors and the store that owns them.

mod store;
mod types;

pub use store::ProjectStore;
pub use types::{ConditionalSettings, OutputKind, ProjectDescriptor, ProjectError, ProjectRef};
