//! slngen-lib: build-configuration resolution for multi-target solutions
//!
//! The crate turns a declaration of projects, target axes and tagged settings
//! into fully resolved per-target configurations, then emits solution and
//! project files:
//! - `axis`: target axes, enumeration, patterns and selectors
//! - `project`: project descriptors and the id-indexed store
//! - `context`: the validated, immutable generation context
//! - `resolve`: per-target dependency ordering and setting propagation
//! - `solution`: closure, target selection and parallel assembly
//! - `emit`: backends and idempotent atomic file writing
//! - `loader` / `generate`: the JSON declaration format and the full pipeline

pub mod axis;
pub mod consts;
pub mod context;
pub mod emit;
pub mod generate;
pub mod loader;
pub mod project;
pub mod resolve;
pub mod settings;
pub mod solution;
pub mod template;
pub mod util;
