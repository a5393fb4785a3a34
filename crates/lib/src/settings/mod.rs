//! Tagged settings and their propagation along project dependencies.

mod merge;
mod types;

pub use merge::{ExportedSetting, SettingConflict, SettingOrigin, exports, merge};
pub use types::{KeySemantics, MergedSettings, SettingBlock, SettingEntry, SettingSchema, Visibility};
