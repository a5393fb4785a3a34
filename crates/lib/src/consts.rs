//! Crate-wide constants.

/// Separator used when rendering a target tuple as a single label.
pub const TARGET_LABEL_SEPARATOR: &str = "|";

/// Default output path layout for resolved configurations.
pub const DEFAULT_OUTPUT_LAYOUT: &str = "output/[target.all]/[project.id]";

/// Default solution file name template.
pub const DEFAULT_SOLUTION_FILE_NAME: &str = "[solution.name]";

/// Setting keys that behave as sets unless the schema says otherwise.
pub const DEFAULT_SET_KEYS: &[&str] = &["defines"];

/// Setting keys that hold a single value unless the schema says otherwise.
pub const DEFAULT_SINGULAR_KEYS: &[&str] = &["output_name", "subsystem"];

/// Number of hex characters kept from a content hash in log output.
pub const HASH_DISPLAY_LEN: usize = 12;

/// Separator used by `[target.all]` in rendered paths and file names.
pub const TARGET_PATH_SEPARATOR: &str = "_";

/// Namespace mixed into project GUIDs.
pub const PROJECT_GUID_NAMESPACE: &str = "slngen.project";

/// Namespace mixed into solution GUIDs.
pub const SOLUTION_GUID_NAMESPACE: &str = "slngen.solution";

/// Axis whose value becomes the MSBuild platform, when present.
pub const MSBUILD_PLATFORM_AXIS: &str = "platform";

/// Visual Studio project type GUID for C++ projects.
pub const VCXPROJ_TYPE_GUID: &str = "8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942";

/// Supported declaration file format version.
pub const DECLARATION_VERSION: u32 = 1;
