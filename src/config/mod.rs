pub mod loader;
pub mod presets;
pub mod schema;
pub mod version;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use presets::Preset;
pub use schema::{
    select_rule, GuardConfig, RuleConfig, RuleFile, RunConfig, ValidationError, ValidationIssue,
};
pub use version::{guard_condition, parse_version, GuardMacros, VersionError};
