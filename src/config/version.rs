//! Guard conditions built from a target framework version.
//!
//! The generated condition selects the old branch when the framework being
//! compiled against is older than the target version, e.g.
//! `QT_VERSION < QT_VERSION_CHECK(5, 0, 0)`.

use semver::Version;
use std::fmt;

/// Errors parsing a guard version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Invalid version string (e.g., "five")
    InvalidVersion { value: String, source: String },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::InvalidVersion { value, source } => {
                write!(f, "invalid version '{}': {}", value, source)
            }
        }
    }
}

impl std::error::Error for VersionError {}

/// Macro names used in the guard condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardMacros {
    /// Macro holding the compiled-against version
    pub version_macro: String,
    /// Function-like macro packing (major, minor, patch)
    pub check_macro: String,
}

impl Default for GuardMacros {
    fn default() -> Self {
        Self {
            version_macro: "QT_VERSION".to_string(),
            check_macro: "QT_VERSION_CHECK".to_string(),
        }
    }
}

/// Parse a target version, accepting the short `5` and `5.1` forms.
///
/// # Examples
///
/// ```
/// use qt_porter::config::version::parse_version;
///
/// assert_eq!(parse_version("5").unwrap().to_string(), "5.0.0");
/// assert_eq!(parse_version("5.15").unwrap().to_string(), "5.15.0");
/// assert!(parse_version("five").is_err());
/// ```
pub fn parse_version(value: &str) -> Result<Version, VersionError> {
    let trimmed = value.trim();
    let padded = match trimmed.matches('.').count() {
        0 => format!("{trimmed}.0.0"),
        1 => format!("{trimmed}.0"),
        _ => trimmed.to_string(),
    };
    Version::parse(&padded).map_err(|e| VersionError::InvalidVersion {
        value: value.to_string(),
        source: e.to_string(),
    })
}

/// Preprocessor condition that is true for versions older than `version`.
pub fn guard_condition(version: &Version, macros: &GuardMacros) -> String {
    format!(
        "{} < {}({}, {}, {})",
        macros.version_macro, macros.check_macro, version.major, version.minor, version.patch
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_condition_targets_qt5() {
        let version = parse_version("5.0.0").unwrap();
        assert_eq!(
            guard_condition(&version, &GuardMacros::default()),
            "QT_VERSION < QT_VERSION_CHECK(5, 0, 0)"
        );
    }

    #[test]
    fn custom_macros_and_version() {
        let macros = GuardMacros {
            version_macro: "KF_VERSION".into(),
            check_macro: "KF_VERSION_CHECK".into(),
        };
        let version = parse_version("5.15.2").unwrap();
        assert_eq!(
            guard_condition(&version, &macros),
            "KF_VERSION < KF_VERSION_CHECK(5, 15, 2)"
        );
    }

    #[test]
    fn invalid_versions_are_rejected() {
        assert!(matches!(
            parse_version("5.x"),
            Err(VersionError::InvalidVersion { .. })
        ));
        assert!(parse_version("").is_err());
    }
}
