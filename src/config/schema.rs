use crate::config::presets::Preset;
use crate::config::version::{parse_version, GuardMacros};
use crate::matches::RuleFamily;
use crate::rules::DualVersionGuard;
use serde::Deserialize;
use std::fmt;

/// Parameters of the one active rule family.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "family", rename_all = "kebab-case")]
pub enum RuleConfig {
    RenameMethod {
        /// Class the renamed method belongs to; empty matches any class
        #[serde(default)]
        class: String,
        old_name: String,
        new_name: String,
    },
    RenameEnum {
        scope: String,
        old_name: String,
        new_name: String,
    },
    Accessor {
        accessor: String,
        /// Wrap the expression in a constructor call of this type first
        #[serde(default)]
        wrap_type: Option<String>,
    },
    Escape {
        type_name: String,
        method: String,
    },
    TrailingArgument {
        container: String,
        #[serde(default = "default_parameter_name")]
        parameter_name: String,
    },
    RemoveArguments,
}

fn default_parameter_name() -> String {
    "roles".to_string()
}

impl RuleConfig {
    pub fn family(&self) -> RuleFamily {
        match self {
            RuleConfig::RenameMethod { .. } => RuleFamily::RenameMethod,
            RuleConfig::RenameEnum { .. } => RuleFamily::RenameEnum,
            RuleConfig::Accessor { .. } => RuleFamily::Accessor,
            RuleConfig::Escape { .. } => RuleFamily::Escape,
            RuleConfig::TrailingArgument { .. } => RuleFamily::TrailingArgument,
            RuleConfig::RemoveArguments => RuleFamily::RemoveArguments,
        }
    }

    fn collect_issues(&self, issues: &mut Vec<ValidationIssue>) {
        let family = self.family();
        let mut require = |value: &str, field: &'static str| {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::MissingField { family, field });
            }
        };
        match self {
            RuleConfig::RenameMethod {
                old_name, new_name, ..
            }
            | RuleConfig::RenameEnum {
                old_name, new_name, ..
            } => {
                require(old_name, "old_name");
                require(new_name, "new_name");
                if let RuleConfig::RenameEnum { scope, .. } = self {
                    require(scope, "scope");
                }
                if !old_name.is_empty() && old_name == new_name {
                    issues.push(ValidationIssue::InvalidCombo {
                        family,
                        message: format!("old_name and new_name are both '{old_name}'"),
                    });
                }
            }
            RuleConfig::Accessor {
                accessor,
                wrap_type,
            } => {
                require(accessor, "accessor");
                if let Some(wrap) = wrap_type {
                    require(wrap, "wrap_type");
                }
            }
            RuleConfig::Escape { type_name, method } => {
                require(type_name, "type_name");
                require(method, "method");
            }
            RuleConfig::TrailingArgument { container, .. } => {
                require(container, "container");
            }
            RuleConfig::RemoveArguments => {}
        }
    }
}

/// Dual-version guard settings.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_guard_version")]
    pub version: String,
    #[serde(default = "default_version_macro")]
    pub version_macro: String,
    #[serde(default = "default_check_macro")]
    pub check_macro: String,
}

fn default_guard_version() -> String {
    "5.0.0".to_string()
}

fn default_version_macro() -> String {
    GuardMacros::default().version_macro
}

fn default_check_macro() -> String {
    GuardMacros::default().check_macro
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            version: default_guard_version(),
            version_macro: default_version_macro(),
            check_macro: default_check_macro(),
        }
    }
}

impl GuardConfig {
    fn collect_issues(&self, issues: &mut Vec<ValidationIssue>) {
        if let Err(err) = parse_version(&self.version) {
            issues.push(ValidationIssue::InvalidGuardVersion {
                message: err.to_string(),
            });
        }
        for (value, field) in [
            (&self.version_macro, "guard.version_macro"),
            (&self.check_macro, "guard.check_macro"),
        ] {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::MissingGuardField { field });
            }
        }
    }

    /// The guard to apply, if enabled. Call after validation.
    pub fn build(&self) -> Result<Option<DualVersionGuard>, ValidationError> {
        if !self.enabled {
            return Ok(None);
        }
        let version = parse_version(&self.version).map_err(|err| {
            ValidationError::single(ValidationIssue::InvalidGuardVersion {
                message: err.to_string(),
            })
        })?;
        let macros = GuardMacros {
            version_macro: self.version_macro.trim().to_string(),
            check_macro: self.check_macro.trim().to_string(),
        };
        Ok(Some(DualVersionGuard::for_version(&version, &macros)))
    }
}

/// A rule file: one preset or one explicit rule, plus guard settings.
///
/// ```toml
/// preset = "atomics"
///
/// [guard]
/// enabled = true
/// version = "5.0.0"
/// ```
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuleFile {
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub rule: Option<RuleConfig>,
    #[serde(default)]
    pub guard: GuardConfig,
}

impl RuleFile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        match (&self.preset, &self.rule) {
            (None, None) => issues.push(ValidationIssue::NoRuleSelected),
            (Some(_), Some(rule)) => issues.push(ValidationIssue::MultipleRules {
                families: vec!["preset".to_string(), rule.family().to_string()],
            }),
            (Some(name), None) => {
                if name.parse::<Preset>().is_err() {
                    issues.push(ValidationIssue::UnknownPreset {
                        name: name.clone(),
                        suggestion: Preset::suggest(name).map(|p| p.name()),
                    });
                }
            }
            (None, Some(rule)) => rule.collect_issues(&mut issues),
        }
        self.guard.collect_issues(&mut issues);

        ValidationError::from_issues(issues)
    }

    /// The selected rule. Call after validation.
    pub fn selected_rule(&self) -> Result<RuleConfig, ValidationError> {
        let mut candidates = Vec::new();
        if let Some(name) = &self.preset {
            let preset = name.parse::<Preset>().map_err(|_| {
                ValidationError::single(ValidationIssue::UnknownPreset {
                    name: name.clone(),
                    suggestion: Preset::suggest(name).map(|p| p.name()),
                })
            })?;
            candidates.push(preset.rule());
        }
        candidates.extend(self.rule.clone());
        select_rule(candidates)
    }

    pub fn into_run_config(self) -> Result<RunConfig, ValidationError> {
        let rule = self.selected_rule()?;
        let guard = self.guard.build()?;
        Ok(RunConfig { rule, guard })
    }
}

/// Pick the single active rule out of everything the user selected.
pub fn select_rule(candidates: Vec<RuleConfig>) -> Result<RuleConfig, ValidationError> {
    let mut candidates = candidates;
    match candidates.len() {
        0 => Err(ValidationError::single(ValidationIssue::NoRuleSelected)),
        1 => {
            let rule = candidates.remove(0);
            let mut issues = Vec::new();
            rule.collect_issues(&mut issues);
            ValidationError::from_issues(issues)?;
            Ok(rule)
        }
        _ => Err(ValidationError::single(ValidationIssue::MultipleRules {
            families: candidates.iter().map(|r| r.family().to_string()).collect(),
        })),
    }
}

/// Everything a run needs to know about what to rewrite.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub rule: RuleConfig,
    pub guard: Option<DualVersionGuard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn single(issue: ValidationIssue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    fn from_issues(issues: Vec<ValidationIssue>) -> Result<(), Self> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Self { issues })
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    NoRuleSelected,
    MultipleRules {
        families: Vec<String>,
    },
    UnknownPreset {
        name: String,
        suggestion: Option<&'static str>,
    },
    MissingField {
        family: RuleFamily,
        field: &'static str,
    },
    MissingGuardField {
        field: &'static str,
    },
    InvalidCombo {
        family: RuleFamily,
        message: String,
    },
    InvalidGuardVersion {
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NoRuleSelected => write!(f, "no rule selected"),
            ValidationIssue::MultipleRules { families } => write!(
                f,
                "only one rule can run at a time, got: {}",
                families.join(", ")
            ),
            ValidationIssue::UnknownPreset { name, suggestion } => match suggestion {
                Some(s) => write!(f, "unknown preset '{name}' (did you mean '{s}'?)"),
                None => write!(f, "unknown preset '{name}'"),
            },
            ValidationIssue::MissingField { family, field } => {
                write!(f, "rule '{family}' missing required field '{field}'")
            }
            ValidationIssue::MissingGuardField { field } => {
                write!(f, "guard missing required field '{field}'")
            }
            ValidationIssue::InvalidCombo { family, message } => {
                write!(f, "rule '{family}' has invalid configuration: {message}")
            }
            ValidationIssue::InvalidGuardVersion { message } => {
                write!(f, "invalid guard version: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename(old: &str, new: &str) -> RuleConfig {
        RuleConfig::RenameMethod {
            class: String::new(),
            old_name: old.into(),
            new_name: new.into(),
        }
    }

    #[test]
    fn select_requires_exactly_one_rule() {
        assert_eq!(
            select_rule(vec![]).unwrap_err().issues,
            vec![ValidationIssue::NoRuleSelected]
        );
        let err = select_rule(vec![rename("a", "b"), RuleConfig::RemoveArguments]).unwrap_err();
        assert!(matches!(
            &err.issues[0],
            ValidationIssue::MultipleRules { families } if families.len() == 2
        ));
        assert_eq!(select_rule(vec![rename("a", "b")]).unwrap(), rename("a", "b"));
    }

    #[test]
    fn rename_to_same_name_is_invalid() {
        let err = select_rule(vec![rename("same", "same")]).unwrap_err();
        assert!(matches!(err.issues[0], ValidationIssue::InvalidCombo { .. }));
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let err = select_rule(vec![RuleConfig::RenameEnum {
            scope: " ".into(),
            old_name: String::new(),
            new_name: "New".into(),
        }])
        .unwrap_err();
        assert_eq!(err.issues.len(), 2);
        let text = err.to_string();
        assert!(text.contains("'old_name'"));
        assert!(text.contains("'scope'"));
    }

    #[test]
    fn guard_is_built_only_when_enabled() {
        assert_eq!(GuardConfig::default().build().unwrap(), None);
        let guard = GuardConfig {
            enabled: true,
            version: "5.2".into(),
            ..GuardConfig::default()
        }
        .build()
        .unwrap()
        .unwrap();
        assert_eq!(guard.condition(), "QT_VERSION < QT_VERSION_CHECK(5, 2, 0)");
    }
}
