//! Integration tests for rule files
//!
//! Tests loading, validation and turning a rule file into a run that
//! rewrites sources.

use qt_porter::config::{
    load_from_path, load_from_str, ConfigError, Preset, RuleConfig, ValidationIssue,
};
use qt_porter::matches::{roles, MatchRecord, NodeRef, RuleFamily};
use qt_porter::source::Location;
use qt_porter::{ApplyMode, Diagnostics, EditApplier, Session};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_rules(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("rules.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_every_preset_loads() {
    for preset in Preset::ALL {
        let file = load_from_str(&format!("preset = \"{}\"\n", preset.name())).unwrap();
        let config = file.into_run_config().unwrap();
        assert_eq!(config.rule, preset.rule());
        assert!(config.guard.is_none());
    }
}

#[test]
fn test_guard_section() {
    let file = load_from_str(
        r#"
preset = "qimage-text"

[guard]
enabled = true
version = "5.2"
version_macro = "MY_QT_VERSION"
check_macro = "MY_QT_VERSION_CHECK"
"#,
    )
    .unwrap();
    let guard = file.into_run_config().unwrap().guard.unwrap();
    assert_eq!(guard.condition(), "MY_QT_VERSION < MY_QT_VERSION_CHECK(5, 2, 0)");
}

#[test]
fn test_validation_collects_every_issue() {
    let err = load_from_str(
        r#"
[rule]
family = "escape"
type_name = ""
method = " "

[guard]
version = "five"
"#,
    )
    .unwrap_err();

    let source = match err {
        ConfigError::Validation { source, .. } => source,
        other => panic!("expected validation error, got {other}"),
    };
    assert_eq!(source.issues.len(), 3);
    assert!(source.issues.iter().any(|issue| matches!(
        issue,
        ValidationIssue::MissingField {
            family: RuleFamily::Escape,
            field: "type_name"
        }
    )));
    assert!(source
        .issues
        .iter()
        .any(|issue| matches!(issue, ValidationIssue::InvalidGuardVersion { .. })));
}

#[test]
fn test_preset_and_rule_together_are_rejected() {
    let err = load_from_str(
        r#"
preset = "atomics"

[rule]
family = "remove-arguments"
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("only one rule"));
}

#[test]
fn test_unknown_family_is_a_toml_error() {
    let dir = TempDir::new().unwrap();
    let path = write_rules(&dir, "[rule]\nfamily = \"rename-everything\"\n");
    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Toml { path: Some(_), .. }));
    assert!(err.to_string().contains("rules.toml"));
}

#[test]
fn test_missing_file() {
    let err = load_from_path("/nonexistent/rules.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_trailing_argument_defaults() {
    let file = load_from_str("[rule]\nfamily = \"trailing-argument\"\ncontainer = \"QVector<int>\"\n")
        .unwrap();
    assert_eq!(
        file.rule,
        Some(RuleConfig::TrailingArgument {
            container: "QVector<int>".into(),
            parameter_name: "roles".into(),
        })
    );
}

fn node(file: &Path, text: &str, needle: &str, last: &str) -> NodeRef {
    let start = text.find(needle).unwrap();
    let end = start + needle.rfind(last).unwrap();
    NodeRef::new(Location::file(file, start), Location::file(file, end))
}

#[test]
fn test_rule_file_drives_a_run() {
    let dir = TempDir::new().unwrap();
    let header = dir.path().join("view.h");
    let text = "class View : public QAbstractItemView {\n    \
                void dataChanged(const QModelIndex &tl, const QModelIndex &br);\n};\n";
    fs::write(&header, text).unwrap();

    let rules = write_rules(
        &dir,
        r#"
[rule]
family = "trailing-argument"
container = "QVector<int>"
"#,
    );
    let config = load_from_path(&rules).unwrap().into_run_config().unwrap();

    let record = MatchRecord::new(RuleFamily::TrailingArgument)
        .with_node(
            roles::DECLARATION,
            node(&header, text, "void dataChanged(", "("),
        )
        .with_node(
            roles::PARAMETER,
            node(&header, text, "const QModelIndex &br", "br"),
        );
    let records = vec![record];

    let diagnostics = Diagnostics::new();
    let session = Session::new(&config, dir.path()).with_source_root(dir.path());
    let sources = session.load_sources(&records, &diagnostics);
    let edits = session.scan(&records, &sources, &diagnostics);
    assert!(diagnostics.is_empty());

    let results = EditApplier::new(ApplyMode::Write).apply_all(edits.into_file_sets());
    assert_eq!(results.len(), 1);
    assert!(results[0].as_ref().unwrap().written);
    assert_eq!(
        fs::read_to_string(&header).unwrap(),
        "class View : public QAbstractItemView {\n    \
         void dataChanged(const QModelIndex &tl, const QModelIndex &br, \
         const QVector<int> &roles = QVector<int>());\n};\n"
    );
}
