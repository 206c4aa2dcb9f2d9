use crate::source::Location;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Role names bound by the matcher.
pub mod roles {
    pub const CALL: &str = "call";
    pub const EXACT: &str = "exact";
    pub const FUNC: &str = "func";
    pub const EXPR: &str = "expr";
    pub const CTOR: &str = "ctor";
    pub const OPERATOR: &str = "operator";
    pub const DECLARATION: &str = "declaration";
    pub const PARAMETER: &str = "parameter";
    pub const PRECEDING_ARGUMENT: &str = "precedingArgument";
    pub const ARGUMENT_TO_REMOVE: &str = "argumentToRemove";
}

/// The six supported transformation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleFamily {
    RenameMethod,
    RenameEnum,
    Accessor,
    Escape,
    TrailingArgument,
    RemoveArguments,
}

impl RuleFamily {
    pub const ALL: [RuleFamily; 6] = [
        RuleFamily::RenameMethod,
        RuleFamily::RenameEnum,
        RuleFamily::Accessor,
        RuleFamily::Escape,
        RuleFamily::TrailingArgument,
        RuleFamily::RemoveArguments,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuleFamily::RenameMethod => "rename-method",
            RuleFamily::RenameEnum => "rename-enum",
            RuleFamily::Accessor => "accessor",
            RuleFamily::Escape => "escape",
            RuleFamily::TrailingArgument => "trailing-argument",
            RuleFamily::RemoveArguments => "remove-arguments",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RuleFamily::RenameMethod => "rename a method at its call sites",
            RuleFamily::RenameEnum => "replace an enumerator with its renamed, qualified form",
            RuleFamily::Accessor => "append an explicit accessor call to an expression",
            RuleFamily::Escape => "turn a free escaping function into a method call",
            RuleFamily::TrailingArgument => "append a parameter to overriding declarations",
            RuleFamily::RemoveArguments => "drop a removable trailing argument from calls",
        }
    }

    /// Roles a record of this family must bind.
    pub fn required_roles(self) -> &'static [&'static str] {
        match self {
            RuleFamily::RenameMethod
            | RuleFamily::RenameEnum
            | RuleFamily::Accessor
            | RuleFamily::Escape => &[roles::CALL],
            RuleFamily::TrailingArgument => &[roles::DECLARATION, roles::PARAMETER],
            RuleFamily::RemoveArguments => &[
                roles::CALL,
                roles::PRECEDING_ARGUMENT,
                roles::ARGUMENT_TO_REMOVE,
            ],
        }
    }

    /// Role whose node a dual-version guard wraps.
    pub fn guard_role(self) -> &'static str {
        match self {
            RuleFamily::TrailingArgument => roles::DECLARATION,
            _ => roles::CALL,
        }
    }
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RuleFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleFamily::ALL
            .into_iter()
            .find(|family| family.name() == s)
            .ok_or_else(|| format!("unknown rule family '{s}'"))
    }
}

/// A matched node: `begin` is its first token, `end` the start of its last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub begin: Location,
    pub end: Location,
}

impl NodeRef {
    pub fn new(begin: Location, end: Location) -> Self {
        Self { begin, end }
    }
}

/// Semantic evidence the matcher attaches to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFacts {
    /// Qualified names of the methods the called method overrides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overridden: Vec<String>,
    /// The matched declaration is a definition.
    #[serde(default)]
    pub is_definition: bool,
    /// The matched declaration has its body inline in the class.
    #[serde(default)]
    pub has_inline_body: bool,
}

/// One occurrence of a pattern of interest, with named sub-spans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub rule: RuleFamily,
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeRef>,
    #[serde(default)]
    pub facts: MatchFacts,
}

impl MatchRecord {
    pub fn new(rule: RuleFamily) -> Self {
        Self {
            rule,
            nodes: BTreeMap::new(),
            facts: MatchFacts::default(),
        }
    }

    pub fn with_node(mut self, role: &str, node: NodeRef) -> Self {
        self.nodes.insert(role.to_string(), node);
        self
    }

    pub fn with_facts(mut self, facts: MatchFacts) -> Self {
        self.facts = facts;
        self
    }

    pub fn node(&self, role: &str) -> Option<&NodeRef> {
        self.nodes.get(role)
    }

    /// The file this record belongs to, for grouping work per file.
    ///
    /// Prefers the family's guard role, then any node.
    pub fn usage_file(&self) -> Option<&Path> {
        self.node(self.rule.guard_role())
            .and_then(|node| node.begin.usage_file())
            .or_else(|| {
                self.nodes
                    .values()
                    .find_map(|node| node.begin.usage_file())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_record() {
        let json = r#"{
            "rule": "rename-method",
            "nodes": {
                "call": {
                    "begin": {"kind": "file", "file": "a.cpp", "offset": 4},
                    "end": {"kind": "file", "file": "a.cpp", "offset": 20}
                },
                "exact": {
                    "begin": {"kind": "file", "file": "a.cpp", "offset": 4},
                    "end": {"kind": "file", "file": "a.cpp", "offset": 6}
                }
            },
            "facts": {"overridden": ["QObject::event"]}
        }"#;
        let record: MatchRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.rule, RuleFamily::RenameMethod);
        assert!(record.node(roles::CALL).is_some());
        assert!(record.node(roles::EXACT).is_some());
        assert_eq!(record.facts.overridden, vec!["QObject::event".to_string()]);
        assert_eq!(record.usage_file(), Some(Path::new("a.cpp")));
    }

    #[test]
    fn facts_use_camel_case() {
        let facts: MatchFacts =
            serde_json::from_str(r#"{"isDefinition": true, "hasInlineBody": false}"#).unwrap();
        assert!(facts.is_definition);
        assert!(!facts.has_inline_body);
    }

    #[test]
    fn family_names_round_trip_through_from_str() {
        for family in RuleFamily::ALL {
            assert_eq!(family.name().parse::<RuleFamily>().unwrap(), family);
        }
        assert!("rename".parse::<RuleFamily>().is_err());
    }

    #[test]
    fn declaration_rules_are_grouped_by_declaration() {
        let record = MatchRecord::new(RuleFamily::TrailingArgument)
            .with_node(
                roles::PARAMETER,
                NodeRef::new(Location::file("p.h", 0), Location::file("p.h", 1)),
            )
            .with_node(
                roles::DECLARATION,
                NodeRef::new(Location::file("d.h", 0), Location::file("d.h", 1)),
            );
        assert_eq!(record.usage_file(), Some(Path::new("d.h")));
    }
}
