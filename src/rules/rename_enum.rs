use crate::matches::{roles, MatchRecord};
use crate::rules::{Rewrite, RuleContext, RuleError};

/// Replace a reference to `scope::old_name` with the renamed enumerator.
///
/// References that do not end in `old_name` (already renamed, or matched
/// through an unrelated alias) are refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEnum {
    pub scope: String,
    pub old_name: String,
    pub new_name: String,
}

impl RenameEnum {
    /// The new enumerator, qualified with the scope unless it already is.
    pub fn qualified_new_name(&self) -> String {
        if self.scope.is_empty() || self.new_name.contains("::") {
            self.new_name.clone()
        } else {
            format!("{}::{}", self.scope, self.new_name)
        }
    }

    pub fn handle(&self, record: &MatchRecord, cx: &RuleContext<'_>) -> Result<Vec<Rewrite>, RuleError> {
        let (span, text) = cx.text(record, roles::CALL)?;
        if !text.trim_end().ends_with(self.old_name.as_str()) {
            return Err(RuleError::MissingSubstring {
                needle: self.old_name.clone(),
                haystack: text.to_string(),
            });
        }
        Ok(vec![Rewrite::new(span, self.qualified_new_name())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::RuleFamily;
    use crate::rules::test_support::node_for;
    use crate::source::{SourceMap, SpanResolver};

    #[test]
    fn unqualified_reference_gets_qualified_name() {
        let src = "setSelectionMode(ExtendedSelection);\n";
        let mut map = SourceMap::new();
        map.add_file("v.cpp", src);
        let cx = RuleContext::new(SpanResolver::new(&map));
        let rule = RenameEnum {
            scope: "QAbstractItemView".into(),
            old_name: "ExtendedSelection".into(),
            new_name: "MultiSelection".into(),
        };
        let record = MatchRecord::new(RuleFamily::RenameEnum).with_node(
            roles::CALL,
            node_for("v.cpp", src, "ExtendedSelection", "ExtendedSelection"),
        );
        let out = rule.handle(&record, &cx).unwrap();
        assert_eq!(cx.resolver.text(&out[0].span), "ExtendedSelection");
        assert_eq!(out[0].replacement, "QAbstractItemView::MultiSelection");
    }

    #[test]
    fn reference_without_old_name_is_refused() {
        let src = "setSelectionMode(QAbstractItemView::MultiSelection);\n";
        let mut map = SourceMap::new();
        map.add_file("v.cpp", src);
        let cx = RuleContext::new(SpanResolver::new(&map));
        let rule = RenameEnum {
            scope: "QAbstractItemView".into(),
            old_name: "ExtendedSelection".into(),
            new_name: "MultiSelection".into(),
        };
        let record = MatchRecord::new(RuleFamily::RenameEnum).with_node(
            roles::CALL,
            node_for("v.cpp", src, "QAbstractItemView::MultiSelection", "MultiSelection"),
        );
        assert!(matches!(
            rule.handle(&record, &cx),
            Err(RuleError::MissingSubstring { needle, .. }) if needle == "ExtendedSelection"
        ));
    }

    #[test]
    fn qualified_new_name_is_kept() {
        let rule = RenameEnum {
            scope: "Qt".into(),
            old_name: "Old".into(),
            new_name: "QStyle::New".into(),
        };
        assert_eq!(rule.qualified_new_name(), "QStyle::New");
    }
}
