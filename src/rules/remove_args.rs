use crate::matches::{roles, MatchRecord};
use crate::rules::{Rewrite, RuleContext, RuleError};

/// Drop an argument together with the separator before it.
///
/// Deletes from the end of the preceding argument's last token through the
/// end of the removed argument's last token, so `f(a, 0)` becomes `f(a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveArguments;

impl RemoveArguments {
    pub fn handle(&self, record: &MatchRecord, cx: &RuleContext<'_>) -> Result<Vec<Rewrite>, RuleError> {
        cx.span(record, roles::CALL)?;
        let preceding = cx.node(record, roles::PRECEDING_ARGUMENT)?;
        let removed = cx.node(record, roles::ARGUMENT_TO_REMOVE)?;

        let (start_file, start) = cx.resolver.end_of_token(&preceding.end)?;
        let (end_file, end) = cx.resolver.end_of_token(&removed.end)?;
        let span = cx.resolver.checked_span(start_file, start, end_file, end)?;
        Ok(vec![Rewrite::new(span, "")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::{NodeRef, RuleFamily};
    use crate::rules::test_support::node_for;
    use crate::source::{Location, SourceMap, SpanResolver};

    fn token_at(at: usize) -> NodeRef {
        NodeRef::new(Location::file("a.cpp", at), Location::file("a.cpp", at))
    }

    fn run(src: &str, call: &str, preceding: &str, removed: &str) -> String {
        let mut map = SourceMap::new();
        let id = map.add_file("a.cpp", src);
        let cx = RuleContext::new(SpanResolver::new(&map));
        let record = MatchRecord::new(RuleFamily::RemoveArguments)
            .with_node(roles::CALL, node_for("a.cpp", src, call, ")"))
            .with_node(
                roles::PRECEDING_ARGUMENT,
                token_at(src.find(preceding).unwrap()),
            )
            .with_node(
                roles::ARGUMENT_TO_REMOVE,
                token_at(src.rfind(removed).unwrap()),
            );
        let rewrites = RemoveArguments.handle(&record, &cx).unwrap();
        let span = rewrites[0].span;
        assert_eq!(span.file, id);
        format!("{}{}", &src[..span.start], &src[span.end..])
    }

    #[test]
    fn drops_argument_and_separator() {
        assert_eq!(
            run("img.setValue(key, 0);\n", "setValue(key, 0)", "key", "0"),
            "img.setValue(key);\n"
        );
    }

    #[test]
    fn keeps_multi_token_preceding_argument_intact() {
        assert_eq!(
            run(
                "s = img.text(\"Title\" /* k */ ,  0 );\n",
                "text(\"Title\" /* k */ ,  0 )",
                "\"Title\"",
                "0"
            ),
            "s = img.text(\"Title\" );\n"
        );
    }
}
