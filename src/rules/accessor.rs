use crate::matches::{roles, MatchRecord};
use crate::rules::{Rewrite, RuleContext, RuleError};

/// Make an implicit conversion explicit: `expr` -> `expr.accessor()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    pub accessor: String,
    pub wrap_type: Option<String>,
}

impl Accessor {
    pub fn handle(&self, record: &MatchRecord, cx: &RuleContext<'_>) -> Result<Vec<Rewrite>, RuleError> {
        let (span, text) = cx.text(record, roles::CALL)?;
        let replacement = match &self.wrap_type {
            Some(ty) => format!("{ty}({text}).{}()", self.accessor),
            None => format!("{text}.{}()", self.accessor),
        };
        Ok(vec![Rewrite::new(span, replacement)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matches::RuleFamily;
    use crate::rules::test_support::node_for;
    use crate::source::{SourceMap, SpanResolver};

    #[test]
    fn wraps_in_type_when_configured() {
        let src = "int v = counter;\n";
        let mut map = SourceMap::new();
        map.add_file("a.cpp", src);
        let cx = RuleContext::new(SpanResolver::new(&map));
        let rule = Accessor {
            accessor: "load".into(),
            wrap_type: Some("QAtomicInt".into()),
        };
        let record = MatchRecord::new(RuleFamily::Accessor)
            .with_node(roles::CALL, node_for("a.cpp", src, "counter", "counter"));
        let out = rule.handle(&record, &cx).unwrap();
        assert_eq!(out[0].replacement, "QAtomicInt(counter).load()");
    }
}
