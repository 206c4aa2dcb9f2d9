use crate::matches::{roles, MatchRecord};
use crate::rules::{Rewrite, RuleContext, RuleError};

/// Append a parameter after the last parameter of an overriding declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailingArgument {
    pub container: String,
    pub parameter_name: String,
}

impl TrailingArgument {
    pub fn handle(&self, record: &MatchRecord, cx: &RuleContext<'_>) -> Result<Vec<Rewrite>, RuleError> {
        let declaration = cx.node(record, roles::DECLARATION)?;
        let (file, _) = cx.resolver.spelling(&declaration.begin)?;
        let path = cx.resolver.file(file).path();
        if !cx.is_under_source_root(path) {
            tracing::debug!(file = %path.display(), "declaration outside source root");
            return Ok(Vec::new());
        }

        let (span, param) = cx.text(record, roles::PARAMETER)?;
        let mut replacement = format!("{param}, const {} &{}", self.container, self.parameter_name);
        if !record.facts.is_definition || record.facts.has_inline_body {
            replacement.push_str(&format!(" = {}()", self.container));
        }
        Ok(vec![Rewrite::new(span, replacement)])
    }
}
