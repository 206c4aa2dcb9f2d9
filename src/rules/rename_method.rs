use crate::matches::{roles, MatchRecord};
use crate::rules::text::replace_first;
use crate::rules::{Rewrite, RuleContext, RuleError};

/// Rename a method at its call sites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameMethod {
    pub class: String,
    pub old_name: String,
    pub new_name: String,
}

impl RenameMethod {
    pub fn handle(&self, record: &MatchRecord, cx: &RuleContext<'_>) -> Result<Vec<Rewrite>, RuleError> {
        if !self.has_evidence(record)? {
            tracing::debug!(
                class = %self.class,
                "call does not override a method of the renamed class"
            );
            return Ok(Vec::new());
        }

        let (span, text) = cx.text(record, roles::CALL)?;
        let replacement = replace_first(text, &self.old_name, &self.new_name)?;
        Ok(vec![Rewrite::new(span, replacement)])
    }

    /// A direct match (`exact` or `func`) always qualifies. A call matched
    /// only by name (`expr`) qualifies when it overrides a method of the
    /// configured class.
    fn has_evidence(&self, record: &MatchRecord) -> Result<bool, RuleError> {
        if record.node(roles::EXACT).is_some() || record.node(roles::FUNC).is_some() {
            return Ok(true);
        }
        if record.node(roles::EXPR).is_none() {
            return Err(RuleError::MissingRole {
                role: format!("{}|{}|{}", roles::EXACT, roles::FUNC, roles::EXPR),
            });
        }
        Ok(record
            .facts
            .overridden
            .iter()
            .any(|name| format!("::{name}").contains(self.class.as_str())))
    }
}
