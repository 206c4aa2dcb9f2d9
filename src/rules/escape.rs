use crate::matches::{roles, MatchRecord};
use crate::rules::{Rewrite, RuleContext, RuleError};

/// Turn a free escaping function into a method call on its argument.
///
/// Arguments that are constructor calls or operator expressions are wrapped
/// in an explicit `Type(...)` so the method binds to the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escape {
    pub type_name: String,
    pub method: String,
}

impl Escape {
    pub fn handle(&self, record: &MatchRecord, cx: &RuleContext<'_>) -> Result<Vec<Rewrite>, RuleError> {
        let role = [roles::CTOR, roles::EXPR, roles::OPERATOR]
            .into_iter()
            .find(|role| record.node(role).is_some())
            .ok_or_else(|| RuleError::MissingRole {
                role: format!("{}|{}|{}", roles::CTOR, roles::OPERATOR, roles::EXPR),
            })?;
        let (_, arg) = cx.text(record, role)?;
        let (call, _) = cx.text(record, roles::CALL)?;

        let wrap = record.node(roles::CTOR).is_some() || record.node(roles::OPERATOR).is_some();
        let replacement = if wrap {
            format!("{}({}).{}()", self.type_name, arg, self.method)
        } else {
            format!("{}.{}()", arg, self.method)
        };
        Ok(vec![Rewrite::new(call, replacement)])
    }
}
