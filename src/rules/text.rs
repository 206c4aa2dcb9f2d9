use crate::rules::RuleError;

/// Replace the first exact, case-sensitive occurrence of `needle`.
pub(crate) fn replace_first(haystack: &str, needle: &str, with: &str) -> Result<String, RuleError> {
    let missing = || RuleError::MissingSubstring {
        needle: needle.to_string(),
        haystack: haystack.to_string(),
    };
    if needle.is_empty() {
        return Err(missing());
    }
    let at = haystack.find(needle).ok_or_else(missing)?;
    let mut out = String::with_capacity(haystack.len() + with.len());
    out.push_str(&haystack[..at]);
    out.push_str(with);
    out.push_str(&haystack[at + needle.len()..]);
    Ok(out)
}
