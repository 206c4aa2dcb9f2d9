//! Raw C++ token measurement.
//!
//! The matcher reports the end of a node as the *start* of its last token.
//! [`token_end`] measures that token so spans cover it completely, the same
//! way a raw (non-preprocessing) lexer would.

/// Punctuators longer than one byte, longest first.
const PUNCTUATORS: &[&str] = &[
    "%:%:", "<<=", ">>=", "->*", "...", "<=>", "::", "->", "++", "--", "<<", ">>", "<=", ">=",
    "==", "!=", "&&", "||", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", ".*", "##", "<:",
    ":>", "<%", "%>", "%:",
];

/// Encoding prefixes that may precede a string or character literal.
const LITERAL_PREFIXES: &[&str] = &["u8R", "uR", "UR", "LR", "R", "u8", "u", "U", "L"];

/// Byte offset one past the end of the token starting at `offset`.
///
/// Whitespace or an out-of-range offset yields `offset` itself (clamped to
/// the text length), i.e. an empty token.
pub fn token_end(text: &str, offset: usize) -> usize {
    let bytes = text.as_bytes();
    let Some(&first) = bytes.get(offset) else {
        return offset.min(text.len());
    };

    if first.is_ascii_whitespace() {
        return offset;
    }
    if is_ident_start(first) {
        let end = scan_while(bytes, offset, is_ident_continue);
        let word = &text[offset..end];
        if let Some(&quote) = bytes.get(end) {
            if (quote == b'"' || quote == b'\'') && LITERAL_PREFIXES.contains(&word) {
                return if word.ends_with('R') && quote == b'"' {
                    raw_string_end(text, end)
                } else {
                    quoted_end(bytes, end)
                };
            }
        }
        return end;
    }
    if first.is_ascii_digit()
        || (first == b'.' && bytes.get(offset + 1).is_some_and(u8::is_ascii_digit))
    {
        return number_end(bytes, offset);
    }
    if first == b'"' || first == b'\'' {
        return quoted_end(bytes, offset);
    }

    let rest = &text[offset..];
    if let Some(punct) = PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
        return offset + punct.len();
    }
    // Single punctuator or any other character, kept on a char boundary.
    offset + rest.chars().next().map_or(1, char::len_utf8)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn scan_while(bytes: &[u8], mut pos: usize, pred: impl Fn(u8) -> bool) -> usize {
    while bytes.get(pos).is_some_and(|&b| pred(b)) {
        pos += 1;
    }
    pos
}

/// pp-number: digits, identifier characters, dots, digit separators and
/// signed exponents.
fn number_end(bytes: &[u8], start: usize) -> usize {
    let mut pos = start + 1;
    while let Some(&b) = bytes.get(pos) {
        match b {
            b'+' | b'-' if matches!(bytes[pos - 1], b'e' | b'E' | b'p' | b'P') => pos += 1,
            b'\'' if bytes.get(pos + 1).is_some_and(|n| n.is_ascii_alphanumeric()) => pos += 1,
            b'.' => pos += 1,
            _ if is_ident_continue(b) => pos += 1,
            _ => break,
        }
    }
    pos
}

/// End of a quoted literal whose opening quote is at `quote_pos`, including
/// any user-defined-literal suffix. Unterminated literals stop at the end of
/// the line.
fn quoted_end(bytes: &[u8], quote_pos: usize) -> usize {
    let quote = bytes[quote_pos];
    let mut pos = quote_pos + 1;
    while let Some(&b) = bytes.get(pos) {
        match b {
            b'\\' => pos += 2,
            b'\n' => return pos,
            _ if b == quote => {
                return scan_while(bytes, pos + 1, is_ident_continue);
            }
            _ => pos += 1,
        }
    }
    bytes.len()
}

/// End of a raw string literal `R"delim( ... )delim"` whose quote is at
/// `quote_pos`.
fn raw_string_end(text: &str, quote_pos: usize) -> usize {
    let after_quote = quote_pos + 1;
    let Some(paren) = text[after_quote..].find('(') else {
        return text.len();
    };
    let delimiter = &text[after_quote..after_quote + paren];
    let terminator = format!("){delimiter}\"");
    let body_start = after_quote + paren + 1;
    match text[body_start..].find(&terminator) {
        Some(idx) => {
            let end = body_start + idx + terminator.len();
            scan_while(text.as_bytes(), end, is_ident_continue)
        }
        None => text.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_at(text: &str, offset: usize) -> &str {
        &text[offset..token_end(text, offset)]
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(token_at("foo_bar1(x)", 0), "foo_bar1");
        assert_eq!(token_at("a.signature()", 2), "signature");
    }

    #[test]
    fn multi_character_punctuators() {
        assert_eq!(token_at("a->b", 1), "->");
        assert_eq!(token_at("Qt::escape", 2), "::");
        assert_eq!(token_at("x <<= 2", 2), "<<=");
        assert_eq!(token_at("p->*m", 1), "->*");
        assert_eq!(token_at("f(a...)", 3), "...");
        assert_eq!(token_at("f(x)", 3), ")");
    }

    #[test]
    fn numbers() {
        assert_eq!(token_at("x = 0;", 4), "0");
        assert_eq!(token_at("1'000'000u;", 0), "1'000'000u");
        assert_eq!(token_at("1.5e-3f)", 0), "1.5e-3f");
        assert_eq!(token_at("0x1Fp+2 ", 0), "0x1Fp+2");
        assert_eq!(token_at(".25 ", 0), ".25");
    }

    #[test]
    fn string_and_char_literals() {
        assert_eq!(token_at(r#"f("a\"b", c)"#, 2), r#""a\"b""#);
        assert_eq!(token_at("'\\n'", 0), "'\\n'");
        assert_eq!(token_at(r#"u8"text")"#, 0), r#"u8"text""#);
        assert_eq!(token_at(r#"L'x' "#, 0), "L'x'");
        assert_eq!(token_at(r#""abc"_sv;"#, 0), r#""abc"_sv"#);
    }

    #[test]
    fn raw_strings() {
        let text = r#"R"xy(a)"b)xy" + 1"#;
        assert_eq!(token_at(text, 0), r#"R"xy(a)"b)xy""#);
    }

    #[test]
    fn unterminated_literal_stops_at_newline() {
        assert_eq!(token_at("\"abc\nnext", 0), "\"abc");
    }

    #[test]
    fn whitespace_and_bounds() {
        assert_eq!(token_end("a b", 1), 1);
        assert_eq!(token_end("ab", 2), 2);
        assert_eq!(token_end("ab", 10), 2);
    }

    #[test]
    fn non_ascii_is_kept_on_char_boundary() {
        let text = "x = «y»;";
        let start = text.find('«').unwrap();
        let end = token_end(text, start);
        assert!(text.is_char_boundary(end));
    }
}
