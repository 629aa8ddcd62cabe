//! Literal-aware scanning helpers shared by every pass.
//!
//! All structural characters in the source dialect are ASCII, so these helpers
//! work on bytes and only ever slice at ASCII positions.

pub(crate) fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

pub(crate) fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Index just past the string or char literal opening at `start`.
///
/// Backslash escapes the following byte. An unterminated literal runs to the end.
pub(crate) fn literal_end(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Index of the identifier token ending at or after `start`.
pub(crate) fn ident_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() && is_ident_char(bytes[i]) {
        i += 1;
    }
    i
}

/// True when position `i` starts a new token (not the middle of an identifier or number).
pub(crate) fn at_token_start(bytes: &[u8], i: usize) -> bool {
    i == 0 || !is_ident_char(bytes[i - 1])
}

/// Position of the `}` closing the `{` at `open`, skipping literals.
pub(crate) fn find_matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(bytes, i);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Position of the `)` closing the `(` at `open`, skipping literals.
pub(crate) fn find_matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(bytes, i);
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Net brace depth change across one line, ignoring braces inside literals.
pub(crate) fn brace_delta(line: &str) -> i64 {
    let bytes = line.as_bytes();
    let mut delta = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(bytes, i);
                continue;
            }
            b'{' => delta += 1,
            b'}' => delta -= 1,
            _ => {}
        }
        i += 1;
    }
    delta
}

/// Split on `sep` wherever it occurs outside literals and outside `()`, `[]`, `{}`.
pub(crate) fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(bytes, i);
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b if b == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

/// Byte ranges of `text` that lie outside string and char literals.
///
/// Passes that rewrite identifiers run over these ranges and copy literals verbatim.
pub(crate) fn code_segments(text: &str) -> Vec<(usize, usize, bool)> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' || bytes[i] == b'\'' {
            if start < i {
                out.push((start, i, true));
            }
            let end = literal_end(bytes, i);
            out.push((i, end, false));
            start = end;
            i = end;
            continue;
        }
        i += 1;
    }
    if start < bytes.len() {
        out.push((start, bytes.len(), true));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_brace_skips_literals() {
        let text = r#"{ a = "}"; b = '{'; { c } }"#;
        assert_eq!(find_matching_brace(text, 0), Some(text.len() - 1));
    }

    #[test]
    fn unbalanced_brace_is_none() {
        assert_eq!(find_matching_brace("{ { }", 0), None);
    }

    #[test]
    fn split_ignores_nested_and_quoted_separators() {
        let parts = split_top_level(r#"f(a, b), "x,y", {1, 2}"#, b',');
        assert_eq!(parts, vec!["f(a, b)", r#" "x,y""#, " {1, 2}"]);
    }

    #[test]
    fn escaped_quote_does_not_end_literal() {
        let text = r#""a\"b" + c"#;
        assert_eq!(literal_end(text.as_bytes(), 0), 6);
    }

    #[test]
    fn brace_delta_counts_code_only() {
        assert_eq!(brace_delta(r#"if (s.equals("{")) {"#), 1);
        assert_eq!(brace_delta("} else {"), 0);
    }

    #[test]
    fn segments_alternate_code_and_literals() {
        let segs = code_segments(r#"a + "b" + c"#);
        assert_eq!(segs, vec![(0, 4, true), (4, 7, false), (7, 11, true)]);
    }
}
