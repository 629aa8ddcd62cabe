//! Line preparation: turn a raw member body into one structural element per line.
//!
//! After preparation every line is exactly one of: a block header ending in
//! `{`, a closer starting with `}` (possibly `} else ... {` and friends), a
//! switch label, or a run of `;`-terminated statements. Statements broken
//! across lines are joined, single-statement bodies gain braces, and blocks
//! written on one line are expanded.

use crate::scan::{
    brace_delta, find_matching_brace, find_matching_paren, literal_end, split_top_level,
};
use std::collections::VecDeque;

/// One prepared line and the original line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcLine {
    pub text: String,
    pub line: usize,
}

impl SrcLine {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }
}

/// Prepare `body`, whose first line is original line `first_line`.
pub fn prepare(body: &str, first_line: usize) -> Vec<SrcLine> {
    let joined = join_lines(body, first_line);
    let mut queue: VecDeque<SrcLine> = joined.into();
    let mut out: Vec<SrcLine> = Vec::new();
    while let Some(line) = queue.pop_front() {
        let text = line.text.trim();
        if text.is_empty() || text == ";" {
            continue;
        }
        if let Some(braced) = brace_single_statement(text) {
            queue.push_front(SrcLine::new(braced, line.line));
            continue;
        }
        if let Some((statements, tail)) = split_leading_statements(text) {
            queue.push_front(SrcLine::new(tail, line.line));
            for stmt in statements.into_iter().rev() {
                queue.push_front(SrcLine::new(stmt, line.line));
            }
            continue;
        }
        if let Some(parts) = expand_inline_block(text) {
            for part in parts.into_iter().rev() {
                queue.push_front(SrcLine::new(part, line.line));
            }
            continue;
        }
        push_merged(&mut out, SrcLine::new(text, line.line));
    }
    out
}

/// Append a line, folding `else`/`catch`/`finally` onto a preceding bare `}`.
fn push_merged(out: &mut Vec<SrcLine>, line: SrcLine) {
    let continues = ["else", "catch", "finally"]
        .iter()
        .any(|kw| starts_with_keyword(&line.text, kw));
    if continues {
        if let Some(prev) = out.last_mut().filter(|p| p.text == "}") {
            prev.text = format!("}} {}", line.text);
            return;
        }
    }
    out.push(line);
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.strip_prefix(keyword).is_some_and(|rest| {
        rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == '(' || c == '{')
    })
}

/// Net `(`/`[` depth change across a line, outside literals.
fn paren_delta(text: &str) -> i64 {
    let bytes = text.as_bytes();
    let mut delta = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(bytes, i);
                continue;
            }
            b'(' | b'[' => delta += 1,
            b')' | b']' => delta -= 1,
            _ => {}
        }
        i += 1;
    }
    delta
}

fn opens_array_literal(text: &str) -> bool {
    text.strip_suffix('{')
        .map(str::trim_end)
        .is_some_and(|prefix| prefix.ends_with('=') || prefix.ends_with(']'))
}

fn ends_mid_expression(text: &str) -> bool {
    if text.ends_with("++") || text.ends_with("--") {
        return false;
    }
    ["+", "-", "*", "/", "%", "&&", "||", ",", "=", "?", "."]
        .iter()
        .any(|op| text.ends_with(op))
}

fn starts_mid_expression(text: &str) -> bool {
    ["+", "-", "*", "/", "&&", "||", "?", ":", "."]
        .iter()
        .any(|op| text.starts_with(op))
        && !text.starts_with("++")
        && !text.starts_with("--")
}

/// Split into trimmed lines and join statements that span several lines.
fn join_lines(body: &str, first_line: usize) -> Vec<SrcLine> {
    let mut out: Vec<SrcLine> = Vec::new();
    let mut open: Option<(SrcLine, i64, i64)> = None;
    for (idx, raw) in body.split('\n').enumerate() {
        let text = raw.trim();
        let line = first_line + idx;
        if text.is_empty() {
            continue;
        }
        if let Some((mut acc, mut parens, mut braces)) = open.take() {
            acc.text.push(' ');
            acc.text.push_str(text);
            parens += paren_delta(text);
            if braces > 0 {
                braces += brace_delta(text);
            }
            if parens > 0 || braces > 0 || ends_mid_expression(text) {
                open = Some((acc, parens, braces));
            } else {
                out.push(acc);
            }
            continue;
        }
        if text == "{" {
            if let Some(prev) = out.last_mut() {
                prev.text.push_str(" {");
                continue;
            }
        }
        if starts_mid_expression(text) {
            if let Some(prev) = out.pop() {
                let merged = format!("{} {}", prev.text, text);
                let parens = paren_delta(&merged);
                if parens > 0 || ends_mid_expression(text) {
                    open = Some((SrcLine::new(merged, prev.line), parens, 0));
                } else {
                    out.push(SrcLine::new(merged, prev.line));
                }
                continue;
            }
        }
        let parens = paren_delta(text);
        let braces = if opens_array_literal(text) { 1 } else { 0 };
        if parens > 0 || braces > 0 || ends_mid_expression(text) {
            open = Some((SrcLine::new(text, line), parens, braces));
        } else {
            out.push(SrcLine::new(text, line));
        }
    }
    if let Some((acc, _, _)) = open {
        out.push(acc);
    }
    out
}

/// `if (c) stmt;` and friends become `if (c) { stmt; }`.
fn brace_single_statement(text: &str) -> Option<String> {
    let (prefix, rest) = match text.strip_prefix('}') {
        Some(rest) => ("} ", rest.trim_start()),
        None => ("", text),
    };
    if let Some(after_else) = rest.strip_prefix("else") {
        let after = after_else.trim_start();
        let is_word = after_else.starts_with(char::is_whitespace) || after_else.starts_with('{');
        if !is_word || after.starts_with('{') || after.is_empty() {
            return None;
        }
        if !starts_with_keyword(after, "if") {
            return Some(format!("{prefix}else {{ {after} }}"));
        }
        return brace_headed(after, &format!("{prefix}else "));
    }
    if ["if", "while", "for"]
        .iter()
        .any(|kw| starts_with_keyword(rest, kw))
    {
        return brace_headed(rest, prefix);
    }
    None
}

fn brace_headed(rest: &str, prefix: &str) -> Option<String> {
    let open = rest.find('(')?;
    let close = find_matching_paren(rest, open)?;
    let body = rest[close + 1..].trim();
    if body.is_empty() || body.starts_with('{') {
        return None;
    }
    // `} while (c);` closes a `do` block and `while (c);` has no body to brace.
    if body == ";" && starts_with_keyword(rest, "while") {
        return None;
    }
    Some(format!("{prefix}{} {{ {body} }}", &rest[..=close]))
}

/// `a(); if (b) {` splits into `a();` and `if (b) {`.
fn split_leading_statements(text: &str) -> Option<(Vec<String>, String)> {
    if text.starts_with("case ") || text.starts_with("default") {
        return None;
    }
    let parts = split_top_level(text, b';');
    let (tail, statements) = parts.split_last()?;
    if statements.is_empty() || tail.trim().is_empty() {
        return None;
    }
    let statements = statements
        .iter()
        .map(|s| format!("{};", s.trim()))
        .collect();
    Some((statements, tail.trim().to_string()))
}

/// Position of the first `{` outside literals.
fn first_code_brace(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(bytes, i);
                continue;
            }
            b'{' => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// `if (a) { b(); } else { c(); }` becomes header, body, closer lines.
fn expand_inline_block(text: &str) -> Option<Vec<String>> {
    let open = first_code_brace(text)?;
    let before = text[..open].trim_end();
    let opens_block = before.is_empty()
        || [")", "else", "try", "finally", "do"]
            .iter()
            .any(|end| before.ends_with(end));
    if !opens_block {
        return None;
    }
    let close = find_matching_brace(text, open)?;
    let inner = text[open + 1..close].trim();
    let after = text[close + 1..].trim();
    let mut parts = vec![format!("{before} {{").trim_start().to_string()];
    if !inner.is_empty() {
        parts.push(inner.to_string());
    }
    let continues = ["else", "catch", "finally"]
        .iter()
        .any(|kw| starts_with_keyword(after, kw));
    if continues {
        parts.push(format!("}} {after}"));
    } else {
        parts.push("}".to_string());
        if !after.is_empty() && after != ";" {
            parts.push(after.to_string());
        }
    }
    Some(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(body: &str) -> Vec<String> {
        prepare(body, 1).into_iter().map(|l| l.text).collect()
    }

    #[test]
    fn inline_if_else_expanded() {
        assert_eq!(
            texts("if (a) { b(); } else { c(); }"),
            ["if (a) {", "b();", "} else {", "c();", "}"]
        );
    }

    #[test]
    fn single_statement_bodies_braced() {
        assert_eq!(texts("if (x) return;"), ["if (x) {", "return;", "}"]);
        assert_eq!(
            texts("for (int i = 0; i < 3; i++) sum += i;"),
            ["for (int i = 0; i < 3; i++) {", "sum += i;", "}"]
        );
        assert_eq!(
            texts("if (a) {\n x();\n}\nelse y();"),
            ["if (a) {", "x();", "} else {", "y();", "}"]
        );
    }

    #[test]
    fn statements_before_header_split() {
        assert_eq!(texts("a = 1; while (a < 3) {"), ["a = 1;", "while (a < 3) {"]);
    }

    #[test]
    fn multi_line_statements_joined_with_first_line() {
        let lines = prepare("\nfoo(a,\n    b);\nString s = \"x\" +\n  \"y\";\n", 10);
        assert_eq!(lines[0], SrcLine::new("foo(a, b);", 11));
        assert_eq!(lines[1], SrcLine::new("String s = \"x\" + \"y\";", 13));
    }

    #[test]
    fn array_literals_are_not_blocks() {
        assert_eq!(texts("int[] a = {1, 2};"), ["int[] a = {1, 2};"]);
        assert_eq!(texts("int[] a = {\n 1,\n 2\n};"), ["int[] a = { 1, 2 };"]);
    }

    #[test]
    fn allman_braces_joined() {
        assert_eq!(texts("while (x)\n{\n y();\n}"), ["while (x) {", "y();", "}"]);
    }

    #[test]
    fn do_while_closer_kept_whole() {
        assert_eq!(
            texts("do {\n a();\n} while (x < 3);"),
            ["do {", "a();", "} while (x < 3);"]
        );
        assert_eq!(texts("do { a(); } while (x);"), ["do {", "a();", "}", "while (x);"]);
    }

    #[test]
    fn case_lines_left_alone() {
        assert_eq!(texts("case 1: a(); break;"), ["case 1: a(); break;"]);
    }
}
