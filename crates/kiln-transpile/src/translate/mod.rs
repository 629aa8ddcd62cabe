//! Statement and expression rewrite rules.
//!
//! Everything here is stateless: one source statement in, Python lines out.
//! Block structure is handled by [`crate::lower`]; receiver qualification by
//! [`crate::qualify`].

pub mod exceptions;
pub mod expr;

pub use exceptions::map_exception_name;
pub use expr::{py_ident, translate_args, translate_expr, zero_value};

use crate::scan::{literal_end, split_top_level};
use regex::Regex;
use std::sync::OnceLock;

/// Words that can never be the type of a local declaration.
const STATEMENT_WORDS: &[&str] = &[
    "return", "throw", "new", "else", "case", "break", "continue", "do", "assert", "yield",
    "goto", "default", "import", "package",
];

fn print_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^System\s*\.\s*(out|err)\s*\.\s*(println|print|printf|format)\s*\((.*)\)$")
            .expect("valid print pattern")
    })
}

fn flush_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^System\s*\.\s*(out|err)\s*\.\s*flush\s*\(\s*\)$").expect("valid flush pattern")
    })
}

fn declaration_head() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?s)^(?:final\s+)?([A-Za-z_][\w.]*)(?:\s*<[\w\s,<>?.\[\]]*>)?((?:\s*\[\s*\])*)\s+([A-Za-z_]\w*\s*(?:\[\s*\]\s*)*(?:=[^=].*|=|,.*)?)$",
        )
        .expect("valid declaration pattern")
    })
}

fn declarator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^([A-Za-z_]\w*)\s*((?:\[\s*\]\s*)*)(?:=\s*(.*))?$")
            .expect("valid declarator pattern")
    })
}

fn float_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-?\d+\.\d*(?:[eE][-+]?\d+)?$").expect("valid float literal pattern")
    })
}

/// One declared local: `type name [= init]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator<'s> {
    pub ty: &'s str,
    pub is_array: bool,
    pub name: &'s str,
    pub init: Option<&'s str>,
}

/// Parse a local declaration statement (without its trailing `;`).
pub fn parse_declaration(stmt: &str) -> Option<Vec<Declarator<'_>>> {
    let stmt = stmt.trim();
    let caps = declaration_head().captures(stmt)?;
    let ty = caps.get(1)?.as_str();
    if STATEMENT_WORDS.contains(&ty) {
        return None;
    }
    let type_is_array = caps.get(2).is_some_and(|m| !m.as_str().trim().is_empty());
    let rest = caps.get(3)?;
    let mut out = Vec::new();
    for piece in split_top_level(&stmt[rest.start()..], b',') {
        let piece = piece.trim();
        let d = declarator().captures(piece)?;
        out.push(Declarator {
            ty,
            is_array: type_is_array || d.get(2).is_some_and(|m| !m.as_str().trim().is_empty()),
            name: d.get(1)?.as_str(),
            init: d.get(3).map(|m| m.as_str().trim()),
        });
    }
    Some(out)
}

/// Names a statement declares as locals, already renamed for Python.
pub fn declared_names(stmt: &str) -> Vec<String> {
    parse_declaration(strip_semicolon(stmt))
        .unwrap_or_default()
        .into_iter()
        .map(|d| py_ident(d.name).into_owned())
        .collect()
}

fn strip_semicolon(stmt: &str) -> &str {
    let stmt = stmt.trim();
    stmt.strip_suffix(';').map_or(stmt, str::trim_end)
}

/// Position and operator of the first top-level assignment in `stmt`.
fn find_assignment(stmt: &str) -> Option<(usize, usize, &str)> {
    let bytes = stmt.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(bytes, i);
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'=' if depth == 0 => {
                if bytes.get(i + 1) == Some(&b'=') {
                    i += 2;
                    continue;
                }
                let mut start = i;
                while start > 0 && b"+-*/%&|^<>".contains(&bytes[start - 1]) {
                    start -= 1;
                }
                let op = &stmt[start..=i];
                if matches!(op, "<=" | ">=") || (start == i && i > 0 && bytes[i - 1] == b'!') {
                    i += 1;
                    continue;
                }
                return Some((start, i + 1, op));
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn print_statement(stream: &str, method: &str, args: &str) -> String {
    let mut parts = Vec::new();
    match method {
        "printf" | "format" => parts.push(format!("_kiln_format({})", translate_args(args))),
        _ if args.trim().is_empty() => {}
        _ => parts.push(format!("_kiln_str({})", translate_expr(args))),
    }
    if method != "println" {
        parts.push("end=''".to_string());
    }
    if stream == "err" {
        parts.push("file=sys.stderr".to_string());
    }
    format!("print({})", parts.join(", "))
}

/// Python value of a declared variable: its translated initializer, widened
/// to `float` for floating-point types, or `None` when there is none.
pub fn declaration_value(ty: &str, is_array: bool, init: Option<&str>) -> String {
    let Some(init) = init else {
        return "None".to_string();
    };
    let value = translate_expr(init);
    let widen = !is_array && matches!(ty, "double" | "float") && !float_literal().is_match(&value);
    if widen {
        format!("float({value})")
    } else {
        value
    }
}

fn declaration_lines(decls: &[Declarator<'_>]) -> Vec<String> {
    decls
        .iter()
        .map(|d| {
            let value = declaration_value(d.ty, d.is_array, d.init);
            format!("{} = {value}", py_ident(d.name))
        })
        .collect()
}

/// Translate one source statement into one or more Python lines.
///
/// The statement may or may not carry its trailing `;`.
pub fn translate_statement(stmt: &str) -> Vec<String> {
    let stmt = strip_semicolon(stmt);
    if stmt.is_empty() {
        return Vec::new();
    }
    if let Some(caps) = print_call().captures(stmt) {
        return vec![print_statement(&caps[1], &caps[2], &caps[3])];
    }
    if let Some(caps) = flush_call().captures(stmt) {
        let stream = if &caps[1] == "err" { "stderr" } else { "stdout" };
        return vec![format!("sys.{stream}.flush()")];
    }
    match stmt {
        "break" | "continue" => return vec![stmt.to_string()],
        "return" => return vec!["return".to_string()],
        _ => {}
    }
    if let Some(value) = keyword_rest(stmt, "return") {
        return vec![format!("return {}", translate_expr(value))];
    }
    if let Some(value) = keyword_rest(stmt, "throw") {
        return vec![format!("raise {}", translate_expr(value))];
    }
    if let Some(rest) = keyword_rest(stmt, "assert") {
        let parts = split_assert(rest);
        return vec![match parts {
            (cond, Some(msg)) => format!("assert {}, {}", translate_expr(cond), translate_expr(msg)),
            (cond, None) => format!("assert {}", translate_expr(cond)),
        }];
    }
    for op in ["++", "--"] {
        let target = stmt
            .strip_prefix(op)
            .or_else(|| stmt.strip_suffix(op))
            .map(str::trim)
            .filter(|t| !t.contains('='));
        if let Some(target) = target {
            let sign = if op == "++" { '+' } else { '-' };
            return vec![format!("{} {sign}= 1", translate_expr(target))];
        }
    }
    if let Some(decls) = parse_declaration(stmt) {
        return declaration_lines(&decls);
    }
    if let Some((start, end, op)) = find_assignment(stmt) {
        let lhs = translate_expr(&stmt[..start]);
        let rhs = translate_expr(&stmt[end..]);
        let line = match op {
            "=" => format!("{lhs} = {rhs}"),
            "+=" => format!("{lhs} = _kiln_plus({lhs}, {rhs})"),
            "/=" => format!("{lhs} = _kiln_div({lhs}, {rhs})"),
            "%=" => format!("{lhs} = _kiln_mod({lhs}, {rhs})"),
            ">>>=" => format!("{lhs} >>= {rhs}"),
            other => format!("{lhs} {other} {rhs}"),
        };
        return vec![line];
    }
    vec![translate_expr(stmt)]
}

/// Text after a leading keyword, when `stmt` starts with it as a whole word.
fn keyword_rest<'s>(stmt: &'s str, keyword: &str) -> Option<&'s str> {
    let rest = stmt.strip_prefix(keyword)?;
    match rest.bytes().next() {
        Some(b) if b.is_ascii_whitespace() || b == b'(' || b == b'"' => Some(rest.trim()),
        _ => None,
    }
}

fn split_assert(rest: &str) -> (&str, Option<&str>) {
    let bytes = rest.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(bytes, i);
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => return (&rest[..i], Some(&rest[i + 1..])),
            _ => {}
        }
        i += 1;
    }
    (rest, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(stmt: &str) -> String {
        let lines = translate_statement(stmt);
        assert_eq!(lines.len(), 1, "{lines:?}");
        lines.into_iter().next().unwrap()
    }

    #[test]
    fn prints_use_java_stringification() {
        assert_eq!(
            one(r#"System.out.println("sum=" + (2 + 3));"#),
            r#"print(_kiln_str(_kiln_plus("sum=", (_kiln_plus(2, 3)))))"#
        );
        assert_eq!(one("System.out.print(x);"), "print(_kiln_str(x), end='')");
        assert_eq!(one("System.out.println();"), "print()");
        assert_eq!(
            one(r#"System.err.println("bad");"#),
            r#"print(_kiln_str("bad"), file=sys.stderr)"#
        );
        assert_eq!(
            one(r#"System.out.printf("%d%n", n);"#),
            r#"print(_kiln_format("%d%n", n), end='')"#
        );
    }

    #[test]
    fn declarations() {
        assert_eq!(one("int x = 5;"), "x = 5");
        assert_eq!(one("String s;"), "s = None");
        assert_eq!(one("int[] a = {1, 2};"), "a = [1, 2]");
        assert_eq!(one("double avg = total / n;"), "avg = float(_kiln_div(total, n))");
        assert_eq!(one("double d = 2.5;"), "d = 2.5");
        assert_eq!(translate_statement("int a = 1, b;"), vec!["a = 1", "b = None"]);
        assert_eq!(one("List<String> names = new ArrayList<>();"), "names = ArrayList()");
    }

    #[test]
    fn declared_names_cover_every_declarator() {
        assert_eq!(declared_names("int a = 1, b = 2;"), vec!["a", "b"]);
        assert_eq!(declared_names("final String in = s;"), vec!["in_"]);
        assert!(declared_names("x = 1;").is_empty());
        assert!(declared_names("return x;").is_empty());
    }

    #[test]
    fn increments_and_compound_assignment() {
        assert_eq!(one("i++;"), "i += 1");
        assert_eq!(one("--count"), "count -= 1");
        assert_eq!(one("s += \"x\";"), "s = _kiln_plus(s, \"x\")");
        assert_eq!(one("total -= 2;"), "total -= 2");
        assert_eq!(one("a[i] = b[i] * 2;"), "a[i] = b[i] * 2");
        assert_eq!(one("q /= 2;"), "q = _kiln_div(q, 2)");
    }

    #[test]
    fn comparisons_are_not_assignments() {
        assert_eq!(one("check(a == b)"), "check(a == b)");
        assert_eq!(one("ok = a <= b"), "ok = a <= b");
        assert_eq!(one("ok = a != b"), "ok = a != b");
    }

    #[test]
    fn control_statements() {
        assert_eq!(one("return;"), "return");
        assert_eq!(one("return a + 1;"), "return _kiln_plus(a, 1)");
        assert_eq!(one("break;"), "break");
        assert_eq!(
            one(r#"throw new IllegalArgumentException("neg");"#),
            r#"raise ValueError("neg")"#
        );
        assert_eq!(one("throw e;"), "raise e");
        assert_eq!(one(r#"assert n > 0 : "positive";"#), r#"assert n > 0, "positive""#);
    }
}
