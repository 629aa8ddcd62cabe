//! Expression rewriting.
//!
//! Expressions are never parsed into a tree. Instead the text is split at
//! top-level operators from the loosest binding level downwards (ternary,
//! `||`, `&&`, comparison, additive, multiplicative, unary) and each piece is
//! rewritten recursively. What remains at the bottom is a primary: a chain of
//! names, member accesses, calls, indexing and literals, which is rewritten by
//! a single left-to-right scan.

use super::exceptions::map_exception_name;
use crate::scan::{
    at_token_start, find_matching_brace, find_matching_paren, ident_end, is_ident_char,
    is_ident_start, literal_end, split_top_level,
};
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Qualified names rewritten to Python builtins or prelude helpers.
const INTRINSICS: &[(&str, &str)] = &[
    ("Math.max", "max"),
    ("Math.min", "min"),
    ("Math.abs", "abs"),
    ("Math.sqrt", "math.sqrt"),
    ("Math.pow", "math.pow"),
    ("Math.floor", "math.floor"),
    ("Math.ceil", "math.ceil"),
    ("Math.round", "round"),
    ("Math.random", "random.random"),
    ("Math.PI", "math.pi"),
    ("Math.E", "math.e"),
    ("Integer.parseInt", "int"),
    ("Long.parseLong", "int"),
    ("Double.parseDouble", "float"),
    ("Float.parseFloat", "float"),
    ("Integer.MAX_VALUE", "2147483647"),
    ("Integer.MIN_VALUE", "(-2147483648)"),
    ("String.valueOf", "_kiln_str"),
    ("Integer.toString", "_kiln_str"),
    ("String.format", "_kiln_format"),
    ("System.exit", "sys.exit"),
];

/// Zero-argument or receiver-preserving method renames.
const METHOD_RENAMES: &[(&str, &str)] = &[
    ("toUpperCase", "upper"),
    ("toLowerCase", "lower"),
    ("trim", "strip"),
    ("startsWith", "startswith"),
    ("endsWith", "endswith"),
    ("indexOf", "find"),
    ("lastIndexOf", "rfind"),
];

/// Python words that cannot be used as plain identifiers in generated code.
const PY_RESERVED: &[&str] = &[
    "and", "as", "assert", "async", "await", "def", "del", "elif", "except", "from", "global",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "with", "yield", "None",
    "True", "False", "self", "len", "str", "int", "float", "print", "range", "max", "min", "abs",
    "isinstance", "chr", "round", "sys", "math", "random",
];

/// Rename identifiers that would collide with Python keywords or names the
/// generated code relies on.
pub fn py_ident(name: &str) -> Cow<'_, str> {
    if PY_RESERVED.contains(&name) {
        Cow::Owned(format!("{name}_"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Zero value of a declared element or field type.
pub fn zero_value(ty: &str) -> &'static str {
    match ty {
        "int" | "long" | "short" | "byte" => "0",
        "double" | "float" => "0.0",
        "boolean" => "False",
        "String" | "char" => "''",
        _ => "None",
    }
}

/// Translate one source expression into Python.
pub fn translate_expr(expr: &str) -> String {
    let expr = expr.trim();
    if expr.is_empty() {
        return String::new();
    }
    if let Some((cond, then, other)) = split_ternary(expr) {
        return format!(
            "({} if {} else {})",
            translate_expr(then),
            translate_expr(cond),
            translate_expr(other)
        );
    }
    for (op, py) in [("||", " or "), ("&&", " and ")] {
        let parts = split_operator(expr, op);
        if parts.len() > 1 {
            return parts
                .iter()
                .map(|p| translate_expr(p))
                .collect::<Vec<_>>()
                .join(py);
        }
    }
    if let Some((lhs, op, rhs)) = split_comparison(expr) {
        return format!("{} {} {}", translate_expr(lhs), op, translate_expr(rhs));
    }
    if let Some((lhs, ty)) = split_instanceof(expr) {
        return format!("isinstance({}, {})", translate_expr(lhs), python_type(ty));
    }
    additive(expr)
}

/// Translate a comma-separated argument list.
pub fn translate_args(inner: &str) -> String {
    split_top_level(inner, b',')
        .into_iter()
        .filter(|a| !a.trim().is_empty())
        .map(translate_expr)
        .collect::<Vec<_>>()
        .join(", ")
}

fn python_type(ty: &str) -> &str {
    match ty.trim() {
        "String" => "str",
        "Integer" | "Long" => "int",
        "Double" | "Float" => "float",
        "Boolean" => "bool",
        "Object" => "object",
        other => map_exception_name(other),
    }
}

/// Walk `text` outside literals, calling `visit(i, depth)` at every code byte.
///
/// `visit` returns how many bytes to skip when it consumes an operator.
fn walk_top_level(text: &str, mut visit: impl FnMut(usize, usize) -> Option<usize>) {
    let bytes = text.as_bytes();
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
            _ => {
                if let Some(skip) = visit(i, depth) {
                    i += skip;
                    continue;
                }
            }
        }
        i += 1;
    }
}

fn split_ternary(expr: &str) -> Option<(&str, &str, &str)> {
    let bytes = expr.as_bytes();
    let mut question = None;
    let mut nested = 0usize;
    let mut colon = None;
    walk_top_level(expr, |i, depth| {
        if depth != 0 || colon.is_some() {
            return None;
        }
        match bytes[i] {
            b'?' if question.is_none() => question = Some(i),
            b'?' => nested += 1,
            b':' if question.is_some() && nested > 0 => nested -= 1,
            b':' if question.is_some() => colon = Some(i),
            _ => {}
        }
        None
    });
    let (q, c) = (question?, colon?);
    Some((&expr[..q], &expr[q + 1..c], &expr[c + 1..]))
}

fn split_operator<'e>(expr: &'e str, op: &str) -> Vec<&'e str> {
    let bytes = expr.as_bytes();
    let op = op.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    walk_top_level(expr, |i, depth| {
        if depth == 0 && bytes[i..].starts_with(op) {
            parts.push(&expr[start..i]);
            start = i + op.len();
            return Some(op.len());
        }
        None
    });
    parts.push(&expr[start..]);
    parts
}

/// True when the `<` at `i` opens a type argument list such as `List<String>`.
fn opens_generic(bytes: &[u8], i: usize) -> bool {
    if i == 0 || !is_ident_char(bytes[i - 1]) {
        return false;
    }
    let mut start = i;
    while start > 0 && is_ident_char(bytes[start - 1]) {
        start -= 1;
    }
    bytes[start].is_ascii_uppercase()
}

fn split_comparison(expr: &str) -> Option<(&str, &'static str, &str)> {
    let bytes = expr.as_bytes();
    let mut found = None;
    let mut generic_depth = 0usize;
    walk_top_level(expr, |i, depth| {
        if depth != 0 || found.is_some() {
            return None;
        }
        let next = bytes.get(i + 1).copied();
        let prev = i.checked_sub(1).map(|p| bytes[p]);
        match bytes[i] {
            b'<' if opens_generic(bytes, i) => {
                generic_depth += 1;
                return None;
            }
            b'>' if generic_depth > 0 => {
                generic_depth -= 1;
                return None;
            }
            _ => {}
        }
        let op: Option<(&'static str, usize)> = match (bytes[i], next) {
            (b'=', Some(b'=')) => Some(("==", 2)),
            (b'!', Some(b'=')) => Some(("!=", 2)),
            (b'<', Some(b'=')) => Some(("<=", 2)),
            (b'>', Some(b'=')) => Some((">=", 2)),
            (b'<', Some(b'<')) | (b'>', Some(b'>')) => return Some(2),
            (b'<', _) if prev != Some(b'<') => Some(("<", 1)),
            (b'>', _) if prev != Some(b'>') && prev != Some(b'-') => Some((">", 1)),
            _ => None,
        };
        if let Some((op, len)) = op {
            found = Some((i, op, len));
        }
        None
    });
    let (i, op, len) = found?;
    Some((&expr[..i], op, &expr[i + len..]))
}

fn split_instanceof(expr: &str) -> Option<(&str, &str)> {
    let parts = split_operator(expr, " instanceof ");
    match parts.as_slice() {
        &[lhs, ty] => Some((lhs, ty)),
        _ => None,
    }
}

/// True when the sign at `i` is a binary operator rather than unary or an exponent sign.
fn is_binary_sign(bytes: &[u8], i: usize) -> bool {
    let sign = bytes[i];
    if bytes.get(i + 1) == Some(&sign) || bytes.get(i + 1) == Some(&b'=') {
        return false;
    }
    let Some(prev_idx) = bytes[..i].iter().rposition(|b| !b.is_ascii_whitespace()) else {
        return false;
    };
    let prev = bytes[prev_idx];
    if prev == sign {
        return false;
    }
    if !(is_ident_char(prev) || matches!(prev, b')' | b']' | b'"' | b'\'')) {
        return false;
    }
    if prev_idx + 1 == i && matches!(prev, b'e' | b'E') {
        let mut start = prev_idx;
        while start > 0 && (is_ident_char(bytes[start - 1]) || bytes[start - 1] == b'.') {
            start -= 1;
        }
        if bytes[start].is_ascii_digit() {
            return false;
        }
    }
    true
}

fn split_signs<'e>(expr: &'e str, signs: &[u8]) -> Vec<(u8, &'e str)> {
    let bytes = expr.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut pending = 0u8;
    walk_top_level(expr, |i, depth| {
        if depth != 0 || !signs.contains(&bytes[i]) {
            return None;
        }
        let is_op = match bytes[i] {
            b'+' | b'-' => is_binary_sign(bytes, i),
            _ => bytes.get(i + 1) != Some(&b'=') && i > 0,
        };
        if is_op {
            parts.push((pending, &expr[start..i]));
            pending = bytes[i];
            start = i + 1;
        }
        None
    });
    parts.push((pending, &expr[start..]));
    parts
}

/// `a + b - c` with string-aware `+`.
fn additive(expr: &str) -> String {
    let parts = split_signs(expr, b"+-");
    if parts.len() == 1 {
        return multiplicative(expr);
    }
    let mut acc = multiplicative(parts[0].1);
    let mut plus: Vec<String> = Vec::new();
    for (sign, operand) in &parts[1..] {
        let operand = multiplicative(operand);
        if *sign == b'+' {
            if plus.is_empty() {
                plus.push(acc.clone());
            }
            plus.push(operand);
        } else {
            if !plus.is_empty() {
                acc = format!("_kiln_plus({})", plus.join(", "));
                plus.clear();
            }
            acc = format!("{acc} - {operand}");
        }
    }
    if !plus.is_empty() {
        acc = format!("_kiln_plus({})", plus.join(", "));
    }
    acc
}

fn multiplicative(expr: &str) -> String {
    let parts = split_signs(expr, b"*/%");
    let mut acc = unary(parts[0].1);
    for (sign, operand) in &parts[1..] {
        let operand = unary(operand);
        acc = match sign {
            b'/' => format!("_kiln_div({acc}, {operand})"),
            b'%' => format!("_kiln_mod({acc}, {operand})"),
            _ => format!("{acc} * {operand}"),
        };
    }
    acc
}

fn cast_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\(\s*([A-Za-z_][\w.]*)\s*((?:\[\s*\])*)\s*\)\s*([A-Za-z_0-9(\x22'!-].*)$")
            .expect("valid cast pattern")
    })
}

fn unary(expr: &str) -> String {
    let expr = expr.trim();
    if let Some(rest) = expr.strip_prefix('!') {
        if !rest.starts_with('=') {
            return format!("not {}", unary(rest));
        }
    }
    if let Some(rest) = expr.strip_prefix('-') {
        if !rest.starts_with('-') {
            return format!("-{}", unary(rest));
        }
    }
    if let Some(caps) = cast_pattern().captures(expr) {
        let ty = &caps[1];
        let operand = caps.get(3).map_or("", |m| m.as_str());
        let is_type = ty.as_bytes()[0].is_ascii_uppercase()
            || matches!(ty, "int" | "long" | "short" | "byte" | "double" | "float" | "char");
        if is_type && caps[2].is_empty() {
            let inner = unary(operand);
            return match ty {
                "int" | "long" | "short" | "byte" => format!("int({inner})"),
                "double" | "float" => format!("float({inner})"),
                "char" => format!("chr({inner})"),
                _ => inner,
            };
        }
    }
    primary(expr)
}

fn qualified_call() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[a-z_][a-z0-9_]*\.)*([A-Z][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\s*\(")
            .expect("valid qualified call pattern")
    })
}

fn starts_with_token(text: &str, i: usize, pat: &str) -> bool {
    text[i..].starts_with(pat)
        && text
            .as_bytes()
            .get(i + pat.len())
            .is_none_or(|b| !is_ident_char(*b))
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// True when the output so far ends in something a `(` would call or `[` would index.
fn continues_chain(out: &str) -> bool {
    out.trim_end()
        .bytes()
        .last()
        .is_some_and(|b| is_ident_char(b) || b == b')' || b == b']')
}

fn number_literal(text: &str, start: usize) -> (String, usize) {
    let bytes = text.as_bytes();
    let mut i = start;
    while i < bytes.len() {
        let b = bytes[i];
        if is_ident_char(b) || b == b'.' {
            i += 1;
        } else if matches!(b, b'+' | b'-')
            && matches!(bytes[i - 1], b'e' | b'E')
            && !text[start..i].starts_with("0x")
        {
            i += 1;
        } else {
            break;
        }
    }
    let raw = &text[start..i];
    let hex = raw.starts_with("0x") || raw.starts_with("0X");
    let mut lit = raw.to_string();
    if lit.ends_with(['L', 'l']) || (!hex && lit.ends_with(['f', 'F', 'd', 'D'])) {
        lit.pop();
    }
    if lit.len() > 1 && lit.starts_with('0') && lit.bytes().all(|b| b.is_ascii_digit()) {
        lit = format!("0o{}", &lit[1..]);
    }
    (lit, i)
}

/// Rewrite `new ...` starting right after the keyword. Returns the Python text and resume position.
fn new_expression(text: &str, after_new: usize) -> Option<(String, usize)> {
    let bytes = text.as_bytes();
    let start = skip_ws(bytes, after_new);
    if start == after_new || !bytes.get(start).is_some_and(|b| is_ident_start(*b)) {
        return None;
    }
    let mut end = start;
    while end < bytes.len() && (is_ident_char(bytes[end]) || bytes[end] == b'.') {
        end += 1;
    }
    let ty = map_exception_name(&text[start..end]);
    let mut k = skip_ws(bytes, end);
    if bytes.get(k) == Some(&b'<') {
        let mut depth = 0usize;
        while k < bytes.len() {
            match bytes[k] {
                b'<' => depth += 1,
                b'>' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            k += 1;
        }
        k = skip_ws(bytes, k + 1);
    }
    match bytes.get(k) {
        Some(b'(') => {
            let close = find_matching_paren(text, k)?;
            let args = translate_args(&text[k + 1..close]);
            Some((format!("{ty}({args})"), close + 1))
        }
        Some(b'[') => {
            let mut dims = Vec::new();
            while bytes.get(k) == Some(&b'[') {
                let close = find_matching_paren(text, k)?;
                dims.push(text[k + 1..close].trim());
                k = skip_ws(bytes, close + 1);
            }
            if dims.iter().all(|d| d.is_empty()) {
                if bytes.get(k) != Some(&b'{') {
                    return None;
                }
                let close = find_matching_brace(text, k)?;
                return Some((format!("[{}]", translate_args(&text[k + 1..close])), close + 1));
            }
            let filled: Vec<&str> = dims.iter().copied().take_while(|d| !d.is_empty()).collect();
            let elem = if filled.len() < dims.len() {
                "None"
            } else {
                zero_value(ty)
            };
            let (last, outer) = filled.split_last()?;
            let mut built = format!("[{elem}] * ({})", translate_expr(last));
            for dim in outer.iter().rev() {
                built = format!("[{built} for _ in range({})]", translate_expr(dim));
            }
            if outer.is_empty() {
                built = format!("({built})");
            }
            Some((built, k))
        }
        _ => None,
    }
}

/// Rewrite a member access or method call on the receiver `out[chain..]`.
///
/// Returns the resume position when the member was consumed.
fn member(text: &str, dot: usize, out: &mut String, chain: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let name_end = ident_end(bytes, dot + 1);
    let name = &text[dot + 1..name_end];
    let paren = skip_ws(bytes, name_end);
    let (args, resume) = if bytes.get(paren) == Some(&b'(') {
        let close = find_matching_paren(text, paren)?;
        (Some(text[paren + 1..close].trim()), close + 1)
    } else {
        (None, name_end)
    };
    let receiver = out[chain..].to_string();
    let replaced = match (name, args) {
        ("length", None) | ("length" | "size", Some("")) => format!("len({receiver})"),
        ("toString" | "getMessage", Some("")) => format!("str({receiver})"),
        ("isEmpty", Some("")) => format!("(len({receiver}) == 0)"),
        ("equals", Some(arg)) => format!("({receiver} == {})", translate_expr(arg)),
        ("equalsIgnoreCase", Some(arg)) => {
            format!("({receiver}.lower() == ({}).lower())", translate_expr(arg))
        }
        ("charAt", Some(arg)) => format!("{receiver}[{}]", translate_expr(arg)),
        ("contains", Some(arg)) => format!("({} in {receiver})", translate_expr(arg)),
        ("substring", Some(arg)) => {
            let bounds = split_top_level(arg, b',');
            match bounds.as_slice() {
                [from] => format!("{receiver}[{}:]", translate_expr(from)),
                [from, to] => format!(
                    "{receiver}[{}:{}]",
                    translate_expr(from),
                    translate_expr(to)
                ),
                _ => return None,
            }
        }
        _ => {
            let renamed = METHOD_RENAMES
                .iter()
                .find(|(from, _)| *from == name)
                .filter(|_| args.is_some())
                .map_or(name, |(_, to)| *to);
            out.push('.');
            out.push_str(renamed);
            return Some(name_end);
        }
    };
    out.truncate(chain);
    out.push_str(&replaced);
    Some(resume)
}

/// Rewrite a primary expression chain.
fn primary(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 8);
    let mut chain = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'"' | b'\'' => {
                let end = literal_end(bytes, i);
                chain = out.len();
                out.push_str(&text[i..end]);
                i = end;
            }
            b'(' | b'[' | b'{' => {
                let close = if b == b'{' {
                    find_matching_brace(text, i)
                } else {
                    find_matching_paren(text, i)
                };
                let Some(close) = close else {
                    out.push_str(&text[i..]);
                    break;
                };
                let inner = &text[i + 1..close];
                match b {
                    b'(' if continues_chain(&out) => {
                        out.push('(');
                        out.push_str(&translate_args(inner));
                        out.push(')');
                    }
                    b'(' => {
                        chain = out.len();
                        out.push('(');
                        out.push_str(&translate_expr(inner));
                        out.push(')');
                    }
                    b'[' => {
                        out.push('[');
                        out.push_str(&translate_expr(inner));
                        out.push(']');
                    }
                    _ => {
                        chain = out.len();
                        out.push('[');
                        out.push_str(&translate_args(inner));
                        out.push(']');
                    }
                }
                i = close + 1;
            }
            b'.' if bytes.get(i + 1).is_some_and(|n| is_ident_start(*n)) => {
                match member(text, i, &mut out, chain) {
                    Some(resume) => i = resume,
                    None => {
                        out.push_str(&text[i..]);
                        break;
                    }
                }
            }
            b'!' if bytes.get(i + 1) != Some(&b'=') => {
                out.push_str("not ");
                i += 1;
            }
            b'0'..=b'9' if at_token_start(bytes, i) => {
                let (lit, end) = number_literal(text, i);
                chain = out.len();
                out.push_str(&lit);
                i = end;
            }
            _ if is_ident_start(b) && at_token_start(bytes, i) => {
                i = word(text, i, &mut out, &mut chain);
            }
            _ => {
                let ch = text[i..].chars().next().unwrap_or(' ');
                out.push(ch);
                i += ch.len_utf8();
            }
        }
    }
    out
}

/// Rewrite the identifier starting at `i`; returns the resume position.
fn word(text: &str, i: usize, out: &mut String, chain: &mut usize) -> usize {
    let bytes = text.as_bytes();
    let end = ident_end(bytes, i);
    let name = &text[i..end];
    *chain = out.len();
    match name {
        "true" => out.push_str("True"),
        "false" => out.push_str("False"),
        "null" => out.push_str("None"),
        "new" => {
            if let Some((rewritten, resume)) = new_expression(text, end) {
                out.push_str(&rewritten);
                return resume;
            }
            out.push_str(name);
        }
        _ => {
            if let Some((from, to)) = INTRINSICS
                .iter()
                .find(|(from, _)| starts_with_token(text, i, from))
            {
                out.push_str(to);
                return i + from.len();
            }
            if let Some(caps) = qualified_call().captures(&text[i..]) {
                if let (false, Some(method)) =
                    (matches!(&caps[1], "System" | "Math"), caps.get(2))
                {
                    out.push_str(method.as_str());
                    return i + method.end();
                }
            }
            out.push_str(&py_ident(name));
        }
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_and_logic() {
        assert_eq!(translate_expr("a && !b || c == null"), "a and not b or c == None");
        assert_eq!(translate_expr("done != true"), "done != True");
    }

    #[test]
    fn rewrites_do_not_fire_mid_identifier() {
        assert_eq!(translate_expr("isTrue"), "isTrue");
        assert_eq!(translate_expr("nullable"), "nullable");
        assert_eq!(translate_expr("renew(x)"), "renew(x)");
    }

    #[test]
    fn string_literals_untouched() {
        assert_eq!(translate_expr(r#""a && b || !c""#), r#""a && b || !c""#);
    }

    #[test]
    fn length_forms() {
        assert_eq!(translate_expr("arr.length"), "len(arr)");
        assert_eq!(translate_expr("name.length()"), "len(name)");
        assert_eq!(translate_expr("this.grid[0].length"), "len(this.grid[0])");
        assert_eq!(translate_expr("i < arr.length - 1"), "i < len(arr) - 1");
    }

    #[test]
    fn concatenation_uses_helper() {
        assert_eq!(translate_expr(r#""sum=" + (2 + 3)"#), r#"_kiln_plus("sum=", (_kiln_plus(2, 3)))"#);
        assert_eq!(translate_expr("a + b - c"), "_kiln_plus(a, b) - c");
        assert_eq!(translate_expr("x - 1"), "x - 1");
        assert_eq!(translate_expr("-x + 1e-3"), "_kiln_plus(-x, 1e-3)");
    }

    #[test]
    fn comparison_operands_lowered_separately() {
        assert_eq!(
            translate_expr(r#"s + "!" == t"#),
            r#"_kiln_plus(s, "!") == t"#
        );
    }

    #[test]
    fn integer_division_and_remainder() {
        assert_eq!(translate_expr("a / b * c"), "_kiln_div(a, b) * c");
        assert_eq!(translate_expr("n % 2 == 0"), "_kiln_mod(n, 2) == 0");
        assert_eq!(translate_expr("(double) sum / n"), "_kiln_div(float(sum), n)");
    }

    #[test]
    fn ternary() {
        assert_eq!(translate_expr("x > 0 ? \"pos\" : \"neg\""), "(\"pos\" if x > 0 else \"neg\")");
    }

    #[test]
    fn array_creation() {
        assert_eq!(translate_expr("new int[n]"), "([0] * (n))");
        assert_eq!(translate_expr("new boolean[3]"), "([False] * (3))");
        assert_eq!(
            translate_expr("new double[r][c]"),
            "[[0.0] * (c) for _ in range(r)]"
        );
        assert_eq!(translate_expr("new int[]{1, 2, 3}"), "[1, 2, 3]");
        assert_eq!(translate_expr("{1, 2}"), "[1, 2]");
    }

    #[test]
    fn object_creation_and_intrinsics() {
        assert_eq!(translate_expr("new Point(1, 2)"), "Point(1, 2)");
        assert_eq!(translate_expr("Math.max(a, b)"), "max(a, b)");
        assert_eq!(translate_expr("Integer.parseInt(s)"), "int(s)");
        assert_eq!(translate_expr("Math.sqrt(x)"), "math.sqrt(x)");
        assert_eq!(translate_expr("Helper.twice(3)"), "twice(3)");
        assert_eq!(translate_expr("com.acme.Util.go()"), "go()");
    }

    #[test]
    fn string_methods() {
        assert_eq!(translate_expr("a.equals(b)"), "(a == b)");
        assert_eq!(translate_expr("s.charAt(i)"), "s[i]");
        assert_eq!(translate_expr("s.substring(1, n)"), "s[1:n]");
        assert_eq!(translate_expr("s.toUpperCase()"), "s.upper()");
        assert_eq!(translate_expr("e.getMessage()"), "str(e)");
        assert_eq!(translate_expr("p.toString()"), "str(p)");
    }

    #[test]
    fn numeric_suffixes_dropped() {
        assert_eq!(translate_expr("10L"), "10");
        assert_eq!(translate_expr("2.5f"), "2.5");
        assert_eq!(translate_expr("0xFF"), "0xFF");
    }

    #[test]
    fn reserved_names_renamed() {
        assert_eq!(translate_expr("in + len"), "_kiln_plus(in_, len_)");
        assert_eq!(translate_expr("obj.len"), "obj.len");
    }

    #[test]
    fn instanceof_and_generics() {
        assert_eq!(translate_expr("s instanceof Circle"), "isinstance(s, Circle)");
        assert_eq!(translate_expr("new Box<String>(x)"), "Box(x)");
    }
}
