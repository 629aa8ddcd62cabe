//! Structural extraction: classes, members and fields from normalized text.
//!
//! There is no grammar here. Class headers and member headers are found with
//! regular expressions, bodies are delimited by brace matching, and whatever
//! remains at depth zero inside a class body is read as field declarations.

use crate::error::TranspileError;
use crate::preprocess::Normalized;
use crate::scan::{find_matching_brace, split_top_level};
use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::OnceLock;

/// A declared (non-static) field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub ty: String,
    pub is_array: bool,
    pub name: String,
    pub init: Option<String>,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub ty: String,
    pub is_array: bool,
    pub name: String,
}

/// A constructor or method.
#[derive(Debug, Clone, Serialize)]
pub struct MemberSpec {
    /// Method name; for constructors, the class name.
    pub name: String,
    /// Declared return type; `None` for constructors.
    pub return_type: Option<String>,
    pub is_static: bool,
    /// Raw parameter list text between the parentheses.
    pub params: String,
    /// Raw body text between the braces.
    pub body: String,
    /// Byte range of `body` in the normalized text.
    pub body_span: (usize, usize),
    /// Original file of the member.
    pub path: String,
    /// Original 1-based line of the body's opening brace.
    pub line: usize,
}

impl MemberSpec {
    pub fn params(&self) -> Vec<Param> {
        parse_params(&self.params)
    }

    pub fn param_names(&self) -> Vec<String> {
        self.params().into_iter().map(|p| p.name).collect()
    }
}

/// Everything extracted for one class header.
#[derive(Debug, Clone, Serialize)]
pub struct ClassSpec {
    pub name: String,
    pub base: Option<String>,
    pub fields: Vec<FieldSpec>,
    /// `static` fields, emitted as class attributes.
    pub static_fields: Vec<FieldSpec>,
    pub constructors: Vec<MemberSpec>,
    pub static_methods: Vec<MemberSpec>,
    pub instance_methods: Vec<MemberSpec>,
}

impl ClassSpec {
    fn new(name: &str, base: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            base: base.map(str::to_string),
            fields: Vec::new(),
            static_fields: Vec::new(),
            constructors: Vec::new(),
            static_methods: Vec::new(),
            instance_methods: Vec::new(),
        }
    }

    pub fn has_static_main(&self) -> bool {
        self.static_methods.iter().any(|m| m.name == "main")
    }
}

const NON_TYPE_WORDS: &[&str] = &[
    "public",
    "private",
    "protected",
    "static",
    "final",
    "synchronized",
    "abstract",
    "native",
    "new",
    "return",
    "else",
    "if",
    "while",
    "for",
    "switch",
    "catch",
    "throw",
    "do",
    "try",
    "case",
    "class",
];

fn class_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\bclass\s+([A-Za-z_]\w*)\s*(?:extends\s+([A-Za-z_][\w.]*))?\s*(?:implements\s+[\w\s,.]+?)?\s*\{",
        )
        .expect("valid class pattern")
    })
}

fn method_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:\b(?:public|private|protected|static|final|synchronized|abstract)\s+)*\b([A-Za-z_][\w<>\[\]]*)\s+([A-Za-z_]\w*)\s*\(([^)]*)\)\s*(?:throws\s+[\w\s,.]+?)?\s*\{",
        )
        .expect("valid method pattern")
    })
}

fn constructor_header(class_name: &str) -> Regex {
    let pattern = format!(
        r"(?:\b(?:public|private|protected)\s+)?\b{}\s*\(([^)]*)\)\s*(?:throws\s+[\w\s,.]+?)?\s*\{{",
        regex::escape(class_name)
    );
    Regex::new(&pattern).expect("escaped class name forms a valid pattern")
}

fn static_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bstatic\b").expect("valid static pattern"))
}

fn field_decl() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?:public|private|protected|final|transient|volatile)\s+)*([A-Za-z_][\w<>.]*)\s*(\[\])?\s+([A-Za-z_]\w*)\s*(\[\])?\s*(?:=\s*([\s\S]*))?$",
        )
        .expect("valid field pattern")
    })
}

fn annotation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@\w+(?:\([^)]*\))?").expect("valid annotation pattern"))
}

/// Extract every class in first-encountered order.
pub fn extract_classes(source: &Normalized) -> Result<Vec<ClassSpec>, TranspileError> {
    let text = source.text.as_str();
    let mut classes = Vec::new();
    let mut pos = 0;
    while let Some(caps) = class_header().captures_at(text, pos) {
        let whole = caps.get(0).expect("group 0 always participates");
        let name = &caps[1];
        let open = whole.end() - 1;
        let Some(close) = find_matching_brace(text, open) else {
            let at = source.locate(whole.start());
            return Err(TranspileError::UnbalancedClass {
                name: name.to_string(),
                path: at.path,
                line: at.line,
            });
        };
        let mut spec = ClassSpec::new(name, caps.get(2).map(|m| m.as_str()));
        extract_members(source, open + 1, close, &mut spec)?;
        tracing::debug!(
            class = %spec.name,
            base = ?spec.base,
            fields = spec.fields.len(),
            constructors = spec.constructors.len(),
            static_methods = spec.static_methods.len(),
            instance_methods = spec.instance_methods.len(),
            "extracted class"
        );
        classes.push(spec);
        pos = close + 1;
    }
    if classes.is_empty() {
        return Err(TranspileError::NoClasses);
    }
    Ok(classes)
}

enum Header<'t> {
    Constructor(Captures<'t>),
    Method(Captures<'t>),
}

/// Next method header at or after `from`, skipping matches whose type slot is a keyword.
fn next_method<'t>(hay: &'t str, mut from: usize) -> Option<Captures<'t>> {
    while let Some(caps) = method_header().captures_at(hay, from) {
        if NON_TYPE_WORDS.contains(&&caps[1]) || NON_TYPE_WORDS.contains(&&caps[2]) {
            from = caps.get(0).expect("group 0").start() + 1;
            continue;
        }
        return Some(caps);
    }
    None
}

fn extract_members(
    source: &Normalized,
    body_start: usize,
    body_end: usize,
    spec: &mut ClassSpec,
) -> Result<(), TranspileError> {
    let text = source.text.as_str();
    let hay = &text[..body_end];
    let ctor_re = constructor_header(&spec.name);
    let mut member_spans = Vec::new();
    let mut j = body_start;

    loop {
        let ctor = ctor_re.captures_at(hay, j);
        let method = next_method(hay, j);
        let header = match (ctor, method) {
            (Some(c), Some(m)) => {
                let c_start = c.get(0).expect("group 0").start();
                let m_start = m.get(0).expect("group 0").start();
                if m_start < c_start {
                    Header::Method(m)
                } else {
                    Header::Constructor(c)
                }
            }
            (Some(c), None) => Header::Constructor(c),
            (None, Some(m)) => Header::Method(m),
            (None, None) => break,
        };
        let whole = match &header {
            Header::Constructor(c) | Header::Method(c) => c.get(0).expect("group 0"),
        };
        let (start, open) = (whole.start(), whole.end() - 1);
        let at = source.locate(open);
        let name = match &header {
            Header::Constructor(_) => spec.name.clone(),
            Header::Method(m) => m[2].to_string(),
        };
        let Some(close) = find_matching_brace(text, open) else {
            return Err(TranspileError::UnbalancedMember {
                name,
                path: at.path,
                line: at.line,
            });
        };
        let member = |return_type: Option<String>, is_static: bool, params: &str| MemberSpec {
            name: name.clone(),
            return_type,
            is_static,
            params: params.trim().to_string(),
            body: text[open + 1..close].to_string(),
            body_span: (open + 1, close),
            path: at.path.clone(),
            line: at.line,
        };
        match &header {
            Header::Constructor(c) => spec.constructors.push(member(None, false, &c[1])),
            Header::Method(m) => {
                let is_static = static_token().is_match(&text[start..open]);
                let member = member(Some(m[1].to_string()), is_static, &m[3]);
                if is_static {
                    spec.static_methods.push(member);
                } else {
                    spec.instance_methods.push(member);
                }
            }
        }
        member_spans.push((start, close + 1));
        j = close + 1;
    }

    let mut leftover = String::new();
    let mut cursor = body_start;
    for (start, end) in member_spans {
        leftover.push_str(&text[cursor..start]);
        leftover.push('\n');
        cursor = end;
    }
    leftover.push_str(&text[cursor..body_end]);
    (spec.fields, spec.static_fields) = parse_fields(&leftover);
    Ok(())
}

/// Read instance and static field declarations out of the depth-zero text of a class body.
fn parse_fields(leftover: &str) -> (Vec<FieldSpec>, Vec<FieldSpec>) {
    let cleaned = annotation().replace_all(leftover, "");
    let mut fields = Vec::new();
    let mut statics = Vec::new();
    for decl in split_top_level(&cleaned, b';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        let is_static = static_token().is_match(decl);
        let decl = static_token().replace(decl, "");
        let decl = decl.trim();
        let Some(caps) = field_decl().captures(decl) else {
            tracing::debug!(declaration = decl, "skipping unrecognized class-level text");
            continue;
        };
        let field = FieldSpec {
            ty: strip_generics(&caps[1]),
            is_array: caps.get(2).is_some() || caps.get(4).is_some(),
            name: caps[3].to_string(),
            init: caps.get(5).map(|m| m.as_str().trim().to_string()),
        };
        if is_static {
            statics.push(field);
        } else {
            fields.push(field);
        }
    }
    (fields, statics)
}

fn strip_generics(ty: &str) -> String {
    match ty.find('<') {
        Some(idx) => ty[..idx].to_string(),
        None => ty.to_string(),
    }
}

/// Parse a raw parameter list into typed parameters.
pub fn parse_params(raw: &str) -> Vec<Param> {
    let mut params = Vec::new();
    for piece in split_top_level(raw, b',') {
        let cleaned = annotation().replace_all(piece, "");
        let tokens: Vec<&str> = cleaned
            .split_whitespace()
            .filter(|t| *t != "final")
            .collect();
        let Some((last, rest)) = tokens.split_last() else {
            continue;
        };
        let mut name = last.to_string();
        let mut ty = rest.last().copied().unwrap_or("Object").to_string();
        let mut is_array = false;
        if let Some(stripped) = name.strip_suffix("[]") {
            name = stripped.to_string();
            is_array = true;
        }
        for suffix in ["[]", "..."] {
            if let Some(stripped) = ty.strip_suffix(suffix) {
                ty = stripped.to_string();
                is_array = true;
            }
        }
        params.push(Param {
            ty: strip_generics(&ty),
            is_array,
            name,
        });
    }
    params
}
