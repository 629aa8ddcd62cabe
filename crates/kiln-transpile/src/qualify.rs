//! Receiver qualification for bare names.
//!
//! Source code may refer to fields and methods of the enclosing class without a
//! receiver; Python may not. A [`Scope`] is built once per class (including
//! everything inherited through known bases) and rewrites already-translated
//! Python text so those references gain `self.` or `<Class>.`.

use crate::extract::ClassSpec;
use crate::scan::{code_segments, ident_end, is_ident_char, is_ident_start};
use crate::translate::py_ident;
use std::collections::{HashMap, HashSet};

/// Names visible without a receiver inside one class.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    class: String,
    /// Python identifier -> attribute name.
    fields: HashMap<String, String>,
    /// Python identifier -> `Declaring.attr`.
    static_fields: HashMap<String, String>,
    instance_methods: HashMap<String, String>,
    /// Python identifier -> `Declaring.name`.
    static_methods: HashMap<String, String>,
}

impl Scope {
    /// Collect the members of `class` and of every ancestor found in `classes`.
    ///
    /// Members of the class itself shadow inherited ones.
    pub fn for_class(class: &ClassSpec, classes: &[ClassSpec]) -> Self {
        let mut scope = Scope {
            class: class.name.clone(),
            ..Scope::default()
        };
        let mut seen = HashSet::new();
        let mut current = Some(class);
        while let Some(spec) = current {
            if !seen.insert(spec.name.as_str()) {
                break;
            }
            for field in &spec.fields {
                scope
                    .fields
                    .entry(py_ident(&field.name).into_owned())
                    .or_insert_with(|| field.name.clone());
            }
            for field in &spec.static_fields {
                scope
                    .static_fields
                    .entry(py_ident(&field.name).into_owned())
                    .or_insert_with(|| format!("{}.{}", spec.name, field.name));
            }
            for method in &spec.instance_methods {
                scope
                    .instance_methods
                    .entry(py_ident(&method.name).into_owned())
                    .or_insert_with(|| method.name.clone());
            }
            for method in &spec.static_methods {
                scope
                    .static_methods
                    .entry(py_ident(&method.name).into_owned())
                    .or_insert_with(|| format!("{}.{}", spec.name, method.name));
            }
            current = spec
                .base
                .as_deref()
                .and_then(|base| classes.iter().find(|c| c.name == base));
        }
        scope
    }

    /// Rewrite bare references in translated Python `text`.
    ///
    /// `locals` holds the (Python) names of parameters and declared locals;
    /// they are never qualified. `instance` enables `self`-qualification and
    /// the `this`/`super` rewrites.
    pub fn qualify(&self, text: &str, locals: &HashSet<String>, instance: bool) -> String {
        let mut out = String::with_capacity(text.len() + 16);
        let mut depth = 0usize;
        for (start, end, is_code) in code_segments(text) {
            if !is_code {
                out.push_str(&text[start..end]);
                continue;
            }
            self.qualify_code(text, start, end, locals, instance, &mut depth, &mut out);
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn qualify_code(
        &self,
        text: &str,
        start: usize,
        end: usize,
        locals: &HashSet<String>,
        instance: bool,
        depth: &mut usize,
        out: &mut String,
    ) {
        let bytes = text.as_bytes();
        let mut i = start;
        while i < end {
            let b = bytes[i];
            match b {
                b'(' | b'[' | b'{' => *depth += 1,
                b')' | b']' | b'}' => *depth = depth.saturating_sub(1),
                _ => {}
            }
            let token_start = i == 0 || !is_ident_char(bytes[i - 1]);
            if !(is_ident_start(b) && token_start) {
                let ch = text[i..].chars().next().unwrap_or(' ');
                out.push(ch);
                i += ch.len_utf8();
                continue;
            }
            let word_end = ident_end(bytes, i).min(end);
            let word = &text[i..word_end];
            let after_dot = text[..i].trim_end().ends_with('.');
            let next = text[word_end..end].trim_start();
            if instance && word == "this" && !after_dot && next.starts_with('(') {
                // Delegation binds to this class, not to the receiver's runtime class.
                let open = end - next.len();
                let separator = if next[1..].trim_start().starts_with(')') { "" } else { ", " };
                out.push_str(&format!("{}.__init__(self{separator}", self.class));
                *depth += 1;
                i = open + 1;
                continue;
            }
            out.push_str(&self.rewrite(word, next, *depth, after_dot, locals, instance));
            i = word_end;
        }
    }

    fn rewrite(
        &self,
        word: &str,
        next: &str,
        depth: usize,
        after_dot: bool,
        locals: &HashSet<String>,
        instance: bool,
    ) -> String {
        if after_dot {
            return word.to_string();
        }
        let is_call = next.starts_with('(');
        if instance {
            match word {
                "this" => return "self".to_string(),
                "super" if is_call => return "super().__init__".to_string(),
                "super" if next.starts_with('.') => return "super()".to_string(),
                _ => {}
            }
        }
        if locals.contains(word) {
            return word.to_string();
        }
        if is_call {
            if instance {
                if let Some(name) = self.instance_methods.get(word) {
                    return format!("self.{name}");
                }
            }
            if let Some(qualified) = self.static_methods.get(word) {
                return qualified.clone();
            }
            return word.to_string();
        }
        let keyword_arg = depth > 0 && next.starts_with('=') && !next.starts_with("==");
        if keyword_arg {
            return word.to_string();
        }
        if instance {
            if let Some(attr) = self.fields.get(word) {
                return format!("self.{attr}");
            }
        }
        if let Some(qualified) = self.static_fields.get(word) {
            return qualified.clone();
        }
        word.to_string()
    }
}
