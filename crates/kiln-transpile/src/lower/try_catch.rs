//! `try`/`catch`/`finally` lowering.

use super::{Frame, Lowerer, SrcLine, requeue_after_closer, take_section};
use crate::ir::Stmt;
use crate::translate::{map_exception_name, py_ident};
use regex::Regex;
use std::collections::VecDeque;
use std::sync::OnceLock;

fn catch_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\}\s*catch\s*\(\s*(?:final\s+)?([^)]+?)\s+([A-Za-z_$][\w$]*)\s*\)\s*\{$")
            .expect("valid catch pattern")
    })
}

fn finally_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\}\s*finally\s*\{$").expect("valid finally pattern"))
}

/// `A | B` as a Python exception spec: one name, or a tuple of distinct names.
fn except_types(raw: &str) -> String {
    let mut names: Vec<&str> = Vec::new();
    for name in raw.split('|').map(str::trim).filter(|n| !n.is_empty()) {
        let mapped = map_exception_name(name);
        if !names.contains(&mapped) {
            names.push(mapped);
        }
    }
    match names.as_slice() {
        [one] => (*one).to_string(),
        many => format!("({})", many.join(", ")),
    }
}

impl Lowerer<'_> {
    /// Lower a `try` whose header was just taken from `queue`.
    pub(super) fn try_catch(
        &mut self,
        queue: &mut VecDeque<SrcLine>,
        line: usize,
        frames: &[Frame],
    ) -> Vec<Stmt> {
        let (body, mut closer) = take_section(queue);
        let body = self.nested(body, frames);
        let mut out = vec![Stmt::block("try", body, self.origin(line))];
        let mut handled = false;
        loop {
            let Some(current) = closer.take() else {
                tracing::warn!(line, "try statement is never closed");
                break;
            };
            if let Some(caps) = catch_header().captures(&current.text) {
                self.declare(&caps[2]);
                let header = format!("except {} as {}", except_types(&caps[1]), py_ident(&caps[2]));
                let (section, next) = take_section(queue);
                let body = self.nested(section, frames);
                out.push(Stmt::block(header, body, self.origin(current.line)));
                handled = true;
                closer = next;
            } else if finally_header().is_match(&current.text) {
                let (section, next) = take_section(queue);
                let body = self.nested(section, frames);
                out.push(Stmt::block("finally", body, self.origin(current.line)));
                handled = true;
                closer = next;
            } else {
                requeue_after_closer(queue, Some(current));
                break;
            }
        }
        if !handled {
            tracing::debug!(line, "try without handlers; adding an empty finally");
            out.push(Stmt::block("finally", Vec::new(), None));
        }
        out
    }
}
