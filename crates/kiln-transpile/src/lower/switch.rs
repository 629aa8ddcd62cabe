//! `switch` lowering: cases become an `if`/`elif`/`else` chain over `__sw`.
//!
//! A `break` nested inside a case body (under an `if`, say) must leave only
//! the switch. Such chains are wrapped in `while True: ... break`; a
//! `continue` inside the wrapper sets `__sw_continue` and breaks out, and the
//! enclosing loop continues once the wrapper has been left.

use super::{Frame, Lowerer, SrcLine, SwitchExit, prepare};
use crate::ir::Stmt;
use crate::scan::{brace_delta, literal_end, split_top_level};
use regex::Regex;
use std::collections::VecDeque;
use std::sync::OnceLock;

/// Synthetic local holding the switch subject.
const SUBJECT: &str = "__sw";

/// Set when a `continue` leaves a wrapped switch for the enclosing loop.
pub(super) const CONTINUE_FLAG: &str = "__sw_continue";

fn default_label() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^default\s*:").expect("valid default label pattern"))
}

#[derive(Debug, Default)]
struct Case {
    values: Vec<String>,
    is_default: bool,
    body: Vec<SrcLine>,
    line: usize,
}

impl Case {
    fn has_labels(&self) -> bool {
        self.is_default || !self.values.is_empty()
    }
}

enum Label<'s> {
    Values(Vec<&'s str>),
    Default,
}

/// Split one leading `case V:` or `default:` label off `text`.
fn take_label(text: &str) -> Option<(Label<'_>, &str)> {
    if let Some(m) = default_label().find(text) {
        return Some((Label::Default, text[m.end()..].trim_start()));
    }
    let rest = text.strip_prefix("case")?;
    if !rest.starts_with(|c: char| c.is_whitespace() || c == '(' || c == '\'' || c == '"') {
        return None;
    }
    let colon = label_colon(rest)?;
    let values = split_top_level(&rest[..colon], b',')
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();
    Some((Label::Values(values), rest[colon + 1..].trim_start()))
}

/// First `:` outside literals and brackets that is not part of `::`.
fn label_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(bytes, i);
                continue;
            }
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => {
                if bytes.get(i + 1) == Some(&b':') {
                    i += 2;
                    continue;
                }
                return Some(i);
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn is_break(text: &str) -> bool {
    text.trim_end_matches(';').trim() == "break"
}

/// Group the section's lines into cases.
///
/// Labels with no statements before the next label share one case. A `break`
/// at the section's own depth ends the current case.
fn partition(lines: Vec<SrcLine>) -> Vec<Case> {
    let mut cases = Vec::new();
    let mut current: Option<Case> = None;
    let mut depth = 0i64;
    let mut queue: VecDeque<SrcLine> = lines.into();
    while let Some(line) = queue.pop_front() {
        if depth == 0 {
            let mut text = line.text.as_str();
            let mut labelled = false;
            while let Some((label, rest)) = take_label(text) {
                if current.as_ref().is_some_and(|c| !c.body.is_empty()) {
                    tracing::debug!(line = line.line, "case body falls through into the next label");
                    cases.extend(current.take());
                }
                let case = current.get_or_insert_with(|| Case {
                    line: line.line,
                    ..Case::default()
                });
                match label {
                    Label::Default => case.is_default = true,
                    Label::Values(values) => case.values.extend(values.into_iter().map(str::to_string)),
                }
                text = rest;
                labelled = true;
            }
            if labelled {
                for part in prepare(text, line.line).into_iter().rev() {
                    queue.push_front(part);
                }
                continue;
            }
            if is_break(text) {
                match current.take() {
                    Some(case) => cases.push(case),
                    None => tracing::debug!(line = line.line, "ignoring break outside a case"),
                }
                continue;
            }
        }
        depth += brace_delta(&line.text);
        match current.as_mut() {
            Some(case) => case.body.push(line),
            None => tracing::debug!(line = line.line, "dropping unreachable switch statement"),
        }
    }
    cases.extend(current);
    cases.retain(Case::has_labels);
    cases
}

impl Lowerer<'_> {
    pub(super) fn switch(
        &mut self,
        subject: &str,
        section: Vec<SrcLine>,
        line: usize,
        frames: &[Frame],
    ) -> Vec<Stmt> {
        let mut out = vec![Stmt::line(
            format!("{SUBJECT} = {}", self.expr(subject)),
            self.origin(line),
        )];
        let cases = partition(section);
        if cases.is_empty() {
            out.push(Stmt::line("pass", self.origin(line)));
            return out;
        }
        let (defaults, mut valued): (Vec<Case>, Vec<Case>) =
            cases.into_iter().partition(|c| c.is_default);
        if defaults.len() > 1 {
            tracing::warn!(line, "switch has more than one default; keeping the first");
        }
        valued.extend(defaults.into_iter().next());

        let outer = self.switch_exit.replace(SwitchExit::default());
        let mut chain = self.case_chain(&valued, frames);
        let mut exit = self.switch_exit.unwrap_or_default();
        if exit.broke && exit.continued {
            // `continue` was written for an unwrapped chain.
            self.switch_exit = Some(SwitchExit {
                wrapped: true,
                ..SwitchExit::default()
            });
            chain = self.case_chain(&valued, frames);
            exit = self.switch_exit.unwrap_or_default();
        }
        self.switch_exit = outer;

        if !exit.broke {
            out.extend(chain);
            return out;
        }
        tracing::debug!(line, "nested break in a case; wrapping the switch in a one-shot loop");
        if exit.wrapped {
            out.push(Stmt::line(format!("{CONTINUE_FLAG} = False"), self.origin(line)));
        }
        chain.push(Stmt::generated("break"));
        out.push(Stmt::block("while True", chain, self.origin(line)));
        if exit.wrapped {
            let mut resume = Vec::new();
            self.statement("continue", line, frames, &mut resume);
            out.push(Stmt::block(format!("if {CONTINUE_FLAG}"), resume, self.origin(line)));
        }
        out
    }

    /// The `if`/`elif`/`else` chain; a default, if any, is the last case.
    fn case_chain(&mut self, cases: &[Case], frames: &[Frame]) -> Vec<Stmt> {
        let mut out = Vec::new();
        for (idx, case) in cases.iter().enumerate() {
            let header = if case.is_default {
                if idx == 0 { "if True".to_string() } else { "else".to_string() }
            } else {
                let test = case
                    .values
                    .iter()
                    .map(|v| format!("{SUBJECT} == {}", self.expr(v)))
                    .collect::<Vec<_>>()
                    .join(" or ");
                let keyword = if idx == 0 { "if" } else { "elif" };
                format!("{keyword} {test}")
            };
            let body = self.within(case.body.clone(), frames);
            out.push(Stmt::block(header, body, self.origin(case.line)));
        }
        out
    }
}
