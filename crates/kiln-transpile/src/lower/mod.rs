//! Control-flow lowering of member bodies.
//!
//! A body is first prepared into one structural element per line (see
//! [`prepare`]), then walked once with an explicit stack of open block frames.
//! Opening a block pushes a frame; closing one pops it and attaches the
//! finished [`Stmt::Block`] to its parent. `switch` and `try` capture their
//! whole section up front and lower each part recursively.

mod prepare;
mod switch;
mod try_catch;

pub use prepare::{SrcLine, prepare};

use crate::ir::Stmt;
use crate::preprocess::SourcePos;
use crate::qualify::Scope;
use crate::scan::{brace_delta, find_matching_paren, split_top_level};
use crate::translate::{declared_names, py_ident, translate_expr, translate_statement};
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::sync::OnceLock;
use switch::CONTINUE_FLAG;

/// What lowering needs to know about the member being lowered.
#[derive(Debug, Clone, Copy)]
pub struct BodyContext<'a> {
    pub scope: &'a Scope,
    /// Whether `self` is available (constructors and instance methods).
    pub instance: bool,
    /// Original file of the member.
    pub path: &'a str,
}

/// Lower a member body whose text starts on original line `first_line`.
///
/// `params` are the Python names of the member's parameters.
pub fn lower_body(
    body: &str,
    first_line: usize,
    params: &[String],
    ctx: BodyContext<'_>,
) -> Vec<Stmt> {
    let lines = prepare(body, first_line);
    let mut lowerer = Lowerer {
        ctx,
        locals: params.iter().cloned().collect(),
        outer_update: None,
        switch_exit: None,
    };
    lowerer.lower(lines)
}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($re).expect(concat!("valid ", stringify!($name), " pattern")))
        }
    };
}

pattern!(else_if_header, r"^\}\s*else\s+if\s*\((.*)\)\s*\{$");
pattern!(else_header, r"^\}\s*else\s*\{$");
pattern!(if_header, r"^if\s*\((.*)\)\s*\{$");
pattern!(while_header, r"^while\s*\((.*)\)\s*\{$");
pattern!(switch_header, r"^switch\s*\((.*)\)\s*\{$");
pattern!(try_header, r"^try\s*\{$");
pattern!(do_header, r"^do\s*\{$");
pattern!(do_closer, r"^\}\s*while\s*\((.*)\)\s*;$");
pattern!(bodiless_while, r"^while\s*\((.*)\)\s*;$");
pattern!(
    for_each_header,
    r"^for\s*\(\s*(?:final\s+)?[A-Za-z_][\w<>\[\],.?\s]*?\s+([A-Za-z_]\w*)\s*:\s*(.+)\)\s*\{$"
);
pattern!(
    counting_for_header,
    r"^for\s*\(\s*((?:int|long|short|byte)\s+)?([A-Za-z_]\w*)\s*=\s*([^;]+);\s*([A-Za-z_]\w*)\s*(<=|<|>=|>)\s*([^;]+);\s*(?:([A-Za-z_]\w*)\s*(\+\+|--)|(\+\+|--)\s*([A-Za-z_]\w*))\s*\)\s*\{$"
);

#[derive(Debug)]
enum FrameKind {
    Root,
    Plain,
    /// A loop; `update` runs at the end of every iteration and before `continue`.
    Loop { update: Vec<Stmt> },
}

#[derive(Debug)]
struct Frame {
    header: String,
    origin: Option<SourcePos>,
    body: Vec<Stmt>,
    kind: FrameKind,
}

impl Frame {
    fn root() -> Self {
        Frame {
            header: String::new(),
            origin: None,
            body: Vec::new(),
            kind: FrameKind::Root,
        }
    }

    fn is_loop(&self) -> bool {
        matches!(self.kind, FrameKind::Loop { .. })
    }
}

/// How `break` and `continue` leave the switch being lowered.
#[derive(Debug, Default, Clone, Copy)]
struct SwitchExit {
    /// The case chain sits inside a one-shot `while True`.
    wrapped: bool,
    /// A `break` below the case's own depth was lowered.
    broke: bool,
    /// A `continue` for the enclosing loop was lowered.
    continued: bool,
}

pub(crate) struct Lowerer<'a> {
    ctx: BodyContext<'a>,
    locals: HashSet<String>,
    /// Update of the innermost loop enclosing a nested lowering, if any.
    outer_update: Option<Vec<Stmt>>,
    /// Set while lowering case bodies whose `break` targets the switch.
    switch_exit: Option<SwitchExit>,
}

impl Lowerer<'_> {
    fn origin(&self, line: usize) -> Option<SourcePos> {
        Some(SourcePos {
            path: self.ctx.path.to_string(),
            line,
        })
    }

    /// Translate and qualify an expression.
    fn expr(&self, text: &str) -> String {
        self.ctx
            .scope
            .qualify(&translate_expr(text), &self.locals, self.ctx.instance)
    }

    fn declare(&mut self, name: &str) {
        self.locals.insert(py_ident(name).into_owned());
    }

    /// Lower one statement (without block structure) into `out`.
    fn statement(&mut self, stmt: &str, line: usize, frames: &[Frame], out: &mut Vec<Stmt>) {
        let stmt = stmt.trim();
        if stmt.is_empty() {
            return;
        }
        let bare = stmt.trim_end_matches(';').trim();
        if bare == "break" || bare == "continue" {
            let in_loop = frames.iter().any(Frame::is_loop);
            let origin = self.origin(line);
            if let Some(exit) = self.switch_exit.as_mut().filter(|_| !in_loop) {
                if bare == "break" {
                    exit.broke = true;
                    out.push(Stmt::line("break", origin));
                    return;
                }
                exit.continued = true;
                if exit.wrapped {
                    out.push(Stmt::line(format!("{CONTINUE_FLAG} = True"), origin.clone()));
                    out.push(Stmt::line("break", origin));
                    return;
                }
            }
        }
        if bare == "continue" {
            if let Some(update) = self.innermost_update(frames) {
                out.extend(update);
            }
            out.push(Stmt::line("continue", self.origin(line)));
            return;
        }
        for name in declared_names(stmt) {
            self.locals.insert(name);
        }
        for py in translate_statement(stmt) {
            let py = self.ctx.scope.qualify(&py, &self.locals, self.ctx.instance);
            out.push(Stmt::line(py, self.origin(line)));
        }
    }

    fn innermost_update(&self, frames: &[Frame]) -> Option<Vec<Stmt>> {
        frames
            .iter()
            .rev()
            .find_map(|f| match &f.kind {
                FrameKind::Loop { update } => Some(update.clone()),
                _ => None,
            })
            .or_else(|| self.outer_update.clone())
    }

    /// Lower `lines` as a nested body inside the current loop context.
    fn nested(&mut self, lines: Vec<SrcLine>, frames: &[Frame]) -> Vec<Stmt> {
        if !frames.iter().any(Frame::is_loop) {
            return self.within(lines, frames);
        }
        let exit = self.switch_exit.take();
        let body = self.within(lines, frames);
        self.switch_exit = exit;
        body
    }

    /// Lower `lines` with the innermost update of `frames` as the outer update.
    fn within(&mut self, lines: Vec<SrcLine>, frames: &[Frame]) -> Vec<Stmt> {
        let update = self.innermost_update(frames);
        let saved = std::mem::replace(&mut self.outer_update, update);
        let body = self.lower(lines);
        self.outer_update = saved;
        body
    }

    /// `do { ... } while (c);` as `while True` ending in an exit test.
    ///
    /// The exit test doubles as the loop update so `continue` checks it too.
    fn do_while(&mut self, queue: &mut VecDeque<SrcLine>, line: usize) -> Vec<Stmt> {
        let (body, closer) = take_section(queue);
        let cond = match &closer {
            Some(c) if c.text == "}" => queue
                .front()
                .and_then(|next| bodiless_while().captures(&next.text))
                .map(|caps| (caps[1].to_string(), c.line)),
            Some(c) => do_closer()
                .captures(&c.text)
                .map(|caps| (caps[1].to_string(), c.line)),
            None => None,
        };
        let exit = match cond {
            Some((cond, cond_line)) => {
                if closer.as_ref().is_some_and(|c| c.text == "}") {
                    queue.pop_front();
                }
                let origin = self.origin(cond_line);
                let test = format!("if not ({})", self.expr(&cond));
                Stmt::block(test, vec![Stmt::line("break", origin.clone())], origin)
            }
            None => {
                tracing::warn!(path = self.ctx.path, line, "do block without a while condition runs once");
                requeue_after_closer(queue, closer);
                Stmt::generated("break")
            }
        };
        let saved_update = self.outer_update.replace(vec![exit.clone()]);
        let saved_exit = self.switch_exit.take();
        let mut stmts = self.lower(body);
        self.outer_update = saved_update;
        self.switch_exit = saved_exit;
        stmts.push(exit);
        vec![Stmt::block("while True", stmts, self.origin(line))]
    }

    fn open(frames: &mut Vec<Frame>, header: String, origin: Option<SourcePos>, kind: FrameKind) {
        frames.push(Frame {
            header,
            origin,
            body: Vec::new(),
            kind,
        });
    }

    fn close(frames: &mut Vec<Frame>) {
        if frames.len() < 2 {
            tracing::debug!("ignoring unmatched closing brace");
            return;
        }
        let Some(mut frame) = frames.pop() else {
            return;
        };
        if let FrameKind::Loop { update } = &mut frame.kind {
            frame.body.append(update);
        }
        let block = Stmt::block(frame.header, frame.body, frame.origin);
        if let Some(parent) = frames.last_mut() {
            parent.body.push(block);
        }
    }

    fn current(frames: &mut [Frame]) -> &mut Vec<Stmt> {
        &mut frames
            .last_mut()
            .expect("the root frame is never popped")
            .body
    }

    pub(crate) fn lower(&mut self, lines: Vec<SrcLine>) -> Vec<Stmt> {
        let mut frames = vec![Frame::root()];
        let mut queue: VecDeque<SrcLine> = lines.into();
        while let Some(line) = queue.pop_front() {
            let text = line.text.as_str();
            let origin = self.origin(line.line);

            if let Some(caps) = else_if_header().captures(text) {
                Self::close(&mut frames);
                let header = format!("elif {}", self.expr(&caps[1]));
                Self::open(&mut frames, header, origin, FrameKind::Plain);
            } else if else_header().is_match(text) {
                Self::close(&mut frames);
                Self::open(&mut frames, "else".to_string(), origin, FrameKind::Plain);
            } else if text == "}" || text == "};" {
                Self::close(&mut frames);
            } else if let Some(rest) = text.strip_prefix('}') {
                Self::close(&mut frames);
                queue.push_front(SrcLine::new(rest.trim(), line.line));
            } else if let Some(caps) = switch_header().captures(text) {
                let (body, closer) = take_section(&mut queue);
                requeue_after_closer(&mut queue, closer);
                let stmts = self.switch(&caps[1], body, line.line, &frames);
                Self::current(&mut frames).extend(stmts);
            } else if try_header().is_match(text) {
                let stmts = self.try_catch(&mut queue, line.line, &frames);
                Self::current(&mut frames).extend(stmts);
            } else if do_header().is_match(text) {
                let stmts = self.do_while(&mut queue, line.line);
                Self::current(&mut frames).extend(stmts);
            } else if let Some(caps) = bodiless_while().captures(text) {
                let header = format!("while {}", self.expr(&caps[1]));
                Self::current(&mut frames).push(Stmt::block(header, Vec::new(), origin));
            } else if let Some(caps) = if_header().captures(text) {
                let header = format!("if {}", self.expr(&caps[1]));
                Self::open(&mut frames, header, origin, FrameKind::Plain);
            } else if let Some(caps) = while_header().captures(text) {
                let header = format!("while {}", self.expr(&caps[1]));
                let kind = FrameKind::Loop { update: Vec::new() };
                Self::open(&mut frames, header, origin, kind);
            } else if let Some(caps) = for_each_header().captures(text) {
                self.declare(&caps[1]);
                let header = format!("for {} in {}", py_ident(&caps[1]), self.expr(&caps[2]));
                let kind = FrameKind::Loop { update: Vec::new() };
                Self::open(&mut frames, header, origin, kind);
            } else if let Some(header) = self.counting_for(text) {
                let kind = FrameKind::Loop { update: Vec::new() };
                Self::open(&mut frames, header, origin, kind);
            } else if text.starts_with("for") && text.ends_with('{') {
                self.generic_for(text, line.line, &mut frames);
            } else if text.ends_with('{') {
                tracing::debug!(line = line.line, header = text, "lowering unrecognized header as a plain block");
                Self::open(&mut frames, "if True".to_string(), origin, FrameKind::Plain);
            } else {
                let mut out = Vec::new();
                for stmt in split_top_level(text, b';') {
                    self.statement(stmt, line.line, &frames, &mut out);
                }
                Self::current(&mut frames).extend(out);
            }
        }
        if frames.len() > 1 {
            tracing::warn!(
                path = self.ctx.path,
                open = frames.len() - 1,
                "closing blocks left open at end of body"
            );
        }
        while frames.len() > 1 {
            Self::close(&mut frames);
        }
        frames.pop().map(|f| f.body).unwrap_or_default()
    }

    /// `for (int i = a; i < b; i++) {` as a `range` loop.
    fn counting_for(&mut self, text: &str) -> Option<String> {
        let caps = counting_for_header().captures(text)?;
        let var = &caps[2];
        let (update_var, step) = match (caps.get(7), caps.get(8), caps.get(9), caps.get(10)) {
            (Some(v), Some(op), _, _) | (_, _, Some(op), Some(v)) => (v.as_str(), op.as_str()),
            _ => return None,
        };
        if caps[4] != *var || update_var != var {
            return None;
        }
        let typed = caps.get(1).is_some();
        if !typed && !self.locals.contains(py_ident(var).as_ref()) {
            return None;
        }
        self.declare(var);
        let start = self.expr(&caps[3]);
        let bound = self.expr(&caps[6]);
        let range = match (&caps[5], step) {
            ("<", "++") => format!("range({start}, {bound})"),
            ("<=", "++") => format!("range({start}, ({bound}) + 1)"),
            (">", "--") => format!("range({start}, {bound}, -1)"),
            (">=", "--") => format!("range({start}, ({bound}) - 1, -1)"),
            _ => return None,
        };
        Some(format!("for {} in {range}", py_ident(var)))
    }

    /// Any other three-clause `for`: init statements, `while`, update as a pending loop tail.
    fn generic_for(&mut self, text: &str, line: usize, frames: &mut Vec<Frame>) {
        let origin = self.origin(line);
        let open = text.find('(');
        let close = open.and_then(|o| find_matching_paren(text, o));
        let (Some(open), Some(close)) = (open, close) else {
            tracing::debug!(line, header = text, "malformed for header");
            Self::open(frames, "if True".to_string(), origin, FrameKind::Plain);
            return;
        };
        let clauses = split_clauses(&text[open + 1..close]);
        let [init, cond, update] = clauses;

        let mut init_stmts = Vec::new();
        if !init.trim().is_empty() {
            if declared_names(init).is_empty() {
                for part in split_top_level(init, b',') {
                    self.statement(part, line, frames, &mut init_stmts);
                }
            } else {
                self.statement(init, line, frames, &mut init_stmts);
            }
        }
        Self::current(frames).extend(init_stmts);

        let cond = if cond.trim().is_empty() {
            "True".to_string()
        } else {
            self.expr(cond)
        };
        let mut update_stmts = Vec::new();
        for part in split_top_level(update, b',') {
            self.statement(part, line, frames, &mut update_stmts);
        }
        Self::open(
            frames,
            format!("while {cond}"),
            origin,
            FrameKind::Loop {
                update: update_stmts,
            },
        );
    }
}

/// The three clauses of a `for` header, empty ones included.
fn split_clauses(inner: &str) -> [&str; 3] {
    let mut clauses = ["", "", ""];
    let mut depth = 0usize;
    let mut start = 0;
    let mut idx = 0;
    let bytes = inner.as_bytes();
    let mut i = 0;
    while i < bytes.len() && idx < 2 {
        match bytes[i] {
            b'"' | b'\'' => {
                i = crate::scan::literal_end(bytes, i);
                continue;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => {
                clauses[idx] = &inner[start..i];
                idx += 1;
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    clauses[idx] = &inner[start..];
    clauses
}

/// Lines of a section opened on the previous line, up to its closing line.
///
/// The closing line is the first line at the section's own depth that starts
/// with `}`; it is returned separately so callers can inspect `} catch` etc.
fn take_section(queue: &mut VecDeque<SrcLine>) -> (Vec<SrcLine>, Option<SrcLine>) {
    let mut body = Vec::new();
    let mut depth = 1i64;
    while let Some(line) = queue.pop_front() {
        if depth == 1 && line.text.starts_with('}') {
            return (body, Some(line));
        }
        depth += brace_delta(&line.text);
        body.push(line);
    }
    (body, None)
}

/// Put back whatever follows the `}` of a closing line.
fn requeue_after_closer(queue: &mut VecDeque<SrcLine>, closer: Option<SrcLine>) {
    if let Some(closer) = closer {
        let rest = closer.text[1..].trim();
        if !rest.is_empty() && rest != ";" {
            queue.push_front(SrcLine::new(rest, closer.line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Module;
    use crate::output::PythonWriter;

    fn lower_text(body: &str, instance: bool) -> String {
        let scope = Scope::default();
        let ctx = BodyContext {
            scope: &scope,
            instance,
            path: "T.java",
        };
        let stmts = lower_body(body, 1, &[], ctx);
        PythonWriter::emit(
            &Module {
                prelude: String::new(),
                body: stmts,
            },
            false,
        )
    }

    #[test]
    fn if_else_chain() {
        let out = lower_text(
            "if (x > 1) {\n  a();\n} else if (x > 0) {\n  b();\n} else {\n  c();\n}\n",
            false,
        );
        insta::assert_snapshot!(out, @r"
        if x > 1:
            a()
        elif x > 0:
            b()
        else:
            c()
        ");
    }

    #[test]
    fn counting_loops_become_ranges() {
        assert_eq!(
            lower_text("for (int i = 0; i < 5; i++) {\n  f(i);\n}", false),
            "for i in range(0, 5):\n    f(i)\n"
        );
        assert_eq!(
            lower_text("for (int i = 5; i > 0; i--) {\n  f(i);\n}", false),
            "for i in range(5, 0, -1):\n    f(i)\n"
        );
        assert_eq!(
            lower_text("for (int i = 1; i <= n; i++) f(i);", false),
            "for i in range(1, (n) + 1):\n    f(i)\n"
        );
    }

    #[test]
    fn for_each_loop() {
        assert_eq!(
            lower_text("for (String s : names) {\n  f(s);\n}", false),
            "for s in names:\n    f(s)\n"
        );
    }

    #[test]
    fn generic_for_emits_update_before_continue_and_at_end() {
        let out = lower_text(
            "for (int i = 0; i < n; i += 2) {\n  if (i == 4) {\n    continue;\n  }\n  f(i);\n}",
            false,
        );
        insta::assert_snapshot!(out, @r"
        i = 0
        while i < n:
            if i == 4:
                i = _kiln_plus(i, 2)
                continue
            f(i)
            i = _kiln_plus(i, 2)
        ");
    }

    #[test]
    fn nested_generic_fors_keep_their_own_updates() {
        let out = lower_text(
            "for (int i = 0; i < 3; i += 1) {\n  for (int j = 0; j < 3; j += 1) {\n    continue;\n  }\n}",
            false,
        );
        insta::assert_snapshot!(out, @r"
        i = 0
        while i < 3:
            j = 0
            while j < 3:
                j = _kiln_plus(j, 1)
                continue
                j = _kiln_plus(j, 1)
            i = _kiln_plus(i, 1)
        ");
    }

    #[test]
    fn do_while_tests_after_the_body_and_before_continue() {
        let out = lower_text(
            "do {\n  f(i);\n  if (i > 5) {\n    continue;\n  }\n  g();\n} while (i < 3);",
            false,
        );
        insta::assert_snapshot!(out, @r"
        while True:
            f(i)
            if i > 5:
                if not (i < 3):
                    break
                continue
            g()
            if not (i < 3):
                break
        ");
    }

    #[test]
    fn one_line_do_while_and_bodiless_while() {
        assert_eq!(
            lower_text("do { f(); } while (ready());", false),
            "while True:\n    f()\n    if not (ready()):\n        break\n"
        );
        assert_eq!(lower_text("while (busy());", false), "while busy():\n    pass\n");
    }

    #[test]
    fn nested_break_leaves_only_the_switch() {
        let out = lower_text(
            "for (int i = 0; i < 3; i++) {\n  switch (i) {\n    case 1:\n      if (i > 0) {\n        break;\n      }\n      f();\n      break;\n    default:\n      g(i);\n  }\n}",
            false,
        );
        insta::assert_snapshot!(out, @r"
        for i in range(0, 3):
            __sw = i
            while True:
                if __sw == 1:
                    if i > 0:
                        break
                    f()
                else:
                    g(i)
                break
        ");
    }

    #[test]
    fn continue_inside_wrapped_switch_reaches_the_loop() {
        let out = lower_text(
            "while (more()) {\n  switch (k) {\n    case 2:\n      if (flag) {\n        break;\n      }\n      continue;\n    default:\n      f();\n  }\n  g();\n}",
            false,
        );
        insta::assert_snapshot!(out, @r"
        while more():
            __sw = k
            __sw_continue = False
            while True:
                if __sw == 2:
                    if flag:
                        break
                    __sw_continue = True
                    break
                else:
                    f()
                break
            if __sw_continue:
                continue
            g()
        ");
    }

    #[test]
    fn unknown_header_becomes_plain_block() {
        assert_eq!(lower_text("{\n  a();\n}", false), "if True:\n    a()\n");
    }

    #[test]
    fn empty_body_lowers_to_nothing() {
        assert_eq!(lower_text("   \n  ", false), "");
    }

    #[test]
    fn clauses_keep_empty_parts() {
        assert_eq!(split_clauses(";;"), ["", "", ""]);
        assert_eq!(split_clauses("int i = 0; i < n;"), ["int i = 0", " i < n", ""]);
    }
}
