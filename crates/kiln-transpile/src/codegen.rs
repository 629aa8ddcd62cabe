//! Class codegen: Python classes, overload dispatchers, wrappers and launcher.

use crate::error::TranspileError;
use crate::extract::{ClassSpec, FieldSpec, MemberSpec};
use crate::ir::{Module, Stmt};
use crate::lower::{BodyContext, lower_body};
use crate::output::PRELUDE;
use crate::preprocess::SourcePos;
use crate::qualify::Scope;
use crate::scan::find_matching_paren;
use crate::translate::{declaration_value, map_exception_name, py_ident, zero_value};
use std::collections::{HashMap, HashSet};

/// Class preferred as the program entry when no entry class is requested.
const DEFAULT_ENTRY: &str = "Main";

/// Build the whole generated module.
pub fn generate(classes: &[ClassSpec], entry: Option<&str>) -> Result<Module, TranspileError> {
    let main = select_main(classes, entry)?;
    tracing::debug!(entry = %main.name, classes = classes.len(), "generating module");

    let mut body = Vec::new();
    for class in order_classes(classes) {
        body.push(class_block(class, classes));
        body.push(Stmt::Blank);
        body.push(Stmt::Blank);
    }

    let statics = static_initializers(classes);
    if !statics.is_empty() {
        body.extend(statics);
        body.push(Stmt::Blank);
        body.push(Stmt::Blank);
    }

    for wrapper in static_wrappers(classes) {
        body.push(wrapper);
        body.push(Stmt::Blank);
        body.push(Stmt::Blank);
    }

    body.push(launcher(main));
    Ok(Module {
        prelude: PRELUDE.trim_end().to_string(),
        body,
    })
}

/// The class whose static `main` starts the program.
fn select_main<'c>(
    classes: &'c [ClassSpec],
    entry: Option<&str>,
) -> Result<&'c ClassSpec, TranspileError> {
    if let Some(name) = entry {
        return classes
            .iter()
            .find(|c| c.name == name && c.has_static_main())
            .ok_or_else(|| TranspileError::EntryNotFound(name.to_string()));
    }
    classes
        .iter()
        .find(|c| c.name == DEFAULT_ENTRY && c.has_static_main())
        .or_else(|| classes.iter().find(|c| c.has_static_main()))
        .ok_or(TranspileError::NoMain)
}

/// Classes ordered so every known base precedes its subclasses.
///
/// Otherwise declaration order is kept. Classes caught in an inheritance
/// cycle are appended in declaration order.
fn order_classes(classes: &[ClassSpec]) -> Vec<&ClassSpec> {
    let known: HashSet<&str> = classes.iter().map(|c| c.name.as_str()).collect();
    let mut emitted: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::with_capacity(classes.len());
    let mut pending: Vec<&ClassSpec> = classes.iter().collect();
    while !pending.is_empty() {
        let before = pending.len();
        pending.retain(|&class| {
            let ready = match class.base.as_deref() {
                Some(base) => !known.contains(base) || emitted.contains(base),
                None => true,
            };
            if ready {
                emitted.insert(class.name.as_str());
                ordered.push(class);
            }
            !ready
        });
        if pending.len() == before {
            tracing::warn!(
                classes = ?pending.iter().map(|c| &c.name).collect::<Vec<_>>(),
                "inheritance cycle; emitting in declaration order"
            );
            ordered.append(&mut pending);
        }
    }
    ordered
}

fn member_origin(member: &MemberSpec) -> Option<SourcePos> {
    Some(SourcePos {
        path: member.path.clone(),
        line: member.line,
    })
}

fn field_value(field: &FieldSpec, scope: &Scope, instance: bool) -> String {
    let value = match field.init.as_deref() {
        Some(init) => declaration_value(&field.ty, field.is_array, Some(init)),
        None if field.is_array => "None".to_string(),
        None => zero_value(&field.ty).to_string(),
    };
    scope.qualify(&value, &HashSet::new(), instance)
}

fn class_block(class: &ClassSpec, classes: &[ClassSpec]) -> Stmt {
    let scope = Scope::for_class(class, classes);
    let header = match class.base.as_deref() {
        Some(base) => format!("class {}({})", class.name, map_exception_name(base)),
        None => format!("class {}", class.name),
    };

    let mut members: Vec<Vec<Stmt>> = Vec::new();
    members.push(constructors(class, &scope));
    let instance_names: HashSet<&str> =
        class.instance_methods.iter().map(|m| m.name.as_str()).collect();
    for (name, group) in group_by_name(&class.static_methods) {
        if instance_names.contains(name) {
            tracing::warn!(class = %class.name, method = name, "static and instance methods share a name; the instance method wins");
        }
        let entries = static_overloads(class, name, &group);
        members.push(methods(class, &scope, name, &entries, false));
    }
    for (name, _) in group_by_name(&class.instance_methods) {
        let entries = instance_overloads(class, classes, name, &mut HashSet::new());
        members.push(methods(class, &scope, name, &entries, true));
    }
    let has_to_string = class
        .instance_methods
        .iter()
        .any(|m| m.name == "toString" && m.params().is_empty());
    if has_to_string {
        members.push(vec![Stmt::block(
            "def __str__(self)",
            vec![Stmt::generated("return self.toString()")],
            None,
        )]);
    }

    let mut body = Vec::new();
    for (i, member) in members.into_iter().enumerate() {
        if i > 0 {
            body.push(Stmt::Blank);
        }
        body.extend(member);
    }
    Stmt::block(header, body, None)
}

/// Group members by name, keeping first-declaration order of names and
/// declaration order within each group.
fn group_by_name(members: &[MemberSpec]) -> Vec<(&str, Vec<&MemberSpec>)> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&MemberSpec>> = HashMap::new();
    for member in members {
        let name = member.name.as_str();
        if !groups.contains_key(name) {
            order.push(name);
        }
        groups.entry(name).or_default().push(member);
    }
    order
        .into_iter()
        .map(|name| (name, groups.remove(name).unwrap_or_default()))
        .collect()
}

fn python_params(member: &MemberSpec, instance: bool) -> (Vec<String>, String) {
    let names: Vec<String> = member
        .param_names()
        .iter()
        .map(|n| py_ident(n).into_owned())
        .collect();
    let mut list = Vec::with_capacity(names.len() + 1);
    if instance {
        list.push("self".to_string());
    }
    list.extend(names.iter().cloned());
    (names, list.join(", "))
}

/// One implementation of an overloaded name and the class that declares it.
#[derive(Debug, Clone)]
struct Overload<'c> {
    owner: &'c str,
    member: &'c MemberSpec,
    /// Attribute the implementation is emitted under in `owner`.
    variant: String,
}

impl Overload<'_> {
    /// Call forwarding a dispatcher's arguments to this implementation.
    fn call(&self, instance: bool) -> String {
        let receiver = if instance { "self, " } else { "" };
        format!("{}.{}({receiver}*args)", self.owner, self.variant)
    }
}

fn signature(member: &MemberSpec) -> Vec<(String, bool)> {
    member
        .params()
        .into_iter()
        .map(|p| (p.ty, p.is_array))
        .collect()
}

fn variant_name(name: &str, index: usize, single: bool) -> String {
    if single {
        name.to_string()
    } else {
        format!("{name}__ov{index}")
    }
}

fn static_overloads<'c>(class: &'c ClassSpec, name: &str, group: &[&'c MemberSpec]) -> Vec<Overload<'c>> {
    group
        .iter()
        .enumerate()
        .map(|(i, &member)| Overload {
            owner: &class.name,
            member,
            variant: variant_name(name, i, group.len() == 1),
        })
        .collect()
}

/// Instance overloads of `name` callable on `class`, ancestors' first.
///
/// A member whose signature matches an inherited one takes over its slot;
/// the rest are appended in declaration order.
fn instance_overloads<'c>(
    class: &'c ClassSpec,
    classes: &'c [ClassSpec],
    name: &str,
    seen: &mut HashSet<&'c str>,
) -> Vec<Overload<'c>> {
    if !seen.insert(&class.name) {
        return Vec::new();
    }
    let mut entries = class
        .base
        .as_deref()
        .and_then(|base| classes.iter().find(|c| c.name == base))
        .map(|base| instance_overloads(base, classes, name, seen))
        .unwrap_or_default();
    let mut own = 0;
    for member in class.instance_methods.iter().filter(|m| m.name == name) {
        let entry = Overload {
            owner: &class.name,
            member,
            variant: String::new(),
        };
        let sig = signature(member);
        match entries.iter().position(|e| signature(e.member) == sig) {
            Some(slot) => entries[slot] = entry,
            None => entries.push(entry),
        }
        own += 1;
    }
    if own == 0 {
        return entries;
    }
    let single = entries.len() == 1;
    for (i, entry) in entries
        .iter_mut()
        .filter(|e| e.owner == class.name)
        .enumerate()
    {
        entry.variant = variant_name(name, i, single);
    }
    entries
}

/// The class's own implementations of `name`, plus a dispatcher when more
/// than one overload is callable.
fn methods(
    class: &ClassSpec,
    scope: &Scope,
    name: &str,
    entries: &[Overload<'_>],
    instance: bool,
) -> Vec<Stmt> {
    let mut out = Vec::new();
    if let [single] = entries {
        emit_method(&mut out, scope, single.member, &single.variant, instance);
        return out;
    }
    tracing::debug!(class = %class.name, method = name, variants = entries.len(), "emitting overload dispatcher");
    for entry in entries.iter().filter(|e| e.owner == class.name) {
        emit_method(&mut out, scope, entry.member, &entry.variant, instance);
        out.push(Stmt::Blank);
    }
    let candidates: Vec<(&MemberSpec, String)> = entries
        .iter()
        .map(|e| (e.member, e.call(instance)))
        .collect();
    out.extend(dispatcher(
        name,
        &format!("{}.{name}", class.name),
        &candidates,
        instance,
    ));
    out
}

fn emit_method(out: &mut Vec<Stmt>, scope: &Scope, member: &MemberSpec, name: &str, instance: bool) {
    let (params, list) = python_params(member, instance);
    let ctx = BodyContext {
        scope,
        instance,
        path: &member.path,
    };
    let body = lower_body(&member.body, member.line, &params, ctx);
    if !instance {
        out.push(Stmt::line("@staticmethod", member_origin(member)));
    }
    out.push(Stmt::block(format!("def {name}({list})"), body, member_origin(member)));
}

/// A `*args` dispatcher trying each candidate in order.
///
/// Every candidate is a member and the call that runs it.
fn dispatcher(
    name: &str,
    display: &str,
    candidates: &[(&MemberSpec, String)],
    instance: bool,
) -> Vec<Stmt> {
    let mut body = Vec::new();
    for (member, call) in candidates {
        let params = member.params();
        let mut tests = vec![format!("len(args) == {}", params.len())];
        for (i, param) in params.iter().enumerate() {
            let is_array = if param.is_array { "True" } else { "False" };
            tests.push(format!("_kiln_accepts(args[{i}], '{}', {is_array})", param.ty));
        }
        body.push(Stmt::block(
            format!("if {}", tests.join(" and ")),
            vec![Stmt::generated(format!("return {call}"))],
            None,
        ));
    }
    body.push(Stmt::generated(format!(
        "raise TypeError('no matching overload for {display}')"
    )));
    let mut out = Vec::new();
    let header = if instance {
        format!("def {name}(self, *args)")
    } else {
        out.push(Stmt::generated("@staticmethod"));
        format!("def {name}(*args)")
    };
    out.push(Stmt::block(header, body, None));
    out
}

/// Offset just past a leading `super(...);` or `this(...);`, and whether it is `this`.
fn explicit_constructor_call(body: &str) -> Option<(usize, bool)> {
    let start = body.len() - body.trim_start().len();
    let rest = &body[start..];
    let (keyword, is_this) = if rest.starts_with("super") {
        ("super", false)
    } else if rest.starts_with("this") {
        ("this", true)
    } else {
        return None;
    };
    let after = &rest[keyword.len()..];
    let open = start + keyword.len() + (after.len() - after.trim_start().len());
    if body.as_bytes().get(open) != Some(&b'(') {
        return None;
    }
    let close = find_matching_paren(body, open)?;
    let tail = &body[close + 1..];
    let semi = tail.trim_start().strip_prefix(';')?;
    Some((body.len() - semi.len(), is_this))
}

fn field_defaults(class: &ClassSpec, scope: &Scope) -> Vec<Stmt> {
    class
        .fields
        .iter()
        .map(|f| Stmt::generated(format!("self.{} = {}", f.name, field_value(f, scope, true))))
        .collect()
}

/// Body of one constructor, including the base call and field defaults.
fn constructor_body(class: &ClassSpec, scope: &Scope, ctor: &MemberSpec) -> Vec<Stmt> {
    let (params, _) = python_params(ctor, true);
    let ctx = BodyContext {
        scope,
        instance: true,
        path: &ctor.path,
    };
    let mut body = Vec::new();
    let rest_line;
    let rest = match explicit_constructor_call(&ctor.body) {
        Some((end, is_this)) => {
            let head = &ctor.body[..end];
            body.extend(lower_body(head, ctor.line, &params, ctx));
            if !is_this {
                body.extend(field_defaults(class, scope));
            }
            rest_line = ctor.line + head.matches('\n').count();
            &ctor.body[end..]
        }
        None => {
            if class.base.is_some() && !ctor.body.contains("super(") {
                body.push(Stmt::generated("super().__init__()"));
            }
            body.extend(field_defaults(class, scope));
            rest_line = ctor.line;
            &ctor.body
        }
    };
    body.extend(lower_body(rest, rest_line, &params, ctx));
    body
}

fn constructors(class: &ClassSpec, scope: &Scope) -> Vec<Stmt> {
    match class.constructors.as_slice() {
        [] => {
            let mut body = Vec::new();
            if class.base.is_some() {
                body.push(Stmt::generated("super().__init__()"));
            }
            body.extend(field_defaults(class, scope));
            vec![Stmt::block("def __init__(self)", body, None)]
        }
        [ctor] => {
            let (_, list) = python_params(ctor, true);
            let body = constructor_body(class, scope, ctor);
            vec![Stmt::block(format!("def __init__({list})"), body, member_origin(ctor))]
        }
        ctors => {
            tracing::debug!(class = %class.name, variants = ctors.len(), "emitting constructor dispatcher");
            let mut out = Vec::new();
            let mut candidates = Vec::with_capacity(ctors.len());
            for (i, ctor) in ctors.iter().enumerate() {
                let variant = format!("_init__ov{i}");
                let (_, list) = python_params(ctor, true);
                let body = constructor_body(class, scope, ctor);
                out.push(Stmt::block(format!("def {variant}({list})"), body, member_origin(ctor)));
                out.push(Stmt::Blank);
                // Qualified so a subclass's variant of the same name is never picked.
                candidates.push((ctor, format!("{}.{variant}(self, *args)", class.name)));
            }
            out.extend(dispatcher(
                "__init__",
                &format!("{}.<init>", class.name),
                &candidates,
                true,
            ));
            out
        }
    }
}

/// `Class.field = value` for every static field, after all classes exist.
fn static_initializers(classes: &[ClassSpec]) -> Vec<Stmt> {
    let mut out = Vec::new();
    for class in classes {
        let scope = Scope::for_class(class, classes);
        for field in &class.static_fields {
            out.push(Stmt::generated(format!(
                "{}.{} = {}",
                class.name,
                field.name,
                field_value(field, &scope, false)
            )));
        }
    }
    out
}

/// Module-level functions forwarding to static methods, first declaring class wins.
fn static_wrappers(classes: &[ClassSpec]) -> Vec<Stmt> {
    let class_names: HashSet<&str> = classes.iter().map(|c| c.name.as_str()).collect();
    let mut owners: HashMap<&str, &str> = HashMap::new();
    let mut out = Vec::new();
    for class in classes {
        for method in &class.static_methods {
            let name = method.name.as_str();
            if py_ident(name) != name || class_names.contains(name) {
                tracing::debug!(method = name, "no module-level wrapper for reserved name");
                continue;
            }
            match owners.get(name) {
                Some(owner) if *owner == class.name => continue,
                Some(owner) => {
                    tracing::warn!(
                        method = name,
                        kept = owner,
                        skipped = %class.name,
                        "static method name declared in several classes; wrapper forwards to the first"
                    );
                    continue;
                }
                None => {}
            }
            owners.insert(name, class.name.as_str());
            out.push(Stmt::block(
                format!("def {name}(*args)"),
                vec![Stmt::generated(format!("return {}.{name}(*args)", class.name))],
                None,
            ));
        }
    }
    out
}

fn launcher(main: &ClassSpec) -> Stmt {
    let takes_args = main
        .static_methods
        .iter()
        .any(|m| m.name == "main" && !m.params().is_empty());
    let call = if takes_args {
        format!("{}.main(sys.argv[1:])", main.name)
    } else {
        format!("{}.main()", main.name)
    };
    Stmt::block("if __name__ == '__main__'", vec![Stmt::generated(call)], None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_classes;
    use crate::preprocess::normalize;

    fn classes(src: &str) -> Vec<ClassSpec> {
        extract_classes(&normalize(src)).unwrap()
    }

    #[test]
    fn bases_precede_subclasses() {
        let cs = classes("class B extends A {}\nclass C {}\nclass A {}\n");
        let names: Vec<_> = order_classes(&cs).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["C", "A", "B"]);
    }

    #[test]
    fn unknown_bases_do_not_block_ordering() {
        let cs = classes("class E extends RuntimeException {}\nclass D {}\n");
        let names: Vec<_> = order_classes(&cs).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["E", "D"]);
    }

    #[test]
    fn main_selection() {
        let cs = classes(
            "class App { static void main(String[] a) {} }\nclass Main { static void main(String[] a) {} }\n",
        );
        assert_eq!(select_main(&cs, None).unwrap().name, "Main");
        assert_eq!(select_main(&cs, Some("App")).unwrap().name, "App");
        assert!(matches!(
            select_main(&cs, Some("Nope")),
            Err(TranspileError::EntryNotFound(name)) if name == "Nope"
        ));
        let none = classes("class A { void main() {} }");
        assert!(matches!(select_main(&none, None), Err(TranspileError::NoMain)));
    }

    #[test]
    fn explicit_constructor_calls() {
        assert_eq!(explicit_constructor_call("\n  super(a, b);\n x = 1;"), Some((15, false)));
        assert_eq!(explicit_constructor_call(" this (1); "), Some((10, true)));
        assert_eq!(explicit_constructor_call(" superb(); "), None);
        assert_eq!(explicit_constructor_call(" x = 1; "), None);
    }

    fn overload_shape(entries: &[Overload<'_>]) -> Vec<(String, String, usize)> {
        entries
            .iter()
            .map(|e| (e.owner.to_string(), e.variant.clone(), e.member.params().len()))
            .collect()
    }

    #[test]
    fn overrides_take_the_inherited_slot() {
        let cs = classes(
            "class A { void f(int x) {} void f(String s) {} }\nclass B extends A { void f(String t) {} void f(int a, int b) {} }\n",
        );
        let entries = instance_overloads(&cs[1], &cs, "f", &mut HashSet::new());
        let shape: Vec<_> = entries.iter().map(|e| (e.owner, e.variant.as_str())).collect();
        assert_eq!(shape, [("A", "f__ov0"), ("B", "f__ov0"), ("B", "f__ov1")]);
        assert_eq!(entries[0].call(true), "A.f__ov0(self, *args)");
    }

    #[test]
    fn lone_override_keeps_the_plain_name() {
        let cs = classes("class A { int f(int x) {} }\nclass B extends A { int f(int y) {} }\n");
        let entries = instance_overloads(&cs[1], &cs, "f", &mut HashSet::new());
        assert_eq!(overload_shape(&entries), [("B".to_string(), "f".to_string(), 1)]);
    }

    #[test]
    fn inheritance_cycles_terminate() {
        let cs = classes("class A extends B { void f() {} }\nclass B extends A { void f(int x) {} }\n");
        let entries = instance_overloads(&cs[0], &cs, "f", &mut HashSet::new());
        let owners: Vec<_> = entries.iter().map(|e| e.owner).collect();
        assert_eq!(owners, ["B", "A"]);
    }

    #[test]
    fn groups_keep_declaration_order() {
        let cs = classes(
            "class A { void f(int x) {} void g() {} void f(String s) {} }",
        );
        let groups = group_by_name(&cs[0].instance_methods);
        let shape: Vec<_> = groups.iter().map(|(n, g)| (*n, g.len())).collect();
        assert_eq!(shape, [("f", 2), ("g", 1)]);
    }
}
