//! Source rewriting for the Injector: lowers `domain::tree` insertions into
//! byte-range text edits over the original module text, so formatting and
//! TypeScript syntax outside the touched arguments are preserved verbatim.

use super::{for_each_call, member_callee, node_text, start_line};
use crate::domain::detector::is_remote_call;
use crate::domain::tree::{
    EnsureOutcome, ObjectLit, PropValue, ensure_path, pending_insertions, render_object,
};
use tree_sitter::{Node, Tree};

/// Property path from the options object down to the context object.
pub const CONTEXT_PATH: &[&str] = &["trpc", "context"];

/// Field holding the boundary record inside the context object.
pub const BOUNDARY_FIELD: &str = "__boundary";

/// Replace `start..end` with `text`. Insertions have `start == end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TextEdit {
    fn insert(at: usize, text: String) -> Self {
        Self {
            start: at,
            end: at,
            text,
        }
    }
}

/// Where new properties go inside an existing object literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectAnchor {
    at: usize,
    layout: Layout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// `{}`: insert right after the opening brace.
    Empty,
    /// `{ a, }`: insert after the trailing comma.
    TrailingComma,
    /// `{ a }`: insert after the last member.
    AfterLast,
}

impl ObjectAnchor {
    fn edit(&self, props: &[String]) -> TextEdit {
        let joined = props.join(", ");
        let text = match self.layout {
            Layout::Empty => format!(" {joined} "),
            Layout::TrailingComma => format!(" {joined},"),
            Layout::AfterLast => format!(", {joined}"),
        };
        TextEdit::insert(self.at, text)
    }
}

/// A stamped call: its 1-based line and the edits that stamp it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallStamp {
    pub line: u32,
    pub edits: Vec<TextEdit>,
}

fn is_comment(node: &Node<'_>) -> bool {
    node.kind() == "comment"
}

fn argument_nodes<'t>(arguments: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = arguments.walk();
    arguments
        .named_children(&mut cursor)
        .filter(|n| !is_comment(n))
        .collect()
}

fn property_key(key: &Node<'_>, source: &str) -> Option<String> {
    match key.kind() {
        "property_identifier" | "identifier" | "number" => {
            Some(node_text(key, source).to_string())
        }
        "string" => {
            let raw = node_text(key, source);
            Some(raw.trim_matches(|c| c == '"' || c == '\'').to_string())
        }
        _ => None,
    }
}

fn object_anchor(object: &Node<'_>) -> Option<ObjectAnchor> {
    let mut cursor = object.walk();
    let children: Vec<Node<'_>> = object
        .children(&mut cursor)
        .filter(|n| !is_comment(n))
        .collect();
    let close = children.last().filter(|n| n.kind() == "}")?;
    let open = children.first().filter(|n| n.kind() == "{")?;
    let before_close = children.len().checked_sub(2).map(|i| children[i])?;

    let anchor = if before_close.id() == open.id() {
        ObjectAnchor {
            at: open.end_byte(),
            layout: Layout::Empty,
        }
    } else if before_close.kind() == "," {
        ObjectAnchor {
            at: before_close.end_byte(),
            layout: Layout::TrailingComma,
        }
    } else {
        ObjectAnchor {
            at: before_close.end_byte(),
            layout: Layout::AfterLast,
        }
    };
    debug_assert!(anchor.at <= close.start_byte());
    Some(anchor)
}

/// Lift an `object` node into the parser-independent tree.
fn lift_object(object: &Node<'_>, source: &str) -> Option<ObjectLit<ObjectAnchor>> {
    let mut lit = ObjectLit::existing(object_anchor(object)?);
    let mut cursor = object.walk();
    for member in object.named_children(&mut cursor) {
        match member.kind() {
            "pair" => {
                let key = member
                    .child_by_field_name("key")
                    .and_then(|k| property_key(&k, source));
                let value = match member.child_by_field_name("value") {
                    Some(v) if v.kind() == "object" => match lift_object(&v, source) {
                        Some(child) => PropValue::Object(child),
                        None => PropValue::Opaque,
                    },
                    _ => PropValue::Opaque,
                };
                lit = lit.with_prop(key.as_deref(), value);
            }
            "shorthand_property_identifier" => {
                lit = lit.with_prop(Some(node_text(&member, source)), PropValue::Opaque);
            }
            "comment" => {}
            _ => lit = lit.with_prop(None, PropValue::Opaque),
        }
    }
    Some(lit)
}

fn lower(root: &ObjectLit<ObjectAnchor>) -> Vec<TextEdit> {
    pending_insertions(root)
        .into_iter()
        .map(|(anchor, props)| anchor.edit(&props))
        .collect()
}

fn fresh_options(leaf_expr: &str) -> String {
    let mut options: ObjectLit<ObjectAnchor> = ObjectLit::synthesized();
    ensure_path(&mut options, CONTEXT_PATH, BOUNDARY_FIELD, leaf_expr);
    render_object(&options)
}

/// Edits stamping one matched call, or `None` when the call cannot or need
/// not be stamped (non-literal options, or already stamped).
fn stamp_call(call: &Node<'_>, source: &str, leaf_expr: &str) -> Option<Vec<TextEdit>> {
    let arguments = call.child_by_field_name("arguments")?;
    if arguments.kind() != "arguments" {
        return None;
    }
    let args = argument_nodes(&arguments);

    match args.as_slice() {
        [] => {
            let close = arguments.end_byte().checked_sub(1)?;
            let text = format!("undefined, {}", fresh_options(leaf_expr));
            Some(vec![TextEdit::insert(close, text)])
        }
        [first] => {
            let text = format!(", {}", fresh_options(leaf_expr));
            Some(vec![TextEdit::insert(first.end_byte(), text)])
        }
        [_, second, ..] if second.kind() == "undefined"
            || (second.kind() == "identifier" && node_text(second, source) == "undefined") =>
        {
            Some(vec![TextEdit {
                start: second.start_byte(),
                end: second.end_byte(),
                text: fresh_options(leaf_expr),
            }])
        }
        [_, second, ..] if second.kind() == "object" => {
            let mut options = lift_object(second, source)?;
            match ensure_path(&mut options, CONTEXT_PATH, BOUNDARY_FIELD, leaf_expr) {
                EnsureOutcome::Inserted => Some(lower(&options)),
                EnsureOutcome::AlreadyPresent | EnsureOutcome::Blocked => None,
            }
        }
        _ => None,
    }
}

/// Plan stamps for every call whose callee passes the detector.
/// `leaf_for_line` renders the boundary literal for a call on a given line.
pub fn plan_stamps(tree: &Tree, source: &str, leaf_for_line: impl Fn(u32) -> String) -> Vec<CallStamp> {
    let mut stamps = Vec::new();
    for_each_call(tree.root_node(), |call| {
        let Some((property, receiver_is_member)) = member_callee(&call, source) else {
            return;
        };
        if !is_remote_call(property, receiver_is_member) {
            return;
        }
        let line = start_line(&call);
        if let Some(edits) = stamp_call(&call, source, &leaf_for_line(line)) {
            stamps.push(CallStamp { line, edits });
        }
    });
    stamps
}

/// Apply edits back to front. An edit overlapping one already applied is
/// dropped rather than corrupting the text.
pub fn apply_edits(source: &str, mut edits: Vec<TextEdit>) -> String {
    edits.sort_by(|a, b| (b.start, b.end).cmp(&(a.start, a.end)));
    let mut out = source.to_string();
    let mut floor = usize::MAX;
    for edit in edits {
        if edit.end > floor || edit.start > edit.end || edit.end > source.len() {
            continue;
        }
        out.replace_range(edit.start..edit.end, &edit.text);
        floor = edit.start;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::typescript::parse_module;

    fn stamp(src: &str) -> String {
        let tree = parse_module(src, "x.tsx").unwrap();
        let edits = plan_stamps(&tree, src, |line| format!("{{ line: {line} }}"))
            .into_iter()
            .flat_map(|s| s.edits)
            .collect();
        apply_edits(src, edits)
    }

    #[test]
    fn test_no_arguments() {
        assert_eq!(
            stamp("api.hello.useQuery();"),
            "api.hello.useQuery(undefined, { trpc: { context: { __boundary: { line: 1 } } } });"
        );
    }

    #[test]
    fn test_input_only() {
        assert_eq!(
            stamp("api.hello.query({ text: \"x\" });"),
            "api.hello.query({ text: \"x\" }, { trpc: { context: { __boundary: { line: 1 } } } });"
        );
    }

    #[test]
    fn test_undefined_placeholder_replaced() {
        assert_eq!(
            stamp("api.a.useQuery(undefined, undefined);"),
            "api.a.useQuery(undefined, { trpc: { context: { __boundary: { line: 1 } } } });"
        );
    }

    #[test]
    fn test_existing_options_extended() {
        assert_eq!(
            stamp("api.a.useQuery(1, { enabled: true });"),
            "api.a.useQuery(1, { enabled: true, trpc: { context: { __boundary: { line: 1 } } } });"
        );
        assert_eq!(
            stamp("api.a.useQuery(1, { enabled: true, });"),
            "api.a.useQuery(1, { enabled: true, trpc: { context: { __boundary: { line: 1 } } }, });"
        );
        assert_eq!(
            stamp("api.a.useQuery(1, {});"),
            "api.a.useQuery(1, { trpc: { context: { __boundary: { line: 1 } } } });"
        );
    }

    #[test]
    fn test_existing_context_extended() {
        assert_eq!(
            stamp("api.a.useQuery(1, { trpc: { context: { x: 1 } } });"),
            "api.a.useQuery(1, { trpc: { context: { x: 1, __boundary: { line: 1 } } } });"
        );
    }

    #[test]
    fn test_already_stamped_is_untouched() {
        let src = "api.a.useQuery(1, { trpc: { context: { __boundary: { line: 9 } } } });";
        assert_eq!(stamp(src), src);
    }

    #[test]
    fn test_non_literal_options_untouched() {
        let src = "api.a.useQuery(1, opts);";
        assert_eq!(stamp(src), src);
    }

    #[test]
    fn test_single_level_and_unknown_terminal_untouched() {
        let src = "client.query(); api.user.get();";
        assert_eq!(stamp(src), src);
    }

    #[test]
    fn test_receiver_with_call_or_index_stamped() {
        assert_eq!(
            stamp("trpc.useUtils().post.list.prefetch();"),
            "trpc.useUtils().post.list.prefetch(undefined, { trpc: { context: { __boundary: { line: 1 } } } });"
        );
        assert_eq!(
            stamp("api.post[\"byId\"].useQuery(1);"),
            "api.post[\"byId\"].useQuery(1, { trpc: { context: { __boundary: { line: 1 } } } });"
        );
    }

    #[test]
    fn test_nested_calls_both_stamped() {
        let out = stamp("api.a.query(\n  api.b.query()\n);");
        assert!(out.contains("api.b.query(undefined, { trpc: { context: { __boundary: { line: 2 } } } })"));
        assert!(out.ends_with(", { trpc: { context: { __boundary: { line: 1 } } } }\n);"));
        assert!(parse_module(&out, "x.tsx").is_ok());
    }

    #[test]
    fn test_apply_edits_drops_overlap() {
        let edits = vec![
            TextEdit { start: 0, end: 3, text: "X".into() },
            TextEdit { start: 1, end: 2, text: "Y".into() },
        ];
        assert_eq!(apply_edits("abcd", edits), "aYcd");
    }
}
