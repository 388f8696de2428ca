//! Tree-sitter backed TypeScript/TSX syntax adapter.

pub mod rewrite;

use crate::domain::call::CallSite;
use crate::domain::detector::split_callee;
use crate::domain::ports::CallSiteExtractor;
use anyhow::{Context, Result, anyhow, bail};
use std::path::Path;
use tree_sitter::{Language, Node, Parser, Tree};

/// TSX grammar for `.tsx`, plain TypeScript for everything else.
pub fn language_for(file: &str) -> Language {
    let is_tsx = Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tsx"));
    if is_tsx {
        tree_sitter_typescript::LANGUAGE_TSX.into()
    } else {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
    }
}

/// Parse a module. A tree containing syntax errors counts as a parse failure.
pub fn parse_module(source: &str, file: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&language_for(file))
        .context("Failed to load TypeScript grammar")?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("Parser produced no tree for {file}"))?;
    if tree.root_node().has_error() {
        bail!("Syntax errors in {file}");
    }
    Ok(tree)
}

pub(crate) fn node_text<'s>(node: &Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// 1-based line of the node's first character.
pub(crate) fn start_line(node: &Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}

/// Visit every `call_expression` in pre-order, i.e. in order of appearance,
/// outer calls before the calls nested in their arguments.
pub(crate) fn for_each_call<'t>(root: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.kind() == "call_expression" {
            visit(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

/// Dotted segments of a call's callee text, root first.
pub(crate) fn callee_chain(call: &Node<'_>, source: &str) -> Option<Vec<String>> {
    let callee = call.child_by_field_name("function")?;
    if !matches!(
        callee.kind(),
        "member_expression" | "identifier" | "non_null_expression"
    ) {
        return None;
    }
    split_callee(node_text(&callee, source))
}

/// Terminal name of a `receiver.name(...)` call and whether the receiver is
/// itself a property or index access. `None` for any other callee shape.
pub(crate) fn member_callee<'s>(call: &Node<'_>, source: &'s str) -> Option<(&'s str, bool)> {
    let callee = call.child_by_field_name("function")?;
    if callee.kind() != "member_expression" {
        return None;
    }
    let property = callee.child_by_field_name("property")?;
    if property.kind() != "property_identifier" {
        return None;
    }
    let mut receiver = callee.child_by_field_name("object")?;
    while receiver.kind() == "non_null_expression" {
        receiver = receiver.named_child(0)?;
    }
    let receiver_is_member = matches!(receiver.kind(), "member_expression" | "subscript_expression");
    Some((node_text(&property, source), receiver_is_member))
}

/// Call-site extractor over tree-sitter-typescript.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptExtractor;

impl TypeScriptExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl CallSiteExtractor for TypeScriptExtractor {
    fn call_sites(&self, source: &str, file: &str) -> Result<Vec<CallSite>> {
        let tree = parse_module(source, file)?;
        let mut sites = Vec::new();
        for_each_call(tree.root_node(), |call| {
            if let Some(chain) = callee_chain(&call, source) {
                sites.push(CallSite::new(chain, file, start_line(&call)));
            }
        });
        Ok(sites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_sites_in_source_order() {
        let src = r#"
const a = api.user.get.useQuery({ id: 1 });
function f() {
  return trpc.post.list.query(api.inner.query());
}
foo();
"#;
        let sites = TypeScriptExtractor.call_sites(src, "x.ts").unwrap();
        let chains: Vec<String> = sites.iter().map(|s| s.callee_chain.join(".")).collect();
        assert_eq!(
            chains,
            vec![
                "api.user.get.useQuery",
                "trpc.post.list.query",
                "api.inner.query",
                "foo"
            ]
        );
        assert_eq!(sites[0].line, 2);
        assert_eq!(sites[1].line, 4);
        assert_eq!(sites[0].terminal_method, "useQuery");
    }

    #[test]
    fn test_tsx_grammar_for_tsx_files() {
        let src = r#"'use client';
export function C() {
  const q = api.hello.useQuery({ text: "x" });
  return <div>{q.data}</div>;
}
"#;
        let sites = TypeScriptExtractor.call_sites(src, "C.tsx").unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].line, 3);
    }

    #[test]
    fn test_chains_through_calls_and_computed_access() {
        let src = "api.useUtils().post.list.invalidate();\napi.post[\"byId\"].useQuery();\n";
        let sites = TypeScriptExtractor.call_sites(src, "x.ts").unwrap();
        let chains: Vec<String> = sites.iter().map(|s| s.callee_chain.join("|")).collect();
        assert_eq!(
            chains,
            vec![
                "api|useUtils()|post|list|invalidate",
                "api|useUtils",
                "api|post[\"byId\"]|useQuery",
            ]
        );
        assert_eq!(sites[0].terminal_method, "invalidate");
        assert_eq!(sites[2].line, 2);
    }

    #[test]
    fn test_member_callee_shapes() {
        let src = "a.b.query(); x.query(); a.b().c.prefetch(); a[\"b\"].useQuery(); a.b[\"query\"](); f();";
        let tree = parse_module(src, "x.ts").unwrap();
        let mut seen = Vec::new();
        for_each_call(tree.root_node(), |call| seen.push(member_callee(&call, src)));
        assert_eq!(
            seen,
            vec![
                Some(("query", true)),
                Some(("query", false)),
                Some(("prefetch", true)),
                Some(("b", false)),
                Some(("useQuery", true)),
                None,
                None,
            ]
        );
    }

    #[test]
    fn test_optional_chain_and_generics() {
        let src = "api?.user.get.useQuery<Foo>();\n";
        let sites = TypeScriptExtractor.call_sites(src, "x.ts").unwrap();
        assert_eq!(sites[0].callee_chain, vec!["api", "user", "get", "useQuery"]);
    }

    #[test]
    fn test_syntax_error_is_parse_failure() {
        assert!(parse_module("const = = ;", "x.ts").is_err());
    }
}
