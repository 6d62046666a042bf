//! C# frontend: tree-sitter parse plus lowering into a [`SyntaxTree`].

use anyhow::{Context, Result};
use std::borrow::Cow;
use tree_sitter::{Language, Node, Parser, Tree};

use crate::diagnostics::Span;
use crate::error::{ActorClippyError, ClippyResult};
use crate::syntax::{FunctionKind, NodeKind, SyntaxTree, TreeBuilder};

fn csharp_language() -> Language {
    tree_sitter_c_sharp::language()
}

fn is_pragma_warning_line(line_trimmed: &[u8]) -> bool {
    let compact: Vec<u8> = line_trimmed
        .iter()
        .copied()
        .filter(|b| *b != b' ' && *b != b'\t')
        .collect();
    compact.starts_with(b"#pragmawarning")
}

/// Blank out `#pragma warning` lines while preserving byte length and newlines.
///
/// Suppression reads these directives from the original text; the grammar does
/// not need to see them, and keeping offsets intact keeps spans aligned.
fn mask_pragma_lines(source: &str) -> Cow<'_, str> {
    if !source.contains("#pragma") {
        return Cow::Borrowed(source);
    }

    let mut out = source.as_bytes().to_vec();
    let mut line_start = 0usize;
    for line in source.split_inclusive('\n') {
        let bytes = line.as_bytes();
        let content_end = line_start + line.trim_end_matches(['\r', '\n']).len();
        let indent = bytes
            .iter()
            .take_while(|b| **b == b' ' || **b == b'\t')
            .count();
        let trim = line_start + indent;

        if is_pragma_warning_line(&out[trim..content_end]) {
            for byte in out.iter_mut().take(content_end).skip(trim) {
                *byte = b' ';
            }
        }
        line_start += bytes.len();
    }

    match String::from_utf8(out) {
        Ok(s) => Cow::Owned(s),
        Err(_) => Cow::Borrowed(source),
    }
}

pub fn parse_source(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(csharp_language())
        .context("failed to load C# grammar")?;

    let masked = mask_pragma_lines(source);

    parser
        .parse(masked.as_ref(), None)
        .context("tree-sitter failed to parse source")
}

/// Parse `source` and lower it into an analysis snapshot.
pub fn parse_snapshot(source: &str) -> ClippyResult<SyntaxTree> {
    let tree = parse_source(source).map_err(|e| ActorClippyError::parse(format!("{e:#}")))?;
    Ok(lower(&tree, source))
}

/// Lower a parsed C# tree. `source` must be the text `tree` was parsed from.
pub fn lower(tree: &Tree, source: &str) -> SyntaxTree {
    let root = tree.root_node();
    let mut builder = TreeBuilder::new(Span::from_range(root.range()));
    lower_children(root, source, &mut builder);
    builder.finish()
}

fn text<'a>(source: &'a str, node: Node) -> &'a str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

fn simple_name(raw: &str) -> String {
    let name = raw.split('<').next().unwrap_or(raw);
    name.trim().trim_start_matches('@').to_string()
}

fn lower_children(node: Node, source: &str, b: &mut TreeBuilder) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        lower_node(child, source, b);
    }
}

/// Open `kind`, lower the children of `node` inside it, close.
fn wrap(node: Node, kind: NodeKind, source: &str, b: &mut TreeBuilder) {
    b.open(kind, Span::from_range(node.range()));
    lower_children(node, source, b);
    b.close();
}

fn lower_node(node: Node, source: &str, b: &mut TreeBuilder) {
    match node.kind() {
        "comment" => {}
        "class_declaration"
        | "struct_declaration"
        | "record_declaration"
        | "record_struct_declaration"
        | "interface_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| text(source, n).trim().to_string())
                .unwrap_or_default();
            let bases = base_types(node, source);
            wrap(node, NodeKind::TypeDecl { name, bases }, source, b);
        }
        "method_declaration" => wrap(node, function(node, FunctionKind::Method, source), source, b),
        "constructor_declaration" => {
            wrap(node, function(node, FunctionKind::Constructor, source), source, b)
        }
        "local_function_statement" => wrap(
            node,
            function(node, FunctionKind::LocalFunction, source),
            source,
            b,
        ),
        "lambda_expression" => wrap(
            node,
            NodeKind::Function {
                kind: FunctionKind::Lambda,
                name: None,
            },
            source,
            b,
        ),
        "anonymous_method_expression" => wrap(
            node,
            NodeKind::Function {
                kind: FunctionKind::AnonymousMethod,
                name: None,
            },
            source,
            b,
        ),
        "block" => wrap(node, NodeKind::Block, source, b),
        "if_statement" | "conditional_expression" => lower_conditional(node, source, b),
        "switch_statement" | "switch_expression" => lower_switch(node, source, b),
        "try_statement" => lower_try(node, source, b),
        "invocation_expression" => {
            let (receiver, method) = node
                .child_by_field_name("function")
                .map(|f| callee_parts(f, source))
                .unwrap_or((None, String::new()));
            wrap(node, NodeKind::Call { receiver, method }, source, b);
        }
        kind => wrap(node, NodeKind::Other(kind), source, b),
    }
}

fn function(node: Node, kind: FunctionKind, source: &str) -> NodeKind {
    NodeKind::Function {
        kind,
        name: node
            .child_by_field_name("name")
            .map(|n| text(source, n).trim().to_string()),
    }
}

fn base_types(node: Node, source: &str) -> Vec<String> {
    let mut cursor = node.walk();
    let Some(list) = node
        .named_children(&mut cursor)
        .find(|c| c.kind() == "base_list")
    else {
        return Vec::new();
    };

    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .map(|c| {
            // `record R(int X) : Base(X)` carries constructor arguments.
            let raw = text(source, c);
            raw.split('(').next().unwrap_or(raw).trim().to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// `(receiver text, method name)` for the callee expression of an invocation.
fn callee_parts(function: Node, source: &str) -> (Option<String>, String) {
    match function.kind() {
        "member_access_expression" => {
            let method = function
                .child_by_field_name("name")
                .map(|n| simple_name(text(source, n)))
                .unwrap_or_default();
            let receiver = function
                .child_by_field_name("expression")
                .map(|e| text(source, e).trim().to_string());
            (receiver, method)
        }
        "identifier" | "generic_name" => (None, simple_name(text(source, function))),
        _ => {
            let raw = text(source, function);
            let head = raw.split('<').next().unwrap_or(raw);
            match head.rfind('.') {
                Some(dot) => (
                    Some(raw[..dot].trim_end_matches('?').trim().to_string()),
                    simple_name(&raw[dot + 1..]),
                ),
                None => (None, simple_name(raw)),
            }
        }
    }
}

/// `if`/`else` and `?:`: the condition runs unconditionally, each outcome is an arm.
fn lower_conditional(node: Node, source: &str, b: &mut TreeBuilder) {
    if let Some(condition) = node.child_by_field_name("condition") {
        lower_node(condition, source, b);
    }

    b.open(NodeKind::Branch, Span::from_range(node.range()));
    for field in ["consequence", "alternative"] {
        if let Some(outcome) = node.child_by_field_name(field) {
            b.open(NodeKind::Arm, Span::from_range(outcome.range()));
            lower_node(outcome, source, b);
            b.close();
        }
    }
    b.close();
}

fn is_switch_arm(kind: &str) -> bool {
    matches!(kind, "switch_section" | "switch_expression_arm")
}

/// Switch statements and expressions: the governing value runs first, then
/// exactly one section or arm.
fn lower_switch(node: Node, source: &str, b: &mut TreeBuilder) {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();

    // Statement sections sit under `switch_body`; expression arms are direct children.
    let mut arms: Vec<Node> = Vec::new();
    for child in &children {
        if child.kind() == "switch_body" {
            let mut body_cursor = child.walk();
            arms.extend(
                child
                    .named_children(&mut body_cursor)
                    .filter(|c| is_switch_arm(c.kind())),
            );
        } else if is_switch_arm(child.kind()) {
            arms.push(*child);
        } else {
            lower_node(*child, source, b);
        }
    }

    b.open(NodeKind::Branch, Span::from_range(node.range()));
    for arm in arms {
        wrap(arm, NodeKind::Arm, source, b);
    }
    b.close();
}

/// The try block and `finally` stay unconditional; the catch clauses are arms of one branch.
fn lower_try(node: Node, source: &str, b: &mut TreeBuilder) {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();

    let mut i = 0;
    while i < children.len() {
        let child = children[i];
        if child.kind() != "catch_clause" {
            lower_node(child, source, b);
            i += 1;
            continue;
        }

        let first = child;
        let mut last = child;
        let start = i;
        while i < children.len() && children[i].kind() == "catch_clause" {
            last = children[i];
            i += 1;
        }

        let span = Span {
            start: Span::from_range(first.range()).start,
            end: Span::from_range(last.range()).end,
        };
        b.open(NodeKind::Branch, span);
        for catch in &children[start..i] {
            wrap(*catch, NodeKind::Arm, source, b);
        }
        b.close();
    }
}
