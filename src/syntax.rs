//! Read-only syntax snapshot the analysis runs over.
//!
//! A [`SyntaxTree`] is an arena: every node lives in one `Vec` and is addressed
//! by a [`NodeId`] that is only meaningful inside the tree that produced it.
//! Trees are immutable once built, so independent snapshots can be analyzed on
//! different threads without coordination.
//!
//! The node vocabulary is deliberately small. Hosts lower whatever concrete
//! syntax they have into these kinds:
//!
//! - `TypeDecl` for declarations whose members may be message handlers
//! - `Function` for anything with its own body (methods, lambdas, ...)
//! - `Block` for compound statements
//! - `Branch` for a conditional or switch construct, whose children are its `Arm`s
//! - `Call` for call expressions
//! - `Other` for everything else

use crate::diagnostics::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The syntactic form of a function-like body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Method,
    Constructor,
    LocalFunction,
    Lambda,
    AnonymousMethod,
}

impl FunctionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Method => "method",
            FunctionKind::Constructor => "constructor",
            FunctionKind::LocalFunction => "local function",
            FunctionKind::Lambda => "lambda",
            FunctionKind::AnonymousMethod => "anonymous method",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Unit,
    TypeDecl {
        name: String,
        bases: Vec<String>,
    },
    Function {
        kind: FunctionKind,
        name: Option<String>,
    },
    Block,
    Branch,
    Arm,
    Call {
        receiver: Option<String>,
        method: String,
    },
    Other(&'static str),
}

impl NodeKind {
    pub fn is_function(&self) -> bool {
        matches!(self, NodeKind::Function { .. })
    }

    /// Nodes that delimit a region without an internal conditional split.
    pub fn is_branch_free_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Block | NodeKind::Arm | NodeKind::Function { .. }
        )
    }

    pub fn label(&self) -> &str {
        match self {
            NodeKind::Unit => "unit",
            NodeKind::TypeDecl { .. } => "type",
            NodeKind::Function { kind, .. } => kind.as_str(),
            NodeKind::Block => "block",
            NodeKind::Branch => "branch",
            NodeKind::Arm => "arm",
            NodeKind::Call { .. } => "call",
            NodeKind::Other(kind) => *kind,
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Immutable arena of syntax nodes. Node `0` is always the root `Unit`.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Strict ancestors of `id`, innermost first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Strict descendants of `id` in pre-order, which is source order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// Innermost function-like node strictly enclosing `id`.
    pub fn enclosing_function(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|&a| self.kind(a).is_function())
    }

    /// Innermost type declaration enclosing `id`.
    pub fn enclosing_type(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&a| matches!(self.kind(a), NodeKind::TypeDecl { .. }))
    }

    pub fn type_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::TypeDecl { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Every node of the given predicate in source order, root included.
    pub fn find_all(&self, mut pred: impl FnMut(&NodeKind) -> bool) -> Vec<NodeId> {
        std::iter::once(self.root())
            .chain(self.descendants(self.root()))
            .filter(|&id| pred(self.kind(id)))
            .collect()
    }

    /// Indented outline of the tree, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(self.root(), 0, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, depth: usize, out: &mut String) {
        use std::fmt::Write;

        let detail = match self.kind(id) {
            NodeKind::TypeDecl { name, bases } if bases.is_empty() => format!(" {name}"),
            NodeKind::TypeDecl { name, bases } => format!(" {name} : {}", bases.join(", ")),
            NodeKind::Function { name: Some(name), .. } => format!(" {name}"),
            NodeKind::Call {
                receiver: Some(receiver),
                method,
            } => format!(" {receiver}.{method}()"),
            NodeKind::Call { method, .. } => format!(" {method}()"),
            _ => String::new(),
        };
        let _ = writeln!(
            out,
            "{}{}{} @ {}",
            "  ".repeat(depth),
            self.kind(id).label(),
            detail,
            self.span(id)
        );
        for &child in self.children(id) {
            self.render_into(child, depth + 1, out);
        }
    }
}

pub struct Ancestors<'t> {
    tree: &'t SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}

/// Incremental builder: `open` descends into a new child, `close` returns to its parent.
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new(span: Span) -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Unit,
                span,
                parent: None,
                children: Vec::new(),
            }],
            stack: vec![NodeId(0)],
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(NodeId(0))
    }

    fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let parent = self.current();
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            span,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn open(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = self.push(kind, span);
        self.stack.push(id);
        id
    }

    pub fn close(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn leaf(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.push(kind, span)
    }

    pub fn finish(self) -> SyntaxTree {
        SyntaxTree { nodes: self.nodes }
    }
}
