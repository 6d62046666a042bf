//! Hand-built snapshots and oracles for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::diagnostics::Span;
use crate::oracle::{CallOracle, CallTarget, CapabilityOracle, OperationId, Oracles};
use crate::syntax::{FunctionKind, NodeId, NodeKind, SyntaxTree, TreeBuilder};

/// Builds one type declaration; every node gets its own source row.
pub(crate) struct Fixture {
    builder: TreeBuilder,
    row: usize,
}

impl Fixture {
    fn with_bases(name: &str, bases: Vec<String>) -> Self {
        let mut builder = TreeBuilder::new(Span::new(1, 1, 999, 1));
        builder.open(
            NodeKind::TypeDecl {
                name: name.to_string(),
                bases,
            },
            Span::new(1, 1, 998, 2),
        );
        Self { builder, row: 1 }
    }

    /// Type names ending in `Actor` pass [`NamedOracle`]'s gate.
    pub(crate) fn actor(name: &str) -> Self {
        Self::with_bases(name, vec!["ReceiveActor".to_string()])
    }

    pub(crate) fn plain(name: &str) -> Self {
        Self::with_bases(name, Vec::new())
    }

    fn next_span(&mut self) -> Span {
        self.row += 1;
        Span::new(self.row, 9, self.row, 22)
    }

    /// Opens a method and its body block; returns the method.
    pub(crate) fn method(&mut self, name: &str) -> NodeId {
        let span = self.next_span();
        let id = self.builder.open(
            NodeKind::Function {
                kind: FunctionKind::Method,
                name: Some(name.to_string()),
            },
            span,
        );
        self.block();
        id
    }

    /// Opens a lambda and its body block; returns the lambda.
    pub(crate) fn lambda(&mut self) -> NodeId {
        let span = self.next_span();
        let id = self.builder.open(
            NodeKind::Function {
                kind: FunctionKind::Lambda,
                name: None,
            },
            span,
        );
        self.block();
        id
    }

    pub(crate) fn block(&mut self) -> NodeId {
        let span = self.next_span();
        self.builder.open(NodeKind::Block, span)
    }

    pub(crate) fn branch(&mut self) -> NodeId {
        let span = self.next_span();
        self.builder.open(NodeKind::Branch, span)
    }

    pub(crate) fn arm(&mut self) -> NodeId {
        let span = self.next_span();
        self.builder.open(NodeKind::Arm, span)
    }

    pub(crate) fn close(&mut self) {
        self.builder.close();
    }

    pub(crate) fn call(&mut self, receiver: &str, method: &str) -> NodeId {
        let span = self.next_span();
        self.builder.leaf(
            NodeKind::Call {
                receiver: Some(receiver.to_string()),
                method: method.to_string(),
            },
            span,
        )
    }

    pub(crate) fn stash(&mut self) -> NodeId {
        self.call("Stash", "Stash")
    }

    pub(crate) fn statement(&mut self) -> NodeId {
        let span = self.next_span();
        self.builder
            .leaf(NodeKind::Other("expression_statement"), span)
    }

    pub(crate) fn finish(self) -> SyntaxTree {
        self.builder.finish()
    }
}

/// Name-based oracles: `*Actor` types are actors, `Stash.Stash()` is the stash
/// operation, and receiver `Unresolved` cannot be resolved.
#[derive(Debug, Default)]
pub(crate) struct NamedOracle {
    resolutions: AtomicUsize,
}

impl NamedOracle {
    pub(crate) fn oracles(&self) -> Oracles<'_> {
        Oracles::new(self, self)
    }

    pub(crate) fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::Relaxed)
    }
}

impl CapabilityOracle for NamedOracle {
    fn is_capability_descendant(&self, type_name: &str) -> bool {
        type_name.ends_with("Actor")
    }
}

impl CallOracle for NamedOracle {
    fn resolve_call_target(&self, tree: &SyntaxTree, call: NodeId) -> CallTarget {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        match tree.kind(call) {
            NodeKind::Call {
                receiver: Some(receiver),
                ..
            } if receiver == "Unresolved" => CallTarget::Unknown,
            NodeKind::Call {
                receiver: Some(receiver),
                method,
            } if receiver == "Stash" && method == "Stash" => {
                CallTarget::Operation(OperationId::stash())
            }
            NodeKind::Call { receiver, method } => CallTarget::Operation(OperationId::new(
                receiver.clone().unwrap_or_default(),
                method.clone(),
            )),
            _ => CallTarget::Unknown,
        }
    }
}
