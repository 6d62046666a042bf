//! Locates the stash calls inside one handler scope.

use crate::cancel::{CancellationToken, Cancelled};
use crate::diagnostics::Span;
use crate::oracle::{CapabilityOracle, Oracles};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

/// A call the call oracle resolved to the stash operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensitiveCall {
    pub node: NodeId,
    pub span: Span,
    /// Innermost function-like body containing the call.
    pub function: NodeId,
    /// Innermost branch-free block containing the call.
    pub block: NodeId,
}

/// Name of the type that declares `scope`, if any.
pub fn declaring_type(tree: &SyntaxTree, scope: NodeId) -> Option<&str> {
    tree.enclosing_type(scope)
        .and_then(|ty| tree.type_name(ty))
}

/// True when `scope` is declared by a type in the actor capability hierarchy.
pub fn passes_gate(tree: &SyntaxTree, scope: NodeId, capabilities: &dyn CapabilityOracle) -> bool {
    declaring_type(tree, scope).is_some_and(|name| capabilities.is_capability_descendant(name))
}

/// Innermost `Block`, `Arm` or `Function` strictly enclosing `node`.
pub fn nearest_block(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    tree.ancestors(node)
        .find(|&a| tree.kind(a).is_branch_free_block())
}

/// Every stash call under `scope`, in source order.
///
/// Returns an empty list without traversing when the declaring type fails the
/// capability gate.
pub fn extract_sensitive_calls(
    tree: &SyntaxTree,
    scope: NodeId,
    oracles: Oracles<'_>,
    cancel: &CancellationToken,
) -> Result<Vec<SensitiveCall>, Cancelled> {
    if !passes_gate(tree, scope, oracles.capabilities) {
        return Ok(Vec::new());
    }

    let mut calls = Vec::new();
    for node in tree.descendants(scope) {
        cancel.check()?;

        if !matches!(tree.kind(node), NodeKind::Call { .. }) {
            continue;
        }
        if !oracles.calls.resolve_call_target(tree, node).is_stash() {
            continue;
        }

        calls.push(SensitiveCall {
            node,
            span: tree.span(node),
            function: tree.enclosing_function(node).unwrap_or(scope),
            block: nearest_block(tree, node).unwrap_or(scope),
        });
    }

    Ok(calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{Fixture, NamedOracle};
    use crate::cancel::CancellationSource;

    #[test]
    fn collects_only_resolved_stash_calls() {
        let mut fx = Fixture::actor("BufferingActor");
        let method = fx.method("OnReceive");
        fx.stash();
        fx.call("Sender", "Tell");
        fx.stash();
        let tree = fx.finish();

        let oracle = NamedOracle::default();
        let calls = extract_sensitive_calls(
            &tree,
            method,
            oracle.oracles(),
            &CancellationToken::none(),
        )
        .unwrap();

        assert_eq!(calls.len(), 2);
        assert!(calls[0].span < calls[1].span);
        assert!(calls.iter().all(|c| c.function == method));
    }

    #[test]
    fn non_actor_types_short_circuit() {
        let mut fx = Fixture::plain("Warehouse");
        let method = fx.method("Store");
        fx.stash();
        fx.stash();
        let tree = fx.finish();

        let oracle = NamedOracle::default();
        let calls = extract_sensitive_calls(
            &tree,
            method,
            oracle.oracles(),
            &CancellationToken::none(),
        )
        .unwrap();
        assert!(calls.is_empty());
        assert_eq!(oracle.resolutions(), 0);
    }

    #[test]
    fn unknown_targets_are_not_sensitive() {
        let mut fx = Fixture::actor("BufferingActor");
        let method = fx.method("OnReceive");
        fx.call("Unresolved", "Stash");
        fx.call("Unresolved", "Stash");
        let tree = fx.finish();

        let oracle = NamedOracle::default();
        let calls = extract_sensitive_calls(
            &tree,
            method,
            oracle.oracles(),
            &CancellationToken::none(),
        )
        .unwrap();
        assert!(calls.is_empty());
    }

    #[test]
    fn nearest_block_is_the_enclosing_arm() {
        let mut fx = Fixture::actor("BufferingActor");
        let method = fx.method("OnReceive");
        fx.branch();
        let arm = fx.arm();
        let call = fx.stash();
        let tree = fx.finish();

        assert_eq!(nearest_block(&tree, call), Some(arm));
        assert_eq!(tree.enclosing_function(call), Some(method));
    }

    #[test]
    fn observes_cancellation() {
        let mut fx = Fixture::actor("BufferingActor");
        let method = fx.method("OnReceive");
        fx.stash();
        let tree = fx.finish();

        let source = CancellationSource::new();
        source.cancel();
        let oracle = NamedOracle::default();
        let result = extract_sensitive_calls(&tree, method, oracle.oracles(), &source.token());
        assert_eq!(result, Err(Cancelled));
    }
}
