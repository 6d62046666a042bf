use tracing::{debug, trace};

use crate::analysis::{ReportedSet, analyze_handler_scope};
use crate::cancel::Cancelled;
use crate::level::LintLevel;
use crate::lint::{LintCategory, LintContext, LintDescriptor, LintRule};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

// ============================================================================
// DuplicateStashCallLint
// ============================================================================

pub struct DuplicateStashCallLint;

pub static DUPLICATE_STASH_CALL: LintDescriptor = LintDescriptor {
    name: "duplicate_stash_call",
    code: "AK1008",
    category: LintCategory::Correctness,
    description: "Stash() must not be called more than once on the same execution path of a message handler",
    default_level: LintLevel::Error,
    explanation: "\
An actor's stash holds at most one copy of the message currently being processed.
Calling Stash() twice while handling the same message throws at runtime, so every
unconditional path through a handler may stash at most once.

Calls in mutually exclusive branches (if/else arms, switch sections, catch clauses)
are fine. Calls in separate lambdas or local functions are treated as separate
handlers. Only types that derive from an actor base and implement a stash interface
are checked.",
};

impl LintRule for DuplicateStashCallLint {
    fn descriptor(&self) -> &'static LintDescriptor {
        &DUPLICATE_STASH_CALL
    }

    fn check(&self, tree: &SyntaxTree, ctx: &mut LintContext<'_>) -> Result<(), Cancelled> {
        let oracles = ctx.oracles();
        let cancel = ctx.cancel();

        for ty in tree.find_all(|k| matches!(k, NodeKind::TypeDecl { .. })) {
            cancel.check()?;

            let Some(name) = tree.type_name(ty) else {
                continue;
            };
            if !oracles.capabilities.is_capability_descendant(name) {
                trace!(type_name = name, "skipping non-actor type");
                continue;
            }

            // Handler entry points of one type overlap (a constructor and the
            // lambdas it registers), so they share one reported set.
            let mut reported = ReportedSet::new();
            for scope in handler_scopes(tree, ty) {
                let outcome = analyze_handler_scope(tree, scope, oracles, cancel, &mut reported)?;
                for diagnostic in outcome.into_diagnostics() {
                    ctx.report(diagnostic);
                }
            }

            debug!(type_name = name, reported = reported.len(), "checked actor type");
        }

        Ok(())
    }
}

/// Function-like nodes owned by `ty` itself, outer before inner.
fn handler_scopes(tree: &SyntaxTree, ty: NodeId) -> Vec<NodeId> {
    tree.descendants(ty)
        .filter(|&n| tree.kind(n).is_function() && tree.enclosing_type(n) == Some(ty))
        .collect()
}
