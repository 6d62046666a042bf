//! Duplicate-stash analysis for one actor message handler.
//!
//! The pipeline runs in three stages, each in its own module:
//!
//! 1. [`extract`]: gate on the declaring type, then collect stash calls.
//! 2. [`group`]: bucket calls by branch-free block and merge buckets that can
//!    run on the same path.
//! 3. [`emit`]: one diagnostic per grouped call, skipping spans already
//!    reported through another entry point.
//!
//! Everything is recomputed per call; nothing survives between scopes except
//! the caller-owned [`ReportedSet`].

pub mod emit;
pub mod extract;
pub mod group;

#[cfg(test)]
pub(crate) mod testing;

use tracing::{debug, trace};

use crate::cancel::{CancellationToken, Cancelled};
use crate::diagnostics::Diagnostic;
use crate::oracle::Oracles;
use crate::syntax::{NodeId, SyntaxTree};

pub use emit::{ReportedSet, emit_diagnostics};
pub use extract::{SensitiveCall, extract_sensitive_calls};
pub use group::{ConflictGroup, group_conflicts};

/// Terminal state of one handler-scope analysis.
#[derive(Debug, Clone)]
pub enum ScopeOutcome {
    /// The declaring type is not an actor; nothing was scanned.
    Gated,
    /// Fewer than two stash calls were found.
    Scanned { calls: usize },
    /// Two or more stash calls were grouped. `diagnostics` holds only spans not
    /// previously in the caller's [`ReportedSet`].
    Grouped {
        groups: Vec<ConflictGroup>,
        diagnostics: Vec<Diagnostic>,
    },
}

impl ScopeOutcome {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            ScopeOutcome::Grouped { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        match self {
            ScopeOutcome::Grouped { diagnostics, .. } => diagnostics,
            _ => Vec::new(),
        }
    }

    pub fn state(&self) -> &'static str {
        match self {
            ScopeOutcome::Gated => "gated",
            ScopeOutcome::Scanned { .. } => "scanned",
            ScopeOutcome::Grouped { .. } => "grouped",
        }
    }
}

/// Analyze one handler scope (a method or nested function body).
///
/// Spans emitted here are added to `reported`, so sharing one set across
/// overlapping scopes reports every call once. On cancellation nothing is
/// emitted and `reported` is left untouched.
pub fn analyze_handler_scope(
    tree: &SyntaxTree,
    scope: NodeId,
    oracles: Oracles<'_>,
    cancel: &CancellationToken,
    reported: &mut ReportedSet,
) -> Result<ScopeOutcome, Cancelled> {
    cancel.check()?;

    if !extract::passes_gate(tree, scope, oracles.capabilities) {
        trace!(scope = scope.index(), "declaring type is not an actor");
        return Ok(ScopeOutcome::Gated);
    }

    let calls = extract_sensitive_calls(tree, scope, oracles, cancel)?;
    if calls.len() < 2 {
        return Ok(ScopeOutcome::Scanned { calls: calls.len() });
    }

    let groups = group_conflicts(tree, &calls, cancel)?;
    cancel.check()?;
    let diagnostics = emit_diagnostics(&groups, reported);

    debug!(
        scope = scope.index(),
        calls = calls.len(),
        groups = groups.len(),
        reported = diagnostics.len(),
        "analyzed handler scope"
    );
    Ok(ScopeOutcome::Grouped {
        groups,
        diagnostics,
    })
}

/// [`analyze_handler_scope`] with a fresh [`ReportedSet`].
pub fn analyze_scope(
    tree: &SyntaxTree,
    scope: NodeId,
    oracles: Oracles<'_>,
    cancel: &CancellationToken,
) -> Result<Vec<Diagnostic>, Cancelled> {
    let mut reported = ReportedSet::new();
    analyze_handler_scope(tree, scope, oracles, cancel, &mut reported)
        .map(ScopeOutcome::into_diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{Fixture, NamedOracle};
    use crate::cancel::CancellationSource;
    use crate::diagnostics::Span;

    fn spans(diags: &[Diagnostic]) -> Vec<Span> {
        diags.iter().map(|d| d.span).collect()
    }

    #[test]
    fn non_actor_scope_is_gated() {
        let mut fx = Fixture::plain("Shelf");
        let m = fx.method("Put");
        fx.stash();
        fx.stash();
        let tree = fx.finish();
        let oracle = NamedOracle::default();

        let outcome = analyze_handler_scope(
            &tree,
            m,
            oracle.oracles(),
            &CancellationToken::none(),
            &mut ReportedSet::new(),
        )
        .unwrap();
        assert!(matches!(outcome, ScopeOutcome::Gated));
        assert!(outcome.diagnostics().is_empty());
    }

    #[test]
    fn single_call_stops_after_scanning() {
        let mut fx = Fixture::actor("SingleActor");
        let m = fx.method("OnReceive");
        fx.stash();
        fx.call("Sender", "Tell");
        let tree = fx.finish();
        let oracle = NamedOracle::default();

        let outcome = analyze_handler_scope(
            &tree,
            m,
            oracle.oracles(),
            &CancellationToken::none(),
            &mut ReportedSet::new(),
        )
        .unwrap();
        assert!(matches!(outcome, ScopeOutcome::Scanned { calls: 1 }));
        assert_eq!(outcome.state(), "scanned");
    }

    #[test]
    fn exclusive_calls_group_without_diagnostics() {
        let mut fx = Fixture::actor("BranchActor");
        let m = fx.method("OnReceive");
        fx.branch();
        fx.arm();
        fx.stash();
        fx.close();
        fx.arm();
        fx.stash();
        let tree = fx.finish();
        let oracle = NamedOracle::default();

        let outcome = analyze_handler_scope(
            &tree,
            m,
            oracle.oracles(),
            &CancellationToken::none(),
            &mut ReportedSet::new(),
        )
        .unwrap();
        assert_eq!(outcome.state(), "grouped");
        assert!(outcome.diagnostics().is_empty());
    }

    #[test]
    fn rerunning_yields_identical_spans() {
        let mut fx = Fixture::actor("RepeatActor");
        let m = fx.method("OnReceive");
        fx.stash();
        fx.branch();
        fx.arm();
        fx.stash();
        let tree = fx.finish();
        let oracle = NamedOracle::default();
        let none = CancellationToken::none();

        let first = analyze_scope(&tree, m, oracle.oracles(), &none).unwrap();
        let second = analyze_scope(&tree, m, oracle.oracles(), &none).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(spans(&first), spans(&second));
    }

    #[test]
    fn overlapping_entry_points_report_once() {
        let mut fx = Fixture::actor("OverlapActor");
        let ctor = fx.method("OverlapActor");
        let lambda = fx.lambda();
        fx.stash();
        fx.stash();
        let tree = fx.finish();
        let oracle = NamedOracle::default();
        let none = CancellationToken::none();

        let mut reported = ReportedSet::new();
        let whole = analyze_handler_scope(&tree, ctor, oracle.oracles(), &none, &mut reported)
            .unwrap()
            .into_diagnostics();
        let nested = analyze_handler_scope(&tree, lambda, oracle.oracles(), &none, &mut reported)
            .unwrap();

        assert_eq!(whole.len(), 2);
        assert_eq!(nested.state(), "grouped");
        assert!(nested.diagnostics().is_empty());
    }

    #[test]
    fn cancelled_scope_reports_nothing() {
        let mut fx = Fixture::actor("CancelActor");
        let m = fx.method("OnReceive");
        fx.stash();
        fx.stash();
        let tree = fx.finish();
        let oracle = NamedOracle::default();

        let source = CancellationSource::new();
        source.cancel();
        let mut reported = ReportedSet::new();
        let result = analyze_handler_scope(&tree, m, oracle.oracles(), &source.token(), &mut reported);
        assert!(matches!(result, Err(Cancelled)));
        assert!(reported.is_empty());
    }
}
