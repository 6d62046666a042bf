//! Turns conflict groups into diagnostics, once per source span.

use std::collections::HashSet;

use crate::analysis::group::ConflictGroup;
use crate::diagnostics::{Diagnostic, Span};
use crate::level::LintLevel;
use crate::rules::stash::DUPLICATE_STASH_CALL;

/// Spans already reported while analyzing overlapping handler scopes.
#[derive(Debug, Default, Clone)]
pub struct ReportedSet {
    spans: HashSet<Span>,
}

impl ReportedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when `span` was already present.
    pub fn insert(&mut self, span: Span) -> bool {
        self.spans.insert(span)
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

const STASH_HELP: &str = "another stash call can run for the same message on a path through this call; stash once, or move the calls into mutually exclusive branches";

/// One error per member of every violating group, skipping spans in `reported`.
///
/// Output follows group order, then member order, so it is stable for a given input.
pub fn emit_diagnostics(groups: &[ConflictGroup], reported: &mut ReportedSet) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for group in groups.iter().filter(|g| g.is_violation()) {
        for call in &group.calls {
            if !reported.insert(call.span) {
                continue;
            }
            out.push(Diagnostic {
                lint: &DUPLICATE_STASH_CALL,
                level: LintLevel::Error,
                file: None,
                span: call.span,
                message: "`Stash()` must not be called more than once on the same execution path of a message handler".to_string(),
                help: Some(STASH_HELP.to_string()),
            });
        }
    }
    out
}
