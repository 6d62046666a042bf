//! Core actor-clippy engine and lint registry.
//!
//! Sources are parsed with tree-sitter, lowered into an arena
//! [`syntax::SyntaxTree`], and checked by the registered rules against a pair
//! of oracles. By default the oracles come from [`semantic::SourceModel`];
//! hosts with a real compiler can supply their own through
//! [`LintEngine::lint_tree`].

pub mod analysis;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod level;
pub mod lint;
pub mod oracle;
pub mod parser;
pub mod rules;
pub mod semantic;
pub mod suppression;
pub mod syntax;
pub mod telemetry;

use std::path::Path;

use tracing::debug;

use crate::cancel::CancellationToken;
use crate::diagnostics::Diagnostic;
use crate::error::ClippyResult;
use crate::lint::{LintContext, LintRegistry, LintSettings};
use crate::oracle::{CallOracle, CapabilityOracle, Oracles};
use crate::semantic::{ActorSettings, SourceModel};
use crate::syntax::SyntaxTree;

/// Engine orchestrates linting by parsing source and running registered rules.
pub struct LintEngine {
    registry: LintRegistry,
    settings: LintSettings,
    actors: ActorSettings,
}

impl LintEngine {
    /// Create a new engine with default lint settings.
    pub fn new(registry: LintRegistry) -> Self {
        Self::new_with_settings(registry, LintSettings::default())
    }

    /// Create a new engine with explicit lint settings (e.g. from config).
    pub fn new_with_settings(registry: LintRegistry, settings: LintSettings) -> Self {
        Self {
            registry,
            settings,
            actors: ActorSettings::default(),
        }
    }

    /// Replace the framework names used by the built-in source model.
    #[must_use]
    pub fn with_actor_settings(mut self, actors: ActorSettings) -> Self {
        self.actors = actors;
        self
    }

    pub fn registry(&self) -> &LintRegistry {
        &self.registry
    }

    /// Lint a single in-memory source string and return diagnostics.
    pub fn lint_source(&self, source: &str) -> ClippyResult<Vec<Diagnostic>> {
        self.lint_source_with_cancel(source, &CancellationToken::none())
    }

    /// Like [`lint_source`](Self::lint_source), aborting with
    /// [`ActorClippyError::Cancelled`](crate::error::ActorClippyError::Cancelled)
    /// once `cancel` fires. A cancelled run returns no diagnostics.
    pub fn lint_source_with_cancel(
        &self,
        source: &str,
        cancel: &CancellationToken,
    ) -> ClippyResult<Vec<Diagnostic>> {
        let tree = crate::instrument_block!("parse", { parser::parse_snapshot(source) })?;
        let model = crate::instrument_block!("model", { SourceModel::build(&tree, &self.actors) });
        self.lint_tree(&tree, source, &model, &model, cancel)
    }

    /// Read and lint one file; diagnostics carry its path.
    pub fn lint_file(&self, path: &Path) -> ClippyResult<Vec<Diagnostic>> {
        let source = std::fs::read_to_string(path)?;
        let file = path.display().to_string();
        let mut diagnostics = self.lint_source(&source)?;
        for diagnostic in &mut diagnostics {
            diagnostic.file = Some(file.clone());
        }
        Ok(diagnostics)
    }

    /// Run the rules over a snapshot the caller already built, with caller-supplied oracles.
    pub fn lint_tree(
        &self,
        tree: &SyntaxTree,
        source: &str,
        capabilities: &dyn CapabilityOracle,
        calls: &dyn CallOracle,
        cancel: &CancellationToken,
    ) -> ClippyResult<Vec<Diagnostic>> {
        let oracles = Oracles::new(capabilities, calls);
        let mut ctx = LintContext::new(source, &self.settings, oracles, cancel);

        crate::instrument_block!("rules", {
            for rule in self.registry.rules() {
                if let Err(cancelled) = rule.check(tree, &mut ctx) {
                    debug!(lint = rule.descriptor().name, "lint run cancelled");
                    return Err(cancelled);
                }
            }
            Ok(())
        })?;
        cancel.check()?;

        let mut diagnostics = ctx.into_diagnostics();
        diagnostics.sort_by(|a, b| (a.span, a.lint.name).cmp(&(b.span, b.lint.name)));
        Ok(diagnostics)
    }
}

/// Construct a `LintEngine` with all built-in lints enabled.
pub fn create_default_engine() -> LintEngine {
    LintEngine::new(LintRegistry::default_rules())
}
