use crate::cancel::{CancellationToken, Cancelled};
use crate::diagnostics::Diagnostic;
use crate::level::LintLevel;
use crate::oracle::Oracles;
use crate::suppression::PragmaSuppressions;
use crate::syntax::SyntaxTree;
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};

// ============================================================================
// Lint Categories
// ============================================================================

/// High-level categories used to group lints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LintCategory {
    /// Code that is wrong at runtime: lost or overflowing messages, crashes.
    Correctness,
}

impl LintCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LintCategory::Correctness => "correctness",
        }
    }
}

/// Static metadata describing a lint rule.
#[derive(Debug)]
pub struct LintDescriptor {
    pub name: &'static str,
    /// Stable rule identifier, also accepted by `#pragma warning`.
    pub code: &'static str,
    pub category: LintCategory,
    pub description: &'static str,
    /// Level used when neither config nor CLI overrides it.
    pub default_level: LintLevel,
    /// Longer text for `explain`.
    pub explanation: &'static str,
}

impl LintDescriptor {
    /// Match by lint name or rule code; codes compare case-insensitively.
    pub fn matches(&self, name_or_code: &str) -> bool {
        self.name == name_or_code || self.code.eq_ignore_ascii_case(name_or_code)
    }
}

/// A single lint rule that can inspect a syntax snapshot.
pub trait LintRule: Send + Sync {
    fn descriptor(&self) -> &'static LintDescriptor;

    /// Report findings into `ctx`. Returns `Err(Cancelled)` as soon as the
    /// context's token is cancelled.
    fn check(&self, tree: &SyntaxTree, ctx: &mut LintContext<'_>) -> Result<(), Cancelled>;
}

/// Per-lint configuration derived from `actor-clippy.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintSettings {
    levels: HashMap<String, LintLevel>,
}

impl LintSettings {
    #[must_use]
    pub fn with_config_levels(mut self, levels: HashMap<String, LintLevel>) -> Self {
        for (name, level) in levels {
            let canonical = canonical_lint_name(&name).unwrap_or(name.as_str()).to_string();
            self.levels.insert(canonical, level);
        }
        self
    }

    #[must_use]
    pub fn disable(mut self, disabled: impl IntoIterator<Item = String>) -> Self {
        for name in disabled {
            let canonical = canonical_lint_name(&name).unwrap_or(name.as_str()).to_string();
            self.levels.insert(canonical, LintLevel::Allow);
        }
        self
    }

    pub fn level_for(&self, lint: &LintDescriptor) -> LintLevel {
        self.levels
            .get(lint.name)
            .copied()
            .unwrap_or(lint.default_level)
    }
}

/// Mutable context passed to lint rules while checking one snapshot.
pub struct LintContext<'a> {
    source: &'a str,
    settings: &'a LintSettings,
    oracles: Oracles<'a>,
    cancel: &'a CancellationToken,
    suppressions: PragmaSuppressions,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> LintContext<'a> {
    pub fn new(
        source: &'a str,
        settings: &'a LintSettings,
        oracles: Oracles<'a>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            source,
            settings,
            oracles,
            cancel,
            suppressions: PragmaSuppressions::parse(source),
            diagnostics: Vec::new(),
        }
    }

    /// Record a diagnostic, applying configured levels and `#pragma warning` suppression.
    pub fn report(&mut self, mut diagnostic: Diagnostic) {
        let level = self.settings.level_for(diagnostic.lint);
        if level == LintLevel::Allow {
            return;
        }
        if self
            .suppressions
            .is_suppressed(diagnostic.lint, diagnostic.span.start.row)
        {
            return;
        }

        diagnostic.level = level;
        self.diagnostics.push(diagnostic);
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn settings(&self) -> &LintSettings {
        self.settings
    }

    pub fn oracles(&self) -> Oracles<'a> {
        self.oracles
    }

    pub fn cancel(&self) -> &'a CancellationToken {
        self.cancel
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Resolve a lint name or rule code to the canonical lint name.
pub fn canonical_lint_name(name_or_code: &str) -> Option<&'static str> {
    LintRegistry::default_rules()
        .find_descriptor(name_or_code)
        .map(|d| d.name)
}

pub fn all_known_lints() -> HashSet<&'static str> {
    LintRegistry::default_rules()
        .descriptors()
        .flat_map(|d| [d.name, d.code])
        .collect()
}

/// Registry of lint rules run by the engine.
pub struct LintRegistry {
    rules: Vec<Box<dyn LintRule>>,
}

impl Default for LintRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LintRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl LintRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn LintRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static LintDescriptor> + '_ {
        self.rules.iter().map(|r| r.descriptor())
    }

    pub fn find_descriptor(&self, name_or_code: &str) -> Option<&'static LintDescriptor> {
        self.descriptors().find(|d| d.matches(name_or_code))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use = "registry should be used to create an engine"]
    pub fn default_rules() -> Self {
        crate::rules::build_registry()
    }

    /// Filter the default rules.
    ///
    /// # Errors
    ///
    /// Returns error if any lint name in `only`, `skip`, or `disabled` is unknown.
    pub fn default_rules_filtered(
        only: &[String],
        skip: &[String],
        disabled: &[String],
    ) -> Result<Self> {
        let all = Self::default_rules();

        for n in only.iter().chain(skip.iter()).chain(disabled.iter()) {
            if all.find_descriptor(n).is_none() {
                return Err(anyhow!("unknown lint: {n}"));
            }
        }

        let selected = |names: &[String], d: &LintDescriptor| names.iter().any(|n| d.matches(n));

        let mut reg = Self::new();
        for rule in all.rules {
            let descriptor = rule.descriptor();
            if !only.is_empty() && !selected(only, descriptor) {
                continue;
            }
            if selected(skip, descriptor) || selected(disabled, descriptor) {
                continue;
            }
            reg.rules.push(rule);
        }

        Ok(reg)
    }
}
