pub mod stash;

pub use stash::{DUPLICATE_STASH_CALL, DuplicateStashCallLint};

use crate::lint::LintRegistry;

/// Every built-in rule, in registration order.
pub fn build_registry() -> LintRegistry {
    LintRegistry::new().with_rule(DuplicateStashCallLint)
}
