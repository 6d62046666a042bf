//! Read-only symbol queries the analysis consumes but does not implement.
//!
//! Implementations must be safe to query concurrently and repeatedly; the
//! analysis never assumes exclusive access or caches answers across scopes.

use crate::syntax::{NodeId, SyntaxTree};

/// Answers whether a declared type belongs to the actor capability hierarchy.
pub trait CapabilityOracle: Send + Sync {
    fn is_capability_descendant(&self, type_name: &str) -> bool;
}

/// Fully resolved identity of a called operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationId {
    pub owner: String,
    pub name: String,
}

impl OperationId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// The stash operation exposed through an actor's `IStash` capability.
    pub fn stash() -> Self {
        Self::new(STASH_OWNER, STASH_OPERATION)
    }

    pub fn is_stash(&self) -> bool {
        self.owner == STASH_OWNER && self.name == STASH_OPERATION
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

pub const STASH_OWNER: &str = "IStash";
pub const STASH_OPERATION: &str = "Stash";

/// Outcome of resolving a call expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    Operation(OperationId),
    Unknown,
}

impl CallTarget {
    /// `Unknown` never counts as sensitive.
    pub fn is_stash(&self) -> bool {
        matches!(self, CallTarget::Operation(op) if op.is_stash())
    }
}

/// Resolves the operation a `Call` node invokes.
pub trait CallOracle: Send + Sync {
    fn resolve_call_target(&self, tree: &SyntaxTree, call: NodeId) -> CallTarget;
}

/// Both oracles, borrowed for one analysis.
#[derive(Clone, Copy)]
pub struct Oracles<'a> {
    pub capabilities: &'a dyn CapabilityOracle,
    pub calls: &'a dyn CallOracle,
}

impl<'a> Oracles<'a> {
    pub fn new(capabilities: &'a dyn CapabilityOracle, calls: &'a dyn CallOracle) -> Self {
        Self {
            capabilities,
            calls,
        }
    }
}

impl std::fmt::Debug for Oracles<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Oracles").finish_non_exhaustive()
    }
}
