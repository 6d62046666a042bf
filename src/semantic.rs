//! Default oracles derived from the declarations in one snapshot.
//!
//! Without a compiler at hand the model only knows what the file declares: a
//! type is an actor when its base list reaches a known actor base, and it can
//! stash when its base list reaches a known stash interface. Anything it
//! cannot establish resolves to [`CallTarget::Unknown`], which the analysis
//! treats as "not a stash call".

use std::collections::{HashMap, HashSet, VecDeque};

use crate::oracle::{CallOracle, CallTarget, CapabilityOracle, OperationId, STASH_OPERATION};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

pub const DEFAULT_ACTOR_BASE_TYPES: &[&str] = &[
    "ActorBase",
    "UntypedActor",
    "ReceiveActor",
    "ReceivePersistentActor",
    "UntypedPersistentActor",
    "PersistentActor",
    "AtLeastOnceDeliveryActor",
    "AtLeastOnceDeliveryReceiveActor",
    "FSM",
];

pub const DEFAULT_STASH_INTERFACES: &[&str] = &[
    "IWithStash",
    "IWithUnboundedStash",
    "IWithBoundedStash",
    "IWithUnrestrictedStash",
];

pub const DEFAULT_STASH_RECEIVERS: &[&str] = &["Stash", "this.Stash"];

/// Names the model treats as framework roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorSettings {
    pub base_types: Vec<String>,
    pub stash_interfaces: Vec<String>,
    pub stash_receivers: Vec<String>,
}

impl Default for ActorSettings {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Self {
            base_types: owned(DEFAULT_ACTOR_BASE_TYPES),
            stash_interfaces: owned(DEFAULT_STASH_INTERFACES),
            stash_receivers: owned(DEFAULT_STASH_RECEIVERS),
        }
    }
}

impl ActorSettings {
    /// Adds names on top of the current lists, skipping duplicates.
    #[must_use]
    pub fn extend(
        mut self,
        base_types: &[String],
        stash_interfaces: &[String],
        stash_receivers: &[String],
    ) -> Self {
        fn merge(into: &mut Vec<String>, extra: &[String]) {
            for name in extra {
                if !into.contains(name) {
                    into.push(name.clone());
                }
            }
        }
        merge(&mut self.base_types, base_types);
        merge(&mut self.stash_interfaces, stash_interfaces);
        merge(&mut self.stash_receivers, stash_receivers);
        self
    }
}

/// Strip `global::`, namespace qualifiers, generic arguments and nullability.
pub fn normalize_type_name(raw: &str) -> String {
    let mut name = raw.trim();
    if let Some(rest) = name.strip_prefix("global::") {
        name = rest;
    }
    if let Some(open) = name.find('<') {
        name = &name[..open];
    }
    let name = name.trim_end_matches('?').trim();
    name.rsplit('.').next().unwrap_or(name).trim().to_string()
}

fn normalize_receiver(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Type hierarchy and stash receivers for one snapshot.
#[derive(Debug, Clone)]
pub struct SourceModel {
    bases: HashMap<String, Vec<String>>,
    actor_roots: HashSet<String>,
    stash_interfaces: HashSet<String>,
    stash_receivers: HashSet<String>,
}

impl SourceModel {
    pub fn build(tree: &SyntaxTree, settings: &ActorSettings) -> Self {
        let mut bases: HashMap<String, Vec<String>> = HashMap::new();
        for id in tree.find_all(|k| matches!(k, NodeKind::TypeDecl { .. })) {
            if let NodeKind::TypeDecl { name, bases: declared } = tree.kind(id) {
                // Partial declarations accumulate.
                bases
                    .entry(normalize_type_name(name))
                    .or_default()
                    .extend(declared.iter().map(|b| normalize_type_name(b)));
            }
        }

        Self {
            bases,
            actor_roots: settings
                .base_types
                .iter()
                .map(|s| normalize_type_name(s))
                .collect(),
            stash_interfaces: settings
                .stash_interfaces
                .iter()
                .map(|s| normalize_type_name(s))
                .collect(),
            stash_receivers: settings
                .stash_receivers
                .iter()
                .map(|s| normalize_receiver(s))
                .collect(),
        }
    }

    /// Breadth-first walk over declared base lists; tolerant of cycles.
    fn reaches(&self, type_name: &str, targets: &HashSet<String>) -> bool {
        let start = normalize_type_name(type_name);
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if targets.contains(&current) {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(parents) = self.bases.get(&current) {
                queue.extend(parents.iter().cloned());
            }
        }
        false
    }

    pub fn has_stash_capability(&self, type_name: &str) -> bool {
        self.reaches(type_name, &self.stash_interfaces)
    }

    fn enclosing_type_name<'t>(&self, tree: &'t SyntaxTree, node: NodeId) -> Option<&'t str> {
        tree.enclosing_type(node).and_then(|ty| tree.type_name(ty))
    }
}

impl CapabilityOracle for SourceModel {
    fn is_capability_descendant(&self, type_name: &str) -> bool {
        self.reaches(type_name, &self.actor_roots)
    }
}

impl CallOracle for SourceModel {
    fn resolve_call_target(&self, tree: &SyntaxTree, call: NodeId) -> CallTarget {
        let NodeKind::Call { receiver, method } = tree.kind(call) else {
            return CallTarget::Unknown;
        };

        let Some(receiver) = receiver else {
            // A bare call binds to a member of the enclosing type.
            return match self.enclosing_type_name(tree, call) {
                Some(owner) => CallTarget::Operation(OperationId::new(owner, method.clone())),
                None => CallTarget::Unknown,
            };
        };

        if method != STASH_OPERATION {
            return CallTarget::Operation(OperationId::new(receiver.clone(), method.clone()));
        }
        if !self.stash_receivers.contains(&normalize_receiver(receiver)) {
            return CallTarget::Unknown;
        }

        match self.enclosing_type_name(tree, call) {
            Some(owner) if self.has_stash_capability(owner) => {
                CallTarget::Operation(OperationId::stash())
            }
            _ => CallTarget::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Span;
    use crate::syntax::{FunctionKind, TreeBuilder};

    fn line(row: usize) -> Span {
        Span::new(row, 1, row, 20)
    }

    fn decl(b: &mut TreeBuilder, row: usize, name: &str, bases: &[&str]) {
        b.open(
            NodeKind::TypeDecl {
                name: name.to_string(),
                bases: bases.iter().map(|s| s.to_string()).collect(),
            },
            line(row),
        );
    }

    fn method_with_call(b: &mut TreeBuilder, row: usize, receiver: Option<&str>, method: &str) -> NodeId {
        b.open(
            NodeKind::Function {
                kind: FunctionKind::Method,
                name: Some("Handle".into()),
            },
            line(row),
        );
        let call = b.leaf(
            NodeKind::Call {
                receiver: receiver.map(str::to_string),
                method: method.to_string(),
            },
            line(row + 1),
        );
        b.close();
        call
    }

    #[test]
    fn normalizes_qualified_generic_names() {
        assert_eq!(normalize_type_name("global::Akka.Actor.ReceiveActor"), "ReceiveActor");
        assert_eq!(normalize_type_name("IWithStash<IUnboundedDequeBasedMessageQueueSemantics>"), "IWithStash");
        assert_eq!(normalize_type_name(" FSM<State, Data> "), "FSM");
        assert_eq!(normalize_type_name("Handler?"), "Handler");
    }

    #[test]
    fn indirect_descendants_are_actors() {
        let mut b = TreeBuilder::new(line(1));
        decl(&mut b, 1, "BaseWorker", &["ReceiveActor"]);
        b.close();
        decl(&mut b, 5, "Worker", &["BaseWorker", "IWithStash"]);
        b.close();
        decl(&mut b, 9, "Repository", &["IDisposable"]);
        b.close();
        let tree = b.finish();

        let model = SourceModel::build(&tree, &ActorSettings::default());
        assert!(model.is_capability_descendant("Worker"));
        assert!(model.is_capability_descendant("BaseWorker"));
        assert!(!model.is_capability_descendant("Repository"));
        assert!(!model.is_capability_descendant("Unknown"));
        assert!(model.has_stash_capability("Worker"));
        assert!(!model.has_stash_capability("BaseWorker"));
    }

    #[test]
    fn cyclic_bases_terminate() {
        let mut b = TreeBuilder::new(line(1));
        decl(&mut b, 1, "A", &["B"]);
        b.close();
        decl(&mut b, 3, "B", &["A"]);
        b.close();
        let tree = b.finish();

        let model = SourceModel::build(&tree, &ActorSettings::default());
        assert!(!model.is_capability_descendant("A"));
    }

    #[test]
    fn partial_declarations_merge_their_bases() {
        let mut b = TreeBuilder::new(line(1));
        decl(&mut b, 1, "Split", &["ReceiveActor"]);
        b.close();
        decl(&mut b, 4, "Split", &["IWithUnboundedStash"]);
        b.close();
        let tree = b.finish();

        let model = SourceModel::build(&tree, &ActorSettings::default());
        assert!(model.is_capability_descendant("Split"));
        assert!(model.has_stash_capability("Split"));
    }

    #[test]
    fn stash_resolves_only_on_stashing_actors() {
        let mut b = TreeBuilder::new(line(1));
        decl(&mut b, 1, "Stasher", &["ReceiveActor", "IWithStash"]);
        let member = method_with_call(&mut b, 2, Some("this.Stash"), "Stash");
        let bare = method_with_call(&mut b, 4, None, "Stash");
        let other = method_with_call(&mut b, 6, Some("Stash"), "UnstashAll");
        let foreign = method_with_call(&mut b, 8, Some("_buffer"), "Stash");
        b.close();
        decl(&mut b, 11, "Plain", &["ReceiveActor"]);
        let missing = method_with_call(&mut b, 12, Some("Stash"), "Stash");
        b.close();
        let tree = b.finish();

        let model = SourceModel::build(&tree, &ActorSettings::default());
        assert!(model.resolve_call_target(&tree, member).is_stash());
        assert_eq!(
            model.resolve_call_target(&tree, bare),
            CallTarget::Operation(OperationId::new("Stasher", "Stash"))
        );
        assert!(!model.resolve_call_target(&tree, other).is_stash());
        assert_eq!(model.resolve_call_target(&tree, foreign), CallTarget::Unknown);
        assert_eq!(model.resolve_call_target(&tree, missing), CallTarget::Unknown);
    }

    #[test]
    fn configured_receivers_and_bases_extend_defaults() {
        let mut b = TreeBuilder::new(line(1));
        decl(&mut b, 1, "Custom", &["CompanyActor", "IWithStash"]);
        let call = method_with_call(&mut b, 2, Some("_stash"), "Stash");
        b.close();
        let tree = b.finish();

        let settings = ActorSettings::default().extend(
            &["CompanyActor".to_string()],
            &[],
            &["_stash".to_string()],
        );
        let model = SourceModel::build(&tree, &settings);
        assert!(model.is_capability_descendant("Custom"));
        assert!(model.resolve_call_target(&tree, call).is_stash());
    }
}
