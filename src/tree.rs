use std::fmt;
use std::sync::Arc;

use crate::error::CoreError;
use crate::params::Params;
use crate::record::ReactionRecord;
use crate::species::SpeciesStore;

/// The two leaves a decision tree can terminate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Keep,
    Discard,
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Keep => write!(f, "KEEP"),
            Terminal::Discard => write!(f, "DISCARD"),
        }
    }
}

type PredicateFn = dyn Fn(&mut ReactionRecord, &dyn SpeciesStore, &Params) -> bool + Send + Sync;

/// A named, callable predicate: `(record, species_store, params) -> bool`.
///
/// Predicates may mutate `record` (to cache `dG`, `rate`, or `atom_map`) but
/// must not mutate `species_store` or `params`. The name is
/// purely for tracing and report rendering; it plays no role in evaluation.
#[derive(Clone)]
pub struct Predicate {
    pub name: &'static str,
    func: Arc<PredicateFn>,
}

impl Predicate {
    pub fn new(
        name: &'static str,
        func: impl Fn(&mut ReactionRecord, &dyn SpeciesStore, &Params) -> bool + Send + Sync + 'static,
    ) -> Predicate {
        Predicate {
            name,
            func: Arc::new(func),
        }
    }

    fn call(&self, record: &mut ReactionRecord, species: &dyn SpeciesStore, params: &Params) -> bool {
        (self.func)(record, species, params)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("name", &self.name).finish()
    }
}

/// A node of the decision tree: either a non-empty ordered list of
/// `(predicate, child)` pairs, or a terminal.
///
/// Invariant: every `Internal` node must be total — for every input at
/// least one predicate must return `true`. This is enforced at evaluation
/// time, not at construction time, since totality is a property of the
/// predicates' runtime behavior.
#[derive(Debug, Clone)]
pub enum Node {
    Internal(Vec<(Predicate, Node)>),
    Terminal(Terminal),
}

/// One step of a recorded decision pathway: the predicate that matched, or
/// the terminal reached.
#[derive(Debug, Clone)]
pub enum TraceStep {
    Predicate(&'static str),
    Terminal(Terminal),
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceStep::Predicate(name) => write!(f, "{name}"),
            TraceStep::Terminal(terminal) => write!(f, "{terminal}"),
        }
    }
}

/// Traverses `tree` starting at the root: while the current node is a list,
/// scans predicates in order and follows the first one that returns `true`.
/// Reaching a terminal returns `Keep == true` / `Discard == false`.
/// Exhausting a list without any predicate returning `true` is a tree
/// totality violation. After every predicate call, checks whether it stashed
/// a fatal error on `record.failure` (an invariant violation or a corrupt
/// species lookup) and returns it immediately rather than continuing the
/// traversal.
pub fn evaluate(
    record: &mut ReactionRecord,
    species: &dyn SpeciesStore,
    params: &Params,
    tree: &Node,
    mut trace: Option<&mut Vec<TraceStep>>,
) -> Result<bool, CoreError> {
    let mut node = tree;
    loop {
        match node {
            Node::Internal(children) => {
                let mut next = None;
                for (predicate, child) in children {
                    let matched = predicate.call(record, species, params);
                    if let Some(err) = record.failure.take() {
                        return Err(err);
                    }
                    if matched {
                        if let Some(trace) = trace.as_deref_mut() {
                            trace.push(TraceStep::Predicate(predicate.name));
                        }
                        next = Some(child);
                        break;
                    }
                }
                match next {
                    Some(child) => node = child,
                    None => {
                        let names: Vec<&str> = children.iter().map(|(p, _)| p.name).collect();
                        return Err(CoreError::TreeTotalityViolation {
                            node: names.join(", "),
                        });
                    }
                }
            }
            Node::Terminal(terminal) => {
                if let Some(trace) = trace.as_deref_mut() {
                    trace.push(TraceStep::Terminal(*terminal));
                }
                return Ok(*terminal == Terminal::Keep);
            }
        }
    }
}
