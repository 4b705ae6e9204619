mod atom_map;
mod bucket;
mod collator;
mod config;
mod engine;
mod error;
mod params;
mod predicates;
mod record;
mod report;
mod species;
mod store;
mod tree;
mod worker;

#[cfg(test)]
mod tests;

pub use atom_map::{compute_atom_map, AtomMap};
pub use bucket::{Bucket, BucketStore, PairSlot, NONE};
pub use config::Config;
pub use engine::run_core;
pub use error::CoreError;
pub use params::Params;
pub use predicates::{
    atom_mapper, dg_above_threshold, redox_electron_count, standard_filter_tree,
    standard_logging_tree,
};
pub use record::{FrozenReaction, ReactionRecord};
pub use report::ReportGenerator;
pub use species::{BondGraph, InMemorySpeciesStore, Species, SpeciesStore};
pub use store::ReactionStore;
pub use tree::{evaluate, Node, Predicate, Terminal, TraceStep};
