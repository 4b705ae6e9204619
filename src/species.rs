use std::path::Path;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An undirected bond graph over local atom indices `0..atom_count`.
///
/// Edges are stored normalized (`a < b`) so membership checks don't need to
/// try both orderings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BondGraph {
    pub atom_count: usize,
    edges: FxHashSet<(usize, usize)>,
}

impl BondGraph {
    pub fn new(atom_count: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> BondGraph {
        let edges = edges
            .into_iter()
            .map(|(a, b)| if a < b { (a, b) } else { (b, a) })
            .collect();
        BondGraph { atom_count, edges }
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        if a < b {
            self.edges.contains(&(a, b))
        } else {
            self.edges.contains(&(b, a))
        }
    }

    pub fn bond_count(&self) -> usize {
        self.edges.len()
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.edges
            .iter()
            .filter(|&&(a, b)| a == atom || b == atom)
            .count()
    }

    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edges.iter().copied()
    }
}

/// A single molecular species. Immutable after load.
///
/// Invariant: `bond_graph`'s nodes are exactly `0..atom_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub species_id: i64,
    pub entry_id: String,
    pub atom_count: usize,
    pub free_energy: f64,
    pub bond_graph: BondGraph,
    /// Whether this species is a known electron donor/acceptor. Drives
    /// `redox_electron_count`'s classification — bond-count equality alone
    /// is true of most reactions that don't change connectivity at all
    /// (simple isomerizations included), so it can't be the classifier by
    /// itself; it's only meaningful once at least one side of the reaction
    /// is already known to participate in electron transfer.
    #[serde(default)]
    pub redox_active: bool,
}

/// Read-only indexable collection of molecule entries, keyed by species id.
///
/// The precomputation phases and molecule entry provider that populate this
/// are external collaborators; this trait is their contract
/// with the core.
pub trait SpeciesStore: Send + Sync {
    fn get(&self, species_id: i64) -> Option<&Species>;
    fn len(&self) -> usize;

    fn get_or_err(&self, species_id: i64) -> Result<&Species, CoreError> {
        self.get(species_id)
            .ok_or(CoreError::UnknownSpecies(species_id))
    }
}

/// An in-memory species store, indexed densely by `species_id`.
#[derive(Debug, Default, Clone)]
pub struct InMemorySpeciesStore {
    species: Vec<Species>,
}

impl InMemorySpeciesStore {
    pub fn new(species: Vec<Species>) -> InMemorySpeciesStore {
        InMemorySpeciesStore { species }
    }

    /// Loads species entries from a JSON file, one array of `Species`
    /// objects. This stands in for the molecule entry provider in
    /// environments where it isn't wired up as a live collaborator.
    pub fn load_json(path: &Path) -> Result<InMemorySpeciesStore, CoreError> {
        let data = std::fs::read_to_string(path).map_err(CoreError::ReportIo)?;
        let species: Vec<Species> =
            serde_json::from_str(&data).map_err(|err| CoreError::ConfigIo {
                path: path.to_owned(),
                source: Box::new(err),
            })?;
        Ok(InMemorySpeciesStore::new(species))
    }
}

impl SpeciesStore for InMemorySpeciesStore {
    fn get(&self, species_id: i64) -> Option<&Species> {
        if species_id < 0 {
            return None;
        }
        self.species
            .get(species_id as usize)
            .filter(|s| s.species_id == species_id)
    }

    fn len(&self) -> usize {
        self.species.len()
    }
}
