use std::cell::RefCell;
use std::rc::Rc;

use crate::atom_map::AtomMap;
use crate::bucket::{slot_multiplicity, PairSlot};
use crate::error::CoreError;

/// A reaction's mutable value object, threaded through decision-tree
/// traversal. Not `Send`: the one-shot atom-map cache shared
/// with its reverse counterpart is a plain `Rc<RefCell<_>>`, since a
/// forward/reverse pair never crosses a worker's thread boundary. Once a
/// traversal decides to keep the record it is turned into a [`FrozenReaction`]
/// before being handed to the collator.
#[derive(Debug)]
pub struct ReactionRecord {
    pub reactants: PairSlot,
    pub products: PairSlot,
    pub number_of_reactants: u8,
    pub number_of_products: u8,
    pub dG: f64,
    pub rate: f64,
    pub is_redox: bool,
    pub atom_map: Option<AtomMap>,
    /// Whether this record is the forward half of its pair. The atom-mapper
    /// predicate uses this to decide whether to compute the mapping or
    /// invert its sibling's.
    pub(crate) is_forward: bool,
    pair_cache: Rc<RefCell<Option<(bool, AtomMap)>>>,
    /// Set by a predicate that hit a fatal condition (an invariant violation,
    /// a corrupt species lookup) instead of panicking. `evaluate` checks and
    /// takes this after every predicate call and turns it into a real `Err`.
    pub(crate) failure: Option<CoreError>,
}

impl ReactionRecord {
    /// Builds a standalone record with a private (unshared) atom-map cache.
    /// Useful for tests and for evaluating a record outside of the
    /// forward/reverse pairing the worker normally does.
    pub fn new_single(reactants: PairSlot, products: PairSlot) -> ReactionRecord {
        ReactionRecord {
            reactants,
            products,
            number_of_reactants: slot_multiplicity(reactants),
            number_of_products: slot_multiplicity(products),
            dG: 0.0,
            rate: 0.0,
            is_redox: false,
            atom_map: None,
            is_forward: true,
            pair_cache: Rc::new(RefCell::new(None)),
            failure: None,
        }
    }

    /// Builds a forward reaction and its reverse, sharing the one-shot
    /// atom-map cache so the expensive mapping is computed at most once
    /// per pair.
    pub fn new_pair(reactants: PairSlot, products: PairSlot) -> (ReactionRecord, ReactionRecord) {
        let cache = Rc::new(RefCell::new(None));
        let forward = ReactionRecord {
            reactants,
            products,
            number_of_reactants: slot_multiplicity(reactants),
            number_of_products: slot_multiplicity(products),
            dG: 0.0,
            rate: 0.0,
            is_redox: false,
            atom_map: None,
            is_forward: true,
            pair_cache: cache.clone(),
            failure: None,
        };
        let reverse = ReactionRecord {
            reactants: products,
            products: reactants,
            number_of_reactants: slot_multiplicity(products),
            number_of_products: slot_multiplicity(reactants),
            dG: 0.0,
            rate: 0.0,
            is_redox: false,
            atom_map: None,
            is_forward: false,
            pair_cache: cache,
            failure: None,
        };
        (forward, reverse)
    }

    /// Reads the shared cache, returning the cached map oriented correctly
    /// for this side if the sibling has already computed it.
    pub(crate) fn cached_sibling_map(&self) -> Option<AtomMap> {
        let cache = self.pair_cache.borrow();
        cache.as_ref().and_then(|(is_forward, map)| {
            if *is_forward == self.is_forward {
                Some(map.clone())
            } else {
                Some(map.invert())
            }
        })
    }

    /// Records a freshly computed atom map in the shared cache.
    pub(crate) fn publish_atom_map(&self, map: AtomMap) {
        *self.pair_cache.borrow_mut() = Some((self.is_forward, map));
    }
}

/// A `Send`-safe snapshot of a kept reaction, suitable for crossing the
/// reaction channel to the collator.
#[derive(Debug, Clone, PartialEq)]
pub struct FrozenReaction {
    pub reactants: PairSlot,
    pub products: PairSlot,
    pub number_of_reactants: u8,
    pub number_of_products: u8,
    pub rate: f64,
    pub dG: f64,
}

impl From<&ReactionRecord> for FrozenReaction {
    fn from(record: &ReactionRecord) -> FrozenReaction {
        FrozenReaction {
            reactants: record.reactants,
            products: record.products,
            number_of_reactants: record.number_of_reactants,
            number_of_products: record.number_of_products,
            rate: record.rate,
            dG: record.dG,
        }
    }
}
