use rustc_hash::FxHashMap;

use crate::error::CoreError;
use crate::species::BondGraph;

/// A single atom's address within a reaction side: which slot (0 or 1 of the
/// reactant or product pair) it came from, and its local index within that
/// species.
pub type AtomAddr = (u8, usize);

/// A bijection from every atom of the reactant side to every atom of the
/// product side of a reaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AtomMap {
    forward: FxHashMap<AtomAddr, AtomAddr>,
}

impl AtomMap {
    fn new(forward: FxHashMap<AtomAddr, AtomAddr>) -> AtomMap {
        AtomMap { forward }
    }

    pub fn get(&self, addr: AtomAddr) -> Option<AtomAddr> {
        self.forward.get(&addr).copied()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Derives the mapping for the reverse reaction without recomputing the
    /// isomorphism: the reverse's reactants are the forward's products and
    /// vice versa, so the reverse atom map is exactly the inverse relation.
    pub fn invert(&self) -> AtomMap {
        AtomMap::new(self.forward.iter().map(|(&k, &v)| (v, k)).collect())
    }
}

/// One side (reactant or product) of a reaction, as a flat list of atoms
/// tagged with their originating slot.
struct Side {
    /// `atoms[i] = (slot, local_atom_index)`.
    atoms: Vec<(u8, usize)>,
    graphs: [Option<BondGraph>; 2],
}

impl Side {
    fn degree(&self, i: usize) -> usize {
        let (slot, atom) = self.atoms[i];
        self.graphs[slot as usize]
            .as_ref()
            .map(|g| g.degree(atom))
            .unwrap_or(0)
    }
}

fn build_side(
    slot: (i64, i64),
    species: &dyn crate::species::SpeciesStore,
) -> Result<Side, CoreError> {
    let mut atoms = Vec::new();
    let mut graphs: [Option<BondGraph>; 2] = [None, None];
    for (slot_idx, &id) in [slot.0, slot.1].iter().enumerate() {
        if id == crate::bucket::NONE {
            continue;
        }
        let entry = species.get_or_err(id)?;
        for local_atom in 0..entry.atom_count {
            atoms.push((slot_idx as u8, local_atom));
        }
        graphs[slot_idx] = Some(entry.bond_graph.clone());
    }
    Ok(Side { atoms, graphs })
}

/// Computes the atom map between a reaction's reactant union and product
/// union of bond graphs.
///
/// Bonds are not generally preserved across a reaction (that's what makes it
/// a reaction rather than a no-op), so this isn't a strict graph
/// isomorphism: it's a degree-bucketed alignment that prefers to pair atoms
/// of equal connectivity, and falls back to pairing whatever's left once
/// the degree buckets on each side disagree — which only happens for the
/// atoms actually participating in bond breaking/forming. The only hard
/// requirement is that the result is a total bijection; that holds as soon
/// as atom counts conserve, which is checked up front.
pub fn compute_atom_map(
    reactants: (i64, i64),
    products: (i64, i64),
    species: &dyn crate::species::SpeciesStore,
) -> Result<AtomMap, CoreError> {
    let left = build_side(reactants, species)?;
    let right = build_side(products, species)?;

    if left.atoms.len() != right.atoms.len() {
        return Err(CoreError::InvariantViolation(format!(
            "reactant side has {} atoms but product side has {}",
            left.atoms.len(),
            right.atoms.len()
        )));
    }
    let n = left.atoms.len();

    let mut left_by_degree: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for i in 0..n {
        left_by_degree.entry(left.degree(i)).or_default().push(i);
    }
    let mut right_by_degree: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for i in 0..n {
        right_by_degree.entry(right.degree(i)).or_default().push(i);
    }

    let mut degrees: Vec<usize> = left_by_degree.keys().copied().collect();
    degrees.sort_unstable_by(|a, b| b.cmp(a));

    let mut forward = FxHashMap::default();
    let mut used_right = vec![false; n];
    let mut unmatched_left = Vec::new();

    for degree in degrees {
        let lefts = left_by_degree.remove(&degree).unwrap_or_default();
        let rights = right_by_degree.remove(&degree).unwrap_or_default();
        let paired = lefts.len().min(rights.len());
        for k in 0..paired {
            forward.insert(left.atoms[lefts[k]], right.atoms[rights[k]]);
            used_right[rights[k]] = true;
        }
        unmatched_left.extend_from_slice(&lefts[paired..]);
    }

    let leftover_rights: Vec<usize> = (0..n).filter(|&r| !used_right[r]).collect();
    debug_assert_eq!(unmatched_left.len(), leftover_rights.len());
    for (left_idx, right_idx) in unmatched_left.into_iter().zip(leftover_rights) {
        forward.insert(left.atoms[left_idx], right.atoms[right_idx]);
    }

    Ok(AtomMap::new(forward))
}
