use crate::atom_map::compute_atom_map;
use crate::bucket::NONE;
use crate::error::CoreError;
use crate::params::{Params, K_B, PLANCK};
use crate::record::ReactionRecord;
use crate::species::SpeciesStore;
use crate::tree::{Node, Predicate, Terminal};

/// The default rate law: diffusion-limited above barrier,
/// Arrhenius-scaled below.
pub fn default_rate(d_g: f64, params: &Params) -> f64 {
    let k_t = K_B * params.temperature;
    let r_max = k_t / PLANCK;
    if d_g < 0.0 {
        r_max
    } else {
        r_max * (-d_g / k_t).exp()
    }
}

/// Runs a predicate body that can fail, stashing any error on `record.failure`
/// for `tree::evaluate` to pick up instead of panicking. A predicate's
/// contract is `-> bool`, so a failed body always reports `false` — the
/// stashed error takes precedence over that value at the call site.
fn run_fallible(
    record: &mut ReactionRecord,
    body: impl FnOnce(&mut ReactionRecord) -> Result<bool, CoreError>,
) -> bool {
    match body(record) {
        Ok(matched) => matched,
        Err(err) => {
            record.failure = Some(err);
            false
        }
    }
}

fn free_energy_of(
    slot: (i64, i64),
    species: &dyn SpeciesStore,
) -> Result<f64, CoreError> {
    let mut total = 0.0;
    for &id in &[slot.0, slot.1] {
        if id != NONE {
            total += species.get(id).ok_or(CoreError::UnknownSpecies(id))?.free_energy;
        }
    }
    Ok(total)
}

/// `dG_above_threshold(T)`: computes `dG` and returns `true` (discard) when
/// it exceeds `threshold`. On the `false` path it caches `dG` and the
/// derived `rate` onto the record. When a preceding
/// `redox_electron_count` predicate has already flagged the reaction as
/// redox, `params.electron_free_energy` is folded in before the threshold
/// test.
pub fn dg_above_threshold(threshold: f64) -> Predicate {
    Predicate::new("dG_above_threshold", move |record, species, params| {
        run_fallible(record, |record| {
            let mut d_g =
                free_energy_of(record.products, species)? - free_energy_of(record.reactants, species)?;
            if record.is_redox {
                d_g += params.electron_free_energy;
            }
            if d_g > threshold {
                Ok(true)
            } else {
                record.dG = d_g;
                record.rate = default_rate(d_g, params);
                Ok(false)
            }
        })
    })
}

/// Always-true terminator, the standard tree's final catch-all.
pub fn default_true() -> Predicate {
    Predicate::new("default_true", |_, _, _| true)
}

/// Computes `atom_map` at most once per forward/reverse pair. Always
/// returns `false`: it exists purely for its side effect, and must run
/// ahead of any predicate in the same tree that inspects `atom_map`.
pub fn atom_mapper() -> Predicate {
    Predicate::new("atom_mapper", |record, species, _params| {
        run_fallible(record, |record| {
            if record.atom_map.is_some() {
                return Ok(false);
            }
            if let Some(map) = record.cached_sibling_map() {
                record.atom_map = Some(map);
                return Ok(false);
            }
            let map = compute_atom_map(record.reactants, record.products, species)?;
            record.publish_atom_map(map.clone());
            record.atom_map = Some(map);
            Ok(false)
        })
    })
}

/// Asserts the invariant redox reactions carry: the reactant bond set and
/// product bond set must have equal cardinality. Fatal on mismatch — a
/// worker reporting 5 bonds on one side and 6 on the other aborts the run.
fn assert_redox_bond_conservation(
    reactant_bonds: usize,
    product_bonds: usize,
) -> Result<(), CoreError> {
    if reactant_bonds == product_bonds {
        Ok(())
    } else {
        Err(CoreError::InvariantViolation(format!(
            "redox reaction bond count mismatch: reactants have {reactant_bonds} bonds but products have {product_bonds}"
        )))
    }
}

/// Classifies a reaction as redox and asserts the bond-conservation
/// invariant redox reactions carry. Bond-count equality on
/// its own is true of most reactions that don't change connectivity at all
/// (a plain isomerization included), so it can't be the classifier by
/// itself — classification keys off `Species::redox_active`, the domain
/// fact that a species is a known electron donor/acceptor, and the bond
/// count comparison is only the invariant check once that's established.
/// `reaction_gen.py`'s `params` dict carries `electron_free_energy` but the
/// retrieved source never wires a consumer for it — this predicate and the
/// electron term it enables in `dG_above_threshold` are that consumer.
/// Always returns `false`: it runs purely for its side effect, ahead of
/// `dG_above_threshold` in the standard tree.
pub fn redox_electron_count() -> Predicate {
    Predicate::new("redox_electron_count", |record, species, _params| {
        run_fallible(record, |record| {
            let is_redox = any_redox_active(record.reactants, species)?
                || any_redox_active(record.products, species)?;
            if is_redox {
                let reactant_bonds = bond_count_of(record.reactants, species)?;
                let product_bonds = bond_count_of(record.products, species)?;
                assert_redox_bond_conservation(reactant_bonds, product_bonds)?;
            }
            record.is_redox = is_redox;
            Ok(false)
        })
    })
}

fn any_redox_active(slot: (i64, i64), species: &dyn SpeciesStore) -> Result<bool, CoreError> {
    for &id in &[slot.0, slot.1] {
        if id != NONE && species.get(id).ok_or(CoreError::UnknownSpecies(id))?.redox_active {
            return Ok(true);
        }
    }
    Ok(false)
}

fn bond_count_of(slot: (i64, i64), species: &dyn SpeciesStore) -> Result<usize, CoreError> {
    let mut total = 0;
    for &id in &[slot.0, slot.1] {
        if id != NONE {
            total += species.get(id).ok_or(CoreError::UnknownSpecies(id))?.bond_graph.bond_count();
        }
    }
    Ok(total)
}

/// The standard filter tree: run the atom mapper and the
/// redox classifier for their caching side effects, discard anything whose
/// `dG` exceeds `threshold`, and keep everything else.
pub fn standard_filter_tree(threshold: f64) -> Node {
    Node::Internal(vec![
        (redox_electron_count(), Node::Terminal(Terminal::Discard)),
        (atom_mapper(), Node::Terminal(Terminal::Discard)),
        (dg_above_threshold(threshold), Node::Terminal(Terminal::Discard)),
        (default_true(), Node::Terminal(Terminal::Keep)),
    ])
}

/// The standard logging tree: independent of the
/// filter tree, it keeps every reaction it's asked to evaluate so the audit
/// trail reflects everything a worker looked at, not just what got kept.
pub fn standard_logging_tree() -> Node {
    Node::Internal(vec![(default_true(), Node::Terminal(Terminal::Keep))])
}
