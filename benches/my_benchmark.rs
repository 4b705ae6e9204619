use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use tausplit::{
    evaluate, standard_filter_tree, standard_logging_tree, BondGraph, InMemorySpeciesStore,
    Params, ReactionRecord, Species, NONE,
};

fn species_chain(count: usize) -> InMemorySpeciesStore {
    InMemorySpeciesStore::new(
        (0..count)
            .map(|id| Species {
                species_id: id as i64,
                entry_id: format!("S{id}"),
                atom_count: 3,
                free_energy: (id as f64) * 0.01 - 1.0,
                bond_graph: BondGraph::new(3, [(0, 1), (1, 2)]),
                redox_active: false,
            })
            .collect(),
    )
}

fn criterion_benchmark(c: &mut Criterion) {
    let species = species_chain(64);
    let params = Params::default();
    let filter_tree = standard_filter_tree(0.5);
    let logging_tree = standard_logging_tree();

    c.bench_function("filter tree over a 64-species bucket's pairs", |b| {
        b.iter(|| {
            for reactant in 0..species.len() as i64 {
                for product in (reactant + 1)..species.len() as i64 {
                    let (mut forward, mut reverse) =
                        ReactionRecord::new_pair((reactant, NONE), (product, NONE));
                    black_box(
                        evaluate(&mut forward, &species, &params, &filter_tree, None).unwrap(),
                    );
                    black_box(
                        evaluate(&mut reverse, &species, &params, &filter_tree, None).unwrap(),
                    );
                }
            }
        })
    });

    c.bench_function("logging tree trace over a single reaction", |b| {
        b.iter(|| {
            let mut record = ReactionRecord::new_single((0, NONE), (1, NONE));
            let mut trace = Vec::new();
            black_box(
                evaluate(&mut record, &species, &params, &logging_tree, Some(&mut trace)).unwrap(),
            );
        })
    });
}

criterion_group! {
    name=benches; config=Criterion::default().sample_size(20); targets=criterion_benchmark
}
criterion_main!(benches);
