use std::thread;

use crossbeam_channel::{bounded, unbounded};

use crate::bucket::BucketStore;
use crate::config::Config;
use crate::error::CoreError;
use crate::report::ReportGenerator;
use crate::species::SpeciesStore;
use crate::store::ReactionStore;
use crate::tree::Node;
use crate::worker::run_worker;

/// Runs one complete reaction-network generation pass: discovers bucket
/// tables, fans them out to `config.number_of_processes` workers, and has a
/// single collator thread drain their output into the reaction store and
/// report file.
///
/// Returns the number of reactions written. A worker that returns a
/// [`CoreError`] (tree totality violation, invariant violation, or store
/// I/O failure surfaced through it) is fatal: `run_core` propagates the
/// first such error once every worker handle has been joined. A worker
/// thread that panics outright is logged and otherwise ignored — the run
/// completes with whatever the surviving workers produced.
pub fn run_core(
    config: &Config,
    species: &dyn SpeciesStore,
    filter_tree: &Node,
    logging_tree: &Node,
) -> Result<i64, CoreError> {
    let discovery = BucketStore::open(&config.bucket_db_path)?;
    let table_names = discovery.table_names()?;
    drop(discovery);

    let (bucket_tx, bucket_rx) = unbounded();
    for name in table_names {
        bucket_tx
            .send(name)
            .expect("bucket_queue receiver dropped before it was filled");
    }
    drop(bucket_tx);

    let (reaction_tx, reaction_rx) = bounded(4096);

    let mut store = ReactionStore::create(&config.reaction_db_path, config.commit_freq)?;
    let mut report = ReportGenerator::create(&config.report_path)?;

    let reaction_index = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(config.number_of_processes);
        for worker_id in 0..config.number_of_processes {
            let bucket_rx = bucket_rx.clone();
            let reaction_tx = reaction_tx.clone();
            let bucket_db_path = &config.bucket_db_path;
            let params = &config.params;
            handles.push(scope.spawn(move || {
                run_worker(
                    worker_id,
                    bucket_db_path,
                    &bucket_rx,
                    &reaction_tx,
                    species,
                    params,
                    filter_tree,
                    logging_tree,
                )
            }));
        }
        drop(reaction_tx);

        let reaction_index = crate::collator::run_collator(
            &reaction_rx,
            &handles,
            &mut store,
            &mut report,
            config.commit_freq,
            config.verbose,
        )?;

        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(err),
                Err(panic) => {
                    tracing::error!(?panic, "worker thread panicked; continuing with its siblings' output");
                }
            }
        }

        Ok::<i64, CoreError>(reaction_index)
    })?;

    store.write_metadata(
        species.len() as i64 + 1,
        reaction_index + 1,
        config.factor_zero,
        config.factor_two,
        config.factor_duplicate,
    )?;
    store.commit()?;
    store.close()?;
    report.finish()?;

    Ok(reaction_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::NONE;
    use crate::predicates::{standard_filter_tree, standard_logging_tree};
    use crate::species::{BondGraph, InMemorySpeciesStore, Species};
    use rusqlite::Connection;
    use tempfile::NamedTempFile;

    fn two_species() -> InMemorySpeciesStore {
        InMemorySpeciesStore::new(vec![
            Species {
                species_id: 0,
                entry_id: "A".into(),
                atom_count: 2,
                free_energy: -1.0,
                bond_graph: BondGraph::new(2, [(0, 1)]),
                redox_active: false,
            },
            Species {
                species_id: 1,
                entry_id: "B".into(),
                atom_count: 2,
                free_energy: -0.3,
                bond_graph: BondGraph::new(2, [(0, 1)]),
                redox_active: false,
            },
        ])
    }

    #[test]
    fn runs_end_to_end_over_a_single_bucket() {
        let bucket_file = NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(bucket_file.path()).unwrap();
            conn.execute("CREATE TABLE pairbucket (a INTEGER, b INTEGER)", [])
                .unwrap();
            conn.execute("INSERT INTO pairbucket VALUES (0, -1), (1, -1)", [])
                .unwrap();
        }

        let reaction_file = NamedTempFile::new().unwrap();
        std::fs::remove_file(reaction_file.path()).ok();
        let report_file = NamedTempFile::new().unwrap();

        let config = Config::builder()
            .bucket_db_path(bucket_file.path().to_owned())
            .reaction_db_path(reaction_file.path().to_owned())
            .report_path(report_file.path().to_owned())
            .number_of_processes(2)
            .build();

        let species = two_species();
        let filter_tree = standard_filter_tree(config.dg_threshold);
        let logging_tree = standard_logging_tree();

        let written = run_core(&config, &species, &filter_tree, &logging_tree).unwrap();
        assert_eq!(written, 1);

        let report_contents = std::fs::read_to_string(report_file.path()).unwrap();
        assert!(!report_contents.is_empty());
    }
}
