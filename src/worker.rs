use std::path::Path;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use itertools::Itertools;

use crate::bucket::BucketStore;
use crate::error::CoreError;
use crate::params::Params;
use crate::record::{FrozenReaction, ReactionRecord};
use crate::species::SpeciesStore;
use crate::tree::{evaluate, Node, TraceStep};

/// How long a worker waits on an empty `bucket_queue` before re-checking
/// whether it's actually drained. `crossbeam_channel`'s emptiness, like the
/// Python `multiprocessing.Queue` it replaces, isn't linearizable with a
/// concurrent producer closing the channel mid-check, so a single `is_empty`
/// read isn't trusted on its own.
const DRAIN_RECHECK: Duration = Duration::from_millis(20);

/// A kept reaction paired with the logging tree's trace over the same
/// record, bound for the collator.
pub struct WorkerReaction {
    pub reaction: FrozenReaction,
    pub trace: Vec<TraceStep>,
}

/// One worker's unit of output, sent over `reaction_channel`.
pub enum WorkerMessage {
    Reaction(WorkerReaction),
    /// A reaction the filter tree discarded, but which the logging tree
    /// still wants recorded — sent so the report reflects every reaction a
    /// worker considered, not only the ones kept.
    LogOnly(Vec<TraceStep>),
}

/// Pulls bucket names off `bucket_queue` until it's drained, and for each
/// one enumerates every unordered pair of slots, evaluates both the
/// forward and reverse reaction against `filter_tree`, and forwards kept
/// reactions (and every logging-tree trace) to the collator.
///
/// A worker never writes to the reaction store directly and never talks to
/// another worker.
pub fn run_worker(
    worker_id: usize,
    bucket_db_path: &Path,
    bucket_queue: &Receiver<String>,
    reaction_tx: &Sender<WorkerMessage>,
    species: &dyn SpeciesStore,
    params: &Params,
    filter_tree: &Node,
    logging_tree: &Node,
) -> Result<(), CoreError> {
    tracing::info!(worker_id, "worker starting");
    let store = BucketStore::open(bucket_db_path)?;

    loop {
        let table = match bucket_queue.recv_timeout(DRAIN_RECHECK) {
            Ok(table) => table,
            Err(RecvTimeoutError::Timeout) => {
                if bucket_queue.is_empty() {
                    break;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let bucket = match store.load_bucket(&table) {
            Ok(bucket) => bucket,
            Err(CoreError::MalformedBucketName(name)) => {
                tracing::warn!(bucket = %name, "skipping malformed bucket name");
                continue;
            }
            Err(err) => return Err(err),
        };

        for (slot_a, slot_b) in bucket.slots.iter().copied().tuple_combinations() {
            let (mut forward, mut reverse) = ReactionRecord::new_pair(slot_a, slot_b);

            process_side(&mut forward, species, params, filter_tree, logging_tree, reaction_tx)
                .map_err(|source| CoreError::WorkerFailed {
                    worker_id,
                    source: Box::new(source),
                })?;
            process_side(&mut reverse, species, params, filter_tree, logging_tree, reaction_tx)
                .map_err(|source| CoreError::WorkerFailed {
                    worker_id,
                    source: Box::new(source),
                })?;
        }
    }

    tracing::info!(worker_id, "worker finished");
    Ok(())
}

fn process_side(
    record: &mut ReactionRecord,
    species: &dyn SpeciesStore,
    params: &Params,
    filter_tree: &Node,
    logging_tree: &Node,
    reaction_tx: &Sender<WorkerMessage>,
) -> Result<(), CoreError> {
    let kept = evaluate(record, species, params, filter_tree, None)?;

    let mut trace = Vec::new();
    evaluate(record, species, params, logging_tree, Some(&mut trace))?;

    if kept {
        let message = WorkerMessage::Reaction(WorkerReaction {
            reaction: FrozenReaction::from(&*record),
            trace,
        });
        let _ = reaction_tx.send(message);
    } else {
        let _ = reaction_tx.send(WorkerMessage::LogOnly(trace));
    }

    Ok(())
}
