use std::time::Duration;

use crossbeam_channel::Receiver;

use crate::error::CoreError;
use crate::report::ReportGenerator;
use crate::store::ReactionStore;
use crate::worker::WorkerMessage;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Abstracts over `std::thread::JoinHandle` and the scoped handle
/// `std::thread::scope` returns, so the collator's liveness poll works
/// against either without engine.rs needing to unify the two types.
pub trait WorkerHandle {
    fn is_finished(&self) -> bool;
}

impl WorkerHandle for std::thread::JoinHandle<Result<(), CoreError>> {
    fn is_finished(&self) -> bool {
        std::thread::JoinHandle::is_finished(self)
    }
}

impl<'scope> WorkerHandle for std::thread::ScopedJoinHandle<'scope, Result<(), CoreError>> {
    fn is_finished(&self) -> bool {
        std::thread::ScopedJoinHandle::is_finished(self)
    }
}

/// The sole writer of both the reaction store and the report file.
/// Drains `reaction_tx`'s receiving half until every
/// worker handle is finished *and* the channel reports empty — the same
/// double-check the worker applies to `bucket_queue`, since a worker can
/// still be mid-send when its `JoinHandle` is polled.
///
/// Returns the number of reactions written, for the metadata row's
/// `reaction_index + 1`. When `verbose` is set, logs a progress line every
/// `commit_freq` reactions, on the same cadence the reaction store commits.
pub fn run_collator<H: WorkerHandle>(
    reaction_rx: &Receiver<WorkerMessage>,
    worker_handles: &[H],
    store: &mut ReactionStore,
    report: &mut ReportGenerator,
    commit_freq: u64,
    verbose: bool,
) -> Result<i64, CoreError> {
    let mut reaction_index: i64 = 0;

    loop {
        match reaction_rx.recv_timeout(POLL_INTERVAL) {
            Ok(message) => {
                handle_message(message, &mut reaction_index, store, report, commit_freq, verbose)?;
            }
            Err(_timeout_or_disconnect) => {
                let workers_done = worker_handles.iter().all(|handle| handle.is_finished());
                if workers_done && reaction_rx.is_empty() {
                    break;
                }
            }
        }
    }

    // Drain whatever arrived between the last recv and the final check.
    while let Ok(message) = reaction_rx.try_recv() {
        handle_message(message, &mut reaction_index, store, report, commit_freq, verbose)?;
    }

    Ok(reaction_index)
}

fn handle_message(
    message: WorkerMessage,
    reaction_index: &mut i64,
    store: &mut ReactionStore,
    report: &mut ReportGenerator,
    commit_freq: u64,
    verbose: bool,
) -> Result<(), CoreError> {
    match message {
        WorkerMessage::Reaction(worker_reaction) => {
            store.insert_reaction(*reaction_index, &worker_reaction.reaction)?;
            *reaction_index += 1;
            report.emit_trace(&worker_reaction.trace)?;
            report.emit_reaction(&worker_reaction.reaction)?;
            report.emit_newline()?;

            if verbose && *reaction_index as u64 % commit_freq.max(1) == 0 {
                tracing::info!(reactions_written = *reaction_index, "collator commit boundary");
            }
        }
        WorkerMessage::LogOnly(trace) => {
            report.emit_trace(&trace)?;
            report.emit_newline()?;
        }
    }
    Ok(())
}
