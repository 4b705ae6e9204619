use std::path::PathBuf;

/// Errors raised by the reaction network generation core.
///
/// Every variant here corresponds to a "fatal" kind from the error handling
/// design: nothing in this enum is meant to be retried automatically, and
/// callers (the collator, the binary's `main`) are expected to abort the run
/// on receiving one.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    /// An internal decision-tree node had no predicate return `true` for the
    /// given input. This is a programming error in the supplied tree, not a
    /// property of any particular reaction.
    #[error("decision tree is not total: every predicate at node [{node}] returned false")]
    TreeTotalityViolation { node: String },

    /// The bucket store or reaction store could not be opened, queried, or
    /// written to.
    #[error("store I/O failure at {path}: {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A table name discovered in the bucket store's catalog was not a safe
    /// SQL identifier and the whole bucket was skipped.
    #[error("bucket table name {0:?} is not a safe identifier, skipping bucket")]
    MalformedBucketName(String),

    /// The report file could not be written to.
    #[error("report file I/O failure: {0}")]
    ReportIo(#[from] std::io::Error),

    /// A species id referenced by a reactant/product slot has no entry in the
    /// species store.
    #[error("species id {0} referenced by a reaction has no entry in the species store")]
    UnknownSpecies(i64),

    /// The reactant and product sides of a reaction did not conserve atoms,
    /// or a redox reaction's bond counts were not equal in cardinality. Both
    /// are corrupt-input conditions, not reaction-filtering decisions.
    #[error("invariant violated while mapping atoms for a reaction: {0}")]
    InvariantViolation(String),

    /// A worker thread panicked or returned an error while processing a
    /// bucket.
    #[error("worker {worker_id} failed: {source}")]
    WorkerFailed {
        worker_id: usize,
        #[source]
        source: Box<CoreError>,
    },

    /// The configuration file could not be parsed.
    #[error("failed to load configuration from {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<(PathBuf, rusqlite::Error)> for CoreError {
    fn from((path, source): (PathBuf, rusqlite::Error)) -> Self {
        CoreError::StoreIo { path, source }
    }
}
