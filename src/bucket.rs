use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::CoreError;

/// Sentinel for "no species" in a pair slot's second position.
pub const NONE: i64 = -1;

/// An ordered pair of species ids, with `NONE` denoting an absent second
/// species on a unimolecular side.
pub type PairSlot = (i64, i64);

/// Counts the non-sentinel entries in a slot: 1 or 2.
pub fn slot_multiplicity(slot: PairSlot) -> u8 {
    let mut count = 0;
    if slot.0 != NONE {
        count += 1;
    }
    if slot.1 != NONE {
        count += 1;
    }
    count
}

/// A named group of species-pair slots sharing an atom-composition
/// signature — the unit of work handed to a single worker iteration.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    pub name: String,
    pub slots: Vec<PairSlot>,
}

/// A table name is only ever interpolated into a `SELECT * FROM <table>`
/// query (the bucket store's schema is one table per bucket, discovered at
/// runtime, so a prepared-statement parameter can't stand in for it). We
/// restrict it to a conservative identifier alphabet before interpolating,
/// rather than trusting the catalog blindly.
fn is_safe_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.chars().next().unwrap().is_ascii_digit()
}

/// Read-only handle onto the bucket store. Each worker opens its own
/// connection; calls for no cross-worker locking on this store.
pub struct BucketStore {
    conn: Connection,
    path: PathBuf,
}

impl BucketStore {
    pub fn open(path: &Path) -> Result<BucketStore, CoreError> {
        let conn = Connection::open(path)
            .map_err(|err| CoreError::from((path.to_owned(), err)))?;
        Ok(BucketStore {
            conn,
            path: path.to_owned(),
        })
    }

    /// Lists the bucket (table) names via the standard catalog query.
    pub fn table_names(&self) -> Result<Vec<String>, CoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
            .map_err(|err| CoreError::from((self.path.clone(), err)))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|err| CoreError::from((self.path.clone(), err)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| CoreError::from((self.path.clone(), err)))?;
        Ok(names)
    }

    /// Loads every row of a named bucket. Rows that don't contain exactly
    /// two integers are malformed and are skipped with a warning rather
    /// than aborting the whole bucket.
    pub fn load_bucket(&self, name: &str) -> Result<Bucket, CoreError> {
        if !is_safe_identifier(name) {
            return Err(CoreError::MalformedBucketName(name.to_owned()));
        }

        let query = format!("SELECT * FROM {name}");
        let mut stmt = self
            .conn
            .prepare(&query)
            .map_err(|err| CoreError::from((self.path.clone(), err)))?;

        let rows = stmt
            .query_map([], |row| {
                let a: i64 = row.get(0)?;
                let b: i64 = row.get(1)?;
                Ok((a, b))
            })
            .map_err(|err| CoreError::from((self.path.clone(), err)))?;

        let mut slots = Vec::new();
        for row in rows {
            match row {
                Ok(slot) => slots.push(slot),
                Err(err) => {
                    tracing::warn!(bucket = name, error = %err, "skipping malformed bucket row");
                }
            }
        }

        Ok(Bucket {
            name: name.to_owned(),
            slots,
        })
    }
}
