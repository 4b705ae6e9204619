use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use crate::error::CoreError;
use crate::record::FrozenReaction;

const CREATE_METADATA_TABLE: &str = "
    CREATE TABLE metadata (
        number_of_species   INTEGER NOT NULL,
        number_of_reactions INTEGER NOT NULL,
        factor_zero         REAL NOT NULL,
        factor_two          REAL NOT NULL,
        factor_duplicate    REAL NOT NULL
    );
";

const CREATE_REACTIONS_TABLE: &str = "
    CREATE TABLE reactions (
        reaction_id         INTEGER NOT NULL PRIMARY KEY,
        number_of_reactants INTEGER NOT NULL,
        number_of_products  INTEGER NOT NULL,
        reactant_1          INTEGER NOT NULL,
        reactant_2          INTEGER NOT NULL,
        product_1           INTEGER NOT NULL,
        product_2           INTEGER NOT NULL,
        rate                REAL NOT NULL,
        dG                  REAL NOT NULL
    );
";

/// The relational sink the collator exclusively owns. Inserts
/// are wrapped in a transaction that's committed every `commit_freq` rows.
pub struct ReactionStore {
    conn: Connection,
    path: PathBuf,
    commit_freq: u64,
    pending_since_commit: u64,
}

impl ReactionStore {
    /// Creates a fresh store at `path`, with both its tables.
    pub fn create(path: &Path, commit_freq: u64) -> Result<ReactionStore, CoreError> {
        let conn =
            Connection::open(path).map_err(|err| CoreError::from((path.to_owned(), err)))?;
        conn.execute(CREATE_METADATA_TABLE, [])
            .map_err(|err| CoreError::from((path.to_owned(), err)))?;
        conn.execute(CREATE_REACTIONS_TABLE, [])
            .map_err(|err| CoreError::from((path.to_owned(), err)))?;
        conn.execute("BEGIN", [])
            .map_err(|err| CoreError::from((path.to_owned(), err)))?;
        Ok(ReactionStore {
            conn,
            path: path.to_owned(),
            commit_freq: commit_freq.max(1),
            pending_since_commit: 0,
        })
    }

    /// Inserts one reaction under `reaction_id`, committing every
    /// `commit_freq` inserts.
    pub fn insert_reaction(
        &mut self,
        reaction_id: i64,
        reaction: &FrozenReaction,
    ) -> Result<(), CoreError> {
        self.conn
            .execute(
                "INSERT INTO reactions VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    reaction_id,
                    reaction.number_of_reactants,
                    reaction.number_of_products,
                    reaction.reactants.0,
                    reaction.reactants.1,
                    reaction.products.0,
                    reaction.products.1,
                    reaction.rate,
                    reaction.dG,
                ],
            )
            .map_err(|err| CoreError::from((self.path.clone(), err)))?;

        self.pending_since_commit += 1;
        if self.pending_since_commit % self.commit_freq == 0 {
            self.commit()?;
        }
        Ok(())
    }

    /// Writes the single metadata row. The `+1` offsets on
    /// `number_of_species`/`number_of_reactions` are intentional, matching
    /// the dispatcher's own off-by-one bookkeeping.
    pub fn write_metadata(
        &mut self,
        number_of_species: i64,
        number_of_reactions: i64,
        factor_zero: f64,
        factor_two: f64,
        factor_duplicate: f64,
    ) -> Result<(), CoreError> {
        self.conn
            .execute(
                "INSERT INTO metadata VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    number_of_species,
                    number_of_reactions,
                    factor_zero,
                    factor_two,
                    factor_duplicate,
                ],
            )
            .map_err(|err| CoreError::from((self.path.clone(), err)))?;
        Ok(())
    }

    /// Commits the in-flight transaction and opens the next one, so the
    /// connection always has an active transaction between calls.
    pub fn commit(&mut self) -> Result<(), CoreError> {
        self.pending_since_commit = 0;
        self.conn
            .execute("COMMIT", [])
            .map_err(|err| CoreError::from((self.path.clone(), err)))?;
        self.conn
            .execute("BEGIN", [])
            .map_err(|err| CoreError::from((self.path.clone(), err)))?;
        Ok(())
    }

    pub fn close(self) -> Result<(), CoreError> {
        self.conn
            .execute("COMMIT", [])
            .map_err(|err| CoreError::from((self.path.clone(), err)))?;
        self.conn
            .close()
            .map_err(|(_, err)| CoreError::from((self.path, err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::NONE;
    use tempfile::NamedTempFile;

    #[test]
    fn inserts_reactions_and_writes_metadata() {
        let file = NamedTempFile::new().unwrap();
        std::fs::remove_file(file.path()).ok();
        let mut store = ReactionStore::create(file.path(), 1000).unwrap();

        let reaction = FrozenReaction {
            reactants: (0, NONE),
            products: (1, NONE),
            number_of_reactants: 1,
            number_of_products: 1,
            rate: 1.0,
            dG: -0.5,
        };
        store.insert_reaction(0, &reaction).unwrap();
        store
            .write_metadata(2, 2, 1.0, 1.0, 1.0)
            .unwrap();
        store.commit().unwrap();

        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM reactions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);

        let meta: (i64, i64) = store
            .conn
            .query_row(
                "SELECT number_of_species, number_of_reactions FROM metadata",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(meta, (2, 2));
    }
}
