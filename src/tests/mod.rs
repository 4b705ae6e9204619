//! End-to-end scenarios over the full pipeline: bucket store in, reaction
//! store and report out.

use rusqlite::Connection;
use tempfile::NamedTempFile;

use crate::{
    run_core, standard_filter_tree, standard_logging_tree, BondGraph, Config,
    InMemorySpeciesStore, Node, Predicate, Species, Terminal,
};

fn species_db(entries: &[(&str, f64, usize)]) -> InMemorySpeciesStore {
    InMemorySpeciesStore::new(
        entries
            .iter()
            .enumerate()
            .map(|(id, (name, energy, atoms))| Species {
                species_id: id as i64,
                entry_id: (*name).to_owned(),
                atom_count: *atoms,
                free_energy: *energy,
                bond_graph: BondGraph::new(*atoms, (1..*atoms).map(|a| (a - 1, a))),
                redox_active: false,
            })
            .collect(),
    )
}

fn make_bucket_db(rows: &[(i64, i64)]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let conn = Connection::open(file.path()).unwrap();
    conn.execute("CREATE TABLE bucket0 (a INTEGER, b INTEGER)", [])
        .unwrap();
    for (a, b) in rows {
        conn.execute("INSERT INTO bucket0 VALUES (?1, ?2)", rusqlite::params![a, b])
            .unwrap();
    }
    file
}

fn fresh_path(prefix: &str) -> (NamedTempFile, std::path::PathBuf) {
    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_owned();
    std::fs::remove_file(&path).ok();
    let _ = prefix;
    (file, path)
}

#[test]
fn forward_discarded_reverse_kept_at_diffusion_limited_rate() {
    let species = species_db(&[("A", -1.0, 2), ("B", -0.3, 2)]);
    let bucket_db = make_bucket_db(&[(0, -1), (1, -1)]);
    let (_reaction_guard, reaction_path) = fresh_path("reactions");
    let (_report_guard, report_path) = fresh_path("report");

    let config = Config::builder()
        .bucket_db_path(bucket_db.path().to_owned())
        .reaction_db_path(reaction_path.clone())
        .report_path(report_path)
        .dg_threshold(0.5)
        .number_of_processes(2)
        .build();

    let filter_tree = standard_filter_tree(config.dg_threshold);
    let logging_tree = standard_logging_tree();
    let written = run_core(&config, &species, &filter_tree, &logging_tree).unwrap();
    assert_eq!(written, 1);

    let conn = Connection::open(&reaction_path).unwrap();
    let (reactant_1, product_1, dg, rate): (i64, i64, f64, f64) = conn
        .query_row(
            "SELECT reactant_1, product_1, dG, rate FROM reactions",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    // Only B -> A survives: dG = -0.7, at the diffusion-limited rate.
    assert_eq!((reactant_1, product_1), (1, 0));
    assert!((dg - (-0.7)).abs() < 1e-9);
    let k_t = crate::Params::default().temperature * 8.617_333_262e-5;
    assert!((rate - k_t / 4.135_667_696e-15).abs() < 1e-9);
}

#[test]
fn three_equal_energy_species_keep_all_six_pairs_with_plus_one_metadata() {
    let species = species_db(&[("A", 0.0, 2), ("B", 0.0, 2), ("C", 0.0, 2)]);
    let bucket_db = make_bucket_db(&[(0, -1), (1, -1), (2, -1)]);
    let (_reaction_guard, reaction_path) = fresh_path("reactions");
    let (_report_guard, report_path) = fresh_path("report");

    let config = Config::builder()
        .bucket_db_path(bucket_db.path().to_owned())
        .reaction_db_path(reaction_path.clone())
        .report_path(report_path)
        .dg_threshold(0.5)
        .build();

    let filter_tree = standard_filter_tree(config.dg_threshold);
    let logging_tree = standard_logging_tree();
    let written = run_core(&config, &species, &filter_tree, &logging_tree).unwrap();
    assert_eq!(written, 6);

    let conn = Connection::open(&reaction_path).unwrap();
    let number_of_reactions: i64 = conn
        .query_row("SELECT number_of_reactions FROM metadata", [], |row| row.get(0))
        .unwrap();
    assert_eq!(number_of_reactions, 7);
}

#[test]
fn always_discard_tree_yields_zero_reactions_but_logs_lines() {
    let species = species_db(&[("A", 0.0, 2), ("B", 0.0, 2)]);
    let bucket_db = make_bucket_db(&[(0, -1), (1, -1)]);
    let (_reaction_guard, reaction_path) = fresh_path("reactions");
    let (_report_guard, report_path) = fresh_path("report");

    let config = Config::builder()
        .bucket_db_path(bucket_db.path().to_owned())
        .reaction_db_path(reaction_path)
        .report_path(report_path.clone())
        .build();

    let discard_all = Node::Internal(vec![(
        Predicate::new("default_true", |_, _, _| true),
        Node::Terminal(Terminal::Discard),
    )]);
    let logging_tree = standard_logging_tree();
    let written = run_core(&config, &species, &discard_all, &logging_tree).unwrap();
    assert_eq!(written, 0);

    let report_contents = std::fs::read_to_string(&report_path).unwrap();
    assert!(!report_contents.trim().is_empty());
}

#[test]
fn tree_totality_violation_aborts_and_leaves_no_metadata_row() {
    let species = species_db(&[("A", 0.0, 2), ("B", 0.0, 2)]);
    let bucket_db = make_bucket_db(&[(0, -1), (1, -1)]);
    let (_reaction_guard, reaction_path) = fresh_path("reactions");
    let (_report_guard, report_path) = fresh_path("report");

    let config = Config::builder()
        .bucket_db_path(bucket_db.path().to_owned())
        .reaction_db_path(reaction_path.clone())
        .report_path(report_path)
        .number_of_processes(1)
        .build();

    let non_total_tree = Node::Internal(vec![(
        Predicate::new("always_false", |_, _, _| false),
        Node::Terminal(Terminal::Keep),
    )]);
    let logging_tree = standard_logging_tree();
    let result = run_core(&config, &species, &non_total_tree, &logging_tree);
    assert!(result.is_err());

    let conn = Connection::open(&reaction_path).unwrap();
    let metadata_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM metadata", [], |row| row.get(0))
        .unwrap();
    assert_eq!(metadata_rows, 0);
}

#[test]
fn boundary_empty_bucket_queue_writes_metadata_with_one_reaction_offset() {
    let species = species_db(&[("A", 0.0, 2)]);
    let bucket_db_file = NamedTempFile::new().unwrap();
    Connection::open(bucket_db_file.path()).unwrap();
    let (_reaction_guard, reaction_path) = fresh_path("reactions");
    let (_report_guard, report_path) = fresh_path("report");

    let config = Config::builder()
        .bucket_db_path(bucket_db_file.path().to_owned())
        .reaction_db_path(reaction_path.clone())
        .report_path(report_path)
        .build();

    let filter_tree = standard_filter_tree(config.dg_threshold);
    let logging_tree = standard_logging_tree();
    let written = run_core(&config, &species, &filter_tree, &logging_tree).unwrap();
    assert_eq!(written, 0);

    let conn = Connection::open(&reaction_path).unwrap();
    let number_of_reactions: i64 = conn
        .query_row("SELECT number_of_reactions FROM metadata", [], |row| row.get(0))
        .unwrap();
    assert_eq!(number_of_reactions, 1);
}

#[test]
fn boundary_single_row_bucket_produces_zero_reactions() {
    let species = species_db(&[("A", 0.0, 2)]);
    let bucket_db = make_bucket_db(&[(0, -1)]);
    let (_reaction_guard, reaction_path) = fresh_path("reactions");
    let (_report_guard, report_path) = fresh_path("report");

    let config = Config::builder()
        .bucket_db_path(bucket_db.path().to_owned())
        .reaction_db_path(reaction_path)
        .report_path(report_path)
        .build();

    let filter_tree = standard_filter_tree(config.dg_threshold);
    let logging_tree = standard_logging_tree();
    let written = run_core(&config, &species, &filter_tree, &logging_tree).unwrap();
    assert_eq!(written, 0);
}
