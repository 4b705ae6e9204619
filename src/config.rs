use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::params::Params;

/// Engine tuning knobs and store locations: thresholds, worker count,
/// commit cadence, and the paths the binary needs to locate the three
/// stores. Built with `bon`'s derive the way `tausplit`'s own crate
/// composes its configuration structs.
#[derive(Debug, Clone, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    pub bucket_db_path: PathBuf,
    pub reaction_db_path: PathBuf,
    pub report_path: PathBuf,

    #[builder(default = Params::default())]
    pub params: Params,

    #[builder(default = 0.5)]
    pub dg_threshold: f64,

    #[builder(default = 1000)]
    pub commit_freq: u64,

    #[builder(default = 8)]
    pub number_of_processes: usize,

    #[builder(default = 1.0)]
    pub factor_zero: f64,

    #[builder(default = 1.0)]
    pub factor_two: f64,

    #[builder(default = 1.0)]
    pub factor_duplicate: f64,

    #[builder(default = false)]
    pub verbose: bool,
}

impl Config {
    /// Loads a configuration from a TOML file, for non-interactive runs
    /// that don't want to pass every flag on the command line.
    pub fn load_toml(path: &Path) -> Result<Config, CoreError> {
        let data = std::fs::read_to_string(path).map_err(|err| CoreError::ConfigIo {
            path: path.to_owned(),
            source: Box::new(err),
        })?;
        toml::from_str(&data).map_err(|err| CoreError::ConfigIo {
            path: path.to_owned(),
            source: Box::new(err),
        })
    }
}
