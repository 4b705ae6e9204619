use serde::{Deserialize, Serialize};

/// Room temperature in kelvin, used as the default `temperature` parameter.
pub const ROOM_TEMPERATURE: f64 = 298.15;

/// Boltzmann constant, in eV/K.
pub const K_B: f64 = 8.617_333_262e-5;

/// Planck constant, in eV·s.
pub const PLANCK: f64 = 4.135_667_696e-15;

/// Physical/chemical parameters consulted by the predicate library.
/// Read-only once a run starts; predicates must not mutate this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub temperature: f64,
    pub electron_free_energy: f64,
}

impl Default for Params {
    fn default() -> Params {
        Params {
            temperature: ROOM_TEMPERATURE,
            electron_free_energy: -1.4,
        }
    }
}
