/// w3ra-core: cell-wise W3RA water balance model.
///
/// Each unit (grid cell) is advanced independently one day at a time;
/// `grid` runs many units in parallel.
pub mod error;
pub mod forcing;
pub mod grid;
pub mod hand;
pub mod traits;
pub mod w3ra;

pub use error::{ConfigError, Result};
pub use forcing::{Forcing, ForcingSeries, Meteo};
pub use grid::{Cell, Grid};
pub use hand::HandProfile;
pub use traits::{FluxesTimeseriesOps, HydrologicalModel, ModelState};
pub use w3ra::fluxes::{Fluxes, FluxesTimeseries};
pub use w3ra::params::{ParameterTable, Parameters};
pub use w3ra::run::{W3Context, W3Ra};
pub use w3ra::state::State;
