//! Gridded execution over many independent units.
//!
//! Units never exchange water, so each day is a data-parallel map over
//! cells. Inactive cells are skipped: their state is carried unchanged and
//! their fluxes are reported as `None`.

use rayon::prelude::*;

use crate::error::{ConfigError, Result};
use crate::forcing::Forcing;
use crate::w3ra::constants::MODEL_NAME;
use crate::w3ra::fluxes::{Fluxes, FluxesTimeseries};
use crate::w3ra::params::Parameters;
use crate::w3ra::run::{step_with_context, W3Context};
use crate::w3ra::state::State;

/// One spatial unit: its parameters and whether it lies in the active domain.
#[derive(Debug, Clone)]
pub struct Cell {
    pub params: Parameters,
    pub active: bool,
}

impl Cell {
    pub fn active(params: Parameters) -> Self {
        Self {
            params,
            active: true,
        }
    }

    pub fn masked(params: Parameters) -> Self {
        Self {
            params,
            active: false,
        }
    }
}

/// A set of cells with their run-constant context.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<Cell>,
    contexts: Vec<W3Context>,
}

/// Output of a gridded run.
#[derive(Debug, Clone)]
pub struct GridRun {
    /// Per-cell flux timeseries; `None` for masked cells.
    pub fluxes: Vec<Option<FluxesTimeseries>>,
    /// Per-cell state after the last timestep.
    pub states: Vec<State>,
}

impl Grid {
    /// Build a grid, validating every cell's parameters up front.
    pub fn new(cells: Vec<Cell>) -> Result<Self> {
        if cells.is_empty() {
            return Err(ConfigError::Grid("grid has no cells".to_string()));
        }
        for cell in &cells {
            cell.params.validate()?;
        }
        let contexts = cells.iter().map(|c| W3Context::new(&c.params)).collect();
        Ok(Self { cells, contexts })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn active_count(&self) -> usize {
        self.cells.iter().filter(|c| c.active).count()
    }

    /// Default initial state of every cell.
    pub fn initialize_states(&self) -> Vec<State> {
        self.cells
            .iter()
            .map(|c| State::initialize(&c.params))
            .collect()
    }

    fn check_len(&self, what: &str, got: usize) -> Result<()> {
        if got != self.cells.len() {
            return Err(ConfigError::Grid(format!(
                "{what} has {got} entries for {} cells",
                self.cells.len()
            )));
        }
        Ok(())
    }

    /// Advance every active cell by one day, in parallel.
    ///
    /// `states` is updated in place; masked cells keep their state. Every
    /// state is checked against its cell's capacities before any cell moves.
    pub fn step(&self, states: &mut [State], forcings: &[Forcing]) -> Result<Vec<Option<Fluxes>>> {
        self.check_len("state slice", states.len())?;
        self.check_len("forcing slice", forcings.len())?;
        for (state, cell) in states.iter().zip(&self.cells) {
            state.validate_against(&cell.params)?;
        }

        let fluxes = states
            .par_iter_mut()
            .zip(forcings.par_iter())
            .zip(self.cells.par_iter().zip(self.contexts.par_iter()))
            .map(|((state, forcing), (cell, ctx))| {
                if !cell.active {
                    return None;
                }
                let (new_state, fluxes) = step_with_context(state, &cell.params, forcing, ctx);
                *state = new_state;
                Some(fluxes)
            })
            .collect();
        Ok(fluxes)
    }

    /// Run every active cell over its own forcing series, in parallel.
    ///
    /// `forcings[c]` is the series of cell `c`; all series must share one
    /// length. Initial states default to [`State::initialize`].
    pub fn run_grid(
        &self,
        forcings: &[Vec<Forcing>],
        initial_states: Option<&[State]>,
    ) -> Result<GridRun> {
        self.check_len("forcing series", forcings.len())?;
        let n_time = forcings.first().map_or(0, Vec::len);
        if forcings.iter().any(|f| f.len() != n_time) {
            return Err(ConfigError::Grid(
                "forcing series differ in length between cells".to_string(),
            ));
        }
        let states = match initial_states {
            Some(s) => {
                self.check_len("initial state slice", s.len())?;
                for (state, cell) in s.iter().zip(&self.cells) {
                    state.validate_against(&cell.params)?;
                }
                s.to_vec()
            }
            None => self.initialize_states(),
        };

        log::info!(
            "{MODEL_NAME}: running {} of {} cells over {n_time} timesteps",
            self.active_count(),
            self.cells.len()
        );

        let results: Vec<(Option<FluxesTimeseries>, State)> = states
            .into_par_iter()
            .zip(forcings.par_iter())
            .zip(self.cells.par_iter().zip(self.contexts.par_iter()))
            .map(|((mut state, series), (cell, ctx))| {
                if !cell.active {
                    return (None, state);
                }
                let mut outputs = FluxesTimeseries::with_capacity(series.len());
                for forcing in series {
                    let (new_state, fluxes) =
                        step_with_context(&state, &cell.params, forcing, ctx);
                    outputs.push(&fluxes);
                    state = new_state;
                }
                (Some(outputs), state)
            })
            .collect();

        log::info!("{MODEL_NAME}: grid run finished");

        let (fluxes, states) = results.into_iter().unzip();
        Ok(GridRun { fluxes, states })
    }
}
