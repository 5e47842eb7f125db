use std::collections::HashMap;

use numpy::ndarray::Array2;
use numpy::{PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::convert::{checked_slice, config_err, contiguous_slice, hand_profile, parameters};

use w3ra_core::forcing::{Forcing, ForcingSeries, Meteo, MeteoSeries};
use w3ra_core::grid::{Cell, Grid};
use w3ra_core::traits::ModelState;
use w3ra_core::w3ra::constants::STATE_SIZE;
use w3ra_core::w3ra::fluxes::Fluxes;
use w3ra_core::w3ra::params::Parameters;
use w3ra_core::w3ra::run;
use w3ra_core::w3ra::state::State;

// ---------------------------------------------------------------------------
// Typed pyclass result objects
// ---------------------------------------------------------------------------

define_timeseries_result! {
    /// W3RA run results with typed numpy array attributes.
    pub struct W3RAResult from w3ra_core::w3ra::fluxes::FluxesTimeseries {
        precip, temp, fday, e0, ept, keps, ga, lai, fveg, fsat, fug,
        interception, rainfall, snowfall, snow_melt, refreezing, snow_outflow,
        melt_runoff, soil_precip, saturation_excess, infiltration_excess,
        infiltration, top_evaporation, drainage_top, interflow_top,
        uptake_shallow, drainage_shallow, interflow_shallow, uptake_deep,
        drainage_deep, interflow_deep, transpiration, soil_evaporation,
        groundwater_evaporation, open_water_evaporation, actual_et,
        groundwater_uptake, groundwater_discharge, hillslope_runoff, runoff,
        s0, ss, sd, sg, sr, mleaf, free_water, dry_snow, total_snow,
        fveg_equilibrium,
    }
}

define_step_result! {
    /// W3RA single-timestep flux results.
    pub struct W3RAStepFluxes from w3ra_core::w3ra::fluxes::Fluxes {
        precip, temp, fday, e0, ept, keps, ga, lai, fveg, fsat, fug,
        interception, rainfall, snowfall, snow_melt, refreezing, snow_outflow,
        melt_runoff, soil_precip, saturation_excess, infiltration_excess,
        infiltration, top_evaporation, drainage_top, interflow_top,
        uptake_shallow, drainage_shallow, interflow_shallow, uptake_deep,
        drainage_deep, interflow_deep, transpiration, soil_evaporation,
        groundwater_evaporation, open_water_evaporation, actual_et,
        groundwater_uptake, groundwater_discharge, hillslope_runoff, runoff,
        s0, ss, sd, sg, sr, mleaf, free_water, dry_snow, total_snow,
        fveg_equilibrium,
    }
}

// ---------------------------------------------------------------------------
// Forcing assembly
// ---------------------------------------------------------------------------

/// Meteorology columns in either evaporation mode.
enum MeteoInput<T> {
    Prescribed {
        temp: T,
        pet: T,
    },
    Radiation {
        temp_min: T,
        temp_max: T,
        shortwave: T,
        longwave: T,
    },
}

fn select_meteo<T>(
    temp: Option<T>,
    pet: Option<T>,
    temp_min: Option<T>,
    temp_max: Option<T>,
    shortwave: Option<T>,
    longwave: Option<T>,
) -> PyResult<MeteoInput<T>> {
    match (temp, pet, temp_min, temp_max, shortwave, longwave) {
        (Some(temp), Some(pet), None, None, None, None) => Ok(MeteoInput::Prescribed { temp, pet }),
        (None, None, Some(temp_min), Some(temp_max), Some(shortwave), Some(longwave)) => {
            Ok(MeteoInput::Radiation {
                temp_min,
                temp_max,
                shortwave,
                longwave,
            })
        }
        _ => Err(pyo3::exceptions::PyValueError::new_err(
            "give either temp and pet, or temp_min, temp_max, shortwave and longwave",
        )),
    }
}

fn column_vec(arr: &PyReadonlyArray1<'_, f64>) -> PyResult<Vec<f64>> {
    Ok(contiguous_slice(arr)?.to_vec())
}

fn forcing_series(
    day_of_year: Vec<u32>,
    precip: &PyReadonlyArray1<'_, f64>,
    wind_speed: &PyReadonlyArray1<'_, f64>,
    air_pressure: &PyReadonlyArray1<'_, f64>,
    meteo: MeteoInput<PyReadonlyArray1<'_, f64>>,
) -> PyResult<ForcingSeries> {
    let meteo = match meteo {
        MeteoInput::Prescribed { temp, pet } => MeteoSeries::Prescribed {
            temp: column_vec(&temp)?,
            pet: column_vec(&pet)?,
        },
        MeteoInput::Radiation {
            temp_min,
            temp_max,
            shortwave,
            longwave,
        } => MeteoSeries::Radiation {
            temp_min: column_vec(&temp_min)?,
            temp_max: column_vec(&temp_max)?,
            shortwave: column_vec(&shortwave)?,
            longwave: column_vec(&longwave)?,
        },
    };
    ForcingSeries::new(
        day_of_year,
        column_vec(precip)?,
        column_vec(wind_speed)?,
        column_vec(air_pressure)?,
        meteo,
    )
    .map_err(config_err)
}

fn state_from(
    arr: &PyReadonlyArray1<'_, f64>,
    name: &str,
    params: &Parameters,
) -> PyResult<State> {
    let slice = checked_slice(arr, STATE_SIZE, name)?;
    let state = State::from_slice(slice).map_err(config_err)?;
    state.validate_against(params).map_err(config_err)?;
    Ok(state)
}

// ---------------------------------------------------------------------------
// Single unit
// ---------------------------------------------------------------------------

/// Run W3RA for one unit over a forcing timeseries.
///
/// Returns (W3RAResult, final_state).
#[pyfunction]
#[allow(clippy::too_many_arguments)]
#[pyo3(signature = (
    params,
    hand_elevations,
    hand_percentiles,
    day_of_year,
    precip,
    wind_speed,
    air_pressure,
    temp=None,
    pet=None,
    temp_min=None,
    temp_max=None,
    shortwave=None,
    longwave=None,
    initial_state=None,
    drainage_base=true,
))]
fn w3ra_run<'py>(
    py: Python<'py>,
    params: HashMap<String, f64>,
    hand_elevations: PyReadonlyArray1<'py, f64>,
    hand_percentiles: PyReadonlyArray1<'py, f64>,
    day_of_year: Vec<u32>,
    precip: PyReadonlyArray1<'py, f64>,
    wind_speed: PyReadonlyArray1<'py, f64>,
    air_pressure: PyReadonlyArray1<'py, f64>,
    temp: Option<PyReadonlyArray1<'py, f64>>,
    pet: Option<PyReadonlyArray1<'py, f64>>,
    temp_min: Option<PyReadonlyArray1<'py, f64>>,
    temp_max: Option<PyReadonlyArray1<'py, f64>>,
    shortwave: Option<PyReadonlyArray1<'py, f64>>,
    longwave: Option<PyReadonlyArray1<'py, f64>>,
    initial_state: Option<PyReadonlyArray1<'py, f64>>,
    drainage_base: bool,
) -> PyResult<(W3RAResult, Bound<'py, PyArray1<f64>>)> {
    let hand = hand_profile(&hand_elevations, &hand_percentiles, drainage_base)?;
    let p = parameters(params, hand)?;

    let meteo = select_meteo(temp, pet, temp_min, temp_max, shortwave, longwave)?;
    let series = forcing_series(day_of_year, &precip, &wind_speed, &air_pressure, meteo)?;
    let forcing = series.to_forcings();

    let state = match &initial_state {
        Some(s) => Some(state_from(s, "initial_state", &p)?),
        None => None,
    };

    let (result, final_state) = py.allow_threads(|| run::run(&p, &forcing, state.as_ref()));

    Ok((
        W3RAResult::from_timeseries(py, result),
        PyArray1::from_vec(py, final_state.to_vec()),
    ))
}

/// Advance one unit by a single day.
///
/// Returns (new_state, W3RAStepFluxes).
#[pyfunction]
#[allow(clippy::too_many_arguments)]
#[pyo3(signature = (
    state,
    params,
    hand_elevations,
    hand_percentiles,
    day_of_year,
    precip,
    wind_speed,
    air_pressure,
    temp=None,
    pet=None,
    temp_min=None,
    temp_max=None,
    shortwave=None,
    longwave=None,
    drainage_base=true,
))]
fn w3ra_step<'py>(
    py: Python<'py>,
    state: PyReadonlyArray1<'py, f64>,
    params: HashMap<String, f64>,
    hand_elevations: PyReadonlyArray1<'py, f64>,
    hand_percentiles: PyReadonlyArray1<'py, f64>,
    day_of_year: u32,
    precip: f64,
    wind_speed: f64,
    air_pressure: f64,
    temp: Option<f64>,
    pet: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    shortwave: Option<f64>,
    longwave: Option<f64>,
    drainage_base: bool,
) -> PyResult<(Bound<'py, PyArray1<f64>>, W3RAStepFluxes)> {
    let hand = hand_profile(&hand_elevations, &hand_percentiles, drainage_base)?;
    let p = parameters(params, hand)?;
    let s = state_from(&state, "state", &p)?;

    let meteo = match select_meteo(temp, pet, temp_min, temp_max, shortwave, longwave)? {
        MeteoInput::Prescribed { temp, pet } => Meteo::Prescribed {
            temp,
            pet,
            wind_speed,
            air_pressure,
        },
        MeteoInput::Radiation {
            temp_min,
            temp_max,
            shortwave,
            longwave,
        } => Meteo::Radiation {
            temp_min,
            temp_max,
            shortwave,
            longwave,
            wind_speed,
            air_pressure,
        },
    };
    let forcing = Forcing {
        day_of_year,
        precip,
        meteo,
    };

    let (new_state, fluxes) = run::step(&s, &p, &forcing);
    Ok((
        PyArray1::from_vec(py, new_state.to_vec()),
        W3RAStepFluxes::from_fluxes(&fluxes),
    ))
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Copy column `c` of a (time, cell) array.
fn cell_column(arr: &PyReadonlyArray2<'_, f64>, c: usize) -> Vec<f64> {
    arr.as_array().column(c).to_vec()
}

fn check_shape(arr: &PyReadonlyArray2<'_, f64>, shape: (usize, usize), name: &str) -> PyResult<()> {
    let dim = arr.as_array().dim();
    if dim != shape {
        return Err(pyo3::exceptions::PyValueError::new_err(format!(
            "{name} must have shape {shape:?}, got {dim:?}"
        )));
    }
    Ok(())
}

/// Run many independent units in parallel.
///
/// Forcing arrays have shape (time, cell). Returns a dict of (time, cell)
/// flux arrays, NaN for masked cells, and the (cell, state) final states.
#[pyfunction]
#[allow(clippy::too_many_arguments)]
#[pyo3(signature = (
    params,
    hand_elevations,
    hand_percentiles,
    active,
    day_of_year,
    precip,
    wind_speed,
    air_pressure,
    temp=None,
    pet=None,
    temp_min=None,
    temp_max=None,
    shortwave=None,
    longwave=None,
    drainage_base=true,
))]
fn w3ra_run_grid<'py>(
    py: Python<'py>,
    params: Vec<HashMap<String, f64>>,
    hand_elevations: Vec<PyReadonlyArray1<'py, f64>>,
    hand_percentiles: Vec<PyReadonlyArray1<'py, f64>>,
    active: Vec<bool>,
    day_of_year: Vec<u32>,
    precip: PyReadonlyArray2<'py, f64>,
    wind_speed: PyReadonlyArray2<'py, f64>,
    air_pressure: PyReadonlyArray2<'py, f64>,
    temp: Option<PyReadonlyArray2<'py, f64>>,
    pet: Option<PyReadonlyArray2<'py, f64>>,
    temp_min: Option<PyReadonlyArray2<'py, f64>>,
    temp_max: Option<PyReadonlyArray2<'py, f64>>,
    shortwave: Option<PyReadonlyArray2<'py, f64>>,
    longwave: Option<PyReadonlyArray2<'py, f64>>,
    drainage_base: bool,
) -> PyResult<(Bound<'py, PyDict>, Bound<'py, PyArray2<f64>>)> {
    let n_cells = params.len();
    if hand_elevations.len() != n_cells
        || hand_percentiles.len() != n_cells
        || active.len() != n_cells
    {
        return Err(pyo3::exceptions::PyValueError::new_err(
            "params, hand_elevations, hand_percentiles and active must have one entry per cell",
        ));
    }
    let n_time = day_of_year.len();
    let shape = (n_time, n_cells);
    check_shape(&precip, shape, "precip")?;
    check_shape(&wind_speed, shape, "wind_speed")?;
    check_shape(&air_pressure, shape, "air_pressure")?;

    let meteo = select_meteo(temp, pet, temp_min, temp_max, shortwave, longwave)?;
    match &meteo {
        MeteoInput::Prescribed { temp, pet } => {
            check_shape(temp, shape, "temp")?;
            check_shape(pet, shape, "pet")?;
        }
        MeteoInput::Radiation {
            temp_min,
            temp_max,
            shortwave,
            longwave,
        } => {
            check_shape(temp_min, shape, "temp_min")?;
            check_shape(temp_max, shape, "temp_max")?;
            check_shape(shortwave, shape, "shortwave")?;
            check_shape(longwave, shape, "longwave")?;
        }
    }

    let mut cells = Vec::with_capacity(n_cells);
    let mut forcings = Vec::with_capacity(n_cells);
    for (c, table) in params.into_iter().enumerate() {
        let hand = hand_profile(&hand_elevations[c], &hand_percentiles[c], drainage_base)?;
        let p = parameters(table, hand)?;
        cells.push(Cell {
            params: p,
            active: active[c],
        });

        let meteo_series = match &meteo {
            MeteoInput::Prescribed { temp, pet } => MeteoSeries::Prescribed {
                temp: cell_column(temp, c),
                pet: cell_column(pet, c),
            },
            MeteoInput::Radiation {
                temp_min,
                temp_max,
                shortwave,
                longwave,
            } => MeteoSeries::Radiation {
                temp_min: cell_column(temp_min, c),
                temp_max: cell_column(temp_max, c),
                shortwave: cell_column(shortwave, c),
                longwave: cell_column(longwave, c),
            },
        };
        let series = ForcingSeries::new(
            day_of_year.clone(),
            cell_column(&precip, c),
            cell_column(&wind_speed, c),
            cell_column(&air_pressure, c),
            meteo_series,
        )
        .map_err(config_err)?;
        forcings.push(series.to_forcings());
    }

    let grid = Grid::new(cells).map_err(config_err)?;
    let out = py
        .allow_threads(|| grid.run_grid(&forcings, None))
        .map_err(config_err)?;

    let dict = PyDict::new(py);
    for name in Fluxes::field_names() {
        let arr = Array2::from_shape_fn(shape, |(t, c)| {
            out.fluxes[c]
                .as_ref()
                .and_then(|ts| ts.column(name))
                .map_or(f64::NAN, |col| col[t])
        });
        dict.set_item(*name, PyArray2::from_owned_array(py, arr))?;
    }

    let states = Array2::from_shape_fn((n_cells, STATE_SIZE), |(c, i)| {
        out.states[c].to_array()[i]
    });
    Ok((dict, PyArray2::from_owned_array(py, states)))
}

/// Fraction of a unit's area lying below `elevation` on its HAND profile.
#[pyfunction]
#[pyo3(signature = (elevation, hand_elevations, hand_percentiles, drainage_base=true))]
fn w3ra_fraction_below(
    elevation: f64,
    hand_elevations: PyReadonlyArray1<'_, f64>,
    hand_percentiles: PyReadonlyArray1<'_, f64>,
    drainage_base: bool,
) -> PyResult<f64> {
    let profile = hand_profile(&hand_elevations, &hand_percentiles, drainage_base)?;
    Ok(profile.fraction_below(elevation))
}

pub fn register(parent: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = parent.py();
    let m = PyModule::new(py, "w3ra")?;
    m.add_function(wrap_pyfunction!(w3ra_run, &m)?)?;
    m.add_function(wrap_pyfunction!(w3ra_step, &m)?)?;
    m.add_function(wrap_pyfunction!(w3ra_run_grid, &m)?)?;
    m.add_function(wrap_pyfunction!(w3ra_fraction_below, &m)?)?;
    m.add_class::<W3RAResult>()?;
    m.add_class::<W3RAStepFluxes>()?;
    parent.add_submodule(&m)?;
    Ok(())
}
