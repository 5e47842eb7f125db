use std::collections::HashMap;
use std::sync::Arc;

use numpy::PyReadonlyArray1;
use pyo3::prelude::*;

use w3ra_core::error::ConfigError;
use w3ra_core::hand::HandProfile;
use w3ra_core::w3ra::params::{ParameterTable, Parameters};

/// Surface a configuration error as a Python `ValueError`.
pub fn config_err(e: ConfigError) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(e.to_string())
}

/// Validate that a numpy array is C-contiguous and return its slice.
pub fn contiguous_slice<'py>(arr: &'py PyReadonlyArray1<'py, f64>) -> PyResult<&'py [f64]> {
    arr.as_slice().map_err(|_| {
        pyo3::exceptions::PyValueError::new_err("array must be C-contiguous")
    })
}

/// Validate length + contiguity of a numpy array.
pub fn checked_slice<'py>(
    arr: &'py PyReadonlyArray1<'py, f64>,
    expected_len: usize,
    name: &str,
) -> PyResult<&'py [f64]> {
    let slice = contiguous_slice(arr)?;
    if slice.len() != expected_len {
        return Err(pyo3::exceptions::PyValueError::new_err(format!(
            "{} must have {} elements, got {}",
            name, expected_len, slice.len()
        )));
    }
    Ok(slice)
}

/// Build a HAND profile, prepending the drainage base point when asked.
pub fn hand_profile(
    elevations: &PyReadonlyArray1<'_, f64>,
    percentiles: &PyReadonlyArray1<'_, f64>,
    drainage_base: bool,
) -> PyResult<Arc<HandProfile>> {
    let z = contiguous_slice(elevations)?;
    let p = contiguous_slice(percentiles)?;
    let profile = if drainage_base {
        HandProfile::with_drainage_base(z, p)
    } else {
        HandProfile::new(z, p)
    };
    profile.map(Arc::new).map_err(config_err)
}

/// Resolve a `{name: value}` dict into a validated parameter set.
pub fn parameters(table: HashMap<String, f64>, hand: Arc<HandProfile>) -> PyResult<Parameters> {
    let table: ParameterTable = table.into_iter().collect();
    Parameters::from_table(&table, hand).map_err(config_err)
}
