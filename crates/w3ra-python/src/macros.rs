/// Generate a frozen `#[pyclass]` struct where each field is a `Py<PyArray1<f64>>`.
///
/// Also generates a `from_timeseries()` method that converts from a
/// `FluxesTimeseries` struct.
macro_rules! define_timeseries_result {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident from $core_type:ty {
            $($field:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[pyo3::pyclass(frozen)]
        $vis struct $name {
            $(
                #[pyo3(get)]
                pub $field: Py<numpy::PyArray1<f64>>,
            )+
        }

        impl $name {
            pub fn from_timeseries(py: pyo3::Python<'_>, ts: $core_type) -> Self {
                Self {
                    $(
                        $field: numpy::PyArray1::from_vec(py, ts.$field).unbind(),
                    )+
                }
            }
        }
    };
}

/// Generate a frozen `#[pyclass]` struct where each field is `f64`.
///
/// Also generates a `from_fluxes()` method that copies values from the
/// corresponding Rust `Fluxes` struct.
macro_rules! define_step_result {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident from $core_type:ty {
            $($field:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[pyo3::pyclass(frozen)]
        $vis struct $name {
            $(
                #[pyo3(get)]
                pub $field: f64,
            )+
        }

        impl $name {
            pub fn from_fluxes(f: &$core_type) -> Self {
                Self {
                    $(
                        $field: f.$field,
                    )+
                }
            }
        }
    };
}
