//! Configuration error type.
//!
//! Every failure the core can report is a configuration problem detected
//! before the first timestep. The timestep itself is infallible.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required static parameter is absent and has no default.
    #[error("required parameter `{0}` is missing and has no default")]
    MissingParameter(String),

    /// A parameter value lies outside its admissible range.
    #[error("{name} = {value} is out of bounds [{min}, {max}]")]
    OutOfBounds {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A derived quantity came out non-physical (e.g. a non-positive capacity).
    #[error("derived {name} = {value} is not physical: {reason}")]
    Derived {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("invalid HAND profile: {0}")]
    InvalidHandProfile(String),

    #[error("state array length {got} does not match expected {expected}")]
    StateLength { got: usize, expected: usize },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid forcing: {0}")]
    Forcing(String),

    #[error("grid: {0}")]
    Grid(String),

    #[error("parameter table could not be parsed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn out_of_bounds(name: &str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfBounds {
            name: name.to_string(),
            value,
            min,
            max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameter_message_names_field() {
        let e = ConfigError::MissingParameter("k_gw".to_string());
        assert!(e.to_string().contains("`k_gw`"));
    }

    #[test]
    fn out_of_bounds_message() {
        let e = ConfigError::out_of_bounds("porosity", 1.5, 0.0, 1.0);
        assert_eq!(e.to_string(), "porosity = 1.5 is out of bounds [0, 1]");
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let e: ConfigError = parse.unwrap_err().into();
        assert!(matches!(e, ConfigError::Json(_)));
    }
}
