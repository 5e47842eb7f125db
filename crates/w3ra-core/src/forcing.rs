//! Daily meteorological forcing.
//!
//! A timestep's forcing carries the day of year, precipitation and one of
//! two meteorology modes: potential evaporation supplied directly, or the
//! radiation/temperature inputs it is derived from. The mode may differ per
//! timestep. Missing values (NaN) are covered by fixed defaults.
use crate::error::{ConfigError, Result};
use crate::w3ra::constants::{
    DEFAULT_AIR_PRESSURE, DEFAULT_LONGWAVE, DEFAULT_PET, DEFAULT_PRECIP, DEFAULT_SHORTWAVE,
    DEFAULT_TEMP, DEFAULT_WIND_PRESCRIBED, DEFAULT_WIND_RADIATION,
};

/// Meteorological inputs for one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Meteo {
    /// Potential evaporation taken from data.
    Prescribed {
        /// Daily mean temperature [C].
        temp: f64,
        /// Potential evaporation [mm/d].
        pet: f64,
        /// Wind speed [m/s].
        wind_speed: f64,
        /// Surface air pressure [Pa].
        air_pressure: f64,
    },
    /// Potential evaporation derived from the radiation balance.
    Radiation {
        temp_min: f64,
        temp_max: f64,
        /// Incoming shortwave radiation [W/m2].
        shortwave: f64,
        /// Incoming longwave radiation [W/m2].
        longwave: f64,
        wind_speed: f64,
        air_pressure: f64,
    },
}

fn cover(value: f64, default: f64) -> f64 {
    if value.is_nan() {
        default
    } else {
        value
    }
}

impl Meteo {
    /// Replace missing (NaN) values by their defaults.
    pub fn cover_missing(self) -> Self {
        match self {
            Meteo::Prescribed {
                temp,
                pet,
                wind_speed,
                air_pressure,
            } => Meteo::Prescribed {
                temp: cover(temp, DEFAULT_TEMP),
                pet: cover(pet, DEFAULT_PET),
                wind_speed: cover(wind_speed, DEFAULT_WIND_PRESCRIBED),
                air_pressure: cover(air_pressure, DEFAULT_AIR_PRESSURE),
            },
            Meteo::Radiation {
                temp_min,
                temp_max,
                shortwave,
                longwave,
                wind_speed,
                air_pressure,
            } => Meteo::Radiation {
                temp_min: cover(temp_min, DEFAULT_TEMP),
                temp_max: cover(temp_max, DEFAULT_TEMP),
                shortwave: cover(shortwave, DEFAULT_SHORTWAVE),
                longwave: cover(longwave, DEFAULT_LONGWAVE),
                wind_speed: cover(wind_speed, DEFAULT_WIND_RADIATION),
                air_pressure: cover(air_pressure, DEFAULT_AIR_PRESSURE),
            },
        }
    }

    fn has_missing(&self) -> bool {
        match *self {
            Meteo::Prescribed {
                temp,
                pet,
                wind_speed,
                air_pressure,
            } => [temp, pet, wind_speed, air_pressure].iter().any(|v| v.is_nan()),
            Meteo::Radiation {
                temp_min,
                temp_max,
                shortwave,
                longwave,
                wind_speed,
                air_pressure,
            } => [temp_min, temp_max, shortwave, longwave, wind_speed, air_pressure]
                .iter()
                .any(|v| v.is_nan()),
        }
    }

    pub fn wind_speed(&self) -> f64 {
        match *self {
            Meteo::Prescribed { wind_speed, .. } | Meteo::Radiation { wind_speed, .. } => {
                wind_speed
            }
        }
    }

    pub fn air_pressure(&self) -> f64 {
        match *self {
            Meteo::Prescribed { air_pressure, .. } | Meteo::Radiation { air_pressure, .. } => {
                air_pressure
            }
        }
    }
}

/// Forcing for a single timestep of one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forcing {
    /// Day of year, 1-based.
    pub day_of_year: u32,
    /// Precipitation [mm/d].
    pub precip: f64,
    pub meteo: Meteo,
}

impl Forcing {
    /// Convenience constructor for the prescribed-PET mode.
    pub fn prescribed(
        day_of_year: u32,
        precip: f64,
        temp: f64,
        pet: f64,
        wind_speed: f64,
        air_pressure: f64,
    ) -> Self {
        Self {
            day_of_year,
            precip,
            meteo: Meteo::Prescribed {
                temp,
                pet,
                wind_speed,
                air_pressure,
            },
        }
    }

    pub fn cover_missing(self) -> Self {
        Self {
            day_of_year: self.day_of_year,
            precip: cover(self.precip, DEFAULT_PRECIP),
            meteo: self.meteo.cover_missing(),
        }
    }

    /// True if any input is NaN.
    pub fn has_missing(&self) -> bool {
        self.precip.is_nan() || self.meteo.has_missing()
    }
}

/// Meteorology columns of a forcing series.
#[derive(Debug, Clone)]
pub enum MeteoSeries {
    Prescribed {
        temp: Vec<f64>,
        pet: Vec<f64>,
    },
    Radiation {
        temp_min: Vec<f64>,
        temp_max: Vec<f64>,
        shortwave: Vec<f64>,
        longwave: Vec<f64>,
    },
}

/// Validated forcing timeseries for one unit.
///
/// All columns must have the same, non-zero length. NaN values are covered
/// by the defaults of their variable, with a warning.
#[derive(Debug, Clone)]
pub struct ForcingSeries {
    pub day_of_year: Vec<u32>,
    pub precip: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub air_pressure: Vec<f64>,
    pub meteo: MeteoSeries,
}

impl ForcingSeries {
    /// Create a forcing series with validation.
    ///
    /// Validates:
    /// - all columns have the same length
    /// - the series is non-empty
    /// - days of year lie in 1..=366
    pub fn new(
        day_of_year: Vec<u32>,
        precip: Vec<f64>,
        wind_speed: Vec<f64>,
        air_pressure: Vec<f64>,
        meteo: MeteoSeries,
    ) -> Result<Self> {
        let n = day_of_year.len();
        if n == 0 {
            return Err(ConfigError::Forcing("forcing series is empty".to_string()));
        }
        let mut columns: Vec<(&str, usize)> = vec![
            ("precip", precip.len()),
            ("wind_speed", wind_speed.len()),
            ("air_pressure", air_pressure.len()),
        ];
        match &meteo {
            MeteoSeries::Prescribed { temp, pet } => {
                columns.push(("temp", temp.len()));
                columns.push(("pet", pet.len()));
            }
            MeteoSeries::Radiation {
                temp_min,
                temp_max,
                shortwave,
                longwave,
            } => {
                columns.push(("temp_min", temp_min.len()));
                columns.push(("temp_max", temp_max.len()));
                columns.push(("shortwave", shortwave.len()));
                columns.push(("longwave", longwave.len()));
            }
        }
        if let Some((name, len)) = columns.iter().find(|(_, len)| *len != n) {
            return Err(ConfigError::Forcing(format!(
                "{name} length {len} does not match day_of_year length {n}"
            )));
        }
        if let Some(i) = day_of_year.iter().position(|d| !(1..=366).contains(d)) {
            return Err(ConfigError::Forcing(format!(
                "day_of_year {} at index {i} is outside 1..=366",
                day_of_year[i]
            )));
        }
        Ok(Self {
            day_of_year,
            precip,
            wind_speed,
            air_pressure,
            meteo,
        })
    }

    /// Number of timesteps.
    pub fn len(&self) -> usize {
        self.day_of_year.len()
    }

    /// Returns `true` if there are no timesteps.
    pub fn is_empty(&self) -> bool {
        self.day_of_year.is_empty()
    }

    /// Forcing of timestep `t`, as supplied (missing values not covered).
    pub fn get(&self, t: usize) -> Option<Forcing> {
        let meteo = match &self.meteo {
            MeteoSeries::Prescribed { temp, pet } => Meteo::Prescribed {
                temp: *temp.get(t)?,
                pet: *pet.get(t)?,
                wind_speed: *self.wind_speed.get(t)?,
                air_pressure: *self.air_pressure.get(t)?,
            },
            MeteoSeries::Radiation {
                temp_min,
                temp_max,
                shortwave,
                longwave,
            } => Meteo::Radiation {
                temp_min: *temp_min.get(t)?,
                temp_max: *temp_max.get(t)?,
                shortwave: *shortwave.get(t)?,
                longwave: *longwave.get(t)?,
                wind_speed: *self.wind_speed.get(t)?,
                air_pressure: *self.air_pressure.get(t)?,
            },
        };
        Some(Forcing {
            day_of_year: *self.day_of_year.get(t)?,
            precip: *self.precip.get(t)?,
            meteo,
        })
    }

    /// Per-timestep forcing records with missing values covered.
    pub fn to_forcings(&self) -> Vec<Forcing> {
        let forcings: Vec<Forcing> = (0..self.len()).filter_map(|t| self.get(t)).collect();
        let n_missing = forcings.iter().filter(|f| f.has_missing()).count();
        if n_missing > 0 {
            log::warn!(
                "{n_missing} of {} timesteps have missing forcing; covering with defaults",
                forcings.len()
            );
        }
        forcings.into_iter().map(Forcing::cover_missing).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prescribed_series(n: usize) -> MeteoSeries {
        MeteoSeries::Prescribed {
            temp: vec![12.0; n],
            pet: vec![3.0; n],
        }
    }

    // -- Construction --

    #[test]
    fn valid_series() {
        let fs = ForcingSeries::new(
            vec![1, 2, 3],
            vec![0.0, 5.0, 1.0],
            vec![2.0; 3],
            vec![101_300.0; 3],
            prescribed_series(3),
        )
        .unwrap();
        assert_eq!(fs.len(), 3);
        let f = fs.to_forcings();
        assert_eq!(f[1].precip, 5.0);
        assert_eq!(f[2].day_of_year, 3);
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = ForcingSeries::new(
            vec![1, 2, 3],
            vec![0.0, 5.0],
            vec![2.0; 3],
            vec![101_300.0; 3],
            prescribed_series(3),
        )
        .unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn rejects_meteo_length_mismatch() {
        let meteo = MeteoSeries::Radiation {
            temp_min: vec![0.0; 2],
            temp_max: vec![10.0; 2],
            shortwave: vec![200.0; 1],
            longwave: vec![300.0; 2],
        };
        let err = ForcingSeries::new(vec![1, 2], vec![0.0; 2], vec![2.0; 2], vec![1e5; 2], meteo)
            .unwrap_err();
        assert!(err.to_string().contains("shortwave"));
    }

    #[test]
    fn rejects_empty_series() {
        let err = ForcingSeries::new(vec![], vec![], vec![], vec![], prescribed_series(0))
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn rejects_bad_day_of_year() {
        assert!(ForcingSeries::new(
            vec![0],
            vec![0.0],
            vec![1.0],
            vec![1e5],
            prescribed_series(1)
        )
        .is_err());
        assert!(ForcingSeries::new(
            vec![367],
            vec![0.0],
            vec![1.0],
            vec![1e5],
            prescribed_series(1)
        )
        .is_err());
    }

    // -- Missing values --

    #[test]
    fn covers_missing_prescribed_values() {
        let f = Forcing::prescribed(10, f64::NAN, f64::NAN, f64::NAN, f64::NAN, f64::NAN);
        assert!(f.has_missing());
        let c = f.cover_missing();
        assert!(!c.has_missing());
        assert_eq!(c.precip, DEFAULT_PRECIP);
        assert_eq!(
            c.meteo,
            Meteo::Prescribed {
                temp: DEFAULT_TEMP,
                pet: DEFAULT_PET,
                wind_speed: DEFAULT_WIND_PRESCRIBED,
                air_pressure: DEFAULT_AIR_PRESSURE,
            }
        );
    }

    #[test]
    fn covers_missing_radiation_values() {
        let m = Meteo::Radiation {
            temp_min: 2.0,
            temp_max: f64::NAN,
            shortwave: f64::NAN,
            longwave: 280.0,
            wind_speed: f64::NAN,
            air_pressure: 1e5,
        }
        .cover_missing();
        assert_eq!(m.wind_speed(), DEFAULT_WIND_RADIATION);
        assert_eq!(m.air_pressure(), 1e5);
        match m {
            Meteo::Radiation {
                temp_min,
                temp_max,
                shortwave,
                ..
            } => {
                assert_eq!(temp_min, 2.0);
                assert_eq!(temp_max, DEFAULT_TEMP);
                assert_eq!(shortwave, DEFAULT_SHORTWAVE);
            }
            Meteo::Prescribed { .. } => panic!("mode changed"),
        }
    }

    #[test]
    fn series_covers_nan_in_output() {
        let fs = ForcingSeries::new(
            vec![1, 2],
            vec![f64::NAN, 4.0],
            vec![2.0; 2],
            vec![1e5; 2],
            prescribed_series(2),
        )
        .unwrap();
        let f = fs.to_forcings();
        assert_eq!(f[0].precip, 0.0);
        assert_eq!(f[1].precip, 4.0);
    }
}
