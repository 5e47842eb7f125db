/// W3RA per-unit state variables.
///
/// Soil, groundwater and surface stores, leaf biomass and the two snowpack
/// components. Carried forward in memory between timesteps; exchanged with
/// the restart layer as a flat vector in `STATE_NAMES` order.
use super::constants::{STATE_NAMES, STATE_SIZE};
use super::params::Parameters;
use crate::error::{ConfigError, Result};
use crate::traits::ModelState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    /// Top soil layer storage [mm].
    pub s0: f64,
    /// Shallow root zone storage [mm].
    pub ss: f64,
    /// Deep root zone storage [mm].
    pub sd: f64,
    /// Groundwater storage [mm]; may be transiently negative.
    pub sg: f64,
    /// Surface / channel storage [mm].
    pub sr: f64,
    /// Leaf biomass [kg/m2].
    pub mleaf: f64,
    /// Liquid water held in the snowpack [mm].
    pub free_water: f64,
    /// Frozen snowpack water equivalent [mm].
    pub dry_snow: f64,
}

impl State {
    /// Cold-start state.
    ///
    /// Soil layers start at 20% of their uptake-limiting wetness, leaf
    /// biomass at an LAI of 2, all other stores empty.
    pub fn initialize(params: &Parameters) -> Self {
        let soil = &params.soil;
        Self {
            s0: 0.2 * soil.w0lim_e * soil.s0max,
            ss: 0.2 * soil.wslim_u * soil.ssmax,
            sd: 0.2 * soil.wdlim_u * soil.sdmax,
            sg: 0.0,
            sr: 0.0,
            mleaf: 2.0 / params.vegetation.sla,
            free_water: 0.0,
            dry_snow: 0.0,
        }
    }

    /// State with every store at zero, leaf biomass included.
    ///
    /// Not a valid restart state on its own; set `mleaf` before use.
    pub fn empty() -> Self {
        Self::from_array([0.0; STATE_SIZE])
    }

    /// Snow water equivalent of the whole pack [mm].
    pub fn total_snow(&self) -> f64 {
        self.free_water + self.dry_snow
    }

    /// Serialize state to a fixed array.
    ///
    /// Layout: [s0, ss, sd, mleaf, free_water, dry_snow, sg, sr]
    pub fn to_array(&self) -> [f64; STATE_SIZE] {
        [
            self.s0,
            self.ss,
            self.sd,
            self.mleaf,
            self.free_water,
            self.dry_snow,
            self.sg,
            self.sr,
        ]
    }

    /// Deserialize from a fixed array without validation.
    pub fn from_array(arr: [f64; STATE_SIZE]) -> Self {
        Self {
            s0: arr[0],
            ss: arr[1],
            sd: arr[2],
            mleaf: arr[3],
            free_water: arr[4],
            dry_snow: arr[5],
            sg: arr[6],
            sr: arr[7],
        }
    }

    /// Check that every value is finite, the bounded stores are
    /// non-negative and leaf biomass is positive. Groundwater is allowed
    /// below zero.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in STATE_NAMES.iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(ConfigError::InvalidState(format!(
                    "{name} is not finite ({value})"
                )));
            }
            if *name != "sg" && value < 0.0 {
                return Err(ConfigError::InvalidState(format!(
                    "{name} is negative ({value})"
                )));
            }
        }
        if self.mleaf <= 0.0 {
            return Err(ConfigError::InvalidState(format!(
                "mleaf must be positive ({})",
                self.mleaf
            )));
        }
        Ok(())
    }

    /// Check the soil stores against a unit's capacities.
    pub fn validate_against(&self, params: &Parameters) -> Result<()> {
        self.validate()?;
        let soil = &params.soil;
        for (name, value, max) in [
            ("s0", self.s0, soil.s0max),
            ("ss", self.ss, soil.ssmax),
            ("sd", self.sd, soil.sdmax),
        ] {
            if value > max {
                return Err(ConfigError::InvalidState(format!(
                    "{name} = {value} exceeds capacity {max}"
                )));
            }
        }
        Ok(())
    }
}

impl ModelState for State {
    fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    fn from_slice(arr: &[f64]) -> Result<Self> {
        let arr: [f64; STATE_SIZE] = arr.try_into().map_err(|_| ConfigError::StateLength {
            got: arr.len(),
            expected: STATE_SIZE,
        })?;
        let state = Self::from_array(arr);
        state.validate()?;
        Ok(state)
    }

    fn array_len(&self) -> usize {
        STATE_SIZE
    }
}
