//! Height-above-nearest-drainage (HAND) area lookup.
//!
//! A profile maps elevation above the local drainage base [m] to the
//! cumulative percentage of the unit's area lying at or below it. The model
//! queries it with a water-table (or root-depth) elevation to obtain the
//! saturated and groundwater-accessible area fractions.
//!
//! Profiles are immutable after construction and are shared between
//! parameter sets behind an `Arc`, so parallel workers read them freely.
use smallvec::SmallVec;

use crate::error::{ConfigError, Result};

/// Inline capacity covers the usual 10-20 percentile breakpoints without
/// a heap allocation per unit.
type Points = SmallVec<[f64; 24]>;

#[derive(Debug, Clone, PartialEq)]
pub struct HandProfile {
    elevations: Points,
    percentiles: Points,
}

impl HandProfile {
    /// Build a profile from elevation [m] / cumulative area [%] pairs.
    ///
    /// Elevations must be finite and non-decreasing; percentiles must be
    /// non-decreasing within [0, 100].
    pub fn new(elevations: &[f64], percentiles: &[f64]) -> Result<Self> {
        if elevations.is_empty() {
            return Err(ConfigError::InvalidHandProfile(
                "profile has no points".to_string(),
            ));
        }
        if elevations.len() != percentiles.len() {
            return Err(ConfigError::InvalidHandProfile(format!(
                "{} elevations but {} percentiles",
                elevations.len(),
                percentiles.len()
            )));
        }
        if let Some(i) = elevations.iter().position(|z| !z.is_finite()) {
            return Err(ConfigError::InvalidHandProfile(format!(
                "elevation at index {i} is not finite"
            )));
        }
        if let Some(i) = percentiles
            .iter()
            .position(|p| !(0.0..=100.0).contains(p))
        {
            return Err(ConfigError::InvalidHandProfile(format!(
                "percentile {} at index {i} is outside [0, 100]",
                percentiles[i]
            )));
        }
        if let Some(i) = elevations.windows(2).position(|w| w[1] < w[0]) {
            return Err(ConfigError::InvalidHandProfile(format!(
                "elevations decrease between index {i} and {}",
                i + 1
            )));
        }
        if let Some(i) = percentiles.windows(2).position(|w| w[1] < w[0]) {
            return Err(ConfigError::InvalidHandProfile(format!(
                "percentiles decrease between index {i} and {}",
                i + 1
            )));
        }
        Ok(Self {
            elevations: elevations.iter().copied().collect(),
            percentiles: percentiles.iter().copied().collect(),
        })
    }

    /// Build a profile and prepend the drainage base point (0 m, 0 %).
    ///
    /// HAND rasters usually start at the first percentile above the channel;
    /// the base point anchors the lower end of the interpolation.
    pub fn with_drainage_base(elevations: &[f64], percentiles: &[f64]) -> Result<Self> {
        let mut z = Vec::with_capacity(elevations.len() + 1);
        let mut p = Vec::with_capacity(percentiles.len() + 1);
        z.push(0.0);
        p.push(0.0);
        z.extend_from_slice(elevations);
        p.extend_from_slice(percentiles);
        Self::new(&z, &p)
    }

    /// A profile where the whole unit sits at the drainage base.
    ///
    /// Any non-negative query returns 1; useful for units without HAND data.
    pub fn flat() -> Self {
        Self {
            elevations: smallvec::smallvec![0.0],
            percentiles: smallvec::smallvec![100.0],
        }
    }

    pub fn len(&self) -> usize {
        self.elevations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elevations.is_empty()
    }

    /// Elevation of the drainage base (the lowest profile point) [m].
    pub fn base(&self) -> f64 {
        self.elevations.first().copied().unwrap_or(0.0)
    }

    pub fn elevations(&self) -> &[f64] {
        &self.elevations
    }

    pub fn percentiles(&self) -> &[f64] {
        &self.percentiles
    }

    /// Fraction [0, 1] of the unit's area at or below `elevation`.
    #[inline]
    pub fn fraction_below(&self, elevation: f64) -> f64 {
        fraction_below(elevation, &self.elevations, &self.percentiles)
    }
}

/// Piecewise-linear lookup of the cumulative area fraction at `elevation`.
///
/// Queries outside the profile clamp to its ends. Where several points share
/// one elevation the highest percentile wins. A NaN query yields 0.
pub fn fraction_below(elevation: f64, elevations: &[f64], percentiles: &[f64]) -> f64 {
    let n = elevations.len();
    if n == 0 || elevation.is_nan() {
        return 0.0;
    }
    let z = elevation.clamp(elevations[0], elevations[n - 1]);

    // First index strictly above z; z >= elevations[0] so upper >= 1.
    let upper = elevations.partition_point(|&e| e <= z);
    let lower = upper - 1;
    if elevations[lower] == z || upper == n {
        return percentiles[lower] / 100.0;
    }

    let (z_lo, z_hi) = (elevations[lower], elevations[upper]);
    let (p_lo, p_hi) = (percentiles[lower], percentiles[upper]);
    let t = ((z - z_lo) / (z_hi - z_lo)).clamp(0.0, 1.0);
    (p_lo + (p_hi - p_lo) * t) / 100.0
}
