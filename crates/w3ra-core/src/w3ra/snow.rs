//! Interception and snow routine.
//!
//! Pure functions for canopy rainfall interception and the degree-day
//! snowpack (precipitation partitioning, melt, refreezing, water holding
//! capacity, outflow routing by ground temperature).

use super::constants::MIN_INTERCEPTION_HEIGHT;
use super::params::{SnowParams, VegetationParams};

/// Height-dependent part of the wet-canopy evaporation rate.
///
/// `er_coeff * max(0.05, hveg)^er_exp`; constant for a run.
pub fn interception_height_factor(veg: &VegetationParams) -> f64 {
    veg.er_coeff * veg.hveg.max(MIN_INTERCEPTION_HEIGHT).powf(veg.er_exp)
}

/// Canopy interception loss [mm/d].
///
/// Below the wetting point all precipitation on the vegetated fraction is
/// intercepted; above it the canopy evaporates at its wet-canopy rate.
/// Nothing is intercepted when the 24-hour mean temperature is at or below
/// zero.
pub fn interception(
    precip: f64,
    t24: f64,
    fveg: f64,
    lai: f64,
    s_sls: f64,
    height_factor: f64,
) -> f64 {
    if t24 <= 0.0 || precip <= 0.0 {
        return 0.0;
    }
    let sveg = s_sls * lai;
    let f_er = fveg * height_factor;
    let ratio = f_er / fveg;
    let p_wet = if sveg > 0.0 && f_er > 0.0 && ratio < 1.0 {
        (-(1.0 - ratio).ln() * sveg / f_er).max(0.0)
    } else {
        0.0
    };
    let ei = if precip < p_wet {
        fveg * precip
    } else {
        fveg * p_wet + f_er * (precip - p_wet)
    };
    ei.clamp(0.0, precip)
}

/// Fraction of precipitation falling as rain.
///
/// Rises linearly over a band of width `tti` centred on `tt`.
pub fn rain_fraction(temp: f64, tt: f64, tti: f64) -> f64 {
    ((temp - (tt - tti / 2.0)) / tti).clamp(0.0, 1.0)
}

/// Compute snowmelt using the degree-day method.
///
/// Melt is limited by the dry snow available.
pub fn compute_melt(temp: f64, tt: f64, cfmax: f64, dry_snow: f64) -> f64 {
    (cfmax * (temp - tt).max(0.0)).min(dry_snow)
}

/// Compute refreezing of liquid water in the snowpack.
///
/// Refreezing is limited by the free water available.
pub fn compute_refreezing(temp: f64, tt: f64, cfmax: f64, cfr: f64, free_water: f64) -> f64 {
    (cfmax * cfr * (tt - temp).max(0.0)).min(free_water)
}

/// Update dry snow and free water.
///
/// Free water above `whc * dry_snow` leaves the pack.
///
/// Returns (new_dry_snow, new_free_water, outflow).
pub fn update_snow_pack(
    dry_snow: f64,
    free_water: f64,
    snowfall: f64,
    rainfall: f64,
    melt: f64,
    refreeze: f64,
    whc: f64,
) -> (f64, f64, f64) {
    let new_dry = dry_snow + snowfall + refreeze - melt;
    let liquid = free_water - refreeze + melt + rainfall;
    let capacity = whc * new_dry;
    let outflow = (liquid - capacity).max(0.0);
    (new_dry, liquid - outflow, outflow)
}

/// Result of the snow routine for one timestep [mm/d; stores in mm].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnowStep {
    pub rainfall: f64,
    pub snowfall: f64,
    pub melt: f64,
    pub refreeze: f64,
    pub outflow: f64,
    /// Outflow running off over frozen ground.
    pub melt_runoff: f64,
    /// Outflow reaching the soil surface.
    pub soil_precip: f64,
    pub dry_snow: f64,
    pub free_water: f64,
}

/// Run the snow routine on net (throughfall) precipitation.
pub fn snow_routine(
    net_precip: f64,
    temp: f64,
    dry_snow: f64,
    free_water: f64,
    p: &SnowParams,
) -> SnowStep {
    let rain_frac = rain_fraction(temp, p.tt, p.tti);
    let rainfall = rain_frac * net_precip;
    let snowfall = (1.0 - rain_frac) * net_precip;

    let melt = compute_melt(temp, p.tt, p.cfmax, dry_snow);
    let refreeze = compute_refreezing(temp, p.tt, p.cfmax, p.cfr, free_water);
    let (new_dry, new_free, outflow) =
        update_snow_pack(dry_snow, free_water, snowfall, rainfall, melt, refreeze, p.whc);

    let (melt_runoff, soil_precip) = if temp < 0.0 {
        (outflow, 0.0)
    } else {
        (0.0, outflow)
    };

    SnowStep {
        rainfall,
        snowfall,
        melt,
        refreeze,
        outflow,
        melt_runoff,
        soil_precip,
        dry_snow: new_dry,
        free_water: new_free,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected} +/- {tol}, got {actual}"
        );
    }

    fn snow() -> SnowParams {
        SnowParams {
            cfmax: 3.0,
            cfr: 0.05,
            tt: 0.0,
            tti: 1.0,
            whc: 0.1,
        }
    }

    // -- Interception --

    #[test]
    fn no_interception_when_frozen() {
        assert_eq!(interception(10.0, 0.0, 0.6, 2.0, 0.1, 0.02), 0.0);
        assert_eq!(interception(10.0, -5.0, 0.6, 2.0, 0.1, 0.02), 0.0);
    }

    #[test]
    fn small_storm_fully_intercepted_on_canopy() {
        // Pwet = -ln(1 - 0.02) * 0.2 / 0.012
        let ei = interception(0.1, 10.0, 0.6, 2.0, 0.1, 0.02);
        assert_approx(ei, 0.06, 1e-12);
    }

    #[test]
    fn large_storm_interception_saturates() {
        let fveg = 0.6;
        let f_er = fveg * 0.02;
        let p_wet = -(1.0f64 - 0.02).ln() * 0.2 / f_er;
        let ei = interception(20.0, 10.0, fveg, 2.0, 0.1, 0.02);
        assert_approx(ei, fveg * p_wet + f_er * (20.0 - p_wet), 1e-12);
        assert!(ei < 20.0);
    }

    #[test]
    fn interception_never_exceeds_precip() {
        // wetting ratio >= 1: no wetting point, interception capped at P
        let ei = interception(5.0, 10.0, 0.5, 2.0, 0.1, 3.0);
        assert!(ei <= 5.0);
        assert_eq!(interception(0.0, 10.0, 0.5, 2.0, 0.1, 0.02), 0.0);
    }

    #[test]
    fn height_factor_floor() {
        let mut v = VegetationParams {
            sla: 5.0,
            lai_ref: 2.4,
            lai_max: 8.0,
            tgrow: 200.0,
            tsenc: 20.0,
            us0: 6.0,
            ud0: 6.0,
            ug0: 1.0,
            gs_scalar: 1.0,
            cg: 1.94,
            d50: 700.0,
            hveg: 0.0,
            er_coeff: 0.02,
            er_exp: 0.114,
            s_sls: 0.1,
            fvegref_g: 0.15,
            gfrac_max: 0.15,
            w0ref_alb: 0.3,
            alb_water: 0.05,
        };
        let floor = interception_height_factor(&v);
        assert_approx(floor, 0.02 * 0.05f64.powf(0.114), 1e-15);
        v.hveg = 1.0;
        assert_approx(interception_height_factor(&v), 0.02, 1e-15);
    }

    // -- Partitioning --

    #[test]
    fn rain_fraction_band() {
        assert_eq!(rain_fraction(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(rain_fraction(-0.5, 0.0, 1.0), 0.0);
        assert_approx(rain_fraction(0.0, 0.0, 1.0), 0.5, 1e-12);
        assert_eq!(rain_fraction(0.5, 0.0, 1.0), 1.0);
        assert_eq!(rain_fraction(5.0, 0.0, 1.0), 1.0);
    }

    // -- Melt and refreezing --

    #[test]
    fn melt_limited_by_pack() {
        assert_approx(compute_melt(5.0, 0.0, 3.0, 100.0), 15.0, 1e-12);
        assert_eq!(compute_melt(5.0, 0.0, 3.0, 4.0), 4.0);
        assert_eq!(compute_melt(-5.0, 0.0, 3.0, 100.0), 0.0);
    }

    #[test]
    fn refreezing_limited_by_free_water() {
        assert_approx(compute_refreezing(-4.0, 0.0, 3.0, 0.05, 10.0), 0.6, 1e-12);
        assert_eq!(compute_refreezing(-4.0, 0.0, 3.0, 0.05, 0.2), 0.2);
        assert_eq!(compute_refreezing(4.0, 0.0, 3.0, 0.05, 10.0), 0.0);
    }

    #[test]
    fn pack_holds_water_up_to_capacity() {
        let (dry, free, out) = update_snow_pack(100.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.1);
        assert_eq!(dry, 100.0);
        assert_eq!(free, 5.0);
        assert_eq!(out, 0.0);

        let (dry, free, out) = update_snow_pack(100.0, 8.0, 0.0, 5.0, 0.0, 0.0, 0.1);
        assert_eq!(dry, 100.0);
        assert_approx(free, 10.0, 1e-12);
        assert_approx(out, 3.0, 1e-12);
    }

    #[test]
    fn pack_conserves_mass() {
        let (dry, free, out) = update_snow_pack(20.0, 1.5, 2.0, 3.0, 4.0, 0.5, 0.1);
        assert_approx(dry + free + out, 20.0 + 1.5 + 2.0 + 3.0, 1e-12);
    }

    // -- Full routine --

    #[test]
    fn subzero_precip_stored_as_snow() {
        let s = snow_routine(12.0, -3.0, 0.0, 0.0, &snow());
        assert_eq!(s.dry_snow, 12.0);
        assert_eq!(s.free_water, 0.0);
        assert_eq!(s.outflow, 0.0);
        assert_eq!(s.soil_precip, 0.0);
    }

    #[test]
    fn warm_rain_passes_through_without_pack() {
        let s = snow_routine(10.0, 8.0, 0.0, 0.0, &snow());
        assert_eq!(s.rainfall, 10.0);
        assert_eq!(s.dry_snow, 0.0);
        assert_eq!(s.soil_precip, 10.0);
        assert_eq!(s.melt_runoff, 0.0);
    }

    #[test]
    fn melt_over_frozen_ground_runs_off() {
        // Temperature below zero but above a negative threshold: melt with
        // frozen ground
        let p = SnowParams {
            tt: -2.0,
            whc: 0.0,
            ..snow()
        };
        let s = snow_routine(0.0, -1.0, 50.0, 0.0, &p);
        assert_approx(s.melt, 3.0, 1e-12);
        assert_approx(s.outflow, 3.0, 1e-12);
        assert_eq!(s.melt_runoff, s.outflow);
        assert_eq!(s.soil_precip, 0.0);
    }
}
