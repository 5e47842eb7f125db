//! Forcing derivation: daylength, wind, vapour pressure, aerodynamic
//! conductance, albedo and potential evaporation.
//!
//! Pure functions. The two evaporation modes share the daylength, wind and
//! conductance terms and differ in how `E0`, `Ept` and `keps` are obtained.

use std::f64::consts::PI;

use super::climatology::SeasonalTerms;
use super::constants::{
    AXIAL_TILT_DEG, KELVIN_OFFSET, KEPS_PRESCRIBED, KU1_COEFF, MAGNUS_A, MAGNUS_B,
    MAX_DAY_FRACTION, MAX_KALPHA, MAX_VAPOUR_PRESSURE, MAX_VP_EXPONENT, MIN_AERO_CONDUCTANCE,
    MIN_DAY_FRACTION, MIN_NET_RADIATION, MIN_ROUGHNESS_HEIGHT, MIN_SHORTWAVE,
    NIGHT_WIND_REDUCTION, PRIESTLEY_TAYLOR, SNOW_COVER_PER_MM, STEFAN_BOLTZMANN, SVP_REF,
};
use super::params::VegetationParams;

/// Daylight fraction of the day from solar declination and latitude.
///
/// Clipped to [0.02, 1] so that polar night still yields a usable divisor.
pub fn daylength_fraction(day_of_year: u32, latitude: f64) -> f64 {
    let declination =
        (AXIAL_TILT_DEG.to_radians() * (2.0 * PI * (day_of_year as f64 + 9.0) / 365.25).cos())
            .tan();
    let m = 1.0 - latitude.to_radians().tan() * declination;
    let fday = (1.0 - m.clamp(0.0, 2.0)).acos() / PI;
    fday.clamp(MIN_DAY_FRACTION, MAX_DAY_FRACTION)
}

/// Daytime wind speed at the 1 m reference height [m/s].
pub fn wind_at_one_metre(wind_speed: f64, fday: f64) -> f64 {
    wind_speed * (1.0 - (1.0 - fday) * NIGHT_WIND_REDUCTION) / fday
}

/// Saturation vapour pressure [Pa] at temperature `t` [C].
pub fn saturation_vapour_pressure(t: f64) -> f64 {
    SVP_REF * (MAGNUS_A * t / (MAGNUS_B + t)).exp()
}

/// Actual vapour pressure [Pa], taking the daily minimum as dewpoint.
pub fn actual_vapour_pressure(temp_min: f64) -> f64 {
    let exponent = (MAGNUS_A * temp_min / (MAGNUS_B + temp_min)).min(MAX_VP_EXPONENT);
    (SVP_REF * exponent.exp()).min(MAX_VAPOUR_PRESSURE)
}

/// Aerodynamic conductance per unit 1 m wind speed, from canopy height.
pub fn aerodynamic_coefficient(hveg: f64) -> f64 {
    let fh = (813.0 / hveg.max(MIN_ROUGHNESS_HEIGHT) - 5.45).ln();
    KU1_COEFF / (fh * (fh + 2.3))
}

/// Aerodynamic conductance [m/s].
#[inline]
pub fn aerodynamic_conductance(ku1: f64, u1: f64) -> f64 {
    (ku1 * u1).max(MIN_AERO_CONDUCTANCE)
}

/// Snow cover fraction from total snow water equivalent.
pub fn snow_cover_fraction(total_snow: f64) -> f64 {
    (SNOW_COVER_PER_MM * total_snow).min(1.0)
}

/// Surface cover seen by the albedo model.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceCover {
    /// Relative top soil wetness [-].
    pub w0: f64,
    pub fveg: f64,
    pub fsat: f64,
    pub fwater: f64,
    pub fsnow: f64,
}

/// Area-weighted surface albedo.
pub fn albedo(cover: &SurfaceCover, terms: &SeasonalTerms, veg: &VegetationParams) -> f64 {
    let fsoil = 1.0 - cover.fveg;
    let alb_veg = terms.f_alb_vc * terms.vc;
    let dry_fraction = (-cover.w0 / veg.w0ref_alb).exp() * (1.0 - cover.fsat);
    let alb_soil = terms.alb_wet + (terms.alb_dry - terms.alb_wet) * dry_fraction;
    let alb_no_snow = cover.fveg * alb_veg + fsoil * alb_soil;
    (1.0 - cover.fwater) * (1.0 - cover.fsnow) * alb_no_snow
        + cover.fsnow * terms.alb_snow
        + cover.fwater * veg.alb_water
}

/// Evaporative demand of one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Demand {
    /// Daytime temperature [C].
    pub ta: f64,
    /// 24-hour mean temperature [C].
    pub t24: f64,
    /// Potential canopy evaporation [mm/d].
    pub e0: f64,
    /// Potential open water evaporation [mm/d].
    pub ept: f64,
    /// Psychrometric ratio analogue [-].
    pub keps: f64,
    /// Vapour pressure deficit response of canopy conductance [-].
    pub fd: f64,
}

/// Demand when potential evaporation is supplied directly.
pub fn prescribed_demand(temp: f64, pet: f64, air_pressure: f64) -> Demand {
    let pes = saturation_vapour_pressure(temp);
    let e0 = pet.max(0.0);
    Demand {
        ta: temp,
        t24: temp,
        e0,
        ept: e0,
        keps: KEPS_PRESCRIBED * air_pressure / pes,
        fd: 1.0,
    }
}

/// Radiation balance inputs.
#[derive(Debug, Clone, Copy)]
pub struct RadiationInputs {
    pub temp_min: f64,
    pub temp_max: f64,
    pub shortwave: f64,
    pub longwave: f64,
    pub air_pressure: f64,
}

/// Demand derived from the radiation balance (Penman-type combination).
///
/// `fday` is the daylight fraction, `ga` the aerodynamic conductance and
/// `surface_albedo` the output of [`albedo`].
pub fn radiation_demand(
    inputs: &RadiationInputs,
    fday: f64,
    ga: f64,
    surface_albedo: f64,
    fveg: f64,
    veg: &VegetationParams,
) -> Demand {
    let RadiationInputs {
        temp_min,
        temp_max,
        shortwave,
        longwave,
        air_pressure: pair,
    } = *inputs;

    let rg = shortwave.max(MIN_SHORTWAVE);
    let ta = temp_min + 0.75 * (temp_max - temp_min);
    let t24 = temp_min + 0.5 * (temp_max - temp_min);

    let pe = actual_vapour_pressure(temp_min);
    let pes = saturation_vapour_pressure(ta);
    let f_rh = pe / pes;
    let c_re = 0.03449 + 4.27e-5 * ta;
    let c_aero = 0.176 * (1.0 + ta / 209.1) * (pair - 0.417 * pe) * (1.0 - f_rh);
    let keps = 1.4e-3 * ((ta / 187.0).powi(2) + ta / 107.0 + 1.0) * (6.36 * pair + pe) / pes;

    // Daytime shortwave and net longwave
    let rg_eff = rg / fday;
    let rs_net = (1.0 - surface_albedo) * rg_eff;
    let rl_net = longwave - STEFAN_BOLTZMANN * (ta + KELVIN_OFFSET).powi(4);

    let fsoil = 1.0 - fveg;
    let f_gr = veg.gfrac_max * (1.0 - (-fsoil / veg.fvegref_g).exp());
    let rn_eff = ((rs_net + rl_net) * (1.0 - f_gr)).max(MIN_NET_RADIATION);

    let kalpha = (1.0 + c_aero * ga / rn_eff).min(MAX_KALPHA);
    let base = c_re / (1.0 + keps) * rn_eff * fday;

    let vpd = (pes - pe).max(0.0);
    Demand {
        ta,
        t24,
        e0: base * kalpha,
        ept: base * PRIESTLEY_TAYLOR,
        keps,
        fd: veg.cg / (1.0 + vpd / veg.d50),
    }
}
