//! Evapotranspiration demand and its partition over stores.
//!
//! Saturated and groundwater-accessible area fractions come from the HAND
//! profile. Transpiration is limited by root water uptake capacity and
//! shared between shallow, deep and groundwater sources; soil and open
//! water evaporation take the remaining demand.

use super::constants::{
    CHANNEL_SURFACE_COEFF, CHANNEL_SURFACE_EXP, DEEP_ROOT_DEPTH, MIN_CANOPY_CONDUCTANCE,
    MM_PER_M, RESIDUAL_STORAGE, SHALLOW_ROOT_DEPTH,
};
use super::params::{SoilProfile, SurfaceParams, VegetationParams};
use crate::hand::HandProfile;

/// Area fractions of a unit [-].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaFractions {
    /// Area where the water table plus capillary fringe reaches the surface.
    pub fg: f64,
    /// Area where roots reach the water table.
    pub fug: f64,
    /// Open water fed by the local channel store.
    pub fw_local: f64,
    /// All open water.
    pub fwater: f64,
    /// Saturated area, open water included.
    pub fsat: f64,
}

/// Channel surface fraction from the surface store [-].
pub fn channel_surface_fraction(sr: f64) -> f64 {
    (CHANNEL_SURFACE_COEFF * sr.max(0.0).powf(CHANNEL_SURFACE_EXP)).min(1.0)
}

pub fn area_fractions(
    sg: f64,
    sr: f64,
    surface: &SurfaceParams,
    hand: &HandProfile,
) -> AreaFractions {
    // Water table height above the drainage base [m]
    let water_table = hand.base() + sg / (surface.porosity * MM_PER_M);

    let fg = hand.fraction_below(water_table + surface.capillary_fringe());
    let fug = hand.fraction_below(water_table + SHALLOW_ROOT_DEPTH)
        * (1.0 - surface.fpot_deep)
        + hand.fraction_below(water_table + DEEP_ROOT_DEPTH) * surface.fpot_deep;

    let fw_local = channel_surface_fraction(sr);
    let fwater = fw_local.max(surface.open_water_frac);
    let fsat = fwater.max(fg).min(1.0);
    AreaFractions {
        fg,
        fug,
        fw_local,
        fwater,
        fsat,
    }
}

/// Root water uptake capacity per source [mm/d].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Uptake {
    pub shallow: f64,
    pub deep: f64,
    pub groundwater: f64,
}

impl Uptake {
    pub fn total(&self) -> f64 {
        self.shallow + self.deep + self.groundwater
    }

    pub fn max(&self) -> f64 {
        self.shallow.max(self.deep).max(self.groundwater)
    }
}

/// Maximum root water uptake from each source.
///
/// `ws`, `wd` are the relative wetness of the shallow and deep layers.
pub fn uptake_capacity(
    ws: f64,
    wd: f64,
    fug: f64,
    fsat: f64,
    veg: &VegetationParams,
    soil: &SoilProfile,
) -> Uptake {
    Uptake {
        shallow: (veg.us0 * (ws / soil.wslim_u).min(1.0)).max(0.0),
        deep: (veg.ud0 * (wd / soil.wdlim_u).min(1.0)).max(0.0),
        groundwater: (veg.ug0 * (fug - fsat).max(0.0)).max(0.0),
    }
}

/// Canopy conductance [m/s], floored to keep `ga / gs` finite.
pub fn canopy_conductance(fveg: f64, fd: f64, max_conductance: f64) -> f64 {
    (fveg * fd * max_conductance).max(MIN_CANOPY_CONDUCTANCE)
}

/// Fraction of potential evaporation available for transpiration.
pub fn transpiration_fraction(keps: f64, ga: f64, gs: f64) -> f64 {
    1.0 / (1.0 + (keps / (1.0 + keps)) * ga / gs)
}

/// Share transpiration over sources in proportion to their capacity.
///
/// Each share is capped at the store it draws from minus a residual
/// (groundwater uptake is limited by the deep store). Zero capacity
/// everywhere means zero uptake.
pub fn distribute_uptake(transpiration: f64, capacity: &Uptake, ss: f64, sd: f64) -> Uptake {
    let total = capacity.total();
    if total <= 0.0 {
        return Uptake::default();
    }
    let share = |cap: f64, store: f64| {
        (cap / total * transpiration)
            .min(store - RESIDUAL_STORAGE)
            .max(0.0)
    };
    Uptake {
        shallow: share(capacity.shallow, ss),
        deep: share(capacity.deep, sd),
        groundwater: share(capacity.groundwater, sd),
    }
}

/// Soil evaporation split by source [mm/d].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilEvaporation {
    /// From the top soil layer, over the unsaturated area.
    pub top: f64,
    /// From groundwater, over the saturated area that is not open water.
    pub groundwater: f64,
}

pub fn soil_evaporation(
    e0: f64,
    transpiration: f64,
    w0: f64,
    areas: &AreaFractions,
    surface: &SurfaceParams,
    soil: &SoilProfile,
) -> SoilEvaporation {
    let remaining = (e0 - transpiration).max(0.0);
    let fsoil_e = surface.fsoil_emax * (w0 / soil.w0lim_e).min(1.0);
    SoilEvaporation {
        top: (1.0 - areas.fsat) * fsoil_e * remaining,
        groundwater: (areas.fsat - areas.fwater).max(0.0) * surface.fsoil_emax * remaining,
    }
}

/// Open water evaporation split by source [mm/d].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenWaterEvaporation {
    /// From local channels; drawn from the surface store.
    pub local: f64,
    /// From remaining open water.
    pub remote: f64,
}

pub fn open_water_evaporation(
    ept: f64,
    areas: &AreaFractions,
    surface: &SurfaceParams,
) -> OpenWaterEvaporation {
    OpenWaterEvaporation {
        local: areas.fw_local * surface.fwater_e * ept,
        remote: (areas.fwater - areas.fw_local) * surface.fwater_e * ept,
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

    fn surface() -> SurfaceParams {
        SurfaceParams {
            slope: 0.05,
            slope_coeff: 0.9518,
            kr_coeff: 0.0741,
            fsoil_emax: 0.5,
            porosity: 0.4,
            fpot_deep: 0.2,
            f_imp: 0.0,
            pref: 50.0,
            pref_imp: 10.0,
            init_loss: 0.0,
            open_water_frac: 0.0,
            fwater_e: 1.0,
            psi_s: -0.3,
        }
    }

    fn soil() -> SoilProfile {
        SoilProfile {
            s0max: 50.0,
            ssmax: 200.0,
            sdmax: 400.0,
            k0sat: 5.0,
            kssat: 5.0,
            kdsat: 5.0,
            w0lim_e: 0.8,
            wslim_u: 0.5,
            wdlim_u: 0.5,
        }
    }

    fn veg() -> VegetationParams {
        VegetationParams {
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
            hveg: 1.0,
            er_coeff: 0.02,
            er_exp: 0.114,
            s_sls: 0.1,
            fvegref_g: 0.15,
            gfrac_max: 0.15,
            w0ref_alb: 0.3,
            alb_water: 0.05,
        }
    }

    fn hand() -> HandProfile {
        HandProfile::with_drainage_base(&[1.0, 5.0, 20.0], &[10.0, 50.0, 100.0]).unwrap()
    }

    // -- Area fractions --

    #[test]
    fn empty_groundwater_area_fractions() {
        let a = area_fractions(0.0, 0.0, &surface(), &hand());
        // capillary fringe 0.3 m: 0.3 / 1.0 * 10%
        assert_approx(a.fg, 0.03, 1e-12);
        assert_approx(a.fsat, 0.03, 1e-12);
        // 1 m -> 10%, 7 m -> 50 + 2/15 * 50 %
        let deep = 0.5 + 2.0 / 15.0 * 0.5;
        assert_approx(a.fug, 0.1 * 0.8 + deep * 0.2, 1e-12);
        assert_eq!(a.fwater, 0.0);
    }

    #[test]
    fn rising_water_table_increases_saturation() {
        let low = area_fractions(0.0, 0.0, &surface(), &hand());
        // 800 mm / (0.4 * 1000) = 2 m
        let high = area_fractions(800.0, 0.0, &surface(), &hand());
        assert!(high.fsat > low.fsat);
        assert!(high.fug > low.fug);
    }

    #[test]
    fn open_water_sets_saturation_floor() {
        let mut s = surface();
        s.open_water_frac = 0.25;
        let a = area_fractions(0.0, 0.0, &s, &hand());
        assert_eq!(a.fwater, 0.25);
        assert_eq!(a.fsat, 0.25);
    }

    #[test]
    fn channel_surface_fraction_capped() {
        assert_eq!(channel_surface_fraction(0.0), 0.0);
        assert_approx(channel_surface_fraction(16.0), 0.007 * 8.0, 1e-12);
        assert_eq!(channel_surface_fraction(1e6), 1.0);
    }

    // -- Uptake --

    #[test]
    fn uptake_limited_by_wetness() {
        let u = uptake_capacity(0.25, 1.0, 0.5, 0.1, &veg(), &soil());
        assert_approx(u.shallow, 3.0, 1e-12);
        assert_approx(u.deep, 6.0, 1e-12);
        assert_approx(u.groundwater, 0.4, 1e-12);
        assert_eq!(u.max(), 6.0);
    }

    #[test]
    fn no_groundwater_uptake_when_saturated() {
        let u = uptake_capacity(0.5, 0.5, 0.2, 0.6, &veg(), &soil());
        assert_eq!(u.groundwater, 0.0);
    }

    #[test]
    fn distribution_proportional() {
        let cap = Uptake {
            shallow: 3.0,
            deep: 6.0,
            groundwater: 1.0,
        };
        let u = distribute_uptake(2.0, &cap, 100.0, 100.0);
        assert_approx(u.shallow, 0.6, 1e-12);
        assert_approx(u.deep, 1.2, 1e-12);
        assert_approx(u.groundwater, 0.2, 1e-12);
        assert_approx(u.total(), 2.0, 1e-12);
    }

    #[test]
    fn distribution_capped_by_store() {
        let cap = Uptake {
            shallow: 1.0,
            deep: 1.0,
            groundwater: 0.0,
        };
        let u = distribute_uptake(4.0, &cap, 0.5, 0.005);
        assert_approx(u.shallow, 0.49, 1e-12);
        assert_eq!(u.deep, 0.0);
    }

    #[test]
    fn distribution_zero_capacity() {
        let u = distribute_uptake(3.0, &Uptake::default(), 10.0, 10.0);
        assert_eq!(u, Uptake::default());
    }

    // -- Transpiration terms --

    #[test]
    fn conductance_floor() {
        assert_eq!(canopy_conductance(0.0, 1.0, 0.01), MIN_CANOPY_CONDUCTANCE);
        assert!(transpiration_fraction(0.05, 0.02, MIN_CANOPY_CONDUCTANCE) < 1e-5);
    }

    #[test]
    fn transpiration_fraction_bounds() {
        let ft = transpiration_fraction(0.5, 0.02, 0.01);
        assert_approx(ft, 1.0 / (1.0 + 2.0 / 3.0), 1e-12);
        assert!(transpiration_fraction(0.5, 1e-9, 1.0) > 0.999);
    }

    // -- Soil and open water evaporation --

    #[test]
    fn soil_evaporation_split() {
        let areas = AreaFractions {
            fg: 0.2,
            fug: 0.4,
            fw_local: 0.0,
            fwater: 0.05,
            fsat: 0.2,
        };
        let e = soil_evaporation(5.0, 1.0, 0.4, &areas, &surface(), &soil());
        // fsoilE = 0.5 * 0.5
        assert_approx(e.top, 0.8 * 0.25 * 4.0, 1e-12);
        assert_approx(e.groundwater, 0.15 * 0.5 * 4.0, 1e-12);
    }

    #[test]
    fn soil_evaporation_zero_when_transpiration_meets_demand() {
        let areas = area_fractions(0.0, 0.0, &surface(), &hand());
        let e = soil_evaporation(2.0, 2.5, 0.9, &areas, &surface(), &soil());
        assert_eq!(e.top, 0.0);
        assert_eq!(e.groundwater, 0.0);
    }

    #[test]
    fn open_water_split() {
        let areas = AreaFractions {
            fg: 0.0,
            fug: 0.0,
            fw_local: 0.02,
            fwater: 0.1,
            fsat: 0.1,
        };
        let e = open_water_evaporation(5.0, &areas, &surface());
        assert_approx(e.local, 0.1, 1e-12);
        assert_approx(e.remote, 0.4, 1e-12);
    }
}
