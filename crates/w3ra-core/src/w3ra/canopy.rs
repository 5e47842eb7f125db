//! Canopy state: leaf area, cover fractions and leaf biomass phenology.

use super::constants::{MIN_CANOPY_CONDUCTANCE, MIN_COVER, MIN_DEMAND_EXCESS, MIN_LAI_MAX};
use super::params::VegetationParams;

/// Leaf area and cover fractions derived from leaf biomass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cover {
    pub lai: f64,
    /// Vegetation cover fraction, floored above zero.
    pub fveg: f64,
    pub fsoil: f64,
}

pub fn cover(mleaf: f64, veg: &VegetationParams) -> Cover {
    let lai = veg.sla * mleaf;
    let fveg = (1.0 - (-lai / veg.lai_ref).exp()).max(MIN_COVER);
    Cover {
        lai,
        fveg,
        fsoil: 1.0 - fveg,
    }
}

/// Ceiling on the equilibrium cover fraction, from the maximum LAI.
pub fn max_cover(veg: &VegetationParams) -> f64 {
    1.0 - (-veg.lai_max.max(MIN_LAI_MAX) / veg.lai_ref).exp()
}

/// Cover fraction at which water-limited transpiration balances demand.
///
/// Returns `None` when both demand `e0` and supply `umax` are zero: there
/// is no signal and the canopy should be left as it is.
pub fn equilibrium_cover(
    e0: f64,
    umax: f64,
    keps: f64,
    ga: f64,
    max_conductance: f64,
    fvmax: f64,
) -> Option<f64> {
    if e0 <= 0.0 && umax <= 0.0 {
        return None;
    }
    let excess = (e0 / umax - 1.0).max(MIN_DEMAND_EXCESS);
    let fveq = (1.0 / excess)
        * (keps / (1.0 + keps))
        * (ga / max_conductance.max(MIN_CANOPY_CONDUCTANCE));
    Some(fveq.min(fvmax).max(MIN_COVER))
}

/// Leaf biomass sustaining a given cover fraction [kg/m2].
pub fn equilibrium_biomass(fveq: f64, veg: &VegetationParams) -> f64 {
    -(1.0 - fveq).ln() * veg.lai_ref / veg.sla
}

/// Relax leaf biomass toward its target.
///
/// Growth proceeds at `1/tgrow` of the gap per day, senescence at `1/tsenc`.
pub fn relax_biomass(mleaf: f64, target: f64, veg: &VegetationParams) -> f64 {
    let gap = target - mleaf;
    if gap > 0.0 {
        mleaf + gap / veg.tgrow
    } else if gap < 0.0 {
        mleaf + gap / veg.tsenc
    } else {
        mleaf
    }
}

/// Phenology update after the water balance.
///
/// Returns (new_mleaf, equilibrium cover). When there is no signal the
/// biomass is unchanged and the current cover is reported.
#[allow(clippy::too_many_arguments)]
pub fn update_leaf_biomass(
    mleaf: f64,
    current: &Cover,
    e0: f64,
    umax: f64,
    keps: f64,
    ga: f64,
    max_conductance: f64,
    fvmax: f64,
    veg: &VegetationParams,
) -> (f64, f64) {
    match equilibrium_cover(e0, umax, keps, ga, max_conductance, fvmax) {
        Some(fveq) => {
            let target = equilibrium_biomass(fveq, veg);
            (relax_biomass(mleaf, target, veg), fveq)
        }
        None => (mleaf, current.fveg),
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

    #[test]
    fn cover_from_biomass() {
        let c = cover(0.48, &veg());
        assert_approx(c.lai, 2.4, 1e-12);
        assert_approx(c.fveg, 1.0 - (-1.0f64).exp(), 1e-12);
        assert_approx(c.fveg + c.fsoil, 1.0, 1e-15);
    }

    #[test]
    fn zero_biomass_cover_floored() {
        let c = cover(0.0, &veg());
        assert_eq!(c.lai, 0.0);
        assert_eq!(c.fveg, MIN_COVER);
    }

    #[test]
    fn max_cover_below_one() {
        let fvmax = max_cover(&veg());
        assert!(fvmax > 0.9 && fvmax < 1.0);
        let mut bare = veg();
        bare.lai_max = 0.0;
        assert!(max_cover(&bare) > 0.0);
    }

    #[test]
    fn no_signal_leaves_canopy() {
        assert_eq!(equilibrium_cover(0.0, 0.0, 0.05, 0.01, 0.01, 0.9), None);
        let c = cover(0.3, &veg());
        let (m, fveq) = update_leaf_biomass(0.3, &c, 0.0, 0.0, 0.05, 0.01, 0.01, 0.9, &veg());
        assert_eq!(m, 0.3);
        assert_eq!(fveq, c.fveg);
    }

    #[test]
    fn no_supply_gives_floor() {
        assert_eq!(
            equilibrium_cover(3.0, 0.0, 0.05, 0.01, 0.01, 0.9),
            Some(MIN_COVER)
        );
    }

    #[test]
    fn ample_supply_capped_at_max_cover() {
        // E0 below supply: demand excess floored, cover at its ceiling
        let fveq = equilibrium_cover(1.0, 6.0, 0.5, 0.02, 0.005, 0.9).unwrap();
        assert_eq!(fveq, 0.9);
    }

    #[test]
    fn equilibrium_biomass_inverts_cover() {
        let v = veg();
        let m = equilibrium_biomass(0.6, &v);
        assert_approx(cover(m, &v).fveg, 0.6, 1e-12);
    }

    #[test]
    fn growth_slower_than_senescence() {
        let v = veg();
        let grown = relax_biomass(1.0, 3.0, &v);
        let senesced = relax_biomass(3.0, 1.0, &v);
        assert_approx(grown, 1.0 + 2.0 / 200.0, 1e-12);
        assert_approx(senesced, 3.0 - 2.0 / 20.0, 1e-12);
        assert_eq!(relax_biomass(2.0, 2.0, &v), 2.0);
    }

    #[test]
    fn relaxation_does_not_overshoot() {
        let v = veg();
        let mut m = 0.1;
        for _ in 0..5000 {
            m = relax_biomass(m, 1.0, &v);
            assert!(m <= 1.0);
        }
        assert_approx(m, 1.0, 1e-6);
    }
}
