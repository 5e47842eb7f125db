//! Surface partition, groundwater and surface store routing.
//!
//! - `partition_surface()`: split soil precipitation into runoff and infiltration
//! - `groundwater_step()`: linear reservoir groundwater discharge
//! - `surface_store_step()`: linear reservoir surface / channel store

use super::params::SurfaceParams;

/// Fraction `1 - exp(-k)` of a non-negative store released per day.
#[inline]
pub fn recession(store: f64, k: f64) -> f64 {
    let available = store.max(0.0);
    available.min((1.0 - (-k).exp()) * available)
}

/// Split of water reaching the soil surface [mm/d].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePartition {
    /// Runoff from the saturated area.
    pub saturation_excess: f64,
    /// Hortonian runoff from the pervious and impervious area.
    pub infiltration_excess: f64,
    pub infiltration: f64,
}

/// Hortonian runoff depth for reference infiltration depth `pref`.
fn hortonian(pi: f64, pref: f64) -> f64 {
    pi - pref * (pi / pref).tanh()
}

/// Partition soil precipitation over the saturated, pervious and
/// impervious areas.
///
/// The impervious fraction is limited to the unsaturated area so that
/// infiltration never goes negative.
pub fn partition_surface(soil_precip: f64, fsat: f64, surface: &SurfaceParams) -> SurfacePartition {
    let saturation_excess = fsat * soil_precip;
    let pi = (soil_precip - surface.init_loss).max(0.0);
    let f_imp = surface.f_imp.min(1.0 - fsat).max(0.0);
    let infiltration_excess = (1.0 - fsat - f_imp).max(0.0) * hortonian(pi, surface.pref)
        + f_imp * hortonian(pi, surface.pref_imp);
    SurfacePartition {
        saturation_excess,
        infiltration_excess,
        infiltration: soil_precip - infiltration_excess - saturation_excess,
    }
}

/// Advance the groundwater store.
///
/// Recharge minus evaporation and uptake may drive the store negative;
/// discharge only draws on its positive part.
///
/// Returns (new_sg, discharge).
pub fn groundwater_step(
    sg: f64,
    recharge: f64,
    evaporation: f64,
    uptake: f64,
    k_gw: f64,
) -> (f64, f64) {
    let sg = sg + recharge - evaporation - uptake;
    let discharge = recession(sg, k_gw);
    (sg - discharge, discharge)
}

/// Outcome of the surface store update [mm/d; store in mm].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceStore {
    pub storage: f64,
    pub discharge: f64,
    /// Local open water evaporation actually drawn from the store.
    pub evaporation: f64,
}

/// Advance the surface store.
///
/// Local open water evaporation is capped at the water available. A
/// non-finite discharge is treated as zero.
pub fn surface_store_step(
    sr: f64,
    runoff: f64,
    groundwater_discharge: f64,
    local_evaporation: f64,
    k_rout: f64,
) -> SurfaceStore {
    let available = (sr + runoff + groundwater_discharge).max(0.0);
    let evaporation = local_evaporation.clamp(0.0, available);
    let storage = (available - evaporation).max(0.0);
    let discharge = recession(storage, k_rout);
    let discharge = if discharge.is_finite() { discharge } else { 0.0 };
    SurfaceStore {
        storage: storage - discharge,
        discharge,
        evaporation,
    }
}
