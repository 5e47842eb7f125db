/// W3RA flux outputs.
///
/// `Fluxes` holds every flux and storage of a single timestep;
/// `FluxesTimeseries` (generated by the derive) collects them over a run.
use w3ra_macros::Fluxes;

use crate::traits::FluxesTimeseriesOps;

/// All model outputs for a single timestep [mm/d unless noted].
#[derive(Debug, Clone, Copy, Default, PartialEq, Fluxes)]
pub struct Fluxes {
    // Forcing echo
    /// Precipitation [mm/d].
    pub precip: f64,
    /// 24-hour mean temperature [C].
    pub temp: f64,

    // Derived meteorology
    /// Daylight fraction of the day [-].
    pub fday: f64,
    /// Potential canopy evaporation.
    pub e0: f64,
    /// Potential open water evaporation.
    pub ept: f64,
    /// Psychrometric ratio analogue [-].
    pub keps: f64,
    /// Aerodynamic conductance [m/s].
    pub ga: f64,

    // Canopy and area fractions
    /// Leaf area index [-].
    pub lai: f64,
    /// Vegetation cover fraction [-].
    pub fveg: f64,
    /// Saturated area fraction [-].
    pub fsat: f64,
    /// Area fraction with root access to groundwater [-].
    pub fug: f64,

    // Interception and snow
    pub interception: f64,
    pub rainfall: f64,
    pub snowfall: f64,
    pub snow_melt: f64,
    pub refreezing: f64,
    /// Water leaving the snowpack.
    pub snow_outflow: f64,
    /// Snowpack outflow running off over frozen ground.
    pub melt_runoff: f64,
    /// Snowpack outflow reaching the soil surface.
    pub soil_precip: f64,

    // Surface partition
    pub saturation_excess: f64,
    pub infiltration_excess: f64,
    pub infiltration: f64,

    // Soil layers
    pub top_evaporation: f64,
    pub drainage_top: f64,
    pub interflow_top: f64,
    pub uptake_shallow: f64,
    pub drainage_shallow: f64,
    pub interflow_shallow: f64,
    pub uptake_deep: f64,
    /// Recharge from the deep layer to groundwater.
    pub drainage_deep: f64,
    /// Deep layer saturation excess.
    pub interflow_deep: f64,

    // Evaporation components
    pub transpiration: f64,
    /// Soil evaporation from the top layer plus the saturated area.
    pub soil_evaporation: f64,
    pub groundwater_evaporation: f64,
    pub open_water_evaporation: f64,
    /// Transpiration + soil + open water + interception evaporation.
    pub actual_et: f64,

    // Groundwater and routing
    pub groundwater_uptake: f64,
    pub groundwater_discharge: f64,
    /// Surface runoff and interflow entering the surface store.
    pub hillslope_runoff: f64,
    /// Total discharge from the surface store.
    pub runoff: f64,

    // Storages after the step [mm; mleaf in kg/m2]
    pub s0: f64,
    pub ss: f64,
    pub sd: f64,
    pub sg: f64,
    pub sr: f64,
    pub mleaf: f64,
    pub free_water: f64,
    pub dry_snow: f64,
    pub total_snow: f64,
    /// Equilibrium vegetation cover targeted by the phenology update [-].
    pub fveg_equilibrium: f64,
}

impl FluxesTimeseriesOps<Fluxes> for FluxesTimeseries {
    fn with_capacity(n: usize) -> Self {
        FluxesTimeseries::with_capacity(n)
    }

    fn push(&mut self, f: &Fluxes) {
        FluxesTimeseries::push(self, f)
    }

    fn len(&self) -> usize {
        FluxesTimeseries::len(self)
    }

    fn is_empty(&self) -> bool {
        FluxesTimeseries::is_empty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_in_declaration_order() {
        let names = Fluxes::field_names();
        assert_eq!(names.len(), Fluxes::N_FIELDS);
        assert_eq!(names[0], "precip");
        assert_eq!(names[names.len() - 1], "fveg_equilibrium");
        assert!(names.contains(&"runoff"));
    }

    #[test]
    fn timeseries_collects_columns() {
        let mut ts = FluxesTimeseries::with_capacity(2);
        assert!(ts.is_empty());
        ts.push(&Fluxes {
            runoff: 1.5,
            ..Default::default()
        });
        ts.push(&Fluxes {
            runoff: 2.5,
            ..Default::default()
        });
        assert_eq!(ts.len(), 2);
        assert_eq!(ts.column("runoff"), Some(&[1.5, 2.5][..]));
        assert_eq!(ts.column("not_a_flux"), None);
    }

    #[test]
    fn values_match_fields() {
        let f = Fluxes {
            precip: 3.0,
            fveg_equilibrium: 0.4,
            ..Default::default()
        };
        let v = f.values();
        assert_eq!(v[0], 3.0);
        assert_eq!(v[Fluxes::N_FIELDS - 1], 0.4);
    }
}
