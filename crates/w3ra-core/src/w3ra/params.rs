//! W3RA per-unit parameters.
//!
//! Parameters arrive from the external loader as a flat name -> value
//! table. `Parameters::from_table` resolves defaults, rejects missing
//! required fields and out-of-range values, and derives the soil layer
//! capacities from the retention curve. The resulting record is immutable
//! for the run and is passed by reference into every step.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::climatology::{MonthlyClimatology, SeasonalTerms};
use super::constants::{
    ParamSpec, DIRECT_SOIL_PARAMS, MM_PER_M, RETENTION_PARAMS, ROUTING_PARAMS, SEASONAL_PARAMS,
    SNOW_PARAMS, SURFACE_PARAMS, VEGETATION_PARAMS,
};
use crate::error::{ConfigError, Result};
use crate::hand::HandProfile;

// ---------------------------------------------------------------------------
// Parameter table
// ---------------------------------------------------------------------------

/// Flat name -> value parameter table for one spatial unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterTable(BTreeMap<String, f64>);

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `"name": value` pairs.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(name.into(), value)
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ParameterTable {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Looks up parameters in a table, tracking which keys were consumed.
struct Resolver<'a> {
    table: &'a ParameterTable,
    used: BTreeSet<String>,
}

impl<'a> Resolver<'a> {
    fn new(table: &'a ParameterTable) -> Self {
        Self {
            table,
            used: BTreeSet::new(),
        }
    }

    fn lookup(&mut self, name: &str) -> Option<f64> {
        let value = self.table.get(name)?;
        self.used.insert(name.to_string());
        Some(value)
    }

    fn resolve_named(&mut self, spec: &ParamSpec, name: &str) -> Result<f64> {
        let value = match (self.lookup(name), spec.default) {
            (Some(v), _) => v,
            (None, Some(d)) => d,
            (None, None) => return Err(ConfigError::MissingParameter(name.to_string())),
        };
        if !value.is_finite() || !(spec.min..=spec.max).contains(&value) {
            return Err(ConfigError::out_of_bounds(name, value, spec.min, spec.max));
        }
        Ok(value)
    }

    fn resolve(&mut self, spec: &ParamSpec) -> Result<f64> {
        self.resolve_named(spec, spec.name)
    }

    /// Resolve a group of specs into a fixed-size array, in table order.
    fn resolve_all<const N: usize>(&mut self, specs: &[ParamSpec]) -> Result<[f64; N]> {
        let mut out = [0.0; N];
        for (slot, spec) in out.iter_mut().zip(specs) {
            *slot = self.resolve(spec)?;
        }
        Ok(out)
    }

    /// A seasonal term is either one constant or twelve `name_MM` keys.
    fn resolve_monthly(&mut self, spec: &ParamSpec) -> Result<[f64; 12]> {
        let monthly: Vec<String> = (1..=12).map(|m| format!("{}_{m:02}", spec.name)).collect();
        if !monthly.iter().any(|k| self.table.contains(k)) {
            let v = self.resolve(spec)?;
            return Ok([v; 12]);
        }
        let mut out = [0.0; 12];
        for (slot, key) in out.iter_mut().zip(&monthly) {
            if !self.table.contains(key) {
                return Err(ConfigError::MissingParameter(key.clone()));
            }
            *slot = self.resolve_named(spec, key)?;
        }
        Ok(out)
    }

    fn unused_keys(&self) -> Vec<&str> {
        self.table
            .iter()
            .map(|(k, _)| k)
            .filter(|k| !self.used.contains(*k))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Soil
// ---------------------------------------------------------------------------

/// Soil water retention curve (Campbell form) and layer geometry.
#[derive(Debug, Clone, Copy)]
pub struct RetentionCurve {
    /// Saturated volumetric water content [-].
    pub theta_s: f64,
    /// Air-entry (bubbling) pressure [m], negative.
    pub psi_s: f64,
    /// Pore-size distribution index [-].
    pub lambda: f64,
    /// Pressure heads [m] of the rapidly drainable top-soil limit, soil
    /// evaporation limit, root uptake limit, wilting point, residual.
    pub psi_fc0: f64,
    pub psi_errp: f64,
    pub psi_d: f64,
    pub psi_pwp: f64,
    pub psi_res: f64,
    /// Layer depths [m].
    pub d0: f64,
    pub ds: f64,
    pub dd: f64,
    /// Saturated conductivity [mm/d], its scaling and depth-decay exponent.
    pub k_s: f64,
    pub k0_scalar: f64,
    pub ksat_exp: f64,
}

impl RetentionCurve {
    /// Volumetric water content at pressure head `psi`.
    pub fn theta(&self, psi: f64) -> f64 {
        self.theta_s * (self.psi_s / psi).min(1.0).powf(self.lambda)
    }
}

/// Capacities, conductivities and moisture limits of the three soil layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilProfile {
    /// Layer capacities [mm].
    pub s0max: f64,
    pub ssmax: f64,
    pub sdmax: f64,
    /// Saturated conductivities [mm/d].
    pub k0sat: f64,
    pub kssat: f64,
    pub kdsat: f64,
    /// Relative wetness below which soil evaporation is limited [-].
    pub w0lim_e: f64,
    /// Relative wetness below which root uptake is limited [-].
    pub wslim_u: f64,
    pub wdlim_u: f64,
}

impl SoilProfile {
    pub fn from_retention(rc: &RetentionCurve) -> Result<Self> {
        let theta_fc0 = rc.theta(rc.psi_fc0);
        let theta_errp = rc.theta(rc.psi_errp);
        let theta_d = rc.theta(rc.psi_d);
        let theta_pwp = rc.theta(rc.psi_pwp);
        let theta_res = rc.theta(rc.psi_res);

        let kscale = |depth_below_top: f64| {
            rc.k0_scalar * (depth_below_top / rc.d0).powf(-rc.ksat_exp) * rc.k_s
        };

        let profile = Self {
            s0max: rc.d0 * MM_PER_M * (theta_fc0 - theta_res),
            ssmax: rc.ds * MM_PER_M * (rc.theta_s - theta_pwp),
            sdmax: rc.dd * MM_PER_M * (rc.theta_s - theta_pwp),
            k0sat: rc.k0_scalar * rc.k_s,
            kssat: kscale(rc.ds + rc.d0),
            kdsat: kscale(rc.dd + rc.ds + rc.d0),
            w0lim_e: (theta_errp - theta_res) / (rc.theta_s - theta_res),
            wslim_u: (theta_d - theta_pwp) / (rc.theta_s - theta_pwp),
            wdlim_u: (theta_d - theta_pwp) / (rc.theta_s - theta_pwp),
        };
        log::debug!(
            "derived soil profile: S0max={:.2} Ssmax={:.2} Sdmax={:.2} K0sat={:.3} Kssat={:.3} Kdsat={:.3}",
            profile.s0max,
            profile.ssmax,
            profile.sdmax,
            profile.k0sat,
            profile.kssat,
            profile.kdsat
        );
        profile.validate()?;
        Ok(profile)
    }

    /// Reject capacities, conductivities and limits that would make the
    /// layer balance degenerate.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("s0max", self.s0max),
            ("ssmax", self.ssmax),
            ("sdmax", self.sdmax),
            ("k0sat", self.k0sat),
            ("kssat", self.kssat),
            ("kdsat", self.kdsat),
            ("w0lim_e", self.w0lim_e),
            ("wslim_u", self.wslim_u),
            ("wdlim_u", self.wdlim_u),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Derived {
                    name,
                    value,
                    reason: "must be finite and positive",
                });
            }
        }
        Ok(())
    }

    fn from_direct(values: [f64; 9]) -> Result<Self> {
        let profile = Self {
            s0max: values[0],
            ssmax: values[1],
            sdmax: values[2],
            k0sat: values[3],
            kssat: values[4],
            kdsat: values[5],
            w0lim_e: values[6],
            wslim_u: values[7],
            wdlim_u: values[8],
        };
        profile.validate()?;
        Ok(profile)
    }

    fn to_array(self) -> [f64; 9] {
        [
            self.s0max,
            self.ssmax,
            self.sdmax,
            self.k0sat,
            self.kssat,
            self.kdsat,
            self.w0lim_e,
            self.wslim_u,
            self.wdlim_u,
        ]
    }
}

// ---------------------------------------------------------------------------
// Parameter groups
// ---------------------------------------------------------------------------

/// Terrain, surface runoff and open water parameters.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceParams {
    /// Terrain slope [-].
    pub slope: f64,
    pub slope_coeff: f64,
    pub kr_coeff: f64,
    /// Maximum soil evaporation fraction [-].
    pub fsoil_emax: f64,
    pub porosity: f64,
    /// Fraction of deep-rooted vegetation [-].
    pub fpot_deep: f64,
    /// Impervious fraction [-].
    pub f_imp: f64,
    /// Reference infiltration depths for pervious / impervious area [mm].
    pub pref: f64,
    pub pref_imp: f64,
    pub init_loss: f64,
    pub open_water_frac: f64,
    pub fwater_e: f64,
    /// Air-entry pressure [m], negative; its magnitude is the capillary fringe.
    pub psi_s: f64,
}

impl SurfaceParams {
    /// Capillary fringe height above the water table [m].
    pub fn capillary_fringe(&self) -> f64 {
        -self.psi_s
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VegetationParams {
    /// Specific leaf area [m2/kg].
    pub sla: f64,
    pub lai_ref: f64,
    pub lai_max: f64,
    /// Growth and senescence time constants [d].
    pub tgrow: f64,
    pub tsenc: f64,
    /// Maximum root water uptake from shallow, deep, groundwater [mm/d].
    pub us0: f64,
    pub ud0: f64,
    pub ug0: f64,
    pub gs_scalar: f64,
    pub cg: f64,
    pub d50: f64,
    /// Canopy height [m].
    pub hveg: f64,
    pub er_coeff: f64,
    pub er_exp: f64,
    /// Canopy storage per unit LAI [mm].
    pub s_sls: f64,
    pub fvegref_g: f64,
    pub gfrac_max: f64,
    pub w0ref_alb: f64,
    pub alb_water: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SnowParams {
    /// Degree-day melt factor [mm/C/d].
    pub cfmax: f64,
    /// Refreezing coefficient [-].
    pub cfr: f64,
    /// Threshold temperature [C].
    pub tt: f64,
    /// Width of the rain/snow transition band [C].
    pub tti: f64,
    /// Water holding capacity as a fraction of dry snow [-].
    pub whc: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RoutingParams {
    pub k_gw: f64,
    pub k_rout: f64,
}

/// Complete, validated parameter set for one spatial unit.
#[derive(Debug, Clone)]
pub struct Parameters {
    /// Latitude [deg].
    pub latitude: f64,
    pub soil: SoilProfile,
    pub surface: SurfaceParams,
    pub vegetation: VegetationParams,
    pub snow: SnowParams,
    pub routing: RoutingParams,
    pub climatology: MonthlyClimatology,
    pub hand: Arc<HandProfile>,
}

impl Parameters {
    /// Resolve a parameter table into a validated parameter set.
    ///
    /// The soil layers are taken directly from the table when it contains
    /// `s0max`, otherwise they are derived from the retention curve.
    pub fn from_table(table: &ParameterTable, hand: Arc<HandProfile>) -> Result<Self> {
        let mut r = Resolver::new(table);

        let [latitude, slope, slope_coeff, kr_coeff, fsoil_emax, porosity, fpot_deep, f_imp, pref, pref_imp, init_loss, open_water_frac, fwater_e, psi_s] =
            r.resolve_all::<14>(SURFACE_PARAMS)?;

        let v = r.resolve_all::<19>(VEGETATION_PARAMS)?;
        let [cfmax, cfr, tt, tti, whc] = r.resolve_all::<5>(SNOW_PARAMS)?;
        let [k_gw, k_rout] = r.resolve_all::<2>(ROUTING_PARAMS)?;

        let soil = if table.contains("s0max") {
            SoilProfile::from_direct(r.resolve_all::<9>(DIRECT_SOIL_PARAMS)?)?
        } else {
            let rt = r.resolve_all::<13>(RETENTION_PARAMS)?;
            let curve = RetentionCurve {
                theta_s: rt[0],
                psi_s,
                lambda: rt[1],
                k_s: rt[2],
                k0_scalar: rt[3],
                ksat_exp: rt[4],
                psi_fc0: rt[5],
                psi_errp: rt[6],
                psi_d: rt[7],
                psi_pwp: rt[8],
                psi_res: rt[9],
                d0: rt[10],
                ds: rt[11],
                dd: rt[12],
            };
            SoilProfile::from_retention(&curve)?
        };

        let mut seasonal = [[0.0; 12]; 6];
        for (slot, spec) in seasonal.iter_mut().zip(SEASONAL_PARAMS) {
            *slot = r.resolve_monthly(spec)?;
        }
        let mut climatology = MonthlyClimatology::default();
        for (m, terms) in climatology.months.iter_mut().enumerate() {
            *terms = SeasonalTerms::from_array([
                seasonal[0][m],
                seasonal[1][m],
                seasonal[2][m],
                seasonal[3][m],
                seasonal[4][m],
                seasonal[5][m],
            ]);
        }

        let unused = r.unused_keys();
        if !unused.is_empty() {
            log::warn!("ignoring unknown parameters: {}", unused.join(", "));
        }

        Ok(Self {
            latitude,
            soil,
            surface: SurfaceParams {
                slope,
                slope_coeff,
                kr_coeff,
                fsoil_emax,
                porosity,
                fpot_deep,
                f_imp,
                pref,
                pref_imp,
                init_loss,
                open_water_frac,
                fwater_e,
                psi_s,
            },
            vegetation: VegetationParams {
                sla: v[0],
                lai_ref: v[1],
                lai_max: v[2],
                tgrow: v[3],
                tsenc: v[4],
                us0: v[5],
                ud0: v[6],
                ug0: v[7],
                gs_scalar: v[8],
                cg: v[9],
                d50: v[10],
                hveg: v[11],
                er_coeff: v[12],
                er_exp: v[13],
                s_sls: v[14],
                fvegref_g: v[15],
                gfrac_max: v[16],
                w0ref_alb: v[17],
                alb_water: v[18],
            },
            snow: SnowParams {
                cfmax,
                cfr,
                tt,
                tti,
                whc,
            },
            routing: RoutingParams { k_gw, k_rout },
            climatology,
            hand,
        })
    }

    /// Flatten back into a table with the soil layers in direct form.
    ///
    /// `from_table(&p.to_table(), p.hand.clone())` reproduces `p`.
    pub fn to_table(&self) -> ParameterTable {
        let s = &self.surface;
        let v = &self.vegetation;
        let surface = [
            self.latitude,
            s.slope,
            s.slope_coeff,
            s.kr_coeff,
            s.fsoil_emax,
            s.porosity,
            s.fpot_deep,
            s.f_imp,
            s.pref,
            s.pref_imp,
            s.init_loss,
            s.open_water_frac,
            s.fwater_e,
            s.psi_s,
        ];
        let vegetation = [
            v.sla, v.lai_ref, v.lai_max, v.tgrow, v.tsenc, v.us0, v.ud0, v.ug0, v.gs_scalar,
            v.cg, v.d50, v.hveg, v.er_coeff, v.er_exp, v.s_sls, v.fvegref_g, v.gfrac_max,
            v.w0ref_alb, v.alb_water,
        ];
        let snow = [
            self.snow.cfmax,
            self.snow.cfr,
            self.snow.tt,
            self.snow.tti,
            self.snow.whc,
        ];
        let routing = [self.routing.k_gw, self.routing.k_rout];
        let soil = self.soil.to_array();

        let mut table = ParameterTable::new();
        let groups: [(&[ParamSpec], &[f64]); 5] = [
            (SURFACE_PARAMS, &surface),
            (VEGETATION_PARAMS, &vegetation),
            (SNOW_PARAMS, &snow),
            (ROUTING_PARAMS, &routing),
            (DIRECT_SOIL_PARAMS, &soil),
        ];
        for (specs, values) in groups {
            for (spec, &value) in specs.iter().zip(values) {
                table.insert(spec.name, value);
            }
        }
        for (m, terms) in self.climatology.months.iter().enumerate() {
            for (spec, value) in SEASONAL_PARAMS.iter().zip(terms.to_array()) {
                table.insert(format!("{}_{:02}", spec.name, m + 1), value);
            }
        }
        table
    }

    /// Re-check every field against its bounds.
    ///
    /// Parameter sets built field by field (rather than through
    /// `from_table`) should be validated before the first timestep.
    pub fn validate(&self) -> Result<()> {
        Self::from_table(&self.to_table(), Arc::clone(&self.hand)).map(|_| ())
    }
}
