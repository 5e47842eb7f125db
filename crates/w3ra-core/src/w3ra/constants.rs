//! W3RA numerical constants, parameter defaults and bounds.
//!
//! Centralises all fixed values used throughout the model.

// -- Model contract constants --

/// Model name used in log messages.
pub const MODEL_NAME: &str = "W3RA";

/// State variables in canonical (restart) order.
pub const STATE_NAMES: &[&str] = &["s0", "ss", "sd", "mleaf", "free_water", "dry_snow", "sg", "sr"];

/// Number of state variables.
pub const STATE_SIZE: usize = 8;

// -- Physical and empirical constants --

/// Saturation vapour pressure at 0 C [Pa].
pub const SVP_REF: f64 = 610.8;

/// Magnus coefficients for saturation vapour pressure.
pub const MAGNUS_A: f64 = 17.27;
pub const MAGNUS_B: f64 = 237.3;

/// Cap on the dewpoint exponent and actual vapour pressure [Pa].
pub const MAX_VP_EXPONENT: f64 = 10.0;
pub const MAX_VAPOUR_PRESSURE: f64 = 10_000.0;

/// Earth axial tilt [deg].
pub const AXIAL_TILT_DEG: f64 = 23.439;

/// Bounds on the daylight fraction of the day.
pub const MIN_DAY_FRACTION: f64 = 0.02;
pub const MAX_DAY_FRACTION: f64 = 1.0;

/// Nighttime wind reduction relative to daytime [-].
pub const NIGHT_WIND_REDUCTION: f64 = 0.25;

/// Minimum canopy height used for roughness [m].
pub const MIN_ROUGHNESS_HEIGHT: f64 = 0.25;

/// Aerodynamic conductance coefficient for 1 m wind speed.
pub const KU1_COEFF: f64 = 0.359;

/// Floor on aerodynamic conductance [m/s].
pub const MIN_AERO_CONDUCTANCE: f64 = 0.001;

/// Floor on canopy (surface) conductance [m/s].
pub const MIN_CANOPY_CONDUCTANCE: f64 = 1e-9;

/// Floor on incoming shortwave radiation [W/m2].
pub const MIN_SHORTWAVE: f64 = 1e-4;

/// Floor on effective net radiation [W/m2].
pub const MIN_NET_RADIATION: f64 = 1.0;

/// Stefan-Boltzmann constant [W/m2/K4].
pub const STEFAN_BOLTZMANN: f64 = 5.67e-8;

/// Kelvin offset used for outgoing longwave.
pub const KELVIN_OFFSET: f64 = 273.16;

/// Priestley-Taylor coefficient for open water.
pub const PRIESTLEY_TAYLOR: f64 = 1.26;

/// Upper limit on the advection enhancement of canopy evaporation.
pub const MAX_KALPHA: f64 = 1.4;

/// Psychrometric analogue coefficient when PET is prescribed.
pub const KEPS_PRESCRIBED: f64 = 0.655e-3;

/// Floor on vegetation cover fraction [-].
pub const MIN_COVER: f64 = 1e-6;

/// Floor on LAImax when deriving the maximum cover [-].
pub const MIN_LAI_MAX: f64 = 0.002778;

/// Floor on (E0 / Umax - 1) in the equilibrium cover [-].
pub const MIN_DEMAND_EXCESS: f64 = 1e-3;

/// Snow cover fraction per mm of snow water equivalent [1/mm].
pub const SNOW_COVER_PER_MM: f64 = 0.05;

/// Minimum canopy height in the interception coefficient [m].
pub const MIN_INTERCEPTION_HEIGHT: f64 = 0.05;

/// Residual storage left behind by root uptake [mm].
pub const RESIDUAL_STORAGE: f64 = 1e-2;

/// Assumed maximum depth of shallow and deep root water uptake [m].
pub const SHALLOW_ROOT_DEPTH: f64 = 1.0;
pub const DEEP_ROOT_DEPTH: f64 = 7.0;

/// Channel surface fraction coefficient and exponent.
pub const CHANNEL_SURFACE_COEFF: f64 = 0.007;
pub const CHANNEL_SURFACE_EXP: f64 = 0.75;

/// mm per m.
pub const MM_PER_M: f64 = 1000.0;

// -- Parameter table --

/// Name, default and admissible range of one scalar parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    /// `None` marks a required parameter.
    pub default: Option<f64>,
    pub min: f64,
    pub max: f64,
}

const fn required(name: &'static str, min: f64, max: f64) -> ParamSpec {
    ParamSpec {
        name,
        default: None,
        min,
        max,
    }
}

const fn optional(name: &'static str, default: f64, min: f64, max: f64) -> ParamSpec {
    ParamSpec {
        name,
        default: Some(default),
        min,
        max,
    }
}

/// Site and surface parameters.
pub const SURFACE_PARAMS: &[ParamSpec] = &[
    required("latitude", -90.0, 90.0),
    required("slope", 0.0, 10.0),
    optional("slope_coeff", 0.9518, 0.0, 100.0),
    optional("kr_coeff", 0.0741, 0.0, 100.0),
    required("fsoil_emax", 0.0, 1.0),
    required("porosity", 0.01, 1.0),
    required("fpot_deep", 0.0, 1.0),
    required("f_imp", 0.0, 1.0),
    required("pref", 1e-3, 1e4),
    optional("pref_imp", 10.0, 1e-3, 1e4),
    optional("init_loss", 0.0, 0.0, 1e3),
    required("open_water_frac", 0.0, 1.0),
    optional("fwater_e", 1.0, 0.0, 2.0),
    required("psi_s", -100.0, -1e-6),
];

/// Vegetation parameters.
pub const VEGETATION_PARAMS: &[ParamSpec] = &[
    optional("sla", 5.0, 0.1, 100.0),
    optional("lai_ref", 2.4, 0.1, 20.0),
    required("lai_max", 0.0, 20.0),
    optional("tgrow", 200.0, 1.0, 1e4),
    optional("tsenc", 20.0, 1.0, 1e4),
    optional("us0", 6.0, 0.0, 100.0),
    optional("ud0", 6.0, 0.0, 100.0),
    optional("ug0", 1.0, 0.0, 100.0),
    required("gs_scalar", 0.0, 100.0),
    optional("cg", 1.94, 0.0, 10.0),
    optional("d50", 700.0, 1.0, 1e5),
    required("hveg", 0.0, 200.0),
    required("er_coeff", 0.0, 10.0),
    optional("er_exp", 0.114, 0.0, 5.0),
    required("s_sls", 0.0, 10.0),
    optional("fvegref_g", 0.15, 1e-3, 10.0),
    optional("gfrac_max", 0.15, 0.0, 1.0),
    optional("w0ref_alb", 0.3, 1e-3, 10.0),
    optional("alb_water", 0.05, 0.0, 1.0),
];

/// Snow routine parameters.
pub const SNOW_PARAMS: &[ParamSpec] = &[
    required("snow_cfmax", 0.0, 20.0),
    required("snow_cfr", 0.0, 1.0),
    required("snow_tt", -10.0, 10.0),
    optional("snow_tti", 1.0, 1e-3, 20.0),
    required("snow_whc", 0.0, 1.0),
];

/// Groundwater and surface store recession constants [1/d].
pub const ROUTING_PARAMS: &[ParamSpec] = &[
    required("k_gw", 0.0, 10.0),
    optional("k_rout", 0.5, 0.0, 10.0),
];

/// Soil retention curve and conductivity parameters.
pub const RETENTION_PARAMS: &[ParamSpec] = &[
    required("theta_s", 0.01, 1.0),
    required("lambda", 0.01, 5.0),
    required("k_s", 0.0, 1e5),
    required("k0_scalar", 0.0, 1e3),
    required("ksat_exp", 0.0, 20.0),
    optional("psi_fc0", -0.5, -1e7, -1e-6),
    optional("psi_errp", -10.0, -1e7, -1e-6),
    optional("psi_d", -50.0, -1e7, -1e-6),
    optional("psi_pwp", -150.0, -1e7, -1e-6),
    optional("psi_res", -1e6, -1e7, -1e-6),
    optional("d0", 0.15, 1e-3, 100.0),
    optional("ds", 0.85, 1e-3, 100.0),
    optional("dd", 4.0, 1e-3, 100.0),
];

/// Layer capacities and conductivities supplied directly instead of derived.
///
/// Used when the table contains `s0max`.
pub const DIRECT_SOIL_PARAMS: &[ParamSpec] = &[
    required("s0max", 1e-3, 1e5),
    required("ssmax", 1e-3, 1e5),
    required("sdmax", 1e-3, 1e5),
    required("k0sat", 1e-6, 1e9),
    required("kssat", 1e-6, 1e9),
    required("kdsat", 1e-6, 1e9),
    required("w0lim_e", 1e-6, 1.0),
    required("wslim_u", 1e-6, 1.0),
    required("wdlim_u", 1e-6, 1.0),
];

/// Monthly-climatology terms: (name, default, min, max).
pub const SEASONAL_PARAMS: &[ParamSpec] = &[
    optional("vc", 0.5, 0.0, 1.0),
    optional("cgsmax", 0.020, 0.0, 1.0),
    optional("f_alb_vc", 0.4, 0.0, 1.0),
    optional("alb_dry", 0.20, 0.0, 1.0),
    optional("alb_wet", 0.15, 0.0, 1.0),
    optional("alb_snow", 0.60, 0.0, 1.0),
];

// -- Forcing defaults (used to cover missing values) --

pub const DEFAULT_PRECIP: f64 = 0.0;
pub const DEFAULT_TEMP: f64 = 10.0;
pub const DEFAULT_PET: f64 = 0.0;
pub const DEFAULT_SHORTWAVE: f64 = 10.0;
pub const DEFAULT_LONGWAVE: f64 = 0.0;
pub const DEFAULT_WIND_PRESCRIBED: f64 = 1.0;
pub const DEFAULT_WIND_RADIATION: f64 = 10.0;
pub const DEFAULT_AIR_PRESSURE: f64 = 980.0;
