//! Water balance properties of the full W3RA step.

use std::sync::Arc;

use proptest::prelude::*;

use w3ra_core::w3ra::routing::{groundwater_step, surface_store_step};
use w3ra_core::w3ra::run::{run, step};
use w3ra_core::w3ra::soil::{solve_layer, Layer, LayerOutcome};
use w3ra_core::{Fluxes, Forcing, HandProfile, ModelState, ParameterTable, Parameters, State};

const TOL: f64 = 1e-8;

fn assert_approx(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() < tol,
        "expected {expected} +/- {tol}, got {actual}"
    );
}

fn table() -> ParameterTable {
    ParameterTable::new()
        .with("latitude", 52.0)
        .with("slope", 0.0)
        .with("fsoil_emax", 0.5)
        .with("porosity", 0.4)
        .with("fpot_deep", 0.2)
        .with("f_imp", 0.0)
        .with("pref", 50.0)
        .with("open_water_frac", 0.0)
        .with("psi_s", -0.3)
        .with("lai_max", 8.0)
        .with("gs_scalar", 1.0)
        .with("hveg", 2.0)
        .with("er_coeff", 0.02)
        .with("s_sls", 0.1)
        .with("snow_cfmax", 3.0)
        .with("snow_cfr", 0.05)
        .with("snow_tt", 0.0)
        .with("snow_whc", 0.1)
        .with("k_gw", 0.05)
        .with("s0max", 50.0)
        .with("ssmax", 200.0)
        .with("sdmax", 400.0)
        .with("k0sat", 5.0)
        .with("kssat", 5.0)
        .with("kdsat", 5.0)
        .with("w0lim_e", 0.8)
        .with("wslim_u", 0.5)
        .with("wdlim_u", 0.5)
}

fn hand() -> Arc<HandProfile> {
    Arc::new(HandProfile::with_drainage_base(&[1.0, 5.0, 20.0], &[10.0, 50.0, 100.0]).unwrap())
}

fn params_from(table: &ParameterTable) -> Parameters {
    Parameters::from_table(table, hand()).unwrap()
}

fn params() -> Parameters {
    params_from(&table())
}

fn total_storage(s: &State) -> f64 {
    s.s0 + s.ss + s.sd + s.sg + s.sr + s.free_water + s.dry_snow
}

fn assert_layer_closure(before: &State, after: &State, f: &Fluxes) {
    assert_approx(
        after.s0,
        before.s0 + f.infiltration - f.top_evaporation - f.drainage_top - f.interflow_top,
        TOL,
    );
    assert_approx(
        after.ss,
        before.ss + f.drainage_top - f.uptake_shallow - f.drainage_shallow - f.interflow_shallow,
        TOL,
    );
    assert_approx(
        after.sd,
        before.sd + f.drainage_shallow - f.uptake_deep - f.drainage_deep - f.interflow_deep,
        TOL,
    );
}

fn assert_bounds(s: &State, p: &Parameters) {
    assert!(s.s0 >= 0.0 && s.s0 <= p.soil.s0max, "s0 = {}", s.s0);
    assert!(s.ss >= 0.0 && s.ss <= p.soil.ssmax, "ss = {}", s.ss);
    assert!(s.sd >= 0.0 && s.sd <= p.soil.sdmax, "sd = {}", s.sd);
    assert!(s.sr >= 0.0, "sr = {}", s.sr);
    assert!(s.free_water >= 0.0, "free_water = {}", s.free_water);
    assert!(s.dry_snow >= 0.0, "dry_snow = {}", s.dry_snow);
}

// -- Single-layer boundaries --

#[test]
fn depletion_boundary() {
    let layer = Layer::lateral(50.0, 5.0, 5.0, 0.0, 0.9518, 0.0741);
    let b = solve_layer(&layer, 0.0, 0.0, 2.0);
    assert_eq!(b.outcome, LayerOutcome::Depleted);
    assert_eq!(b.extraction, 0.0);
    assert_eq!(b.storage, 0.0);
    assert_eq!(b.drainage, 0.0);
    assert_eq!(b.interflow, 0.0);
}

#[test]
fn saturation_boundary() {
    let layer = Layer::lateral(200.0, 20.0, 5.0, 0.3, 0.9518, 0.0741);
    let inflow = 150.0;
    let b = solve_layer(&layer, 200.0, inflow, 0.0);
    assert_eq!(b.outcome, LayerOutcome::Saturated);
    assert_eq!(b.storage, 200.0);
    // Ka split by Rh, plus the surplus over capacity and Ka
    let surplus = inflow - layer.k_sat;
    assert_approx(b.drainage + b.interflow, layer.k_sat + surplus, 1e-12);
    let rh = layer.interflow_fraction(1.0);
    assert_approx(b.drainage, (1.0 - rh) * layer.k_sat, 1e-12);
}

// -- Full step --

#[test]
fn snow_conservation_below_freezing() {
    let p = params();
    let s = State {
        dry_snow: 0.0,
        free_water: 0.0,
        ..State::initialize(&p)
    };
    let forcing = Forcing::prescribed(20, 12.0, -5.0, 0.5, 2.0, 101_325.0);
    let (next, f) = step(&s, &p, &forcing);
    assert_eq!(f.interception, 0.0);
    assert_approx(next.dry_snow, 12.0, 1e-12);
    assert_eq!(next.free_water, 0.0);
    assert_eq!(f.soil_precip, 0.0);
    assert_eq!(f.melt_runoff, 0.0);
    assert_eq!(f.infiltration, 0.0);
}

#[test]
fn zero_forcing_leaves_water_untouched() {
    // Empty soils, no precipitation and no demand. Leaf biomass still
    // relaxes toward its equilibrium, so only the water stores are fixed.
    let p = params();
    let s = State {
        mleaf: 0.4,
        ..State::empty()
    };
    let forcing = Forcing::prescribed(150, 0.0, 0.0, 0.0, 0.0, 0.0);
    let (next, f) = step(&s, &p, &forcing);
    assert_eq!(total_storage(&next), 0.0);
    assert_eq!(
        State {
            mleaf: s.mleaf,
            ..next
        },
        s
    );
    assert!(next.mleaf > 0.0 && next.mleaf.is_finite());
    for v in [
        f.interception,
        f.infiltration,
        f.saturation_excess,
        f.infiltration_excess,
        f.drainage_top,
        f.drainage_shallow,
        f.drainage_deep,
        f.interflow_top,
        f.interflow_shallow,
        f.interflow_deep,
        f.transpiration,
        f.soil_evaporation,
        f.groundwater_evaporation,
        f.open_water_evaporation,
        f.actual_et,
        f.groundwater_discharge,
        f.hillslope_runoff,
        f.runoff,
    ] {
        assert_eq!(v, 0.0);
    }
}

#[test]
fn recession_is_monotonic() {
    let mut sg = 120.0;
    let mut sr = 30.0;
    for _ in 0..200 {
        let (next_sg, _) = groundwater_step(sg, 0.0, 0.0, 0.0, 0.05);
        let store = surface_store_step(sr, 0.0, 0.0, 0.0, 0.5);
        assert!(next_sg < sg || sg == 0.0);
        assert!(store.storage < sr || sr == 0.0);
        assert!(next_sg >= 0.0 && store.storage >= 0.0);
        sg = next_sg;
        sr = store.storage;
    }
}

#[test]
fn end_to_end_wet_day() {
    // Interception off, no open water: every evaporative flux draws on e0
    let p = params_from(&table().with("er_coeff", 0.0).with("s_sls", 0.0));
    let s = State {
        s0: 25.0,
        ss: 100.0,
        sd: 200.0,
        sg: 0.0,
        sr: 0.0,
        mleaf: 0.4,
        free_water: 0.0,
        dry_snow: 0.0,
    };
    let forcing = Forcing::prescribed(180, 20.0, 15.0, 5.0, 2.0, 101_325.0);
    let (next, f) = step(&s, &p, &forcing);

    assert!(f.drainage_top > 0.0);
    assert!(f.actual_et <= 5.0 + 1e-12, "actual_et = {}", f.actual_et);
    assert!(f.runoff >= 0.0);
    assert_layer_closure(&s, &next, &f);
    assert_bounds(&next, &p);
}

#[test]
fn unit_balance_closes_over_a_year() {
    let p = params();
    let forcing: Vec<Forcing> = (0..365u32)
        .map(|t| {
            let doy = t + 1;
            let season = (2.0 * std::f64::consts::PI * (doy as f64 - 200.0) / 365.0).cos();
            let precip = if t % 4 == 0 { 15.0 } else { 0.5 };
            Forcing::prescribed(doy, precip, 5.0 + 15.0 * season, 2.0 + 2.0 * season, 2.5, 101_000.0)
        })
        .collect();
    let initial = State::initialize(&p);
    let (ts, last) = run(&p, &forcing, Some(&initial));

    let precip: f64 = ts.precip.iter().sum();
    let et: f64 = ts.actual_et.iter().sum();
    let runoff: f64 = ts.runoff.iter().sum();
    assert_approx(
        total_storage(&last) - total_storage(&initial),
        precip - et - runoff,
        1e-6,
    );
}

#[test]
fn restart_vector_round_trip() {
    let p = params();
    let s = State::initialize(&p);
    let (next, _) = step(&s, &p, &Forcing::prescribed(90, 7.0, 8.0, 2.0, 3.0, 100_000.0));
    let restored = State::from_slice(&next.to_vec()).unwrap();
    assert_eq!(restored, next);
    assert!(State::from_slice(&next.to_vec()[..5]).is_err());
}

// -- Random states and forcings --

fn state_strategy() -> impl Strategy<Value = State> {
    (
        0.0..=50.0f64,
        0.0..=200.0f64,
        0.0..=400.0f64,
        0.0..500.0f64,
        0.0..100.0f64,
        0.01..2.0f64,
        0.0..20.0f64,
        0.0..300.0f64,
    )
        .prop_map(|(s0, ss, sd, sg, sr, mleaf, free_water, dry_snow)| State {
            s0,
            ss,
            sd,
            sg,
            sr,
            mleaf,
            free_water,
            dry_snow,
        })
}

fn forcing_strategy() -> impl Strategy<Value = Forcing> {
    (
        1u32..=366,
        0.0..150.0f64,
        -25.0..40.0f64,
        0.0..15.0f64,
        0.0..12.0f64,
        70_000.0..105_000.0f64,
    )
        .prop_map(|(doy, precip, temp, pet, wind, pressure)| {
            Forcing::prescribed(doy, precip, temp, pet, wind, pressure)
        })
}

proptest! {
    #[test]
    fn layer_balances_close(s in state_strategy(), forcing in forcing_strategy()) {
        let p = params();
        let (next, f) = step(&s, &p, &forcing);
        assert_layer_closure(&s, &next, &f);
    }

    #[test]
    fn stores_stay_in_bounds(s in state_strategy(), forcing in forcing_strategy()) {
        let p = params();
        let (next, f) = step(&s, &p, &forcing);
        assert_bounds(&next, &p);
        prop_assert!(f.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn unit_balance_closes(s in state_strategy(), forcing in forcing_strategy()) {
        // Without remote open water every evaporative flux is drawn from a store
        let p = params();
        let (next, f) = step(&s, &p, &forcing);
        let change = total_storage(&next) - total_storage(&s);
        prop_assert!((change - (f.precip - f.actual_et - f.runoff)).abs() < 1e-7);
    }
}
