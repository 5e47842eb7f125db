/// W3RA model orchestration functions.
///
/// - `step()`: Execute a single timestep for one unit
/// - `run()`: Execute over a forcing timeseries
use super::canopy;
use super::constants::MODEL_NAME;
use super::evaporation;
use super::fluxes::{Fluxes, FluxesTimeseries};
use super::meteo::{self, Demand, RadiationInputs, SurfaceCover};
use super::params::Parameters;
use super::routing;
use super::snow;
use super::soil::{self, Layer};
use super::state::State;
use crate::error::Result;
use crate::forcing::{Forcing, Meteo};
use crate::traits::HydrologicalModel;

/// Precomputed, run-constant terms of one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct W3Context {
    /// Aerodynamic conductance per unit wind speed.
    pub ku1: f64,
    /// Ceiling on the equilibrium vegetation cover.
    pub fvmax: f64,
    /// Height-dependent wet-canopy evaporation coefficient.
    pub interception_height_factor: f64,
    /// Top, shallow and deep soil layers.
    pub layers: [Layer; 3],
}

impl W3Context {
    pub fn new(params: &Parameters) -> Self {
        let soil = &params.soil;
        let surface = &params.surface;
        let layers = [
            Layer::lateral(
                soil.s0max,
                soil.k0sat,
                soil.kssat,
                surface.slope,
                surface.slope_coeff,
                surface.kr_coeff,
            ),
            Layer::lateral(
                soil.ssmax,
                soil.kssat,
                soil.kdsat,
                surface.slope,
                surface.slope_coeff,
                surface.kr_coeff,
            ),
            Layer::deep(soil.sdmax, soil.kdsat),
        ];
        let context = Self {
            ku1: meteo::aerodynamic_coefficient(params.vegetation.hveg),
            fvmax: canopy::max_cover(&params.vegetation),
            interception_height_factor: snow::interception_height_factor(&params.vegetation),
            layers,
        };
        log::debug!(
            "{MODEL_NAME} context: ku1={:.5} fvmax={:.4} fER/fveg={:.5}",
            context.ku1,
            context.fvmax,
            context.interception_height_factor
        );
        context
    }
}

/// Execute one timestep of W3RA for one unit.
///
/// Returns (new_state, fluxes). The input state is not modified.
pub fn step(state: &State, params: &Parameters, forcing: &Forcing) -> (State, Fluxes) {
    step_with_context(state, params, forcing, &W3Context::new(params))
}

/// Execute one timestep with a precomputed context.
pub fn step_with_context(
    state: &State,
    params: &Parameters,
    forcing: &Forcing,
    ctx: &W3Context,
) -> (State, Fluxes) {
    let forcing = forcing.cover_missing();
    let veg = &params.vegetation;
    let surface = &params.surface;
    let soil_profile = &params.soil;
    let terms = params.climatology.for_day_of_year(forcing.day_of_year);
    let precip = forcing.precip;

    // 1. Forcing derivation
    let fday = meteo::daylength_fraction(forcing.day_of_year, params.latitude);
    let u1 = meteo::wind_at_one_metre(forcing.meteo.wind_speed(), fday);
    let ga = meteo::aerodynamic_conductance(ctx.ku1, u1);

    let w0 = state.s0 / soil_profile.s0max;
    let ws = state.ss / soil_profile.ssmax;
    let wd = state.sd / soil_profile.sdmax;

    // 2. Canopy and area fractions
    let cover = canopy::cover(state.mleaf, veg);
    let areas = evaporation::area_fractions(state.sg, state.sr, surface, &params.hand);
    let fsnow = meteo::snow_cover_fraction(state.total_snow());

    let demand: Demand = match forcing.meteo {
        Meteo::Prescribed {
            temp,
            pet,
            air_pressure,
            ..
        } => meteo::prescribed_demand(temp, pet, air_pressure),
        Meteo::Radiation {
            temp_min,
            temp_max,
            shortwave,
            longwave,
            air_pressure,
            ..
        } => {
            let alb = meteo::albedo(
                &SurfaceCover {
                    w0,
                    fveg: cover.fveg,
                    fsat: areas.fsat,
                    fwater: areas.fwater,
                    fsnow,
                },
                terms,
                veg,
            );
            let inputs = RadiationInputs {
                temp_min,
                temp_max,
                shortwave,
                longwave,
                air_pressure,
            };
            meteo::radiation_demand(&inputs, fday, ga, alb, cover.fveg, veg)
        }
    };

    // 3. Evapotranspiration demand and partition
    let capacity = evaporation::uptake_capacity(ws, wd, areas.fug, areas.fsat, veg, soil_profile);
    let umax = capacity.max();
    let gs_max = veg.gs_scalar * terms.cgsmax * terms.vc;
    let gs = evaporation::canopy_conductance(cover.fveg, demand.fd, gs_max);
    let ft = evaporation::transpiration_fraction(demand.keps, ga, gs);
    let et_demand = umax.min(ft * demand.e0);
    let uptake = evaporation::distribute_uptake(et_demand, &capacity, state.ss, state.sd);
    let soil_evap =
        evaporation::soil_evaporation(demand.e0, uptake.total(), w0, &areas, surface, soil_profile);
    let open_water = evaporation::open_water_evaporation(demand.ept, &areas, surface);

    // 4. Interception and snow
    let ei = snow::interception(
        precip,
        demand.t24,
        cover.fveg,
        cover.lai,
        veg.s_sls,
        ctx.interception_height_factor,
    );
    let pack = snow::snow_routine(
        precip - ei,
        demand.t24,
        state.dry_snow,
        state.free_water,
        &params.snow,
    );

    // 5. Surface partition and soil column
    let part = routing::partition_surface(pack.soil_precip, areas.fsat, surface);
    let column = soil::solve_column(
        &ctx.layers,
        [state.s0, state.ss, state.sd],
        part.infiltration,
        [soil_evap.top, uptake.shallow, uptake.deep],
    );

    let hillslope_runoff = part.infiltration_excess
        + part.saturation_excess
        + pack.melt_runoff
        + column.total_interflow();

    // 6. Groundwater and surface store
    let (sg, qg) = routing::groundwater_step(
        state.sg,
        column.recharge(),
        soil_evap.groundwater,
        uptake.groundwater,
        params.routing.k_gw,
    );
    let store = routing::surface_store_step(
        state.sr,
        hillslope_runoff,
        qg,
        open_water.local,
        params.routing.k_rout,
    );

    // 7. Phenology
    let (mleaf, fveg_equilibrium) = canopy::update_leaf_biomass(
        state.mleaf,
        &cover,
        demand.e0,
        umax,
        demand.keps,
        ga,
        demand.fd * gs_max,
        ctx.fvmax,
        veg,
    );

    let transpiration = column.shallow.extraction + column.deep.extraction + uptake.groundwater;
    let soil_evaporation = column.top.extraction + soil_evap.groundwater;
    let open_water_evaporation = store.evaporation + open_water.remote;

    let new_state = State {
        s0: column.top.storage,
        ss: column.shallow.storage,
        sd: column.deep.storage,
        sg,
        sr: store.storage,
        mleaf,
        free_water: pack.free_water,
        dry_snow: pack.dry_snow,
    };

    let fluxes = Fluxes {
        precip,
        temp: demand.t24,
        fday,
        e0: demand.e0,
        ept: demand.ept,
        keps: demand.keps,
        ga,
        lai: cover.lai,
        fveg: cover.fveg,
        fsat: areas.fsat,
        fug: areas.fug,
        interception: ei,
        rainfall: pack.rainfall,
        snowfall: pack.snowfall,
        snow_melt: pack.melt,
        refreezing: pack.refreeze,
        snow_outflow: pack.outflow,
        melt_runoff: pack.melt_runoff,
        soil_precip: pack.soil_precip,
        saturation_excess: part.saturation_excess,
        infiltration_excess: part.infiltration_excess,
        infiltration: part.infiltration,
        top_evaporation: column.top.extraction,
        drainage_top: column.top.drainage,
        interflow_top: column.top.interflow,
        uptake_shallow: column.shallow.extraction,
        drainage_shallow: column.shallow.drainage,
        interflow_shallow: column.shallow.interflow,
        uptake_deep: column.deep.extraction,
        drainage_deep: column.deep.drainage,
        interflow_deep: column.deep.interflow,
        transpiration,
        soil_evaporation,
        groundwater_evaporation: soil_evap.groundwater,
        open_water_evaporation,
        actual_et: transpiration + soil_evaporation + open_water_evaporation + ei,
        groundwater_uptake: uptake.groundwater,
        groundwater_discharge: qg,
        hillslope_runoff,
        runoff: store.discharge,
        s0: new_state.s0,
        ss: new_state.ss,
        sd: new_state.sd,
        sg: new_state.sg,
        sr: new_state.sr,
        mleaf: new_state.mleaf,
        free_water: new_state.free_water,
        dry_snow: new_state.dry_snow,
        total_snow: new_state.total_snow(),
        fveg_equilibrium,
    };

    (new_state, fluxes)
}

/// Marker type for the W3RA `HydrologicalModel` implementation.
pub struct W3Ra;

impl HydrologicalModel for W3Ra {
    const NAME: &'static str = MODEL_NAME;
    type Params = Parameters;
    type State = State;
    type Forcing = Forcing;
    type Fluxes = Fluxes;
    type FluxesTimeseries = FluxesTimeseries;
    type Context = W3Context;

    fn prepare(params: &Self::Params) -> Self::Context {
        W3Context::new(params)
    }

    fn initialize_state(params: &Self::Params) -> Self::State {
        State::initialize(params)
    }

    fn step(
        state: &Self::State,
        params: &Self::Params,
        forcing: &Self::Forcing,
        context: &Self::Context,
    ) -> (Self::State, Self::Fluxes) {
        step_with_context(state, params, forcing, context)
    }
}

/// Run W3RA over a forcing timeseries.
///
/// Starts from `initial_state` or a cold start. Returns the collected
/// fluxes and the final state. The initial state is taken as is; use
/// [`run_checked`] for states from outside the model.
pub fn run(
    params: &Parameters,
    forcing: &[Forcing],
    initial_state: Option<&State>,
) -> (FluxesTimeseries, State) {
    W3Ra::run(params, forcing, initial_state)
}

/// [`run`] with the initial state checked against the unit's capacities
/// before the first timestep.
pub fn run_checked(
    params: &Parameters,
    forcing: &[Forcing],
    initial_state: Option<&State>,
) -> Result<(FluxesTimeseries, State)> {
    if let Some(state) = initial_state {
        state.validate_against(params)?;
    }
    Ok(run(params, forcing, initial_state))
}
