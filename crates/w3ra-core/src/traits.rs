/// Core trait for cell-wise water balance models.
///
/// A model is a plain state-transition function: prepare run-constant
/// context, initialise state, then advance one timestep at a time. The
/// caller owns the time loop; `run` is only a convenience over it.
pub trait HydrologicalModel {
    /// Human-readable model name, used in log messages.
    const NAME: &'static str;

    type Params;
    type State: Clone;
    type Forcing: Copy;
    type Fluxes;
    type FluxesTimeseries: FluxesTimeseriesOps<Self::Fluxes>;
    /// Precomputed context derived from params, constant for a given run.
    type Context;

    /// Precompute any run-constant data from parameters.
    fn prepare(params: &Self::Params) -> Self::Context;

    /// Create a default initial state from parameters.
    fn initialize_state(params: &Self::Params) -> Self::State;

    /// Execute one timestep: given state, params, forcing, and context,
    /// return the new state and fluxes.
    fn step(
        state: &Self::State,
        params: &Self::Params,
        forcing: &Self::Forcing,
        context: &Self::Context,
    ) -> (Self::State, Self::Fluxes);

    /// Run the model over a forcing timeseries.
    ///
    /// Returns the collected fluxes and the state after the last timestep,
    /// so a caller can persist it for a later restart.
    fn run(
        params: &Self::Params,
        forcing: &[Self::Forcing],
        initial_state: Option<&Self::State>,
    ) -> (Self::FluxesTimeseries, Self::State) {
        let context = Self::prepare(params);
        let mut state = match initial_state {
            Some(s) => s.clone(),
            None => Self::initialize_state(params),
        };

        log::info!("{}: running {} timesteps", Self::NAME, forcing.len());

        let mut outputs = Self::FluxesTimeseries::with_capacity(forcing.len());
        for f in forcing {
            let (new_state, fluxes) = Self::step(&state, params, f, &context);
            outputs.push(&fluxes);
            state = new_state;
        }

        log::info!("{}: run finished", Self::NAME);
        (outputs, state)
    }
}

/// Operations required on the timeseries collection type.
pub trait FluxesTimeseriesOps<F> {
    fn with_capacity(n: usize) -> Self;
    fn push(&mut self, f: &F);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
}

/// Flat-vector exchange of model state with an external persistence layer.
pub trait ModelState: Sized {
    /// Serialize to a flat vector in the model's canonical variable order.
    fn to_vec(&self) -> Vec<f64>;

    /// Restore from a flat vector, validating its length and contents.
    fn from_slice(arr: &[f64]) -> crate::error::Result<Self>;

    /// Length of the flat representation.
    fn array_len(&self) -> usize;
}
