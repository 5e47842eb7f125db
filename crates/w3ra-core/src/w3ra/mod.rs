/// W3RA — World-Wide Water Resources Assessment land-surface model.
///
/// A daily cell-wise water balance with canopy interception, a degree-day
/// snowpack, three soil layers, groundwater and a surface store, and a
/// dynamic vegetation cover driven by leaf biomass.
pub mod canopy;
pub mod climatology;
pub mod constants;
pub mod evaporation;
pub mod fluxes;
pub mod meteo;
pub mod params;
pub mod routing;
pub mod run;
pub mod snow;
pub mod soil;
pub mod state;
