use w3ra_macros::Fluxes;

#[derive(Debug, Clone, Copy, Fluxes)]
#[fluxes(timeseries_name = "SnowSeries")]
pub struct SnowFluxes {
    pub snow_melt: f64,
    pub dry_snow: f64,
}

fn main() {
    let f = SnowFluxes { snow_melt: 1.5, dry_snow: 50.0 };
    let mut ts = SnowSeries::with_capacity(5);
    ts.push(&f);
    assert_eq!(ts.len(), 1);
    assert_eq!(ts.dry_snow[0], 50.0);
    assert_eq!(SnowFluxes::field_names(), &["snow_melt", "dry_snow"]);
}
