use w3ra_macros::Fluxes;

#[derive(Debug, Clone, Copy, Fluxes)]
pub struct LayerFluxes {
    pub inflow: f64,
    pub drainage: f64,
    pub interflow: f64,
}

fn main() {
    let f = LayerFluxes { inflow: 4.0, drainage: 1.5, interflow: 0.5 };
    let mut ts = LayerFluxesTimeseries::with_capacity(10);
    ts.push(&f);
    ts.push(&f);
    assert_eq!(ts.len(), 2);
    assert!(!ts.is_empty());
    assert_eq!(ts.column("drainage"), Some(&[1.5, 1.5][..]));
    assert!(ts.column("runoff").is_none());
    assert_eq!(LayerFluxes::field_names(), &["inflow", "drainage", "interflow"]);
    assert_eq!(LayerFluxes::N_FIELDS, 3);
    assert_eq!(f.values(), [4.0, 1.5, 0.5]);
}
