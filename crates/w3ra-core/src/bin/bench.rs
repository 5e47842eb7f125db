/// Pure Rust core benchmarks for W3RA.
///
/// Uses std::time::Instant for timing, a deterministic LCG PRNG for data generation,
/// and std::hint::black_box to prevent dead-code elimination.
use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

use w3ra_core::forcing::Forcing;
use w3ra_core::grid::{Cell, Grid};
use w3ra_core::hand::HandProfile;
use w3ra_core::w3ra::params::{ParameterTable, Parameters};
use w3ra_core::w3ra::run;
use w3ra_core::Result;

const REPEATS: usize = 7;

/// Simple LCG PRNG for deterministic data generation.
fn make_forcing(n: usize, seed: u64) -> Vec<Forcing> {
    let mut state = seed;
    let mut next_f64 = || -> f64 {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as f64 / (1u64 << 31) as f64
    };

    (0..n)
        .map(|t| {
            let doy = (t % 365) as u32 + 1;
            let precip = next_f64() * 10.0;
            let temp = -10.0 + next_f64() * 30.0;
            let pet = 0.5 + next_f64() * 4.5;
            let wind = 0.5 + next_f64() * 4.0;
            Forcing::prescribed(doy, precip, temp, pet, wind, 101_325.0)
        })
        .collect()
}

fn bench_params() -> Result<Parameters> {
    let table = ParameterTable::new()
        .with("latitude", 47.0)
        .with("slope", 0.05)
        .with("fsoil_emax", 0.5)
        .with("porosity", 0.4)
        .with("fpot_deep", 0.2)
        .with("f_imp", 0.02)
        .with("pref", 50.0)
        .with("open_water_frac", 0.01)
        .with("psi_s", -0.3)
        .with("lai_max", 8.0)
        .with("gs_scalar", 1.0)
        .with("hveg", 5.0)
        .with("er_coeff", 0.02)
        .with("s_sls", 0.1)
        .with("snow_cfmax", 3.0)
        .with("snow_cfr", 0.05)
        .with("snow_tt", 0.0)
        .with("snow_whc", 0.1)
        .with("k_gw", 0.05)
        .with("theta_s", 0.45)
        .with("lambda", 0.25)
        .with("k_s", 50.0)
        .with("k0_scalar", 1.0)
        .with("ksat_exp", 2.0);
    let hand = HandProfile::with_drainage_base(&[0.5, 2.0, 8.0, 30.0], &[5.0, 25.0, 60.0, 100.0])?;
    Parameters::from_table(&table, Arc::new(hand))
}

/// Run a closure `REPEATS` times, return the median duration.
fn median_time<F: FnMut()>(mut f: F) -> Duration {
    let mut times: Vec<Duration> = (0..REPEATS)
        .map(|_| {
            let start = Instant::now();
            f();
            start.elapsed()
        })
        .collect();
    times.sort();
    times[REPEATS / 2]
}

fn bench_single(params: &Parameters, sizes: &[usize]) -> Vec<(&'static str, usize, Duration)> {
    let mut results = Vec::new();

    for &n in sizes {
        let forcing = make_forcing(n, 42);

        // Warmup
        black_box(run::run(params, &forcing, None));

        let dur = median_time(|| {
            black_box(run::run(params, &forcing, None));
        });
        results.push(("w3ra", n, dur));
    }
    results
}

fn bench_grid(
    params: &Parameters,
    n_time: usize,
    cell_counts: &[usize],
) -> Result<Vec<(&'static str, usize, Duration)>> {
    let mut results = Vec::new();

    for &n_cells in cell_counts {
        let cells = (0..n_cells).map(|_| Cell::active(params.clone())).collect();
        let grid = Grid::new(cells)?;
        let forcings: Vec<Vec<Forcing>> = (0..n_cells as u64)
            .map(|seed| make_forcing(n_time, seed))
            .collect();

        // Warmup
        black_box(grid.run_grid(&forcings, None)?);

        let dur = median_time(|| {
            black_box(grid.run_grid(&forcings, None).ok());
        });
        results.push(("w3ra grid", n_cells, dur));
    }
    Ok(results)
}

fn main() -> Result<()> {
    env_logger::init();
    let params = bench_params()?;

    println!("Pure Rust Core Benchmarks");
    println!("============================================================");
    println!("{:<18} {:>6}   {:>12}", "Model", "N", "Median (ms)");
    println!("--------------------------------------------");

    let mut all_results: Vec<(&str, usize, Duration)> = Vec::new();

    all_results.extend(bench_single(&params, &[3650, 36500]));
    all_results.extend(bench_grid(&params, 365, &[100, 1000])?);

    for (model, n, dur) in &all_results {
        let ms = dur.as_secs_f64() * 1000.0;
        println!("{:<18} {:>6}      {:>8.2}", model, n, ms);
    }

    println!("============================================================");
    Ok(())
}
