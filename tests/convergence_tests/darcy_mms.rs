//! Verify convergence of the mixed discretization with the manufactured channel solution.
//!
//! The pressure is cubic in `y`, so the pressure error decays like `h^(k+1)`. The velocity
//! is quadratic in `y` and therefore only approximated for the lowest order element. For
//! higher orders it is reproduced up to round-off.
use darcy::problem::{DarcyConfig, DarcyProblem};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::PathBuf;
use util::convergence_rates;

/// For serializing to JSON for subsequent analysis/plots
#[derive(Serialize, Deserialize)]
pub struct ErrorSummary {
    pub element_name: String,
    pub pressure_errors: Vec<f64>,
    pub velocity_errors: Vec<f64>,
    /// Cell size relative to the coarse mesh.
    pub resolutions: Vec<f64>,
}

fn output_dir() -> PathBuf {
    PathBuf::from("data/convergence_tests/darcy_mms")
}

fn compute_error_summary(degree: usize, levels: &[usize]) -> ErrorSummary {
    let mut summary = ErrorSummary {
        element_name: format!("RT{degree}_DGQ{degree}"),
        pressure_errors: Vec::new(),
        velocity_errors: Vec::new(),
        resolutions: Vec::new(),
    };

    for &level in levels {
        let config = DarcyConfig {
            degree,
            refinement_level: level,
            output_path: Some(output_dir().join(format!("{}_level_{}.vtk", summary.element_name, level))),
            ..DarcyConfig::default()
        };
        let problem = DarcyProblem::setup(config).unwrap();
        let (_, run) = problem.run().unwrap();
        println!("{}", run);

        summary.pressure_errors.push(run.errors.pressure);
        summary.velocity_errors.push(run.errors.velocity);
        summary.resolutions.push(0.5f64.powi(level as i32));
    }

    std::fs::create_dir_all(output_dir()).unwrap();
    let file = File::create(output_dir().join(format!("{}.json", summary.element_name))).unwrap();
    serde_json::to_writer_pretty(file, &summary).unwrap();
    summary
}

fn assert_final_rate_at_least(name: &str, rates: &[f64], expected: f64) {
    let observed = rates.last().copied().unwrap();
    assert!(
        observed > expected - 0.2,
        "{name}: observed rate {observed} (all rates {rates:?}), expected {expected}"
    );
}

#[test]
fn rt0_dgq0_converges_linearly() {
    let summary = compute_error_summary(0, &[1, 2, 3, 4]);
    let pressure_rates = convergence_rates(&summary.resolutions, &summary.pressure_errors);
    let velocity_rates = convergence_rates(&summary.resolutions, &summary.velocity_errors);
    assert_final_rate_at_least("pressure", &pressure_rates, 1.0);
    assert_final_rate_at_least("velocity", &velocity_rates, 1.0);
}

#[test]
fn rt1_dgq1_converges_quadratically() {
    let summary = compute_error_summary(1, &[1, 2, 3, 4]);
    let pressure_rates = convergence_rates(&summary.resolutions, &summary.pressure_errors);
    assert_final_rate_at_least("pressure", &pressure_rates, 2.0);
    assert!(summary.velocity_errors.iter().all(|&e| e < 1e-8));
}

#[test]
fn rt2_dgq2_converges_cubically() {
    let summary = compute_error_summary(2, &[1, 2, 3]);
    let pressure_rates = convergence_rates(&summary.resolutions, &summary.pressure_errors);
    assert_final_rate_at_least("pressure", &pressure_rates, 3.0);
    assert!(summary.velocity_errors.iter().all(|&e| e < 1e-8));
}
