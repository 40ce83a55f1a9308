use darcy::assembly::global::AssemblyStrategy;
use darcy::problem::{make_grid, DarcyConfig, DarcyProblem, ErrorNorms, RunSummary, BOTTOM, SIDE, TOP};
use darcy::block::BlockSizes;
use darcy::DarcyError;
use std::collections::HashMap;
use std::f64::consts::PI;

fn config_without_output() -> DarcyConfig {
    DarcyConfig {
        output_path: None,
        ..DarcyConfig::default()
    }
}

#[test]
fn default_config_is_the_reference_problem() {
    let config = DarcyConfig::default();
    assert_eq!(config.degree, 2);
    assert_eq!(config.refinement_level, 3);
    assert_eq!(config.top_right, [PI, 1.0]);
    assert_eq!(config.subdivisions, [4, 1]);
    assert_eq!(config.assembly, AssemblyStrategy::Serial);
    assert_eq!(config.flux_scale(), 1.0);
    assert_eq!(config.num_coarse_cells(), 4);
    assert_eq!(config.num_active_cells(), 256);
    assert_eq!(config.num_total_cells(), 340);
    config.validate().unwrap();
}

#[test]
fn invalid_configs_are_rejected() {
    let invalid = [
        DarcyConfig {
            top_right: [-1.0, 1.0],
            ..DarcyConfig::default()
        },
        DarcyConfig {
            bottom_left: [0.0, 1.0],
            ..DarcyConfig::default()
        },
        DarcyConfig {
            subdivisions: [4, 0],
            ..DarcyConfig::default()
        },
        DarcyConfig {
            density: 0.0,
            ..DarcyConfig::default()
        },
        DarcyConfig {
            lambda: -1.0,
            ..DarcyConfig::default()
        },
        DarcyConfig {
            permeability: f64::NAN,
            ..DarcyConfig::default()
        },
    ];
    for config in invalid {
        assert!(matches!(config.validate(), Err(DarcyError::Configuration(_))));
        assert!(matches!(DarcyProblem::setup(config), Err(DarcyError::Configuration(_))));
    }
}

#[test]
fn overflowing_refinement_levels_are_rejected() {
    for refinement_level in [31, 40, 1000] {
        let config = DarcyConfig {
            refinement_level,
            ..config_without_output()
        };
        assert_eq!(config.num_active_cells(), usize::MAX);
        assert_eq!(config.num_total_cells(), usize::MAX);
        assert!(matches!(config.validate(), Err(DarcyError::Configuration(_))));
        assert!(matches!(DarcyProblem::setup(config), Err(DarcyError::Configuration(_))));
    }

    let config = DarcyConfig {
        refinement_level: 10,
        ..config_without_output()
    };
    assert_eq!(config.num_active_cells(), 4 * 4usize.pow(10));
    config.validate().unwrap();
}

#[test]
fn config_deserializes_with_defaults() {
    let config: DarcyConfig =
        serde_json::from_str(r#"{ "degree": 1, "refinement_level": 2, "assembly": "parallel" }"#).unwrap();
    assert_eq!(config.degree, 1);
    assert_eq!(config.refinement_level, 2);
    assert_eq!(config.assembly, AssemblyStrategy::Parallel);
    assert_eq!(config.subdivisions, [4, 1]);

    let json = serde_json::to_string(&config).unwrap();
    let roundtrip: DarcyConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(roundtrip, config);
}

#[test]
fn grid_is_tagged_before_refinement() {
    let mesh = make_grid(&config_without_output());
    assert_eq!(mesh.connectivity().len(), 256);

    let mut counts = HashMap::new();
    for (_, _, _, id) in mesh.find_boundary_faces_with_ids() {
        *counts.entry(id).or_insert(0) += 1;
    }
    assert_eq!(counts.get(&TOP), Some(&32));
    assert_eq!(counts.get(&BOTTOM), Some(&32));
    assert_eq!(counts.get(&SIDE), Some(&16));
    assert_eq!(counts.len(), 3);
}

#[test]
fn boundary_values_constrain_side_and_bottom_fluxes() {
    let problem = DarcyProblem::setup(config_without_output()).unwrap();
    assert_eq!(problem.dof_map().block_sizes(), BlockSizes::new(4728, 2304));

    let values = problem.boundary_values().unwrap();
    // Three dofs per face for degree two
    assert_eq!(values.len(), 3 * (16 + 32));
    let num_bottom = values.iter().filter(|&(_, value)| value == -1.0).count();
    let num_side = values.iter().filter(|&(_, value)| value == 0.0).count();
    assert_eq!(num_bottom, 96);
    assert_eq!(num_side, 48);
    assert!(values.iter().all(|(dof, _)| dof < 4728));
}

#[test]
fn bottom_flux_scales_with_material_parameters() {
    let config = DarcyConfig {
        degree: 0,
        refinement_level: 1,
        density: 2.0,
        lambda: 0.5,
        permeability: 3.0,
        ..config_without_output()
    };
    let problem = DarcyProblem::setup(config).unwrap();
    let values = problem.boundary_values().unwrap();
    let bottom: Vec<f64> = values
        .iter()
        .map(|(_, value)| value)
        .filter(|&value| value != 0.0)
        .collect();
    assert_eq!(bottom.len(), 8);
    assert!(bottom.iter().all(|&value| value == -3.0));
}

#[test]
fn summary_reports_problem_sizes() {
    let summary = RunSummary {
        degree: 2,
        refinement_level: 3,
        num_active_cells: 256,
        num_total_cells: 340,
        block_sizes: BlockSizes::new(4728, 2304),
        errors: ErrorNorms {
            pressure: 1.5e-6,
            velocity: 2.0e-14,
        },
    };
    let text = summary.to_string();
    assert!(text.starts_with("Solving problem in 2 space dimensions."));
    assert!(text.contains("Number of active cells: 256"));
    assert!(text.contains("Total number of cells: 340"));
    assert!(text.contains("Number of degrees of freedom: 7032 (4728+2304)"));
    assert!(text.contains("||e_p||_L2 = 1.5e-6"));

    let json = serde_json::to_string(&summary).unwrap();
    let roundtrip: RunSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(roundtrip, summary);
}
