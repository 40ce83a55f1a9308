use darcy::functions::{
    AnalyticSolution, FnField, PermeabilityTensor, PointwiseField, PressureBoundaryValue, RightHandSide,
};
use darcy::DarcyError;
use matrixcompare::{assert_matrix_eq, assert_scalar_eq, prop_assert_scalar_eq};
use nalgebra::{Matrix2, Point2, Vector2};
use proptest::prelude::*;

#[test]
fn coefficient_fields() {
    let x = Point2::new(0.7, 0.25);
    assert_scalar_eq!(RightHandSide { flux_scale: 3.0 }.value(&x), 1.5);
    assert_scalar_eq!(PressureBoundaryValue { density: 1.5 }.value(&x), -1.0);

    let k = PermeabilityTensor::isotropic(4.0);
    assert_matrix_eq!(k.value(&x), Matrix2::identity() * 4.0);
    let k_inverse = k.try_inverse().unwrap();
    assert_matrix_eq!(k_inverse.value(&x) * k.value(&x), Matrix2::identity(), comp = abs, tol = 1e-15);
}

#[test]
fn permeability_must_be_positive() {
    for permeability in [0.0, -1.0, f64::INFINITY, f64::NAN] {
        assert!(matches!(
            PermeabilityTensor::isotropic(permeability).try_inverse(),
            Err(DarcyError::Configuration(_))
        ));
    }
}

#[test]
fn value_list_checks_lengths() {
    let field = FnField(|x: &Point2<f64>| x.x + x.y);
    let points = vec![Point2::new(1.0, 2.0), Point2::new(-1.0, 0.5)];
    let mut values = vec![0.0; 2];
    field.value_list(&points, &mut values).unwrap();
    assert_eq!(values, vec![3.0, -0.5]);

    let mut too_many = vec![0.0; 3];
    assert!(matches!(
        field.value_list(&points, &mut too_many),
        Err(DarcyError::Assembly(_))
    ));

    // Fields can also be passed by reference
    let by_ref = &field;
    assert_eq!(by_ref.value(&Point2::new(2.0, 2.0)), 4.0);
}

#[test]
fn analytic_solution_matches_boundary_data() {
    let (density, lambda, permeability) = (2.0, 0.5, 3.0);
    let c = density * lambda * permeability;
    let solution = AnalyticSolution {
        density,
        flux_scale: c,
    };

    for x in [0.0, 1.3, 3.0] {
        let top = solution.value(&Point2::new(x, 1.0));
        let bottom = solution.value(&Point2::new(x, 0.0));
        assert_scalar_eq!(top[2], PressureBoundaryValue { density }.value(&Point2::new(x, 1.0)), comp = abs, tol = 1e-15);
        // The outward normal at the bottom is -y
        assert_scalar_eq!(-bottom[1], -c, comp = abs, tol = 1e-15);
        assert_eq!(top[0], 0.0);
    }
}

proptest! {
    #[test]
    fn analytic_solution_satisfies_darcy_law_and_mass_balance(x in 0.0..3.0f64, y in 0.0..1.0f64) {
        let (density, lambda, permeability) = (1.5, 2.0, 0.5);
        let c = density * lambda * permeability;
        let solution = AnalyticSolution { density, flux_scale: c };
        let source = RightHandSide { flux_scale: c };
        let h = 1e-5;
        let at = |dx: f64, dy: f64| solution.value(&Point2::new(x + dx, y + dy));

        let grad_p = Vector2::new(
            (at(h, 0.0)[2] - at(-h, 0.0)[2]) / (2.0 * h),
            (at(0.0, h)[2] - at(0.0, -h)[2]) / (2.0 * h),
        );
        let u = at(0.0, 0.0).xy();
        // u = -lambda K grad p
        let darcy_velocity = -grad_p * lambda * permeability;
        prop_assert_scalar_eq!(u.x, darcy_velocity.x, comp = abs, tol = 1e-8);
        prop_assert_scalar_eq!(u.y, darcy_velocity.y, comp = abs, tol = 1e-8);

        // -div u = f
        let div_u = (at(h, 0.0)[0] - at(-h, 0.0)[0]) / (2.0 * h) + (at(0.0, h)[1] - at(0.0, -h)[1]) / (2.0 * h);
        prop_assert_scalar_eq!(-div_u, source.value(&Point2::new(x, y)), comp = abs, tol = 1e-8);
    }
}
