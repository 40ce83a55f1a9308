use nalgebra_sparse::CsrMatrix;

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Largest absolute difference `|A_ij - A_ji|` over all stored entries.
///
/// Entries stored on only one side of the diagonal are compared against zero.
pub fn max_asymmetry(matrix: &CsrMatrix<f64>) -> f64 {
    let transpose = matrix.transpose();
    let mut max_diff = 0.0f64;
    for (i, j, &a_ij) in matrix.triplet_iter() {
        let a_ji = transpose
            .get_entry(i, j)
            .map(|entry| entry.into_value())
            .unwrap_or(0.0);
        max_diff = max_diff.max((a_ij - a_ji).abs());
    }
    max_diff
}

/// Observed convergence rates `log(e_i / e_{i+1}) / log(h_i / h_{i+1})` between consecutive
/// resolutions.
pub fn convergence_rates(resolutions: &[f64], errors: &[f64]) -> Vec<f64> {
    assert_eq!(resolutions.len(), errors.len());
    resolutions
        .windows(2)
        .zip(errors.windows(2))
        .map(|(h, e)| (e[0] / e[1]).ln() / (h[0] / h[1]).ln())
        .collect()
}
