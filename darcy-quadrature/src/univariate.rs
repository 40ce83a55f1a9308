//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::{Error, Rule};
use std::f64::consts::PI;

/// Recurrence relation for Legendre polynomials.
///
/// Note: we use a formula for which derivatives are *not* defined at |x| == 1, so it is only
/// suitable for evaluation in the open interval (-1, 1).
#[derive(Debug, Default)]
struct LegendreRecurrence {
    n: usize,
    x: f64,
    // p_n(x)
    p1: f64,
    // p_{n - 1}(x)
    p2: f64,
}

impl LegendreRecurrence {
    pub fn evaluate(n: usize, x: f64) -> Self {
        //  m P_m(x) = (2m - 1) * x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let mut p1 = 1.0;
        let mut p2 = 0.0;
        let mut p3;
        for m in 1..=n {
            let m = m as f64;
            p3 = p2;
            p2 = p1;
            p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
        }

        Self { n, x, p1, p2 }
    }

    fn value(&self) -> f64 {
        self.p1
    }

    fn derivative(&self) -> f64 {
        let Self { n, x, p1, p2 } = &self;
        let n = *n as f64;
        // dp_n/dx (x) = n * (x * p_n(x) - p_{n - 1}(x)) / (x^2 - 1)
        n * (x * p1 - p2) / (x * x - 1.0)
    }

    fn value_and_derivative(&self) -> (f64, f64) {
        (self.value(), self.derivative())
    }
}

/// Gauss quadrature for the reference interval [-1, 1].
///
/// Returns the [Gauss quadrature rule] with the given number of points. Given `n` points,
/// the rule integrates polynomials of order up to `2 n - 1` exactly. The points are sorted in
/// ascending order and are exactly symmetric about the origin.
///
/// # Panics
///
/// Panics if zero points are requested. See [`try_gauss`] for a non-panicking variant.
///
/// [Gauss quadrature rule]: https://en.wikipedia.org/wiki/Gaussian_quadrature
pub fn gauss(num_points: usize) -> Rule<1> {
    try_gauss(num_points).expect("number of points must be positive")
}

/// Same as [`gauss`], but returns an error instead of panicking when zero points are requested.
pub fn try_gauss(num_points: usize) -> Result<Rule<1>, Error> {
    let n = num_points;
    if n == 0 {
        return Err(Error::NoRuleAvailable);
    }

    // Loosely based on the procedure used in
    // Numerical Recipes, The art of Scientific Computing, Third Edition (2007)
    let m = (n + 1) / 2;
    let mut upper_points = Vec::with_capacity(m);
    let mut upper_weights = Vec::with_capacity(m);

    // Only find the roots in [0, 1), the remaining roots follow by symmetry
    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let (mut p, mut dp) = LegendreRecurrence::evaluate(n, x).value_and_derivative();

        // Newton's method. Converges in a handful of iterations from the initial guess above,
        // the iteration cap only guards against oscillation in the last ulp.
        for _ in 0..100 {
            let dx = -p / dp;
            x += dx;
            let (p_new, dp_new) = LegendreRecurrence::evaluate(n, x).value_and_derivative();
            p = p_new;
            dp = dp_new;
            if dx.abs() <= 1e-15 {
                break;
            }
        }

        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        upper_points.push(x);
        upper_weights.push(w);
    }

    // The middle root of an odd rule is the origin
    if n % 2 == 1 {
        upper_points[m - 1] = 0.0;
    }

    // upper_points is descending, so the negated points come first in ascending order
    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    for i in 0..n / 2 {
        points.push([-upper_points[i]]);
        weights.push(upper_weights[i]);
    }
    for i in (0..m).rev() {
        points.push([upper_points[i]]);
        weights.push(upper_weights[i]);
    }

    debug_assert_eq!(points.len(), n, "Internal error: incorrect number of points produced");
    Ok((weights, points))
}

/// The trapezoidal rule on [-1, 1], with points at the two endpoints.
pub fn trapezoid() -> Rule<1> {
    (vec![1.0, 1.0], vec![[-1.0], [1.0]])
}

/// Composite rule obtained by applying `base` on each of `num_subintervals` equally sized
/// subintervals of [-1, 1].
///
/// Points shared by neighboring subintervals (as for closed rules such as [`trapezoid`]) are
/// merged, and their weights summed.
///
/// # Panics
///
/// Panics if `num_subintervals` is zero.
pub fn iterated(base: &Rule<1>, num_subintervals: usize) -> Rule<1> {
    assert!(num_subintervals > 0, "number of subintervals must be positive");
    let (base_weights, base_points) = base;
    let h = 2.0 / num_subintervals as f64;

    let mut weights: Vec<f64> = Vec::with_capacity(base_weights.len() * num_subintervals);
    let mut points: Vec<[f64; 1]> = Vec::with_capacity(base_points.len() * num_subintervals);

    for s in 0..num_subintervals {
        let a = -1.0 + s as f64 * h;
        for (&w, &[xi]) in base_weights.iter().zip(base_points) {
            let x = if s + 1 == num_subintervals && xi == 1.0 {
                1.0
            } else {
                a + 0.5 * h * (xi + 1.0)
            };
            let w = 0.5 * h * w;
            match points.last() {
                Some(&[x_prev]) if (x - x_prev).abs() <= 1e-14 * h => {
                    if let Some(w_prev) = weights.last_mut() {
                        *w_prev += w;
                    }
                }
                _ => {
                    points.push([x]);
                    weights.push(w);
                }
            }
        }
    }

    (weights, points)
}

/// The iterated trapezoidal rule with the given number of subintervals.
pub fn iterated_trapezoid(num_subintervals: usize) -> Rule<1> {
    iterated(&trapezoid(), num_subintervals)
}
