use nalgebra::{DMatrix, DVector};

/// Singular values below this are treated as zero when solving the normal system
const SINGULAR_VALUE_CUTOFF: f64 = 1e-12;

/// Least-squares polynomial, coefficients lowest order first.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PolynomialFit {
    pub coefficients: Vec<f64>,
}

impl PolynomialFit {
    /// Fits a polynomial of `degree` to the points. Returns `None` if there are not enough
    /// points to constrain the fit or the solution is not finite.
    pub fn fit(x_vals: &[f64], y_vals: &[f64], degree: usize) -> Option<PolynomialFit> {
        let num_points = x_vals.len();
        if y_vals.len() != num_points || num_points <= degree {
            return None;
        }
        let vandermonde =
            DMatrix::from_fn(num_points, degree + 1, |i, j| x_vals[i].powi(j as i32));
        let rhs = DVector::from_column_slice(y_vals);
        let solution = vandermonde
            .svd(true, true)
            .solve(&rhs, SINGULAR_VALUE_CUTOFF)
            .ok()?;
        let coefficients: Vec<f64> = solution.iter().copied().collect();
        if coefficients.iter().all(|c| c.is_finite()) {
            Some(PolynomialFit { coefficients })
        } else {
            None
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }
}
