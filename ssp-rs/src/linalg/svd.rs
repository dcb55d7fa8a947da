use crate::{Error, Result};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2};

/// Left singular vectors and singular values of a thin SVD.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinSvd {
    /// Left singular vectors, one per column, shape `[rows, k]`.
    pub u: Array2<f64>,
    /// Singular values in decreasing order, length `k`.
    pub s: Array1<f64>,
}

/// Thin singular value decomposition `A = U S Vᵀ`, keeping only `U` and `S`.
///
/// Columns of `u` are ordered by decreasing singular value, with
/// `k = min(rows, cols)`.
///
/// # Errors
/// Empty input, non-finite entries, or a decomposition that fails to converge.
pub fn thin_svd(a: ArrayView2<f64>) -> Result<ThinSvd> {
    let (rows, cols) = a.dim();
    if rows == 0 || cols == 0 {
        return Err(Error::invalid_arg("a", "matrix must be non-empty."));
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(Error::Linalg {
            reason: "matrix contains non-finite entries".into(),
        });
    }
    let m = DMatrix::from_fn(rows, cols, |i, j| a[[i, j]]);
    let svd = m
        .try_svd(true, false, f64::EPSILON, 0)
        .ok_or_else(|| Error::Linalg {
            reason: "svd did not converge".into(),
        })?;
    let u = svd.u.ok_or_else(|| Error::Linalg {
        reason: "svd did not produce left singular vectors".into(),
    })?;

    let k = svd.singular_values.len();
    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&x, &y| svd.singular_values[y].total_cmp(&svd.singular_values[x]));

    let s = order.iter().map(|&i| svd.singular_values[i]).collect();
    let u = Array2::from_shape_fn((rows, k), |(i, j)| u[(i, order[j])]);
    Ok(ThinSvd { u, s })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn singular_values_are_sorted_and_vectors_orthonormal() {
        let a = array![[1.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 3.0]];
        let svd = thin_svd(a.view()).expect("svd");
        assert_abs_diff_eq!(svd.s[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(svd.s[1], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(svd.s[2], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(svd.u[[1, 0]].abs(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(svd.u[[2, 1]].abs(), 1.0, epsilon = 1e-12);

        let gram = svd.u.t().dot(&svd.u);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(gram[[i, j]], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn tall_matrix_keeps_min_dimension() {
        let a = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0]];
        let svd = thin_svd(a.view()).expect("svd");
        assert_eq!(svd.u.dim(), (4, 2));
        assert_eq!(svd.s.len(), 2);
        assert!(svd.s[0] > svd.s[1]);
    }

    #[test]
    fn rejects_nan() {
        let a = array![[1.0, f64::NAN], [0.0, 1.0]];
        assert!(matches!(thin_svd(a.view()), Err(Error::Linalg { .. })));
    }
}
