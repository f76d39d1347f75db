//! Weighted linear surrogates fitted on the perturbation neighbourhood.

use faer::{prelude::*, Mat, Side};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use log::debug;

use crate::classifier::ClassifierError;

/// Relative ridge added when an unregularized Gram matrix is not positive definite.
const SINGULAR_JITTER: f64 = 1e-10;

/// A fitted linear model `y = intercept + coef · x`.
#[derive(Debug, Clone)]
pub(crate) struct LinearFit {
    pub intercept: f64,
    pub coef: Array1<f64>,
}

impl LinearFit {
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        self.intercept + self.coef.dot(&row)
    }

    /// Weighted coefficient of determination of the fit on `(x, y)`.
    pub fn score(&self, x: ArrayView2<f64>, y: ArrayView1<f64>, weights: ArrayView1<f64>) -> f64 {
        let total_weight = weights.sum();
        if total_weight <= 0.0 {
            return 0.0;
        }
        let y_mean = weights.dot(&y) / total_weight;
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for ((row, &target), &w) in x.rows().into_iter().zip(y.iter()).zip(weights.iter()) {
            let residual = target - self.predict_row(row);
            ss_res += w * residual * residual;
            ss_tot += w * (target - y_mean) * (target - y_mean);
        }
        if ss_tot <= f64::EPSILON {
            return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }
}

/// Exponential kernel turning a distance into a sample weight.
pub(crate) fn kernel(distance: f64, width: f64) -> f64 {
    (-(distance * distance) / (width * width)).exp().sqrt()
}

/// Cosine distance of every binary row to the first row, scaled by 100.
pub(crate) fn distances_to_original(data: ArrayView2<f64>) -> Array1<f64> {
    let origin = data.row(0);
    let origin_norm = origin.dot(&origin).sqrt();
    data.rows()
        .into_iter()
        .map(|row| {
            let norm = row.dot(&row).sqrt();
            let similarity = if norm > 0.0 && origin_norm > 0.0 {
                row.dot(&origin) / (norm * origin_norm)
            } else {
                0.0
            };
            (1.0 - similarity).max(0.0) * 100.0
        })
        .collect()
}

/// Weighted ridge regression with an unpenalized intercept.
///
/// The centered normal equations are solved with a Cholesky factorization.
/// When `alpha` is zero and columns are linearly dependent the Gram matrix is
/// only semi-definite; the solve is then retried with a vanishing ridge term,
/// which approaches the minimum-norm least squares solution.
pub(crate) fn weighted_ridge(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    weights: ArrayView1<f64>,
    alpha: f64,
) -> Result<LinearFit, ClassifierError> {
    let (rows, cols) = x.dim();
    if rows != y.len() || rows != weights.len() {
        return Err(ClassifierError::ValidationError(format!(
            "Surrogate inputs disagree: {} rows, {} targets, {} weights", rows, y.len(), weights.len()
        )));
    }
    let total_weight = weights.sum();
    if total_weight <= 0.0 {
        return Err(ClassifierError::ValidationError("Sample weights must not all be zero".into()));
    }

    let x_mean = weights.dot(&x) / total_weight;
    let y_mean = weights.dot(&y) / total_weight;
    let x_centered = &x - &x_mean.view().insert_axis(Axis(0));
    let y_centered = &y - y_mean;

    let weighted_x = &x_centered * &weights.view().insert_axis(Axis(1));
    let gram = weighted_x.t().dot(&x_centered);
    let rhs = weighted_x.t().dot(&y_centered);

    let coef = if cols == 0 {
        Array1::zeros(0)
    } else {
        solve_regularized(&gram, &rhs, alpha)?
    };
    let intercept = y_mean - x_mean.dot(&coef);
    Ok(LinearFit { intercept, coef })
}

/// Solves `(gram + alpha · I) · x = rhs` for a symmetric positive semi-definite `gram`.
fn solve_regularized(gram: &Array2<f64>, rhs: &Array1<f64>, alpha: f64) -> Result<Array1<f64>, ClassifierError> {
    let n = rhs.len();
    let b = Mat::<f64>::from_fn(n, 1, |i, _| rhs[i]);
    let system = |ridge: f64| Mat::<f64>::from_fn(n, n, |i, j| gram[[i, j]] + if i == j { ridge } else { 0.0 });

    let llt = match system(alpha).llt(Side::Lower) {
        Ok(llt) => llt,
        Err(_) => {
            let trace: f64 = (0..n).map(|i| gram[[i, i]]).sum();
            let jitter = SINGULAR_JITTER * (trace / n as f64).max(1.0);
            debug!("Gram matrix is singular, retrying with ridge {:e}", alpha + jitter);
            system(alpha + jitter)
                .llt(Side::Lower)
                .map_err(|e| ClassifierError::PredictionError(format!("Surrogate fit failed: {:?}", e)))?
        }
    };
    let solution = llt.solve(&b);
    Ok(Array1::from_shape_fn(n, |i| solution[(i, 0)]))
}

/// Greedily adds the feature that most improves the weighted R² of an
/// unregularized fit, until `num_features` are chosen.
pub(crate) fn forward_selection(
    data: ArrayView2<f64>,
    labels: ArrayView1<f64>,
    weights: ArrayView1<f64>,
    num_features: usize,
) -> Result<Vec<usize>, ClassifierError> {
    let total = data.ncols();
    let mut used: Vec<usize> = Vec::with_capacity(num_features.min(total));

    for _ in 0..num_features.min(total) {
        let mut best: Option<(usize, f64)> = None;
        for feature in (0..total).filter(|f| !used.contains(f)) {
            let mut columns = used.clone();
            columns.push(feature);
            let x = data.select(Axis(1), &columns);
            let fit = weighted_ridge(x.view(), labels, weights, 0.0)?;
            let score = fit.score(x.view(), labels, weights);
            if best.map_or(true, |(_, max)| score > max) {
                best = Some((feature, score));
            }
        }
        match best {
            Some((feature, score)) => {
                debug!("Forward selection picked feature {} (R² {:.4})", feature, score);
                used.push(feature);
            }
            None => break,
        }
    }
    Ok(used)
}

/// Keeps the features with the largest absolute coefficients of a lightly
/// regularized fit on all features.
pub(crate) fn highest_weights(
    data: ArrayView2<f64>,
    labels: ArrayView1<f64>,
    weights: ArrayView1<f64>,
    num_features: usize,
) -> Result<Vec<usize>, ClassifierError> {
    let fit = weighted_ridge(data, labels, weights, 0.01)?;
    let weighted = &fit.coef * &data.row(0);
    let mut ranked: Vec<(usize, f64)> = weighted.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    Ok(ranked.into_iter().take(num_features).map(|(feature, _)| feature).collect())
}
