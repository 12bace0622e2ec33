use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hyperparameters for logistic-regression fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub learning_rate: f32,
    pub iterations: usize,
    /// L2 regularization strength.
    pub l2: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            iterations: 200,
            l2: 1e-4,
        }
    }
}

/// Binary logistic regression over dense feature matrices.
///
/// Fitting is full-batch gradient descent; the per-row gradient terms are
/// accumulated in parallel with rayon. Labels are 0.0 / 1.0.
pub struct LogisticRegression {
    config: ClassifierConfig,
    weights: Option<Array1<f32>>,
    bias: f32,
}

impl LogisticRegression {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            weights: None,
            bias: 0.0,
        }
    }

    /// Fit on `x` (rows = documents) against parallel labels `y`.
    ///
    /// Weights start at zero each call (the objective is convex), but a
    /// feature-width change between `fit` calls is rejected as a
    /// configuration error — it means the caller mixed feature spaces.
    pub fn fit(&mut self, x: &Array2<f32>, y: &[f32]) -> Result<()> {
        let n = x.nrows();
        let d = x.ncols();
        validate_pair(x, y)?;
        if let Some(w) = &self.weights
            && w.len() != d
        {
            return Err(Error::Config(format!(
                "feature width changed between fits: {} -> {d}",
                w.len()
            )));
        }

        let mut w = Array1::<f32>::zeros(d);
        let mut b = 0.0f32;
        let decay =
            1.0 - self.config.learning_rate * self.config.l2;

        for _ in 0..self.config.iterations {
            let (grad_w, grad_b) = (0..n)
                .into_par_iter()
                .fold(
                    || (Array1::<f32>::zeros(d), 0.0f32),
                    |(mut gw, mut gb), i| {
                        let row = x.row(i);
                        let e = sigmoid(row.dot(&w) + b) - y[i];
                        gw.scaled_add(e, &row);
                        gb += e;
                        (gw, gb)
                    },
                )
                .reduce(
                    || (Array1::<f32>::zeros(d), 0.0f32),
                    |(aw, ab), (bw, bb)| (aw + bw, ab + bb),
                );

            let scale = self.config.learning_rate / n as f32;
            w = &w * decay - &grad_w * scale;
            b -= scale * grad_b;
        }

        self.weights = Some(w);
        self.bias = b;
        Ok(())
    }

    /// Probability of the positive class for one feature row.
    pub fn predict_proba(&self, row: ArrayView1<'_, f32>) -> Result<f32> {
        let w = self.weights.as_ref().ok_or_else(|| {
            Error::State("predict called before fit".into())
        })?;
        if row.len() != w.len() {
            return Err(Error::Config(format!(
                "feature row has width {}, model expects {}",
                row.len(),
                w.len()
            )));
        }
        Ok(sigmoid(row.dot(w) + self.bias))
    }

    /// Hard 0.0/1.0 label at the 0.5 threshold.
    pub fn predict(&self, row: ArrayView1<'_, f32>) -> Result<f32> {
        Ok(if self.predict_proba(row)? >= 0.5 {
            1.0
        } else {
            0.0
        })
    }

    /// Accuracy on a held-out (features, labels) pair.
    pub fn score(&self, x: &Array2<f32>, y: &[f32]) -> Result<f32> {
        let w = self.weights.as_ref().ok_or_else(|| {
            Error::State("score called before fit".into())
        })?;
        validate_pair(x, y)?;
        if x.ncols() != w.len() {
            return Err(Error::Config(format!(
                "feature width {} does not match model width {}",
                x.ncols(),
                w.len()
            )));
        }

        let bias = self.bias;
        let correct = (0..x.nrows())
            .into_par_iter()
            .filter(|&i| {
                let p = sigmoid(x.row(i).dot(w) + bias);
                (p >= 0.5) == (y[i] == 1.0)
            })
            .count();
        Ok(correct as f32 / x.nrows() as f32)
    }
}

impl std::fmt::Debug for LogisticRegression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogisticRegression")
            .field("fitted", &self.weights.is_some())
            .field(
                "width",
                &self.weights.as_ref().map(Array1::len),
            )
            .finish_non_exhaustive()
    }
}

fn validate_pair(x: &Array2<f32>, y: &[f32]) -> Result<()> {
    if x.nrows() == 0 {
        return Err(Error::Config(
            "feature matrix has no rows".into(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(Error::Config(format!(
            "feature rows ({}) and labels ({}) differ",
            x.nrows(),
            y.len()
        )));
    }
    if let Some(bad) = y.iter().find(|v| **v != 0.0 && **v != 1.0) {
        return Err(Error::Config(format!(
            "labels must be 0.0 or 1.0, got {bad}"
        )));
    }
    Ok(())
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
