//! Binary logistic regression over sparse feature vectors.
//!
//! Minimizes `0.5 * |w|^2 + C * sum(log-loss)` with full-batch gradient
//! descent. The objective is divided by `C * n` so the learning rate does not
//! depend on the training set size. The intercept is not regularized.

use tracing::debug;

use crate::config::LogisticConfig;
use crate::dataset::Label;
use crate::error::{Error, Result};
use crate::tfidf::SparseVector;

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    weights: Vec<f64>,
    intercept: f64,
    /// Inverse regularization strength.
    c: f64,
    learning_rate: f64,
    max_iter: usize,
    tolerance: f64,
    n_iter: usize,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn dot(weights: &[f64], x: &SparseVector) -> f64 {
    x.iter().map(|&(i, v)| weights[i] * v).sum()
}

impl LogisticRegression {
    pub fn new(c: f64) -> Self {
        Self {
            weights: Vec::new(),
            intercept: 0.0,
            c,
            learning_rate: 1.0,
            max_iter: 1000,
            tolerance: 1e-4,
            n_iter: 0,
        }
    }

    pub fn from_config(config: &LogisticConfig) -> Self {
        Self::new(config.c)
            .with_learning_rate(config.learning_rate)
            .with_max_iter(config.max_iter)
            .with_tolerance(config.tolerance)
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Stop once the gradient norm drops below this.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Fit on rows of width `n_features`. Needs at least one sample of each class.
    pub fn fit(&mut self, x: &[SparseVector], y: &[Label], n_features: usize) -> Result<()> {
        if x.len() != y.len() {
            return Err(Error::ModelFit(format!(
                "{} samples but {} labels",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(Error::ModelFit("no training samples".to_string()));
        }
        if !Label::ALL.iter().all(|label| y.contains(label)) {
            return Err(Error::ModelFit(
                "training labels contain a single class".to_string(),
            ));
        }
        if self.c <= 0.0 {
            return Err(Error::ModelFit(format!("C must be positive, got {}", self.c)));
        }

        let n = x.len() as f64;
        let reg = 1.0 / (self.c * n);
        self.weights = vec![0.0; n_features];
        self.intercept = 0.0;
        self.n_iter = 0;

        let mut grad = vec![0.0; n_features];
        for iter in 0..self.max_iter {
            grad.iter_mut().zip(&self.weights).for_each(|(g, w)| *g = reg * w);
            let mut grad_intercept = 0.0;

            for (row, label) in x.iter().zip(y) {
                let p = sigmoid(dot(&self.weights, row) + self.intercept);
                let err = (p - label.as_u8() as f64) / n;
                for &(i, v) in row {
                    grad[i] += err * v;
                }
                grad_intercept += err;
            }

            let norm = (grad.iter().map(|g| g * g).sum::<f64>()
                + grad_intercept * grad_intercept)
                .sqrt();
            self.n_iter = iter + 1;
            if norm < self.tolerance {
                break;
            }
            for (w, g) in self.weights.iter_mut().zip(&grad) {
                *w -= self.learning_rate * g;
            }
            self.intercept -= self.learning_rate * grad_intercept;
        }
        debug!(iterations = self.n_iter, "logistic regression fitted");
        Ok(())
    }

    /// Probability that the row is satire.
    pub fn predict_proba(&self, row: &SparseVector) -> f64 {
        sigmoid(dot(&self.weights, row) + self.intercept)
    }

    pub fn predict(&self, row: &SparseVector) -> Label {
        if self.predict_proba(row) > 0.5 {
            Label::Onion
        } else {
            Label::NotOnion
        }
    }

    /// Fraction of rows predicted correctly.
    pub fn score(&self, x: &[SparseVector], y: &[Label]) -> f64 {
        if x.is_empty() {
            return 0.0;
        }
        let correct = x
            .iter()
            .zip(y)
            .filter(|(row, label)| self.predict(row) == **label)
            .count();
        correct as f64 / x.len() as f64
    }

    /// Gradient steps taken by the last fit.
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }
}
