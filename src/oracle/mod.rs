//! Ranking oracle
//!
//! Narrow capability interface for the statistical model behind the
//! attribute-importance analysis: anything fittable that exposes one
//! non-negative importance score per feature column is swappable here.

pub mod logistic;

pub use logistic::LogisticOracle;

use crate::Result;

/// A fittable model exposing per-feature importance scores
pub trait RankingOracle {
    /// Fit on a row-major feature matrix against binary labels and return one
    /// non-negative importance per feature column.
    fn fit(&self, features: &[Vec<f64>], labels: &[f64]) -> Result<Vec<f64>>;
}
