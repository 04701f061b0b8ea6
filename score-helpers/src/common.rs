use crate::Float;
use ndarray::{Array1, Array2};
use std::fmt::Debug;
use thiserror::Error;

/// Represents a single data point with features and a label.
///
/// L: The type of the label (e.g., usize, String, enum).
/// F: The float type for the features (e.g., f32, f64).
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub features: Array1<F>,
    pub label: L,
}

impl<L, F> DataPoint<L, F>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    pub fn new(features: Array1<F>, label: L) -> Self {
        DataPoint { features, label }
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }
}

/// Errors raised while packing data points into a feature matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StackError {
    #[error("cannot stack an empty list of data points")]
    Empty,
    #[error("data point {index} has {found} features, expected {expected}")]
    MismatchedDimensions {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// Packs data points into a row-major feature matrix and a parallel label vector.
///
/// Row `i` of the matrix holds the features of `points[i]`.
pub fn stack_points<L, F>(points: &[DataPoint<L, F>]) -> Result<(Array2<F>, Vec<L>), StackError>
where
    L: Clone + Eq + std::hash::Hash + Debug,
    F: Float,
{
    let first = points.first().ok_or(StackError::Empty)?;
    let n_features = first.n_features();

    let mut matrix = Array2::zeros((points.len(), n_features));
    let mut labels = Vec::with_capacity(points.len());
    for (index, (dp, mut row)) in points.iter().zip(matrix.rows_mut()).enumerate() {
        if dp.n_features() != n_features {
            return Err(StackError::MismatchedDimensions {
                index,
                expected: n_features,
                found: dp.n_features(),
            });
        }
        row.assign(&dp.features);
        labels.push(dp.label.clone());
    }
    Ok((matrix, labels))
}
