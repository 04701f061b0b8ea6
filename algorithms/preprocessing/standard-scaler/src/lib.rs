use log::warn;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use score_helpers::Float;
use thiserror::Error;

/// Errors that can occur when fitting or applying a standardization transform.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScalerError {
    /// Cannot learn statistics from zero rows
    #[error("cannot fit a scaler on an empty feature matrix")]
    EmptyDataSet,
    /// The input has a different number of columns than the fitted state
    #[error("expected {expected} features, got {found}")]
    MismatchedDimensions { expected: usize, found: usize },
}

/// Per-feature standardization `(x - mean) / std`, learned once and reapplied unchanged.
///
/// The only way to obtain a `StandardScaler` is [`StandardScaler::fit`], so a
/// transform can never run against unfitted statistics.
///
/// Standard deviations are population (ddof = 0) values. A feature whose
/// standard deviation is zero (up to rounding) in the training data is only
/// centered: its scale is stored as `1`, so the transform never divides by zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct StandardScaler<F: Float> {
    mean: Array1<F>,
    scale: Array1<F>,
}

impl<F: Float> StandardScaler<F> {
    /// Learns per-column mean and standard deviation from `data` (rows = samples).
    ///
    /// # Errors
    ///
    /// Returns `ScalerError::EmptyDataSet` if `data` has no rows.
    pub fn fit(data: ArrayView2<F>) -> Result<Self, ScalerError> {
        let mean = data.mean_axis(Axis(0)).ok_or(ScalerError::EmptyDataSet)?;
        let std = data.std_axis(Axis(0), F::zero());
        let n = F::from_count(data.nrows());

        let scale = std
            .iter()
            .zip(mean.iter())
            .enumerate()
            .map(|(column, (&s, &m))| {
                // Rounding in the mean leaves a tiny spread on constant columns.
                let tolerance = F::epsilon() * n * (m.abs() + F::one());
                if s > tolerance {
                    s
                } else {
                    warn!("feature {column} has zero variance; centering without scaling");
                    F::one()
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> ArrayView1<'_, F> {
        self.mean.view()
    }

    /// The divisor applied to each feature (the standard deviation, or 1 for constant features).
    pub fn scale(&self) -> ArrayView1<'_, F> {
        self.scale.view()
    }

    /// Standardizes every row of `data` with the fitted statistics.
    pub fn transform(&self, data: ArrayView2<F>) -> Result<Array2<F>, ScalerError> {
        self.check_width(data.ncols())?;
        Ok((&data - &self.mean) / &self.scale)
    }

    /// Standardizes a single feature vector.
    pub fn transform_row(&self, row: ArrayView1<F>) -> Result<Array1<F>, ScalerError> {
        self.check_width(row.len())?;
        Ok((&row - &self.mean) / &self.scale)
    }

    /// Convenience for `fit` followed by `transform` on the same matrix.
    pub fn fit_transform(data: ArrayView2<F>) -> Result<(Self, Array2<F>), ScalerError> {
        let scaler = Self::fit(data)?;
        let scaled = scaler.transform(data)?;
        Ok((scaler, scaled))
    }

    fn check_width(&self, found: usize) -> Result<(), ScalerError> {
        if found != self.n_features() {
            return Err(ScalerError::MismatchedDimensions {
                expected: self.n_features(),
                found,
            });
        }
        Ok(())
    }
}
