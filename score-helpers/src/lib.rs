use ndarray::{NdFloat, ScalarOperand};

use num_traits::FromPrimitive;

use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

// Include submodules
mod common;
mod metrics;
mod split;

// Re-export types from submodules
pub use common::{DataPoint, StackError, stack_points};
pub use metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix, MetricsError};
pub use split::{SplitError, TrainTestSplit, train_test_split};

/// Numeric bundle shared by every algorithm crate in the workspace.
///
/// Implemented for `f32` and `f64`. Anything that stores features as an
/// `ndarray` matrix is generic over this trait.
pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Sum
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + ScalarOperand
    + std::marker::Unpin
{
    /// Converts a sample count into the float type.
    fn from_count(n: usize) -> Self {
        Self::from_usize(n).unwrap_or_else(Self::infinity)
    }
}

impl Float for f32 {}

impl Float for f64 {}
