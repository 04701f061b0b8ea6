use crate::{DataPoint, Float};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;

/// Errors that can occur while partitioning a data set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplitError {
    #[error("cannot split an empty data set")]
    EmptyDataSet,
    #[error("test fraction must lie strictly between 0 and 1, got {0}")]
    InvalidFraction(f64),
    #[error("a test fraction of {fraction} over {n_samples} samples leaves one side empty")]
    DegenerateSplit { n_samples: usize, fraction: f64 },
}

/// Disjoint train and test partitions of a data set.
#[derive(Debug, Clone)]
pub struct TrainTestSplit<L, F>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
{
    pub train: Vec<DataPoint<L, F>>,
    pub test: Vec<DataPoint<L, F>>,
}

/// Shuffles `data` with a seeded RNG and partitions it into train and test sets.
///
/// The test set holds `ceil(n * test_fraction)` points and the train set the
/// rest. Identical `(data, test_fraction, seed)` always yield the same split.
///
/// # Errors
///
/// Returns `SplitError::EmptyDataSet` for empty input,
/// `SplitError::InvalidFraction` unless `0 < test_fraction < 1`, and
/// `SplitError::DegenerateSplit` if either partition would be empty.
pub fn train_test_split<L, F>(
    data: &[DataPoint<L, F>],
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit<L, F>, SplitError>
where
    L: Clone + Eq + Hash + Debug,
    F: Float,
{
    if data.is_empty() {
        return Err(SplitError::EmptyDataSet);
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SplitError::InvalidFraction(test_fraction));
    }

    let n_samples = data.len();
    let n_test = (n_samples as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(SplitError::DegenerateSplit {
            n_samples,
            fraction: test_fraction,
        });
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);
    Ok(TrainTestSplit {
        train: train_idx.iter().map(|&i| data[i].clone()).collect(),
        test: test_idx.iter().map(|&i| data[i].clone()).collect(),
    })
}
