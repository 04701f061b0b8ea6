//! Bagged ensemble of CART decision trees for class-index labels.
//!
//! Each tree is grown on a bootstrap resample of the training rows and
//! considers a random subset of features at every split. Class probabilities
//! are the mean of the leaf distributions reached in each tree.

use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use ndarray_stats::QuantileExt;
use ndarray_stats::errors::MinMaxError;
use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use score_helpers::Float;
use thiserror::Error;

mod config;
mod tree;

pub use config::{ClassWeight, ForestConfig, MaxFeatures};
pub use tree::DecisionTree;

use tree::TreeParams;

/// Errors that can occur when fitting or querying a random forest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForestError {
    #[error("insufficient training data: the training set is empty")]
    EmptyTrainingSet,
    #[error("insufficient training data: only class {0} is present")]
    SingleClass(usize),
    #[error("insufficient training data: the feature matrix has no columns")]
    NoFeatures,
    #[error("{samples} feature rows but {labels} labels")]
    LabelMismatch { samples: usize, labels: usize },
    #[error("expected {expected} features, got {found}")]
    MismatchedDimensions { expected: usize, found: usize },
    #[error("non-finite feature value at row {row}, column {column}")]
    NonFiniteFeature { row: usize, column: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("class probabilities could not be ranked: {0}")]
    UndefinedOrder(#[from] MinMaxError),
}

/// A fitted random forest classifier.
///
/// Only [`RandomForest::fit`] constructs one, so every instance is ready to predict.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest<F: Float> {
    classes: Vec<usize>,
    trees: Vec<DecisionTree<F>>,
    n_features: usize,
    feature_importances: Array1<f64>,
}

impl<F: Float> RandomForest<F> {
    /// Fits `config.n_estimators` trees on `x` (rows = samples) and labels `y`.
    ///
    /// # Errors
    ///
    /// Fails with `ForestError::EmptyTrainingSet` or `ForestError::SingleClass`
    /// when the data cannot train a two-class model, with
    /// `ForestError::LabelMismatch` if `x` and `y` disagree in length, with
    /// `ForestError::NonFiniteFeature` on NaN or infinite inputs, and with
    /// `ForestError::InvalidConfig` for unusable hyper-parameters.
    pub fn fit(x: ArrayView2<F>, y: &[usize], config: &ForestConfig) -> Result<Self, ForestError> {
        config.validate()?;

        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(ForestError::LabelMismatch {
                samples: n_samples,
                labels: y.len(),
            });
        }
        if n_samples == 0 {
            return Err(ForestError::EmptyTrainingSet);
        }
        if n_features == 0 {
            return Err(ForestError::NoFeatures);
        }
        if let Some(((row, column), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(ForestError::NonFiniteFeature { row, column });
        }

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(ForestError::SingleClass(classes[0]));
        }

        // Labels become positions in `classes` for the trees.
        let encoded: Vec<usize> = y
            .iter()
            .map(|label| classes.partition_point(|c| c < label))
            .collect();
        let mut class_counts = vec![0usize; classes.len()];
        for &c in &encoded {
            class_counts[c] += 1;
        }
        let class_weights = config.class_weight.weights(&class_counts);

        let params = TreeParams {
            max_features: config.max_features.resolve(n_features),
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        };

        info!(
            "fitting random forest: {} trees, {} samples, {} features, class counts {:?}",
            config.n_estimators, n_samples, n_features, class_counts
        );

        let mut master = Xoshiro256PlusPlus::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_estimators);
        let mut weights = vec![0.0; n_samples];
        for t in 0..config.n_estimators {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(master.next_u64());

            let multiplicity = if config.bootstrap {
                bootstrap_counts(n_samples, &mut rng)
            } else {
                vec![1; n_samples]
            };
            let mut samples = Vec::with_capacity(n_samples);
            for (i, &m) in multiplicity.iter().enumerate() {
                weights[i] = m as f64 * class_weights[encoded[i]];
                if m > 0 {
                    samples.push(i);
                }
            }

            let tree = DecisionTree::fit(
                x,
                &encoded,
                &weights,
                samples,
                classes.len(),
                params,
                &mut rng,
            );
            debug!(
                "tree {}: {} nodes, {} leaves, depth {}",
                t,
                tree.n_nodes(),
                tree.n_leaves(),
                tree.depth()
            );
            trees.push(tree);
        }

        let feature_importances = mean_importances(&trees, n_features);

        Ok(Self {
            classes,
            trees,
            n_features,
            feature_importances,
        })
    }

    /// Sorted class labels seen during training; probability vectors follow this order.
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree<F>] {
        &self.trees
    }

    /// Mean decrease in weighted Gini impurity per feature, summing to 1.
    pub fn feature_importances(&self) -> ArrayView1<'_, f64> {
        self.feature_importances.view()
    }

    /// Averaged class probabilities for one row, ordered like [`RandomForest::classes`].
    pub fn predict_proba(&self, row: ArrayView1<F>) -> Result<Array1<f64>, ForestError> {
        if row.len() != self.n_features {
            return Err(ForestError::MismatchedDimensions {
                expected: self.n_features,
                found: row.len(),
            });
        }

        let mut proba = Array1::zeros(self.classes.len());
        for tree in &self.trees {
            for (p, &d) in proba.iter_mut().zip(tree.predict_proba(row)) {
                *p += d;
            }
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }

    /// Most probable label together with the full probability vector.
    ///
    /// Ties resolve to the lowest class label.
    pub fn predict_with_proba(
        &self,
        row: ArrayView1<F>,
    ) -> Result<(usize, Array1<f64>), ForestError> {
        let proba = self.predict_proba(row)?;
        let best = proba.argmax()?;
        Ok((self.classes[best], proba))
    }

    pub fn predict(&self, row: ArrayView1<F>) -> Result<usize, ForestError> {
        self.predict_with_proba(row).map(|(label, _)| label)
    }

    /// Class probabilities for every row of `x` (one output row per input row).
    pub fn predict_proba_batch(&self, x: ArrayView2<F>) -> Result<Array2<f64>, ForestError> {
        let mut out = Array2::zeros((x.nrows(), self.classes.len()));
        for (row, mut dest) in x.rows().into_iter().zip(out.rows_mut()) {
            dest.assign(&self.predict_proba(row)?);
        }
        Ok(out)
    }

    pub fn predict_batch(&self, x: ArrayView2<F>) -> Result<Vec<usize>, ForestError> {
        x.rows().into_iter().map(|row| self.predict(row)).collect()
    }
}

/// Draws `n` row indices with replacement and returns how often each row was picked.
fn bootstrap_counts<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut counts = vec![0; n];
    for _ in 0..n {
        counts[rng.random_range(0..n)] += 1;
    }
    counts
}

fn mean_importances<F: Float>(trees: &[DecisionTree<F>], n_features: usize) -> Array1<f64> {
    let mut total = Array1::zeros(n_features);
    for tree in trees {
        total += &Array1::from(tree.feature_importances());
    }
    let sum = total.sum();
    if sum > 0.0 {
        total /= sum;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};

    /// Two well separated blobs: label 1 iff both coordinates exceed 5.
    fn blobs() -> (Array2<f64>, Vec<usize>) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let n = 120;
        let x = Array2::from_shape_fn((n, 3), |(_, j)| {
            if j == 2 {
                rng.random_range(-1.0..1.0)
            } else {
                rng.random_range(0.0..10.0)
            }
        });
        let y = x
            .rows()
            .into_iter()
            .map(|r| usize::from(r[0] > 5.0 && r[1] > 5.0))
            .collect();
        (x, y)
    }

    fn small_config() -> ForestConfig {
        ForestConfig::default().with_n_estimators(25)
    }

    #[test]
    fn test_fit_and_predict() {
        let (x, y) = blobs();
        let forest = RandomForest::fit(x.view(), &y, &small_config()).unwrap();
        assert_eq!(forest.n_trees(), 25);
        assert_eq!(forest.classes(), &[0, 1]);

        assert_eq!(forest.predict(array![8.5, 8.5, 0.0].view()).unwrap(), 1);
        assert_eq!(forest.predict(array![1.0, 9.0, 0.0].view()).unwrap(), 0);
        assert_eq!(forest.predict(array![9.0, 1.0, 0.0].view()).unwrap(), 0);

        let train_pred = forest.predict_batch(x.view()).unwrap();
        let correct = train_pred.iter().zip(&y).filter(|(p, t)| p == t).count();
        assert!(correct as f64 / y.len() as f64 > 0.95);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = blobs();
        let forest = RandomForest::fit(x.view(), &y, &small_config()).unwrap();
        let proba = forest.predict_proba_batch(x.view()).unwrap();
        assert_eq!(proba.dim(), (x.nrows(), 2));
        for row in proba.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }

        let (label, p) = forest.predict_with_proba(array![9.0, 9.0, 0.5].view()).unwrap();
        assert_eq!(label, 1);
        assert!(p[1] >= p[0]);
    }

    #[test]
    fn test_reproducibility_with_seed() {
        let (x, y) = blobs();
        let a = RandomForest::fit(x.view(), &y, &small_config()).unwrap();
        let b = RandomForest::fit(x.view(), &y, &small_config()).unwrap();
        assert_eq!(a, b);
        let probe = array![5.2, 4.9, 0.1];
        assert_eq!(
            a.predict_proba(probe.view()).unwrap(),
            b.predict_proba(probe.view()).unwrap()
        );
    }

    #[test]
    fn test_different_seeds_produce_different_forests() {
        let (x, y) = blobs();
        let a = RandomForest::fit(x.view(), &y, &small_config().with_seed(1)).unwrap();
        let b = RandomForest::fit(x.view(), &y, &small_config().with_seed(2)).unwrap();
        assert_ne!(a.trees(), b.trees());
    }

    #[test]
    fn test_feature_importances() {
        let (x, y) = blobs();
        let forest = RandomForest::fit(x.view(), &y, &small_config()).unwrap();
        let imp = forest.feature_importances();
        assert_abs_diff_eq!(imp.sum(), 1.0, epsilon = 1e-9);
        assert!(imp[0] > imp[2]);
        assert!(imp[1] > imp[2]);
    }

    #[test]
    fn test_balanced_weighting_recovers_minority_class() {
        // 95 negatives below 0.5, 5 positives above; the minority still wins its region.
        let x = Array2::from_shape_fn((100, 1), |(i, _)| i as f64 / 100.0);
        let y: Vec<usize> = (0..100).map(|i| usize::from(i >= 95)).collect();
        let forest = RandomForest::fit(x.view(), &y, &small_config()).unwrap();
        assert_eq!(forest.predict(array![0.97].view()).unwrap(), 1);
        assert_eq!(forest.predict(array![0.20].view()).unwrap(), 0);
    }

    #[test]
    fn test_labels_need_not_be_contiguous() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let y = [3, 3, 3, 7, 7, 7];
        let forest = RandomForest::fit(x.view(), &y, &small_config()).unwrap();
        assert_eq!(forest.classes(), &[3, 7]);
        assert_eq!(forest.predict(array![11.5].view()).unwrap(), 7);
    }

    #[test]
    fn test_insufficient_training_data() {
        let config = small_config();
        let empty: Array2<f64> = Array2::zeros((0, 2));
        assert_eq!(
            RandomForest::fit(empty.view(), &[], &config).unwrap_err(),
            ForestError::EmptyTrainingSet
        );

        let x = array![[1.0], [2.0], [3.0]];
        let err = RandomForest::fit(x.view(), &[1, 1, 1], &config).unwrap_err();
        assert_eq!(err, ForestError::SingleClass(1));
        assert!(err.to_string().contains("insufficient training data"));
    }

    #[test]
    fn test_input_errors() {
        let config = small_config();
        let x = array![[1.0], [2.0]];
        assert_eq!(
            RandomForest::fit(x.view(), &[0], &config).unwrap_err(),
            ForestError::LabelMismatch {
                samples: 2,
                labels: 1
            }
        );

        let bad = array![[1.0], [f64::NAN]];
        assert_eq!(
            RandomForest::fit(bad.view(), &[0, 1], &config).unwrap_err(),
            ForestError::NonFiniteFeature { row: 1, column: 0 }
        );

        let forest = RandomForest::fit(x.view(), &[0, 1], &config).unwrap();
        assert_eq!(
            forest.predict(array![1.0, 2.0].view()).unwrap_err(),
            ForestError::MismatchedDimensions {
                expected: 1,
                found: 2
            }
        );

        assert!(matches!(
            RandomForest::fit(x.view(), &[0, 1], &config.with_n_estimators(0)),
            Err(ForestError::InvalidConfig(_))
        ));
    }
}
