//! The three operations exposed to the request layer: train, predict, model info.

use crate::config::PipelineConfig;
use crate::error::ScoringError;
use crate::features::{FEATURE_NAMES, feature_descriptions, features_from_pairs};
use crate::generator::generate;
use crate::model::{ModelSlot, Prediction, TrainedModel};
use log::info;
use ndarray::ArrayView2;
use random_forest::RandomForest;
use score_helpers::{ClassificationReport, ConfusionMatrix, stack_points, train_test_split};
use standard_scaler::StandardScaler;
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Result of a training pass, measured on the held-out test split.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct TrainingSummary {
    pub accuracy: f64,
    pub classification_report: ClassificationReport,
    pub n_train: usize,
    pub n_test: usize,
    /// Mean impurity decrease per feature, summing to 1.
    pub feature_importances: BTreeMap<String, f64>,
}

/// Static description of the model's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct ModelInfo {
    /// Required feature names in column order.
    pub features: Vec<String>,
    pub feature_descriptions: BTreeMap<String, String>,
}

pub fn model_info() -> ModelInfo {
    ModelInfo {
        features: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
        feature_descriptions: feature_descriptions()
            .map(|(n, d)| (n.to_string(), d.to_string()))
            .collect(),
    }
}

/// Scores `forest` on already scaled rows against their true labels.
pub fn evaluate(
    forest: &RandomForest<f64>,
    scaled: ArrayView2<f64>,
    labels: &[usize],
) -> Result<ClassificationReport, ScoringError> {
    let predicted = forest.predict_batch(scaled).map_err(ScoringError::training)?;
    let confusion = ConfusionMatrix::from_labels(forest.classes(), labels, &predicted)
        .map_err(ScoringError::training)?;
    Ok(confusion.report())
}

/// Generates data, splits it, fits scaler and forest, and evaluates on the test split.
///
/// The data set is dropped once this returns; only the fitted pair survives.
pub fn fit_model(config: &PipelineConfig) -> Result<(TrainedModel, TrainingSummary), ScoringError> {
    config.validate()?;

    let dataset = generate(config.n_samples, config.data_seed)?;
    info!(
        "generated {} samples (seed {}), {:.1}% creditworthy",
        dataset.len(),
        config.data_seed,
        dataset.positive_rate() * 100.0
    );

    let points = dataset.to_data_points();
    let split = train_test_split(&points, config.test_fraction, config.split_seed)
        .map_err(ScoringError::training)?;
    let (train_x, train_y) = stack_points(&split.train).map_err(ScoringError::training)?;
    let (test_x, test_y) = stack_points(&split.test).map_err(ScoringError::training)?;

    let scaler = StandardScaler::fit(train_x.view()).map_err(ScoringError::training)?;
    let scaled_train = scaler
        .transform(train_x.view())
        .map_err(ScoringError::training)?;
    let forest = RandomForest::fit(scaled_train.view(), &train_y, &config.forest)
        .map_err(ScoringError::training)?;

    let scaled_test = scaler
        .transform(test_x.view())
        .map_err(ScoringError::training)?;
    let report = evaluate(&forest, scaled_test.view(), &test_y)?;

    let feature_importances = FEATURE_NAMES
        .iter()
        .zip(forest.feature_importances())
        .map(|(name, &importance)| (name.to_string(), importance))
        .collect();

    info!(
        "trained {} trees on {} samples; test accuracy {:.4} over {} samples",
        forest.n_trees(),
        train_y.len(),
        report.accuracy,
        test_y.len()
    );

    let summary = TrainingSummary {
        accuracy: report.accuracy,
        classification_report: report,
        n_train: train_y.len(),
        n_test: test_y.len(),
        feature_importances,
    };
    Ok((TrainedModel::new(scaler, forest), summary))
}

/// Trains a fresh model and installs it in `slot`, replacing any previous one.
///
/// Fitting happens before the slot is touched, so concurrent predictions keep
/// using the old model until the new one is complete. On failure the slot is
/// left unchanged.
pub fn train(slot: &ModelSlot, config: &PipelineConfig) -> Result<TrainingSummary, ScoringError> {
    let (model, summary) = fit_model(config)?;
    slot.store(model);
    Ok(summary)
}

/// Scores one applicant given as `(feature name, value)` pairs in any order.
///
/// Extra names are ignored.
///
/// # Errors
///
/// `ScoringError::ModelNotTrained` if `slot` is empty, then
/// `ScoringError::MissingFeature` / `ScoringError::InvalidFeatureValue` for
/// bad input.
pub fn predict_one<I, K, V>(slot: &ModelSlot, raw: I) -> Result<Prediction, ScoringError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Borrow<f64>,
{
    let model = slot.require()?;
    let row = features_from_pairs(raw)?;
    model.predict_row(row.view())
}

/// A configured pipeline together with the model slot it trains into.
#[derive(Debug, Default)]
pub struct CreditScorer {
    config: PipelineConfig,
    slot: ModelSlot,
}

impl CreditScorer {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            slot: ModelSlot::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn slot(&self) -> &ModelSlot {
        &self.slot
    }

    pub fn is_trained(&self) -> bool {
        self.slot.is_ready()
    }

    pub fn train(&self) -> Result<TrainingSummary, ScoringError> {
        train(&self.slot, &self.config)
    }

    pub fn predict<I, K, V>(&self, raw: I) -> Result<Prediction, ScoringError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Borrow<f64>,
    {
        predict_one(&self.slot, raw)
    }

    pub fn model_info(&self) -> ModelInfo {
        model_info()
    }
}
