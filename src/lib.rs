//! Binary creditworthiness scoring on synthetic applicant data.
//!
//! A training pass generates a labelled data set, holds out a test split,
//! standardizes the features, fits a class-balanced random forest and reports
//! held-out metrics. The fitted scaler and forest are installed together in a
//! [`ModelSlot`], from which [`predict_one`] scores individual applicants.

mod config;
mod error;
mod features;
mod generator;
mod model;
mod pipeline;

pub use config::PipelineConfig;
pub use error::{ErrorKind, ScoringError, StageError};
pub use features::{
    FEATURE_NAMES, FeatureVector, N_FEATURES, feature_descriptions, feature_index,
    features_from_pairs, required_features,
};
pub use generator::{Dataset, LabeledRecord, generate, is_creditworthy};
pub use model::{ModelSlot, Prediction, TrainedModel};
pub use pipeline::{
    CreditScorer, ModelInfo, TrainingSummary, evaluate, fit_model, model_info, predict_one, train,
};

// Re-export the building blocks so callers need only this crate.
pub use random_forest::{ClassWeight, ForestConfig, MaxFeatures, RandomForest};
pub use score_helpers::{ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use standard_scaler::StandardScaler;
