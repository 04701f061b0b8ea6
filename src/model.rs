use crate::error::ScoringError;
use crate::features::FeatureVector;
use log::debug;
use ndarray::{Array2, ArrayView1, ArrayView2};
use random_forest::RandomForest;
use standard_scaler::StandardScaler;
use std::sync::{Arc, PoisonError, RwLock};

/// Outcome of scoring one applicant.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct Prediction {
    /// 1 if the applicant is predicted creditworthy, else 0.
    pub credit_worthiness: u8,
    /// Probability the forest assigns to `credit_worthiness` (not necessarily to class 1).
    pub probability: f64,
}

/// A scaler and a forest fitted in the same training pass.
///
/// The pair is only ever built together by the training operation and is
/// immutable afterwards, so a scaler can never be combined with a forest
/// trained on differently scaled columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    scaler: StandardScaler<f64>,
    forest: RandomForest<f64>,
}

impl TrainedModel {
    pub(crate) fn new(scaler: StandardScaler<f64>, forest: RandomForest<f64>) -> Self {
        Self { scaler, forest }
    }

    pub fn scaler(&self) -> &StandardScaler<f64> {
        &self.scaler
    }

    pub fn forest(&self) -> &RandomForest<f64> {
        &self.forest
    }

    /// Scales a raw feature row and classifies it.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> Result<Prediction, ScoringError> {
        let scaled = self
            .scaler
            .transform_row(row)
            .map_err(ScoringError::inference)?;
        let (label, proba) = self
            .forest
            .predict_with_proba(scaled.view())
            .map_err(ScoringError::inference)?;

        // The predicted label is the argmax, so its probability is the maximum.
        Ok(Prediction {
            credit_worthiness: u8::from(label == 1),
            probability: proba.iter().copied().fold(0.0, f64::max),
        })
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, ScoringError> {
        self.predict_row(features.to_array().view())
    }

    /// Predicted labels for raw (unscaled) feature rows.
    pub fn predict_batch(&self, raw: ArrayView2<f64>) -> Result<Vec<usize>, ScoringError> {
        let scaled: Array2<f64> = self.scaler.transform(raw).map_err(ScoringError::inference)?;
        self.forest
            .predict_batch(scaled.view())
            .map_err(ScoringError::inference)
    }
}

/// Process-wide holder of the current [`TrainedModel`].
///
/// Readers take a cheap `Arc` snapshot; a retrain builds the new model
/// outside the lock and swaps it in with a single write, so a reader sees
/// either the old pair or the new one and never a mix.
#[derive(Debug, Default)]
pub struct ModelSlot {
    current: RwLock<Option<Arc<TrainedModel>>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current model, if one has been trained.
    pub fn load(&self) -> Option<Arc<TrainedModel>> {
        // The guarded value is a single pointer, so a poisoned lock still holds a whole model.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Like [`ModelSlot::load`], failing with `ScoringError::ModelNotTrained` when empty.
    pub fn require(&self) -> Result<Arc<TrainedModel>, ScoringError> {
        self.load().ok_or(ScoringError::ModelNotTrained)
    }

    /// Installs `model`, returning the one it replaced.
    pub fn store(&self, model: TrainedModel) -> Option<Arc<TrainedModel>> {
        let next = Arc::new(model);
        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(next);
        debug!("model slot updated (replaced existing: {})", previous.is_some());
        previous
    }

    pub fn is_ready(&self) -> bool {
        self.load().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use random_forest::ForestConfig;

    /// Label 1 iff income is high; every other column is constant.
    fn tiny_model() -> TrainedModel {
        let x = array![
            [20_000.0, 5.0, 1.0, 3_000.0, 0.7, 40.0],
            [25_000.0, 5.0, 1.0, 3_000.0, 0.7, 40.0],
            [30_000.0, 5.0, 1.0, 3_000.0, 0.7, 40.0],
            [90_000.0, 5.0, 1.0, 3_000.0, 0.7, 40.0],
            [95_000.0, 5.0, 1.0, 3_000.0, 0.7, 40.0],
            [99_000.0, 5.0, 1.0, 3_000.0, 0.7, 40.0]
        ];
        let y = [0, 0, 0, 1, 1, 1];
        let scaler = StandardScaler::fit(x.view()).unwrap();
        let scaled = scaler.transform(x.view()).unwrap();
        let config = ForestConfig::default().with_n_estimators(15).with_seed(3);
        let forest = RandomForest::fit(scaled.view(), &y, &config).unwrap();
        TrainedModel::new(scaler, forest)
    }

    #[test]
    fn test_empty_slot() {
        let slot = ModelSlot::new();
        assert!(!slot.is_ready());
        assert!(slot.load().is_none());
        assert!(matches!(slot.require(), Err(ScoringError::ModelNotTrained)));
    }

    #[test]
    fn test_store_replaces_as_unit() {
        let slot = ModelSlot::new();
        assert!(slot.store(tiny_model()).is_none());
        let first = slot.require().unwrap();

        let previous = slot.store(tiny_model()).unwrap();
        assert!(Arc::ptr_eq(&first, &previous));
        assert!(!Arc::ptr_eq(&first, &slot.require().unwrap()));
        // A snapshot taken before the swap stays usable.
        assert_eq!(first.scaler().n_features(), 6);
    }

    #[test]
    fn test_predict_probability_is_for_predicted_label() {
        let model = tiny_model();
        let rich = array![97_000.0, 5.0, 1.0, 3_000.0, 0.7, 40.0];
        let p = model.predict_row(rich.view()).unwrap();
        assert_eq!(p.credit_worthiness, 1);
        assert!(p.probability >= 0.5 && p.probability <= 1.0);

        let poor = array![21_000.0, 5.0, 1.0, 3_000.0, 0.7, 40.0];
        let p = model.predict_row(poor.view()).unwrap();
        assert_eq!(p.credit_worthiness, 0);
        assert!(p.probability >= 0.5);
    }

    #[test]
    fn test_predict_batch_on_raw_rows() {
        let model = tiny_model();
        let raw = array![
            [22_000.0, 5.0, 1.0, 3_000.0, 0.7, 40.0],
            [98_000.0, 5.0, 1.0, 3_000.0, 0.7, 40.0]
        ];
        assert_eq!(model.predict_batch(raw.view()).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_wrong_width_is_inference_error() {
        let model = tiny_model();
        let err = model.predict_row(array![1.0, 2.0].view()).unwrap_err();
        assert!(matches!(err, ScoringError::Inference(_)));
    }
}
