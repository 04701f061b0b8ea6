use crate::error::ScoringError;
use random_forest::ForestConfig;

/// Settings for one training pass: data generation, split and forest.
///
/// The defaults reproduce the reference model: 1000 samples from seed 42, a
/// 20% held-out test set, and 100 balanced trees.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate", default)
)]
pub struct PipelineConfig {
    pub n_samples: usize,
    pub data_seed: u64,
    pub test_fraction: f64,
    pub split_seed: u64,
    pub forest: ForestConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            data_seed: 42,
            test_fraction: 0.2,
            split_seed: 42,
            forest: ForestConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_n_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    pub fn with_data_seed(mut self, seed: u64) -> Self {
        self.data_seed = seed;
        self
    }

    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.test_fraction = test_fraction;
        self
    }

    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }

    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.n_samples == 0 {
            return Err(ScoringError::InvalidSampleCount);
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ScoringError::InvalidConfig(format!(
                "test_fraction must lie strictly between 0 and 1, got {}",
                self.test_fraction
            )));
        }
        self.forest
            .validate()
            .map_err(|e| ScoringError::InvalidConfig(e.to_string()))
    }
}
