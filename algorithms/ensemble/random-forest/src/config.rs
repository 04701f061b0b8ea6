use crate::ForestError;

/// How many features are considered when searching for the best split at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub enum MaxFeatures {
    /// Every feature is a candidate at every split (plain bagged trees).
    All,
    /// `floor(sqrt(n_features))`, at least one.
    Sqrt,
    /// `floor(log2(n_features))`, at least one.
    Log2,
    /// A fixed count, clamped to `1..=n_features`.
    Fixed(usize),
}

impl MaxFeatures {
    /// Resolves the strategy to a concrete count for `n_features` columns.
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = match *self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::Fixed(k) => k,
        };
        n.clamp(1, n_features.max(1))
    }
}

/// Per-class weighting applied to the split criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub enum ClassWeight {
    /// Every sample counts once.
    Uniform,
    /// Class `c` is weighted `n_samples / (n_classes * count_c)` over the whole training set.
    Balanced,
}

impl ClassWeight {
    /// Weight of each class given the number of training samples per class.
    pub fn weights(&self, class_counts: &[usize]) -> Vec<f64> {
        match self {
            ClassWeight::Uniform => vec![1.0; class_counts.len()],
            ClassWeight::Balanced => {
                let n_samples: usize = class_counts.iter().sum();
                let n_classes = class_counts.len() as f64;
                class_counts
                    .iter()
                    .map(|&count| {
                        if count == 0 {
                            0.0
                        } else {
                            n_samples as f64 / (n_classes * count as f64)
                        }
                    })
                    .collect()
            }
        }
    }
}

/// Hyper-parameters of a [`crate::RandomForest`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate", default)
)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_features: MaxFeatures,
    pub class_weight: ClassWeight,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Train each tree on a bootstrap resample instead of the full training set.
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_features: MaxFeatures::Sqrt,
            class_weight: ClassWeight::Balanced,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Rejects configurations that cannot grow a usable forest.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.n_estimators == 0 {
            return Err(ForestError::InvalidConfig(
                "n_estimators must be at least 1".into(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ForestError::InvalidConfig(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForestError::InvalidConfig(
                "min_samples_leaf must be at least 1".into(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ForestError::InvalidConfig(
                "max_depth must be at least 1 when set".into(),
            ));
        }
        if self.max_features == MaxFeatures::Fixed(0) {
            return Err(ForestError::InvalidConfig(
                "a fixed max_features must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
