use random_forest::ForestError;
use rand_distr::NormalError;
use score_helpers::{MetricsError, SplitError, StackError};
use standard_scaler::ScalerError;
use thiserror::Error;

/// Broad class of a [`ScoringError`], telling the caller how to recover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing input; fix the request and resubmit.
    Validation,
    /// An operation ran before its prerequisite (predict before train).
    StatePrecondition,
    /// Degenerate data or a numerical failure inside the pipeline.
    Internal,
}

/// Failure of one of the pipeline stages.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Sampling(#[from] NormalError),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error(transparent)]
    Scaler(#[from] ScalerError),
    #[error(transparent)]
    Forest(#[from] ForestError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("sample count must be positive")]
    InvalidSampleCount,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("missing required feature: {0}")]
    MissingFeature(String),
    #[error("invalid value for feature {name}: {value}")]
    InvalidFeatureValue { name: String, value: f64 },
    #[error("model not trained")]
    ModelNotTrained,
    #[error("training failed: {0}")]
    Training(#[source] StageError),
    #[error("prediction failed: {0}")]
    Inference(#[source] StageError),
}

impl ScoringError {
    pub(crate) fn training(err: impl Into<StageError>) -> Self {
        ScoringError::Training(err.into())
    }

    pub(crate) fn inference(err: impl Into<StageError>) -> Self {
        ScoringError::Inference(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScoringError::InvalidSampleCount
            | ScoringError::InvalidConfig(_)
            | ScoringError::MissingFeature(_)
            | ScoringError::InvalidFeatureValue { .. } => ErrorKind::Validation,
            ScoringError::ModelNotTrained => ErrorKind::StatePrecondition,
            ScoringError::Training(_) | ScoringError::Inference(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            ScoringError::MissingFeature("age".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(ScoringError::ModelNotTrained.kind(), ErrorKind::StatePrecondition);
        assert_eq!(
            ScoringError::training(ForestError::EmptyTrainingSet).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ScoringError::ModelNotTrained.to_string(), "model not trained");
        assert_eq!(
            ScoringError::training(ForestError::SingleClass(0)).to_string(),
            "training failed: insufficient training data: only class 0 is present"
        );
    }
}
