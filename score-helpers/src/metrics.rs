//! Evaluation metrics for class-index labelled predictions.

use ndarray::Array2;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    #[error("no labels to evaluate")]
    Empty,
    #[error("{truth} true labels but {predicted} predicted labels")]
    LengthMismatch { truth: usize, predicted: usize },
    #[error("label {0} is not one of the known classes")]
    UnknownLabel(usize),
}

/// Counts of (true class, predicted class) pairs.
///
/// Rows index the true class and columns the predicted class, both in the
/// order of `classes()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    classes: Vec<usize>,
    counts: Array2<usize>,
}

impl ConfusionMatrix {
    /// Tallies predictions against ground truth.
    ///
    /// `classes` lists every label that should appear in the matrix, even
    /// ones absent from both `truth` and `predicted`. Duplicates are ignored.
    pub fn from_labels(
        classes: &[usize],
        truth: &[usize],
        predicted: &[usize],
    ) -> Result<Self, MetricsError> {
        if truth.len() != predicted.len() {
            return Err(MetricsError::LengthMismatch {
                truth: truth.len(),
                predicted: predicted.len(),
            });
        }
        if truth.is_empty() {
            return Err(MetricsError::Empty);
        }

        let mut classes = classes.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let position = |label: usize| {
            classes
                .binary_search(&label)
                .map_err(|_| MetricsError::UnknownLabel(label))
        };

        let mut counts = Array2::zeros((classes.len(), classes.len()));
        for (&t, &p) in truth.iter().zip(predicted) {
            counts[[position(t)?, position(p)?]] += 1;
        }
        Ok(Self { classes, counts })
    }

    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Number of samples whose true class was `truth` and predicted class `predicted`.
    pub fn count(&self, truth: usize, predicted: usize) -> usize {
        match (
            self.classes.binary_search(&truth),
            self.classes.binary_search(&predicted),
        ) {
            (Ok(t), Ok(p)) => self.counts[[t, p]],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    /// Fraction of samples on the diagonal.
    pub fn accuracy(&self) -> f64 {
        let correct: usize = self.counts.diag().sum();
        ratio(correct, self.total())
    }

    /// Precision, recall, F1 and support for the class at matrix position `i`.
    fn class_metrics(&self, i: usize) -> ClassMetrics {
        let tp = self.counts[[i, i]];
        let predicted = self.counts.column(i).sum();
        let support = self.counts.row(i).sum();

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassMetrics {
            precision,
            recall,
            f1_score,
            support,
        }
    }

    /// Builds the per-class report plus accuracy and averaged rows.
    pub fn report(&self) -> ClassificationReport {
        let per_class: BTreeMap<usize, ClassMetrics> = self
            .classes
            .iter()
            .enumerate()
            .map(|(i, &label)| (label, self.class_metrics(i)))
            .collect();

        let total = self.total();
        let n_classes = per_class.len().max(1) as f64;
        let mut macro_avg = ClassMetrics::empty(total);
        let mut weighted_avg = ClassMetrics::empty(total);
        for m in per_class.values() {
            macro_avg.precision += m.precision / n_classes;
            macro_avg.recall += m.recall / n_classes;
            macro_avg.f1_score += m.f1_score / n_classes;

            let w = ratio(m.support, total);
            weighted_avg.precision += m.precision * w;
            weighted_avg.recall += m.recall * w;
            weighted_avg.f1_score += m.f1_score * w;
        }

        ClassificationReport {
            classes: per_class,
            accuracy: self.accuracy(),
            macro_avg,
            weighted_avg,
        }
    }
}

/// Per-class scores. `support` is the number of true samples of the class.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn empty(support: usize) -> Self {
        Self {
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            support,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct ClassificationReport {
    pub classes: BTreeMap<usize, ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn class(&self, label: usize) -> Option<&ClassMetrics> {
        self.classes.get(&label)
    }
}

// Zero denominators score 0 rather than NaN.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_confusion_counts() {
        let truth = [0, 0, 1, 1, 1];
        let pred = [0, 1, 1, 1, 0];
        let cm = ConfusionMatrix::from_labels(&[0, 1], &truth, &pred).unwrap();
        assert_eq!(cm.count(0, 0), 1);
        assert_eq!(cm.count(0, 1), 1);
        assert_eq!(cm.count(1, 0), 1);
        assert_eq!(cm.count(1, 1), 2);
        assert_eq!(cm.total(), 5);
        assert_abs_diff_eq!(cm.accuracy(), 0.6);
    }

    #[test]
    fn test_report_values() {
        let truth = [0, 0, 1, 1, 1];
        let pred = [0, 1, 1, 1, 0];
        let report = ConfusionMatrix::from_labels(&[0, 1], &truth, &pred)
            .unwrap()
            .report();

        let c1 = report.class(1).unwrap();
        assert_abs_diff_eq!(c1.precision, 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c1.recall, 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c1.f1_score, 2.0 / 3.0, epsilon = 1e-12);
        assert_eq!(c1.support, 3);

        let c0 = report.class(0).unwrap();
        assert_abs_diff_eq!(c0.precision, 0.5);
        assert_abs_diff_eq!(c0.recall, 0.5);
        assert_eq!(c0.support, 2);

        assert_abs_diff_eq!(report.macro_avg.recall, (0.5 + 2.0 / 3.0) / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(report.weighted_avg.recall, 0.6, epsilon = 1e-12);
        assert_eq!(report.weighted_avg.support, 5);
    }

    #[test]
    fn test_absent_class_scores_zero() {
        let report = ConfusionMatrix::from_labels(&[0, 1], &[0, 0], &[0, 0])
            .unwrap()
            .report();
        let c1 = report.class(1).unwrap();
        assert_eq!(c1.support, 0);
        assert_eq!(c1.precision, 0.0);
        assert_eq!(c1.f1_score, 0.0);
        assert_abs_diff_eq!(report.accuracy, 1.0);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            ConfusionMatrix::from_labels(&[0, 1], &[0], &[0, 1]).unwrap_err(),
            MetricsError::LengthMismatch {
                truth: 1,
                predicted: 2
            }
        );
        assert_eq!(
            ConfusionMatrix::from_labels(&[0, 1], &[], &[]).unwrap_err(),
            MetricsError::Empty
        );
        assert_eq!(
            ConfusionMatrix::from_labels(&[0, 1], &[2], &[0]).unwrap_err(),
            MetricsError::UnknownLabel(2)
        );
    }
}
