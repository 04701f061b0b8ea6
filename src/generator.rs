//! Synthetic applicant data with a deterministic creditworthiness rule.

use crate::error::ScoringError;
use crate::features::FeatureVector;
use log::debug;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;
use score_helpers::DataPoint;

const INCOME_MEAN: f64 = 65_000.0;
const INCOME_SD: f64 = 25_000.0;
const DEBT_MEAN: f64 = 50_000.0;
const DEBT_SD: f64 = 30_000.0;

/// A feature vector plus its derived label (1 = creditworthy).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde_crate::Serialize, serde_crate::Deserialize),
    serde(crate = "serde_crate")
)]
pub struct LabeledRecord {
    pub features: FeatureVector,
    pub credit_worthiness: u8,
}

/// Records in generation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<LabeledRecord>,
}

impl Dataset {
    pub fn records(&self) -> &[LabeledRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fraction of records labelled creditworthy.
    pub fn positive_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let positives = self
            .records
            .iter()
            .filter(|r| r.credit_worthiness == 1)
            .count();
        positives as f64 / self.records.len() as f64
    }

    /// Feature rows in canonical column order, labelled with class indices.
    pub fn to_data_points(&self) -> Vec<DataPoint<usize, f64>> {
        self.records
            .iter()
            .map(|r| DataPoint::new(r.features.to_array(), usize::from(r.credit_worthiness)))
            .collect()
    }
}

/// The labelling rule: all four strict conditions must hold.
///
/// Card count and age never influence the label.
pub fn is_creditworthy(f: &FeatureVector) -> bool {
    f.annual_income > 50_000.0
        && f.credit_history_length > 3
        && f.total_debt < 0.5 * f.annual_income
        && f.payment_consistency > 0.7
}

/// Draws `n` independent applicants from a seeded RNG and labels them.
///
/// Income and debt are normal draws and are not clamped, so either may come
/// out negative. The same `(n, seed)` always yields the same data set.
///
/// # Errors
///
/// Returns `ScoringError::InvalidSampleCount` when `n` is zero.
pub fn generate(n: usize, seed: u64) -> Result<Dataset, ScoringError> {
    if n == 0 {
        return Err(ScoringError::InvalidSampleCount);
    }

    let income = Normal::new(INCOME_MEAN, INCOME_SD).map_err(ScoringError::training)?;
    let debt = Normal::new(DEBT_MEAN, DEBT_SD).map_err(ScoringError::training)?;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);

    let records: Vec<LabeledRecord> = (0..n)
        .map(|_| {
            let features = FeatureVector {
                annual_income: income.sample(&mut rng),
                credit_history_length: rng.random_range(1..30),
                num_credit_cards: rng.random_range(0..10),
                total_debt: debt.sample(&mut rng),
                payment_consistency: rng.random::<f64>(),
                age: rng.random_range(21..65),
            };
            LabeledRecord {
                features,
                credit_worthiness: u8::from(is_creditworthy(&features)),
            }
        })
        .collect();

    let dataset = Dataset { records };
    debug!(
        "generated {} records from seed {}, positive rate {:.3}",
        dataset.len(),
        seed,
        dataset.positive_rate()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applicant(income: f64, history: u32, debt: f64, consistency: f64) -> FeatureVector {
        FeatureVector {
            annual_income: income,
            credit_history_length: history,
            num_credit_cards: 3,
            total_debt: debt,
            payment_consistency: consistency,
            age: 40,
        }
    }

    #[test]
    fn test_label_rule_spot_checks() {
        assert!(is_creditworthy(&applicant(60_000.0, 5, 20_000.0, 0.8)));
        assert!(!is_creditworthy(&applicant(40_000.0, 5, 10_000.0, 0.8)));
        assert!(!is_creditworthy(&applicant(60_000.0, 3, 20_000.0, 0.8)));
        assert!(!is_creditworthy(&applicant(60_000.0, 5, 30_000.0, 0.8)));
        assert!(!is_creditworthy(&applicant(60_000.0, 5, 20_000.0, 0.7)));
        assert!(!is_creditworthy(&applicant(50_000.0, 5, 20_000.0, 0.8)));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate(200, 42).unwrap();
        let b = generate(200, 42).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, generate(200, 43).unwrap());
    }

    #[test]
    fn test_labels_follow_rule() {
        let data = generate(1000, 42).unwrap();
        assert_eq!(data.len(), 1000);
        for r in data.records() {
            assert_eq!(r.credit_worthiness == 1, is_creditworthy(&r.features));
        }
        let rate = data.positive_rate();
        assert!(rate > 0.0 && rate < 0.5, "positive rate {rate}");
    }

    #[test]
    fn test_ranges() {
        let data = generate(500, 7).unwrap();
        for r in data.records() {
            let f = r.features;
            assert!((1..30).contains(&f.credit_history_length));
            assert!(f.num_credit_cards < 10);
            assert!((0.0..1.0).contains(&f.payment_consistency));
            assert!((21..65).contains(&f.age));
        }
    }

    #[test]
    fn test_data_points_match_records() {
        let data = generate(10, 1).unwrap();
        let points = data.to_data_points();
        assert_eq!(points.len(), 10);
        for (p, r) in points.iter().zip(data.records()) {
            assert_eq!(p.features, r.features.to_array());
            assert_eq!(p.label, usize::from(r.credit_worthiness));
        }
    }

    #[test]
    fn test_zero_samples_rejected() {
        assert!(matches!(generate(0, 42), Err(ScoringError::InvalidSampleCount)));
    }
}
