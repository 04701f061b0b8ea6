// Trains the scoring model once and scores a couple of applicants.
use credit_score::{CreditScorer, PipelineConfig, ScoringError};

fn main() -> Result<(), ScoringError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let scorer = CreditScorer::new(PipelineConfig::default());
    let info = scorer.model_info();
    println!("features: {}", info.features.join(", "));

    let summary = scorer.train()?;
    println!("accuracy: {:.4}", summary.accuracy);
    for (label, m) in &summary.classification_report.classes {
        println!(
            "class {}: precision {:.3} recall {:.3} f1 {:.3} support {}",
            label, m.precision, m.recall, m.f1_score, m.support
        );
    }
    for (name, importance) in &summary.feature_importances {
        println!("importance {:<22} {:.3}", name, importance);
    }

    let applicants = [
        [60_000.0, 5.0, 2.0, 20_000.0, 0.8, 35.0],
        [40_000.0, 5.0, 2.0, 20_000.0, 0.8, 35.0],
    ];
    for values in applicants {
        let raw = info.features.iter().zip(values);
        let prediction = scorer.predict(raw)?;
        println!(
            "{:?} -> credit_worthiness {} (p = {:.2})",
            values, prediction.credit_worthiness, prediction.probability
        );
    }
    Ok(())
}
