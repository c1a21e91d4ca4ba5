/// Shared prediction logic for both the HTML form and the JSON API
///
/// One request runs the whole chain synchronously:
/// 1. Check the numeric answers against the form bounds
/// 2. Derive the feature record
/// 3. Score it with the loaded model
/// 4. Shape the result for display
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::features::derive_features;
use crate::models::{format_percentage, CustomerForm, FeatureRecord, PredictionResponse, RiskLevel};
use crate::scorer::ChurnScorer;

/// Validates the answers and derives the feature record without scoring.
pub fn build_features(form: &CustomerForm) -> Result<FeatureRecord, AppError> {
    form.validate()?;
    Ok(derive_features(form))
}

/// Scores one customer.
pub fn predict_churn(
    scorer: &dyn ChurnScorer,
    form: &CustomerForm,
) -> Result<PredictionResponse, AppError> {
    let request_id = Uuid::new_v4();
    let record = build_features(form)?;

    tracing::debug!(
        %request_id,
        total_services = record.total_services,
        tenure_group = %record.tenure_group,
        avg_charge = record.avg_charge,
        "Derived feature record"
    );

    let probability = scorer.predict_probability(&record)?;
    let label = scorer.predict(&record)?;
    let risk = RiskLevel::from_label(label);

    tracing::info!(
        %request_id,
        label,
        probability,
        model = %scorer.info().label(),
        "Churn prediction completed"
    );

    Ok(PredictionResponse {
        request_id,
        label,
        churn_probability: probability,
        churn_percentage: format_percentage(probability),
        risk,
        message: risk.message().to_string(),
        model: scorer.info().label(),
        scored_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelInfo;

    /// Scorer returning a fixed probability.
    struct FixedScorer {
        probability: f64,
        info: ModelInfo,
    }

    impl FixedScorer {
        fn new(probability: f64) -> Self {
            Self {
                probability,
                info: ModelInfo {
                    name: "fixed".to_string(),
                    version: "1".to_string(),
                    description: None,
                    feature_count: 35,
                    threshold: 0.5,
                    sha256: String::new(),
                },
            }
        }
    }

    impl ChurnScorer for FixedScorer {
        fn predict(&self, _record: &FeatureRecord) -> Result<u8, AppError> {
            Ok(u8::from(self.probability > self.info.threshold))
        }

        fn predict_probability(&self, _record: &FeatureRecord) -> Result<f64, AppError> {
            Ok(self.probability)
        }

        fn info(&self) -> &ModelInfo {
            &self.info
        }
    }

    /// Scorer whose schema never matches.
    struct BrokenScorer(ModelInfo);

    impl ChurnScorer for BrokenScorer {
        fn predict(&self, _record: &FeatureRecord) -> Result<u8, AppError> {
            Err(AppError::Scoring("columns are missing: Region".to_string()))
        }

        fn predict_probability(&self, _record: &FeatureRecord) -> Result<f64, AppError> {
            Err(AppError::Scoring("columns are missing: Region".to_string()))
        }

        fn info(&self) -> &ModelInfo {
            &self.0
        }
    }

    #[test]
    fn test_high_risk_response() {
        let scorer = FixedScorer::new(0.734);
        let response = predict_churn(&scorer, &CustomerForm::default()).unwrap();

        assert_eq!(response.label, 1);
        assert_eq!(response.risk, RiskLevel::High);
        assert_eq!(response.churn_percentage, "73.4%");
        assert_eq!(response.message, "High Risk of Churn");
        assert_eq!(response.model, "fixed@1");
    }

    #[test]
    fn test_low_risk_response() {
        let scorer = FixedScorer::new(0.12);
        let response = predict_churn(&scorer, &CustomerForm::default()).unwrap();

        assert_eq!(response.label, 0);
        assert_eq!(response.risk, RiskLevel::Low);
        assert_eq!(response.message, "Low Risk - Likely to Stay");
    }

    #[test]
    fn test_out_of_bounds_input_never_reaches_scorer() {
        let scorer = BrokenScorer(FixedScorer::new(0.0).info);
        let form = CustomerForm {
            tenure_months: 80,
            ..CustomerForm::default()
        };

        let err = predict_churn(&scorer, &form).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_scoring_failure_propagates() {
        let scorer = BrokenScorer(FixedScorer::new(0.0).info);

        let err = predict_churn(&scorer, &CustomerForm::default()).unwrap_err();
        assert!(matches!(err, AppError::Scoring(_)));
    }

    #[test]
    fn test_request_ids_are_unique() {
        let scorer = FixedScorer::new(0.5);
        let a = predict_churn(&scorer, &CustomerForm::default()).unwrap();
        let b = predict_churn(&scorer, &CustomerForm::default()).unwrap();

        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.churn_probability, b.churn_probability);
    }
}
