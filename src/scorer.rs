//! Churn model scoring.
//!
//! The service only ever talks to the model through [`ChurnScorer`]. The
//! shipped implementation is [`LogisticPipeline`], a logistic regression
//! with standard scaling and one-hot encoding folded into its coefficients,
//! serialized as JSON. The artifact under `models/` is a hand-set stand-in
//! until a trained export replaces it.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::artifact::ModelArtifact;
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{FeatureRecord, ModelInfo};

/// A pre-trained binary churn classifier.
///
/// Implementations are read-only after construction and shared across
/// requests behind an `Arc`.
pub trait ChurnScorer: Send + Sync {
    /// Predicted class: 1 = churn, 0 = stay.
    fn predict(&self, record: &FeatureRecord) -> Result<u8, AppError>;

    /// Probability of class 1 (churn), in `[0, 1]`.
    fn predict_probability(&self, record: &FeatureRecord) -> Result<f64, AppError>;

    /// Describes the loaded model.
    fn info(&self) -> &ModelInfo;
}

/// What to do with a categorical value the model never saw during fitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleUnknown {
    /// Contribute nothing, like an all-zero one-hot row.
    #[default]
    Ignore,
    /// Fail the prediction.
    Error,
}

#[derive(Debug, Clone, Deserialize)]
struct NumericTerm {
    column: String,
    mean: f64,
    scale: f64,
    coef: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoryWeight {
    value: String,
    coef: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoricalTerm {
    column: String,
    categories: Vec<CategoryWeight>,
}

fn default_threshold() -> f64 {
    0.5
}

/// On-disk layout of a fitted pipeline.
#[derive(Debug, Clone, Deserialize)]
struct PipelineSpec {
    name: String,
    version: String,
    #[serde(default)]
    description: Option<String>,
    feature_names: Vec<String>,
    #[serde(default)]
    numeric: Vec<NumericTerm>,
    #[serde(default)]
    categorical: Vec<CategoricalTerm>,
    intercept: f64,
    #[serde(default = "default_threshold")]
    threshold: f64,
    #[serde(default)]
    handle_unknown: HandleUnknown,
}

impl PipelineSpec {
    fn validate(&self) -> Result<(), AppError> {
        let invalid = |msg: String| Err(AppError::ModelLoad(msg));

        if self.name.trim().is_empty() {
            return invalid("model name cannot be empty".to_string());
        }
        if self.feature_names.is_empty() {
            return invalid("feature_names cannot be empty".to_string());
        }
        if !self.intercept.is_finite() {
            return invalid("intercept must be finite".to_string());
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return invalid(format!(
                "threshold must be strictly between 0 and 1, got {}",
                self.threshold
            ));
        }

        let known: HashSet<&str> = self.feature_names.iter().map(String::as_str).collect();
        if known.len() != self.feature_names.len() {
            return invalid("feature_names contains duplicates".to_string());
        }

        for term in &self.numeric {
            if !known.contains(term.column.as_str()) {
                return invalid(format!(
                    "numeric column '{}' is not listed in feature_names",
                    term.column
                ));
            }
            if !term.mean.is_finite() || !term.coef.is_finite() {
                return invalid(format!("numeric column '{}' has non-finite weights", term.column));
            }
            if !term.scale.is_finite() || term.scale == 0.0 {
                return invalid(format!(
                    "numeric column '{}' has an unusable scale {}",
                    term.column, term.scale
                ));
            }
        }

        for term in &self.categorical {
            if !known.contains(term.column.as_str()) {
                return invalid(format!(
                    "categorical column '{}' is not listed in feature_names",
                    term.column
                ));
            }
            if term.categories.is_empty() {
                return invalid(format!(
                    "categorical column '{}' has no categories",
                    term.column
                ));
            }
            if let Some(bad) = term.categories.iter().find(|c| !c.coef.is_finite()) {
                return invalid(format!(
                    "category '{}' of column '{}' has a non-finite weight",
                    bad.value, term.column
                ));
            }
        }

        Ok(())
    }
}

/// Fitted logistic regression pipeline.
#[derive(Debug, Clone)]
pub struct LogisticPipeline {
    spec: PipelineSpec,
    info: ModelInfo,
}

impl LogisticPipeline {
    /// Parses and validates an artifact.
    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self, AppError> {
        let spec: PipelineSpec = serde_json::from_slice(&artifact.bytes).map_err(|e| {
            AppError::ModelLoad(format!(
                "{} is not a valid model artifact: {}",
                artifact.path.display(),
                e
            ))
        })?;
        spec.validate()?;

        let info = ModelInfo {
            name: spec.name.clone(),
            version: spec.version.clone(),
            description: spec.description.clone(),
            feature_count: spec.feature_names.len(),
            threshold: spec.threshold,
            sha256: artifact.checksum.clone(),
        };

        Ok(Self { spec, info })
    }

    /// Reads, optionally verifies, and parses an artifact file.
    pub fn load(path: impl AsRef<Path>, expected_sha256: Option<&str>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let context = || format!("loading model artifact {}", path.display());

        let artifact = ModelArtifact::read(path).with_context(context)?;
        if let Some(expected) = expected_sha256 {
            artifact.verify(expected).with_context(context)?;
        }
        Self::from_artifact(&artifact).with_context(context)
    }

    fn missing_columns<'a>(&'a self, columns: &Map<String, Value>) -> Vec<&'a str> {
        self.spec
            .feature_names
            .iter()
            .filter(|name| !columns.contains_key(name.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Linear decision value (log-odds of churn).
    fn decision_function(&self, record: &FeatureRecord) -> Result<f64, AppError> {
        let columns = record.to_columns()?;

        let missing = self.missing_columns(&columns);
        if !missing.is_empty() {
            return Err(AppError::Scoring(format!(
                "columns are missing: {}",
                missing.join(", ")
            )));
        }

        let mut z = self.spec.intercept;

        for term in &self.spec.numeric {
            let x = columns
                .get(&term.column)
                .and_then(Value::as_f64)
                .ok_or_else(|| {
                    AppError::Scoring(format!("column '{}' is not numeric", term.column))
                })?;
            z += term.coef * (x - term.mean) / term.scale;
        }

        for term in &self.spec.categorical {
            let value = match columns.get(&term.column) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                _ => {
                    return Err(AppError::Scoring(format!(
                        "column '{}' is not a categorical value",
                        term.column
                    )))
                }
            };

            match term.categories.iter().find(|c| c.value == value) {
                Some(category) => z += category.coef,
                None if self.spec.handle_unknown == HandleUnknown::Error => {
                    return Err(AppError::Scoring(format!(
                        "found unknown category '{}' in column '{}'",
                        value, term.column
                    )))
                }
                None => {}
            }
        }

        Ok(z)
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl ChurnScorer for LogisticPipeline {
    fn predict(&self, record: &FeatureRecord) -> Result<u8, AppError> {
        let probability = self.predict_probability(record)?;
        Ok(u8::from(probability > self.spec.threshold))
    }

    fn predict_probability(&self, record: &FeatureRecord) -> Result<f64, AppError> {
        self.decision_function(record).map(sigmoid)
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }
}

/// Loads the configured model once at startup.
///
/// The returned handle is immutable; callers clone the `Arc` into request
/// state.
pub fn load_model(config: &Config) -> Result<Arc<dyn ChurnScorer>, AppError> {
    tracing::info!("Loading model from {}", config.model_path);

    let pipeline = LogisticPipeline::load(&config.model_path, config.model_sha256.as_deref())?;

    tracing::info!(
        "Model loaded successfully: {} ({} features, threshold {}, sha256 {})",
        pipeline.info.label(),
        pipeline.info.feature_count,
        pipeline.info.threshold,
        pipeline.info.sha256
    );

    Ok(Arc::new(pipeline))
}
