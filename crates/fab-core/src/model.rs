//! Contracts for the two opaque regression models.

use crate::features::{EfficiencyFeatures, RevenueFeatures};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while provisioning, loading or evaluating a model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The artifact file does not exist and could not be fetched.
    #[error("model artifact not found: {}", .0.display())]
    Missing(PathBuf),
    /// The artifact exists but does not describe a usable model.
    #[error("malformed model artifact {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },
    /// A column the model needs is absent from the feature row.
    #[error("feature '{0}' missing from model input")]
    MissingFeature(String),
    /// A column carries a number where a label is expected, or vice versa.
    #[error("feature '{column}' has the wrong type, expected {expected}")]
    FeatureType {
        column: String,
        expected: &'static str,
    },
    /// Downloading the artifact failed.
    #[error("artifact download failed: {0}")]
    Fetch(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        ModelError::Io(e.to_string())
    }
}

/// Predicts the revenue multiplier applied to base revenue.
pub trait RevenueMultiplierModel: Send + Sync {
    fn predict_revenue_multiplier(&self, features: &RevenueFeatures) -> Result<f64, ModelError>;
}

/// Predicts water use per wafer after efficiency investments.
pub trait WaterEfficiencyModel: Send + Sync {
    fn predict_water_efficiency(&self, features: &EfficiencyFeatures) -> Result<f64, ModelError>;
}

impl<F> RevenueMultiplierModel for F
where
    F: Fn(&RevenueFeatures) -> f64 + Send + Sync,
{
    fn predict_revenue_multiplier(&self, features: &RevenueFeatures) -> Result<f64, ModelError> {
        Ok(self(features))
    }
}

impl<F> WaterEfficiencyModel for F
where
    F: Fn(&EfficiencyFeatures) -> f64 + Send + Sync,
{
    fn predict_water_efficiency(&self, features: &EfficiencyFeatures) -> Result<f64, ModelError> {
        Ok(self(features))
    }
}
