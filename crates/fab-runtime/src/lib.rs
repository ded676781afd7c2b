#![deny(warnings)]

//! Simulation runtime: wires the two predictive models into the ROI
//! calculator and projection engine, and assembles the reports, chart series
//! and causal-diagram data a presentation layer renders.

use fab_core::{
    build_revenue_features, normalized_wafer_size, ModelError, RevenueMultiplierModel,
    ScenarioInput, ValidationError, WaterEfficiencyModel,
};
use fab_econ::{calculate_roi, project, project_market_aligned_gallons, EconError};
use fab_models::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub mod causal;
pub mod config;
pub mod report;

pub use causal::{CausalDiagram, CausalLink, CausalNode, FeedbackContext, LinkKind, ProcessStep};
pub use config::{HorizonConfig, ModelsConfig, SimulatorConfig};
pub use fab_econ::{ProjectionSeries, RoiResult, DEFAULT_HORIZON};
pub use report::{Metrics, ScenarioReport, FORMULA_GLOSSARY};

/// Errors surfaced by the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Econ(#[from] EconError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for RuntimeError {
    fn from(e: std::io::Error) -> Self {
        RuntimeError::Io(e.to_string())
    }
}

/// Chart series for a scenario over a horizon, aligned with `years`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub report: ScenarioReport,
    pub years: Vec<i32>,
    pub roi_percent: Vec<f64>,
    /// Market-aligned gallons (chart wafer-output table, raw predictions).
    pub gallons_saved: Vec<f64>,
    pub composite: Vec<f64>,
}

/// The calculation engine with its models injected.
///
/// Models are shared read-only; cloning the simulator clones the handles.
#[derive(Clone)]
pub struct Simulator {
    revenue: Arc<dyn RevenueMultiplierModel>,
    water: Arc<dyn WaterEfficiencyModel>,
}

impl Simulator {
    pub fn new(
        revenue: Arc<dyn RevenueMultiplierModel>,
        water: Arc<dyn WaterEfficiencyModel>,
    ) -> Self {
        Self { revenue, water }
    }

    /// Build from a registry, loading both artifacts now so a bad model fails
    /// at startup rather than mid-calculation.
    pub fn from_registry(registry: &ModelRegistry) -> Result<Self, RuntimeError> {
        let revenue = registry.revenue_model()?;
        let water = registry.water_model()?;
        info!("simulator ready");
        Ok(Self::new(revenue, water))
    }

    /// Revenue multiplier for the scenario as the application computes it.
    pub fn multiplier(&self, input: &ScenarioInput) -> Result<f64, RuntimeError> {
        let features = build_revenue_features(input, normalized_wafer_size(input.wafer_size_mm));
        Ok(self.revenue.predict_revenue_multiplier(&features)?)
    }

    /// Single ROI calculation with an explicit multiplier.
    pub fn calculate(&self, input: &ScenarioInput, multiplier: f64) -> Result<RoiResult, RuntimeError> {
        Ok(calculate_roi(input, multiplier, self.water.as_ref())?)
    }

    /// Predict the multiplier, run the calculator and build the report.
    pub fn evaluate(&self, input: &ScenarioInput) -> Result<ScenarioReport, RuntimeError> {
        let multiplier = self.multiplier(input)?;
        let result = self.calculate(input, multiplier)?;
        debug!(year = input.year, multiplier, "scenario evaluated");
        Ok(ScenarioReport::new(input.clone(), multiplier, result))
    }

    /// ROI projection over `years`.
    pub fn project(
        &self,
        input: &ScenarioInput,
        years: RangeInclusive<i32>,
    ) -> Result<ProjectionSeries, RuntimeError> {
        Ok(project(input, years, self.revenue.as_ref(), self.water.as_ref())?)
    }

    /// Market-aligned gallons-saved series over `years`.
    pub fn market_aligned_gallons(
        &self,
        input: &ScenarioInput,
        years: RangeInclusive<i32>,
    ) -> Result<Vec<f64>, RuntimeError> {
        Ok(project_market_aligned_gallons(
            input,
            years,
            self.water.as_ref(),
        )?)
    }

    /// Report plus the three chart series.
    pub fn dashboard(
        &self,
        input: &ScenarioInput,
        years: RangeInclusive<i32>,
    ) -> Result<Dashboard, RuntimeError> {
        let report = self.evaluate(input)?;
        let series = self.project(input, years.clone())?;
        let gallons_saved = self.market_aligned_gallons(input, years)?;
        Ok(Dashboard {
            report,
            years: series.years(),
            roi_percent: series.roi_percent(),
            gallons_saved,
            composite: series.composite(),
        })
    }

    /// Causal-loop diagram data for an evaluated scenario.
    pub fn causal_diagram(&self, report: &ScenarioReport) -> CausalDiagram {
        CausalDiagram::new(FeedbackContext::from_report(report))
    }
}
