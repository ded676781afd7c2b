#![deny(warnings)]

//! Core domain models and invariants for the fab water-ROI simulator.
//!
//! This crate defines the serializable scenario types shared by the market,
//! model and runtime crates, the feature builders that feed the two
//! predictive models, and the traits those models are consumed through.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod features;
pub mod model;

pub use features::{
    build_efficiency_features, build_revenue_features, impact_score, normalized_wafer_size,
    EfficiencyFeatures, FeatureRow, FeatureValue, RevenueFeatures,
};
pub use model::{ModelError, RevenueMultiplierModel, WaterEfficiencyModel};

/// Dollars represented by one investment unit.
pub const INVESTMENT_UNIT_USD: f64 = 10_000.0;

/// Upper bound of a single investment field, in units.
pub const MAX_INVESTMENT_UNITS: f64 = 500.0;

/// Wafer diameters the fab can be configured with.
pub const SUPPORTED_WAFER_SIZES_MM: [u32; 3] = [200, 300, 450];

/// First and last year of the nominal scenario range.
pub const FIRST_YEAR: i32 = 2025;
pub const LAST_YEAR: i32 = 2075;

/// End-market the fab's wafers are intended for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketSegment {
    #[serde(rename = "Automotive")]
    Automotive,
    #[serde(rename = "Consumer Electronics")]
    ConsumerElectronics,
    #[serde(rename = "High-Performance Logic")]
    HighPerformanceLogic,
    #[serde(rename = "Medical Devices")]
    MedicalDevices,
    #[serde(rename = "Industrial Controls")]
    IndustrialControls,
}

impl MarketSegment {
    pub const ALL: [MarketSegment; 5] = [
        MarketSegment::Automotive,
        MarketSegment::ConsumerElectronics,
        MarketSegment::HighPerformanceLogic,
        MarketSegment::MedicalDevices,
        MarketSegment::IndustrialControls,
    ];

    /// Display label, also the raw categorical value handed to the water model.
    pub fn label(self) -> &'static str {
        match self {
            MarketSegment::Automotive => "Automotive",
            MarketSegment::ConsumerElectronics => "Consumer Electronics",
            MarketSegment::HighPerformanceLogic => "High-Performance Logic",
            MarketSegment::MedicalDevices => "Medical Devices",
            MarketSegment::IndustrialControls => "Industrial Controls",
        }
    }

    /// Parse a display label or a snake/kebab-case alias ("high-performance-logic").
    pub fn from_label(s: &str) -> Option<Self> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        MarketSegment::ALL.into_iter().find(|seg| {
            let candidate: String = seg
                .label()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .map(|c| c.to_ascii_lowercase())
                .collect();
            candidate == key
        })
    }
}

impl fmt::Display for MarketSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MarketSegment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarketSegment::from_label(s).ok_or_else(|| ValidationError::UnknownSegment(s.to_string()))
    }
}

/// Investment strategy selected for the scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    Maintain,
    Increase,
    Decrease,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Strategy::Maintain => "Maintain",
            Strategy::Increase => "Increase",
            Strategy::Decrease => "Decrease",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Strategy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "maintain" => Ok(Strategy::Maintain),
            "increase" => Ok(Strategy::Increase),
            "decrease" => Ok(Strategy::Decrease),
            _ => Err(ValidationError::UnknownStrategy(s.to_string())),
        }
    }
}

/// User-selected fab parameters for a single calculation.
///
/// Investment fields share one scale: 1 unit = $10,000.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioInput {
    /// Wafer intention / end market.
    pub market_segment: MarketSegment,
    /// Wafer diameter in mm (200, 300 or 450).
    pub wafer_size_mm: u32,
    /// Investment strategy.
    pub strategy: Strategy,
    /// Snapshot year.
    pub year: i32,
    /// Water reclamation investment in units.
    pub reclamation_units: f64,
    /// Monitoring investment in units.
    pub monitoring_units: f64,
    /// Zero-liquid-discharge investment in units.
    pub zld_units: f64,
}

impl Default for ScenarioInput {
    fn default() -> Self {
        Self {
            market_segment: MarketSegment::Automotive,
            wafer_size_mm: 300,
            strategy: Strategy::Maintain,
            year: 2035,
            reclamation_units: 100.0,
            monitoring_units: 50.0,
            zld_units: 100.0,
        }
    }
}

impl ScenarioInput {
    /// Sum of the three investment fields, in units.
    pub fn total_investment_units(&self) -> f64 {
        self.reclamation_units + self.monitoring_units + self.zld_units
    }

    /// Total investment in dollars.
    pub fn total_investment_usd(&self) -> f64 {
        self.total_investment_units() * INVESTMENT_UNIT_USD
    }

    /// Copy of this scenario with the year replaced.
    pub fn with_year(&self, year: i32) -> Self {
        Self {
            year,
            ..self.clone()
        }
    }
}

/// Validation errors for scenario invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Year outside [2025, 2075].
    #[error("year {0} is out of supported range [2025, 2075]")]
    YearOutOfRange(i32),
    /// Wafer size not one of 200/300/450 mm.
    #[error("unsupported wafer size: {0}mm")]
    UnsupportedWaferSize(u32),
    /// Investment field outside [0, 500] units.
    #[error("{field} investment {value} is outside [0, 500] units")]
    InvestmentOutOfRange { field: &'static str, value: f64 },
    /// Numeric field must be finite.
    #[error("non-finite numeric value in {0}")]
    NonFinite(&'static str),
    /// Segment label not recognized.
    #[error("unknown market segment: {0}")]
    UnknownSegment(String),
    /// Strategy label not recognized.
    #[error("unknown investment strategy: {0}")]
    UnknownStrategy(String),
}

/// Validate a scenario against the ranges the UI exposes.
///
/// The calculators do not call this: out-of-range years still compute.
pub fn validate_scenario(input: &ScenarioInput) -> Result<(), ValidationError> {
    if !SUPPORTED_WAFER_SIZES_MM.contains(&input.wafer_size_mm) {
        return Err(ValidationError::UnsupportedWaferSize(input.wafer_size_mm));
    }
    if !(FIRST_YEAR..=LAST_YEAR).contains(&input.year) {
        return Err(ValidationError::YearOutOfRange(input.year));
    }
    for (field, value) in [
        ("reclamation", input.reclamation_units),
        ("monitoring", input.monitoring_units),
        ("zld", input.zld_units),
    ] {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite(field));
        }
        if !(0.0..=MAX_INVESTMENT_UNITS).contains(&value) {
            return Err(ValidationError::InvestmentOutOfRange { field, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Strategy;
    use proptest::prelude::*;

    #[test]
    fn default_scenario_is_valid() {
        let input = ScenarioInput::default();
        validate_scenario(&input).unwrap();
        assert_eq!(input.total_investment_units(), 250.0);
        assert_eq!(input.total_investment_usd(), 2_500_000.0);
    }

    #[test]
    fn serde_roundtrip_scenario() {
        let input = ScenarioInput {
            market_segment: MarketSegment::HighPerformanceLogic,
            ..ScenarioInput::default()
        };
        let s = serde_json::to_string(&input).unwrap();
        assert!(s.contains("High-Performance Logic"));
        let back: ScenarioInput = serde_json::from_str(&s).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn partial_scenario_fills_defaults() {
        let back: ScenarioInput = serde_json::from_str(r#"{"wafer_size_mm": 450}"#).unwrap();
        assert_eq!(back.wafer_size_mm, 450);
        assert_eq!(back.year, 2035);
        assert_eq!(back.market_segment, MarketSegment::Automotive);
    }

    #[test]
    fn segment_labels_parse() {
        for seg in MarketSegment::ALL {
            assert_eq!(seg.label().parse::<MarketSegment>().unwrap(), seg);
        }
        assert_eq!(
            MarketSegment::from_label("high-performance-logic"),
            Some(MarketSegment::HighPerformanceLogic)
        );
        assert_eq!(
            MarketSegment::from_label("consumer_electronics"),
            Some(MarketSegment::ConsumerElectronics)
        );
        assert!("Aerospace".parse::<MarketSegment>().is_err());
    }

    #[test]
    fn strategy_parse() {
        assert_eq!("increase".parse::<Strategy>().unwrap(), Strategy::Increase);
        assert_eq!("Decrease".parse::<Strategy>().unwrap(), Strategy::Decrease);
        assert!("hold".parse::<Strategy>().is_err());
    }

    #[test]
    fn validation_rejects_bad_fields() {
        let bad_size = ScenarioInput {
            wafer_size_mm: 999,
            ..ScenarioInput::default()
        };
        assert_eq!(
            validate_scenario(&bad_size),
            Err(ValidationError::UnsupportedWaferSize(999))
        );
        let bad_year = ScenarioInput::default().with_year(2020);
        assert_eq!(
            validate_scenario(&bad_year),
            Err(ValidationError::YearOutOfRange(2020))
        );
        let bad_inv = ScenarioInput {
            zld_units: 600.0,
            ..ScenarioInput::default()
        };
        assert!(matches!(
            validate_scenario(&bad_inv),
            Err(ValidationError::InvestmentOutOfRange { field: "zld", .. })
        ));
        let nan = ScenarioInput {
            monitoring_units: f64::NAN,
            ..ScenarioInput::default()
        };
        assert_eq!(
            validate_scenario(&nan),
            Err(ValidationError::NonFinite("monitoring"))
        );
    }

    proptest! {
        #[test]
        fn in_range_scenarios_validate(year in FIRST_YEAR..=LAST_YEAR,
                                       rec in 0.0f64..=500.0,
                                       mon in 0.0f64..=500.0,
                                       zld in 0.0f64..=500.0,
                                       idx in 0usize..3) {
            let input = ScenarioInput {
                wafer_size_mm: SUPPORTED_WAFER_SIZES_MM[idx],
                year,
                reclamation_units: rec,
                monitoring_units: mon,
                zld_units: zld,
                ..ScenarioInput::default()
            };
            prop_assert!(validate_scenario(&input).is_ok());
        }
    }
}
