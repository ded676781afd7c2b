//! Feature engineering for the two predictive models.
//!
//! The revenue multiplier model was trained on a flat positional vector with
//! one-hot segment flags; the water-efficiency model was trained on a labeled
//! record and encodes its categorical columns itself. The two builders are
//! intentionally separate and compute "percent reclaimed" differently.

use crate::{MarketSegment, ScenarioInput};
use serde::{Deserialize, Serialize};

/// Water intensity score used by both models (not yet driven by inputs).
pub const INTENSITY_SCORE: f64 = 0.75;

/// Strategy label the water model always receives.
pub const EFFICIENCY_STRATEGY_LABEL: &str = "Maintain";

/// Process step label the water model always receives.
pub const EFFICIENCY_WAFER_STEP: &str = "Cleaning";

/// Weighted sum of the three investment categories.
pub fn impact_score(reclamation: f64, monitoring: f64, zld: f64) -> f64 {
    reclamation * 1.0 + monitoring * 0.7 + zld * 0.7
}

/// Wafer size relative to the 300 mm reference, as the revenue model expects.
pub fn normalized_wafer_size(wafer_size_mm: u32) -> f64 {
    wafer_size_mm as f64 / 300.0
}

/// A single model input value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Label(String),
}

/// Named feature values in column order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow(pub Vec<(String, FeatureValue)>);

impl FeatureRow {
    pub fn push_number(&mut self, name: &str, value: f64) {
        self.0.push((name.to_string(), FeatureValue::Number(value)));
    }

    pub fn push_label(&mut self, name: &str, value: &str) {
        self.0
            .push((name.to_string(), FeatureValue::Label(value.to_string())));
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Positional input of the revenue multiplier model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevenueFeatures {
    /// Wafer size normalized to 300 mm.
    pub wafer_size: f64,
    pub year: f64,
    /// min(reclamation × 10, 100).
    pub percent_reclaimed: f64,
    pub intensity_score: f64,
    pub impact_score: f64,
    /// Consumer Electronics, High-Performance Logic, Industrial Controls,
    /// Medical Devices. Automotive is the all-zero baseline.
    pub segment_flags: [f64; 4],
}

impl RevenueFeatures {
    /// Column names in model order.
    pub const COLUMNS: [&'static str; 9] = [
        "wafer_size",
        "year",
        "percent_reclaimed",
        "intensity_score",
        "impact_score",
        "segment_consumer_electronics",
        "segment_high_performance_logic",
        "segment_industrial_controls",
        "segment_medical_devices",
    ];

    pub fn to_vec(&self) -> Vec<f64> {
        let mut v = vec![
            self.wafer_size,
            self.year,
            self.percent_reclaimed,
            self.intensity_score,
            self.impact_score,
        ];
        v.extend_from_slice(&self.segment_flags);
        v
    }

    pub fn to_row(&self) -> FeatureRow {
        let mut row = FeatureRow::default();
        for (name, value) in Self::COLUMNS.iter().zip(self.to_vec()) {
            row.push_number(name, value);
        }
        row
    }
}

/// Build the revenue model input.
///
/// `wafer_size_normalized` is supplied by the caller (see [`normalized_wafer_size`]).
pub fn build_revenue_features(input: &ScenarioInput, wafer_size_normalized: f64) -> RevenueFeatures {
    let flag = |seg: MarketSegment| if input.market_segment == seg { 1.0 } else { 0.0 };
    RevenueFeatures {
        wafer_size: wafer_size_normalized,
        year: input.year as f64,
        percent_reclaimed: (input.reclamation_units * 10.0).min(100.0),
        intensity_score: INTENSITY_SCORE,
        impact_score: impact_score(
            input.reclamation_units,
            input.monitoring_units,
            input.zld_units,
        ),
        segment_flags: [
            flag(MarketSegment::ConsumerElectronics),
            flag(MarketSegment::HighPerformanceLogic),
            flag(MarketSegment::IndustrialControls),
            flag(MarketSegment::MedicalDevices),
        ],
    }
}

/// Labeled input of the water-efficiency model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyFeatures {
    pub year: i32,
    pub year_squared: f64,
    pub wafer_size_mm: u32,
    pub segment: MarketSegment,
    pub reclamation_investment: f64,
    pub monitoring_investment: f64,
    pub zld_investment: f64,
    pub total_investment: f64,
    /// Total investment per 100 mm of wafer diameter.
    pub investment_efficiency: f64,
    pub impact_score: f64,
    /// min(impact_score × 2.5, 100).
    pub percent_reclaimed: f64,
    pub water_intensity_score: f64,
    pub investment_strategy: String,
    pub wafer_step: String,
}

impl EfficiencyFeatures {
    /// Column names the water model was trained with.
    pub const COLUMNS: [&'static str; 14] = [
        "Year",
        "Year Squared",
        "Wafer Size",
        "Wafer Intention",
        "Reclamation Investment",
        "Monitoring Investment",
        "ZLD Investment",
        "Total Investment",
        "Investment Efficiency ($10k)",
        "Investment Impact Score",
        "Percent Water Reclaimed",
        "Water Intensity Score",
        "Investment Strategy",
        "Wafer Step",
    ];

    pub fn to_row(&self) -> FeatureRow {
        let c = Self::COLUMNS;
        let mut row = FeatureRow::default();
        row.push_number(c[0], self.year as f64);
        row.push_number(c[1], self.year_squared);
        row.push_number(c[2], self.wafer_size_mm as f64);
        row.push_label(c[3], self.segment.label());
        row.push_number(c[4], self.reclamation_investment);
        row.push_number(c[5], self.monitoring_investment);
        row.push_number(c[6], self.zld_investment);
        row.push_number(c[7], self.total_investment);
        row.push_number(c[8], self.investment_efficiency);
        row.push_number(c[9], self.impact_score);
        row.push_number(c[10], self.percent_reclaimed);
        row.push_number(c[11], self.water_intensity_score);
        row.push_label(c[12], &self.investment_strategy);
        row.push_label(c[13], &self.wafer_step);
        row
    }
}

/// Build the water-efficiency model input.
pub fn build_efficiency_features(input: &ScenarioInput) -> EfficiencyFeatures {
    let total = input.total_investment_units();
    let investment_efficiency = if input.wafer_size_mm != 0 {
        total / (input.wafer_size_mm as f64 / 100.0)
    } else {
        0.0
    };
    let impact = impact_score(
        input.reclamation_units,
        input.monitoring_units,
        input.zld_units,
    );
    let year = input.year as f64;
    EfficiencyFeatures {
        year: input.year,
        year_squared: year * year,
        wafer_size_mm: input.wafer_size_mm,
        segment: input.market_segment,
        reclamation_investment: input.reclamation_units,
        monitoring_investment: input.monitoring_units,
        zld_investment: input.zld_units,
        total_investment: total,
        investment_efficiency,
        impact_score: impact,
        percent_reclaimed: (impact * 2.5).min(100.0),
        water_intensity_score: INTENSITY_SCORE,
        investment_strategy: EFFICIENCY_STRATEGY_LABEL.to_string(),
        wafer_step: EFFICIENCY_WAFER_STEP.to_string(),
    }
}
