//! Water-investment ROI calculator.

use crate::market::{market_share, roi_wafer_output, roi_weight, wafer_economics, water_baseline};
use crate::EconError;
use fab_core::{build_efficiency_features, ScenarioInput, WaterEfficiencyModel};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Dollar value of one gallon of water saved.
///
/// The formula glossary shows "$0.10"; the calculation has always used 0.004.
pub const DOLLARS_PER_GALLON: f64 = 0.004;

/// Efficiency drift per year after 2025.
const YEAR_PENALTY_PER_YEAR: f64 = 0.001;

/// Lowest predicted efficiency allowed, as a fraction of the baseline.
const EFFICIENCY_FLOOR_FRAC: f64 = 0.1;

/// Financial and environmental outcome of one scenario.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiResult {
    /// Revenue in USD after market share and model multiplier.
    pub base_revenue: f64,
    /// Revenue minus investment dollars.
    pub profit: f64,
    /// Water savings value over investment, in percent.
    pub roi_percent: f64,
    /// Clipped water use per wafer predicted by the efficiency model.
    pub predicted_efficiency: f64,
    pub gallons_saved_year: f64,
    pub dollar_value_saved: f64,
}

impl RoiResult {
    /// Mean of ROI% and predicted efficiency.
    ///
    /// The two terms have different units; the score is kept as displayed.
    pub fn composite_score(&self) -> f64 {
        (self.roi_percent + self.predicted_efficiency) / 2.0
    }
}

/// Compute revenue, profit, water savings and ROI for a scenario.
///
/// A zero `multiplier` means "no adjustment", not zero revenue.
pub fn calculate_roi<W>(
    input: &ScenarioInput,
    multiplier: f64,
    water_model: &W,
) -> Result<RoiResult, EconError>
where
    W: WaterEfficiencyModel + ?Sized,
{
    let wafer = wafer_economics(input.wafer_size_mm)?;
    let weight = roi_weight(input.market_segment);
    let share = market_share(input.wafer_size_mm, input.year);

    let mut base_revenue = wafer.volume * wafer.price_usd * weight * share;
    if multiplier != 0.0 {
        base_revenue *= multiplier;
    }

    let investment_usd = input.total_investment_usd();
    let profit = base_revenue - investment_usd;

    let features = build_efficiency_features(input);
    let raw_efficiency = water_model.predict_water_efficiency(&features)?;
    let year_penalty = 1.0 + YEAR_PENALTY_PER_YEAR * (input.year - 2025) as f64;
    let baseline = water_baseline(input.wafer_size_mm);
    let predicted_efficiency =
        clip_efficiency(raw_efficiency * year_penalty, baseline);

    let annual_wafers = roi_wafer_output(input.wafer_size_mm);
    let gallons_saved_year = (baseline - predicted_efficiency) * annual_wafers * share;
    let dollar_value_saved = gallons_saved_year * DOLLARS_PER_GALLON;
    let roi_percent = if investment_usd != 0.0 {
        dollar_value_saved / investment_usd * 100.0
    } else {
        0.0
    };

    debug!(
        year = input.year,
        wafer_mm = input.wafer_size_mm,
        segment = %input.market_segment,
        raw_efficiency,
        predicted_efficiency,
        roi_percent,
        "roi calculated"
    );

    Ok(RoiResult {
        base_revenue,
        profit,
        roi_percent,
        predicted_efficiency,
        gallons_saved_year,
        dollar_value_saved,
    })
}

/// Clamp into [0.1 × baseline, baseline]. A NaN prediction saves nothing.
fn clip_efficiency(value: f64, baseline: f64) -> f64 {
    let floor = baseline * EFFICIENCY_FLOOR_FRAC;
    value.min(baseline).max(floor)
}
