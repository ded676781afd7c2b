//! Year-by-year projection of the ROI calculation.
//!
//! Every year is recomputed from scratch: the revenue multiplier is predicted
//! again for the substituted year and the calculator runs in full. Nothing is
//! memoized across years or calls.

use crate::market::{chart_wafer_output, market_share, water_baseline};
use crate::roi::{calculate_roi, RoiResult};
use crate::EconError;
use fab_core::{
    build_efficiency_features, build_revenue_features, normalized_wafer_size,
    RevenueMultiplierModel, ScenarioInput, WaterEfficiencyModel, FIRST_YEAR, LAST_YEAR,
};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::debug;

/// Chart horizon: 2025 through 2075, 51 points.
pub const DEFAULT_HORIZON: RangeInclusive<i32> = FIRST_YEAR..=LAST_YEAR;

/// One year of a projection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub year: i32,
    /// Revenue multiplier predicted for this year.
    pub multiplier: f64,
    pub result: RoiResult,
}

/// Results aligned positionally with an ascending, gap-free run of years.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSeries {
    pub points: Vec<ProjectionPoint>,
}

impl ProjectionSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        self.points.iter().map(|p| p.year).collect()
    }

    pub fn roi_percent(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.result.roi_percent).collect()
    }

    pub fn gallons_saved(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.result.gallons_saved_year)
            .collect()
    }

    pub fn composite(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.result.composite_score())
            .collect()
    }
}

/// Run the ROI calculator once per year of `years` with the template's year
/// replaced.
pub fn project<R, W>(
    template: &ScenarioInput,
    years: RangeInclusive<i32>,
    revenue_model: &R,
    water_model: &W,
) -> Result<ProjectionSeries, EconError>
where
    R: RevenueMultiplierModel + ?Sized,
    W: WaterEfficiencyModel + ?Sized,
{
    let wafer_size = normalized_wafer_size(template.wafer_size_mm);
    let mut points = Vec::with_capacity(years.clone().count());
    for year in years {
        let input = template.with_year(year);
        let features = build_revenue_features(&input, wafer_size);
        let multiplier = revenue_model.predict_revenue_multiplier(&features)?;
        let result = calculate_roi(&input, multiplier, water_model)?;
        points.push(ProjectionPoint {
            year,
            multiplier,
            result,
        });
    }
    debug!(points = points.len(), "projection complete");
    Ok(ProjectionSeries { points })
}

/// Gallons saved per year for the market-aligned chart.
///
/// Uses the raw model prediction without the year penalty or clipping, and
/// the chart wafer-output table scaled by market share.
pub fn project_market_aligned_gallons<W>(
    template: &ScenarioInput,
    years: RangeInclusive<i32>,
    water_model: &W,
) -> Result<Vec<f64>, EconError>
where
    W: WaterEfficiencyModel + ?Sized,
{
    let baseline = water_baseline(template.wafer_size_mm);
    let base_output = chart_wafer_output(template.wafer_size_mm);
    years
        .map(|year| {
            let input = template.with_year(year);
            let efficiency =
                water_model.predict_water_efficiency(&build_efficiency_features(&input))?;
            let wafers = base_output * market_share(input.wafer_size_mm, year);
            Ok((baseline - efficiency) * wafers)
        })
        .collect()
}
