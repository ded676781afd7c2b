//! Headline metrics, narrative summary and the formula glossary.

use fab_core::ScenarioInput;
use fab_econ::RoiResult;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Formula names and expressions shown next to the results.
///
/// Display text only. "Gallons Saved × $0.10" does not match the 0.004 $/gal
/// the calculator uses; the wording stays until product confirms which is
/// intended.
pub const FORMULA_GLOSSARY: [(&str, &str); 7] = [
    (
        "Base Revenue",
        "volume × price × ROI weight × market share × ML multiplier",
    ),
    ("Profit", "Base Revenue − (Investment × $10,000)"),
    ("Adjusted Profit", "Profit + Dollar Value of Water Saved"),
    (
        "ROI (Water-Aligned)",
        "(Adjusted Profit ÷ (Investment × $10,000)) × 100",
    ),
    (
        "Gallons Saved",
        "(Baseline Water − Predicted Efficiency) × Annual Wafers",
    ),
    ("Dollar Value of Water Saved", "Gallons Saved × $0.10"),
    ("Composite Score", "(ROI + Efficiency Score) ÷ 2"),
];

/// Headline numbers in display units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub gallons_saved_billions: f64,
    pub roi_percent: f64,
    pub revenue_billions: f64,
    pub profit_billions: f64,
    pub investment_millions: f64,
    pub composite_score: f64,
}

/// Outcome of evaluating one scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub input: ScenarioInput,
    pub multiplier: f64,
    pub result: RoiResult,
    pub composite_score: f64,
    pub total_investment_usd: f64,
    pub metrics: Metrics,
}

impl ScenarioReport {
    pub fn new(input: ScenarioInput, multiplier: f64, result: RoiResult) -> Self {
        let total_investment_usd = input.total_investment_usd();
        let composite_score = result.composite_score();
        let metrics = Metrics {
            gallons_saved_billions: result.gallons_saved_year / 1e9,
            roi_percent: result.roi_percent,
            revenue_billions: result.base_revenue / 1e9,
            profit_billions: result.profit / 1e9,
            investment_millions: total_investment_usd / 1e6,
            composite_score,
        };
        Self {
            input,
            multiplier,
            result,
            composite_score,
            total_investment_usd,
            metrics,
        }
    }

    /// Metric labels and formatted values, in panel order.
    pub fn metric_rows(&self) -> Vec<(String, String)> {
        let m = &self.metrics;
        let year = self.input.year;
        vec![
            (
                "Gallons Saved (B)".to_string(),
                format!("{:.3}B", m.gallons_saved_billions),
            ),
            (
                "ROI from Water Investment".to_string(),
                format!("{:.2}%", m.roi_percent),
            ),
            (
                format!("Total Revenue {year}"),
                format!("${:.3}B", m.revenue_billions),
            ),
            (
                format!("Total Profit {year}"),
                format!("${:.3}B", m.profit_billions),
            ),
            (
                format!("Total Investment {year}"),
                format!("${:.3}M", m.investment_millions),
            ),
            (
                "Composite Score".to_string(),
                format!("{:.2}", m.composite_score),
            ),
        ]
    }

    /// One-paragraph scenario narrative.
    pub fn summary(&self) -> String {
        format!(
            "In {}, this fab produces {}mm wafers for the {} industry, returning a profit of ${}. \
             Due to an investment of ${}, {} gallons of water were saved, worth ${} in value.",
            self.input.year,
            group_thousands(&self.input.wafer_size_mm.to_string()),
            self.input.market_segment,
            format_whole(self.result.profit),
            format_whole(self.total_investment_usd),
            format_whole(self.result.gallons_saved_year),
            format_whole(self.result.dollar_value_saved),
        )
    }
}

/// Round to a whole number and group thousands with commas.
///
/// Values outside the decimal range fall back to plain float formatting.
pub fn format_whole(value: f64) -> String {
    match Decimal::from_f64(value) {
        Some(d) => {
            let rounded = d.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
            group_thousands(&rounded.normalize().to_string())
        }
        None => format!("{value:.0}"),
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{sign}{out}")
}
