//! Static market tables and the linear wafer-size transition.

use crate::EconError;
use fab_core::MarketSegment;
use serde::{Deserialize, Serialize};

/// Fraction of wafer output per size for one year. Always sums to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketShareSplit {
    pub share_200: f64,
    pub share_300: f64,
    pub share_450: f64,
}

/// Price per wafer and annual volume for a wafer size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaferEconomics {
    pub price_usd: f64,
    pub volume: f64,
}

/// Market split for a year.
///
/// 200 mm declines linearly from 2025 to zero in 2045, 450 mm ramps linearly
/// from 2035 to full share in 2055, and 300 mm holds the residual.
pub fn market_share_split(year: i32) -> MarketShareSplit {
    let y = year as f64;
    let share_200 = if year <= 2045 {
        (1.0 - (y - 2025.0) / 20.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let share_450 = if year >= 2035 {
        ((y - 2035.0) / 20.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    MarketShareSplit {
        share_200,
        share_300: 1.0 - share_200 - share_450,
        share_450,
    }
}

/// Share of the market held by `wafer_size_mm` in `year`.
///
/// Sizes outside the table are treated as unconstrained and get full share.
pub fn market_share(wafer_size_mm: u32, year: i32) -> f64 {
    let split = market_share_split(year);
    match wafer_size_mm {
        200 => split.share_200,
        300 => split.share_300,
        450 => split.share_450,
        _ => 1.0,
    }
}

/// Wafer price and volume. There is no safe default, so unknown sizes fail.
pub fn wafer_economics(wafer_size_mm: u32) -> Result<WaferEconomics, EconError> {
    let (price_usd, volume) = match wafer_size_mm {
        200 => (1_500.0, 100_000.0),
        300 => (18_000.0, 200_000.0),
        450 => (72_000.0, 500_000.0),
        other => return Err(EconError::UnknownWaferSize(other)),
    };
    Ok(WaferEconomics { price_usd, volume })
}

/// Revenue weight of a market segment.
pub fn roi_weight(segment: MarketSegment) -> f64 {
    match segment {
        MarketSegment::HighPerformanceLogic => 2.2,
        MarketSegment::ConsumerElectronics => 1.6,
        MarketSegment::Automotive => 1.4,
        MarketSegment::MedicalDevices => 1.3,
        MarketSegment::IndustrialControls => 1.2,
    }
}

/// Revenue weight looked up by label; unrecognized labels weigh 1.0.
pub fn roi_weight_for_label(label: &str) -> f64 {
    MarketSegment::from_label(label).map_or(1.0, roi_weight)
}

/// Baseline gallons of water per wafer before efficiency investments.
pub fn water_baseline(wafer_size_mm: u32) -> f64 {
    match wafer_size_mm {
        200 => 1_200.0,
        300 => 3_600.0,
        450 => 7_200.0,
        _ => 3_600.0,
    }
}

/// Annual wafer output used by the ROI formula.
///
/// Kept separate from [`chart_wafer_output`]; the two tables feed different
/// calculations at different scales.
pub fn roi_wafer_output(wafer_size_mm: u32) -> f64 {
    match wafer_size_mm {
        200 => 100_000.0,
        300 => 200_000.0,
        450 => 500_000.0,
        _ => 200_000.0,
    }
}

/// Annual wafer output used by the long-horizon gallons chart.
pub fn chart_wafer_output(wafer_size_mm: u32) -> f64 {
    match wafer_size_mm {
        200 => 900_000.0,
        300 => 1_080_000.0,
        450 => 1_500_000.0,
        _ => 1_080_000.0,
    }
}
