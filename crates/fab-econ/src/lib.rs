#![deny(warnings)]

//! Economic models: market tables, the water-ROI calculator and the
//! year-by-year projection engine.
//!
//! This crate provides:
//! - Wafer pricing, segment weights and the 200/300/450 mm market transition
//! - The ROI formula combining model predictions with market tables
//! - Projection of the ROI calculation across a horizon of years

use fab_core::ModelError;
use thiserror::Error;

pub mod market;
pub mod projection;
pub mod roi;

pub use market::{
    chart_wafer_output, market_share, market_share_split, roi_wafer_output, roi_weight,
    roi_weight_for_label, wafer_economics, water_baseline, MarketShareSplit, WaferEconomics,
};
pub use projection::{
    project, project_market_aligned_gallons, ProjectionPoint, ProjectionSeries, DEFAULT_HORIZON,
};
pub use roi::{calculate_roi, RoiResult, DOLLARS_PER_GALLON};

/// Errors produced by economic helpers.
#[derive(Debug, Error)]
pub enum EconError {
    /// Price/volume exist only for 200, 300 and 450 mm wafers.
    #[error("no pricing data for {0}mm wafers")]
    UnknownWaferSize(u32),
    /// A predictive model failed.
    #[error(transparent)]
    Model(#[from] ModelError),
}
