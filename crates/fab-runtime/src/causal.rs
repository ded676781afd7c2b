//! Causal-loop diagram model.
//!
//! Nodes, forward links and feedback loops relating the scenario inputs to
//! water savings and the economic outcomes, with the per-node detail text and
//! feedback messages. Layout and styling belong to the renderer.

use crate::report::{format_whole, ScenarioReport};
use fab_core::{MarketSegment, Strategy};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CausalNode {
    WaferSize,
    WaferIntention,
    Reclamation,
    Monitoring,
    Zld,
    InvestmentStrategy,
    GallonsSaved,
    Step(ProcessStep),
    Revenue,
    Profit,
    InvestmentEfficiency,
    RoiPercent,
    CompositeScore,
}

/// Fab process steps that share in the water saved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessStep {
    Cleaning,
    Etching,
    Diffusion,
    Lithography,
    Metrology,
}

impl ProcessStep {
    pub const ALL: [ProcessStep; 5] = [
        ProcessStep::Cleaning,
        ProcessStep::Etching,
        ProcessStep::Diffusion,
        ProcessStep::Lithography,
        ProcessStep::Metrology,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProcessStep::Cleaning => "Cleaning",
            ProcessStep::Etching => "Etching",
            ProcessStep::Diffusion => "Diffusion",
            ProcessStep::Lithography => "Lithography",
            ProcessStep::Metrology => "Metrology",
        }
    }

    /// Fraction of total gallons saved attributed to this step.
    pub fn share(self) -> f64 {
        match self {
            ProcessStep::Cleaning => 0.30,
            ProcessStep::Etching | ProcessStep::Diffusion | ProcessStep::Lithography => 0.20,
            ProcessStep::Metrology => 0.10,
        }
    }
}

impl CausalNode {
    pub const ALL: [CausalNode; 17] = [
        CausalNode::WaferSize,
        CausalNode::WaferIntention,
        CausalNode::Reclamation,
        CausalNode::Monitoring,
        CausalNode::Zld,
        CausalNode::InvestmentStrategy,
        CausalNode::GallonsSaved,
        CausalNode::Step(ProcessStep::Cleaning),
        CausalNode::Step(ProcessStep::Etching),
        CausalNode::Step(ProcessStep::Diffusion),
        CausalNode::Step(ProcessStep::Lithography),
        CausalNode::Step(ProcessStep::Metrology),
        CausalNode::Revenue,
        CausalNode::Profit,
        CausalNode::InvestmentEfficiency,
        CausalNode::RoiPercent,
        CausalNode::CompositeScore,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CausalNode::WaferSize => "Wafer Size",
            CausalNode::WaferIntention => "Wafer Intention",
            CausalNode::Reclamation => "Reclamation",
            CausalNode::Monitoring => "Monitoring",
            CausalNode::Zld => "ZLD",
            CausalNode::InvestmentStrategy => "Investment Strategy",
            CausalNode::GallonsSaved => "Gallons Saved",
            CausalNode::Step(step) => step.label(),
            CausalNode::Revenue => "Revenue",
            CausalNode::Profit => "Profit",
            CausalNode::InvestmentEfficiency => "Investment Efficiency",
            CausalNode::RoiPercent => "ROI %",
            CausalNode::CompositeScore => "Composite Score",
        }
    }
}

use CausalNode::*;

const FORWARD_LINKS: [(CausalNode, CausalNode); 16] = [
    (WaferSize, WaferIntention),
    (WaferIntention, Reclamation),
    (WaferIntention, Monitoring),
    (WaferIntention, Zld),
    (Reclamation, InvestmentStrategy),
    (Monitoring, InvestmentStrategy),
    (Zld, InvestmentStrategy),
    (InvestmentStrategy, GallonsSaved),
    (GallonsSaved, Revenue),
    (GallonsSaved, Profit),
    (GallonsSaved, InvestmentEfficiency),
    (GallonsSaved, RoiPercent),
    (Revenue, CompositeScore),
    (Profit, CompositeScore),
    (InvestmentEfficiency, CompositeScore),
    (RoiPercent, CompositeScore),
];

const NEGATIVE_FEEDBACK: [(CausalNode, CausalNode); 6] = [
    (Revenue, WaferSize),
    (Profit, InvestmentStrategy),
    (InvestmentEfficiency, InvestmentStrategy),
    (RoiPercent, Reclamation),
    (RoiPercent, Monitoring),
    (RoiPercent, Zld),
];

const POSITIVE_FEEDBACK: [(CausalNode, CausalNode); 6] = [
    (GallonsSaved, InvestmentStrategy),
    (GallonsSaved, Step(ProcessStep::Cleaning)),
    (GallonsSaved, Step(ProcessStep::Etching)),
    (GallonsSaved, Step(ProcessStep::Diffusion)),
    (GallonsSaved, Step(ProcessStep::Lithography)),
    (GallonsSaved, Step(ProcessStep::Metrology)),
];

/// Year from which 300 mm production is flagged as outdated.
const WAFER_300_OUTDATED_YEAR: i32 = 2040;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    Forward,
    NegativeFeedback,
    PositiveFeedback,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CausalLink {
    pub source: CausalNode,
    pub target: CausalNode,
    pub kind: LinkKind,
    /// Empty for forward links.
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub node: CausalNode,
    pub label: String,
    pub detail: String,
}

/// Scenario values the diagram text is built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackContext {
    pub year: i32,
    pub wafer_size_mm: u32,
    pub segment: MarketSegment,
    pub strategy: Strategy,
    pub reclamation_units: f64,
    pub monitoring_units: f64,
    pub zld_units: f64,
    pub revenue: f64,
    pub profit: f64,
    pub roi_percent: f64,
    pub composite_score: f64,
    pub gallons_saved: f64,
    pub predicted_efficiency: f64,
}

impl FeedbackContext {
    pub fn from_report(report: &ScenarioReport) -> Self {
        let input = &report.input;
        Self {
            year: input.year,
            wafer_size_mm: input.wafer_size_mm,
            segment: input.market_segment,
            strategy: input.strategy,
            reclamation_units: input.reclamation_units,
            monitoring_units: input.monitoring_units,
            zld_units: input.zld_units,
            revenue: report.result.base_revenue,
            profit: report.result.profit,
            roi_percent: report.result.roi_percent,
            composite_score: report.composite_score,
            gallons_saved: report.result.gallons_saved_year,
            predicted_efficiency: report.result.predicted_efficiency,
        }
    }
}

/// Gallons saved attributed to each process step.
pub fn process_step_split(total_gallons: f64) -> Vec<(ProcessStep, f64)> {
    ProcessStep::ALL
        .into_iter()
        .map(|step| (step, total_gallons * step.share()))
        .collect()
}

/// Message attached to a feedback link; empty when the link has none.
pub fn feedback_message(source: CausalNode, target: CausalNode, ctx: &FeedbackContext) -> String {
    match (source, target) {
        (Revenue, WaferSize) => {
            if ctx.wafer_size_mm == 300 && ctx.year >= WAFER_300_OUTDATED_YEAR {
                format!(
                    "300mm wafers outdated by {}. Shift to 450mm recommended.",
                    ctx.year
                )
            } else {
                format!(
                    "Current wafer size {}mm aligned with market.",
                    ctx.wafer_size_mm
                )
            }
        }
        (Profit, InvestmentStrategy) => "Profit declining. Suggest Decrease Strategy.".to_string(),
        (InvestmentEfficiency, InvestmentStrategy) => {
            "Investment Efficiency low. Recommend rebalancing.".to_string()
        }
        (RoiPercent, _) => format!(
            "ROI at {:.2}%. Consider investment adjustment.",
            ctx.roi_percent
        ),
        _ => String::new(),
    }
}

fn node_detail(node: CausalNode, ctx: &FeedbackContext) -> String {
    let usd = |units: f64| format_whole(units * fab_core::INVESTMENT_UNIT_USD);
    match node {
        WaferSize => "Market Trends:\n- 300mm decline ~2045\n- 450mm growth ~2030\n- 200mm slow decline"
            .to_string(),
        WaferIntention => {
            "ROI Weights:\nHPL 2.2x, Automotive 1.4x, Industrial 1.2x, Consumer 1.6x".to_string()
        }
        Reclamation => format!("Reclamation:\n${}", usd(ctx.reclamation_units)),
        Monitoring => format!("Monitoring:\n${}", usd(ctx.monitoring_units)),
        Zld => format!("ZLD:\n${}", usd(ctx.zld_units)),
        InvestmentStrategy => format!("Strategy: {}", ctx.strategy),
        GallonsSaved => format!(
            "Formula:\n(Baseline - Efficiency) × Wafers\n{} gal ({})",
            format_whole(ctx.gallons_saved),
            ctx.year
        ),
        Step(step) => format!(
            "{}:\n{} gal",
            step.label(),
            format_whole(ctx.gallons_saved * step.share())
        ),
        Revenue => format!("Revenue:\n${} ({})", format_whole(ctx.revenue), ctx.year),
        Profit => format!("Profit:\n${} ({})", format_whole(ctx.profit), ctx.year),
        InvestmentEfficiency => {
            format!("Efficiency:\n{:.2} mL/wafer", ctx.predicted_efficiency)
        }
        RoiPercent => format!("ROI:\n{:.2}% ({})", ctx.roi_percent, ctx.year),
        CompositeScore => format!("Composite:\n{:.2}", ctx.composite_score),
    }
}

/// Complete diagram for one scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CausalDiagram {
    pub context: FeedbackContext,
    pub nodes: Vec<DiagramNode>,
    pub links: Vec<CausalLink>,
}

impl CausalDiagram {
    pub fn new(context: FeedbackContext) -> Self {
        let nodes = CausalNode::ALL
            .into_iter()
            .map(|node| DiagramNode {
                node,
                label: node.label().to_string(),
                detail: node_detail(node, &context),
            })
            .collect();

        let mut links = Vec::with_capacity(
            FORWARD_LINKS.len() + NEGATIVE_FEEDBACK.len() + POSITIVE_FEEDBACK.len(),
        );
        links.extend(FORWARD_LINKS.iter().map(|&(source, target)| CausalLink {
            source,
            target,
            kind: LinkKind::Forward,
            message: String::new(),
        }));
        links.extend(NEGATIVE_FEEDBACK.iter().map(|&(source, target)| CausalLink {
            source,
            target,
            kind: LinkKind::NegativeFeedback,
            message: feedback_message(source, target, &context),
        }));
        links.extend(POSITIVE_FEEDBACK.iter().map(|&(source, target)| CausalLink {
            source,
            target,
            kind: LinkKind::PositiveFeedback,
            message: format!("Positive: {} boosts {}", source.label(), target.label()),
        }));

        Self {
            context,
            nodes,
            links,
        }
    }

    pub fn links_of(&self, kind: LinkKind) -> impl Iterator<Item = &CausalLink> {
        self.links.iter().filter(move |l| l.kind == kind)
    }

    pub fn node(&self, node: CausalNode) -> Option<&DiagramNode> {
        self.nodes.iter().find(|n| n.node == node)
    }
}
