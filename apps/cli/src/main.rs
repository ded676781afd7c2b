#![deny(warnings)]

//! Headless CLI: evaluate a fab water-investment scenario and print the
//! metrics, narrative, projection series and causal feedback.

use anyhow::{anyhow, Context, Result};
use fab_core::{MarketSegment, ScenarioInput, Strategy};
use fab_models::{ensure_artifact, ArtifactSource, CurlFetcher, ModelRegistry};
use fab_runtime::{
    CausalDiagram, Dashboard, LinkKind, Simulator, SimulatorConfig, FORMULA_GLOSSARY,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    segment: Option<MarketSegment>,
    wafer_size: Option<u32>,
    year: Option<i32>,
    strategy: Option<Strategy>,
    reclamation: Option<f64>,
    monitoring: Option<f64>,
    zld: Option<f64>,
    json: bool,
    no_download: bool,
}

fn value<T>(flag: &str, raw: Option<String>) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = raw.ok_or_else(|| anyhow!("{flag} needs a value"))?;
    raw.parse::<T>()
        .map_err(|e| anyhow!("invalid value {raw:?} for {flag}: {e}"))
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = Some(value(&arg, it.next())?),
            "--segment" => args.segment = Some(value(&arg, it.next())?),
            "--wafer-size" => args.wafer_size = Some(value(&arg, it.next())?),
            "--year" => args.year = Some(value(&arg, it.next())?),
            "--strategy" => args.strategy = Some(value(&arg, it.next())?),
            "--reclamation" => args.reclamation = Some(value(&arg, it.next())?),
            "--monitoring" => args.monitoring = Some(value(&arg, it.next())?),
            "--zld" => args.zld = Some(value(&arg, it.next())?),
            "--json" => args.json = true,
            "--no-download" => args.no_download = true,
            other => return Err(anyhow!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&Path>) -> Result<SimulatorConfig> {
    let Some(path) = path else {
        return Ok(SimulatorConfig::default());
    };
    let mut cfg = SimulatorConfig::load(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    if let Some(dir) = path.parent() {
        cfg.resolve_paths(dir);
    }
    Ok(cfg)
}

fn apply_overrides(scenario: &mut ScenarioInput, args: &Args) {
    if let Some(v) = args.segment {
        scenario.market_segment = v;
    }
    if let Some(v) = args.wafer_size {
        scenario.wafer_size_mm = v;
    }
    if let Some(v) = args.year {
        scenario.year = v;
    }
    if let Some(v) = args.strategy {
        scenario.strategy = v;
    }
    if let Some(v) = args.reclamation {
        scenario.reclamation_units = v;
    }
    if let Some(v) = args.monitoring {
        scenario.monitoring_units = v;
    }
    if let Some(v) = args.zld {
        scenario.zld_units = v;
    }
}

fn provision(source: &ArtifactSource, no_download: bool) -> Result<PathBuf> {
    let mut source = source.clone();
    if no_download {
        source.url = None;
    }
    ensure_artifact(&source, &CurlFetcher)
        .with_context(|| format!("provisioning model {}", source.path.display()))
}

#[derive(Serialize)]
struct Output<'a> {
    version: &'a str,
    commit: &'a str,
    dashboard: &'a Dashboard,
    diagram: &'a CausalDiagram,
}

fn print_text(dashboard: &Dashboard, diagram: &CausalDiagram) {
    let report = &dashboard.report;
    println!(
        "Scenario | {} | {}mm | {} | {} | reclamation {} | monitoring {} | zld {}",
        report.input.market_segment,
        report.input.wafer_size_mm,
        report.input.strategy,
        report.input.year,
        report.input.reclamation_units,
        report.input.monitoring_units,
        report.input.zld_units,
    );
    println!("ML multiplier: {:.4}", report.multiplier);
    println!();
    for (label, value) in report.metric_rows() {
        println!("{label:<28} {value}");
    }
    println!();
    println!("{}", report.summary());
    println!();
    println!("Formulas");
    for (name, expr) in FORMULA_GLOSSARY {
        println!("  {name:<28} {expr}");
    }
    println!();
    println!("{:>6} {:>12} {:>14} {:>12}", "year", "roi %", "gallons (B)", "composite");
    for i in 0..dashboard.years.len() {
        println!(
            "{:>6} {:>12.2} {:>14.3} {:>12.2}",
            dashboard.years[i],
            dashboard.roi_percent[i],
            dashboard.gallons_saved[i] / 1e9,
            dashboard.composite[i],
        );
    }
    println!();
    println!("Feedback");
    for link in diagram
        .links_of(LinkKind::NegativeFeedback)
        .chain(diagram.links_of(LinkKind::PositiveFeedback))
    {
        println!("  {}", link.message);
    }
}

fn main() -> Result<()> {
    // Logging to stderr so --json output stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_SHA"),
        built = env!("BUILD_DATE"),
        "starting fabsim"
    );

    let mut cfg = load_config(args.config.as_deref())?;
    apply_overrides(&mut cfg.scenario, &args);
    cfg.validate().context("invalid scenario")?;

    let revenue_path = provision(&cfg.models.revenue, args.no_download)?;
    let water_path = provision(&cfg.models.water, args.no_download)?;
    let registry = ModelRegistry::new(revenue_path, water_path);
    let sim = Simulator::from_registry(&registry).context("loading models")?;

    let dashboard = sim
        .dashboard(&cfg.scenario, cfg.horizon.years())
        .context("evaluating scenario")?;
    let diagram = sim.causal_diagram(&dashboard.report);

    if args.json {
        let out = Output {
            version: env!("CARGO_PKG_VERSION"),
            commit: env!("GIT_SHA"),
            dashboard: &dashboard,
            diagram: &diagram,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_text(&dashboard, &diagram);
    }
    Ok(())
}
