use criterion::{criterion_group, criterion_main, Criterion};
use fab_core::{EfficiencyFeatures, RevenueFeatures, ScenarioInput};
use fab_runtime::{Simulator, DEFAULT_HORIZON};
use std::sync::Arc;

fn bench_dashboard(c: &mut Criterion) {
    let sim = Simulator::new(
        Arc::new(|f: &RevenueFeatures| 1.0 + f.impact_score / 10_000.0),
        Arc::new(|f: &EfficiencyFeatures| 2_400.0 - f.total_investment + f.year_squared * 1e-6),
    );
    let input = ScenarioInput::default();
    c.bench_function("dashboard_sweep", |b| {
        b.iter(|| {
            let _ = sim.dashboard(&input, DEFAULT_HORIZON);
        })
    });
}

criterion_group!(benches, bench_dashboard);
criterion_main!(benches);
