//! YAML configuration: model artifact locations, the scenario and the
//! projection horizon.

use crate::RuntimeError;
use fab_core::{validate_scenario, ScenarioInput, FIRST_YEAR, LAST_YEAR};
use fab_models::{ArtifactSource, DEFAULT_MIN_ARTIFACT_BYTES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub revenue: ArtifactSource,
    pub water: ArtifactSource,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            revenue: ArtifactSource {
                path: PathBuf::from("assets/models/revenue_multiplier.json"),
                url: None,
                min_bytes: DEFAULT_MIN_ARTIFACT_BYTES,
            },
            water: ArtifactSource {
                path: PathBuf::from("assets/models/water_efficiency.json"),
                url: None,
                min_bytes: DEFAULT_MIN_ARTIFACT_BYTES,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    pub start: i32,
    pub end: i32,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            start: FIRST_YEAR,
            end: LAST_YEAR,
        }
    }
}

impl HorizonConfig {
    pub fn years(&self) -> RangeInclusive<i32> {
        self.start..=self.end
    }
}

/// Top-level configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub models: ModelsConfig,
    pub scenario: ScenarioInput,
    pub horizon: HorizonConfig,
}

impl SimulatorConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, RuntimeError> {
        let cfg: SimulatorConfig =
            serde_yaml::from_str(text).map_err(|e| RuntimeError::Config(e.to_string()))?;
        cfg.check()?;
        Ok(cfg)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RuntimeError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Resolve relative artifact paths against `base` (the config file's
    /// directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        for source in [&mut self.models.revenue, &mut self.models.water] {
            if source.path.is_relative() {
                source.path = base.join(&source.path);
            }
        }
    }

    /// Check the scenario and horizon once overrides have been applied.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        self.check()?;
        validate_scenario(&self.scenario)?;
        Ok(())
    }

    fn check(&self) -> Result<(), RuntimeError> {
        if self.horizon.start > self.horizon.end {
            return Err(RuntimeError::Config(format!(
                "horizon start {} is after end {}",
                self.horizon.start, self.horizon.end
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fab_core::MarketSegment;

    #[test]
    fn empty_yaml_uses_defaults() {
        let cfg = SimulatorConfig::from_yaml_str("{}").unwrap();
        assert_eq!(cfg, SimulatorConfig::default());
        assert_eq!(cfg.horizon.years().count(), 51);
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
models:
  revenue:
    path: models/rev.json
  water:
    path: models/water.json
    url: https://example.invalid/water.json
    min_bytes: 2048
scenario:
  market_segment: High-Performance Logic
  wafer_size_mm: 450
  year: 2050
  zld_units: 0
horizon:
  start: 2030
  end: 2040
"#;
        let cfg = SimulatorConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.scenario.market_segment, MarketSegment::HighPerformanceLogic);
        assert_eq!(cfg.scenario.wafer_size_mm, 450);
        assert_eq!(cfg.scenario.reclamation_units, 100.0);
        assert_eq!(cfg.scenario.zld_units, 0.0);
        assert_eq!(cfg.models.revenue.min_bytes, DEFAULT_MIN_ARTIFACT_BYTES);
        assert_eq!(cfg.models.water.min_bytes, 2048);
        assert_eq!(
            cfg.models.water.url.as_deref(),
            Some("https://example.invalid/water.json")
        );
        assert_eq!(cfg.horizon.years(), 2030..=2040);
    }

    #[test]
    fn rejects_inverted_horizon() {
        let err = SimulatorConfig::from_yaml_str("horizon: {start: 2050, end: 2040}").unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let cfg = SimulatorConfig::from_yaml_str("models:\n  water:\n    path: w.json\n").unwrap();
        assert_eq!(cfg.models.water.path, PathBuf::from("w.json"));
        assert_eq!(cfg.models.revenue, ModelsConfig::default().revenue);

        let cfg = SimulatorConfig::from_yaml_str("horizon: {end: 2050}").unwrap();
        assert_eq!(cfg.horizon.years(), FIRST_YEAR..=2050);
    }

    #[test]
    fn validate_reports_scenario_errors() {
        let mut cfg = SimulatorConfig::default();
        cfg.validate().unwrap();
        cfg.scenario.year = 2020;
        assert!(matches!(
            cfg.validate(),
            Err(RuntimeError::Validation(fab_core::ValidationError::YearOutOfRange(2020)))
        ));
    }

    #[test]
    fn rejects_unknown_segment() {
        assert!(SimulatorConfig::from_yaml_str("scenario: {market_segment: Aerospace}").is_err());
    }

    #[test]
    fn resolves_relative_paths() {
        let mut cfg = SimulatorConfig::default();
        cfg.resolve_paths(Path::new("/etc/fabsim"));
        assert_eq!(
            cfg.models.revenue.path,
            PathBuf::from("/etc/fabsim/assets/models/revenue_multiplier.json")
        );
    }
}
