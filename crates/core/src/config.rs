use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScatterError;

/// Width/height correction for the instrument's camera frame. Point x
/// coordinates are divided by this before any shape statistic is computed.
pub const IFCB_ASPECT_RATIO: f64 = 1.36;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Resolve a concurrency degree. 0 = all available cores.
pub fn resolve_jobs(n_jobs: usize) -> usize {
    if n_jobs == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    } else {
        n_jobs
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SCATTER_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SCATTER_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            extraction: ExtractionConfig::from_env_profiled(p),
            training: TrainingConfig::from_env_profiled(p),
            runtime: RuntimeConfig::from_env_profiled(p),
        }
    }

    /// Parse a TOML config. Missing sections and fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ScatterError> {
        let config: Config =
            toml::from_str(s).map_err(|e| ScatterError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScatterError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ScatterError> {
        self.extraction.validate()?;
        self.training.validate()
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  extraction:  aspect_ratio={}, min_points={}, lof_neighbors={}",
            self.extraction.aspect_ratio,
            self.extraction.min_points,
            self.extraction.lof_neighbors
        );
        tracing::info!(
            "  training:    contamination={}, n_estimators={}, max_samples={}, seed={}",
            self.training.contamination,
            self.training.n_estimators,
            self.training.max_samples,
            self.training.seed
        );
        tracing::info!(
            "  runtime:     n_jobs={} (resolved {})",
            self.runtime.n_jobs,
            self.runtime.resolved_jobs()
        );
    }
}

// ── Extraction ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: f64,
    /// Distributions with fewer points are not extracted.
    #[serde(default = "default_min_points")]
    pub min_points: usize,
    #[serde(default = "default_lof_neighbors")]
    pub lof_neighbors: usize,
}

fn default_aspect_ratio() -> f64 { IFCB_ASPECT_RATIO }
fn default_min_points() -> usize { 30 }
fn default_lof_neighbors() -> usize { 20 }

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: default_aspect_ratio(),
            min_points: default_min_points(),
            lof_neighbors: default_lof_neighbors(),
        }
    }
}

impl ExtractionConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            aspect_ratio: profiled_env_parse(p, "ASPECT_RATIO", default_aspect_ratio()),
            min_points: profiled_env_parse(p, "MIN_POINTS", default_min_points()),
            lof_neighbors: profiled_env_parse(p, "LOF_NEIGHBORS", default_lof_neighbors()),
        }
    }

    pub fn with_aspect_ratio(aspect_ratio: f64) -> Self {
        Self {
            aspect_ratio,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ScatterError> {
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(ScatterError::InvalidConfig(format!(
                "aspect_ratio must be a positive number, got {}",
                self.aspect_ratio
            )));
        }
        if self.lof_neighbors == 0 {
            return Err(ScatterError::InvalidConfig(
                "lof_neighbors must be > 0".to_string(),
            ));
        }
        if self.min_points <= self.lof_neighbors {
            return Err(ScatterError::InvalidConfig(format!(
                "min_points ({}) must exceed lof_neighbors ({})",
                self.min_points, self.lof_neighbors
            )));
        }
        Ok(())
    }
}

// ── Training ──────────────────────────────────────────────────

/// Expected share of anomalous distributions in the training population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Contamination {
    /// Fixed threshold offset of -0.5 on the raw score.
    Auto(AutoTag),
    Fraction(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoTag {
    Auto,
}

impl Contamination {
    pub const AUTO: Contamination = Contamination::Auto(AutoTag::Auto);

    pub fn validate(&self) -> Result<(), ScatterError> {
        match *self {
            Contamination::Auto(_) => Ok(()),
            Contamination::Fraction(f) if f > 0.0 && f <= 0.5 => Ok(()),
            Contamination::Fraction(f) => Err(ScatterError::InvalidConfig(format!(
                "contamination must be in (0, 0.5], got {}",
                f
            ))),
        }
    }
}

impl Default for Contamination {
    fn default() -> Self {
        Contamination::Fraction(0.1)
    }
}

impl std::fmt::Display for Contamination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Contamination::Auto(_) => write!(f, "auto"),
            Contamination::Fraction(v) => write!(f, "{}", v),
        }
    }
}

impl std::str::FromStr for Contamination {
    type Err = ScatterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Contamination::AUTO);
        }
        let v: f64 = s
            .trim()
            .parse()
            .map_err(|_| ScatterError::InvalidConfig(format!("bad contamination: {}", s)))?;
        let c = Contamination::Fraction(v);
        c.validate()?;
        Ok(c)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default)]
    pub contamination: Contamination,
    /// Number of isolation trees.
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Subsample size per tree, capped at the number of training rows.
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_n_estimators() -> usize { 100 }
fn default_max_samples() -> usize { 256 }
fn default_seed() -> u64 { 42 }

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            contamination: Contamination::default(),
            n_estimators: default_n_estimators(),
            max_samples: default_max_samples(),
            seed: default_seed(),
        }
    }
}

impl TrainingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            contamination: profiled_env_parse(p, "CONTAMINATION", Contamination::default()),
            n_estimators: profiled_env_parse(p, "N_ESTIMATORS", default_n_estimators()),
            max_samples: profiled_env_parse(p, "MAX_SAMPLES", default_max_samples()),
            seed: profiled_env_parse(p, "RANDOM_SEED", default_seed()),
        }
    }

    pub fn with_contamination(contamination: Contamination) -> Self {
        Self {
            contamination,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ScatterError> {
        self.contamination.validate()?;
        if self.n_estimators == 0 {
            return Err(ScatterError::InvalidConfig(
                "n_estimators must be > 0".to_string(),
            ));
        }
        if self.max_samples < 2 {
            return Err(ScatterError::InvalidConfig(
                "max_samples must be >= 2".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Runtime ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Worker threads for extraction and forest fitting. 0 = num_cpus.
    #[serde(default)]
    pub n_jobs: usize,
}

impl RuntimeConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            n_jobs: profiled_env_parse(p, "N_JOBS", 0),
        }
    }

    pub fn resolved_jobs(&self) -> usize {
        resolve_jobs(self.n_jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extraction.aspect_ratio, IFCB_ASPECT_RATIO);
        assert_eq!(config.extraction.min_points, 30);
        assert_eq!(config.extraction.lof_neighbors, 20);
        assert_eq!(config.training.contamination, Contamination::Fraction(0.1));
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.profile_label(), "default");
    }

    #[test]
    fn resolved_jobs() {
        // 0 means auto-detect
        assert!(resolve_jobs(0) > 0);
        assert_eq!(resolve_jobs(8), 8);
    }

    #[test]
    fn contamination_parsing() {
        assert_eq!("auto".parse::<Contamination>().unwrap(), Contamination::AUTO);
        assert_eq!(
            "0.05".parse::<Contamination>().unwrap(),
            Contamination::Fraction(0.05)
        );
        assert!("0.7".parse::<Contamination>().is_err());
        assert!("0".parse::<Contamination>().is_err());
        assert!("lots".parse::<Contamination>().is_err());
    }

    #[test]
    fn min_points_must_exceed_neighbors() {
        let cfg = ExtractionConfig {
            min_points: 20,
            ..ExtractionConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ScatterError::InvalidConfig(_))));
    }

    #[test]
    fn non_positive_aspect_ratio_rejected() {
        assert!(ExtractionConfig::with_aspect_ratio(0.0).validate().is_err());
        assert!(ExtractionConfig::with_aspect_ratio(f64::NAN).validate().is_err());
        assert!(ExtractionConfig::with_aspect_ratio(1.0).validate().is_ok());
    }
}
