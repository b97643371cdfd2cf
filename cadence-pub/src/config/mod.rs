//! Publisher configuration loading and validation.
//!
//! The expected YAML structure is (every key optional):
//! ```yaml
//! base_interval_ms: 200
//! seed: 42            # reproducible random walks; omit for entropy
//! tick_limit: 400     # stop by itself after N ticks; omit to run forever
//! server:
//!   endpoint: "opc.tcp://0.0.0.0:4840"
//!   name: "Example OPC-UA Server"
//!   namespace_uri: "http://examples.jonboh.github.com"
//!   object: "Sensors"
//! cadences:
//!   - name: Temperature
//!     period_ticks: 1
//!     perturbation_range: [-1.0, 1.0]
//!   - name: Pressure
//!     period_ticks: 10
//!     perturbation_range: [-3.1, 3.1]
//! ```
//!
//! A missing key takes its default.  The defaults reproduce the demo
//! publisher: Temperature every tick, Pressure every 10th, SlowSensor every
//! 40th, with a 200 ms base interval.

use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

// ── Defaults ──────────────────────────────────────────────────────────────────

pub const DEFAULT_BASE_INTERVAL_MS: u64 = 200;

// ── Public data structures ────────────────────────────────────────────────────

/// Identity of the protocol server the publisher feeds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub endpoint: String,
    pub name: String,
    pub namespace_uri: String,
    /// Parent object every data point is created under.
    pub object: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("opc.tcp://0.0.0.0:4840"),
            name: String::from("Example OPC-UA Server"),
            namespace_uri: String::from("http://examples.jonboh.github.com"),
            object: String::from("Sensors"),
        }
    }
}

/// One periodic data point as it appears in the YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CadenceConfig {
    pub name: String,
    /// Number of base ticks between updates.  Must be at least 1.
    pub period_ticks: u64,
    /// `[min, max]` of the uniform step added on every update.
    pub perturbation_range: [f64; 2],
}

impl CadenceConfig {
    pub fn new(name: impl Into<String>, period_ticks: u64, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            period_ticks,
            perturbation_range: [min, max],
        }
    }
}

/// Complete publisher configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublisherConfig {
    pub base_interval_ms: u64,
    /// Ordered: rules fire in this order within a tick.
    pub cadences: Vec<CadenceConfig>,
    pub seed: Option<u64>,
    pub tick_limit: Option<u64>,
    pub server: ServerConfig,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: DEFAULT_BASE_INTERVAL_MS,
            cadences: vec![
                CadenceConfig::new("Temperature", 1, -1.0, 1.0),
                CadenceConfig::new("Pressure", 10, -3.1, 3.1),
                CadenceConfig::new("SlowSensor", 40, -6.3, 6.3),
            ],
            seed: None,
            tick_limit: None,
            server: ServerConfig::default(),
        }
    }
}

impl PublisherConfig {
    /// Parses and validates the YAML file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the YAML is structurally
    /// invalid, or [`validate`](Self::validate) fails.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading publisher configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let config: PublisherConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        info!(
            base_interval_ms = config.base_interval_ms,
            cadences = config.cadences.len(),
            "Loaded publisher configuration"
        );
        for c in &config.cadences {
            debug!(
                "  Cadence: {} | every {} tick(s) | range [{}, {}]",
                c.name, c.period_ticks, c.perturbation_range[0], c.perturbation_range[1],
            );
        }

        Ok(config)
    }

    /// Checks the values serde cannot express.
    ///
    /// Duplicate cadence names are left to the registry, which reports them
    /// as `DuplicateIdentifier` during setup.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.base_interval_ms > 0, "base_interval_ms must be > 0");
        ensure!(!self.cadences.is_empty(), "at least one cadence is required");

        for c in &self.cadences {
            ensure!(!c.name.trim().is_empty(), "cadence name must not be empty");
            ensure!(
                c.period_ticks >= 1,
                "cadence '{}': period_ticks must be >= 1",
                c.name
            );
            let [min, max] = c.perturbation_range;
            ensure!(
                min.is_finite() && max.is_finite(),
                "cadence '{}': perturbation_range must be finite",
                c.name
            );
            ensure!(
                min <= max,
                "cadence '{}': perturbation_range min {} > max {}",
                c.name,
                min,
                max
            );
            ensure!(
                (max - min).is_finite(),
                "cadence '{}': perturbation_range [{}, {}] is wider than an f64 can hold",
                c.name,
                min,
                max
            );
        }
        Ok(())
    }

    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_interval_ms)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn default_config_reproduces_demo_cadences() {
        let cfg = PublisherConfig::default();
        assert_eq!(cfg.base_interval(), Duration::from_millis(200));
        assert_eq!(cfg.cadences.len(), 3);
        assert_eq!(cfg.cadences[0], CadenceConfig::new("Temperature", 1, -1.0, 1.0));
        assert_eq!(cfg.cadences[1], CadenceConfig::new("Pressure", 10, -3.1, 3.1));
        assert_eq!(cfg.cadences[2], CadenceConfig::new("SlowSensor", 40, -6.3, 6.3));
        assert_eq!(cfg.server.endpoint, "opc.tcp://0.0.0.0:4840");
        assert!(cfg.validate().is_ok());
    }

    // ── load_from_file ────────────────────────────────────────────────────────

    #[test]
    fn load_full_yaml() {
        let yaml = r#"
base_interval_ms: 50
seed: 9
tick_limit: 100
server:
  endpoint: "opc.tcp://127.0.0.1:4841"
  object: "Plant"
cadences:
  - name: Flow
    period_ticks: 2
    perturbation_range: [-0.5, 0.5]
  - name: Level
    period_ticks: 5
    perturbation_range: [0, 1]
"#;
        let f = yaml_tempfile(yaml);
        let cfg = PublisherConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.base_interval_ms, 50);
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.tick_limit, Some(100));
        assert_eq!(cfg.server.endpoint, "opc.tcp://127.0.0.1:4841");
        assert_eq!(cfg.server.object, "Plant");
        // unspecified server fields keep their defaults
        assert_eq!(cfg.server.name, "Example OPC-UA Server");

        let names: Vec<_> = cfg.cadences.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Flow", "Level"]);
        assert_eq!(cfg.cadences[1].perturbation_range, [0.0, 1.0]);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/publisher.yaml");
        let cfg = PublisherConfig::load_from_file(&path).unwrap();
        assert_eq!(cfg, PublisherConfig::default());
    }

    #[test]
    fn missing_cadences_key_uses_defaults() {
        let f = yaml_tempfile("base_interval_ms: 100\n");
        let cfg = PublisherConfig::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.base_interval_ms, 100);
        assert_eq!(cfg.cadences, PublisherConfig::default().cadences);
    }

    #[test]
    fn missing_file_returns_error() {
        let result = PublisherConfig::load_from_file(Path::new("/nonexistent/publisher.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(PublisherConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let f = yaml_tempfile("base_interval_msec: 100\n");
        assert!(PublisherConfig::load_from_file(f.path()).is_err());
    }

    // ── validate ──────────────────────────────────────────────────────────────

    #[test]
    fn zero_base_interval_is_rejected() {
        let cfg = PublisherConfig {
            base_interval_ms: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn explicit_empty_cadence_list_is_rejected() {
        let f = yaml_tempfile("cadences: []\n");
        assert!(PublisherConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn zero_period_is_rejected() {
        let cfg = PublisherConfig {
            cadences: vec![CadenceConfig::new("Flow", 0, -1.0, 1.0)],
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Flow"));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let cfg = PublisherConfig {
            cadences: vec![CadenceConfig::new("Flow", 1, 2.0, -2.0)],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_finite_range_is_rejected() {
        let cfg = PublisherConfig {
            cadences: vec![CadenceConfig::new("Flow", 1, f64::NEG_INFINITY, 0.0)],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn overflowing_range_width_is_rejected() {
        let cfg = PublisherConfig {
            cadences: vec![CadenceConfig::new("Wide", 1, -f64::MAX, f64::MAX)],
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Wide"));
    }

    #[test]
    fn duplicate_names_pass_validation() {
        let cfg = PublisherConfig {
            cadences: vec![
                CadenceConfig::new("Flow", 1, 0.0, 0.0),
                CadenceConfig::new("Flow", 2, 0.0, 0.0),
            ],
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }
}
