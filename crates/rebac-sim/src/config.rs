//! Configuration for experiment runs.
//!
//! Experiment settings are loaded from a TOML file. Every section falls back
//! to its defaults, so an empty file is a valid configuration. The per-call
//! learning switches live in [`RunMode`].

use rebac_types::{AgentId, RelationSchema, RelationType};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::environment::Pipeline;
use crate::setup::distribution::DEFAULT_FORBIDDEN_TAGS;

/// Learning and estimation switches for one phase of a run.
///
/// A value is never changed in place; switching phases produces a new one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunMode {
    prediction_active: bool,
    learning_during_prediction: bool,
    trust_based_learning: bool,
    undecidable_threshold: f64,
}

impl RunMode {
    /// Training mode with the given undecidable band half-width.
    pub fn new(undecidable_threshold: f64) -> Self {
        Self {
            undecidable_threshold,
            ..Self::default()
        }
    }

    pub fn with_trust_based_learning(self, enabled: bool) -> Self {
        Self {
            trust_based_learning: enabled,
            ..self
        }
    }

    pub fn with_learning_during_prediction(self, enabled: bool) -> Self {
        Self {
            learning_during_prediction: enabled,
            ..self
        }
    }

    /// The same switches with prediction turned on.
    pub fn predicting(self) -> Self {
        Self {
            prediction_active: true,
            ..self
        }
    }

    pub fn prediction_active(&self) -> bool {
        self.prediction_active
    }

    pub fn learning_during_prediction(&self) -> bool {
        self.learning_during_prediction
    }

    pub fn trust_based_learning(&self) -> bool {
        self.trust_based_learning
    }

    pub fn undecidable_threshold(&self) -> f64 {
        self.undecidable_threshold
    }

    /// Models learn while training, and while predicting only when re-enabled.
    pub fn learning_enabled(&self) -> bool {
        !self.prediction_active || self.learning_during_prediction
    }
}

/// Complete experiment configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Experiment kind, repetitions and parameter grid
    #[serde(default)]
    pub experiment: ExperimentSection,
    /// Learning switches
    #[serde(default)]
    pub learning: LearningConfig,
    /// Relation types and edge mirroring
    #[serde(default)]
    pub network: NetworkConfig,
    /// Content preparation
    #[serde(default)]
    pub content: ContentConfig,
    /// Untrusted agent counts for trust experiments
    #[serde(default)]
    pub trust: TrustConfig,
    /// Held-out agent for single-agent experiments
    #[serde(default)]
    pub newcomer: NewcomerConfig,
}

impl ExperimentConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks the settings the selected experiment kind depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let experiment = &self.experiment;
        if experiment.trials == 0 {
            return Err(ConfigError::Invalid("trials must be at least 1".into()));
        }
        if experiment.training_sizes.is_empty() || experiment.test_sizes.is_empty() {
            return Err(ConfigError::Invalid(
                "training_sizes and test_sizes must not be empty".into(),
            ));
        }
        if self.network.relation_types.is_empty() {
            return Err(ConfigError::Invalid("at least one relation type is required".into()));
        }
        if let Some(bad) = experiment
            .thresholds
            .iter()
            .find(|t| !t.is_finite() || **t < 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "threshold {} must be a non-negative number",
                bad
            )));
        }

        match experiment.kind {
            ExperimentKind::Internal => {}
            ExperimentKind::External if experiment.thresholds.is_empty() => {
                return Err(ConfigError::Invalid(
                    "external experiments need at least one threshold".into(),
                ));
            }
            ExperimentKind::External => {}
            ExperimentKind::Tag if experiment.tag_numbers.is_empty() => {
                return Err(ConfigError::Invalid(
                    "tag experiments need at least one tag number".into(),
                ));
            }
            ExperimentKind::Tag => {}
            ExperimentKind::Trust if self.trust.untrusted_counts.is_empty() => {
                return Err(ConfigError::Invalid(
                    "trust experiments need untrusted_counts".into(),
                ));
            }
            ExperimentKind::Trust => {}
            ExperimentKind::SingleAgent => {
                if self.newcomer.agent.is_none() {
                    return Err(ConfigError::Invalid(
                        "single-agent experiments need a newcomer agent".into(),
                    ));
                }
                if self.newcomer.turn == 0 {
                    return Err(ConfigError::Invalid(
                        "single-agent experiments need a newcomer turn".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn schema(&self) -> RelationSchema {
        RelationSchema::new(self.network.relation_types.iter().copied())
    }

    /// Training-phase run mode for one threshold.
    pub fn run_mode(&self, threshold: f64) -> RunMode {
        RunMode::new(threshold)
            .with_trust_based_learning(self.learning.trust_based)
            .with_learning_during_prediction(self.learning.learning_during_prediction)
    }
}

/// The five experiment families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentKind {
    /// Owners predict from their own history only
    Internal,
    /// Hybrid internal/external estimation across thresholds
    #[default]
    External,
    /// External pipeline with deliberately untrustworthy agents
    Trust,
    /// External pipeline across tag limits
    Tag,
    /// Cold-start quality of one newcomer agent
    SingleAgent,
}

impl ExperimentKind {
    pub fn pipeline(self) -> Pipeline {
        match self {
            ExperimentKind::Internal => Pipeline::internal_only(),
            _ => Pipeline::external(),
        }
    }
}

impl std::fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExperimentKind::Internal => write!(f, "internal"),
            ExperimentKind::External => write!(f, "external"),
            ExperimentKind::Trust => write!(f, "trust"),
            ExperimentKind::Tag => write!(f, "tag"),
            ExperimentKind::SingleAgent => write!(f, "single_agent"),
        }
    }
}

/// Experiment kind, repetitions and parameter grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentSection {
    pub kind: ExperimentKind,
    /// Repeated trials per grid point
    pub trials: usize,
    /// Base seed; each trial derives its own generator from it
    pub seed: u64,
    pub training_sizes: Vec<usize>,
    pub test_sizes: Vec<usize>,
    /// Undecidable band half-widths. Zero disables the band
    pub thresholds: Vec<f64>,
    /// Maximum tags kept per content. Zero keeps all
    pub tag_numbers: Vec<usize>,
}

impl Default for ExperimentSection {
    fn default() -> Self {
        Self {
            kind: ExperimentKind::External,
            trials: 10,
            seed: 42,
            training_sizes: vec![500],
            test_sizes: vec![200],
            thresholds: vec![0.0, 0.05, 0.1],
            tag_numbers: vec![0],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Weight external observations by trust in the owner
    pub trust_based: bool,
    /// Keep learning while predicting
    pub learning_during_prediction: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub relation_types: Vec<RelationType>,
    /// Mirror every relation when building the network
    pub bidirectional: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            relation_types: vec![RelationType::Friend],
            bidirectional: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Tags removed from every content before distribution
    pub forbidden_tags: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            forbidden_tags: DEFAULT_FORBIDDEN_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Numbers of agents turned opposite, one grid axis each
    pub untrusted_counts: Vec<usize>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            untrusted_counts: vec![1, 2, 3, 4, 5, 7, 10, 15, 20, 25, 30],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewcomerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentId>,
    /// Test contents distributed before the newcomer joins
    pub turn: usize,
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_run_mode_phases() {
        let training = RunMode::new(0.1).with_trust_based_learning(true);
        assert!(!training.prediction_active());
        assert!(training.learning_enabled());

        let testing = training.predicting();
        assert!(testing.prediction_active());
        assert!(!testing.learning_enabled());
        assert!(testing.trust_based_learning());
        // the training value is untouched
        assert!(!training.prediction_active());

        let relearning = testing.with_learning_during_prediction(true);
        assert!(relearning.learning_enabled());
        assert_eq!(relearning.undecidable_threshold(), 0.1);
    }

    #[test]
    fn test_default_config_roundtrip() {
        let config = ExperimentConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExperimentConfig::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ExperimentConfig::from_str(
            r#"
            [experiment]
            kind = "internal"
            trials = 3

            [network]
            relation_types = ["friend", "family"]
            "#,
        )
        .unwrap();
        assert_eq!(config.experiment.kind, ExperimentKind::Internal);
        assert_eq!(config.experiment.trials, 3);
        assert_eq!(config.experiment.seed, 42);
        assert!(config.network.bidirectional);
        assert_eq!(config.schema().len(), 2);
        assert_eq!(config.content.forbidden_tags.len(), 6);
    }

    #[test]
    fn test_validation_rejects_kind_specific_omissions() {
        let mut config = ExperimentConfig::default();
        config.experiment.kind = ExperimentKind::SingleAgent;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.newcomer.agent = Some(AgentId(3));
        config.newcomer.turn = 10;
        assert!(config.validate().is_ok());

        let mut config = ExperimentConfig::default();
        config.experiment.kind = ExperimentKind::Trust;
        config.trust.untrusted_counts.clear();
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.experiment.thresholds.clear();
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.experiment.kind = ExperimentKind::Tag;
        config.experiment.tag_numbers.clear();
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.experiment.trials = 0;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.experiment.thresholds = vec![-0.1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[learning]\ntrust_based = true").unwrap();
        let config = ExperimentConfig::from_file(file.path()).unwrap();
        assert!(config.learning.trust_based);
        assert!(config.run_mode(0.05).trust_based_learning());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExperimentConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
