//! Engine configuration types
//!
//! Each concern (learning, local search, index, belief propagation) has its
//! own section with range validation. Sections are grouped under
//! [`InferenceConfig`], which can be built from a [`Preset`], adjusted with
//! closures, or loaded from YAML.

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use serde::{Deserialize, Serialize};

/// Supported YAML schema versions
const SUPPORTED_VERSIONS: [u32; 1] = [1];

// ============================================================================
// Learning
// ============================================================================

/// Learning hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Regularization strength (> 0). Known features are seeded with
    /// `1 / regularization`.
    pub regularization: f64,

    /// Structured-SVM margin applied to gold labels (>= 0)
    pub svm_margin: f64,

    /// Pseudo-likelihood beam width (1..=1024)
    pub beam_size: usize,

    /// Hogwild worker threads for batch training (0 = one per core)
    pub num_workers: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            regularization: 2.0,
            svm_margin: 0.1,
            beam_size: 8,
            num_workers: 0,
        }
    }
}

impl LearningConfig {
    pub fn regularization(mut self, value: f64) -> Self {
        self.regularization = value;
        self
    }

    pub fn svm_margin(mut self, value: f64) -> Self {
        self.svm_margin = value;
        self
    }

    pub fn beam_size(mut self, value: usize) -> Self {
        self.beam_size = value;
        self
    }

    pub fn num_workers(mut self, value: usize) -> Self {
        self.num_workers = value;
        self
    }

    /// Resolved worker count (0 maps to the number of cores)
    pub fn effective_workers(&self) -> usize {
        if self.num_workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.num_workers
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        validate_regularization(self.regularization)?;
        validate_margin(self.svm_margin)?;
        validate_beam_size(self.beam_size)?;

        if self.num_workers > 1024 {
            return Err(ConfigError::range_with_hint(
                "num_workers",
                self.num_workers,
                0,
                1024,
                "Use 0 to size the pool from the number of cores",
            ));
        }

        Ok(())
    }
}

pub(crate) fn validate_regularization(value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "regularization must be a finite value > 0, got {}",
            value
        )));
    }
    Ok(())
}

pub(crate) fn validate_margin(value: f64) -> ConfigResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "svm_margin must be a finite value >= 0, got {}",
            value
        )));
    }
    Ok(())
}

pub(crate) fn validate_beam_size(value: usize) -> ConfigResult<()> {
    if value == 0 || value > 1024 {
        return Err(ConfigError::range_with_hint(
            "beam_size",
            value,
            1,
            1024,
            "The beam must hold at least the gold label",
        ));
    }
    Ok(())
}

// ============================================================================
// Solvers
// ============================================================================

/// Which MAP inference algorithm the orchestrator dispatches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Index-guided hill climbing
    #[default]
    LocalSearch,
    /// Max-product loopy belief propagation
    LoopyBp,
}

/// Local search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSearchConfig {
    /// Maximum optimization passes over all nodes (1..=10000)
    pub max_passes: usize,

    /// Entries taken from each ranked index list per lookup (1..=4096)
    pub candidate_limit: usize,

    /// Try joint two-node moves along arcs
    pub arc_pass: bool,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            max_passes: 16,
            candidate_limit: 32,
            arc_pass: true,
        }
    }
}

impl LocalSearchConfig {
    pub fn max_passes(mut self, value: usize) -> Self {
        self.max_passes = value;
        self
    }

    pub fn candidate_limit(mut self, value: usize) -> Self {
        self.candidate_limit = value;
        self
    }

    pub fn arc_pass(mut self, value: bool) -> Self {
        self.arc_pass = value;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_passes == 0 || self.max_passes > 10000 {
            return Err(ConfigError::range_with_hint(
                "max_passes",
                self.max_passes,
                1,
                10000,
                "Local search needs a finite pass budget",
            ));
        }

        if self.candidate_limit == 0 || self.candidate_limit > 4096 {
            return Err(ConfigError::range_with_hint(
                "candidate_limit",
                self.candidate_limit,
                1,
                4096,
                "Each index lookup must yield at least one candidate",
            ));
        }

        Ok(())
    }
}

/// Feature index settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Entries kept per pairwise ranking (1..=65536)
    pub pairwise_top_k: usize,

    /// Entries kept per factor ranking (1..=65536)
    pub factor_top_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            pairwise_top_k: 64,
            factor_top_k: 32,
        }
    }
}

impl IndexConfig {
    pub fn pairwise_top_k(mut self, value: usize) -> Self {
        self.pairwise_top_k = value;
        self
    }

    pub fn factor_top_k(mut self, value: usize) -> Self {
        self.factor_top_k = value;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("pairwise_top_k", self.pairwise_top_k),
            ("factor_top_k", self.factor_top_k),
        ] {
            if value == 0 || value > 65536 {
                return Err(ConfigError::range_with_hint(
                    field,
                    value,
                    1,
                    65536,
                    "Ranked lists must keep at least one entry",
                ));
            }
        }
        Ok(())
    }
}

/// Loopy belief propagation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeliefPropagationConfig {
    /// Round cap (1..=10000)
    pub max_rounds: usize,

    /// Stop once the largest message change falls below this (>= 0)
    pub tolerance: f64,

    /// Fraction of the previous message kept on update (0.0..1.0)
    pub damping: f64,

    /// Labels kept per variable, most frequent first (1..=65536)
    pub max_domain_size: usize,

    /// Joint configurations enumerated per factor message before falling
    /// back to conditioning on belief argmaxes (1..=10_000_000)
    pub max_factor_configurations: usize,
}

impl Default for BeliefPropagationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 30,
            tolerance: 1e-6,
            damping: 0.5,
            max_domain_size: 64,
            max_factor_configurations: 4096,
        }
    }
}

impl BeliefPropagationConfig {
    pub fn max_rounds(mut self, value: usize) -> Self {
        self.max_rounds = value;
        self
    }

    pub fn tolerance(mut self, value: f64) -> Self {
        self.tolerance = value;
        self
    }

    pub fn damping(mut self, value: f64) -> Self {
        self.damping = value;
        self
    }

    pub fn max_domain_size(mut self, value: usize) -> Self {
        self.max_domain_size = value;
        self
    }

    pub fn max_factor_configurations(mut self, value: usize) -> Self {
        self.max_factor_configurations = value;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_rounds == 0 || self.max_rounds > 10000 {
            return Err(ConfigError::range_with_hint(
                "max_rounds",
                self.max_rounds,
                1,
                10000,
                "Message passing always stops at the round cap",
            ));
        }

        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ConfigError::Validation(format!(
                "tolerance must be a finite value >= 0, got {}",
                self.tolerance
            )));
        }

        if !(0.0..1.0).contains(&self.damping) {
            return Err(ConfigError::Validation(format!(
                "damping must be in [0.0, 1.0), got {}",
                self.damping
            )));
        }

        if self.max_domain_size == 0 || self.max_domain_size > 65536 {
            return Err(ConfigError::range_with_hint(
                "max_domain_size",
                self.max_domain_size,
                1,
                65536,
                "Each variable needs at least one label",
            ));
        }

        if self.max_factor_configurations == 0 || self.max_factor_configurations > 10_000_000 {
            return Err(ConfigError::range_with_hint(
                "max_factor_configurations",
                self.max_factor_configurations,
                1,
                10_000_000,
                "Exhaustive factor messages must stay bounded",
            ));
        }

        Ok(())
    }
}

// ============================================================================
// InferenceConfig
// ============================================================================

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub solver: SolverKind,
    pub learning: LearningConfig,
    pub local_search: LocalSearchConfig,
    pub index: IndexConfig,
    pub belief_propagation: BeliefPropagationConfig,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}

/// YAML envelope (schema v1)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigExportV1 {
    version: Option<u32>,
    preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    solver: Option<SolverKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    learning: Option<LearningConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    local_search: Option<LocalSearchConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<IndexConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    belief_propagation: Option<BeliefPropagationConfig>,
}

impl InferenceConfig {
    /// Complete configuration for a preset
    pub fn preset(preset: Preset) -> Self {
        let (local_search, index, bp_rounds) = match preset {
            Preset::Fast => (
                LocalSearchConfig {
                    max_passes: 4,
                    candidate_limit: 8,
                    arc_pass: false,
                },
                IndexConfig {
                    pairwise_top_k: 16,
                    factor_top_k: 16,
                },
                10,
            ),
            Preset::Balanced => (LocalSearchConfig::default(), IndexConfig::default(), 30),
            Preset::Thorough => (
                LocalSearchConfig {
                    max_passes: 64,
                    candidate_limit: 128,
                    arc_pass: true,
                },
                IndexConfig {
                    pairwise_top_k: 256,
                    factor_top_k: 128,
                },
                100,
            ),
        };

        Self {
            solver: SolverKind::LocalSearch,
            learning: LearningConfig::default(),
            local_search,
            index,
            belief_propagation: BeliefPropagationConfig::default().max_rounds(bp_rounds),
        }
    }

    pub fn solver(mut self, kind: SolverKind) -> Self {
        self.solver = kind;
        self
    }

    pub fn learning(mut self, f: impl FnOnce(LearningConfig) -> LearningConfig) -> Self {
        self.learning = f(self.learning);
        self
    }

    pub fn local_search(mut self, f: impl FnOnce(LocalSearchConfig) -> LocalSearchConfig) -> Self {
        self.local_search = f(self.local_search);
        self
    }

    pub fn index(mut self, f: impl FnOnce(IndexConfig) -> IndexConfig) -> Self {
        self.index = f(self.index);
        self
    }

    pub fn belief_propagation(
        mut self,
        f: impl FnOnce(BeliefPropagationConfig) -> BeliefPropagationConfig,
    ) -> Self {
        self.belief_propagation = f(self.belief_propagation);
        self
    }

    /// Validate every section
    pub fn validate(&self) -> ConfigResult<()> {
        self.learning.validate()?;
        self.local_search.validate()?;
        self.index.validate()?;
        self.belief_propagation.validate()?;

        if self.local_search.candidate_limit > self.index.pairwise_top_k.max(self.index.factor_top_k)
        {
            tracing::warn!(
                "candidate_limit {} exceeds every index top-k; lookups are truncated by the index",
                self.local_search.candidate_limit
            );
        }

        Ok(())
    }

    /// Load from a YAML file
    pub fn from_yaml(path: &str) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load from YAML text.
    ///
    /// The preset supplies defaults; every section present in the document
    /// replaces the preset's section.
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        let version = export.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset = match export.preset {
            Some(name) => Preset::from_str(&name).map_err(|_| ConfigError::UnknownPreset(name))?,
            None => Preset::default(),
        };

        let mut config = Self::preset(preset);
        if let Some(solver) = export.solver {
            config.solver = solver;
        }
        if let Some(learning) = export.learning {
            config.learning = learning;
        }
        if let Some(local_search) = export.local_search {
            config.local_search = local_search;
        }
        if let Some(index) = export.index {
            config.index = index;
        }
        if let Some(bp) = export.belief_propagation {
            config.belief_propagation = bp;
        }

        config.validate()?;
        Ok(config)
    }

    /// Serialize as a complete YAML v1 document
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: Some(1),
            preset: Some(Preset::default().to_string()),
            solver: Some(self.solver),
            learning: Some(self.learning.clone()),
            local_search: Some(self.local_search.clone()),
            index: Some(self.index.clone()),
            belief_propagation: Some(self.belief_propagation.clone()),
        };

        serde_yaml::to_string(&export).map_err(ConfigError::Yaml)
    }
}
