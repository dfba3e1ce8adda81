//! GraphInference - engine facade
//!
//! Owns the weight store, the feature index, the label frequency table and
//! the configuration, and routes every public operation to its slice.
//!
//! # Concurrency contract
//!
//! | Operation | Receiver | May overlap with |
//! |-----------|----------|------------------|
//! | `ssvm_learn` / `ssvm_learn_batch` | `&self` | itself (Hogwild) |
//! | `map_inference`, scoring, reporting | `&self` | itself, across queries |
//! | `pl_learn`, `prepare_for_inference`, `load_model`, `add_query_to_model`, init | `&mut self` | nothing |
//!
//! The receivers make the borrow checker enforce the table: no exclusive
//! operation can run while a shared one holds the engine.

use crate::config::inference_config::{validate_beam_size, validate_margin, validate_regularization};
use crate::config::{InferenceConfig, SolverKind};
use crate::errors::Result;
use crate::features::diagnostics::{self, ConfusionStats, GraphView};
use crate::features::feature_index::FeatureIndex;
use crate::features::learning::{
    PlOutcome, PrecisionSnapshot, PrecisionStats, PseudoLikelihoodLearner, SsvmLearner, SsvmOutcome,
};
use crate::features::loopy_bp::{BpStats, LoopyBpSolver};
use crate::features::map_solver::{LocalSearchSolver, SearchStats};
use crate::features::persistence::ModelSnapshot;
use crate::features::query::{Assignment, Query, QueryBuilder};
use crate::features::weights::WeightStore;
use crate::shared::models::{Label, LabelFrequencies};
use crate::shared::ports::StringTable;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Which solver ran, with its statistics
#[derive(Debug, Clone, PartialEq)]
pub enum SolverStats {
    LocalSearch(SearchStats),
    LoopyBp(BpStats),
}

/// Aggregate of one parallel SSVM batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub examples: usize,
    pub separated: usize,
    pub mislabeled_nodes: usize,
    pub updated_features: usize,
}

pub struct GraphInference {
    config: InferenceConfig,
    weights: WeightStore,
    index: FeatureIndex,
    label_frequency: LabelFrequencies,
    unknown_label: Label,
    registered_examples: u64,
    ssvm_steps: AtomicU64,
    precision: PrecisionStats,
}

impl GraphInference {
    /// Empty model; rejects an invalid configuration
    pub fn new(config: InferenceConfig) -> Result<Self> {
        config.validate()?;
        let index = FeatureIndex::new(config.index.clone());
        Ok(Self {
            config,
            weights: WeightStore::new(),
            index,
            label_frequency: LabelFrequencies::new(),
            unknown_label: 0,
            registered_examples: 0,
            ssvm_steps: AtomicU64::new(0),
            precision: PrecisionStats::new(),
        })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    pub fn weights(&self) -> &WeightStore {
        &self.weights
    }

    pub fn index(&self) -> &FeatureIndex {
        &self.index
    }

    pub fn label_frequency(&self) -> &LabelFrequencies {
        &self.label_frequency
    }

    /// Label used for unset and out-of-vocabulary nodes
    pub fn unknown_label(&self) -> Label {
        self.unknown_label
    }

    pub fn set_unknown_label(&mut self, label: Label) {
        self.unknown_label = label;
    }

    /// Intern `name` and use it as the unknown label
    pub fn intern_unknown(&mut self, strings: &mut dyn StringTable, name: &str) -> Label {
        self.unknown_label = strings.intern(name);
        self.unknown_label
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Model I/O
    // ═══════════════════════════════════════════════════════════════════════

    pub fn save_model(&self) -> ModelSnapshot {
        ModelSnapshot::capture(&self.weights, &self.label_frequency, self.unknown_label)
    }

    /// Replace all model state and rebuild the index
    pub fn load_model(&mut self, snapshot: &ModelSnapshot) {
        self.weights = snapshot.weights();
        self.label_frequency = snapshot.frequencies();
        self.unknown_label = snapshot.unknown_label;
        self.index.rebuild(&self.weights);
        info!(
            "Model loaded: {} features, {} labels, unknown label {}",
            self.weights.len(),
            self.label_frequency.len(),
            self.unknown_label
        );
    }

    pub fn save_model_to(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_model().write_to(path)
    }

    pub fn load_model_from(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = ModelSnapshot::read_from(path)?;
        self.load_model(&snapshot);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries and inference
    // ═══════════════════════════════════════════════════════════════════════

    /// Builder for a query using this model's unknown label
    pub fn create_query(&self) -> QueryBuilder {
        QueryBuilder::new(self.unknown_label)
    }

    /// All-unknown assignment over `query`
    pub fn create_assignment<'q>(&self, query: &'q Query) -> Assignment<'q> {
        Assignment::new(query, &self.weights)
    }

    /// Rebuild the feature index from the current weights
    pub fn prepare_for_inference(&mut self) {
        self.index.rebuild(&self.weights);
    }

    /// Fill every must-infer node of `assignment` with the configured solver
    pub fn map_inference(&self, assignment: &mut Assignment<'_>) -> SolverStats {
        match self.config.solver {
            SolverKind::LocalSearch => SolverStats::LocalSearch(
                LocalSearchSolver::new(
                    &self.weights,
                    &self.index,
                    &self.label_frequency,
                    &self.config.local_search,
                )
                .solve(assignment),
            ),
            SolverKind::LoopyBp => SolverStats::LoopyBp(
                LoopyBpSolver::new(
                    &self.weights,
                    &self.label_frequency,
                    &self.config.belief_propagation,
                )
                .solve(assignment),
            ),
        }
    }

    /// Score of `assignment` under the current weights
    pub fn get_assignment_score(&self, assignment: &Assignment<'_>) -> f64 {
        assignment.recompute_score(&self.weights)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Training
    // ═══════════════════════════════════════════════════════════════════════

    /// Register a training example: count its labels and create (zero)
    /// weights for every feature it activates.
    pub fn add_query_to_model(&mut self, gold: &Assignment<'_>) {
        for &label in gold.labels() {
            if label != self.unknown_label {
                self.label_frequency.record(label);
            }
        }
        for key in gold.active_features() {
            self.weights.ensure(&key);
        }
        self.registered_examples += 1;
    }

    /// Seed every known feature with `1 / regularization`
    pub fn initialize_feature_weights(&mut self, regularization: f64) -> Result<()> {
        validate_regularization(regularization)?;
        self.config.learning.regularization = regularization;
        self.weights.fill(1.0 / regularization);
        info!(
            "Initialized {} feature weights to {} ({} registered examples)",
            self.weights.len(),
            1.0 / regularization,
            self.registered_examples
        );
        Ok(())
    }

    pub fn ssvm_init(&mut self, margin: f64) -> Result<()> {
        validate_margin(margin)?;
        self.config.learning.svm_margin = margin;
        Ok(())
    }

    pub fn pl_init(&mut self, beam_size: usize) -> Result<()> {
        validate_beam_size(beam_size)?;
        self.config.learning.beam_size = beam_size;
        Ok(())
    }

    /// One SSVM step. Safe to call from many threads at once.
    pub fn ssvm_learn(&self, gold: &Assignment<'_>, learning_rate: f64) -> SsvmOutcome {
        let outcome = SsvmLearner::new(
            &self.weights,
            &self.index,
            &self.label_frequency,
            &self.config.local_search,
            self.config.learning.svm_margin,
        )
        .learn(gold, learning_rate, Some(&self.precision));
        self.ssvm_steps.fetch_add(1, Ordering::Relaxed);
        outcome
    }

    /// SSVM over disjoint examples on a worker pool (Hogwild)
    pub fn ssvm_learn_batch(&self, examples: &[Assignment<'_>], learning_rate: f64) -> BatchOutcome {
        let workers = self.config.learning.effective_workers();
        let run = || {
            examples
                .par_iter()
                .map(|gold| self.ssvm_learn(gold, learning_rate))
                .fold(BatchOutcome::default, |mut acc, outcome| {
                    acc.examples += 1;
                    acc.separated += usize::from(outcome.is_separated());
                    acc.mislabeled_nodes += outcome.mislabeled_nodes;
                    acc.updated_features += outcome.updated_features;
                    acc
                })
                .reduce(BatchOutcome::default, |mut a, b| {
                    a.examples += b.examples;
                    a.separated += b.separated;
                    a.mislabeled_nodes += b.mislabeled_nodes;
                    a.updated_features += b.updated_features;
                    a
                })
        };

        let outcome = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!("Falling back to the global rayon pool: {}", e);
                run()
            }
        };
        debug!(
            "SSVM batch: {} examples on {} workers, {} separated, {} nodes mislabeled",
            outcome.examples, workers, outcome.separated, outcome.mislabeled_nodes
        );
        outcome
    }

    /// One pseudo-likelihood step (exclusive access)
    pub fn pl_learn(&mut self, gold: &Assignment<'_>, learning_rate: f64) -> PlOutcome {
        PseudoLikelihoodLearner::new(
            &mut self.weights,
            &self.index,
            &self.label_frequency,
            &self.config.local_search,
            self.config.learning.beam_size,
        )
        .learn(gold, learning_rate)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reporting
    // ═══════════════════════════════════════════════════════════════════════

    /// Precision of the loss-augmented predictions seen by SSVM so far
    pub fn precision(&self) -> PrecisionSnapshot {
        self.precision.snapshot()
    }

    pub fn reset_stats(&self) {
        self.precision.reset();
    }

    pub fn ssvm_steps(&self) -> u64 {
        self.ssvm_steps.load(Ordering::Relaxed)
    }

    pub fn registered_examples(&self) -> u64 {
        self.registered_examples
    }

    pub fn confusion_statistics(&self, assignment: &Assignment<'_>) -> ConfusionStats {
        diagnostics::confusion_statistics(assignment, &self.weights)
    }

    pub fn display_graph(&self, assignment: &Assignment<'_>, strings: &dyn StringTable) -> GraphView {
        GraphView::build(assignment, &self.weights, strings)
    }

    /// Log every learned weight, highest first
    pub fn print_debug_info(&self) {
        let precision = self.precision();
        info!(
            "Precision {:.4} over {} predictions ({} unknown)",
            precision.precision(),
            precision.total(),
            precision.unknown
        );
        diagnostics::log_weights(&self.weights);
    }
}
