//! Ordered application of mutators to units.
//!
//! A [`MutationPipeline`] holds mutators sorted by priority and applies all of them,
//! in order, to each unit it is given. The output of one mutator is the input of
//! the next. Distinct units are processed concurrently with rayon unless the
//! configuration asks for sequential processing.
//!
//! Cancellation is cooperative: once the shared flag is set, units that have not
//! started yet are skipped. A traversal that already started runs to completion.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use dotmutate::prelude::*;
//!
//! let interner = Arc::new(InternTable::new());
//! let platform = PlatformTypes::new(AssemblyIdentity::new(
//!     "mscorlib",
//!     AssemblyVersion::new(4, 0, 0, 0),
//!     "",
//!     vec![0xb7, 0x7a, 0x5c, 0x56, 0x19, 0x34, 0xe0, 0x89],
//! ));
//! let xunit = AssemblyIdentity::new("xunit.assert", AssemblyVersion::new(2, 4, 2, 0), "", vec![]);
//! let assert_type = TypeReference::new(xunit, "Xunit", "Assert");
//!
//! let mut pipeline = MutationPipeline::new(PipelineConfig::sequential());
//! pipeline.add(Arc::new(AssertMessageMutator::xunit(interner, &assert_type, &platform)));
//!
//! let unit: UnitRc = Arc::new(ModuleBuilder::new("Empty.dll", "/bin/Empty.dll").build().into());
//! let symbols = SymbolStore::new();
//! let diagnostics = Diagnostics::new();
//! let report = pipeline.run_all(&[unit], &RewriteContext::new(&symbols, &diagnostics));
//!
//! // No symbols were registered for the unit, so it was left alone
//! assert_eq!(report.aborted_count(), 1);
//! assert_eq!(report.total_mutations(), 0);
//! ```

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use rayon::prelude::*;

use crate::{
    metadata::unit::UnitRc,
    mutation::{
        config::PipelineConfig, pass::UnitMutator, rewriter::RewriteContext, walker::Mutations,
    },
};

/// How the pipeline finished with a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitStatus {
    /// Every mutator ran to completion.
    Completed,
    /// At least one mutator aborted its traversal of the unit.
    Aborted,
    /// The unit was not processed because of cancellation or an earlier failure.
    Skipped,
}

/// Result of running the pipeline on one unit.
#[derive(Debug, Clone)]
pub struct UnitReport {
    /// The unit after all mutators ran; the input unit if nothing changed.
    pub unit: UnitRc,
    /// Mutations summed over all mutators.
    pub mutations: Mutations,
    /// Mutation count per mutator, in the order the mutators ran.
    pub per_mutator: Vec<(&'static str, usize)>,
    /// How processing ended.
    pub status: UnitStatus,
}

impl UnitReport {
    fn skipped(unit: &UnitRc) -> Self {
        Self {
            unit: Arc::clone(unit),
            mutations: Mutations::new(),
            per_mutator: Vec::new(),
            status: UnitStatus::Skipped,
        }
    }

    /// Returns true if any mutator changed the unit.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.mutations.is_empty()
    }
}

/// Result of running the pipeline on a set of units, in input order.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// One report per input unit.
    pub units: Vec<UnitReport>,
}

impl PipelineReport {
    /// Total mutations over all units.
    #[must_use]
    pub fn total_mutations(&self) -> usize {
        self.units.iter().map(|report| report.mutations.total()).sum()
    }

    /// Number of units every mutator completed on.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.count(UnitStatus::Completed)
    }

    /// Number of units with at least one aborted traversal.
    #[must_use]
    pub fn aborted_count(&self) -> usize {
        self.count(UnitStatus::Aborted)
    }

    /// Number of units that were not processed.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(UnitStatus::Skipped)
    }

    /// Returns true if every unit completed.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.units
            .iter()
            .all(|report| report.status == UnitStatus::Completed)
    }

    /// The output units, in input order.
    pub fn output_units(&self) -> impl Iterator<Item = &UnitRc> {
        self.units.iter().map(|report| &report.unit)
    }

    fn count(&self, status: UnitStatus) -> usize {
        self.units
            .iter()
            .filter(|report| report.status == status)
            .count()
    }
}

/// Applies an ordered set of mutators to units.
pub struct MutationPipeline {
    mutators: Vec<Arc<dyn UnitMutator>>,
    config: PipelineConfig,
    cancelled: Arc<AtomicBool>,
}

impl MutationPipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            mutators: Vec::new(),
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Add a mutator. It runs after every mutator with a lower or equal priority
    /// that was added before it.
    pub fn add(&mut self, mutator: Arc<dyn UnitMutator>) {
        let priority = mutator.priority();
        let position = self
            .mutators
            .partition_point(|existing| existing.priority() <= priority);
        tracing::debug!(
            mutator = mutator.name(),
            priority,
            position,
            "mutator registered"
        );
        self.mutators.insert(position, mutator);
    }

    /// Builder-style [`MutationPipeline::add`].
    #[must_use]
    pub fn with_mutator(mut self, mutator: Arc<dyn UnitMutator>) -> Self {
        self.add(mutator);
        self
    }

    /// Names of the registered mutators, in execution order.
    #[must_use]
    pub fn mutator_names(&self) -> Vec<&'static str> {
        self.mutators.iter().map(|mutator| mutator.name()).collect()
    }

    /// The pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Request cancellation; units not yet started are skipped.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true if cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// A handle to the cancellation flag, for use from other threads.
    #[must_use]
    pub fn cancellation_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Apply every mutator, in order, to one unit.
    pub fn run(&self, unit: &UnitRc, ctx: &RewriteContext<'_>) -> UnitReport {
        if self.is_cancelled() {
            return UnitReport::skipped(unit);
        }

        let mut current = Arc::clone(unit);
        let mut mutations = Mutations::new();
        let mut per_mutator = Vec::with_capacity(self.mutators.len());
        let mut status = UnitStatus::Completed;

        for mutator in &self.mutators {
            let outcome = mutator.mutate(&current, ctx, &self.config.traversal);
            per_mutator.push((mutator.name(), outcome.mutations.total()));
            mutations.merge(&outcome.mutations);
            current = outcome.unit;

            if outcome.aborted {
                status = UnitStatus::Aborted;
                if self.config.stop_on_error {
                    break;
                }
            }
        }

        tracing::debug!(
            unit = %unit.name(),
            mutations = mutations.total(),
            ?status,
            "pipeline finished unit"
        );

        UnitReport {
            unit: current,
            mutations,
            per_mutator,
            status,
        }
    }

    /// Apply the pipeline to each unit. Units are independent and may be processed
    /// concurrently; the report lists them in input order.
    pub fn run_all(&self, units: &[UnitRc], ctx: &RewriteContext<'_>) -> PipelineReport {
        let failed = AtomicBool::new(false);
        let process = |unit: &UnitRc| {
            if self.config.stop_on_error && failed.load(Ordering::Acquire) {
                return UnitReport::skipped(unit);
            }
            let report = self.run(unit, ctx);
            if report.status == UnitStatus::Aborted {
                failed.store(true, Ordering::Release);
            }
            report
        };

        let reports: Vec<UnitReport> = if self.config.parallel {
            units.par_iter().map(process).collect()
        } else {
            units.iter().map(process).collect()
        };

        PipelineReport { units: reports }
    }
}

impl Default for MutationPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl fmt::Debug for MutationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationPipeline")
            .field("mutators", &self.mutator_names())
            .field("config", &self.config)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
