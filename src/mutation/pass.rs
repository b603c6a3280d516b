//! The mutator trait applied by the pipeline.

use crate::{
    metadata::unit::UnitRc,
    mutation::{
        config::TraversalConfig,
        rewriter::{RewriteContext, Rewriter},
        walker::{rewrite_unit, TraversalOutcome},
    },
};

/// A named, prioritized unit transformation.
///
/// All mutators must be thread-safe (Send + Sync): the pipeline shares one
/// mutator instance across units processed concurrently. Per-unit state lives
/// in the [`Rewriter`] returned by [`UnitMutator::create_rewriter`], which is
/// created fresh for every unit.
///
/// # Ordering
///
/// The pipeline applies mutators in ascending priority order; mutators with
/// equal priority keep the order in which they were added.
pub trait UnitMutator: Send + Sync {
    /// Unique name for logging and diagnostics.
    fn name(&self) -> &'static str;

    /// Position in the pipeline; lower values run first.
    fn priority(&self) -> i32 {
        0
    }

    /// Create the rewriter used for one unit.
    fn create_rewriter(&self) -> Box<dyn Rewriter + '_>;

    /// Apply this mutator to one unit.
    ///
    /// The default walks the unit with a fresh rewriter. Failures are reported to
    /// `ctx.sink` and yield the unchanged unit.
    fn mutate(
        &self,
        unit: &UnitRc,
        ctx: &RewriteContext<'_>,
        config: &TraversalConfig,
    ) -> TraversalOutcome {
        let mut rewriter = self.create_rewriter();
        rewrite_unit(unit, rewriter.as_mut(), ctx, config)
    }

    /// Get a description of what this mutator does.
    fn description(&self) -> &'static str {
        "No description available"
    }
}
