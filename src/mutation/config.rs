//! Configuration for traversals and the mutation pipeline.

/// Configuration of a single unit traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalConfig {
    /// Maximum nesting depth of nodes (types, methods, statements, expressions)
    /// before the traversal of a unit is aborted (default: unlimited).
    pub max_depth: Option<usize>,

    /// Visit a node reachable through several paths only once per traversal and
    /// reuse its result for later occurrences (default: true).
    pub memoize_shared: bool,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            memoize_shared: true,
        }
    }
}

impl TraversalConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with the given depth limit.
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            ..Self::default()
        }
    }

    /// Creates a configuration that visits every occurrence of a shared node.
    #[must_use]
    pub fn without_memoization() -> Self {
        Self {
            memoize_shared: false,
            ..Self::default()
        }
    }
}

/// Configuration of a [`crate::mutation::MutationPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Process distinct units concurrently (default: true).
    pub parallel: bool,

    /// Stop starting new units once any unit failed, and skip the remaining
    /// mutators of the failing unit (default: false).
    pub stop_on_error: bool,

    /// Configuration of each unit traversal.
    pub traversal: TraversalConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            stop_on_error: false,
            traversal: TraversalConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that processes units one after another.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Creates a configuration that stops at the first failing unit.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            stop_on_error: true,
            ..Self::default()
        }
    }
}
