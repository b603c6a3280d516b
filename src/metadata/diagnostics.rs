//! Diagnostics collection for unit loading, traversal and rewriting.
//!
//! This module provides the types used to collect and report diagnostic messages
//! while units are processed. Failures in this crate are scoped to one unit: a
//! unit whose traversal cannot run (for example because no debug symbols are
//! available) is skipped, and the reason is recorded here instead of being
//! propagated as a hard error to the caller.
//!
//! # Architecture
//!
//! The [`Diagnostics`] container uses `boxcar::Vec` for thread-safe, lock-free
//! append operations, allowing diagnostics to be collected from units that are
//! processed in parallel without synchronization overhead. It implements
//! [`DiagnosticSink`], the collaborator interface consumed by the traversal
//! framework. Every pushed entry is also forwarded to `tracing` at the matching
//! level.
//!
//! # Key Components
//!
//! - [`Diagnostics`] - Thread-safe container for diagnostic entries
//! - [`Diagnostic`] - Individual diagnostic entry with severity and context
//! - [`DiagnosticSeverity`] - Severity level (Info, Warning, Error)
//! - [`DiagnosticCategory`] - Category of the diagnostic source
//! - [`DiagnosticSink`] - Anything that accepts diagnostics
//!
//! # Usage Examples
//!
//! ```rust
//! use dotmutate::metadata::diagnostics::{DiagnosticCategory, Diagnostics};
//!
//! let diagnostics = Diagnostics::new();
//! diagnostics.error(DiagnosticCategory::Symbols, "missing symbols for Tests.dll");
//!
//! assert!(diagnostics.has_errors());
//! assert_eq!(diagnostics.by_category(DiagnosticCategory::Symbols).len(), 1);
//! ```
//!
//! # Thread Safety
//!
//! All types in this module are [`Send`] and [`Sync`].

use std::fmt::{self, Write};

/// Severity level of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational message, no action needed.
    Info,
    /// Something unexpected that did not stop processing.
    Warning,
    /// Processing of a unit was aborted.
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category indicating which part of the pipeline produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Identity parsing and marker-assembly resolution
    Identity,
    /// Unit references that could not be resolved
    Reference,
    /// Debug-symbol availability and source text recovery
    Symbols,
    /// Traversal driver failures (recursion limit, aborted walks)
    Traversal,
    /// Node rewrites performed by a mutator
    Rewrite,
    /// Anything else
    General,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Identity => write!(f, "Identity"),
            DiagnosticCategory::Reference => write!(f, "Reference"),
            DiagnosticCategory::Symbols => write!(f, "Symbols"),
            DiagnosticCategory::Traversal => write!(f, "Traversal"),
            DiagnosticCategory::Rewrite => write!(f, "Rewrite"),
            DiagnosticCategory::General => write!(f, "General"),
        }
    }
}

/// A single diagnostic entry.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,
    /// Category of the diagnostic source.
    pub category: DiagnosticCategory,
    /// Human-readable description.
    pub message: String,
    /// Location of the unit being processed, if applicable.
    pub unit: Option<String>,
    /// Name of the mutator that produced the diagnostic, if applicable.
    pub mutator: Option<&'static str>,
}

impl Diagnostic {
    /// Creates a new diagnostic without context.
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
            unit: None,
            mutator: None,
        }
    }

    /// Attaches the location of the unit that was being processed.
    #[must_use]
    pub fn with_unit(mut self, location: impl Into<String>) -> Self {
        self.unit = Some(location.into());
        self
    }

    /// Attaches the name of the mutator that was running.
    #[must_use]
    pub fn with_mutator(mut self, name: &'static str) -> Self {
        self.mutator = Some(name);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;

        if let Some(mutator) = self.mutator {
            write!(f, " (mutator: {mutator})")?;
        }

        if let Some(unit) = &self.unit {
            write!(f, " (unit: {unit})")?;
        }

        Ok(())
    }
}

/// Receiver for diagnostics produced while processing units.
///
/// The traversal framework reports every aborted unit through this interface.
pub trait DiagnosticSink: Send + Sync {
    /// Record one diagnostic.
    fn report(&self, diagnostic: Diagnostic);
}

/// Thread-safe container for collecting diagnostics.
///
/// Uses `boxcar::Vec` for lock-free concurrent appends.
#[derive(Debug)]
pub struct Diagnostics {
    entries: boxcar::Vec<Diagnostic>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// Creates a new empty diagnostics container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: boxcar::Vec::new(),
        }
    }

    /// Adds an info-level diagnostic.
    pub fn info(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticSeverity::Info, category, message));
    }

    /// Adds a warning-level diagnostic.
    pub fn warning(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    /// Adds an error-level diagnostic.
    pub fn error(&self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            message,
        ));
    }

    /// Adds a diagnostic entry and forwards it to `tracing`.
    pub fn push(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            DiagnosticSeverity::Info => tracing::info!(
                category = %diagnostic.category,
                unit = diagnostic.unit.as_deref(),
                "{}",
                diagnostic.message
            ),
            DiagnosticSeverity::Warning => tracing::warn!(
                category = %diagnostic.category,
                unit = diagnostic.unit.as_deref(),
                "{}",
                diagnostic.message
            ),
            DiagnosticSeverity::Error => tracing::error!(
                category = %diagnostic.category,
                unit = diagnostic.unit.as_deref(),
                "{}",
                diagnostic.message
            ),
        }
        self.entries.push(diagnostic);
    }

    /// Returns true if any diagnostics have been collected.
    pub fn has_any(&self) -> bool {
        self.entries.count() > 0
    }

    /// Returns true if any error-level diagnostics have been collected.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, d)| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns the total number of diagnostics.
    pub fn count(&self) -> usize {
        self.entries.count()
    }

    /// Returns the number of error-level diagnostics.
    pub fn error_count(&self) -> usize {
        self.count_of(DiagnosticSeverity::Error)
    }

    /// Returns the number of warning-level diagnostics.
    pub fn warning_count(&self) -> usize {
        self.count_of(DiagnosticSeverity::Warning)
    }

    /// Returns the number of info-level diagnostics.
    pub fn info_count(&self) -> usize {
        self.count_of(DiagnosticSeverity::Info)
    }

    fn count_of(&self, severity: DiagnosticSeverity) -> usize {
        self.entries
            .iter()
            .filter(|(_, d)| d.severity == severity)
            .count()
    }

    /// Returns an iterator over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().map(|(_, d)| d)
    }

    /// Returns all errors as a vector.
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .collect()
    }

    /// Returns diagnostics filtered by category.
    pub fn by_category(&self, category: DiagnosticCategory) -> Vec<&Diagnostic> {
        self.iter().filter(|d| d.category == category).collect()
    }

    /// Formats a summary of all diagnostics for display.
    pub fn summary(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "Diagnostics: {} error(s), {} warning(s), {} info(s)",
            self.error_count(),
            self.warning_count(),
            self.info_count()
        );

        for diag in self.iter() {
            if diag.severity != DiagnosticSeverity::Info {
                let _ = writeln!(output, "  {diag}");
            }
        }

        output
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}
