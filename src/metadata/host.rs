//! Host collaborators: unit loading and debug symbols.
//!
//! Reading binary artifacts and debug-symbol files is not done by this crate. The
//! host plugs in implementations of the traits here instead:
//!
//! - [`UnitLoader`] produces units from locations
//! - [`DebugSymbolProvider`] maps IL locations back to the source text they were
//!   compiled from
//!
//! Symbol providers are registered per unit location in a [`SymbolStore`]. A unit
//! without a registered provider has no symbols, and rewriters that need source
//! text skip it.

use std::{fmt, sync::Arc};

use dashmap::DashMap;

use crate::metadata::{code::Location, unit::Unit};

/// Produces units from opaque locations.
pub trait UnitLoader: Send + Sync {
    /// Load the unit at `location`; `None` if there is nothing there.
    fn load(&self, location: &str) -> Option<Unit>;
}

/// A span of source text, 1-based lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceSpan {
    /// First line of the span.
    pub start_line: u32,
    /// First column of the span.
    pub start_col: u32,
    /// Last line of the span.
    pub end_line: u32,
    /// Column just past the end of the span.
    pub end_col: u32,
}

impl SourceSpan {
    /// Create a span.
    #[must_use]
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.start_line, self.start_col, self.end_line, self.end_col
        )
    }
}

/// A piece of source text an IL location was compiled from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimarySourceLocation {
    /// The source document, usually a file path.
    pub document: String,
    /// Where in the document the text is.
    pub span: SourceSpan,
    /// The literal source text of the span.
    pub text: String,
}

impl PrimarySourceLocation {
    /// Create a primary source location.
    pub fn new(document: impl Into<String>, span: SourceSpan, text: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            span,
            text: text.into(),
        }
    }
}

/// Maps IL locations to source text.
pub trait DebugSymbolProvider: Send + Sync {
    /// The source locations `location` was compiled from, in order. Empty if unknown.
    fn source_text_for(&self, location: &Location) -> Vec<PrimarySourceLocation>;
}

/// A [`DebugSymbolProvider`] backed by an in-memory table.
#[derive(Debug, Default)]
pub struct MemorySymbols {
    entries: DashMap<Location, Vec<PrimarySourceLocation>>,
}

impl MemorySymbols {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source location for `location`.
    pub fn add(&self, location: Location, source: PrimarySourceLocation) {
        self.entries.entry(location).or_default().push(source);
    }

    /// Builder-style [`MemorySymbols::add`].
    #[must_use]
    pub fn with(self, location: Location, source: PrimarySourceLocation) -> Self {
        self.add(location, source);
        self
    }
}

impl DebugSymbolProvider for MemorySymbols {
    fn source_text_for(&self, location: &Location) -> Vec<PrimarySourceLocation> {
        self.entries
            .get(location)
            .map(|sources| sources.clone())
            .unwrap_or_default()
    }
}

/// Registry of symbol providers keyed by unit location.
#[derive(Default)]
pub struct SymbolStore {
    providers: DashMap<String, Arc<dyn DebugSymbolProvider>>,
}

impl SymbolStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the provider for the unit loaded from `location`, replacing any
    /// earlier one.
    pub fn register(&self, location: impl Into<String>, provider: Arc<dyn DebugSymbolProvider>) {
        self.providers.insert(location.into(), provider);
    }

    /// The provider registered for the unit's location.
    #[must_use]
    pub fn provider_for(&self, unit: &Unit) -> Option<Arc<dyn DebugSymbolProvider>> {
        self.providers
            .get(unit.location())
            .map(|provider| Arc::clone(provider.value()))
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no provider is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for SymbolStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolStore")
            .field("providers", &self.providers.len())
            .finish()
    }
}
