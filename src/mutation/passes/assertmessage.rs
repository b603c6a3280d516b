//! Assert message pass.
//!
//! Rewrites assertion calls that carry no message into the overload that takes one,
//! using the source text of the asserted condition as the message:
//!
//! ```text
//! Assert.True(x > 0);   →   Assert.True(x > 0, "x > 0");
//! ```
//!
//! # Source text recovery
//!
//! The condition's IL locations are mapped back to source through the unit's
//! [`DebugSymbolProvider`]. The text of every primary source location is
//! concatenated, in order. The result usually covers the whole statement, so it is
//! trimmed: everything up to and including `<method>(` is dropped, then a trailing
//! `);`. Text that matches neither passes through unchanged.
//!
//! A unit without debug symbols cannot be rewritten; its traversal aborts with
//! [`Error::MissingSymbols`] and the unit is left as it was.

use std::{collections::HashMap, iter, sync::Arc};

use crate::{
    metadata::{
        code::{Expression, ExpressionKind, ExpressionRc, MethodCall},
        host::DebugSymbolProvider,
        interning::{InternTable, InternedKey, Symbol},
        references::{MethodReference, PlatformTypes, TypeReference},
        unit::Unit,
    },
    mutation::{
        pass::UnitMutator,
        rewriter::{Rewrite, RewriteContext, Rewriter},
    },
    Error, Result,
};

/// Maps assertion methods to the overload that takes a trailing message.
///
/// Keys are interned, so two structurally equal method references hit the same
/// entry no matter where they were created.
#[derive(Debug)]
pub struct SignatureTable {
    interner: Arc<InternTable>,
    entries: HashMap<InternedKey, MethodReference>,
}

impl SignatureTable {
    /// An empty table keyed through `interner`.
    #[must_use]
    pub fn new(interner: Arc<InternTable>) -> Self {
        Self {
            interner,
            entries: HashMap::new(),
        }
    }

    /// The Xunit table: `True(bool)` and `False(bool)` of `assert_type` map to their
    /// `(bool, string)` overloads.
    #[must_use]
    pub fn xunit(
        interner: Arc<InternTable>,
        assert_type: &TypeReference,
        platform: &PlatformTypes,
    ) -> Self {
        let mut table = Self::new(interner);
        for name in ["True", "False"] {
            let source = MethodReference::new(
                assert_type.clone(),
                name,
                platform.system_void(),
                vec![platform.system_boolean()],
            );
            let target = source.with_extra_parameter(platform.system_string());
            table.register(&source, target);
        }
        table
    }

    /// Rewrite calls to `source` into calls to `target`.
    ///
    /// `target` must accept the arguments of `source` plus one string.
    pub fn register(&mut self, source: &MethodReference, target: MethodReference) {
        let key = self.interner.intern_method(source);
        tracing::trace!(%source, %target, %key, "registered message overload");
        self.entries.insert(key, target);
    }

    /// The overload registered for `method`. Unregistered methods are not interned.
    #[must_use]
    pub fn lookup(&self, method: &MethodReference) -> Option<&MethodReference> {
        let key = self.interner.get(&Symbol::Method(method.clone()))?;
        self.entries.get(&key)
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no method is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Adds the source text of the asserted condition as the assertion message.
#[derive(Debug)]
pub struct AssertMessageMutator {
    table: SignatureTable,
}

impl AssertMessageMutator {
    /// A mutator over an explicit signature table.
    #[must_use]
    pub fn new(table: SignatureTable) -> Self {
        Self { table }
    }

    /// A mutator for Xunit's `Assert.True` and `Assert.False`.
    #[must_use]
    pub fn xunit(
        interner: Arc<InternTable>,
        assert_type: &TypeReference,
        platform: &PlatformTypes,
    ) -> Self {
        Self::new(SignatureTable::xunit(interner, assert_type, platform))
    }

    /// The signature table.
    #[must_use]
    pub fn table(&self) -> &SignatureTable {
        &self.table
    }
}

impl UnitMutator for AssertMessageMutator {
    fn name(&self) -> &'static str {
        "AssertMessage"
    }

    fn priority(&self) -> i32 {
        5
    }

    fn create_rewriter(&self) -> Box<dyn Rewriter + '_> {
        Box::new(AssertMessageRewriter {
            table: &self.table,
            symbols: None,
        })
    }

    fn description(&self) -> &'static str {
        "Adds the asserted condition's source text as the assertion message"
    }
}

struct AssertMessageRewriter<'a> {
    table: &'a SignatureTable,
    symbols: Option<Arc<dyn DebugSymbolProvider>>,
}

impl Rewriter for AssertMessageRewriter<'_> {
    fn name(&self) -> &'static str {
        "AssertMessage"
    }

    fn begin_unit(&mut self, unit: &Unit, ctx: &RewriteContext<'_>) -> Result<()> {
        let provider = ctx
            .symbols
            .provider_for(unit)
            .ok_or_else(|| Error::MissingSymbols(unit.location().to_string()))?;
        self.symbols = Some(provider);
        Ok(())
    }

    fn rewrite_method_call(
        &mut self,
        call: &MethodCall,
        node: &ExpressionRc,
    ) -> Result<Rewrite<ExpressionRc>> {
        let Some(target) = self.table.lookup(&call.method) else {
            return Ok(Rewrite::Default);
        };
        let Some(condition) = call.arguments.first() else {
            return Ok(Rewrite::Default);
        };
        let Some(symbols) = &self.symbols else {
            return Err(Error::Error(format!(
                "no debug symbols bound while rewriting {}",
                call.method
            )));
        };

        let text = extract_source(symbols.as_ref(), condition);
        let message = normalize_message(&target.name, &text);
        tracing::trace!(method = %call.method, %message, "adding assertion message");

        let arguments = call
            .arguments
            .iter()
            .cloned()
            .chain(iter::once(Expression::string(message)))
            .collect();
        let replacement = Expression::located(
            ExpressionKind::MethodCall(MethodCall {
                method: target.clone(),
                this: call.this.clone(),
                arguments,
            }),
            node.locations.clone(),
        );
        Ok(Rewrite::Replace(replacement))
    }
}

/// Concatenates the source text of every primary source location of `expression`.
pub(crate) fn extract_source(symbols: &dyn DebugSymbolProvider, expression: &Expression) -> String {
    expression
        .locations
        .iter()
        .flat_map(|location| symbols.source_text_for(location))
        .map(|source| source.text)
        .collect()
}

/// Trims the statement text around an assertion down to its condition.
pub(crate) fn normalize_message(method_name: &str, text: &str) -> String {
    let opening = format!("{method_name}(");
    let text = match text.find(&opening) {
        Some(index) => &text[index + opening.len()..],
        None => text,
    };
    text.strip_suffix(");").unwrap_or(text).to_string()
}
