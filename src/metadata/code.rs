//! The code model: statements and expressions of method bodies.
//!
//! This is the subtree the rewrite walk descends into. Nodes are immutable once
//! built and shared through `Arc`, so a rewritten tree can reuse every subtree
//! that was not touched, and the same node may legitimately appear at more than
//! one place in a tree.
//!
//! Every node carries the IL [`Location`]s it was compiled from. Those locations
//! are what the debug-symbol collaborator maps back to source text.

use std::{fmt, sync::Arc};

use crate::metadata::references::MethodReference;

/// An opaque IL location: a method and an offset into its body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    /// Full name of the method containing the instruction.
    pub method: String,
    /// IL offset of the instruction.
    pub offset: u32,
}

impl Location {
    /// Create a new location.
    pub fn new(method: impl Into<String>, offset: u32) -> Self {
        Self {
            method: method.into(),
            offset,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+IL_{:04x}", self.method, self.offset)
    }
}

/// A compile-time constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// `null`
    Null,
    /// A boolean literal
    Bool(bool),
    /// An integer literal
    Int(i64),
    /// A string literal
    String(String),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `!x`
    Not,
    /// `-x`
    Negate,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `&&`
    And,
    /// `||`
    Or,
}

/// A call to a method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// The method being called.
    pub method: MethodReference,
    /// The target object, `None` for static calls.
    pub this: Option<ExpressionRc>,
    /// Arguments in order.
    pub arguments: Vec<ExpressionRc>,
}

/// The different kinds of expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    /// A literal value
    Constant(Constant),
    /// Read of a local variable
    Local(String),
    /// Read of a parameter
    Parameter(String),
    /// The `this` reference
    This,
    /// A unary operation
    Unary {
        /// Operator
        operator: UnaryOperator,
        /// Operand
        operand: ExpressionRc,
    },
    /// A binary operation
    Binary {
        /// Operator
        operator: BinaryOperator,
        /// Left operand
        left: ExpressionRc,
        /// Right operand
        right: ExpressionRc,
    },
    /// A method call
    MethodCall(MethodCall),
    /// `condition ? then : otherwise`
    Conditional {
        /// Condition
        condition: ExpressionRc,
        /// Value if true
        then: ExpressionRc,
        /// Value if false
        otherwise: ExpressionRc,
    },
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// What the expression is.
    pub kind: ExpressionKind,
    /// IL locations this expression was compiled from.
    pub locations: Vec<Location>,
}

/// A reference-counted pointer to an [`Expression`].
pub type ExpressionRc = Arc<Expression>;

impl Expression {
    /// Wrap a kind in a shareable node without locations.
    #[must_use]
    pub fn new(kind: ExpressionKind) -> ExpressionRc {
        Arc::new(Self {
            kind,
            locations: Vec::new(),
        })
    }

    /// Wrap a kind in a shareable node with the given locations.
    #[must_use]
    pub fn located(kind: ExpressionKind, locations: Vec<Location>) -> ExpressionRc {
        Arc::new(Self { kind, locations })
    }

    /// A constant expression.
    #[must_use]
    pub fn constant(value: Constant) -> ExpressionRc {
        Self::new(ExpressionKind::Constant(value))
    }

    /// A string constant.
    #[must_use]
    pub fn string(value: impl Into<String>) -> ExpressionRc {
        Self::constant(Constant::String(value.into()))
    }

    /// Read of a local variable.
    #[must_use]
    pub fn local(name: impl Into<String>) -> ExpressionRc {
        Self::new(ExpressionKind::Local(name.into()))
    }

    /// A binary operation.
    #[must_use]
    pub fn binary(operator: BinaryOperator, left: ExpressionRc, right: ExpressionRc) -> ExpressionRc {
        Self::new(ExpressionKind::Binary {
            operator,
            left,
            right,
        })
    }

    /// A method call.
    #[must_use]
    pub fn call(
        method: MethodReference,
        this: Option<ExpressionRc>,
        arguments: Vec<ExpressionRc>,
    ) -> ExpressionRc {
        Self::new(ExpressionKind::MethodCall(MethodCall {
            method,
            this,
            arguments,
        }))
    }

    /// Returns the call if this expression is a method call.
    #[must_use]
    pub fn as_call(&self) -> Option<&MethodCall> {
        match &self.kind {
            ExpressionKind::MethodCall(call) => Some(call),
            _ => None,
        }
    }
}

/// An ordered list of statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    /// Statements in execution order.
    pub statements: Vec<StatementRc>,
}

impl Block {
    /// Create a block.
    #[must_use]
    pub fn new(statements: Vec<StatementRc>) -> Self {
        Self { statements }
    }
}

/// The different kinds of statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// An expression evaluated for its side effects, e.g. `Assert.True(x);`
    Expression(ExpressionRc),
    /// `var name = initializer;`
    LocalDeclaration {
        /// Local name
        name: String,
        /// Optional initial value
        initializer: Option<ExpressionRc>,
    },
    /// `return value;`
    Return(Option<ExpressionRc>),
    /// `{ ... }`
    Block(Block),
    /// `if (condition) then else otherwise`
    If {
        /// Condition
        condition: ExpressionRc,
        /// Taken branch
        then: StatementRc,
        /// Else branch
        otherwise: Option<StatementRc>,
    },
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// What the statement is.
    pub kind: StatementKind,
    /// IL locations this statement was compiled from.
    pub locations: Vec<Location>,
}

/// A reference-counted pointer to a [`Statement`].
pub type StatementRc = Arc<Statement>;

impl Statement {
    /// Wrap a kind in a shareable node without locations.
    #[must_use]
    pub fn new(kind: StatementKind) -> StatementRc {
        Arc::new(Self {
            kind,
            locations: Vec::new(),
        })
    }

    /// An expression statement.
    #[must_use]
    pub fn expression(expression: ExpressionRc) -> StatementRc {
        Self::new(StatementKind::Expression(expression))
    }
}

/// The body of a method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodBody {
    /// Names of the declared locals.
    pub locals: Vec<String>,
    /// The top-level block.
    pub block: Block,
}

impl MethodBody {
    /// Create a body from top-level statements.
    #[must_use]
    pub fn new(statements: Vec<StatementRc>) -> Self {
        Self {
            locals: Vec::new(),
            block: Block::new(statements),
        }
    }
}
