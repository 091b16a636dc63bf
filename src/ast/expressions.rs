use std::hash::{Hash, Hasher};

use crate::{ast::ComparatorType, lexer::Position, value::Value};

/// A parsed JMESPath expression.
///
/// Built once by [`parse`](crate::parse) and immutable afterwards; the same
/// tree can be evaluated any number of times, from any number of threads,
/// against any [`Runtime`](crate::runtime::Runtime).
///
/// Equality and hashing are structural: two expressions are equal when their
/// variants and children are, wherever they appeared in the source text.
#[derive(Debug, Clone)]
pub struct Expression {
    /// What kind of expression this is
    pub kind: ExprKind,

    /// Where the expression starts in the source text
    pub position: Position,
}

/// The two operands shared by every binary-shaped expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

/// The closed set of expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Field access on the current node
    ///
    /// # Examples
    /// ```text
    /// foo
    /// "with space"
    /// ```
    Field(String),

    /// Array index on the current node, negative counts from the end
    ///
    /// # Examples
    /// ```text
    /// [0]
    /// [-1]
    /// ```
    Index(i64),

    /// Array slice on the current node
    ///
    /// # Examples
    /// ```text
    /// [1:3]
    /// [::-1]
    /// ```
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
    },

    /// Merge one level of nested arrays
    ///
    /// Produced by `[]`; the parser wraps it in a [`ExprKind::Projection`].
    Flatten(Box<Expression>),

    /// Wildcard array projection (`[*]`, and the projection around slices
    /// and flattens)
    Projection(Binary),

    /// Wildcard object projection over an object's values (`*`)
    ObjectProjection(Binary),

    /// Array projection gated by a condition (`[?cond]`)
    FilterProjection {
        operands: Binary,
        condition: Box<Expression>,
    },

    /// Pipe (`a | b`): always feeds the left result to the right side
    Pipe(Binary),

    /// Chained access (`a.b`, `a[0]`): null on the left stops the chain
    Subexpression(Binary),

    /// Multi-select list (`[a, b]`)
    MultiSelectList(Vec<Expression>),

    /// Multi-select hash (`{a: x, b: y}`), keys kept in source order
    MultiSelectHash(Vec<(String, Expression)>),

    /// Logical and (`&&`)
    And(Binary),

    /// Logical or (`||`)
    Or(Binary),

    /// Logical not (`!`)
    Not(Box<Expression>),

    /// Comparison (`==`, `!=`, `<`, `<=`, `>`, `>=`)
    Comparison {
        comparator: ComparatorType,
        operands: Binary,
    },

    /// Current node (`@`)
    Current,

    /// JSON literal (`` `...` ``)
    Literal(Value),

    /// Raw string literal (`'...'`)
    RawString(String),

    /// Function call
    ///
    /// # Examples
    /// ```text
    /// length(@)
    /// sort_by(people, &age)
    /// ```
    Function { name: String, args: Vec<Expression> },

    /// Expression reference (`&expr`), handed unevaluated to functions
    ExpressionRef(Box<Expression>),
}

impl Expression {
    pub fn new(kind: ExprKind, position: Position) -> Self {
        Expression { kind, position }
    }

    pub fn current(position: Position) -> Self {
        Expression::new(ExprKind::Current, position)
    }

    /// Source line, 1-based
    pub fn line(&self) -> usize {
        self.position.line
    }

    /// Source column, 1-based
    pub fn column(&self) -> usize {
        self.position.column
    }
}

impl Binary {
    pub fn new(left: Expression, right: Expression) -> Self {
        Binary {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

// Literals never hold NaN: they come out of a JSON parser.
impl Eq for Expression {}

impl Hash for Expression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // The canonical text is a function of the structure alone.
        self.to_string().hash(state);
    }
}
