//! Structural traversal of expressions and the canonical serializer.

use std::fmt::{self, Write};

use crate::{
    ast::{Binary, ComparatorType, ExprKind, Expression},
    output::to_json,
    value::Value,
};

/// A visitor with one method per expression variant.
///
/// [`Expression::accept`] dispatches to exactly one of these methods; the
/// visitor decides whether and how to descend into children. Adding a
/// variant to [`ExprKind`] adds a method here, so every visitor has to
/// handle it.
pub trait ExpressionVisitor<R> {
    fn visit_field(&mut self, expr: &Expression, name: &str) -> R;
    fn visit_index(&mut self, expr: &Expression, index: i64) -> R;
    fn visit_slice(&mut self, expr: &Expression, start: Option<i64>, stop: Option<i64>, step: i64) -> R;
    fn visit_flatten(&mut self, expr: &Expression, inner: &Expression) -> R;
    fn visit_projection(&mut self, expr: &Expression, operands: &Binary) -> R;
    fn visit_object_projection(&mut self, expr: &Expression, operands: &Binary) -> R;
    fn visit_filter_projection(&mut self, expr: &Expression, operands: &Binary, condition: &Expression) -> R;
    fn visit_pipe(&mut self, expr: &Expression, operands: &Binary) -> R;
    fn visit_subexpression(&mut self, expr: &Expression, operands: &Binary) -> R;
    fn visit_multi_select_list(&mut self, expr: &Expression, items: &[Expression]) -> R;
    fn visit_multi_select_hash(&mut self, expr: &Expression, entries: &[(String, Expression)]) -> R;
    fn visit_and(&mut self, expr: &Expression, operands: &Binary) -> R;
    fn visit_or(&mut self, expr: &Expression, operands: &Binary) -> R;
    fn visit_not(&mut self, expr: &Expression, inner: &Expression) -> R;
    fn visit_comparison(&mut self, expr: &Expression, comparator: ComparatorType, operands: &Binary) -> R;
    fn visit_current(&mut self, expr: &Expression) -> R;
    fn visit_literal(&mut self, expr: &Expression, value: &Value) -> R;
    fn visit_raw_string(&mut self, expr: &Expression, value: &str) -> R;
    fn visit_function(&mut self, expr: &Expression, name: &str, args: &[Expression]) -> R;
    fn visit_expression_ref(&mut self, expr: &Expression, inner: &Expression) -> R;
}

impl Expression {
    /// Dispatch to the visitor method for this expression's variant.
    pub fn accept<R, V: ExpressionVisitor<R> + ?Sized>(&self, visitor: &mut V) -> R {
        match &self.kind {
            ExprKind::Field(name) => visitor.visit_field(self, name),
            ExprKind::Index(index) => visitor.visit_index(self, *index),
            ExprKind::Slice { start, stop, step } => visitor.visit_slice(self, *start, *stop, *step),
            ExprKind::Flatten(inner) => visitor.visit_flatten(self, inner),
            ExprKind::Projection(operands) => visitor.visit_projection(self, operands),
            ExprKind::ObjectProjection(operands) => visitor.visit_object_projection(self, operands),
            ExprKind::FilterProjection { operands, condition } => {
                visitor.visit_filter_projection(self, operands, condition)
            }
            ExprKind::Pipe(operands) => visitor.visit_pipe(self, operands),
            ExprKind::Subexpression(operands) => visitor.visit_subexpression(self, operands),
            ExprKind::MultiSelectList(items) => visitor.visit_multi_select_list(self, items),
            ExprKind::MultiSelectHash(entries) => visitor.visit_multi_select_hash(self, entries),
            ExprKind::And(operands) => visitor.visit_and(self, operands),
            ExprKind::Or(operands) => visitor.visit_or(self, operands),
            ExprKind::Not(inner) => visitor.visit_not(self, inner),
            ExprKind::Comparison { comparator, operands } => {
                visitor.visit_comparison(self, *comparator, operands)
            }
            ExprKind::Current => visitor.visit_current(self),
            ExprKind::Literal(value) => visitor.visit_literal(self, value),
            ExprKind::RawString(value) => visitor.visit_raw_string(self, value),
            ExprKind::Function { name, args } => visitor.visit_function(self, name, args),
            ExprKind::ExpressionRef(inner) => visitor.visit_expression_ref(self, inner),
        }
    }
}

/// Writes an expression back out as JMESPath text.
///
/// The output re-parses to an equal expression. Fields are always quoted and
/// literals are always JSON, so the text is canonical rather than pretty.
struct Serializer<'a, 'f> {
    out: &'a mut fmt::Formatter<'f>,
}

impl Serializer<'_, '_> {
    fn write(&mut self, expr: &Expression) -> fmt::Result {
        expr.accept(self)
    }

    /// Left operands of chains and projections bind tighter than pipes and
    /// comparisons, so those get parentheses. A projection on the left would
    /// swallow whatever follows it, so it is closed off the same way.
    fn write_operand(&mut self, expr: &Expression) -> fmt::Result {
        if needs_parens(expr) || ends_in_projection(expr) {
            self.write_parenthesized(expr)
        } else {
            self.write(expr)
        }
    }

    /// Operands of `|`, `||` and `&&`, where only a leading `&` reaches too far.
    fn write_loose_operand(&mut self, expr: &Expression) -> fmt::Result {
        if matches!(expr.kind, ExprKind::ExpressionRef(_)) {
            self.write_parenthesized(expr)
        } else {
            self.write(expr)
        }
    }

    fn write_parenthesized(&mut self, expr: &Expression) -> fmt::Result {
        self.out.write_char('(')?;
        self.write(expr)?;
        self.out.write_char(')')
    }

    fn write_projection_rhs(&mut self, right: &Expression) -> fmt::Result {
        if matches!(right.kind, ExprKind::Current) {
            return Ok(());
        }
        if needs_dot(right) {
            self.out.write_char('.')?;
        }
        self.write(right)
    }
}

fn is_current(expr: &Expression) -> bool {
    matches!(expr.kind, ExprKind::Current)
}

// `!` and `&` take everything after them, `|` and comparators bind loosest.
fn needs_parens(expr: &Expression) -> bool {
    matches!(
        expr.kind,
        ExprKind::Pipe(_) | ExprKind::Comparison { .. } | ExprKind::Not(_) | ExprKind::ExpressionRef(_)
    )
}

fn ends_in_projection(expr: &Expression) -> bool {
    match &expr.kind {
        ExprKind::Projection(_) | ExprKind::ObjectProjection(_) | ExprKind::FilterProjection { .. } => true,
        ExprKind::Subexpression(operands) => ends_in_projection(&operands.right),
        _ => false,
    }
}

// Right-hand sides that start with a name or a brace need a '.' in front.
fn needs_dot(expr: &Expression) -> bool {
    match &expr.kind {
        ExprKind::Field(_)
        | ExprKind::MultiSelectHash(_)
        | ExprKind::MultiSelectList(_)
        | ExprKind::ObjectProjection(_)
        | ExprKind::Function { .. } => true,
        ExprKind::Subexpression(operands)
        | ExprKind::Projection(operands)
        | ExprKind::FilterProjection { operands, .. } => needs_dot(&operands.left),
        ExprKind::Flatten(inner) => needs_dot(inner),
        _ => false,
    }
}

impl ExpressionVisitor<fmt::Result> for Serializer<'_, '_> {
    fn visit_field(&mut self, _expr: &Expression, name: &str) -> fmt::Result {
        // serde_json produces exactly the escapes the lexer reads back
        let quoted = serde_json::to_string(name).map_err(|_| fmt::Error)?;
        self.out.write_str(&quoted)
    }

    fn visit_index(&mut self, _expr: &Expression, index: i64) -> fmt::Result {
        write!(self.out, "[{index}]")
    }

    fn visit_slice(&mut self, _expr: &Expression, start: Option<i64>, stop: Option<i64>, step: i64) -> fmt::Result {
        self.out.write_char('[')?;
        if let Some(start) = start {
            write!(self.out, "{start}")?;
        }
        self.out.write_char(':')?;
        if let Some(stop) = stop {
            write!(self.out, "{stop}")?;
        }
        write!(self.out, ":{step}]")
    }

    fn visit_flatten(&mut self, _expr: &Expression, inner: &Expression) -> fmt::Result {
        // `[]` already ends any projection before it
        if needs_parens(inner) {
            self.write_parenthesized(inner)?;
        } else if !is_current(inner) {
            self.write(inner)?;
        }
        self.out.write_str("[]")
    }

    fn visit_projection(&mut self, _expr: &Expression, operands: &Binary) -> fmt::Result {
        match &operands.left.kind {
            // slices and flattens already project
            ExprKind::Slice { .. } | ExprKind::Flatten(_) => self.write(&operands.left)?,
            ExprKind::Current => self.out.write_str("[*]")?,
            _ => {
                self.write_operand(&operands.left)?;
                self.out.write_str("[*]")?;
            }
        }
        self.write_projection_rhs(&operands.right)
    }

    fn visit_object_projection(&mut self, _expr: &Expression, operands: &Binary) -> fmt::Result {
        if is_current(&operands.left) {
            self.out.write_char('*')?;
        } else {
            self.write_operand(&operands.left)?;
            self.out.write_str(".*")?;
        }
        self.write_projection_rhs(&operands.right)
    }

    fn visit_filter_projection(&mut self, _expr: &Expression, operands: &Binary, condition: &Expression) -> fmt::Result {
        if !is_current(&operands.left) {
            self.write_operand(&operands.left)?;
        }
        self.out.write_str("[?")?;
        self.write(condition)?;
        self.out.write_char(']')?;
        self.write_projection_rhs(&operands.right)
    }

    fn visit_pipe(&mut self, _expr: &Expression, operands: &Binary) -> fmt::Result {
        self.write_loose_operand(&operands.left)?;
        self.out.write_str(" | ")?;
        if matches!(operands.right.kind, ExprKind::Pipe(_)) {
            self.write_parenthesized(&operands.right)
        } else {
            self.write(&operands.right)
        }
    }

    fn visit_subexpression(&mut self, _expr: &Expression, operands: &Binary) -> fmt::Result {
        self.write_operand(&operands.left)?;
        if needs_dot(&operands.right) {
            self.out.write_char('.')?;
        }
        self.write(&operands.right)
    }

    fn visit_multi_select_list(&mut self, _expr: &Expression, items: &[Expression]) -> fmt::Result {
        self.out.write_char('[')?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            self.write(item)?;
        }
        self.out.write_char(']')
    }

    fn visit_multi_select_hash(&mut self, _expr: &Expression, entries: &[(String, Expression)]) -> fmt::Result {
        self.out.write_char('{')?;
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            let quoted = serde_json::to_string(key).map_err(|_| fmt::Error)?;
            write!(self.out, "{quoted}: ")?;
            self.write(value)?;
        }
        self.out.write_char('}')
    }

    fn visit_and(&mut self, _expr: &Expression, operands: &Binary) -> fmt::Result {
        self.out.write_char('(')?;
        self.write_loose_operand(&operands.left)?;
        self.out.write_str(" && ")?;
        self.write(&operands.right)?;
        self.out.write_char(')')
    }

    fn visit_or(&mut self, _expr: &Expression, operands: &Binary) -> fmt::Result {
        self.out.write_char('(')?;
        self.write_loose_operand(&operands.left)?;
        self.out.write_str(" || ")?;
        self.write(&operands.right)?;
        self.out.write_char(')')
    }

    fn visit_not(&mut self, _expr: &Expression, inner: &Expression) -> fmt::Result {
        self.out.write_str("!(")?;
        self.write(inner)?;
        self.out.write_char(')')
    }

    fn visit_comparison(&mut self, _expr: &Expression, comparator: ComparatorType, operands: &Binary) -> fmt::Result {
        self.write_operand(&operands.left)?;
        write!(self.out, " {comparator} ")?;
        self.write_operand(&operands.right)
    }

    fn visit_current(&mut self, _expr: &Expression) -> fmt::Result {
        self.out.write_char('@')
    }

    fn visit_literal(&mut self, _expr: &Expression, value: &Value) -> fmt::Result {
        write!(self.out, "`{}`", to_json(value).replace('`', "\\`"))
    }

    fn visit_raw_string(&mut self, _expr: &Expression, value: &str) -> fmt::Result {
        write!(self.out, "'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }

    fn visit_function(&mut self, _expr: &Expression, name: &str, args: &[Expression]) -> fmt::Result {
        write!(self.out, "{name}(")?;
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.out.write_str(", ")?;
            }
            self.write(arg)?;
        }
        self.out.write_char(')')
    }

    fn visit_expression_ref(&mut self, _expr: &Expression, inner: &Expression) -> fmt::Result {
        self.out.write_str("&(")?;
        self.write(inner)?;
        self.out.write_char(')')
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Serializer { out: f }.write(self)
    }
}
