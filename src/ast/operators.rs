use std::{cmp::Ordering, fmt};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparatorType {
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterEqual,
}

impl ComparatorType {
    /// The operator as written in an expression.
    pub fn symbol(self) -> &'static str {
        match self {
            ComparatorType::Equal => "==",
            ComparatorType::NotEqual => "!=",
            ComparatorType::LessThan => "<",
            ComparatorType::LessEqual => "<=",
            ComparatorType::GreaterThan => ">",
            ComparatorType::GreaterEqual => ">=",
        }
    }

    /// Whether an ordering between two operands satisfies this operator.
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            ComparatorType::Equal => ordering == Ordering::Equal,
            ComparatorType::NotEqual => ordering != Ordering::Equal,
            ComparatorType::LessThan => ordering == Ordering::Less,
            ComparatorType::LessEqual => ordering != Ordering::Greater,
            ComparatorType::GreaterThan => ordering == Ordering::Greater,
            ComparatorType::GreaterEqual => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for ComparatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
