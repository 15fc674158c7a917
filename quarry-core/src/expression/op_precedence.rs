use crate::{PropertyExpression, writer::SqlWriter};

/// Provides numeric precedence for expressions allowing sql writers to insert parentheses.
pub trait OpPrecedence {
    /// Lower numbers bind weaker, writers parenthesize when child precedence <= operator precedence.
    fn precedence(&self, writer: &dyn SqlWriter) -> i32;
}

impl<T: OpPrecedence> OpPrecedence for &T {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        (*self).precedence(writer)
    }
}

impl OpPrecedence for PropertyExpression {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        match self {
            PropertyExpression::Unary { op, .. } => op.precedence(writer),
            PropertyExpression::Binary { op, .. } => op.precedence(writer),
            PropertyExpression::Ordered { expression, .. } => expression.precedence(writer),
            _ => 1_000_000_000,
        }
    }
}
