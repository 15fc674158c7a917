use crate::{OpPrecedence, writer::SqlWriter};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOpType {
    Multiplication,
    Division,
    Remainder,
    Addition,
    Subtraction,
    Is,
    IsNot,
    Like,
    NotLike,
    In,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOpType {
    /// Comparison whose right hand side binds to the column on the left.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOpType::Is
                | BinaryOpType::IsNot
                | BinaryOpType::Like
                | BinaryOpType::NotLike
                | BinaryOpType::In
                | BinaryOpType::Equal
                | BinaryOpType::NotEqual
                | BinaryOpType::Less
                | BinaryOpType::Greater
                | BinaryOpType::LessEqual
                | BinaryOpType::GreaterEqual
        )
    }
}

impl OpPrecedence for BinaryOpType {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        writer.expression_binary_op_precedence(self)
    }
}

impl Display for BinaryOpType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOpType::Multiplication => "Multiplication",
            BinaryOpType::Division => "Division",
            BinaryOpType::Remainder => "Remainder",
            BinaryOpType::Addition => "Addition",
            BinaryOpType::Subtraction => "Subtraction",
            BinaryOpType::Is => "Is",
            BinaryOpType::IsNot => "IsNot",
            BinaryOpType::Like => "Like",
            BinaryOpType::NotLike => "NotLike",
            BinaryOpType::In => "In",
            BinaryOpType::Equal => "Equal",
            BinaryOpType::NotEqual => "NotEqual",
            BinaryOpType::Less => "Less",
            BinaryOpType::Greater => "Greater",
            BinaryOpType::LessEqual => "LessEqual",
            BinaryOpType::GreaterEqual => "GreaterEqual",
            BinaryOpType::And => "And",
            BinaryOpType::Or => "Or",
        })
    }
}
