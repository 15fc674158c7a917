use crate::{PropertyExpression, TableRef};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL OUTER JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// One joined table, rendered after the source in call order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    /// Join predicate, empty for cross joins.
    pub on: PropertyExpression,
}
