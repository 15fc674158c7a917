use crate::{AsValue, BinaryOpType, ColumnRef, FunctionType, Order, UnaryOpType, Value};
use std::{
    borrow::Cow,
    ops::{Add, BitAnd, BitOr, Div, Mul, Neg, Not, Rem, Sub},
    sync::atomic::{AtomicU64, Ordering},
};

static LITERAL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Composable expression tree over columns, literals and functions.
///
/// Trees are immutable once built: combinators consume their operands and return a new node.
/// Equal trees hash equally, so expressions can key maps (de-duplication, caches).
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyExpression {
    /// No expression, skipped by the writers where optional (`WHERE`, `HAVING`).
    #[default]
    Empty,
    Column(ColumnRef),
    /// Constant bound as a parameter, `alias` labels it inside a select list.
    Literal {
        value: Value,
        alias: String,
    },
    Function {
        function: FunctionType,
        args: Vec<PropertyExpression>,
    },
    Unary {
        op: UnaryOpType,
        arg: Box<PropertyExpression>,
    },
    Binary {
        op: BinaryOpType,
        lhs: Box<PropertyExpression>,
        rhs: Box<PropertyExpression>,
    },
    /// Sort specification, meaningful in `ORDER BY` and in the pagination sort list.
    Ordered {
        order: Order,
        expression: Box<PropertyExpression>,
    },
    Alias {
        expression: Box<PropertyExpression>,
        alias: Cow<'static, str>,
    },
    /// Parenthesized list, right hand side of `IN`.
    List(Vec<PropertyExpression>),
    /// `CASE WHEN .. THEN .. ELSE .. END`.
    Case {
        branches: Vec<(PropertyExpression, PropertyExpression)>,
        otherwise: Box<PropertyExpression>,
    },
    Asterisk,
}

impl PropertyExpression {
    /// Literal with a fresh synthetic alias.
    pub fn literal(value: impl AsValue) -> Self {
        let id = LITERAL_COUNTER.fetch_add(1, Ordering::Relaxed);
        PropertyExpression::Literal {
            value: value.as_value(),
            alias: format!("__literal{id}"),
        }
    }

    /// Untyped `NULL`, rendered inline.
    pub fn null() -> Self {
        Self::literal(Value::Null)
    }

    pub fn function<I, A>(function: FunctionType, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<PropertyExpression>,
    {
        PropertyExpression::Function {
            function,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn binary(
        op: BinaryOpType,
        lhs: impl Into<PropertyExpression>,
        rhs: impl Into<PropertyExpression>,
    ) -> Self {
        PropertyExpression::Binary {
            op,
            lhs: Box::new(lhs.into()),
            rhs: Box::new(rhs.into()),
        }
    }

    pub fn unary(op: UnaryOpType, arg: impl Into<PropertyExpression>) -> Self {
        PropertyExpression::Unary {
            op,
            arg: Box::new(arg.into()),
        }
    }

    pub fn list<I, A>(values: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<PropertyExpression>,
    {
        PropertyExpression::List(values.into_iter().map(Into::into).collect())
    }

    pub fn count_all() -> Self {
        PropertyExpression::Function {
            function: FunctionType::Count,
            args: vec![PropertyExpression::Asterisk],
        }
    }

    pub fn now() -> Self {
        PropertyExpression::Function {
            function: FunctionType::Now,
            args: Vec::new(),
        }
    }

    pub fn new_id() -> Self {
        PropertyExpression::Function {
            function: FunctionType::NewId,
            args: Vec::new(),
        }
    }

    /// Distinguishes an unset expression from one that legitimately holds a default value.
    pub fn is_empty(&self) -> bool {
        matches!(self, PropertyExpression::Empty)
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, PropertyExpression::Ordered { .. })
    }

    /// Combines two predicates with `AND`, an empty side yields the other one.
    pub fn and(self, rhs: impl Into<PropertyExpression>) -> Self {
        let rhs = rhs.into();
        match (self.is_empty(), rhs.is_empty()) {
            (true, _) => rhs,
            (_, true) => self,
            _ => Self::binary(BinaryOpType::And, self, rhs),
        }
    }

    /// Combines two predicates with `OR`, an empty side yields the other one.
    pub fn or(self, rhs: impl Into<PropertyExpression>) -> Self {
        let rhs = rhs.into();
        match (self.is_empty(), rhs.is_empty()) {
            (true, _) => rhs,
            (_, true) => self,
            _ => Self::binary(BinaryOpType::Or, self, rhs),
        }
    }

    /// The column this expression reads when it is a (possibly aliased or ordered) column.
    pub fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            PropertyExpression::Column(v) => Some(v),
            PropertyExpression::Ordered { expression, .. }
            | PropertyExpression::Alias { expression, .. } => expression.as_column(),
            _ => None,
        }
    }

    /// Name under which the value appears in a result set, if it has a stable one.
    pub fn label(&self) -> Option<&str> {
        match self {
            PropertyExpression::Column(v) => Some(v.name),
            PropertyExpression::Literal { alias, .. } => Some(alias),
            PropertyExpression::Alias { alias, .. } => Some(alias),
            PropertyExpression::Ordered { expression, .. } => expression.label(),
            _ => None,
        }
    }
}

/// Fluent combinators available on columns and expressions.
///
/// The comparison methods are spelled out (`equal`, `less`) so they do not collide with
/// [`PartialEq`] and [`PartialOrd`].
pub trait Property: Into<PropertyExpression> + Sized {
    fn equal(self, rhs: impl Into<PropertyExpression>) -> PropertyExpression {
        PropertyExpression::binary(BinaryOpType::Equal, self, rhs)
    }
    fn not_equal(self, rhs: impl Into<PropertyExpression>) -> PropertyExpression {
        PropertyExpression::binary(BinaryOpType::NotEqual, self, rhs)
    }
    fn less(self, rhs: impl Into<PropertyExpression>) -> PropertyExpression {
        PropertyExpression::binary(BinaryOpType::Less, self, rhs)
    }
    fn greater(self, rhs: impl Into<PropertyExpression>) -> PropertyExpression {
        PropertyExpression::binary(BinaryOpType::Greater, self, rhs)
    }
    fn less_equal(self, rhs: impl Into<PropertyExpression>) -> PropertyExpression {
        PropertyExpression::binary(BinaryOpType::LessEqual, self, rhs)
    }
    fn greater_equal(self, rhs: impl Into<PropertyExpression>) -> PropertyExpression {
        PropertyExpression::binary(BinaryOpType::GreaterEqual, self, rhs)
    }
    fn like(self, pattern: impl Into<PropertyExpression>) -> PropertyExpression {
        PropertyExpression::binary(BinaryOpType::Like, self, pattern)
    }
    fn not_like(self, pattern: impl Into<PropertyExpression>) -> PropertyExpression {
        PropertyExpression::binary(BinaryOpType::NotLike, self, pattern)
    }
    fn is_null(self) -> PropertyExpression {
        PropertyExpression::binary(BinaryOpType::Is, self, PropertyExpression::null())
    }
    fn is_not_null(self) -> PropertyExpression {
        PropertyExpression::binary(BinaryOpType::IsNot, self, PropertyExpression::null())
    }
    fn is_in<I, A>(self, values: I) -> PropertyExpression
    where
        I: IntoIterator<Item = A>,
        A: Into<PropertyExpression>,
    {
        PropertyExpression::binary(BinaryOpType::In, self, PropertyExpression::list(values))
    }
    fn asc(self) -> PropertyExpression {
        PropertyExpression::Ordered {
            order: Order::Asc,
            expression: Box::new(self.into()),
        }
    }
    fn desc(self) -> PropertyExpression {
        PropertyExpression::Ordered {
            order: Order::Desc,
            expression: Box::new(self.into()),
        }
    }
    fn alias(self, alias: impl Into<Cow<'static, str>>) -> PropertyExpression {
        PropertyExpression::Alias {
            expression: Box::new(self.into()),
            alias: alias.into(),
        }
    }
    fn upper(self) -> PropertyExpression {
        PropertyExpression::function(FunctionType::Upper, [self])
    }
    fn lower(self) -> PropertyExpression {
        PropertyExpression::function(FunctionType::Lower, [self])
    }
    fn trim(self) -> PropertyExpression {
        PropertyExpression::function(FunctionType::Trim, [self])
    }
    fn length(self) -> PropertyExpression {
        PropertyExpression::function(FunctionType::Length, [self])
    }
    /// One based start, like the SQL function.
    fn substr(self, start: i64, length: i64) -> PropertyExpression {
        PropertyExpression::Function {
            function: FunctionType::Substr,
            args: vec![
                self.into(),
                PropertyExpression::literal(start),
                PropertyExpression::literal(length),
            ],
        }
    }
    fn count(self) -> PropertyExpression {
        PropertyExpression::function(FunctionType::Count, [self])
    }
    fn sum(self) -> PropertyExpression {
        PropertyExpression::function(FunctionType::Sum, [self])
    }
    fn avg(self) -> PropertyExpression {
        PropertyExpression::function(FunctionType::Avg, [self])
    }
    fn max(self) -> PropertyExpression {
        PropertyExpression::function(FunctionType::Max, [self])
    }
    fn min(self) -> PropertyExpression {
        PropertyExpression::function(FunctionType::Min, [self])
    }
}

impl Property for PropertyExpression {}
impl Property for ColumnRef {}

impl<T: AsValue> From<T> for PropertyExpression {
    fn from(value: T) -> Self {
        PropertyExpression::literal(value)
    }
}

impl From<&str> for PropertyExpression {
    fn from(value: &str) -> Self {
        PropertyExpression::literal(value.to_string())
    }
}

impl From<ColumnRef> for PropertyExpression {
    fn from(value: ColumnRef) -> Self {
        PropertyExpression::Column(value)
    }
}

impl From<&ColumnRef> for PropertyExpression {
    fn from(value: &ColumnRef) -> Self {
        PropertyExpression::Column(*value)
    }
}

impl<R: Into<PropertyExpression>> BitAnd<R> for PropertyExpression {
    type Output = PropertyExpression;
    fn bitand(self, rhs: R) -> Self::Output {
        self.and(rhs)
    }
}

impl<R: Into<PropertyExpression>> BitOr<R> for PropertyExpression {
    type Output = PropertyExpression;
    fn bitor(self, rhs: R) -> Self::Output {
        self.or(rhs)
    }
}

impl Not for PropertyExpression {
    type Output = PropertyExpression;
    fn not(self) -> Self::Output {
        PropertyExpression::unary(UnaryOpType::Not, self)
    }
}

impl Neg for PropertyExpression {
    type Output = PropertyExpression;
    fn neg(self) -> Self::Output {
        PropertyExpression::unary(UnaryOpType::Negative, self)
    }
}

macro_rules! impl_arithmetic {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<R: Into<PropertyExpression>> $trait<R> for PropertyExpression {
            type Output = PropertyExpression;
            fn $method(self, rhs: R) -> Self::Output {
                PropertyExpression::binary($op, self, rhs)
            }
        }
        impl<R: Into<PropertyExpression>> $trait<R> for ColumnRef {
            type Output = PropertyExpression;
            fn $method(self, rhs: R) -> Self::Output {
                PropertyExpression::binary($op, self, rhs)
            }
        }
    };
}

impl_arithmetic!(Add, add, BinaryOpType::Addition);
impl_arithmetic!(Sub, sub, BinaryOpType::Subtraction);
impl_arithmetic!(Mul, mul, BinaryOpType::Multiplication);
impl_arithmetic!(Div, div, BinaryOpType::Division);
impl_arithmetic!(Rem, rem, BinaryOpType::Remainder);

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: ColumnRef = ColumnRef::new("Name", "Product", "");
    const PRICE: ColumnRef = ColumnRef::new("ListPrice", "Product", "");

    #[test]
    fn empty_sides_vanish() {
        let predicate = PropertyExpression::Empty & NAME.equal("bolt");
        assert!(matches!(
            predicate,
            PropertyExpression::Binary {
                op: BinaryOpType::Equal,
                ..
            }
        ));
        assert!((PropertyExpression::Empty | PropertyExpression::Empty).is_empty());
    }

    #[test]
    fn literals_keep_their_alias() {
        let literal = PropertyExpression::literal(10);
        let copy = literal.clone();
        assert_eq!(literal, copy);
        assert_ne!(literal, PropertyExpression::literal(10));
        assert!(literal.label().is_some_and(|v| v.starts_with("__literal")));
    }

    #[test]
    fn labels() {
        assert_eq!(NAME.asc().label(), Some("Name"));
        assert_eq!(PRICE.max().alias("top").label(), Some("top"));
        assert_eq!(PRICE.max().label(), None);
        assert_eq!((PRICE * 2).as_column(), None);
        assert_eq!(NAME.desc().as_column(), Some(&NAME));
    }
}
