use std::fmt::{self, Display, Formatter};

/// Functions a property expression can apply.
///
/// Writers resolve the rendered name through [`crate::SqlWriter::function_name`], falling back
/// to [`FunctionType::default_name`] when the dialect does not rename the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionType {
    Upper,
    Lower,
    Substr,
    Trim,
    Count,
    Sum,
    Avg,
    Max,
    Min,
    Length,
    Now,
    NewId,
}

impl FunctionType {
    /// Name used by dialects that do not override it.
    pub fn default_name(&self) -> Option<&'static str> {
        Some(match self {
            FunctionType::Upper => "UPPER",
            FunctionType::Lower => "LOWER",
            FunctionType::Substr => "SUBSTR",
            FunctionType::Trim => "TRIM",
            FunctionType::Count => "COUNT",
            FunctionType::Sum => "SUM",
            FunctionType::Avg => "AVG",
            FunctionType::Max => "MAX",
            FunctionType::Min => "MIN",
            FunctionType::Length => "LENGTH",
            FunctionType::Now => "CURRENT_TIMESTAMP",
            FunctionType::NewId => return None,
        })
    }

    /// Aggregates collapse rows, they are valid in `HAVING` and in grouped select lists.
    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            FunctionType::Count
                | FunctionType::Sum
                | FunctionType::Avg
                | FunctionType::Max
                | FunctionType::Min
        )
    }

    /// Rendered without parentheses when called without arguments.
    pub fn is_niladic(&self) -> bool {
        matches!(self, FunctionType::Now)
    }
}

impl FunctionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionType::Upper => "Upper",
            FunctionType::Lower => "Lower",
            FunctionType::Substr => "Substr",
            FunctionType::Trim => "Trim",
            FunctionType::Count => "Count",
            FunctionType::Sum => "Sum",
            FunctionType::Avg => "Avg",
            FunctionType::Max => "Max",
            FunctionType::Min => "Min",
            FunctionType::Length => "Length",
            FunctionType::Now => "Now",
            FunctionType::NewId => "NewId",
        }
    }
}

impl Display for FunctionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
