use std::fmt::{self, Display, Formatter};

/// Kind of statement a query or a command performs.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
    Truncate,
}

impl TransactionType {
    /// Classifies a command by its first keyword.
    pub fn from_sql(text: &str) -> Option<Self> {
        let keyword = text
            .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()?;
        let check = |v: &str| keyword.eq_ignore_ascii_case(v);
        Some(if check("SELECT") || check("WITH") {
            TransactionType::Select
        } else if check("INSERT") {
            TransactionType::Insert
        } else if check("UPDATE") {
            TransactionType::Update
        } else if check("DELETE") {
            TransactionType::Delete
        } else if check("TRUNCATE") {
            TransactionType::Truncate
        } else {
            return None;
        })
    }

    /// The statement changes stored rows.
    pub fn is_write(&self) -> bool {
        *self != TransactionType::Select
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionType::Select => "SELECT",
            TransactionType::Insert => "INSERT",
            TransactionType::Update => "UPDATE",
            TransactionType::Delete => "DELETE",
            TransactionType::Truncate => "TRUNCATE",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_keyword() {
        assert_eq!(
            TransactionType::from_sql("  select 1"),
            Some(TransactionType::Select)
        );
        assert_eq!(
            TransactionType::from_sql("(SELECT 1) UNION (SELECT 2)"),
            Some(TransactionType::Select)
        );
        assert_eq!(
            TransactionType::from_sql("TRUNCATE TABLE \"Product\";"),
            Some(TransactionType::Truncate)
        );
        assert_eq!(
            TransactionType::from_sql("DELETE FROM x"),
            Some(TransactionType::Delete)
        );
        assert_eq!(TransactionType::from_sql("PRAGMA foreign_keys"), None);
        assert_eq!(TransactionType::from_sql(""), None);
    }
}
