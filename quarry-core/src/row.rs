use crate::Value;
use std::sync::Arc;

/// Outcome of a statement that modifies rows.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    pub rows_affected: u64,
    /// Identifier generated by the last insert, when the provider reports one.
    pub last_affected_id: Option<i64>,
}

/// Shared column name list of a result set.
pub type RowNames = Arc<[String]>;
/// Values of one row, aligned with its [`RowNames`].
pub type Row = Box<[Value]>;

/// A result row with its column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    pub labels: RowNames,
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    /// Case sensitive lookup, the first column with the name wins.
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values[i])
    }
    /// Moves the value out of the row, leaving `NULL` in its place.
    pub fn take_column(&mut self, name: &str) -> Option<Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| std::mem::take(&mut self.values[i]))
    }
}

/// Items produced by [`crate::Executor::run`].
#[derive(Debug)]
pub enum QueryResult {
    Row(RowLabeled),
    Affected(RowsAffected),
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_affected_id.is_some() {
                self.last_affected_id = elem.last_affected_id;
            }
        }
    }
}

impl From<RowLabeled> for Row {
    fn from(value: RowLabeled) -> Self {
        value.values
    }
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowsAffected> for QueryResult {
    fn from(value: RowsAffected) -> Self {
        QueryResult::Affected(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_label() {
        let mut row = RowLabeled::new(
            ["Id".to_string(), "Name".to_string()].into(),
            [Value::Int64(Some(7)), Value::Varchar(Some("Bolt".into()))].into(),
        );
        assert_eq!(row.get_column("Id"), Some(&Value::Int64(Some(7))));
        assert_eq!(row.get_column("id"), None);
        assert_eq!(
            row.take_column("Name"),
            Some(Value::Varchar(Some("Bolt".into())))
        );
        assert_eq!(row.get_column("Name"), Some(&Value::Null));
    }

    #[test]
    fn affected_rows_add_up() {
        let mut total = RowsAffected::default();
        total.extend([
            RowsAffected {
                rows_affected: 2,
                last_affected_id: Some(4),
            },
            RowsAffected {
                rows_affected: 3,
                last_affected_id: None,
            },
        ]);
        assert_eq!(total.rows_affected, 5);
        assert_eq!(total.last_affected_id, Some(4));
    }
}
