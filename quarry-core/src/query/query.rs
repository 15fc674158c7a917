use crate::{
    ColumnRef, ErrorKind, Join, PropertyExpression, Result, TableDescriptor, TransactionType,
};
use std::sync::Arc;

/// Row window of a paginated select.
///
/// Rows are numbered from 1 following `sort`, the window keeps the rows numbered in
/// `(min, max]`: `min` rows are skipped and at most `max - min` are returned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Page {
    pub min: u64,
    pub max: u64,
    pub sort: Vec<PropertyExpression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnionType {
    Union,
    UnionAll,
}

impl UnionType {
    pub fn keyword(&self) -> &'static str {
        match self {
            UnionType::Union => "UNION",
            UnionType::UnionAll => "UNION ALL",
        }
    }
}

/// Immutable representation of a finished query.
///
/// Produced once by [`crate::QueryExpression::build`], it can be compiled by any
/// [`crate::SqlWriter`] any number of times, each compilation yields the same command.
#[derive(Default, Debug, Clone)]
pub struct Query {
    pub kind: TransactionType,
    pub distinct: bool,
    /// Maximum number of rows (`TOP` or `LIMIT` depending on the dialect).
    pub limit: Option<u64>,
    /// Select list, or the target columns of an insert.
    pub columns: Vec<PropertyExpression>,
    pub source: Option<Arc<TableDescriptor>>,
    pub joins: Vec<Join>,
    pub condition: PropertyExpression,
    pub group_by: Vec<PropertyExpression>,
    pub having: PropertyExpression,
    pub order_by: Vec<PropertyExpression>,
    pub page: Option<Page>,
    /// `SET` list of an update.
    pub assignments: Vec<(ColumnRef, PropertyExpression)>,
    /// Value rows of an insert, aligned with `columns`.
    pub rows: Vec<Vec<PropertyExpression>>,
    pub unions: Vec<(UnionType, Query)>,
}

impl Query {
    /// The source table, every statement needs one.
    pub fn source(&self) -> Result<&Arc<TableDescriptor>> {
        self.source.as_ref().ok_or_else(|| {
            let message = format!("The {} statement has no source table", self.kind);
            ErrorKind::InvalidOperation(message).into()
        })
    }

    /// Names of every table read: the source, the joined tables and the united queries.
    pub fn tables(&self) -> Vec<&str> {
        let mut result = Vec::new();
        if let Some(source) = &self.source {
            result.push(source.name);
        }
        result.extend(self.joins.iter().map(|v| v.table.name.as_ref()));
        for (_, query) in &self.unions {
            result.extend(query.tables());
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Checks the structural rules a writer relies on.
    pub fn validate(&self) -> Result<()> {
        self.source()?;
        let fail = |message: String| -> Result<()> {
            Err(ErrorKind::InvalidOperation(message).into())
        };
        if self.kind != TransactionType::Select
            && (!self.group_by.is_empty()
                || !self.having.is_empty()
                || !self.order_by.is_empty()
                || self.page.is_some()
                || !self.unions.is_empty())
        {
            return fail(format!(
                "Grouping, sorting, pagination and unions are only valid in a SELECT, not in {}",
                self.kind
            ));
        }
        if !self.having.is_empty() && self.group_by.is_empty() {
            return fail("HAVING requires a GROUP BY".into());
        }
        match self.kind {
            TransactionType::Select => {
                if self.columns.is_empty() {
                    return fail("The select list is empty".into());
                }
                if let Some(page) = &self.page {
                    if page.sort.is_empty() {
                        return fail("Pagination requires a sort list".into());
                    }
                    if page.min >= page.max {
                        return fail(format!(
                            "Pagination requires min < max, got min {} and max {}",
                            page.min, page.max
                        ));
                    }
                    if !self.unions.is_empty() {
                        return fail("Pagination cannot be combined with a union".into());
                    }
                }
                for (_, query) in &self.unions {
                    if query.kind != TransactionType::Select {
                        return fail("Only SELECT queries can be united".into());
                    }
                    if query.columns.len() != self.columns.len() {
                        return fail(format!(
                            "United queries must select the same number of columns, {} and {}",
                            self.columns.len(),
                            query.columns.len()
                        ));
                    }
                    query.validate()?;
                }
            }
            TransactionType::Insert => {
                if self.rows.is_empty() {
                    return fail("INSERT without rows".into());
                }
                if let Some(row) = self.rows.iter().find(|v| v.len() != self.columns.len()) {
                    return fail(format!(
                        "INSERT row has {} values for {} columns",
                        row.len(),
                        self.columns.len()
                    ));
                }
            }
            TransactionType::Update => {
                if self.assignments.is_empty() {
                    return fail("UPDATE without assignments".into());
                }
            }
            TransactionType::Delete | TransactionType::Truncate => {}
        }
        Ok(())
    }

    /// Columns and joins require qualified names when more than one table is involved.
    pub fn qualify_columns(&self) -> bool {
        !self.joins.is_empty()
    }
}
