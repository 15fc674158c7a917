use crate::{
    ColumnRef, Entity, Error, ErrorKind, Join, JoinType, Page, PropertyExpression, Query, Result,
    SqlWriter, StorageCommand, TableDescriptor, TableRef, TransactionType, UnionType,
};
use std::{mem, sync::Arc};

/// Construction progress of a [`QueryExpression`].
///
/// Calls must follow the logical clause order, a call targeting an earlier state than the
/// current one is out of order.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryState {
    #[default]
    Empty,
    Selected,
    Sourced,
    Joined,
    Filtered,
    Grouped,
    Sorted,
    Paginated,
    Compiled,
}

/// Fluent builder accumulating the clauses of a statement.
///
/// Misuse (an out of order call, a type without table) does not panic: the first error is
/// recorded and returned by [`QueryExpression::build`].
///
/// ```rust
/// # use quarry_core::*;
/// # const ID: ColumnRef = ColumnRef::new("ProductID", "Product", "");
/// # let product = Arc::new(TableDescriptor {
/// #     name: "Product",
/// #     columns: vec![ColumnDescriptor { column_ref: ID, ..Default::default() }],
/// #     ..Default::default()
/// # });
/// # use std::sync::Arc;
/// let query = QueryExpression::new()
///     .from_table(product)
///     .filter(ID.equal(355))
///     .build()
///     .unwrap();
/// let command = GenericSqlWriter::new().compile(&query).unwrap();
/// assert_eq!(command.parameters.len(), 1);
/// ```
#[derive(Default, Debug)]
pub struct QueryExpression {
    state: QueryState,
    query: Query,
    error: Option<Error>,
}

impl QueryExpression {
    pub fn new() -> Self {
        Self::default()
    }

    fn statement(kind: TransactionType, source: Result<Arc<TableDescriptor>>) -> Self {
        let mut result = Self::new();
        result.query.kind = kind;
        result.state = QueryState::Sourced;
        match source {
            Ok(source) => result.query.source = Some(source),
            Err(error) => result.fail(error),
        }
        result
    }

    /// Starts an `INSERT INTO` the table of `E`, rows are added with [`Self::values`].
    pub fn insert<E: Entity>() -> Self {
        Self::statement(TransactionType::Insert, E::describe())
    }

    /// Starts an `UPDATE` of the table of `E`, assignments are added with [`Self::set`].
    pub fn update<E: Entity>() -> Self {
        Self::statement(TransactionType::Update, E::describe())
    }

    pub fn delete<E: Entity>() -> Self {
        Self::statement(TransactionType::Delete, E::describe())
    }

    pub fn truncate<E: Entity>() -> Self {
        Self::statement(TransactionType::Truncate, E::describe())
    }

    /// Same as [`Self::insert`], [`Self::update`], [`Self::delete`] and [`Self::truncate`] for
    /// a table described at runtime.
    pub fn statement_on(kind: TransactionType, table: Arc<TableDescriptor>) -> Self {
        if kind == TransactionType::Select {
            return Self::new().from_table(table);
        }
        Self::statement(kind, Ok(table))
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    fn fail(&mut self, error: impl Into<Error>) {
        if self.error.is_none() {
            self.error = Some(error.into());
        }
    }

    fn transition(&mut self, call: &str, to: QueryState, repeatable: bool) -> bool {
        if self.state == QueryState::Compiled
            || self.state > to
            || (self.state == to && !repeatable)
        {
            let state = self.state;
            self.fail(ErrorKind::InvalidOperation(format!(
                "`{call}` cannot be called in the {state:?} state"
            )));
            return false;
        }
        self.state = to;
        true
    }

    fn require_kind(&mut self, call: &str, kind: TransactionType) -> bool {
        if self.query.kind != kind {
            let current = self.query.kind;
            self.fail(ErrorKind::InvalidOperation(format!(
                "`{call}` is not valid in a {current} statement"
            )));
            return false;
        }
        true
    }

    /// Appends expressions to the select list. An empty list selects every column of the source.
    pub fn select<I, A>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<PropertyExpression>,
    {
        if self.require_kind("select", TransactionType::Select)
            && self.transition("select", QueryState::Selected, true)
        {
            self.query
                .columns
                .extend(columns.into_iter().map(Into::into));
        }
        self
    }

    /// Selects every column of the source table.
    pub fn select_all(mut self) -> Self {
        if self.require_kind("select_all", TransactionType::Select) {
            self.transition("select_all", QueryState::Selected, true);
        }
        self
    }

    pub fn distinct(mut self) -> Self {
        if self.require_kind("distinct", TransactionType::Select)
            && self.state < QueryState::Compiled
        {
            self.query.distinct = true;
        }
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        if self.require_kind("limit", TransactionType::Select) && self.state < QueryState::Compiled
        {
            self.query.limit = Some(limit);
        }
        self
    }

    /// Reads from the table of `E`.
    pub fn from<E: Entity>(self) -> Self {
        match E::describe() {
            Ok(table) => self.from_table(table),
            Err(error) => {
                let mut result = self;
                result.fail(error);
                result
            }
        }
    }

    /// Reads from a table described at runtime.
    pub fn from_table(mut self, table: Arc<TableDescriptor>) -> Self {
        if self.require_kind("from", TransactionType::Select)
            && self.transition("from", QueryState::Sourced, false)
        {
            self.query.source = Some(table);
        }
        self
    }

    /// Joins the table of `E`, joins render in call order.
    pub fn join<E: Entity>(self, join_type: JoinType, on: impl Into<PropertyExpression>) -> Self {
        match E::describe() {
            Ok(table) => self.join_table(join_type, table.table_ref(), on),
            Err(error) => {
                let mut result = self;
                result.fail(error);
                result
            }
        }
    }

    pub fn join_table(
        mut self,
        join_type: JoinType,
        table: TableRef,
        on: impl Into<PropertyExpression>,
    ) -> Self {
        if self.state < QueryState::Sourced {
            self.fail(ErrorKind::invalid_operation("`join` requires a source table"));
            return self;
        }
        if self.require_kind("join", TransactionType::Select)
            && self.transition("join", QueryState::Joined, true)
        {
            let on = on.into();
            if join_type != JoinType::Cross && on.is_empty() {
                self.fail(ErrorKind::invalid_operation(format!(
                    "{} requires a predicate",
                    join_type.keyword()
                )));
                return self;
            }
            self.query.joins.push(Join {
                join_type,
                table,
                on,
            });
        }
        self
    }

    pub fn inner_join<E: Entity>(self, on: impl Into<PropertyExpression>) -> Self {
        self.join::<E>(JoinType::Inner, on)
    }

    pub fn left_join<E: Entity>(self, on: impl Into<PropertyExpression>) -> Self {
        self.join::<E>(JoinType::Left, on)
    }

    pub fn right_join<E: Entity>(self, on: impl Into<PropertyExpression>) -> Self {
        self.join::<E>(JoinType::Right, on)
    }

    pub fn full_join<E: Entity>(self, on: impl Into<PropertyExpression>) -> Self {
        self.join::<E>(JoinType::Full, on)
    }

    pub fn cross_join<E: Entity>(self) -> Self {
        self.join::<E>(JoinType::Cross, PropertyExpression::Empty)
    }

    /// Restricts the affected rows, repeated calls are combined with `AND`.
    #[doc(alias = "where")]
    pub fn filter(mut self, predicate: impl Into<PropertyExpression>) -> Self {
        if self.state < QueryState::Sourced {
            self.fail(ErrorKind::invalid_operation("`filter` requires a source table"));
            return self;
        }
        if self.transition("filter", QueryState::Filtered, true) {
            let condition = mem::take(&mut self.query.condition);
            self.query.condition = condition.and(predicate);
        }
        self
    }

    pub fn group_by<I, A>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<PropertyExpression>,
    {
        if self.require_kind("group_by", TransactionType::Select)
            && self.transition("group_by", QueryState::Grouped, true)
        {
            self.query
                .group_by
                .extend(columns.into_iter().map(Into::into));
        }
        self
    }

    /// Restricts the groups, repeated calls are combined with `AND`.
    pub fn having(mut self, predicate: impl Into<PropertyExpression>) -> Self {
        if self.require_kind("having", TransactionType::Select)
            && self.transition("having", QueryState::Grouped, true)
        {
            let having = mem::take(&mut self.query.having);
            self.query.having = having.and(predicate);
        }
        self
    }

    pub fn order_by<I, A>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<PropertyExpression>,
    {
        if self.require_kind("order_by", TransactionType::Select)
            && self.transition("order_by", QueryState::Sorted, true)
        {
            self.query
                .order_by
                .extend(expressions.into_iter().map(Into::into));
        }
        self
    }

    /// Keeps the rows numbered in `(min, max]` once sorted by `sort`.
    pub fn page<I, A>(mut self, min: u64, max: u64, sort: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<PropertyExpression>,
    {
        if self.require_kind("page", TransactionType::Select)
            && self.transition("page", QueryState::Paginated, false)
        {
            self.query.page = Some(Page {
                min,
                max,
                sort: sort.into_iter().map(Into::into).collect(),
            });
        }
        self
    }

    fn unite(mut self, union_type: UnionType, mut other: QueryExpression) -> Self {
        if self.state < QueryState::Sourced {
            self.fail(ErrorKind::invalid_operation("`union` requires a source table"));
            return self;
        }
        if !self.require_kind("union", TransactionType::Select) {
            return self;
        }
        match other.build() {
            Ok(query) => self.query.unions.push((union_type, query)),
            Err(error) => self.fail(error),
        }
        self
    }

    pub fn union(self, other: QueryExpression) -> Self {
        self.unite(UnionType::Union, other)
    }

    pub fn union_all(self, other: QueryExpression) -> Self {
        self.unite(UnionType::UnionAll, other)
    }

    /// Adds one row to an insert. The first row fixes the column list, the following rows must
    /// provide the same columns in the same order.
    pub fn values<I, A>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = (ColumnRef, A)>,
        A: Into<PropertyExpression>,
    {
        if !self.require_kind("values", TransactionType::Insert)
            || !self.transition("values", QueryState::Sourced, true)
        {
            return self;
        }
        let (columns, values): (Vec<_>, Vec<_>) = row
            .into_iter()
            .map(|(c, v)| (PropertyExpression::Column(c), v.into()))
            .unzip();
        if self.query.rows.is_empty() {
            self.query.columns = columns;
        } else if self.query.columns != columns {
            self.fail(ErrorKind::invalid_operation(
                "Every inserted row must provide the same columns",
            ));
            return self;
        }
        self.query.rows.push(values);
        self
    }

    /// Adds one `SET` assignment to an update.
    pub fn set(mut self, column: ColumnRef, value: impl Into<PropertyExpression>) -> Self {
        if self.require_kind("set", TransactionType::Update)
            && self.transition("set", QueryState::Sourced, true)
        {
            self.query.assignments.push((column, value.into()));
        }
        self
    }

    /// Finalizes the builder. The transition to [`QueryState::Compiled`] is one-way: a second
    /// call fails.
    pub fn build(&mut self) -> Result<Query> {
        if self.state == QueryState::Compiled {
            return Err(ErrorKind::invalid_operation("The query was already compiled").into());
        }
        self.state = QueryState::Compiled;
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        let mut query = mem::take(&mut self.query);
        if query.kind == TransactionType::Select && query.columns.is_empty() {
            let source = query.source()?;
            query.columns = source
                .columns
                .iter()
                .map(|c| PropertyExpression::Column(c.column_ref))
                .collect();
        }
        query.validate()?;
        Ok(query)
    }

    /// Builds and compiles in one step.
    pub fn to_command(&mut self, writer: &dyn SqlWriter) -> Result<StorageCommand> {
        writer.compile(&self.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnDescriptor, Property};

    const ID: ColumnRef = ColumnRef::new("ProductID", "Product", "");
    const NAME: ColumnRef = ColumnRef::new("Name", "Product", "");

    fn product() -> Arc<TableDescriptor> {
        Arc::new(TableDescriptor {
            type_name: "Product",
            name: "Product",
            columns: vec![
                ColumnDescriptor {
                    column_ref: ID,
                    identifier: true,
                    ..Default::default()
                },
                ColumnDescriptor {
                    column_ref: NAME,
                    ordinal: 1,
                    ..Default::default()
                },
            ],
            ..Default::default()
        })
    }

    fn invalid_operation(error: &Error) -> bool {
        matches!(
            error.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::InvalidOperation(..))
        )
    }

    #[test]
    fn expands_empty_select_list() {
        let query = QueryExpression::new()
            .from_table(product())
            .build()
            .expect("Valid query");
        assert_eq!(
            query.columns,
            vec![PropertyExpression::Column(ID), PropertyExpression::Column(NAME)]
        );
    }

    #[test]
    fn filters_are_combined() {
        let query = QueryExpression::new()
            .from_table(product())
            .filter(ID.greater(1))
            .filter(NAME.like("%bolt%"))
            .build()
            .expect("Valid query");
        assert!(matches!(
            query.condition,
            PropertyExpression::Binary {
                op: crate::BinaryOpType::And,
                ..
            }
        ));
    }

    #[test]
    fn out_of_order_calls_fail_at_build() {
        let mut builder = QueryExpression::new()
            .from_table(product())
            .order_by([NAME.asc()])
            .filter(ID.equal(1));
        assert_eq!(builder.state(), QueryState::Sorted);
        let error = builder.build().expect_err("filter after order_by");
        assert!(invalid_operation(&error));

        let error = QueryExpression::new()
            .from_table(product())
            .select([NAME])
            .build()
            .expect_err("select after from");
        assert!(invalid_operation(&error));
    }

    #[test]
    fn compiles_once() {
        let mut builder = QueryExpression::new().from_table(product());
        assert!(builder.build().is_ok());
        assert_eq!(builder.state(), QueryState::Compiled);
        let error = builder.build().expect_err("second build");
        assert!(invalid_operation(&error));
    }

    #[test]
    fn pagination_rules() {
        let error = QueryExpression::new()
            .from_table(product())
            .page(10, 10, [NAME.asc()])
            .build()
            .expect_err("min >= max");
        assert!(invalid_operation(&error));

        let error = QueryExpression::new()
            .from_table(product())
            .page(0, 10, Vec::<PropertyExpression>::new())
            .build()
            .expect_err("empty sort list");
        assert!(invalid_operation(&error));

        let query = QueryExpression::new()
            .from_table(product())
            .page(0, 10, [NAME.asc()])
            .build()
            .expect("Valid page");
        assert_eq!(query.page.map(|v| (v.min, v.max)), Some((0, 10)));
    }

    #[test]
    fn insert_rows_share_columns() {
        let error = QueryExpression::statement_on(TransactionType::Insert, product())
            .values([(ID, PropertyExpression::from(1)), (NAME, "a".into())])
            .values([(NAME, PropertyExpression::from("b"))])
            .build()
            .expect_err("mismatched rows");
        assert!(invalid_operation(&error));
    }

    #[test]
    fn update_requires_assignments() {
        let error = QueryExpression::statement_on(TransactionType::Update, product())
            .filter(ID.equal(1))
            .build()
            .expect_err("no assignments");
        assert!(invalid_operation(&error));
        let query = QueryExpression::statement_on(TransactionType::Update, product())
            .set(NAME, "renamed")
            .filter(ID.equal(1))
            .build()
            .expect("Valid update");
        assert_eq!(query.assignments.len(), 1);
    }
}
