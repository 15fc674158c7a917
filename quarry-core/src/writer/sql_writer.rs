use crate::{
    BinaryOpType, ColumnDescriptor, ColumnRef, CommandKind, ErrorKind, FunctionType,
    IsolationLevel, Join, JoinType, OpPrecedence, Order, Page, PropertyExpression, Query, Result,
    StorageCommand, TableDescriptor, TableRef, TransactionType, UnaryOpType, Value,
    possibly_parenthesized, separated_by, try_separated_by,
    writer::{Context, Fragment},
};
use std::fmt::Write;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}

/// Label of the row number computed by the pagination window.
pub const ROW_NUMBER_LABEL: &str = "__row_number";
/// Alias of the derived table wrapped by pagination.
pub const PAGED_LABEL: &str = "__paged";

/// Positional label of the `index`-th select item inside the paged derived table.
fn paged_column_label(index: usize) -> String {
    format!("__column{index}")
}

/// Dialect printer converting a [`Query`] into a [`StorageCommand`].
///
/// Every method has a default implementation producing ANSI flavored SQL, a dialect overrides
/// the few methods where it differs. The trait is object safe, sessions hold `&dyn SqlWriter`.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Name used in errors and logs.
    fn dialect(&self) -> &'static str;

    /// First character of the parameter names.
    fn parameter_prefix(&self) -> &'static str {
        "@"
    }

    fn supports_pagination(&self) -> bool {
        true
    }

    fn supports_union(&self) -> bool {
        true
    }

    /// `INSERT .. VALUES (..), (..)` with more than one row.
    fn supports_multi_row_insert(&self) -> bool {
        true
    }

    /// `TRUNCATE TABLE`, dialects without it delete every row instead.
    fn supports_truncate(&self) -> bool {
        true
    }

    fn supports_join(&self, _join_type: JoinType) -> bool {
        true
    }

    /// Row limit rendered as `SELECT TOP n` instead of a trailing `LIMIT n`.
    fn uses_top(&self) -> bool {
        false
    }

    /// Dialect specific name of a function, `None` to use the default one.
    fn dialect_function_name(&self, _function: FunctionType) -> Option<&'static str> {
        None
    }

    /// Rendered function name, the dialect table first then the default table.
    fn function_name(&self, function: FunctionType) -> Result<&'static str> {
        self.dialect_function_name(function)
            .or_else(|| function.default_name())
            .ok_or_else(|| {
                ErrorKind::UnsupportedFunction {
                    function: function.as_str(),
                    dialect: self.dialect(),
                }
                .into()
            })
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    /// Render a table reference with optional alias.
    fn write_table_ref(&self, context: &mut Context, out: &mut String, value: &TableRef) {
        if !value.schema.is_empty() {
            self.write_identifier_quoted(context, out, &value.schema);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, &value.name);
        if !value.alias.is_empty() {
            out.push(' ');
            self.write_identifier_quoted(context, out, &value.alias);
        }
    }

    /// Render a column reference optionally qualifying with schema/table.
    fn write_column_ref(&self, context: &mut Context, out: &mut String, value: &ColumnRef) {
        if context.qualify_columns && !value.table.is_empty() {
            if !value.schema.is_empty() {
                self.write_identifier_quoted(context, out, value.schema);
                out.push('.');
            }
            self.write_identifier_quoted(context, out, value.table);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, value.name);
    }

    /// Render the SQL type for a `Value` prototype, `size` bounds the text types.
    fn write_column_type(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &Value,
        size: Option<u32>,
    ) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int8(..) => out.push_str("TINYINT"),
            Value::Int16(..) => out.push_str("SMALLINT"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::UInt8(..) => out.push_str("SMALLINT"),
            Value::UInt16(..) => out.push_str("INTEGER"),
            Value::UInt32(..) => out.push_str("BIGINT"),
            Value::UInt64(..) => out.push_str("NUMERIC(20)"),
            Value::Float32(..) => out.push_str("REAL"),
            Value::Float64(..) => out.push_str("DOUBLE PRECISION"),
            Value::Decimal(.., precision, scale) => {
                out.push_str("DECIMAL");
                if (precision, scale) != (&0, &0) {
                    let _ = write!(out, "({},{})", precision, scale);
                }
            }
            Value::Char(..) => out.push_str("CHAR(1)"),
            Value::Varchar(..) => match size {
                Some(size) => {
                    out.push_str("VARCHAR(");
                    write_integer!(out, size);
                    out.push(')');
                }
                None => out.push_str("VARCHAR"),
            },
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Time(..) => out.push_str("TIME"),
            Value::Timestamp(..) => out.push_str("TIMESTAMP"),
            Value::TimestampWithTimezone(..) => out.push_str("TIMESTAMP WITH TIME ZONE"),
            Value::Uuid(..) => out.push_str("UUID"),
            Value::Null | Value::Unknown(..) => {
                log::error!("Cannot derive a column type from {:?}", value);
            }
        };
    }

    /// Render the placeholder of a bound parameter.
    fn write_parameter_placeholder(&self, _context: &mut Context, out: &mut String, name: &str) {
        out.push_str(name);
    }

    /// Bind a value and render its placeholder.
    fn write_parameter(&self, context: &mut Context, out: &mut String, value: &Value) {
        let name = context.bind(self.parameter_prefix(), value.clone());
        self.write_parameter_placeholder(context, out, &name);
    }

    /// Precedence table for unary operators.
    fn expression_unary_op_precedence(&self, value: &UnaryOpType) -> i32 {
        match value {
            UnaryOpType::Negative => 1250,
            UnaryOpType::Not => 250,
        }
    }

    /// Precedence table for binary operators.
    fn expression_binary_op_precedence(&self, value: &BinaryOpType) -> i32 {
        match value {
            BinaryOpType::Or => 100,
            BinaryOpType::And => 200,
            BinaryOpType::Equal => 300,
            BinaryOpType::NotEqual => 300,
            BinaryOpType::Less => 300,
            BinaryOpType::Greater => 300,
            BinaryOpType::LessEqual => 300,
            BinaryOpType::GreaterEqual => 300,
            BinaryOpType::Is => 400,
            BinaryOpType::IsNot => 400,
            BinaryOpType::Like => 400,
            BinaryOpType::NotLike => 400,
            BinaryOpType::In => 400,
            BinaryOpType::Subtraction => 800,
            BinaryOpType::Addition => 800,
            BinaryOpType::Multiplication => 900,
            BinaryOpType::Division => 900,
            BinaryOpType::Remainder => 900,
        }
    }

    /// Render any expression node.
    fn write_expression(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &PropertyExpression,
    ) -> Result<()> {
        match value {
            PropertyExpression::Empty => {
                return Err(ErrorKind::InvalidPropertyExpression(
                    "An empty expression cannot be rendered here".into(),
                )
                .into());
            }
            PropertyExpression::Column(v) => self.write_column_ref(context, out, v),
            PropertyExpression::Literal { value, .. } => {
                self.write_expression_literal(context, out, value)
            }
            PropertyExpression::Function { function, args } => {
                self.write_expression_function(context, out, *function, args)?
            }
            PropertyExpression::Unary { op, arg } => {
                self.write_expression_unary_op(context, out, *op, arg)?
            }
            PropertyExpression::Binary { op, lhs, rhs } => {
                self.write_expression_binary_op(context, out, *op, lhs, rhs)?
            }
            PropertyExpression::Ordered { order, expression } => {
                self.write_expression_ordered(context, out, *order, expression)?
            }
            // The alias is declared by the select list only
            PropertyExpression::Alias { expression, .. } => {
                self.write_expression(context, out, expression)?
            }
            PropertyExpression::List(values) => {
                out.push('(');
                if values.is_empty() {
                    out.push_str("NULL");
                }
                try_separated_by(
                    out,
                    values,
                    |out, v| self.write_expression(context, out, v),
                    ", ",
                )?;
                out.push(')');
            }
            PropertyExpression::Case {
                branches,
                otherwise,
            } => self.write_expression_case(context, out, branches, otherwise)?,
            PropertyExpression::Asterisk => out.push('*'),
        };
        Ok(())
    }

    /// Render a literal, bound as a parameter except the untyped `NULL`.
    fn write_expression_literal(&self, context: &mut Context, out: &mut String, value: &Value) {
        if matches!(value, Value::Null) {
            out.push_str("NULL");
        } else {
            self.write_parameter(context, out, value);
        }
    }

    /// Render a function call.
    fn write_expression_function(
        &self,
        context: &mut Context,
        out: &mut String,
        function: FunctionType,
        args: &[PropertyExpression],
    ) -> Result<()> {
        let name = self.function_name(function)?;
        out.push_str(name);
        if args.is_empty() && function.is_niladic() && function.default_name() == Some(name) {
            return Ok(());
        }
        out.push('(');
        try_separated_by(
            out,
            args,
            |out, v| self.write_expression(context, out, v),
            ", ",
        )?;
        out.push(')');
        Ok(())
    }

    /// Render unary operator expression.
    fn write_expression_unary_op(
        &self,
        context: &mut Context,
        out: &mut String,
        op: UnaryOpType,
        arg: &PropertyExpression,
    ) -> Result<()> {
        match op {
            UnaryOpType::Negative => out.push('-'),
            UnaryOpType::Not => out.push_str("NOT "),
        };
        possibly_parenthesized!(
            out,
            arg.precedence(self.as_dyn()) <= self.expression_unary_op_precedence(&op),
            self.write_expression(context, out, arg)?
        );
        Ok(())
    }

    /// Render binary operator expression handling precedence / parenthesis.
    fn write_expression_binary_op(
        &self,
        context: &mut Context,
        out: &mut String,
        op: BinaryOpType,
        lhs: &PropertyExpression,
        rhs: &PropertyExpression,
    ) -> Result<()> {
        let infix = match op {
            BinaryOpType::Multiplication => " * ",
            BinaryOpType::Division => " / ",
            BinaryOpType::Remainder => " % ",
            BinaryOpType::Addition => " + ",
            BinaryOpType::Subtraction => " - ",
            BinaryOpType::Is => " IS ",
            BinaryOpType::IsNot => " IS NOT ",
            BinaryOpType::Like => " LIKE ",
            BinaryOpType::NotLike => " NOT LIKE ",
            BinaryOpType::In => " IN ",
            BinaryOpType::Equal => " = ",
            BinaryOpType::NotEqual => " <> ",
            BinaryOpType::Less => " < ",
            BinaryOpType::LessEqual => " <= ",
            BinaryOpType::Greater => " > ",
            BinaryOpType::GreaterEqual => " >= ",
            BinaryOpType::And => " AND ",
            BinaryOpType::Or => " OR ",
        };
        let precedence = self.expression_binary_op_precedence(&op);
        possibly_parenthesized!(
            out,
            lhs.precedence(self.as_dyn()) < precedence,
            self.write_expression(context, out, lhs)?
        );
        out.push_str(infix);
        let column = match lhs.as_column() {
            Some(column) if op.is_comparison() => column.name,
            _ => context.column,
        };
        let mut context = context.bind_column(column);
        possibly_parenthesized!(
            out,
            op != BinaryOpType::In && rhs.precedence(self.as_dyn()) <= precedence,
            self.write_expression(&mut context, out, rhs)?
        );
        Ok(())
    }

    /// Render ordered expression, the direction only appears inside sort lists.
    fn write_expression_ordered(
        &self,
        context: &mut Context,
        out: &mut String,
        order: Order,
        expression: &PropertyExpression,
    ) -> Result<()> {
        self.write_expression(context, out, expression)?;
        if context.fragment == Fragment::SqlSelectOrderBy {
            out.push(' ');
            out.push_str(order.keyword());
        }
        Ok(())
    }

    /// Render `CASE WHEN .. THEN .. ELSE .. END`.
    fn write_expression_case(
        &self,
        context: &mut Context,
        out: &mut String,
        branches: &[(PropertyExpression, PropertyExpression)],
        otherwise: &PropertyExpression,
    ) -> Result<()> {
        out.push_str("CASE");
        for (condition, value) in branches {
            out.push_str(" WHEN ");
            self.write_expression(context, out, condition)?;
            out.push_str(" THEN ");
            self.write_expression(context, out, value)?;
        }
        if !otherwise.is_empty() {
            out.push_str(" ELSE ");
            self.write_expression(context, out, otherwise)?;
        }
        out.push_str(" END");
        Ok(())
    }

    /// Render one element of a select list, `index` forces a label on unnamed expressions.
    fn write_select_item(
        &self,
        context: &mut Context,
        out: &mut String,
        value: &PropertyExpression,
        index: Option<usize>,
    ) -> Result<()> {
        // Inside a paged select every item takes a positional label, the outer select
        // restores the visible one. Joined tables can share column names.
        if let Some(index) = index {
            let mut expression = value;
            while let PropertyExpression::Alias { expression: inner, .. }
            | PropertyExpression::Ordered { expression: inner, .. } = expression
            {
                expression = &**inner;
            }
            self.write_expression(context, out, expression)?;
            if !matches!(expression, PropertyExpression::Asterisk) {
                out.push_str(" AS ");
                self.write_identifier_quoted(context, out, &paged_column_label(index));
            }
            return Ok(());
        }
        match value {
            PropertyExpression::Alias { expression, alias } => {
                self.write_expression(context, out, expression)?;
                out.push_str(" AS ");
                self.write_identifier_quoted(context, out, alias);
            }
            PropertyExpression::Literal { alias, .. } => {
                self.write_expression(context, out, value)?;
                out.push_str(" AS ");
                self.write_identifier_quoted(context, out, alias);
            }
            PropertyExpression::Ordered { expression, .. } => {
                self.write_select_item(context, out, expression, None)?;
            }
            _ => self.write_expression(context, out, value)?,
        }
        Ok(())
    }

    /// Render join keyword(s) for the given join type.
    fn write_join_type(
        &self,
        _context: &mut Context,
        out: &mut String,
        join_type: JoinType,
    ) -> Result<()> {
        if !self.supports_join(join_type) {
            return Err(ErrorKind::unsupported_operation(join_type.keyword(), self.dialect()).into());
        }
        out.push_str(join_type.keyword());
        Ok(())
    }

    /// Render a JOIN clause.
    fn write_join(&self, context: &mut Context, out: &mut String, join: &Join) -> Result<()> {
        let mut context = context.switch_fragment(Fragment::SqlJoin);
        self.write_join_type(&mut context, out, join.join_type)?;
        out.push(' ');
        self.write_table_ref(&mut context, out, &join.table);
        if !join.on.is_empty() {
            out.push_str(" ON ");
            self.write_expression(&mut context, out, &join.on)?;
        }
        Ok(())
    }

    /// Render the source table followed by its joins.
    fn write_from(
        &self,
        context: &mut Context,
        out: &mut String,
        source: &TableRef,
        joins: &[Join],
    ) -> Result<()> {
        self.write_table_ref(context, out, source);
        for join in joins {
            out.push('\n');
            self.write_join(context, out, join)?;
        }
        Ok(())
    }

    /// Render `TOP n` right after `SELECT` for the dialects using it.
    fn write_limit_prefix(&self, _context: &mut Context, out: &mut String, limit: Option<u64>) {
        if let Some(limit) = limit
            && self.uses_top()
        {
            out.push_str("TOP ");
            write_integer!(out, limit);
            out.push(' ');
        }
    }

    /// Render `LIMIT n` at the end of the statement for the dialects using it.
    fn write_limit_suffix(&self, _context: &mut Context, out: &mut String, limit: Option<u64>) {
        if let Some(limit) = limit
            && !self.uses_top()
        {
            out.push_str("\nLIMIT ");
            write_integer!(out, limit);
        }
    }

    /// Emit SELECT statement including unions and pagination.
    fn write_select(&self, context: &mut Context, out: &mut String, query: &Query) -> Result<()> {
        if let Some(page) = &query.page {
            return self.write_select_paged(context, out, query, page);
        }
        if !query.unions.is_empty() && !self.supports_union() {
            return Err(ErrorKind::unsupported_operation("UNION", self.dialect()).into());
        }
        self.write_select_body(context, out, query, None)?;
        for (union_type, other) in &query.unions {
            out.push('\n');
            out.push_str(union_type.keyword());
            out.push('\n');
            let qualify_columns = context.qualify_columns;
            context.qualify_columns = other.qualify_columns();
            let result = self.write_select_body(context, out, other, None);
            context.qualify_columns = qualify_columns;
            result?;
        }
        Ok(())
    }

    /// Emit one SELECT, `window` adds the row number column used by pagination and leaves out
    /// the clauses the outer query renders.
    fn write_select_body(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &Query,
        window: Option<&Page>,
    ) -> Result<()> {
        let source = query.source()?;
        out.push_str("SELECT ");
        if window.is_none() {
            if query.distinct {
                out.push_str("DISTINCT ");
            }
            self.write_limit_prefix(context, out, query.limit);
        }
        {
            let mut context = context.switch_fragment(Fragment::SqlSelect);
            try_separated_by(
                out,
                query.columns.iter().enumerate(),
                |out, (i, v)| self.write_select_item(&mut context, out, v, window.map(|_| i)),
                ", ",
            )?;
            if let Some(page) = window {
                out.push_str(", ROW_NUMBER() OVER (ORDER BY ");
                let mut context = context.switch_fragment(Fragment::SqlSelectOrderBy);
                try_separated_by(
                    out,
                    &page.sort,
                    |out, v| self.write_expression(&mut context, out, v),
                    ", ",
                )?;
                out.push_str(") AS ");
                self.write_identifier_quoted(&mut context, out, ROW_NUMBER_LABEL);
            }
        }
        out.push_str("\nFROM ");
        self.write_from(
            &mut context.switch_fragment(Fragment::SqlSelectFrom),
            out,
            &source.table_ref(),
            &query.joins,
        )?;
        if !query.condition.is_empty() {
            out.push_str("\nWHERE ");
            let mut context = context.switch_fragment(Fragment::SqlSelectWhere);
            self.write_expression(&mut context, out, &query.condition)?;
        }
        if !query.group_by.is_empty() {
            out.push_str("\nGROUP BY ");
            let mut context = context.switch_fragment(Fragment::SqlSelectGroupBy);
            try_separated_by(
                out,
                &query.group_by,
                |out, v| self.write_expression(&mut context, out, v),
                ", ",
            )?;
        }
        if !query.having.is_empty() {
            out.push_str("\nHAVING ");
            let mut context = context.switch_fragment(Fragment::SqlSelectHaving);
            self.write_expression(&mut context, out, &query.having)?;
        }
        if window.is_none() {
            if !query.order_by.is_empty() {
                out.push_str("\nORDER BY ");
                let mut context = context.switch_fragment(Fragment::SqlSelectOrderBy);
                try_separated_by(
                    out,
                    &query.order_by,
                    |out, v| self.write_expression(&mut context, out, v),
                    ", ",
                )?;
            }
            self.write_limit_suffix(context, out, query.limit);
        }
        Ok(())
    }

    /// Emit a paginated SELECT: the query numbered by a window function wrapped in an outer
    /// select keeping the rows in `(min, max]`.
    fn write_select_paged(
        &self,
        context: &mut Context,
        out: &mut String,
        query: &Query,
        page: &Page,
    ) -> Result<()> {
        if !self.supports_pagination() {
            return Err(ErrorKind::PaginationNotSupported {
                dialect: self.dialect(),
            }
            .into());
        }
        out.push_str("SELECT ");
        if query.distinct {
            out.push_str("DISTINCT ");
        }
        self.write_limit_prefix(context, out, query.limit);
        for (i, column) in query.columns.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let inner = paged_column_label(i);
            self.write_identifier_quoted(context, out, &inner);
            match column.label() {
                Some(label) if label != inner => {
                    out.push_str(" AS ");
                    self.write_identifier_quoted(context, out, label);
                }
                _ => {}
            }
        }
        out.push_str("\nFROM (");
        self.write_select_body(context, out, query, Some(page))?;
        out.push_str(") AS ");
        self.write_identifier_quoted(context, out, PAGED_LABEL);
        out.push_str("\nWHERE ");
        self.write_identifier_quoted(context, out, ROW_NUMBER_LABEL);
        out.push_str(" > ");
        write_integer!(out, page.min);
        out.push_str(" AND ");
        self.write_identifier_quoted(context, out, ROW_NUMBER_LABEL);
        out.push_str(" <= ");
        write_integer!(out, page.max);
        out.push_str("\nORDER BY ");
        self.write_identifier_quoted(context, out, ROW_NUMBER_LABEL);
        self.write_limit_suffix(context, out, query.limit);
        Ok(())
    }

    /// Emit INSERT with one or more rows.
    fn write_insert(&self, context: &mut Context, out: &mut String, query: &Query) -> Result<()> {
        if query.rows.len() > 1 && !self.supports_multi_row_insert() {
            return Err(
                ErrorKind::unsupported_operation("Multi row INSERT", self.dialect()).into(),
            );
        }
        let source = query.source()?;
        let columns = query
            .columns
            .iter()
            .map(|v| {
                v.as_column().map(|c| c.name).ok_or_else(|| {
                    ErrorKind::InvalidPropertyExpression(format!(
                        "INSERT targets must be columns, found {v:?}"
                    ))
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        out.push_str("INSERT INTO ");
        let mut context = context.switch_fragment(Fragment::SqlInsertInto);
        self.write_table_ref(&mut context, out, &source.table_ref());
        if columns.is_empty() {
            out.push_str(" DEFAULT VALUES");
            return Ok(());
        }
        out.push_str(" (");
        separated_by(
            out,
            &columns,
            |out, v| self.write_identifier_quoted(&mut context, out, v),
            ", ",
        );
        out.push_str(")\nVALUES\n");
        let mut context = context.switch_fragment(Fragment::SqlInsertIntoValues);
        try_separated_by(
            out,
            &query.rows,
            |out, row| {
                out.push('(');
                try_separated_by(
                    out,
                    columns.iter().zip(row),
                    |out, (column, value)| {
                        self.write_expression(&mut context.bind_column(*column), out, value)
                    },
                    ", ",
                )?;
                out.push(')');
                Ok(())
            },
            ",\n",
        )
    }

    /// Emit UPDATE with its SET list and WHERE clause.
    fn write_update(&self, context: &mut Context, out: &mut String, query: &Query) -> Result<()> {
        let source = query.source()?;
        out.push_str("UPDATE ");
        let mut context = context.switch_fragment(Fragment::SqlUpdate);
        self.write_table_ref(&mut context, out, &source.table_ref());
        out.push_str(" SET\n");
        {
            let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
            try_separated_by(
                out,
                &query.assignments,
                |out, (column, value)| {
                    self.write_identifier_quoted(&mut context, out, column.name);
                    out.push_str(" = ");
                    self.write_expression(&mut context.bind_column(column.name), out, value)
                },
                ",\n",
            )?;
        }
        if !query.condition.is_empty() {
            out.push_str("\nWHERE ");
            let mut context = context.switch_fragment(Fragment::SqlUpdateWhere);
            self.write_expression(&mut context, out, &query.condition)?;
        }
        Ok(())
    }

    /// Emit DELETE statement with WHERE clause.
    fn write_delete(&self, context: &mut Context, out: &mut String, query: &Query) -> Result<()> {
        let source = query.source()?;
        out.push_str("DELETE FROM ");
        let mut context = context.switch_fragment(Fragment::SqlDeleteFrom);
        self.write_table_ref(&mut context, out, &source.table_ref());
        if !query.condition.is_empty() {
            out.push_str("\nWHERE ");
            let mut context = context.switch_fragment(Fragment::SqlDeleteFromWhere);
            self.write_expression(&mut context, out, &query.condition)?;
        }
        Ok(())
    }

    /// Emit TRUNCATE TABLE, or an unconditional DELETE where truncation is missing.
    fn write_truncate(&self, context: &mut Context, out: &mut String, query: &Query) -> Result<()> {
        let source = query.source()?;
        let mut context = context.switch_fragment(Fragment::SqlTruncate);
        out.push_str(if self.supports_truncate() {
            "TRUNCATE TABLE "
        } else {
            "DELETE FROM "
        });
        self.write_table_ref(&mut context, out, &source.table_ref());
        Ok(())
    }

    /// Emit the statement starting a transaction.
    fn write_transaction_begin(&self, out: &mut String, isolation: IsolationLevel) {
        out.push_str("START TRANSACTION ISOLATION LEVEL ");
        out.push_str(isolation.sql());
        out.push(';');
    }

    /// Emit COMMIT statement.
    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT;");
    }

    /// Emit ROLLBACK statement.
    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK;");
    }

    /// Render the identity clause of an auto increment column.
    fn write_column_auto_increment(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" GENERATED BY DEFAULT AS IDENTITY");
    }

    /// Emit CREATE TABLE with columns and primary key.
    fn write_create_table(
        &self,
        out: &mut String,
        table: &TableDescriptor,
        if_not_exists: bool,
    ) -> Result<()> {
        let mut context = Context::new(Fragment::SqlCreateTable, TransactionType::Select, false);
        out.reserve(128 + table.columns.len() * 64);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("CREATE TABLE ");
        if if_not_exists {
            out.push_str("IF NOT EXISTS ");
        }
        self.write_table_ref(&mut context, out, &table.table_ref());
        out.push_str(" (\n");
        let inline_key = table.identifiers().count() == 1;
        try_separated_by(
            out,
            &table.columns,
            |out, v| {
                self.write_create_table_column_fragment(
                    &mut context,
                    out,
                    v,
                    inline_key && v.identifier,
                )
            },
            ",\n",
        )?;
        if !inline_key && table.identifiers().next().is_some() {
            out.push_str(",\nPRIMARY KEY (");
            separated_by(
                out,
                table.identifiers(),
                |out, v| self.write_identifier_quoted(&mut context, out, v.name()),
                ", ",
            );
            out.push(')');
        }
        out.push_str(");");
        Ok(())
    }

    /// Emit single column definition fragment.
    fn write_create_table_column_fragment(
        &self,
        context: &mut Context,
        out: &mut String,
        column: &ColumnDescriptor,
        primary_key: bool,
    ) -> Result<()> {
        self.write_identifier_quoted(context, out, column.name());
        out.push(' ');
        if !column.column_type.is_empty() {
            out.push_str(column.column_type);
        } else {
            self.write_column_type(context, out, &column.value, column.size);
        }
        if primary_key {
            out.push_str(" PRIMARY KEY");
        } else if !column.nullable {
            out.push_str(" NOT NULL");
        }
        if column.auto_increment {
            self.write_column_auto_increment(context, out);
        }
        if let Some(expression) = column.expression {
            if column.computed {
                let _ = write!(out, " GENERATED ALWAYS AS ({expression})");
            } else {
                let _ = write!(out, " DEFAULT {expression}");
            }
        }
        Ok(())
    }

    /// Emit DROP TABLE statement.
    fn write_drop_table(&self, out: &mut String, table: &TableDescriptor, if_exists: bool) {
        let mut context = Context::new(Fragment::SqlDropTable, TransactionType::Select, false);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("DROP TABLE ");
        if if_exists {
            out.push_str("IF EXISTS ");
        }
        self.write_table_ref(&mut context, out, &table.table_ref());
        out.push(';');
    }

    /// Compile a query into command text and parameters.
    ///
    /// Compilation is pure: the same query always produces the same command.
    fn compile(&self, query: &Query) -> Result<StorageCommand> {
        query.validate()?;
        let mut context = Context::new(Fragment::None, query.kind, query.qualify_columns());
        let mut out = String::with_capacity(128 + query.columns.len() * 32);
        match query.kind {
            TransactionType::Select => self.write_select(&mut context, &mut out, query)?,
            TransactionType::Insert => self.write_insert(&mut context, &mut out, query)?,
            TransactionType::Update => self.write_update(&mut context, &mut out, query)?,
            TransactionType::Delete => self.write_delete(&mut context, &mut out, query)?,
            TransactionType::Truncate => self.write_truncate(&mut context, &mut out, query)?,
        }
        out.push(';');
        Ok(StorageCommand {
            text: out,
            kind: CommandKind::Text,
            parameters: context.parameters,
            timeout: None,
        })
    }
}
