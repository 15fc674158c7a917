use crate::{Parameters, TransactionType, Value, checksum::Fnv64};
use std::{
    hash::Hasher,
    ops::{Deref, DerefMut},
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment {
    #[default]
    None,
    SqlCreateTable,
    SqlDropTable,
    SqlDeleteFrom,
    SqlDeleteFromWhere,
    SqlInsertInto,
    SqlInsertIntoValues,
    SqlJoin,
    SqlSelect,
    SqlSelectFrom,
    SqlSelectWhere,
    SqlSelectGroupBy,
    SqlSelectHaving,
    SqlSelectOrderBy,
    SqlTruncate,
    SqlUpdate,
    SqlUpdateSet,
    SqlUpdateWhere,
}

/// State shared by the writer methods while compiling one command.
#[derive(Debug, Clone)]
pub struct Context {
    pub fragment: Fragment,
    pub qualify_columns: bool,
    /// Kind of the statement being compiled, it drives the parameter naming.
    pub kind: TransactionType,
    /// Number of parameters emitted so far.
    pub counter: u32,
    /// Column the next value binds to, part of the name of non select parameters.
    pub column: &'static str,
    pub parameters: Parameters,
}

impl Context {
    pub fn new(fragment: Fragment, kind: TransactionType, qualify_columns: bool) -> Self {
        Self {
            fragment,
            qualify_columns,
            kind,
            counter: 0,
            column: "",
            parameters: Parameters::new(),
        }
    }

    /// Registers a value and returns its deterministic parameter name.
    ///
    /// Select commands number their parameters (`@p1`, `@p2`), the other commands hash the
    /// column and the ordinal, then append the ordinal (`@h1a2b3c4d_1`).
    pub fn bind(&mut self, prefix: &str, value: Value) -> String {
        self.counter += 1;
        let name = if self.kind == TransactionType::Select {
            format!("{prefix}p{}", self.counter)
        } else {
            let mut hasher = Fnv64::default();
            hasher.write(self.column.as_bytes());
            hasher.write_u32(self.counter);
            let hash = hasher.finish();
            format!("{prefix}h{:08x}_{}", (hash ^ (hash >> 32)) as u32, self.counter)
        };
        self.parameters.add(name.clone(), value);
        name
    }

    /// Switches fragment until the returned guard is dropped.
    pub fn switch_fragment<'s>(&'s mut self, fragment: Fragment) -> ContextUpdater<'s> {
        let previous = self.fragment;
        self.fragment = fragment;
        ContextUpdater {
            previous,
            context: self,
        }
    }

    /// Sets the bound column until the returned guard is dropped.
    pub fn bind_column<'s>(&'s mut self, column: &'static str) -> ColumnUpdater<'s> {
        let previous = self.column;
        self.column = column;
        ColumnUpdater {
            previous,
            context: self,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(Fragment::None, TransactionType::Select, false)
    }
}

pub struct ContextUpdater<'a> {
    previous: Fragment,
    context: &'a mut Context,
}

impl Deref for ContextUpdater<'_> {
    type Target = Context;
    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for ContextUpdater<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for ContextUpdater<'_> {
    fn drop(&mut self) {
        self.context.fragment = self.previous;
    }
}

pub struct ColumnUpdater<'a> {
    previous: &'static str,
    context: &'a mut Context,
}

impl Deref for ColumnUpdater<'_> {
    type Target = Context;
    fn deref(&self) -> &Self::Target {
        self.context
    }
}

impl DerefMut for ColumnUpdater<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context
    }
}

impl Drop for ColumnUpdater<'_> {
    fn drop(&mut self) {
        self.context.column = self.previous;
    }
}
