use crate::{
    Catalog, ColumnDescriptor, Executor, Preload, Result, RowLabeled, Session, TableDescriptor,
    Value, future::BoxFuture,
};
use std::sync::Arc;

/// A type mapped to a table, usually implemented with `#[derive(Entity)]`.
///
/// The derive generates [`Entity::declare`] from the attributes, the [`Catalog`] calls it once
/// per type and shares the resulting descriptor.
pub trait Entity: Send + Sync + Sized + 'static {
    /// Name of the mapped table.
    const TABLE_NAME: &'static str;

    /// The object carries the checksum of the row it was loaded from.
    const TRACKS_CHECKSUM: bool = false;

    /// Builds the table descriptor. Pure, it can run more than once.
    fn declare() -> TableDescriptor;

    /// The shared descriptor of the type, taken from the global catalog.
    fn describe() -> Result<Arc<TableDescriptor>> {
        Catalog::global().describe::<Self>()
    }

    /// Column descriptor of a mapped field.
    fn describe_column(field: &str) -> Result<ColumnDescriptor> {
        Catalog::global().describe_column::<Self>(field)
    }

    /// Materializes one object, missing columns fail unless the field is optional.
    fn from_row(row: RowLabeled) -> Result<Self>;

    /// Column values, aligned with the columns of the descriptor.
    fn row(&self) -> Vec<Value>;

    /// Assigns one column, used to merge the values generated by the storage.
    fn set_column(&mut self, column: &str, value: Value) -> Result<()>;

    fn checksum(&self) -> Option<u64> {
        None
    }

    fn set_checksum(&mut self, _checksum: Option<u64>) {}

    /// Invariants checked right before insert and update, nothing is written when it fails.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Loads the relations named by `preload`, one query per relation.
    fn load_relations<'a, X: Executor>(
        &'a mut self,
        _session: &'a mut Session<X>,
        _preload: &'a Preload,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async { Ok(()) })
    }
}
