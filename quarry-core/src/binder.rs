use crate::{Entity, Result, RowLabeled, checksum, stream::Stream};
use futures::StreamExt;

/// Converts rows into entities.
pub struct Binder;

impl Binder {
    /// Lazy, single pass conversion of a row stream.
    pub fn bind<E, S>(rows: S) -> impl Stream<Item = Result<E>>
    where
        E: Entity,
        S: Stream<Item = Result<RowLabeled>>,
    {
        rows.map(|row| row.and_then(Self::bind_row))
    }

    /// Materializes one row, recording its checksum when the type tracks it.
    pub fn bind_row<E: Entity>(row: RowLabeled) -> Result<E> {
        let mut entity = E::from_row(row)?;
        if E::TRACKS_CHECKSUM {
            let checksum = checksum(&entity)?;
            entity.set_checksum(Some(checksum));
        }
        Ok(entity)
    }
}
