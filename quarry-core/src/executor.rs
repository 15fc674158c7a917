use crate::{
    Driver, QueryResult, Result, RowLabeled, RowsAffected, StorageCommand,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::Future;

/// Runs compiled commands, the capability a driver exposes to the session.
pub trait Executor: Send {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// General method to send any command and return any result type (either row or count).
    fn run(&mut self, command: StorageCommand) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Execute the command and return the rows.
    fn fetch(
        &mut self,
        command: StorageCommand,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(command).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the command and return the total number of rows affected.
    fn execute(
        &mut self,
        command: StorageCommand,
    ) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(command)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }
}
