use crate::{SqliteConnection, SqliteSqlWriter};
use quarry_core::Driver;

#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteDriver {}

impl SqliteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;
    type SqlWriter = SqliteSqlWriter;

    const NAME: &'static str = "sqlite";

    fn sql_writer(&self) -> SqliteSqlWriter {
        SqliteSqlWriter::new()
    }
}
