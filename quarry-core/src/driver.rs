use crate::{Connection, SqlWriter};

pub trait Driver: Send + Sync {
    type Connection: Connection<Driver = Self>;
    type SqlWriter: SqlWriter + 'static;

    /// Scheme of the connection urls, `sqlite` for `sqlite://data.db`.
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}
