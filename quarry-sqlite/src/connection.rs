use crate::{SqliteDriver, SqliteValue, extract_value};
use async_stream::try_stream;
use quarry_core::{
    CommandKind, Connection, Driver, Error, ErrorKind, Executor, QueryResult, Result, RowLabeled,
    RowsAffected, StorageCommand, TransactionType, stream::Stream, truncate_long,
};
use rusqlite::{Connection as RusqliteConnection, OpenFlags};
use std::{borrow::Cow, sync::Arc};
use url::form_urlencoded;

/// A connection to one SQLite database file (or to a private in memory database).
///
/// Urls look like `sqlite://path/to/file.db?mode=rwc`, `sqlite://:memory:` opens an in memory
/// database. The `mode` parameter takes `ro`, `rw`, `rwc` (the default) and `memory`.
#[derive(Debug)]
pub struct SqliteConnection {
    pub(crate) connection: RusqliteConnection,
    pub(crate) driver: SqliteDriver,
}

fn open_flags(mode: &str) -> Result<OpenFlags> {
    let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Ok(match mode {
        "ro" => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
        "rw" => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
        "rwc" => base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        "memory" => {
            base | OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_MEMORY
        }
        _ => {
            return Err(Error::msg(format!(
                "Unknown sqlite open mode `{mode}`, expected one of `ro`, `rw`, `rwc`, `memory`"
            )));
        }
    })
}

impl SqliteConnection {
    /// Wraps an already opened connection.
    pub fn from_connection(connection: RusqliteConnection) -> Self {
        Self {
            connection,
            driver: SqliteDriver::new(),
        }
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(RusqliteConnection::open_in_memory()?))
    }

    /// Runs the command to completion, the rows are buffered because the statement borrows the
    /// connection and cannot cross an await point.
    fn run_command(&mut self, command: &StorageCommand) -> Result<Vec<QueryResult>> {
        if command.kind == CommandKind::Procedure {
            return Err(ErrorKind::unsupported_operation(
                "stored procedures",
                SqliteDriver::NAME,
            )
            .into());
        }
        if let Some(timeout) = command.timeout {
            self.connection.busy_timeout(timeout)?;
        }
        let mut statement = self.connection.prepare_cached(&command.text)?;
        for (name, value) in command.parameters.iter() {
            let Some(index) = statement.parameter_index(name)? else {
                return Err(Error::msg(format!(
                    "Parameter `{name}` does not appear in the command"
                )));
            };
            statement.raw_bind_parameter(index, SqliteValue(value))?;
        }
        if statement.column_count() > 0 {
            let labels: Arc<[String]> = statement
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();
            let mut result = Vec::new();
            let mut rows = statement.raw_query();
            while let Some(row) = rows.next()? {
                let values = (0..labels.len())
                    .map(|i| Ok(extract_value(row.get_ref(i)?)?))
                    .collect::<Result<Box<[_]>>>()?;
                result.push(RowLabeled::new(labels.clone(), values).into());
            }
            Ok(result)
        } else {
            let rows_affected = statement.raw_execute()? as u64;
            let last_affected_id = (command.transaction_type() == Some(TransactionType::Insert)
                && rows_affected > 0)
                .then(|| self.connection.last_insert_rowid());
            Ok(vec![
                RowsAffected {
                    rows_affected,
                    last_affected_id,
                }
                .into(),
            ])
        }
    }
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    fn run(&mut self, command: StorageCommand) -> impl Stream<Item = Result<QueryResult>> + Send {
        try_stream! {
            let results = self.run_command(&command).map_err(|e| {
                let error = e.context(format!(
                    "While executing the command:\n{}",
                    truncate_long!(command.text)
                ));
                log::error!("{:#}", error);
                error
            })?;
            for result in results {
                yield result;
            }
        }
    }
}

impl Connection for SqliteConnection {
    async fn connect(url: &str) -> Result<SqliteConnection> {
        let prefix = format!("{}://", SqliteDriver::NAME);
        let Some(rest) = url.strip_prefix(&prefix) else {
            return Err(Error::msg(format!(
                "Expected sqlite connection url to start with `{prefix}`, found `{url}`"
            )));
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let path: Cow<'_, str> = urlencoding::decode(path).map_err(|e| {
            Error::new(e).context(format!("Error while decoding the path of `{url}`"))
        })?;
        let mut mode = Cow::Borrowed("rwc");
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if key == "mode" {
                mode = value;
            }
        }
        let connection = if path.is_empty() || path == ":memory:" || mode == "memory" {
            RusqliteConnection::open_in_memory()
        } else {
            RusqliteConnection::open_with_flags(&*path, open_flags(&mode)?)
        }
        .map_err(|e| {
            let error = Error::new(e).context(format!("Could not open the database `{url}`"));
            log::error!("{:#}", error);
            error
        })?;
        log::debug!("Opened sqlite database `{}`", path);
        Ok(Self::from_connection(connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{Value, stream::TryStreamExt};

    #[tokio::test]
    async fn select_and_execute() {
        let mut connection = SqliteConnection::connect("sqlite://:memory:")
            .await
            .expect("In memory database");
        connection
            .execute(
                "CREATE TABLE \"Part\" (\"Id\" INTEGER PRIMARY KEY AUTOINCREMENT, \"Name\" TEXT);"
                    .into(),
            )
            .await
            .expect("Table created");
        let mut insert = StorageCommand::new("INSERT INTO \"Part\" (\"Name\") VALUES (@h1);");
        insert.add_parameter("@h1", Value::Varchar(Some("Bolt".into())));
        let affected = connection.execute(insert).await.expect("Row inserted");
        assert_eq!(affected.rows_affected, 1);
        assert_eq!(affected.last_affected_id, Some(1));

        let mut select =
            StorageCommand::new("SELECT \"Id\", \"Name\" FROM \"Part\" WHERE \"Id\" = @p1;");
        select.add_parameter("@p1", Value::Int32(Some(1)));
        let rows: Vec<_> = connection.fetch(select).try_collect().await.expect("Rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].names(), ["Id", "Name"]);
        assert_eq!(
            rows[0].values(),
            [Value::Int64(Some(1)), Value::Varchar(Some("Bolt".into()))]
        );
    }

    #[tokio::test]
    async fn procedures_are_refused() {
        let mut connection = SqliteConnection::open_in_memory().expect("In memory database");
        let error = connection
            .execute(StorageCommand::procedure("uspGetBillOfMaterials"))
            .await
            .expect_err("No stored procedures in sqlite");
        assert!(matches!(
            error.downcast_ref::<ErrorKind>(),
            Some(ErrorKind::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn unknown_mode() {
        assert!(open_flags("rwc").is_ok());
        assert!(open_flags("append").is_err());
    }
}
