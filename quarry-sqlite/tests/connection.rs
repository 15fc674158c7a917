#[cfg(test)]
mod tests {
    use quarry_core::{ConcurrencyMode, Connection, Executor, Session, StorageCommand};
    use std::time::Duration;
    use quarry_sqlite::SqliteConnection;
    use quarry_tests::{init_logs, silent_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn create_database() {
        init_logs();
        const DB_PATH: &str = "../target/debug/creation.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .unwrap_or_else(|e| panic!("Failed to remove the database file {DB_PATH}: {e}"));
        }
        let mut connection = SqliteConnection::connect(&format!("sqlite://{DB_PATH}?mode=rwc"))
            .await
            .expect("Could not create the database");
        assert!(Path::new(DB_PATH).exists());
        connection
            .execute(StorageCommand::new("CREATE TABLE \"Shelf\" (\"Id\" INTEGER);"))
            .await
            .expect("Failed to create a table");
        drop(connection);

        let mut connection = SqliteConnection::connect(&format!("sqlite://{DB_PATH}?mode=ro"))
            .await
            .expect("Could not open the database read only");
        silent_logs! {
            assert!(
                connection
                    .execute(StorageCommand::new("INSERT INTO \"Shelf\" (\"Id\") VALUES (1);"))
                    .await
                    .is_err(),
                "A read only database refuses writes"
            );
        }
        drop(connection);

        fs::remove_file(DB_PATH)
            .await
            .unwrap_or_else(|e| panic!("Failed to remove the database file {DB_PATH}: {e}"));
        assert!(
            SqliteConnection::connect(&format!("sqlite://{DB_PATH}?mode=ro"))
                .await
                .is_err(),
            "A missing database cannot be opened read only"
        );
    }

    #[tokio::test]
    async fn wrong_url() {
        silent_logs! {
            assert!(SqliteConnection::connect("postgres://localhost/db").await.is_err());
            assert!(SqliteConnection::connect("sqlite://data.db?mode=append").await.is_err());
        };
    }

    #[tokio::test]
    async fn session_settings() {
        init_logs();
        let session = Session::<SqliteConnection>::connect(
            "sqlite://?mode=memory&batch_size=7&concurrency=ignore&command_timeout=5",
        )
        .await
        .expect("Could not open the session");
        let config = session.config();
        assert_eq!(config.batch_size, 7);
        assert_eq!(config.concurrency, ConcurrencyMode::Ignore);
        assert_eq!(config.command_timeout, Some(Duration::from_secs(5)));
        silent_logs! {
            assert!(
                Session::<SqliteConnection>::connect("sqlite://?mode=memory&batch_size=0")
                    .await
                    .is_err()
            );
        }
    }
}
