#[cfg(test)]
mod tests {
    use quarry_core::Connection;
    use quarry_sqlite::SqliteConnection;
    use quarry_tests::{execute_tests, init_logs};
    use std::{path::Path, sync::Mutex};
    use tokio::fs;

    static MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn sqlite() {
        init_logs();
        const DB_PATH: &str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            fs::remove_file(DB_PATH)
                .await
                .unwrap_or_else(|e| panic!("Failed to remove the database file {DB_PATH}: {e}"));
        }
        let connection = SqliteConnection::connect(&format!("sqlite://{DB_PATH}?mode=rwc"))
            .await
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "The database file is created by the connection"
        );
        execute_tests(connection).await;
    }

    #[tokio::test]
    async fn sqlite_in_memory() {
        init_logs();
        let connection = SqliteConnection::connect("sqlite://:memory:")
            .await
            .expect("Could not open the in memory database");
        execute_tests(connection).await;
    }
}
