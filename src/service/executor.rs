use crate::models::config::{DatabaseConfig, TransactionMode};
use crate::models::error::ExecutionError;
use crate::models::location::Location;
use crate::repo::sqlite::{execute_statements, open_connection};
use crate::service::statement::split_statements;
use log::debug;
use std::fs;
use std::path::Path;

/// Execute one SQL file against the database of `location`.
///
/// The connection lives only for this call. Returns the number of statements
/// executed. Under [`TransactionMode::Statement`] a rejected statement leaves
/// the ones before it applied.
pub fn run_sql_file(
    database: &DatabaseConfig,
    location: &Location,
    path: &Path,
    mode: TransactionMode,
    commit: bool,
) -> Result<usize, ExecutionError> {
    let mut conn = open_connection(database, &location.name)?;

    let sql = fs::read_to_string(path).map_err(|cause| ExecutionError::FileRead {
        path: path.to_path_buf(),
        cause,
    })?;

    let statements = split_statements(&sql);
    debug!(
        "Running {} statements from {} against '{}'",
        statements.len(),
        path.display(),
        location.name
    );

    execute_statements(&mut conn, &statements, mode, commit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        database_dir: TempDir,
        source_dir: TempDir,
        database: DatabaseConfig,
        location: Location,
    }

    fn fixture() -> Fixture {
        let database_dir = TempDir::new().unwrap();
        let source_dir = TempDir::new().unwrap();
        let database = DatabaseConfig {
            directory: database_dir.path().to_str().unwrap().to_string(),
            file_extension: "sqlite3".to_string(),
            create_if_missing: true,
            busy_timeout_ms: 1000,
        };
        let location = Location::new("busan", source_dir.path().to_str().unwrap());
        Fixture {
            database_dir,
            source_dir,
            database,
            location,
        }
    }

    fn query_ids(fixture: &Fixture) -> rusqlite::Result<Vec<i64>> {
        let conn = open_connection(&fixture.database, &fixture.location.name).unwrap();
        let mut stmt = conn.prepare("SELECT id FROM t ORDER BY rowid")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    #[test]
    fn test_executes_two_statements_in_source_order() {
        let fixture = fixture();
        let file = fixture.source_dir.path().join("restore.sql");
        fs::write(&file, "CREATE TABLE t (id INT); INSERT INTO t VALUES (1);").unwrap();

        let executed = run_sql_file(
            &fixture.database,
            &fixture.location,
            &file,
            TransactionMode::Statement,
            true,
        )
        .unwrap();

        assert_eq!(executed, 2);
        assert_eq!(query_ids(&fixture).unwrap(), vec![1]);
        assert!(fixture.database_dir.path().join("busan.sqlite3").is_file());
    }

    #[test]
    fn test_malformed_second_statement_keeps_first() {
        let fixture = fixture();
        let file = fixture.source_dir.path().join("broken.sql");
        fs::write(&file, "CREATE TABLE t (id INT); INSRT INTO t VALUES (1);").unwrap();

        let result = run_sql_file(
            &fixture.database,
            &fixture.location,
            &file,
            TransactionMode::Statement,
            true,
        );

        match result {
            Err(ExecutionError::StatementExecution {
                index, executed, ..
            }) => {
                assert_eq!(index, 2);
                assert_eq!(executed, 1);
            }
            other => panic!("Expected StatementExecution error, got {:?}", other),
        }
        // Table from the first statement is still there, just empty
        assert_eq!(query_ids(&fixture).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_missing_file_is_file_read_error() {
        let fixture = fixture();
        let file = fixture.source_dir.path().join("vanished.sql");

        match run_sql_file(
            &fixture.database,
            &fixture.location,
            &file,
            TransactionMode::Statement,
            true,
        ) {
            Err(ExecutionError::FileRead { path, .. }) => assert_eq!(path, file),
            other => panic!("Expected FileRead error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_utf8_file_is_file_read_error() {
        let fixture = fixture();
        let file = fixture.source_dir.path().join("latin1.sql");
        fs::write(&file, [0x53, 0x45, 0x4c, 0xff, 0xfe, 0x3b]).unwrap();

        let result = run_sql_file(
            &fixture.database,
            &fixture.location,
            &file,
            TransactionMode::Statement,
            true,
        );

        assert!(matches!(result, Err(ExecutionError::FileRead { .. })));
    }

    #[test]
    fn test_connection_failure_reported_before_reading_file() {
        let mut fixture = fixture();
        fixture.database.create_if_missing = false;
        let file = fixture.source_dir.path().join("restore.sql");
        fs::write(&file, "SELECT 1;").unwrap();

        let result = run_sql_file(
            &fixture.database,
            &fixture.location,
            &file,
            TransactionMode::Statement,
            true,
        );

        assert!(matches!(result, Err(ExecutionError::Connection { .. })));
    }

    #[test]
    fn test_empty_file_executes_nothing_and_succeeds() {
        let fixture = fixture();
        let file = fixture.source_dir.path().join("empty.sql");
        fs::write(&file, "\n-- nothing to do;\n").unwrap();

        let executed = run_sql_file(
            &fixture.database,
            &fixture.location,
            &file,
            TransactionMode::File,
            true,
        )
        .unwrap();

        assert_eq!(executed, 0);
    }
}
