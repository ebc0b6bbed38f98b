use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder, WhiteListFsHandler};
use tracing::debug;

use crate::errors::ImportError;

/// Destination store primitive: truncate a table, bulk-load one file.
///
/// Implementations own a single session; constraint handling is theirs.
#[async_trait]
pub trait BulkSink: Send {
    async fn truncate(&mut self, table: &str) -> Result<(), ImportError>;

    /// Load one CSV file into a table, skipping the header line and
    /// dropping constraint-violating rows.
    async fn load_file(&mut self, table: &str, path: &Path) -> Result<(), ImportError>;
}

/// MySQL bulk sink over one dedicated connection.
///
/// The session disables uniqueness and foreign-key checks for its whole
/// lifetime; duplicate or dangling rows are dropped by `IGNORE` rather
/// than failing the load.
pub struct MySqlSink {
    conn: Conn,
}

impl MySqlSink {
    /// Open a connection allowed to stream exactly the given local files.
    ///
    /// The white-list handler answers `LOAD DATA LOCAL INFILE` requests for
    /// listed paths only.
    pub async fn connect(database_url: &str, infile_paths: &[PathBuf]) -> Result<Self, ImportError> {
        let opts = Opts::from_url(database_url)?;
        let opts = OptsBuilder::from_opts(opts)
            .local_infile_handler(Some(WhiteListFsHandler::new(infile_paths.to_vec())));
        let mut conn = Conn::new(opts).await?;

        conn.query_drop("SET SESSION unique_checks = 0").await?;
        conn.query_drop("SET SESSION foreign_key_checks = 0").await?;
        // Requires elevated privileges; skipping binlog writes is best
        // effort only.
        let _ = conn.query_drop("SET SESSION sql_log_bin = 0").await;
        conn.query_drop("SET autocommit = 0").await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl BulkSink for MySqlSink {
    async fn truncate(&mut self, table: &str) -> Result<(), ImportError> {
        debug!(table, "truncating table");
        self.conn
            .query_drop(format!("TRUNCATE TABLE {}", quote_identifier(table)))
            .await?;
        Ok(())
    }

    async fn load_file(&mut self, table: &str, path: &Path) -> Result<(), ImportError> {
        let statement = format!(
            "LOAD DATA LOCAL INFILE '{}' IGNORE INTO TABLE {} \
             FIELDS TERMINATED BY ',' OPTIONALLY ENCLOSED BY '\"' ESCAPED BY '' \
             LINES TERMINATED BY '\\n' IGNORE 1 LINES",
            quote_path(path),
            quote_identifier(table),
        );
        self.conn.query_drop(statement).await?;
        self.conn.query_drop("COMMIT").await?;
        Ok(())
    }
}

fn quote_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

fn quote_path(path: &Path) -> String {
    path.display()
        .to_string()
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_backtick_quoted() {
        assert_eq!(quote_identifier("node"), "`node`");
        assert_eq!(quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn paths_escape_sql_quotes() {
        let path = Path::new("/tmp/run's/node.csv");
        assert_eq!(quote_path(path), "/tmp/run\\'s/node.csv");
    }
}
