use thiserror::Error;

/// Errors emitted by the bulk importer.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("mysql error: {0}")]
    MySql(#[from] mysql_async::Error),
    #[error("invalid database url: {0}")]
    Url(#[from] mysql_async::UrlError),
    #[error("worker panicked: {0}")]
    WorkerPanic(String),
}
