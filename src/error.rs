use thiserror::Error;

#[derive(Error, Debug)]
pub enum HrError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source directory not found: {0}")]
    MissingSource(String),

    #[error("Row error: {0}")]
    Row(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, HrError>;
