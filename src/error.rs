use thiserror::Error;

/// Errors raised while parsing, importing or forecasting attendance.
#[derive(Error, Debug)]
pub enum AttendanceError {
    /// The mandatory subject or present column could not be located.
    #[error("{0}")]
    ColumnMapping(String),

    /// The CSV held no rows at all.
    #[error("Empty CSV")]
    EmptyInput,

    /// Anything unexpected while walking rows, with the original message kept.
    #[error("Parser Error: {0}")]
    Parse(String),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AttendanceError {
    /// HTTP-equivalent status for the request boundaries.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ColumnMapping(_) | Self::EmptyInput | Self::Parse(_) | Self::Csv(_) => 400,
            Self::Database(_) | Self::Config(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;
