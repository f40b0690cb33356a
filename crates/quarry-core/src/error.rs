//! Error types for Quarry

use thiserror::Error;

/// Core error type for Quarry operations
#[derive(Error, Debug)]
pub enum QuarryError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    /// An error reported by the database server itself.
    ///
    /// The numeric code is preserved so callers can react to specific
    /// conditions (for example MySQL's 1142 "table access denied").
    #[error("Server error {code} ({state}): {message}")]
    Server {
        code: u16,
        state: String,
        message: String,
    },

    /// A statement failed while running a batch. Carries the statement text.
    #[error("{source} [statement: {statement}]")]
    Execution {
        statement: String,
        #[source]
        source: Box<QuarryError>,
    },

    /// A step of a DDL plan failed; earlier steps stay applied
    #[error("plan step {index} ({purpose}) failed: {source}")]
    PlanStep {
        index: usize,
        purpose: String,
        #[source]
        source: Box<QuarryError>,
    },

    /// A value does not match the type contract of the field it is written to
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A query AST was assembled in an invalid combination
    #[error("Render error: {0}")]
    Render(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl QuarryError {
    /// Attach the statement that produced this error.
    pub fn with_statement(self, statement: impl Into<String>) -> Self {
        QuarryError::Execution {
            statement: statement.into(),
            source: Box::new(self),
        }
    }

    /// Server error code, looking through statement wrappers.
    pub fn server_code(&self) -> Option<u16> {
        match self {
            QuarryError::Server { code, .. } => Some(*code),
            QuarryError::Execution { source, .. } | QuarryError::PlanStep { source, .. } => {
                source.server_code()
            }
            _ => None,
        }
    }

    /// The statement text attached to this error, if any.
    pub fn statement(&self) -> Option<&str> {
        match self {
            QuarryError::Execution { statement, .. } => Some(statement),
            QuarryError::PlanStep { source, .. } => source.statement(),
            _ => None,
        }
    }
}

/// Result type alias for Quarry operations
pub type Result<T> = std::result::Result<T, QuarryError>;
