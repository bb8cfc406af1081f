use thiserror::Error;

#[derive(Error, Debug)]
pub enum PetRegistryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The driver is unavailable or the database could not be opened.
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    /// A repository query failed to prepare, execute, or decode.
    #[error("Query failed ({operation}): {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl PetRegistryError {
    pub(crate) fn query(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| PetRegistryError::Query { operation, source }
    }

    /// True for failures raised while opening or validating the connection.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, PetRegistryError::Connection { .. })
    }

    /// True for failures raised while running a repository query.
    pub fn is_query(&self) -> bool {
        matches!(self, PetRegistryError::Query { .. })
    }
}

pub type Result<T> = std::result::Result<T, PetRegistryError>;
