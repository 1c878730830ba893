use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the library
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Target version string is not a 3.0.x, 3.1.x or 3.2.x version
    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),

    /// A constraint object could not be merged onto a property node
    #[error("invalid constraint for {schema}.{property}: {source}")]
    InvalidConstraint {
        schema: String,
        property: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    SerializationError(String),

    /// References left dangling after the pipeline ran
    #[error("unresolved schema references: {}", .0.join(", "))]
    UnresolvedReferences(Vec<String>),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML: {}", err))
    }
}
