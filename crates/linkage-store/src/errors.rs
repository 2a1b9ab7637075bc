use linkage_solver::ConfigurationError;

/// Errors raised by a linkage repository.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("no linkage named '{0}'")]
    NotFound(String),

    #[error("a linkage named '{0}' already exists")]
    AlreadyExists(String),

    #[error("linkage name must not be empty")]
    EmptyName,

    #[error("failed to parse document: {0}")]
    ParseError(String),

    #[error("failed to serialize document: {0}")]
    SerializeError(String),

    #[error("unknown document format: {0}")]
    UnknownFormat(String),

    #[error("document version {file_version} is newer than supported version {supported_version}")]
    FutureVersion {
        file_version: u32,
        supported_version: u32,
    },

    #[error("stored linkage is invalid: {0}")]
    Invalid(#[from] ConfigurationError),
}
