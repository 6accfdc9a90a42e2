#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store is closed")]
    Closed,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid update: {0}")]
    InvalidUpdate(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("duplicate key: _id {0}")]
    DuplicateKey(String),

    #[error("field '{0}' is immutable")]
    ImmutableField(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
