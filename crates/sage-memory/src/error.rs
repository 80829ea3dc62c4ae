#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("collection error: {0}")]
    Collection(String),

    #[error("upsert error: {0}")]
    Upsert(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("delete error: {0}")]
    Delete(String),

    #[error("scroll error: {0}")]
    Scroll(String),

    #[error("count error: {0}")]
    Count(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
