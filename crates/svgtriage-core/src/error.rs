pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("duplicate feature in registry: {name}")]
    DuplicateFeature { name: String },

    #[error("invalid triage options: {0}")]
    Options(#[from] serde_json::Error),
}
