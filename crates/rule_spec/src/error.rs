#[derive(Debug, thiserror::Error)]
pub enum SpecLoadError {
    #[error("rule catalog is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("rule catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value regex for {tag}[{attr}]: {source}")]
    Regex {
        tag: String,
        attr: String,
        source: regex::Error,
    },
    #[error("{tag}[{attr}] declares more than one value shape")]
    ConflictingValueShape { tag: String, attr: String },
    #[error("tag {0} is declared twice")]
    DuplicateTag(String),
}
