//! Error types for pmrc-meta

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config `{key}` lacks required key: `{field}`")]
    MissingField { key: String, field: &'static str },

    #[error("invalid definition for `{key}`: {message}")]
    InvalidDefinition { key: String, message: String },

    #[error("config `{key}` is defined more than once")]
    DuplicateKey { key: String },

    #[error("invalid url `{url}`: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Cannot create config data with invalid location: {location}")]
    InvalidLocation { location: String },
}
