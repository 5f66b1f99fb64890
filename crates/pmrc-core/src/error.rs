//! Error types for pmrc-core

use pmrc_meta::Location;

/// Result type for pmrc-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, resolving or persisting config
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A store may only be loaded (or ignored) once
    #[error("double load {location} {origin}")]
    AlreadyLoaded { location: Location, origin: String },

    #[error("config data {location} must be loaded to perform this action")]
    NotLoaded { location: Location },

    #[error("Cannot {action} config since it was not loaded from a file: `{location}`")]
    NotFileBacked {
        action: &'static str,
        location: Location,
    },

    #[error("Cannot edit config that had an error while loading: `{location}` loaded with error: `{message}`")]
    LoadErrored { location: Location, message: String },

    /// A value was rejected at a location whose policy is to fail hard
    #[error("{message}")]
    InvalidItem {
        location: Location,
        key: String,
        message: String,
    },

    /// A key without a definition reached a location that keeps unknown keys
    #[error("unknown config key `{key}` at location `{location}`")]
    UnknownKey { location: Location, key: String },

    #[error("derived config `{key}` is part of a dependency cycle")]
    DerivedCycle { key: String },

    #[error("derived config `{key}` is produced by more than one entry")]
    DuplicateDerived { key: String },

    #[error("derived config `{key}` depends on `{dependency}`, which is neither defined nor derived")]
    UnknownDependency { key: String, dependency: String },

    #[error("failed to start editor `{editor}`: {source}")]
    EditorSpawn {
        editor: String,
        #[source]
        source: std::io::Error,
    },

    #[error("editor process exited with code: {}", code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    EditorExited { code: Option<i32> },

    /// A blocking file task panicked or was cancelled
    #[error(transparent)]
    Task(#[from] tokio::task::JoinError),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from pmrc-fs
    #[error(transparent)]
    Fs(#[from] pmrc_fs::Error),

    /// Metadata error from pmrc-meta
    #[error(transparent)]
    Meta(#[from] pmrc_meta::Error),
}
