//! Error types for scene configuration and startup

use thiserror::Error;

/// Errors that can occur while loading configuration or starting the backdrop
#[derive(Error, Debug)]
pub enum SceneError {
    /// A configuration value is outside its allowed range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file extension is not JSON or YAML
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// The configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON configuration could not be parsed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML configuration could not be parsed
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The drawable surface required at startup does not exist
    #[error("rendering surface not found: {0}")]
    MissingSurface(String),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
