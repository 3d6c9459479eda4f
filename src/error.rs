use thiserror::Error;

/// Top-level error type for the propagation kernel.
#[derive(Debug, Error)]
pub enum PropagisError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Errors raised while building a scene from its description.
///
/// These are fatal: the load is aborted at the first one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown {kind} type: {name}")]
    UnknownType { kind: &'static str, name: String },

    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    #[error("{entity} needs at least {min} vertices, got {got}")]
    TooFewVertices {
        entity: String,
        min: usize,
        got: usize,
    },

    #[error("floor segment {entity} has {got} corners, at most 4 are allowed")]
    TooManyCorners { entity: String, got: usize },

    #[error("parameter {parameter} = {value} is invalid: {reason}")]
    InvalidValue {
        parameter: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Errors raised while wiring propagation models together.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{model} requires {dependency}, which is not loaded")]
    MissingDependency {
        model: &'static str,
        dependency: &'static str,
    },
}

/// Errors related to scene entity bookkeeping.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("duplicate entity id: {0}")]
    DuplicateId(String),
}

/// Convenience type alias for results using [`PropagisError`].
pub type Result<T> = std::result::Result<T, PropagisError>;
