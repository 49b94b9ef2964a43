use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispoError {
    #[error("scheduling phase not found: {0}")]
    PhaseNotFound(String),

    #[error("scheduling phase already exists: {0}")]
    PhaseExists(String),

    #[error("business template not found: {0}")]
    TemplateNotFound(String),

    #[error("automation rule not found: {0}")]
    RuleNotFound(String),

    #[error("business task not found: {0}")]
    TaskNotFound(String),

    #[error("built-in phase '{0}' is immutable")]
    BuiltinImmutable(String),

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("invalid timeline reference: {0}")]
    InvalidTimelineReference(String),

    #[error("invalid id '{0}': must be lowercase alphanumeric with hyphens or underscores")]
    InvalidSlug(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DispoError>;
