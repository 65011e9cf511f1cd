use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    /// A required markdown section is absent. The message is fixed so that
    /// callers can match on it and attach guidance.
    #[error("{0}")]
    MissingSection(&'static str),

    #[error("{capability}: RENAMED failed for header \"### Requirement: {from}\" - source not found")]
    RenameSourceNotFound { capability: String, from: String },

    #[error("{capability}: RENAMED failed for header \"### Requirement: {to}\" - target already exists")]
    RenameTargetExists { capability: String, to: String },

    #[error("{capability}: {operation} failed for header \"### Requirement: {name}\" - not found")]
    RequirementNotFound {
        capability: String,
        operation: &'static str,
        name: String,
    },

    #[error("{capability}: MODIFIED failed for header \"### Requirement: {name}\" - header mismatch in content")]
    HeaderMismatch { capability: String, name: String },

    #[error("{capability}: ADDED failed for header \"### Requirement: {name}\" - already exists")]
    RequirementExists { capability: String, name: String },

    #[error("{capability}: duplicate requirement headers detected after merge")]
    DuplicateHeaders { capability: String },

    #[error("{capability}: target spec does not exist; only ADDED requirements are allowed for new specs")]
    NewSpecRequiresAdded { capability: String },

    #[error("{capability}: invalid delta plan: {reason}")]
    InvalidDeltaPlan { capability: String, reason: String },

    #[error("rebuilt spec for '{capability}' failed validation: {details}")]
    RebuiltSpecInvalid { capability: String, details: String },

    #[error("change '{0}' not found")]
    ChangeNotFound(String),

    #[error("spec '{0}' not found")]
    SpecNotFound(String),

    #[error("archive '{0}' already exists")]
    ArchiveExists(String),

    #[error("invalid id '{0}': must be a single path component")]
    InvalidId(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SpecError>;
