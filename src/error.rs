use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptshelfError {
    #[error("Not in a promptshelf library. Run 'promptshelf init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .promptshelf/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    #[error("No {kind} named or identified by '{id}'")]
    TaxonomyNotFound { kind: String, id: String },

    #[error("A {kind} named '{name}' already exists")]
    DuplicateName { kind: String, name: String },

    #[error("Unknown {kind} '{name}'. Add it first with 'promptshelf {kind} add'.")]
    UnknownReference { kind: String, name: String },

    #[error("Revision {revision} not found for prompt {prompt}")]
    RevisionNotFound { prompt: String, revision: u32 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Loro error: {0}")]
    Loro(#[from] loro::LoroError),

    #[error("Loro encode error: {0}")]
    LoroEncode(#[from] loro::LoroEncodeError),
}

pub type Result<T> = std::result::Result<T, PromptshelfError>;
