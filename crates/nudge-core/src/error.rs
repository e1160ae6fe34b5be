use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStage {
    #[error("request")]
    Request,
    #[error("HTTP status")]
    Status,
    #[error("content type")]
    ContentType,
    #[error("body read")]
    Body,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("Network error ({stage}): {details}")]
    Network {
        stage: NetworkStage,
        details: String,
    },

    #[error("Failed to parse version descriptor: {0}")]
    Parse(String),

    #[error(
        "Version descriptor package name should be {expected}, found {}",
        .found.as_deref().unwrap_or("none")
    )]
    Validation {
        expected: String,
        found: Option<String>,
    },

    #[error("Failed to encode current properties: {0}")]
    Encode(String),

    #[error(transparent)]
    Records(#[from] RecordStoreError),

    #[error("An update check is already in progress")]
    InProgress,
}

impl CheckError {
    pub fn network(stage: NetworkStage, details: impl Into<String>) -> Self {
        Self::Network {
            stage,
            details: details.into(),
        }
    }

    pub fn network_from<E>(stage: NetworkStage, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::network(stage, error.to_string())
    }

    pub fn parse(details: impl Into<String>) -> Self {
        Self::Parse(details.into())
    }

    pub fn parse_from<E>(error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::Parse(error.to_string())
    }

    pub(crate) fn encode_from(error: &serde_json::Error) -> Self {
        Self::Encode(error.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    #[error("Display records {context} ({kind}): {message}")]
    Io {
        context: &'static str,
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Failed to encode display records: {0}")]
    Encode(String),

    #[error(transparent)]
    Paths(#[from] nudge_platform::AppPathsError),
}

impl RecordStoreError {
    pub(crate) fn io(context: &'static str, error: &std::io::Error) -> Self {
        Self::Io {
            context,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("No handler could open {uri}: {details}")]
    NoHandler { uri: String, details: String },

    #[error("Update has no store package or website to open")]
    MissingTarget,
}
