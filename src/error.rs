use thiserror::Error;

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("config file invalid or unreadable: {0}")]
    InvalidConfig(String),
    #[error("storage file is corrupt: {0}")]
    StorageCorrupt(String),
    #[error("no saved summary at index {index} (store holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("background broker is not running")]
    BrokerUnavailable,
}

/// Failure kinds of a summarization round-trip. Only the `Display` text
/// crosses the message boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizeError {
    #[error("OpenAI API key not configured. Please set your API key in the extension popup.")]
    MissingCredential,
    #[error("No text provided for summarization.")]
    EmptyInput,
    #[error("{message}")]
    UpstreamHttp { status: u16, message: String },
    #[error("No response generated from OpenAI")]
    UpstreamEmptyResponse,
    #[error("{message}")]
    Transport { message: String },
}

pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to generate summary. Please try again.";

impl SummarizeError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        let message = if message.trim().is_empty() {
            GENERIC_FAILURE_MESSAGE.to_string()
        } else {
            message
        };
        Self::Transport { message }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::EmptyInput => "empty_input",
            Self::UpstreamHttp { .. } => "upstream_http",
            Self::UpstreamEmptyResponse => "upstream_empty_response",
            Self::Transport { .. } => "transport",
        }
    }
}
