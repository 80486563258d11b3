use crate::error::{DigestError, GENERIC_FAILURE_MESSAGE, SummarizeError};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

/// Messages addressed to the background broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BrokerRequest {
    #[serde(rename_all = "camelCase")]
    SummarizeText {
        #[serde(default)]
        request_id: u64,
        #[serde(default)]
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    UpdateApiKey {
        #[serde(default)]
        api_key: Option<String>,
    },
}

/// Messages addressed to the page controller. They never get a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageNotice {
    ToggleExtension { enabled: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarizationResult {
    Success { summary: String },
    Failure { message: String },
}

impl From<Result<String, SummarizeError>> for SummarizationResult {
    fn from(result: Result<String, SummarizeError>) -> Self {
        match result {
            Ok(summary) => Self::Success { summary },
            Err(err) => Self::Failure {
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeReply {
    #[serde(default)]
    pub request_id: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SummarizeReply {
    pub fn new(request_id: u64, result: SummarizationResult) -> Self {
        match result {
            SummarizationResult::Success { summary } => Self {
                request_id,
                success: true,
                summary: Some(summary),
                error: None,
            },
            SummarizationResult::Failure { message } => Self {
                request_id,
                success: false,
                summary: None,
                error: Some(message),
            },
        }
    }

    pub fn into_result(self) -> SummarizationResult {
        match (self.success, self.summary) {
            (true, Some(summary)) => SummarizationResult::Success { summary },
            _ => SummarizationResult::Failure {
                message: self
                    .error
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckReply {
    pub success: bool,
}

/// A message in flight to the broker together with its single reply slot.
#[derive(Debug)]
pub struct Envelope {
    pub message: Value,
    pub reply: oneshot::Sender<Value>,
}

/// Sending half of the broker's inbox. Messages cross as JSON values so the
/// contexts never share typed state.
#[derive(Debug, Clone)]
pub struct BrokerHandle {
    sender: mpsc::UnboundedSender<Envelope>,
}

impl BrokerHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (sender, inbox) = mpsc::unbounded_channel();
        (Self { sender }, inbox)
    }

    pub fn send(&self, request: &BrokerRequest) -> Result<oneshot::Receiver<Value>> {
        let message = serde_json::to_value(request)?;
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(Envelope { message, reply })
            .map_err(|_| anyhow!(DigestError::BrokerUnavailable))?;
        Ok(rx)
    }

    /// Request and await in one step. The page controller selects over the
    /// raw receiver instead, so only tests use this.
    #[cfg(test)]
    pub async fn summarize(&self, request_id: u64, text: &str) -> Result<SummarizeReply> {
        let rx = self.send(&BrokerRequest::SummarizeText {
            request_id,
            text: text.to_string(),
        })?;
        let value = rx.await.map_err(|_| anyhow!(DigestError::BrokerUnavailable))?;
        serde_json::from_value(value).context("malformed summarize reply")
    }

    pub async fn update_api_key(&self, api_key: Option<&str>) -> Result<AckReply> {
        let rx = self.send(&BrokerRequest::UpdateApiKey {
            api_key: api_key.map(ToOwned::to_owned),
        })?;
        let value = rx.await.map_err(|_| anyhow!(DigestError::BrokerUnavailable))?;
        serde_json::from_value(value).context("malformed updateApiKey reply")
    }
}
