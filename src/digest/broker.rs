use crate::digest::audit::AuditLog;
use crate::digest::credentials::normalize_api_key;
use crate::digest::openai::{Summarizer, build_prompt};
use crate::digest::protocol::{
    AckReply, BrokerRequest, Envelope, SummarizationResult, SummarizeReply,
};
use crate::error::SummarizeError;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Run the precondition checks and, if they pass, one upstream call.
///
/// `credential` is the caller's snapshot; a replacement that lands while
/// the call is in flight does not affect it.
pub async fn handle_summarize_request<S>(
    summarizer: &S,
    credential: Option<&str>,
    text: &str,
    prompt_chars: usize,
) -> Result<String, SummarizeError>
where
    S: Summarizer + ?Sized,
{
    let Some(api_key) = credential.filter(|key| !key.trim().is_empty()) else {
        return Err(SummarizeError::MissingCredential);
    };
    if text.trim().is_empty() {
        return Err(SummarizeError::EmptyInput);
    }

    let prompt = build_prompt(text, prompt_chars);
    summarizer.summarize(api_key, &prompt).await
}

fn send_reply<T: Serialize>(reply: oneshot::Sender<Value>, payload: &T) {
    match serde_json::to_value(payload) {
        Ok(value) => {
            // The requester may have gone away; the reply is then unobserved.
            if reply.send(value).is_err() {
                tracing::debug!("reply dropped: requester no longer listening");
            }
        }
        Err(err) => tracing::warn!("failed to encode broker reply: {err}"),
    }
}

/// Background context. Owns the only copy of the cached credential.
pub struct Broker<S> {
    summarizer: Arc<S>,
    credential: Option<String>,
    prompt_chars: usize,
    audit: AuditLog,
}

impl<S> Broker<S>
where
    S: Summarizer + 'static,
{
    pub fn new(
        summarizer: S,
        credential: Option<String>,
        prompt_chars: usize,
        audit: AuditLog,
    ) -> Self {
        Self {
            summarizer: Arc::new(summarizer),
            credential: normalize_api_key(credential.as_deref()),
            prompt_chars,
            audit,
        }
    }

    pub async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Envelope>) {
        tracing::debug!("broker started");
        while let Some(envelope) = inbox.recv().await {
            self.dispatch(envelope);
        }
        tracing::debug!("broker inbox closed");
    }

    fn dispatch(&mut self, envelope: Envelope) {
        let Envelope { message, reply } = envelope;
        let request = match serde_json::from_value::<BrokerRequest>(message) {
            Ok(request) => request,
            Err(err) => {
                // Unknown actions get no reply, like any other listener.
                tracing::warn!("ignoring unrecognised broker message: {err}");
                return;
            }
        };

        match request {
            BrokerRequest::SummarizeText { request_id, text } => {
                self.spawn_summarize(request_id, text, reply);
            }
            BrokerRequest::UpdateApiKey { api_key } => {
                self.credential = normalize_api_key(api_key.as_deref());
                tracing::info!(
                    configured = self.credential.is_some(),
                    "cached API key replaced"
                );
                send_reply(reply, &AckReply { success: true });
            }
        }
    }

    fn spawn_summarize(&self, request_id: u64, text: String, reply: oneshot::Sender<Value>) {
        let credential = self.credential.clone();
        let summarizer = Arc::clone(&self.summarizer);
        let prompt_chars = self.prompt_chars;
        let audit = self.audit.clone();

        tokio::spawn(async move {
            let outcome = handle_summarize_request(
                summarizer.as_ref(),
                credential.as_deref(),
                &text,
                prompt_chars,
            )
            .await;

            match &outcome {
                Ok(summary) => {
                    tracing::info!(
                        request_id,
                        chars = summary.chars().count(),
                        "summary generated"
                    );
                    audit.record("summarize", "ok", &format!("request {request_id} succeeded"));
                }
                Err(err) => {
                    tracing::warn!(request_id, kind = err.kind(), "summarize failed: {err}");
                    audit.record(
                        "summarize",
                        err.kind(),
                        &format!("request {request_id} failed: {err}"),
                    );
                }
            }

            let reply_payload = SummarizeReply::new(request_id, SummarizationResult::from(outcome));
            send_reply(reply, &reply_payload);
        });
    }
}
