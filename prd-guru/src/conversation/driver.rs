//! The chat loop: one user message in, one assistant turn out.

use shared_types::{Document, Patch, SendMessageResponse, TurnRole};
use std::sync::Arc;

use super::registry::SendPermit;
use super::SessionHandle;
use crate::entitlement::EntitlementResolver;
use crate::extract::UpdateExtractor;
use crate::gateway::{CompletionRequest, GatewayRegistry};
use crate::prompt::{self, APOLOGY_REPLY, UPDATED_REPLY, UPGRADE_REPLY};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SendError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("a message is already being processed for this session")]
    Busy,
    #[error("the send task ended before replying")]
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct ChatDriver {
    gateways: GatewayRegistry,
    entitlements: EntitlementResolver,
    extractor: UpdateExtractor,
    system_prompt: String,
    history_window: usize,
}

impl ChatDriver {
    pub fn new(
        gateways: GatewayRegistry,
        entitlements: EntitlementResolver,
        extractor: UpdateExtractor,
        history_window: usize,
    ) -> Self {
        let system_prompt = prompt::system_prompt(extractor.label());
        Self {
            gateways,
            entitlements,
            extractor,
            system_prompt,
            history_window,
        }
    }

    /// Run one send. Exactly one assistant turn is appended on every path
    /// that gets past the busy check, so the log keeps alternating.
    ///
    /// Everything after the busy check runs on its own task: dropping the
    /// returned future abandons the response but not the turn pair.
    pub async fn send(
        self: &Arc<Self>,
        session: &Arc<SessionHandle>,
        message: &str,
    ) -> Result<SendMessageResponse, SendError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SendError::EmptyMessage);
        }
        let permit = session.try_begin_send().ok_or(SendError::Busy)?;

        let driver = Arc::clone(self);
        let message = message.to_string();
        tokio::spawn(async move { driver.run(permit, message).await })
            .await
            .map_err(|e| {
                tracing::error!(session_id = %session.id(), error = %e, "Send task aborted");
                SendError::Interrupted
            })
    }

    async fn run(&self, permit: SendPermit, message: String) -> SendMessageResponse {
        let session = permit.session();

        let (history, document) = {
            let mut state = session.lock().await;
            let history = state.model_history(self.history_window);
            state.append_turn(TurnRole::User, message.as_str());
            (history, state.draft().clone())
        };

        let credential = match self.entitlements.resolve(session.owner()).await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                tracing::info!(
                    session_id = %session.id(),
                    owner = %session.owner(),
                    "No credential available; asking user to upgrade"
                );
                return self.finish(session, UPGRADE_REPLY, None, true).await;
            }
            Err(e) => {
                tracing::error!(session_id = %session.id(), error = %e, "Failed to resolve credential");
                return self.finish(session, APOLOGY_REPLY, None, false).await;
            }
        };

        let request = CompletionRequest {
            system_prompt: self.system_prompt.clone(),
            history,
            message,
            document,
        };

        let outcome = match self.gateways.get(credential.provider) {
            Ok(gateway) => gateway.complete(&credential.api_key, &request).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(reply) => {
                let extraction = self.extractor.extract(&reply);
                let text = if extraction.display_text.is_empty() {
                    UPDATED_REPLY.to_string()
                } else {
                    extraction.display_text
                };
                tracing::debug!(
                    session_id = %session.id(),
                    provider = %credential.provider,
                    source = credential.source.as_str(),
                    has_patch = extraction.patch.is_some(),
                    "Assistant replied"
                );
                self.finish(session, &text, extraction.patch, false).await
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session.id(),
                    provider = %credential.provider,
                    error = %e,
                    "Model gateway call failed"
                );
                self.finish(session, APOLOGY_REPLY, None, false).await
            }
        }
    }

    async fn finish(
        &self,
        session: &SessionHandle,
        text: &str,
        patch: Option<Patch>,
        requires_upgrade: bool,
    ) -> SendMessageResponse {
        let mut state = session.lock().await;
        let reply = state.append_turn(TurnRole::Assistant, text);
        if let Some(patch) = &patch {
            state.apply_patch(patch);
        }
        let document: Document = state.draft().clone();
        SendMessageResponse {
            reply,
            patch,
            requires_upgrade,
            document,
        }
    }
}
