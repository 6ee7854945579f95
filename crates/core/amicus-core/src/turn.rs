//! Turn orchestration: one user-message-to-assistant-message exchange

use crate::accumulator::{drive, TurnOutcome};
use crate::store::HistoryStore;
use crate::transport::ChatTransport;
use crate::types::{Conversation, Message, TurnStatus};
use crate::{AmicusError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Drives one conversation turn end to end
///
/// Appends the user message and an assistant placeholder, streams the
/// transport response through the accumulator into the placeholder, freezes
/// the result, and persists the conversation. Only one turn may be in flight
/// per orchestrator at a time.
pub struct TurnOrchestrator {
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn HistoryStore>,
    system_instruction: String,
    in_flight: AtomicBool,
}

impl TurnOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn HistoryStore>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            system_instruction: system_instruction.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one turn
    ///
    /// `on_update` receives the conversation after every incremental change
    /// to the streaming assistant message, and a final time once the message
    /// is frozen. A transport that cannot open a stream at all (missing API
    /// key, unreachable endpoint) fails the turn before any message is
    /// created; the conversation is left untouched. Once streaming has
    /// started, a store write failure is logged as a warning and does not
    /// fail the turn, since the in-memory conversation stays authoritative
    /// for the session.
    pub async fn run_turn<F>(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
        mut on_update: F,
    ) -> Result<TurnOutcome>
    where
        F: FnMut(&Conversation),
    {
        if user_text.trim().is_empty() {
            return Err(AmicusError::validation("Message text cannot be empty"));
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(AmicusError::validation(
                "A turn is already in flight for this conversation",
            ));
        }

        let outcome = self
            .run_turn_inner(conversation, user_text, &mut on_update)
            .await;
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    async fn run_turn_inner<F>(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
        on_update: &mut F,
    ) -> Result<TurnOutcome>
    where
        F: FnMut(&Conversation),
    {
        let prior = conversation.messages.clone();

        debug!(
            "Starting turn for {} via {} ({} prior messages)",
            conversation.user_key,
            self.transport.name(),
            prior.len()
        );

        // Open the stream before touching the conversation; a transport
        // that never starts must not leave a partial turn behind.
        let stream = self
            .transport
            .start_stream(&self.system_instruction, &prior, user_text)
            .await?;

        conversation.messages.push(Message::user(user_text));
        conversation.messages.push(Message::assistant_placeholder());
        let placeholder = conversation.messages.len() - 1;
        on_update(conversation);

        conversation.messages[placeholder].status = TurnStatus::Streaming;
        let outcome = drive(stream, |text| {
            conversation.messages[placeholder].content = text.to_string();
            on_update(conversation);
        })
        .await;

        let message = &mut conversation.messages[placeholder];
        message.content = outcome.text.clone();
        message.sources = outcome.sources.clone();
        message.status = outcome.status;
        on_update(conversation);

        if let Err(e) = self
            .store
            .set(&conversation.user_key, &conversation.messages)
            .await
        {
            warn!(
                "Failed to persist conversation for {}: {}",
                conversation.user_key, e
            );
        }

        Ok(outcome)
    }
}
