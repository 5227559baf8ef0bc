//! Prompt dispatch that records successful exchanges in the active conversation.

use std::sync::{Arc, Mutex, MutexGuard};

use pprovider::{ActiveConfig, CompletionRequest, ProviderClient, Role};

use crate::{ChatError, ConversationId, ConversationStore};

pub type SharedConversationStore = Arc<Mutex<ConversationStore>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub conversation_id: ConversationId,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ChatService {
    client: ProviderClient,
    store: SharedConversationStore,
}

impl ChatService {
    pub fn new(client: ProviderClient, store: SharedConversationStore) -> Self {
        Self { client, store }
    }

    pub fn client(&self) -> &ProviderClient {
        &self.client
    }

    pub fn store(&self) -> &SharedConversationStore {
        &self.store
    }

    /// Sends one prompt with the given provider configuration.
    ///
    /// On success the user and assistant messages are appended to the active
    /// conversation (started on demand) and persisted. On failure nothing is
    /// appended.
    pub async fn send_prompt(
        &self,
        config: &ActiveConfig,
        prompt: &str,
    ) -> Result<ChatReply, ChatError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ChatError::invalid_request("prompt must not be empty"));
        }
        if config.model.trim().is_empty() {
            return Err(ChatError::invalid_request("model is required"));
        }

        let text = self
            .client
            .complete(
                &config.credential,
                CompletionRequest::from_prompt(&config.model, prompt),
            )
            .await?;

        let mut store = lock_store(&self.store)?;
        if store.active().is_none() {
            store.start_new(config.provider(), &config.model)?;
        }

        store.append_message(Role::User, prompt)?;
        store.append_message(Role::Assistant, &text)?;
        store.persist(None)?;

        let conversation_id = store
            .active()
            .map(|active| active.id.clone())
            .ok_or_else(ChatError::no_active_conversation)?;

        tracing::info!(
            phase = "chat",
            event = "reply_recorded",
            conversation = %conversation_id,
            provider = %config.provider(),
            chars = text.len()
        );
        Ok(ChatReply {
            conversation_id,
            text,
        })
    }
}

fn lock_store(
    store: &SharedConversationStore,
) -> Result<MutexGuard<'_, ConversationStore>, ChatError> {
    store
        .lock()
        .map_err(|_| ChatError::storage("conversation store lock poisoned"))
}
