//! The active-conversation state machine over a conversation repository.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pprovider::{ProviderKind, Role};

use crate::{
    ChatError, Clock, Conversation, ConversationId, ConversationRepository, ExportFormat,
    SystemClock,
};

/// Owns at most one active conversation and persists records through a repository.
///
/// Once persisted, the repository copy is authoritative; the in-memory active
/// conversation is a cache of the latest state.
#[derive(Debug)]
pub struct ConversationStore {
    repository: Arc<dyn ConversationRepository>,
    clock: Arc<dyn Clock>,
    exports_dir: PathBuf,
    active: Option<Conversation>,
}

impl ConversationStore {
    pub fn new(repository: Arc<dyn ConversationRepository>, exports_dir: impl AsRef<Path>) -> Self {
        Self {
            repository,
            clock: Arc::new(SystemClock),
            exports_dir: exports_dir.as_ref().to_path_buf(),
            active: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active.as_ref()
    }

    pub fn exports_dir(&self) -> &Path {
        &self.exports_dir
    }

    /// Persists the current conversation, if any, then activates a fresh one.
    pub fn start_new(
        &mut self,
        provider: ProviderKind,
        model: impl Into<String>,
    ) -> Result<Conversation, ChatError> {
        if let Some(previous) = &self.active {
            self.repository.save(previous)?;
        }

        let created_at = self.clock.now();
        let id = self.unique_id(ConversationId::from_time(&created_at))?;
        let conversation = Conversation::new(id, provider, model, created_at);

        tracing::info!(
            phase = "conversations",
            event = "started",
            id = %conversation.id,
            provider = %conversation.provider,
            model = %conversation.model
        );
        self.active = Some(conversation.clone());
        Ok(conversation)
    }

    pub fn append_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
    ) -> Result<(), ChatError> {
        let now = self.clock.now();
        let active = self
            .active
            .as_mut()
            .ok_or_else(ChatError::no_active_conversation)?;
        active.push(role, content, now);
        Ok(())
    }

    /// Writes `conversation`, or the active one when `None`.
    /// Returns `false` when there was nothing to write.
    pub fn persist(&self, conversation: Option<&Conversation>) -> Result<bool, ChatError> {
        let Some(conversation) = conversation.or(self.active.as_ref()) else {
            return Ok(false);
        };

        self.repository.save(conversation)?;
        tracing::debug!(
            phase = "conversations",
            event = "persisted",
            id = %conversation.id,
            messages = conversation.messages.len()
        );
        Ok(true)
    }

    pub fn load(&self, id: &ConversationId) -> Result<Conversation, ChatError> {
        self.repository.load(id)
    }

    /// Every stored conversation, most recently created first.
    pub fn list(&self) -> Result<Vec<Conversation>, ChatError> {
        let mut conversations = self.repository.load_all()?;
        conversations.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| right.id.cmp(&left.id))
        });
        Ok(conversations)
    }

    /// Renders the conversation into the exports directory and returns the written path.
    pub fn export(&self, id: &ConversationId, format: ExportFormat) -> Result<PathBuf, ChatError> {
        let conversation = match &self.active {
            Some(active) if &active.id == id => active.clone(),
            _ => self.repository.load(id)?,
        };

        fs::create_dir_all(&self.exports_dir).map_err(|error| {
            ChatError::export(format!(
                "failed to create {}: {error}",
                self.exports_dir.display()
            ))
        })?;

        let path = self.exports_dir.join(format.file_name(id));
        let rendered = format.renderer().render(&conversation);
        fs::write(&path, rendered).map_err(|error| {
            ChatError::export(format!("failed to write {}: {error}", path.display()))
        })?;

        tracing::info!(
            phase = "conversations",
            event = "exported",
            id = %id,
            format = ?format,
            path = %path.display()
        );
        Ok(path)
    }

    fn unique_id(&self, base: ConversationId) -> Result<ConversationId, ChatError> {
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.repository.exists(&candidate)?
            || self.active.as_ref().is_some_and(|active| active.id == candidate)
        {
            candidate = base.with_suffix(suffix);
            suffix += 1;
        }
        Ok(candidate)
    }
}
