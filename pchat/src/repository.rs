//! Persistent conversation records keyed by conversation id.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{ChatError, Conversation, ConversationId};

const RECORD_PREFIX: &str = "conversation_";
const RECORD_EXTENSION: &str = "json";

pub trait ConversationRepository: Send + Sync + std::fmt::Debug {
    /// Writes the record, replacing any earlier record with the same id.
    fn save(&self, conversation: &Conversation) -> Result<(), ChatError>;

    fn load(&self, id: &ConversationId) -> Result<Conversation, ChatError>;

    fn exists(&self, id: &ConversationId) -> Result<bool, ChatError>;

    /// Every stored record, in no particular order.
    fn load_all(&self) -> Result<Vec<Conversation>, ChatError>;
}

#[derive(Debug, Default)]
pub struct InMemoryConversationRepository {
    records: Mutex<HashMap<ConversationId, Conversation>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<ConversationId, Conversation>>, ChatError> {
        self.records
            .lock()
            .map_err(|_| ChatError::storage("conversation repository lock poisoned"))
    }
}

impl ConversationRepository for InMemoryConversationRepository {
    fn save(&self, conversation: &Conversation) -> Result<(), ChatError> {
        self.records()?
            .insert(conversation.id.clone(), conversation.clone());
        Ok(())
    }

    fn load(&self, id: &ConversationId) -> Result<Conversation, ChatError> {
        self.records()?
            .get(id)
            .cloned()
            .ok_or_else(|| ChatError::not_found(id.as_str()))
    }

    fn exists(&self, id: &ConversationId) -> Result<bool, ChatError> {
        Ok(self.records()?.contains_key(id))
    }

    fn load_all(&self) -> Result<Vec<Conversation>, ChatError> {
        Ok(self.records()?.values().cloned().collect())
    }
}

/// One pretty-printed `conversation_{id}.json` file per conversation.
#[derive(Debug, Clone)]
pub struct FileConversationRepository {
    dir: PathBuf,
}

impl FileConversationRepository {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, id: &ConversationId) -> PathBuf {
        self.dir
            .join(format!("{RECORD_PREFIX}{id}.{RECORD_EXTENSION}"))
    }

    fn read_record(path: &Path) -> Result<Conversation, ChatError> {
        let bytes = fs::read(path).map_err(|error| {
            ChatError::storage(format!("failed to read {}: {error}", path.display()))
        })?;
        serde_json::from_slice(&bytes).map_err(|error| {
            ChatError::storage(format!("{} is not a conversation record: {error}", path.display()))
        })
    }
}

impl ConversationRepository for FileConversationRepository {
    fn save(&self, conversation: &Conversation) -> Result<(), ChatError> {
        let bytes = serde_json::to_vec_pretty(conversation).map_err(|error| {
            ChatError::storage(format!("failed to serialize conversation: {error}"))
        })?;
        write_atomic(&self.record_path(&conversation.id), &bytes)
    }

    fn load(&self, id: &ConversationId) -> Result<Conversation, ChatError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(ChatError::not_found(id.as_str()));
        }
        Self::read_record(&path)
    }

    fn exists(&self, id: &ConversationId) -> Result<bool, ChatError> {
        Ok(self.record_path(id).exists())
    }

    fn load_all(&self) -> Result<Vec<Conversation>, ChatError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|error| {
            ChatError::storage(format!("failed to list {}: {error}", self.dir.display()))
        })?;

        let mut conversations = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|error| ChatError::storage(error.to_string()))?;
            let path = entry.path();
            let is_record = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    name.starts_with(RECORD_PREFIX)
                        && name.ends_with(&format!(".{RECORD_EXTENSION}"))
                });
            if !is_record {
                continue;
            }

            match Self::read_record(&path) {
                Ok(conversation) => conversations.push(conversation),
                Err(error) => {
                    tracing::warn!(
                        phase = "conversations",
                        event = "skip_unreadable_record",
                        path = %path.display(),
                        error = %error.message
                    );
                }
            }
        }

        Ok(conversations)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ChatError> {
    let Some(parent) = path.parent() else {
        return Err(ChatError::storage("record path missing parent directory"));
    };
    fs::create_dir_all(parent).map_err(|error| {
        ChatError::storage(format!("failed to create {}: {error}", parent.display()))
    })?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(|error| {
        ChatError::storage(format!("failed to write {}: {error}", tmp.display()))
    })?;
    fs::rename(&tmp, path).map_err(|error| {
        ChatError::storage(format!("failed to replace {}: {error}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};
    use pprovider::ProviderKind;

    use super::{ConversationRepository, FileConversationRepository};
    use crate::{ChatErrorKind, Conversation, ConversationId};

    fn conversation(id: &str) -> Conversation {
        let created = Local
            .with_ymd_and_hms(2024, 2, 1, 9, 0, 0)
            .single()
            .expect("valid time");
        Conversation::new(ConversationId::new(id), ProviderKind::Google, "gemini-pro", created)
    }

    #[test]
    fn resave_overwrites_the_same_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repository = FileConversationRepository::new(dir.path().join("conversations"));

        let mut record = conversation("20240201_090000");
        repository.save(&record).expect("first save");
        record.model = "gemini-1.5-pro".to_string();
        repository.save(&record).expect("second save");

        let files = std::fs::read_dir(repository.dir())
            .expect("listing")
            .count();
        assert_eq!(files, 1);
        assert_eq!(
            repository.load(&record.id).expect("loads").model,
            "gemini-1.5-pro"
        );
    }

    #[test]
    fn unknown_id_is_not_found_and_junk_is_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repository = FileConversationRepository::new(dir.path());
        repository
            .save(&conversation("20240201_090000"))
            .expect("save");
        std::fs::write(dir.path().join("conversation_broken.json"), "{").expect("write");
        std::fs::write(dir.path().join("notes.txt"), "hello").expect("write");

        let error = repository
            .load(&ConversationId::new("19990101_000000"))
            .expect_err("missing");
        assert_eq!(error.kind, ChatErrorKind::NotFound);
        assert_eq!(repository.load_all().expect("lists").len(), 1);
    }
}
