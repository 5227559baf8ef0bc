//! Conversation records and their persisted shape.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Local, NaiveDateTime};
use pprovider::{ProviderKind, Role};
use serde::{Deserialize, Deserializer, Serialize};

pub const CONVERSATION_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// ISO-8601 local time without an offset, as older records store it.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Conversation identifier derived from the creation time, e.g. `20240105_142233`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn from_time(created_at: &DateTime<Local>) -> Self {
        Self(created_at.format(CONVERSATION_ID_FORMAT).to_string())
    }

    /// Disambiguates ids created within the same second.
    pub fn with_suffix(&self, n: u32) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ConversationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub provider: ProviderKind,
    pub model: String,
    #[serde(rename = "timestamp", deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Local>,
    pub messages: Vec<ConversationMessage>,
}

impl Conversation {
    pub fn new(
        id: ConversationId,
        provider: ProviderKind,
        model: impl Into<String>,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            id,
            provider,
            model: model.into(),
            created_at,
            messages: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, role: Role, content: impl Into<String>, at: DateTime<Local>) {
        self.messages.push(ConversationMessage {
            role,
            content: content.into(),
            timestamp: at,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Parses RFC 3339, then falls back to an offset-less timestamp read as local time.
fn parse_timestamp(value: &str) -> Option<DateTime<Local>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Local));
    }
    NaiveDateTime::parse_from_str(value, NAIVE_TIMESTAMP_FORMAT)
        .ok()?
        .and_local_timezone(Local)
        .earliest()
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};
    use pprovider::{ProviderKind, Role};

    use super::{Conversation, ConversationId, parse_timestamp};

    #[test]
    fn timestamps_without_offset_read_as_local_time() {
        let parsed = parse_timestamp("2024-01-05T14:22:33.123456").expect("naive timestamp");
        assert_eq!(parsed.format("%Y%m%d_%H%M%S").to_string(), "20240105_142233");
        assert_eq!(parsed.timestamp_subsec_micros(), 123456);

        assert!(parse_timestamp("2024-01-05T14:22:33+00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn id_follows_creation_time() {
        let created = Local
            .with_ymd_and_hms(2024, 1, 5, 14, 22, 33)
            .single()
            .expect("valid time");
        let id = ConversationId::from_time(&created);
        assert_eq!(id.as_str(), "20240105_142233");
        assert_eq!(id.with_suffix(2).as_str(), "20240105_142233-2");
    }

    #[test]
    fn record_uses_lowercase_names_and_timestamp_key() {
        let created = Local
            .with_ymd_and_hms(2024, 1, 5, 14, 22, 33)
            .single()
            .expect("valid time");
        let mut conversation = Conversation::new(
            ConversationId::from_time(&created),
            ProviderKind::OpenAi,
            "gpt-4",
            created,
        );
        conversation.push(Role::User, "hi", created);

        let value = serde_json::to_value(&conversation).expect("serializes");
        assert_eq!(value["id"], "20240105_142233");
        assert_eq!(value["provider"], "openai");
        assert_eq!(value["messages"][0]["role"], "user");
        assert!(value.get("timestamp").is_some());
        assert!(value.get("created_at").is_none());

        let decoded: Conversation = serde_json::from_value(value).expect("deserializes");
        assert_eq!(decoded, conversation);
    }
}
