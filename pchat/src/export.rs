//! Human-readable renderings of a conversation record.
//!
//! ```rust
//! use chrono::Local;
//! use pchat::{Conversation, ConversationId, ConversationRenderer, ExportFormat};
//! use pprovider::ProviderKind;
//!
//! let conversation = Conversation::new(
//!     ConversationId::new("20240105_142233"),
//!     ProviderKind::Anthropic,
//!     "claude-3-opus-20240229",
//!     Local::now(),
//! );
//! let text = ExportFormat::PlainText.renderer().render(&conversation);
//! assert!(text.starts_with("Conversation 20240105_142233"));
//! assert_eq!(
//!     ExportFormat::Document.file_name(&conversation.id),
//!     "conversation_20240105_142233_document.txt"
//! );
//! ```

use chrono::{DateTime, Local};
use pprovider::Role;

use crate::{Conversation, ConversationId};

pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DOCUMENT_WIDTH: usize = 80;
pub const DOCUMENT_LINES_PER_PAGE: usize = 50;

const FORM_FEED: char = '\u{000C}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    PlainText,
    /// Paginated fixed-width document.
    Document,
}

impl ExportFormat {
    pub fn file_name(&self, id: &ConversationId) -> String {
        match self {
            Self::PlainText => format!("conversation_{id}.txt"),
            Self::Document => format!("conversation_{id}_document.txt"),
        }
    }

    pub fn renderer(&self) -> Box<dyn ConversationRenderer> {
        match self {
            Self::PlainText => Box::new(PlainTextRenderer),
            Self::Document => Box::new(DocumentRenderer::default()),
        }
    }
}

pub trait ConversationRenderer: Send + Sync + std::fmt::Debug {
    fn render(&self, conversation: &Conversation) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl ConversationRenderer for PlainTextRenderer {
    fn render(&self, conversation: &Conversation) -> String {
        let mut out = header_lines(conversation).join("\n");
        out.push_str("\n\n");

        for message in &conversation.messages {
            out.push_str(&message_heading(message.role, &message.timestamp));
            out.push('\n');
            out.push_str(&message.content);
            out.push_str("\n\n");
        }

        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DocumentRenderer {
    width: usize,
    lines_per_page: usize,
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self {
            width: DOCUMENT_WIDTH,
            lines_per_page: DOCUMENT_LINES_PER_PAGE,
        }
    }
}

impl DocumentRenderer {
    /// `lines_per_page` includes the blank separator and footer line.
    /// Values below 3 are raised to 3.
    pub fn new(width: usize, lines_per_page: usize) -> Self {
        Self {
            width: width.max(1),
            lines_per_page: lines_per_page.max(3),
        }
    }

    fn body_lines(&self, conversation: &Conversation) -> Vec<String> {
        let mut lines = Vec::new();
        for line in header_lines(conversation) {
            self.push_wrapped(&mut lines, &line);
        }
        lines.push(String::new());

        for message in &conversation.messages {
            self.push_wrapped(&mut lines, &message_heading(message.role, &message.timestamp));
            for paragraph in message.content.lines() {
                self.push_wrapped(&mut lines, paragraph);
            }
            lines.push(String::new());
        }

        lines
    }

    fn push_wrapped(&self, lines: &mut Vec<String>, text: &str) {
        if text.trim().is_empty() {
            lines.push(String::new());
            return;
        }
        lines.extend(
            textwrap::wrap(text, self.width)
                .into_iter()
                .map(|line| line.into_owned()),
        );
    }
}

impl ConversationRenderer for DocumentRenderer {
    fn render(&self, conversation: &Conversation) -> String {
        let body = self.body_lines(conversation);
        let per_page = self.lines_per_page - 2;
        let pages: Vec<&[String]> = body.chunks(per_page).collect();
        let total = pages.len().max(1);

        pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                let footer = format!("Page {} of {total}", index + 1);
                let mut text = page.join("\n");
                text.push_str("\n\n");
                text.push_str(&format!("{footer:>width$}", width = self.width));
                text.push('\n');
                text
            })
            .collect::<Vec<_>>()
            .join(&FORM_FEED.to_string())
    }
}

fn header_lines(conversation: &Conversation) -> Vec<String> {
    vec![
        format!("Conversation {}", conversation.id),
        format!("Provider: {}", conversation.provider),
        format!("Model: {}", conversation.model),
        format!(
            "Started: {}",
            conversation.created_at.format(DISPLAY_TIME_FORMAT)
        ),
        "=".repeat(60),
    ]
}

fn message_heading(role: Role, timestamp: &DateTime<Local>) -> String {
    let label = match role {
        Role::User => "User",
        Role::Assistant => "Assistant",
    };
    format!("[{}] {label}:", timestamp.format(DISPLAY_TIME_FORMAT))
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};
    use pprovider::{ProviderKind, Role};

    use super::{ConversationRenderer, DocumentRenderer, PlainTextRenderer};
    use crate::{Conversation, ConversationId};

    fn sample(messages: usize) -> Conversation {
        let created = Local
            .with_ymd_and_hms(2024, 3, 9, 8, 30, 0)
            .single()
            .expect("valid time");
        let mut conversation = Conversation::new(
            ConversationId::from_time(&created),
            ProviderKind::Mistral,
            "mistral-large",
            created,
        );
        for index in 0..messages {
            let role = if index % 2 == 0 { Role::User } else { Role::Assistant };
            conversation.push(role, format!("message number {index}"), created);
        }
        conversation
    }

    #[test]
    fn plain_text_lists_messages_in_order() {
        let text = PlainTextRenderer.render(&sample(2));

        assert!(text.contains("Provider: mistral\nModel: mistral-large"));
        let user = text
            .find("[2024-03-09 08:30:00] User:\nmessage number 0")
            .expect("user block");
        let assistant = text
            .find("[2024-03-09 08:30:00] Assistant:\nmessage number 1")
            .expect("assistant block");
        assert!(user < assistant);
    }

    #[test]
    fn document_wraps_and_paginates() {
        let mut conversation = sample(0);
        conversation.push(Role::User, "word ".repeat(40), conversation.created_at);

        let text = DocumentRenderer::new(20, 10).render(&conversation);
        let pages: Vec<&str> = text.split('\u{000C}').collect();

        assert!(pages.len() > 1);
        for (index, page) in pages.iter().enumerate() {
            let lines: Vec<&str> = page.lines().collect();
            assert!(lines.len() <= 10);
            assert!(lines.iter().all(|line| line.chars().count() <= 20));
            assert!(
                lines
                    .last()
                    .expect("footer")
                    .ends_with(&format!("Page {} of {}", index + 1, pages.len()))
            );
        }
    }

    #[test]
    fn empty_conversation_renders_one_page() {
        let text = DocumentRenderer::default().render(&sample(0));
        assert!(!text.contains('\u{000C}'));
        assert!(text.trim_end().ends_with("Page 1 of 1"));
    }
}
