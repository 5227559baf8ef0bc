//! Conversation persistence, export, and prompt dispatch.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use pchat::{ChatErrorKind, ConversationStore, InMemoryConversationRepository};
//! use pprovider::{ProviderKind, Role};
//!
//! let repository = Arc::new(InMemoryConversationRepository::new());
//! let mut store = ConversationStore::new(repository, "exports");
//! assert_eq!(
//!     store.append_message(Role::User, "hi").unwrap_err().kind,
//!     ChatErrorKind::NoActiveConversation
//! );
//!
//! let conversation = store.start_new(ProviderKind::Google, "gemini-pro").unwrap();
//! store.append_message(Role::User, "hi").unwrap();
//! store.persist(None).unwrap();
//! assert_eq!(store.load(&conversation.id).unwrap().messages.len(), 1);
//! ```

mod clock;
mod error;
mod export;
mod repository;
mod service;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatReply, ChatService, Conversation, ConversationId,
        ConversationMessage, ConversationRepository, ConversationStore, ExportFormat,
        SharedConversationStore,
    };
}

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ChatError, ChatErrorKind};
pub use export::{
    ConversationRenderer, DISPLAY_TIME_FORMAT, DOCUMENT_LINES_PER_PAGE, DOCUMENT_WIDTH,
    DocumentRenderer, ExportFormat, PlainTextRenderer,
};
pub use repository::{
    ConversationRepository, FileConversationRepository, InMemoryConversationRepository,
};
pub use service::{ChatReply, ChatService, SharedConversationStore};
pub use store::ConversationStore;
pub use types::{CONVERSATION_ID_FORMAT, Conversation, ConversationId, ConversationMessage};
