//! Common imports for most parlance applications.

pub use crate::{
    ActiveConfig, ChatError, ChatErrorKind, ChatReply, CodeEditResult, Conversation,
    ConversationId, DispatchError, EditError, EditErrorKind, ExportFormat, ModelPair,
    ProviderError, ProviderErrorKind, ProviderKind, Role, TaskDispatcher, TaskHandle, Workbench,
    WorkbenchBuilder, WorkbenchConfig, WorkbenchError, WorkbenchErrorKind, init_tracing,
    normalize_text,
};
