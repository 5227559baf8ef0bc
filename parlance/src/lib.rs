//! Facade over the parlance workspace crates.
//!
//! [`Workbench`] is the application core: it resolves a provider credential,
//! sends prompts and records conversations, and runs code-edit sessions, with
//! every slow operation executed through the [`TaskDispatcher`].
//!
//! ```rust,no_run
//! use parlance::{Workbench, WorkbenchConfig, init_tracing};
//!
//! init_tracing(None)?;
//! let workbench = Workbench::open(WorkbenchConfig::from_env()?)?;
//! workbench.send_prompt("Summarize RFC 9110 in one line", |reply| match reply {
//!     Ok(reply) => println!("{}", reply.text),
//!     Err(error) => eprintln!("{error}"),
//! })?;
//! workbench.shutdown();
//! # Ok::<(), parlance::WorkbenchError>(())
//! ```

mod error;
mod workbench;

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod prelude;

pub use pchat;
pub use pcommon;
pub use pedit;
pub use pobserve;
pub use pprovider;

pub use config::{
    DEFAULT_REQUEST_TIMEOUT, ENGINE_ENV, HOME_ENV, SECRETS_ENV, TIMEOUT_ENV, WorkbenchConfig,
};
pub use dispatch::{
    DELIVERY_THREAD_NAME, DispatchError, DispatchErrorKind, TaskDispatcher, TaskHandle,
};
pub use error::{WorkbenchError, WorkbenchErrorKind};
pub use logging::{DEFAULT_LOG_DIRECTIVE, LOG_ENV, filter_directive, init_tracing};
pub use workbench::{Workbench, WorkbenchBuilder};

pub use pchat::{
    ChatError, ChatErrorKind, ChatReply, ChatService, Conversation, ConversationId,
    ConversationMessage, ConversationStore, ExportFormat,
};
pub use pcommon::normalize_text;
pub use pedit::{
    AiderCliEngine, CodeEditEngine, CodeEditRequest, CodeEditResult, CodeEditSession, EditError,
    EditErrorKind, EditFailure, EditSuccess, ModelPair, SharedEditSession,
};
pub use pprovider::{
    ActiveConfig, CredentialError, CredentialErrorKind, CredentialResolver, ProviderClient,
    ProviderError, ProviderErrorKind, ProviderKind, Role, SecretChange,
};
