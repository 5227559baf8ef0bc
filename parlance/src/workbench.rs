//! Wires credentials, chat, edit sessions, and background dispatch together.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use pchat::{
    ChatError, ChatReply, ChatService, Conversation, ConversationId, ConversationStore,
    ExportFormat, FileConversationRepository,
};
use pedit::{
    AiderCliEngine, CodeEditEngine, CodeEditRequest, CodeEditResult, CodeEditSession, EditError,
    EditFailure, ModelPair, SharedEditSession,
};
use pobserve::{MetricsObservabilityHooks, SafeEditHooks, SafeProviderHooks};
use pprovider::{
    ActiveConfig, CredentialResolver, FileSecretStore, HttpTransport, ProviderClient,
    ProviderError, ProviderKind, SecretChange, SecretStore,
};
use tokio::sync::broadcast;

use crate::{TaskDispatcher, TaskHandle, WorkbenchConfig, WorkbenchError};

pub struct WorkbenchBuilder<E> {
    config: WorkbenchConfig,
    secret_store: Option<Arc<dyn SecretStore>>,
    transport: Option<Arc<dyn HttpTransport>>,
    engine: E,
}

impl WorkbenchBuilder<AiderCliEngine> {
    pub fn new(config: WorkbenchConfig) -> Self {
        let engine = AiderCliEngine::new(config.engine_binary.clone());
        Self {
            config,
            secret_store: None,
            transport: None,
            engine,
        }
    }
}

impl<E: CodeEditEngine + 'static> WorkbenchBuilder<E> {
    pub fn secret_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.secret_store = Some(store);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn engine<F: CodeEditEngine + 'static>(self, engine: F) -> WorkbenchBuilder<F> {
        WorkbenchBuilder {
            config: self.config,
            secret_store: self.secret_store,
            transport: self.transport,
            engine,
        }
    }

    /// Resolves a credential and starts the dispatcher. No usable credential is fatal.
    pub fn build(self) -> Result<Workbench<E>, WorkbenchError> {
        let config = self.config;
        let store: Arc<dyn SecretStore> = match self.secret_store {
            Some(store) => store,
            None => Arc::new(FileSecretStore::new(&config.secrets_path)),
        };
        let resolver = CredentialResolver::new(store)
            .with_priority(config.provider_priority.clone())
            .with_env_export(config.export_env);
        let active = resolver.resolve()?;

        let client = match self.transport {
            Some(transport) => ProviderClient::new(transport),
            None => ProviderClient::with_timeout(config.request_timeout)?,
        }
        .with_hooks(Arc::new(SafeProviderHooks::new(MetricsObservabilityHooks)));

        let repository = Arc::new(FileConversationRepository::new(config.conversations_dir()));
        let conversations = ConversationStore::new(repository, config.exports_dir());
        let chat = ChatService::new(client, Arc::new(Mutex::new(conversations)));

        let session = CodeEditSession::new(self.engine)
            .with_hooks(Arc::new(SafeEditHooks::new(MetricsObservabilityHooks)));

        tracing::info!(
            phase = "workbench",
            event = "ready",
            provider = %active.provider(),
            model = %active.model,
            data_dir = %config.data_dir.display()
        );

        Ok(Workbench {
            config,
            resolver,
            chat,
            edits: SharedEditSession::new(session),
            edit_models: RwLock::new(None),
            dispatcher: TaskDispatcher::start()?,
        })
    }
}

/// The application core: one resolver, one conversation store, one edit session.
pub struct Workbench<E = AiderCliEngine> {
    config: WorkbenchConfig,
    resolver: CredentialResolver,
    chat: ChatService,
    edits: SharedEditSession<E>,
    edit_models: RwLock<Option<ModelPair>>,
    dispatcher: TaskDispatcher,
}

impl Workbench<AiderCliEngine> {
    pub fn builder(config: WorkbenchConfig) -> WorkbenchBuilder<AiderCliEngine> {
        WorkbenchBuilder::new(config)
    }

    pub fn open(config: WorkbenchConfig) -> Result<Self, WorkbenchError> {
        WorkbenchBuilder::new(config).build()
    }
}

impl<E: CodeEditEngine + 'static> Workbench<E> {
    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    pub fn active_config(&self) -> Result<Arc<ActiveConfig>, WorkbenchError> {
        self.resolver.active().ok_or_else(|| {
            WorkbenchError::new(
                crate::WorkbenchErrorKind::Credential,
                "no active provider configuration",
            )
        })
    }

    /// Re-runs credential discovery against the secret store, e.g. after it was edited.
    pub fn reresolve_credentials(&self) -> Result<Arc<ActiveConfig>, WorkbenchError> {
        Ok(self.resolver.resolve()?)
    }

    pub fn subscribe_secret_changes(&self) -> broadcast::Receiver<SecretChange> {
        self.resolver.subscribe()
    }

    pub fn save_api_key(&self, provider: ProviderKind, secret: &str) -> Result<(), WorkbenchError> {
        Ok(self.resolver.save_credential(provider, secret)?)
    }

    /// Switches the chat model within the active provider's catalogue.
    pub fn select_model(&self, model: &str) -> Result<Arc<ActiveConfig>, WorkbenchError> {
        let provider = self.active_config()?.provider();
        if !provider.supports_model(model) {
            return Err(WorkbenchError::unsupported_model(provider, model));
        }
        Ok(self.resolver.select_model(model)?)
    }

    /// Sets the main and optional weak model used for code edits.
    pub fn set_edit_models(
        &self,
        main: &str,
        weak: Option<&str>,
    ) -> Result<ModelPair, WorkbenchError> {
        let provider = self.active_config()?.provider();
        for model in std::iter::once(main).chain(weak) {
            if !provider.supports_model(model) {
                return Err(WorkbenchError::unsupported_model(provider, model));
            }
        }

        let mut models = ModelPair::new(main);
        if let Some(weak) = weak {
            models = models.with_weak(weak);
        }
        let mut slot = self
            .edit_models
            .write()
            .map_err(|_| WorkbenchError::config("edit model lock poisoned"))?;
        *slot = Some(models.clone());
        Ok(models)
    }

    /// Edit models in effect: the explicit pair, else the active chat model.
    pub fn edit_models(&self) -> Result<ModelPair, WorkbenchError> {
        let explicit = self
            .edit_models
            .read()
            .map_err(|_| WorkbenchError::config("edit model lock poisoned"))?
            .clone();
        match explicit {
            Some(models) => Ok(models),
            None => Ok(ModelPair::new(self.active_config()?.model.clone())),
        }
    }

    /// Sends `prompt` in the background; `on_reply` runs on the delivery thread.
    pub fn send_prompt<C>(
        &self,
        prompt: impl Into<String>,
        on_reply: C,
    ) -> Result<TaskHandle, WorkbenchError>
    where
        C: FnOnce(Result<ChatReply, WorkbenchError>) + Send + 'static,
    {
        let config = self.active_config()?;
        let chat = self.chat.clone();
        let prompt = prompt.into();

        Ok(self.dispatcher.spawn_future(
            "chat",
            async move { chat.send_prompt(&config, &prompt).await },
            move |outcome| on_reply(flatten(outcome)),
        )?)
    }

    /// Lists the active provider's models in the background.
    pub fn list_models<C>(&self, on_models: C) -> Result<TaskHandle, WorkbenchError>
    where
        C: FnOnce(Result<Vec<String>, WorkbenchError>) + Send + 'static,
    {
        let config = self.active_config()?;
        let client = self.chat.client().clone();

        Ok(self.dispatcher.spawn_future(
            "list_models",
            async move { client.list_models(&config.credential).await },
            move |outcome: Result<Result<Vec<String>, ProviderError>, _>| {
                on_models(flatten(outcome))
            },
        )?)
    }

    /// Runs one code-edit request in the background. A request made while another
    /// is in flight fails with `Busy`.
    pub fn request_edit<C>(
        &self,
        instruction: impl Into<String>,
        files: Vec<PathBuf>,
        on_result: C,
    ) -> Result<TaskHandle, WorkbenchError>
    where
        C: FnOnce(CodeEditResult) + Send + 'static,
    {
        let request = CodeEditRequest::new(instruction, files, self.edit_models()?);
        let session = self.edits.clone();

        Ok(self.dispatcher.run_in_background(
            "code_edit",
            move || session.try_process(request),
            move |outcome| {
                on_result(outcome.unwrap_or_else(|error| {
                    CodeEditResult::Failure(EditFailure {
                        error: EditError::engine_failure(error.message),
                        console_output: String::new(),
                        skipped_files: Vec::new(),
                    })
                }))
            },
        )?)
    }

    /// Persists the current conversation and starts an empty one on the active configuration.
    pub fn start_new_conversation(&self) -> Result<Conversation, WorkbenchError> {
        let active = self.active_config()?;
        Ok(self.conversations()?.start_new(active.provider(), &active.model)?)
    }

    pub fn list_conversations(&self) -> Result<Vec<Conversation>, WorkbenchError> {
        Ok(self.conversations()?.list()?)
    }

    pub fn load_conversation(&self, id: &ConversationId) -> Result<Conversation, WorkbenchError> {
        Ok(self.conversations()?.load(id)?)
    }

    pub fn export_conversation(
        &self,
        id: &ConversationId,
        format: ExportFormat,
    ) -> Result<PathBuf, WorkbenchError> {
        Ok(self.conversations()?.export(id, format)?)
    }

    /// Waits for in-flight work to deliver its results, then stops the delivery thread.
    pub fn shutdown(self) {
        self.dispatcher.shutdown();
    }

    fn conversations(&self) -> Result<MutexGuard<'_, ConversationStore>, WorkbenchError> {
        self.chat
            .store()
            .lock()
            .map_err(|_| ChatError::storage("conversation store lock poisoned").into())
    }
}

impl<E: std::fmt::Debug> std::fmt::Debug for Workbench<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("config", &self.config)
            .field("active", &self.resolver.active().map(|active| active.provider()))
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}

fn flatten<T, X>(outcome: Result<Result<T, X>, crate::DispatchError>) -> Result<T, WorkbenchError>
where
    WorkbenchError: From<X>,
{
    outcome?.map_err(WorkbenchError::from)
}
