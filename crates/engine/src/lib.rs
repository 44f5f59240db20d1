//! Conversational transaction capture.
//!
//! The engine turns a stream of chat [`Event`]s into validated expense,
//! income and quick-payment records. It owns the per-conversation sessions
//! and the flow logic; persistence, user enrollment and message delivery are
//! injected collaborators ([`Ledger`], [`UserDirectory`], [`Transport`]).

use std::{sync::Arc, time::Duration};

pub use auth::{Access, AccessMode, AuthorizationGate};
pub use backend::{Ledger, ProfileHints, UserDirectory};
pub use catalog::{DefaultCatalog, MessageCatalog};
pub use draft::{Category, DraftField, FieldValue, FlowKind, PaymentMethod, TransactionDraft};
pub use error::{BackendError, EngineError, TransportError, ValidationError};
pub use event::{CallbackAction, Command, Event, EventKind, MenuButton, SettingsAction};
pub use flows::{ActiveFlow, Completed, FlowState, Transition};
pub use locks::ConversationLocks;
pub use money::Amount;
pub use presentation::Presenter;
pub use session::{ConversationId, JsonSessionStore, MemorySessionStore, Session, SessionStore};
pub use transport::{Button, Keyboard, MessageId, Reply, Transport};

mod auth;
mod backend;
mod catalog;
mod dispatcher;
mod draft;
mod error;
mod event;
pub mod flows;
mod locks;
mod money;
mod presentation;
mod session;
mod transport;
pub mod validators;

type ResultEngine<T> = Result<T, EngineError>;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

pub struct Engine {
    store: Arc<dyn SessionStore>,
    ledger: Arc<dyn Ledger>,
    gate: AuthorizationGate,
    transport: Arc<dyn Transport>,
    presenter: Presenter,
    locks: ConversationLocks,
    session_ttl: chrono::Duration,
    call_timeout: Duration,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Seeds the authorized set from the user directory.
    pub async fn bootstrap(&self) -> usize {
        let loaded = self.gate.bootstrap().await;
        tracing::info!("Loaded {loaded} authorized users");
        loaded
    }

    /// Adds a user to the authorized set without asking the directory.
    pub async fn authorize(&self, user_id: impl Into<String>) {
        self.gate.insert(user_id).await;
    }

    pub async fn is_authorized(&self, user_id: &str) -> bool {
        self.gate.is_authorized(user_id).await
    }

    /// Current session of a conversation.
    pub async fn session(&self, id: ConversationId) -> ResultEngine<Session> {
        self.store.get(id).await
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn SessionStore>>,
    ledger: Option<Arc<dyn Ledger>>,
    directory: Option<Arc<dyn UserDirectory>>,
    transport: Option<Arc<dyn Transport>>,
    catalog: Option<Arc<dyn MessageCatalog>>,
    mode: AccessMode,
    session_ttl: Option<Duration>,
    call_timeout: Option<Duration>,
}

impl EngineBuilder {
    /// Session store. Defaults to [`MemorySessionStore`].
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn Ledger>) -> EngineBuilder {
        self.ledger = Some(ledger);
        self
    }

    pub fn directory(mut self, directory: Arc<dyn UserDirectory>) -> EngineBuilder {
        self.directory = Some(directory);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> EngineBuilder {
        self.transport = Some(transport);
        self
    }

    /// Wording of replies. Defaults to [`DefaultCatalog`].
    pub fn catalog(mut self, catalog: Arc<dyn MessageCatalog>) -> EngineBuilder {
        self.catalog = Some(catalog);
        self
    }

    pub fn mode(mut self, mode: AccessMode) -> EngineBuilder {
        self.mode = mode;
        self
    }

    /// Idle time after which an unfinished flow is discarded.
    pub fn session_ttl(mut self, ttl: Duration) -> EngineBuilder {
        self.session_ttl = Some(ttl);
        self
    }

    /// Upper bound for every collaborator call.
    pub fn call_timeout(mut self, timeout: Duration) -> EngineBuilder {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ResultEngine<Engine> {
        let ledger = self.ledger.ok_or(EngineError::MissingComponent("ledger"))?;
        let directory = self
            .directory
            .ok_or(EngineError::MissingComponent("user directory"))?;
        let transport = self
            .transport
            .ok_or(EngineError::MissingComponent("transport"))?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::default()));
        let catalog = self
            .catalog
            .unwrap_or_else(|| Arc::new(DefaultCatalog::default()));

        let call_timeout = self.call_timeout.unwrap_or(DEFAULT_CALL_TIMEOUT);
        let session_ttl = chrono::Duration::from_std(self.session_ttl.unwrap_or(DEFAULT_SESSION_TTL))
            .unwrap_or(chrono::Duration::MAX);

        Ok(Engine {
            store,
            ledger,
            gate: AuthorizationGate::new(self.mode, directory).with_call_timeout(call_timeout),
            transport,
            presenter: Presenter::new(catalog),
            locks: ConversationLocks::default(),
            session_ttl,
            call_timeout,
        })
    }
}
