//! Per-conversation working memory and the stores that keep it.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    draft::{FlowKind, TransactionDraft},
    error::EngineError,
    flows::{ActiveFlow, FlowState},
};

/// Identifier of a chat. One per user in practice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of one conversation.
///
/// An idle session has no active flow, hence no draft: the flow, its state and
/// its draft are cleared together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub conversation_id: ConversationId,
    pub owner_user_id: String,
    pub active: Option<ActiveFlow>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            owner_user_id: String::new(),
            active: None,
            updated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn flow(&self) -> Option<FlowKind> {
        self.active.as_ref().map(|a| a.kind)
    }

    #[must_use]
    pub fn state(&self) -> FlowState {
        self.active.as_ref().map_or(FlowState::Idle, |a| a.state)
    }

    #[must_use]
    pub fn draft(&self) -> TransactionDraft {
        self.active
            .as_ref()
            .map(|a| a.draft.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn reset(&mut self) {
        self.active = None;
    }

    /// Whether the session has sat untouched for longer than `ttl`.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        !self.is_idle() && now - self.updated_at > ttl
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Keyed storage of sessions.
///
/// Only sessions with an active flow are kept: storing an idle session drops
/// the entry, and `get` hands out a fresh idle one for unknown ids.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session of `id`, or a new idle one if absent.
    async fn get(&self, id: ConversationId) -> Result<Session, EngineError>;

    async fn set(&self, id: ConversationId, session: Session) -> Result<(), EngineError>;
}

/// Applies a `set` to an in-memory table. Returns whether the table changed.
fn store_in(
    sessions: &mut HashMap<ConversationId, Session>,
    id: ConversationId,
    session: Session,
) -> bool {
    if session.is_idle() {
        sessions.remove(&id).is_some()
    } else {
        sessions.insert(id, session);
        true
    }
}

/// Sessions kept in process memory; lost on restart.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<HashMap<ConversationId, Session>>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: ConversationId) -> Result<Session, EngineError> {
        let guard = self.inner.lock().await;
        Ok(guard.get(&id).cloned().unwrap_or_else(|| Session::new(id)))
    }

    async fn set(&self, id: ConversationId, session: Session) -> Result<(), EngineError> {
        store_in(&mut *self.inner.lock().await, id, session);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionsFile {
    sessions: HashMap<ConversationId, Session>,
}

/// Sessions mirrored to a JSON file so in-progress flows survive restarts.
///
/// The table is rewritten through a temporary file whenever a `set` changes
/// it. The write runs on the blocking pool while the table lock is held, so
/// writes land in order.
#[derive(Clone)]
pub struct JsonSessionStore {
    path: PathBuf,
    inner: Arc<Mutex<SessionsFile>>,
}

impl JsonSessionStore {
    /// Loads `path`; a missing or unreadable file starts an empty table.
    pub fn load_or_empty(path: PathBuf) -> Self {
        let file = match read_json_file(&path) {
            Some(file) => {
                tracing::info!(
                    "Loaded {} sessions from {}",
                    file.sessions.len(),
                    path.display()
                );
                file
            }
            None => SessionsFile::default(),
        };
        Self {
            path,
            inner: Arc::new(Mutex::new(file)),
        }
    }
}

#[async_trait]
impl SessionStore for JsonSessionStore {
    async fn get(&self, id: ConversationId) -> Result<Session, EngineError> {
        let guard = self.inner.lock().await;
        Ok(guard
            .sessions
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Session::new(id)))
    }

    async fn set(&self, id: ConversationId, session: Session) -> Result<(), EngineError> {
        let mut guard = self.inner.lock().await;
        if !store_in(&mut guard.sessions, id, session) {
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&*guard)
            .map_err(|e| EngineError::Store(format!("state serialize failed: {e}")))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_json_file(&path, &json))
            .await
            .map_err(|e| EngineError::Store(format!("state save aborted: {e}")))?
            .map_err(|e| EngineError::Store(format!("state save failed: {e}")))
    }
}

fn read_json_file(path: &Path) -> Option<SessionsFile> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(file) => Some(file),
        Err(err) => {
            tracing::warn!("ignoring corrupt session file {}: {err}", path.display());
            None
        }
    }
}

fn write_json_file(path: &Path, json: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{draft::Category, money::Amount};

    fn state_file() -> PathBuf {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_state");
        root.join(format!("sessions_{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn memory_store_creates_idle_sessions() {
        let store = MemorySessionStore::default();
        let session = store.get(ConversationId(7)).await.unwrap();
        assert_eq!(session.conversation_id, ConversationId(7));
        assert!(session.is_idle());
        assert_eq!(session.state(), FlowState::Idle);
        assert!(session.draft().is_empty());
    }

    #[tokio::test]
    async fn json_store_survives_reload() {
        let path = state_file();
        let store = JsonSessionStore::load_or_empty(path.clone());

        let mut session = store.get(ConversationId(1)).await.unwrap();
        let mut flow = ActiveFlow::start(FlowKind::Expense);
        flow.state = FlowState::PaymentMethod;
        flow.draft.amount = Amount::from_minor(4_250);
        flow.draft.category = Some(Category::Bills);
        session.owner_user_id = "100".to_string();
        session.active = Some(flow.clone());
        store.set(ConversationId(1), session).await.unwrap();

        let reloaded = JsonSessionStore::load_or_empty(path.clone());
        let session = reloaded.get(ConversationId(1)).await.unwrap();
        assert_eq!(session.owner_user_id, "100");
        assert_eq!(session.active, Some(flow));

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn json_store_ignores_corrupt_file() {
        let path = state_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "{not json").unwrap();

        let store = JsonSessionStore::load_or_empty(path.clone());
        assert!(store.get(ConversationId(3)).await.unwrap().is_idle());

        let _ = fs::remove_file(path);
    }

    #[tokio::test]
    async fn idle_sessions_are_not_kept() {
        let store = MemorySessionStore::default();
        for id in 0..50 {
            let session = store.get(ConversationId(id)).await.unwrap();
            store.set(ConversationId(id), session).await.unwrap();
        }
        assert!(store.inner.lock().await.is_empty());

        let mut session = store.get(ConversationId(1)).await.unwrap();
        session.active = Some(ActiveFlow::start(FlowKind::Expense));
        store.set(ConversationId(1), session.clone()).await.unwrap();
        assert_eq!(store.get(ConversationId(1)).await.unwrap(), session);

        session.reset();
        store.set(ConversationId(1), session).await.unwrap();
        assert!(store.inner.lock().await.is_empty());
    }

    #[tokio::test]
    async fn json_store_drops_finished_sessions_from_file() {
        let path = state_file();
        let store = JsonSessionStore::load_or_empty(path.clone());

        for id in 0..50 {
            let session = store.get(ConversationId(id)).await.unwrap();
            store.set(ConversationId(id), session).await.unwrap();
        }
        // Nothing changed, nothing written.
        assert!(!path.exists());

        let mut session = store.get(ConversationId(9)).await.unwrap();
        session.active = Some(ActiveFlow::start(FlowKind::QuickPayment));
        store.set(ConversationId(9), session.clone()).await.unwrap();
        assert_eq!(read_json_file(&path).unwrap().sessions.len(), 1);

        session.reset();
        store.set(ConversationId(9), session).await.unwrap();
        assert!(read_json_file(&path).unwrap().sessions.is_empty());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn only_active_sessions_expire() {
        let mut session = Session::new(ConversationId(1));
        let later = session.updated_at + Duration::minutes(31);
        assert!(!session.is_expired(Duration::minutes(30), later));

        session.active = Some(ActiveFlow::start(FlowKind::Income));
        assert!(session.is_expired(Duration::minutes(30), later));
        assert!(!session.is_expired(Duration::minutes(45), later));
    }
}
