//! Authorization gate: who may run flows.

use std::{collections::HashSet, str::FromStr, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    backend::{ProfileHints, UserDirectory},
    error::BackendError,
};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// How first-seen users are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Everyone is enrolled on first contact.
    #[default]
    Open,
    /// Only known users; others must onboard with an invite code.
    Closed,
}

impl FromStr for AccessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(AccessMode::Open),
            "closed" => Ok(AccessMode::Closed),
            other => Err(format!("unknown access mode: {other}")),
        }
    }
}

/// Result of asking the gate about a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Route to onboarding.
    Denied,
}

/// Membership check backed by a grow-only set of user ids.
pub struct AuthorizationGate {
    mode: AccessMode,
    authorized: RwLock<HashSet<String>>,
    directory: Arc<dyn UserDirectory>,
    call_timeout: Duration,
}

impl AuthorizationGate {
    pub fn new(mode: AccessMode, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            mode,
            authorized: RwLock::new(HashSet::new()),
            directory,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    #[must_use]
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub async fn is_authorized(&self, user_id: &str) -> bool {
        self.authorized.read().await.contains(user_id)
    }

    pub async fn insert(&self, user_id: impl Into<String>) {
        self.authorized.write().await.insert(user_id.into());
    }

    /// Seeds the set from the user directory. Returns how many users were
    /// loaded.
    pub async fn bootstrap(&self) -> usize {
        let listed = tokio::time::timeout(self.call_timeout, self.directory.list_authorized_users())
            .await
            .unwrap_or(Err(BackendError::Timeout));
        match listed {
            Ok(users) => {
                let count = users.len();
                let mut set = self.authorized.write().await;
                set.extend(users.into_iter().map(|u| u.telegram_id));
                count
            }
            Err(err) => {
                tracing::warn!("failed to load authorized users: {err}");
                0
            }
        }
    }

    /// Decides whether `user_id` may use the flows.
    ///
    /// In open mode an unknown user is enrolled on the spot.
    pub async fn check(&self, user_id: &str, hints: &ProfileHints) -> Access {
        if self.is_authorized(user_id).await {
            return Access::Granted;
        }
        match self.mode {
            AccessMode::Open => self.enroll(user_id, hints).await,
            AccessMode::Closed => Access::Denied,
        }
    }

    /// Onboards `user_id` through the directory; on success the user stays
    /// authorized for the lifetime of the process.
    pub async fn enroll(&self, user_id: &str, hints: &ProfileHints) -> Access {
        let enrolled = tokio::time::timeout(
            self.call_timeout,
            self.directory.lookup_or_enroll(user_id, hints),
        )
        .await
        .unwrap_or(Err(BackendError::Timeout));
        match enrolled {
            Ok(record) => {
                tracing::info!("enrolled user {user_id} as {}", record.id);
                self.insert(user_id).await;
                Access::Granted
            }
            Err(err) => {
                tracing::warn!("enrollment of user {user_id} failed: {err}");
                Access::Denied
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use api_types::user::UserRecord;
    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct Directory {
        known: Vec<&'static str>,
        enroll_calls: Mutex<Vec<String>>,
        invite: Option<&'static str>,
    }

    #[async_trait]
    impl UserDirectory for Directory {
        async fn lookup_or_enroll(
            &self,
            user_id: &str,
            hints: &ProfileHints,
        ) -> Result<UserRecord, BackendError> {
            self.enroll_calls.lock().unwrap().push(user_id.to_string());
            if let Some(invite) = self.invite
                && hints.onboarding_code.as_deref() != Some(invite)
            {
                return Err(BackendError::Rejected {
                    status: 403,
                    message: "invalid code".into(),
                });
            }
            Ok(UserRecord {
                id: format!("u-{user_id}"),
                telegram_id: user_id.to_string(),
                display_name: None,
            })
        }

        async fn list_authorized_users(&self) -> Result<Vec<UserRecord>, BackendError> {
            Ok(self
                .known
                .iter()
                .map(|id| UserRecord {
                    id: format!("u-{id}"),
                    telegram_id: id.to_string(),
                    display_name: None,
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn open_mode_enrolls_once() {
        let directory = Arc::new(Directory::default());
        let gate = AuthorizationGate::new(AccessMode::Open, directory.clone());
        let hints = ProfileHints::default();

        assert_eq!(gate.check("1", &hints).await, Access::Granted);
        assert_eq!(gate.check("1", &hints).await, Access::Granted);
        assert_eq!(directory.enroll_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn closed_mode_only_admits_seeded_users() {
        let directory = Arc::new(Directory {
            known: vec!["1"],
            ..Default::default()
        });
        let gate = AuthorizationGate::new(AccessMode::Closed, directory.clone());
        assert_eq!(gate.bootstrap().await, 1);

        let hints = ProfileHints::default();
        assert_eq!(gate.check("1", &hints).await, Access::Granted);
        assert_eq!(gate.check("2", &hints).await, Access::Denied);
        assert!(directory.enroll_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn enrollment_with_invite_code() {
        let directory = Arc::new(Directory {
            invite: Some("WELCOME"),
            ..Default::default()
        });
        let gate = AuthorizationGate::new(AccessMode::Closed, directory);

        let wrong = ProfileHints {
            onboarding_code: Some("nope".into()),
            ..Default::default()
        };
        assert_eq!(gate.enroll("5", &wrong).await, Access::Denied);
        assert!(!gate.is_authorized("5").await);

        let right = ProfileHints {
            onboarding_code: Some("WELCOME".into()),
            ..Default::default()
        };
        assert_eq!(gate.enroll("5", &right).await, Access::Granted);
        assert_eq!(gate.check("5", &ProfileHints::default()).await, Access::Granted);
    }

    #[test]
    fn access_mode_from_str() {
        assert_eq!("Closed".parse::<AccessMode>(), Ok(AccessMode::Closed));
        assert!("strict".parse::<AccessMode>().is_err());
    }
}
