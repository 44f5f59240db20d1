//! Collaborators the engine persists through.

use api_types::{transaction::TransactionCreated, user::UserRecord};
use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    draft::{Category, PaymentMethod},
    error::BackendError,
    money::Amount,
};

/// What the chat client tells us about a user, used for enrollment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileHints {
    pub username: Option<String>,
    pub display_name: Option<String>,
    /// Invite code typed after `/start`, if any.
    pub onboarding_code: Option<String>,
}

/// Record store for completed flows.
///
/// The idempotency key is minted once per flow, so a backend that honours it
/// stores each completed flow at most once.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn create_expense(
        &self,
        user_id: &str,
        amount: Amount,
        category: Category,
        payment_method: PaymentMethod,
        description: &str,
        idempotency_key: Uuid,
    ) -> Result<TransactionCreated, BackendError>;

    async fn create_income(
        &self,
        user_id: &str,
        amount: Amount,
        category: Category,
        description: &str,
        idempotency_key: Uuid,
    ) -> Result<TransactionCreated, BackendError>;

    async fn record_quick_payment(
        &self,
        user_id: &str,
        amount: Amount,
        counterparty: &str,
        category: Category,
        idempotency_key: Uuid,
    ) -> Result<TransactionCreated, BackendError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup_or_enroll(
        &self,
        user_id: &str,
        hints: &ProfileHints,
    ) -> Result<UserRecord, BackendError>;

    /// Called once at startup to seed the authorized set.
    async fn list_authorized_users(&self) -> Result<Vec<UserRecord>, BackendError>;
}
