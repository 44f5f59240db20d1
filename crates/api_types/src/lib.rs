use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod user {
    use super::*;

    /// Request body for `POST /user/enroll`.
    ///
    /// The server either returns the existing user bound to `telegram_id` or
    /// enrolls a new one. When the server runs in invite mode it requires a
    /// valid `onboarding_code`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserEnroll {
        pub telegram_id: String,
        pub username: Option<String>,
        pub display_name: Option<String>,
        pub onboarding_code: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserRecord {
        pub id: String,
        /// External chat identity, stable across sessions.
        pub telegram_id: String,
        pub display_name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UsersResponse {
        pub users: Vec<UserRecord>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Income,
        Expense,
        QuickPayment,
    }

    /// Echo of a stored record, used to build the confirmation message.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct TransactionCreated {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub category: String,
        pub payment_method: Option<String>,
        pub description: Option<String>,
        pub counterparty: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub amount_minor: i64,
        pub category: String,
        pub payment_method: String,
        pub description: Option<String>,
        /// Idempotency key, one per completed conversation flow.
        pub idempotency_key: String,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct IncomeNew {
        pub amount_minor: i64,
        pub category: String,
        pub description: Option<String>,
        /// Idempotency key, one per completed conversation flow.
        pub idempotency_key: String,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct QuickPaymentNew {
        /// Must be > 0.
        pub amount_minor: i64,
        pub counterparty: String,
        pub category: String,
        /// Idempotency key, one per completed conversation flow.
        pub idempotency_key: String,
        /// RFC3339 timestamp, including timezone offset (local user time).
        pub occurred_at: DateTime<FixedOffset>,
    }
}
