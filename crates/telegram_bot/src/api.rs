//! HTTP client for the ledger server. Implements the engine's [`Ledger`] and
//! [`UserDirectory`] collaborators.

use api_types::{
    transaction::{ExpenseNew, IncomeNew, QuickPaymentNew, TransactionCreated},
    user::{UserEnroll, UserRecord, UsersResponse},
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use engine::{
    Amount, BackendError, Category, Ledger, PaymentMethod, ProfileHints, UserDirectory,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub(crate) struct ApiClient {
    client: Client,
    base_url: String,
    timezone: Tz,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
}

impl From<ApiError> for BackendError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(err) if err.is_timeout() => BackendError::Timeout,
            ApiError::Network(err) => BackendError::Unavailable(err.to_string()),
            ApiError::Server { status, .. } if status == StatusCode::CONFLICT => {
                BackendError::Duplicate
            }
            ApiError::Server { status, message } => BackendError::Rejected {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl ApiClient {
    pub(crate) fn new(client: Client, base_url: String, timezone: Tz) -> Self {
        Self {
            client,
            base_url,
            timezone,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Current wall-clock time of the configured zone.
    fn now_local(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.timezone).fixed_offset()
    }

    async fn post_json<TReq: serde::Serialize + ?Sized, TResp: for<'de> serde::Deserialize<'de>>(
        &self,
        telegram_user_id: Option<&str>,
        path: &str,
        body: &TReq,
    ) -> Result<TResp, ApiError> {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(id) = telegram_user_id {
            req = req.header("telegram-user-id", id);
        }
        Self::read(req.send().await?).await
    }

    async fn get_json<TResp: for<'de> serde::Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<TResp, ApiError> {
        let resp = self.client.get(self.url(path)).send().await?;
        Self::read(resp).await
    }

    async fn read<TResp: for<'de> serde::Deserialize<'de>>(
        resp: reqwest::Response,
    ) -> Result<TResp, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<TResp>().await?);
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(err) => err.error,
            Err(_) => "server error".to_string(),
        };
        Err(ApiError::Server { status, message })
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[async_trait]
impl Ledger for ApiClient {
    async fn create_expense(
        &self,
        user_id: &str,
        amount: Amount,
        category: Category,
        payment_method: PaymentMethod,
        description: &str,
        idempotency_key: Uuid,
    ) -> Result<TransactionCreated, BackendError> {
        let payload = ExpenseNew {
            amount_minor: amount.minor(),
            category: category.label().to_string(),
            payment_method: payment_method.label().to_string(),
            description: non_empty(description),
            idempotency_key: idempotency_key.to_string(),
            occurred_at: self.now_local(),
        };
        Ok(self.post_json(Some(user_id), "/expense", &payload).await?)
    }

    async fn create_income(
        &self,
        user_id: &str,
        amount: Amount,
        category: Category,
        description: &str,
        idempotency_key: Uuid,
    ) -> Result<TransactionCreated, BackendError> {
        let payload = IncomeNew {
            amount_minor: amount.minor(),
            category: category.label().to_string(),
            description: non_empty(description),
            idempotency_key: idempotency_key.to_string(),
            occurred_at: self.now_local(),
        };
        Ok(self.post_json(Some(user_id), "/income", &payload).await?)
    }

    async fn record_quick_payment(
        &self,
        user_id: &str,
        amount: Amount,
        counterparty: &str,
        category: Category,
        idempotency_key: Uuid,
    ) -> Result<TransactionCreated, BackendError> {
        let payload = QuickPaymentNew {
            amount_minor: amount.minor(),
            counterparty: counterparty.to_string(),
            category: category.label().to_string(),
            idempotency_key: idempotency_key.to_string(),
            occurred_at: self.now_local(),
        };
        Ok(self
            .post_json(Some(user_id), "/quick-payment", &payload)
            .await?)
    }
}

#[async_trait]
impl UserDirectory for ApiClient {
    async fn lookup_or_enroll(
        &self,
        user_id: &str,
        hints: &ProfileHints,
    ) -> Result<UserRecord, BackendError> {
        let payload = UserEnroll {
            telegram_id: user_id.to_string(),
            username: hints.username.clone(),
            display_name: hints.display_name.clone(),
            onboarding_code: hints.onboarding_code.clone(),
        };
        Ok(self.post_json(None, "/user/enroll", &payload).await?)
    }

    async fn list_authorized_users(&self) -> Result<Vec<UserRecord>, BackendError> {
        let resp: UsersResponse = self.get_json("/user/authorized").await?;
        Ok(resp.users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_sent_in_cents() {
        let amount = engine::validators::parse_amount("₹1,250.50").unwrap();
        let payload = ExpenseNew {
            amount_minor: amount.minor(),
            category: Category::Food.label().to_string(),
            payment_method: PaymentMethod::Upi.label().to_string(),
            description: None,
            idempotency_key: Uuid::new_v4().to_string(),
            occurred_at: Utc::now().fixed_offset(),
        };
        assert_eq!(payload.amount_minor, 125_050);
        assert_eq!(engine::validators::parse_amount("0.29").unwrap().minor(), 29);
    }

    #[test]
    fn skipped_description_is_omitted() {
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("  lunch "), Some("lunch".to_string()));
    }

    #[test]
    fn conflict_means_duplicate() {
        let err = ApiError::Server {
            status: StatusCode::CONFLICT,
            message: "idempotency key already used".into(),
        };
        assert_eq!(BackendError::from(err), BackendError::Duplicate);

        let err = ApiError::Server {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "amount must be positive".into(),
        };
        assert_eq!(
            BackendError::from(err),
            BackendError::Rejected {
                status: 422,
                message: "amount must be positive".into()
            }
        );
    }

    #[test]
    fn url_joins_without_double_slash() {
        let api = ApiClient::new(Client::new(), "http://localhost:3000/".into(), Tz::UTC);
        assert_eq!(api.url("/expense"), "http://localhost:3000/expense");
    }
}
