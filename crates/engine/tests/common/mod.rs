#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use api_types::{
    transaction::{TransactionCreated, TransactionKind},
    user::UserRecord,
};
use async_trait::async_trait;
use engine::{
    AccessMode, Amount, BackendError, Category, ConversationId, Engine, Event, EventKind, Ledger,
    MessageId, PaymentMethod, ProfileHints, Reply, Transport, TransportError, UserDirectory,
};
use uuid::Uuid;

/// A persistence call as seen by the ledger.
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerCall {
    Expense {
        user_id: String,
        amount: Amount,
        category: Category,
        payment_method: PaymentMethod,
        description: String,
        key: Uuid,
    },
    Income {
        user_id: String,
        amount: Amount,
        category: Category,
        description: String,
        key: Uuid,
    },
    QuickPayment {
        user_id: String,
        amount: Amount,
        counterparty: String,
        category: Category,
        key: Uuid,
    },
}

#[derive(Default)]
pub struct RecordingLedger {
    pub calls: Mutex<Vec<LedgerCall>>,
    pub fail_with: Mutex<Option<BackendError>>,
    pub delay: Mutex<Option<Duration>>,
}

impl RecordingLedger {
    pub fn calls(&self) -> Vec<LedgerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_with(&self, error: BackendError) {
        *self.fail_with.lock().unwrap() = Some(error);
    }

    async fn record(
        &self,
        call: LedgerCall,
        created: TransactionCreated,
    ) -> Result<TransactionCreated, BackendError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(created),
        }
    }
}

#[async_trait]
impl Ledger for RecordingLedger {
    async fn create_expense(
        &self,
        user_id: &str,
        amount: Amount,
        category: Category,
        payment_method: PaymentMethod,
        description: &str,
        idempotency_key: Uuid,
    ) -> Result<TransactionCreated, BackendError> {
        let created = TransactionCreated {
            id: Uuid::new_v4(),
            kind: TransactionKind::Expense,
            amount_minor: amount.minor(),
            category: category.label().to_string(),
            payment_method: Some(payment_method.label().to_string()),
            description: Some(description.to_string()),
            counterparty: None,
        };
        self.record(
            LedgerCall::Expense {
                user_id: user_id.to_string(),
                amount,
                category,
                payment_method,
                description: description.to_string(),
                key: idempotency_key,
            },
            created,
        )
        .await
    }

    async fn create_income(
        &self,
        user_id: &str,
        amount: Amount,
        category: Category,
        description: &str,
        idempotency_key: Uuid,
    ) -> Result<TransactionCreated, BackendError> {
        let created = TransactionCreated {
            id: Uuid::new_v4(),
            kind: TransactionKind::Income,
            amount_minor: amount.minor(),
            category: category.label().to_string(),
            payment_method: None,
            description: Some(description.to_string()),
            counterparty: None,
        };
        self.record(
            LedgerCall::Income {
                user_id: user_id.to_string(),
                amount,
                category,
                description: description.to_string(),
                key: idempotency_key,
            },
            created,
        )
        .await
    }

    async fn record_quick_payment(
        &self,
        user_id: &str,
        amount: Amount,
        counterparty: &str,
        category: Category,
        idempotency_key: Uuid,
    ) -> Result<TransactionCreated, BackendError> {
        let created = TransactionCreated {
            id: Uuid::new_v4(),
            kind: TransactionKind::QuickPayment,
            amount_minor: amount.minor(),
            category: category.label().to_string(),
            payment_method: None,
            description: None,
            counterparty: Some(counterparty.to_string()),
        };
        self.record(
            LedgerCall::QuickPayment {
                user_id: user_id.to_string(),
                amount,
                counterparty: counterparty.to_string(),
                category,
                key: idempotency_key,
            },
            created,
        )
        .await
    }
}

/// Admits `known` users at bootstrap and anyone presenting `invite`.
#[derive(Default)]
pub struct StaticDirectory {
    pub known: Vec<String>,
    pub invite: Option<String>,
    pub enrolled: Mutex<Vec<String>>,
    /// While set, every enrollment fails as if the server were down.
    pub outage: Mutex<bool>,
}

impl StaticDirectory {
    pub fn set_outage(&self, down: bool) {
        *self.outage.lock().unwrap() = down;
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn lookup_or_enroll(
        &self,
        user_id: &str,
        hints: &ProfileHints,
    ) -> Result<UserRecord, BackendError> {
        if *self.outage.lock().unwrap() {
            return Err(BackendError::Unavailable("connection refused".into()));
        }
        if let Some(invite) = &self.invite
            && hints.onboarding_code.as_ref() != Some(invite)
        {
            return Err(BackendError::Rejected {
                status: 403,
                message: "invalid onboarding code".into(),
            });
        }
        self.enrolled.lock().unwrap().push(user_id.to_string());
        Ok(UserRecord {
            id: format!("user-{user_id}"),
            telegram_id: user_id.to_string(),
            display_name: hints.display_name.clone(),
        })
    }

    async fn list_authorized_users(&self) -> Result<Vec<UserRecord>, BackendError> {
        Ok(self
            .known
            .iter()
            .map(|id| UserRecord {
                id: format!("user-{id}"),
                telegram_id: id.clone(),
                display_name: None,
            })
            .collect())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Sent {
    Text(ConversationId, Reply),
    Answer(String),
    Edit(ConversationId, MessageId, Reply),
    Delete(ConversationId, MessageId),
}

#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Sent>>,
    /// Number of upcoming `send_text` calls that fail.
    pub failing_sends: Mutex<usize>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts delivered to `conversation`, oldest first.
    pub fn texts(&self, conversation: ConversationId) -> Vec<Reply> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(c, reply) if c == conversation => Some(reply),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self, conversation: ConversationId) -> Reply {
        self.texts(conversation)
            .pop()
            .expect("no message was sent")
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(
        &self,
        conversation: ConversationId,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        {
            let mut failing = self.failing_sends.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(TransportError("can't parse entities".into()));
            }
        }
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Text(conversation, reply.clone()));
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Answer(callback_id.to_string()));
        Ok(())
    }

    async fn edit_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
        reply: &Reply,
    ) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Edit(conversation, message, reply.clone()));
        Ok(())
    }

    async fn delete_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
    ) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Delete(conversation, message));
        Ok(())
    }
}

pub struct Harness {
    pub engine: Arc<Engine>,
    pub ledger: Arc<RecordingLedger>,
    pub directory: Arc<StaticDirectory>,
    pub transport: Arc<RecordingTransport>,
}

pub fn harness() -> Harness {
    harness_with(AccessMode::Open, StaticDirectory::default(), |b| b)
}

pub fn harness_with(
    mode: AccessMode,
    directory: StaticDirectory,
    configure: impl FnOnce(engine::EngineBuilder) -> engine::EngineBuilder,
) -> Harness {
    let ledger = Arc::new(RecordingLedger::default());
    let directory = Arc::new(directory);
    let transport = Arc::new(RecordingTransport::default());
    let builder = Engine::builder()
        .ledger(ledger.clone())
        .directory(directory.clone())
        .transport(transport.clone())
        .mode(mode);
    let engine = configure(builder).build().unwrap();
    Harness {
        engine: Arc::new(engine),
        ledger,
        directory,
        transport,
    }
}

pub fn event(conversation: i64, user: &str, kind: EventKind) -> Event {
    Event {
        conversation_id: ConversationId(conversation),
        user_id: user.to_string(),
        profile: ProfileHints::default(),
        kind,
    }
}

/// A typed message from user `conversation` in their private chat.
pub fn text(conversation: i64, body: &str) -> Event {
    event(conversation, &conversation.to_string(), EventKind::from_text(body))
}

/// A tap on an inline button.
pub fn tap(conversation: i64, payload: &str) -> Event {
    event(
        conversation,
        &conversation.to_string(),
        EventKind::Callback {
            id: format!("cb-{payload}"),
            message_id: Some(MessageId(7)),
            payload: payload.to_string(),
        },
    )
}
