//! Event routing.
//!
//! Every inbound event is handled under its conversation lock and produces
//! exactly one reply; callbacks are acknowledged exactly once as well.
//! Routing order:
//!
//! 1. commands, which override whatever the session is doing;
//! 2. inline-button callbacks;
//! 3. text for the active flow;
//! 4. main-menu button labels, then the "unrecognized input" fallback.

use chrono::Utc;

use crate::{
    Engine, ResultEngine,
    auth::Access,
    draft::{FieldValue, FlowKind},
    error::{BackendError, TransportError},
    event::{CallbackAction, Command, Event, EventKind, MenuButton, SettingsAction},
    flows::{self, ActiveFlow, Completed, FlowState, Input, Transition},
    session::{ConversationId, Session},
    transport::{MessageId, Reply},
    validators::{self, SKIP_TOKEN},
};

impl Engine {
    /// Handles one inbound event end to end. Never fails: every error is
    /// logged and turned into a reply.
    pub async fn dispatch(&self, event: Event) {
        let conversation = event.conversation_id;
        let _guard = self.locks.acquire(conversation).await;

        if let EventKind::Callback { id, .. } = &event.kind
            && let Err(err) = self.bounded_transport(self.transport.answer_callback(id)).await
        {
            tracing::warn!("failed to answer callback {id} in {conversation}: {err}");
        }

        let reply = match self.route(&event).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::error!("event in {conversation} failed: {err}");
                self.presenter.delivery_fallback()
            }
        };
        self.deliver(conversation, reply).await;
    }

    async fn route(&self, event: &Event) -> ResultEngine<Reply> {
        let conversation = event.conversation_id;

        if self.gate.check(&event.user_id, &event.profile).await == Access::Denied {
            tracing::debug!("user {} is not authorized", event.user_id);
            return Ok(self.onboard(event).await);
        }

        let mut session = self.store.get(conversation).await?;
        let was_idle = session.is_idle();
        if session.owner_user_id != event.user_id {
            session.owner_user_id = event.user_id.clone();
        }

        let expired = session.is_expired(self.session_ttl, Utc::now());
        if expired {
            tracing::debug!("session {conversation} expired in {:?}", session.state());
            session.reset();
        }

        let mut reply = match &event.kind {
            EventKind::Command(command) => self.on_command(&mut session, command),
            EventKind::Callback {
                message_id,
                payload,
                ..
            } => {
                self.on_callback(&mut session, *message_id, payload)
                    .await
            }
            EventKind::Text(text) => self.on_text(&mut session, text).await,
        };

        // Idle sessions are not stored, so idle-to-idle needs no write.
        if !(was_idle && session.is_idle()) {
            session.touch();
            self.store.set(conversation, session).await?;
        }

        if expired {
            reply.text = format!(
                "{}\n\n{}",
                self.presenter.catalog().session_expired(),
                reply.text
            );
        }
        Ok(reply)
    }

    /// Reply for users the gate turned away. `/start <code>` is the only way
    /// in.
    async fn onboard(&self, event: &Event) -> Reply {
        if let EventKind::Command(Command::Start { code: Some(code) }) = &event.kind {
            let mut hints = event.profile.clone();
            hints.onboarding_code = Some(code.clone());
            return match self.gate.enroll(&event.user_id, &hints).await {
                Access::Granted => self.presenter.welcome(),
                Access::Denied => self.presenter.onboarding_failed(),
            };
        }
        self.presenter.onboarding(self.gate.mode())
    }

    fn on_command(&self, session: &mut Session, command: &Command) -> Reply {
        tracing::debug!(
            "command {command:?} in {} ({:?})",
            session.conversation_id,
            session.state()
        );
        match command {
            Command::Start { .. } => {
                session.reset();
                self.presenter.welcome()
            }
            Command::Menu => {
                session.reset();
                self.presenter.menu()
            }
            Command::Help => self.presenter.help(),
            Command::Cancel => self.cancel(session),
            Command::Settings => self.settings(session),
            Command::StartFlow(kind) => self.start_flow(session, *kind),
        }
    }

    async fn on_text(&self, session: &mut Session, text: &str) -> Reply {
        if !session.is_idle() {
            if self.is_cancel_text(text) {
                return self.cancel(session);
            }
            return self.advance(session, Input::Text(text)).await;
        }

        match MenuButton::match_label(text) {
            Some(MenuButton::AddExpense) => self.start_flow(session, FlowKind::Expense),
            Some(MenuButton::AddIncome) => self.start_flow(session, FlowKind::Income),
            Some(MenuButton::QuickPayment) => self.start_flow(session, FlowKind::QuickPayment),
            Some(MenuButton::Settings) => self.settings(session),
            Some(MenuButton::Help) => self.presenter.help(),
            None => {
                tracing::debug!("unrecognized text in {}", session.conversation_id);
                self.presenter.unrecognized()
            }
        }
    }

    async fn on_callback(
        &self,
        session: &mut Session,
        message_id: Option<MessageId>,
        payload: &str,
    ) -> Reply {
        let conversation = session.conversation_id;
        let action = CallbackAction::parse(payload);
        tracing::debug!("callback {action:?} in {conversation} ({:?})", session.state());

        match action {
            CallbackAction::Cancel => {
                if let Some(message) = message_id
                    && let Err(err) = self
                        .bounded_transport(self.transport.delete_message(conversation, message))
                        .await
                {
                    tracing::debug!("could not delete message in {conversation}: {err}");
                }
                self.cancel(session)
            }
            CallbackAction::Menu => {
                session.reset();
                self.presenter.menu()
            }
            CallbackAction::StartFlow(kind) => self.start_flow(session, kind),
            CallbackAction::Settings(SettingsAction::Show) => self.settings(session),
            CallbackAction::Settings(SettingsAction::Reset) => {
                session.reset();
                self.presenter.session_reset()
            }
            CallbackAction::Skip => {
                if session.state() != FlowState::Description {
                    return self.stale(session);
                }
                let label = self.presenter.catalog().skip_label();
                self.retire_keyboard(conversation, message_id, &label).await;
                self.advance(session, Input::Text(SKIP_TOKEN)).await
            }
            CallbackAction::Category(value) => {
                let Some(active) = session
                    .active
                    .as_ref()
                    .filter(|a| a.state == FlowState::Category)
                else {
                    return self.stale(session);
                };
                let category = validators::category_from_selection(&value, active.kind.categories());
                self.retire_keyboard(conversation, message_id, category.label())
                    .await;
                self.advance(session, Input::Selected(FieldValue::Category(category)))
                    .await
            }
            CallbackAction::Payment(value) => {
                let Some(kind) = session
                    .active
                    .as_ref()
                    .filter(|a| a.state == FlowState::PaymentMethod)
                    .map(|a| a.kind)
                else {
                    return self.stale(session);
                };
                match validators::parse_payment_method(&value) {
                    Ok(method) => {
                        self.retire_keyboard(conversation, message_id, method.label())
                            .await;
                        self.advance(session, Input::Selected(FieldValue::PaymentMethod(method)))
                            .await
                    }
                    Err(error) => self
                        .presenter
                        .rejected(kind, FlowState::PaymentMethod, &error),
                }
            }
            CallbackAction::Unknown(raw) => {
                tracing::warn!("unknown callback payload {raw:?} in {conversation}");
                self.presenter.unrecognized()
            }
        }
    }

    /// Typed "cancel", or the cancel button label, stops the flow instead of
    /// becoming a field value.
    fn is_cancel_text(&self, text: &str) -> bool {
        let typed = validators::normalize_label(text);
        typed == "cancel"
            || typed == validators::normalize_label(&self.presenter.catalog().cancel_label())
    }

    fn start_flow(&self, session: &mut Session, kind: FlowKind) -> Reply {
        if let Some(previous) = session.flow() {
            tracing::debug!(
                "{} replaces {previous:?} with {kind:?}",
                session.conversation_id
            );
        }
        let flow = ActiveFlow::start(kind);
        let state = flow.state;
        session.active = Some(flow);
        self.presenter.prompt(kind, state, None)
    }

    fn cancel(&self, session: &mut Session) -> Reply {
        if session.is_idle() {
            return self.presenter.nothing_to_cancel();
        }
        session.reset();
        self.presenter.cancelled()
    }

    fn settings(&self, session: &Session) -> Reply {
        self.presenter
            .settings(&session.owner_user_id, self.gate.mode(), session.flow())
    }

    /// Re-asks the current question after a tap on an outdated button.
    fn stale(&self, session: &Session) -> Reply {
        match &session.active {
            Some(active) => self.presenter.prompt(active.kind, active.state, None),
            None => self.presenter.unrecognized(),
        }
    }

    async fn advance(&self, session: &mut Session, input: Input<'_>) -> Reply {
        let Some(active) = session.active.as_mut() else {
            return self.presenter.unrecognized();
        };
        let kind = active.kind;
        let idempotency_key = active.idempotency_key;

        match flows::advance(active, input) {
            Transition::Cancelled => {
                session.reset();
                self.presenter.cancelled()
            }
            Transition::Rejected { state, error } => {
                tracing::debug!("{} rejected input: {error}", session.conversation_id);
                self.presenter.rejected(kind, state, &error)
            }
            Transition::Stale { state } | Transition::Advanced { state } => {
                self.presenter.prompt(kind, state, None)
            }
            Transition::Completed(completed) => {
                session.reset();
                self.persist(session, kind, completed, idempotency_key)
                    .await
            }
        }
    }

    /// Terminal step. The session is already idle whatever the outcome.
    async fn persist(
        &self,
        session: &Session,
        kind: FlowKind,
        completed: Completed,
        idempotency_key: uuid::Uuid,
    ) -> Reply {
        let user_id = session.owner_user_id.as_str();
        let call = async {
            match &completed {
                Completed::Expense {
                    amount,
                    category,
                    payment_method,
                    description,
                } => {
                    self.ledger
                        .create_expense(
                            user_id,
                            *amount,
                            *category,
                            *payment_method,
                            description,
                            idempotency_key,
                        )
                        .await
                }
                Completed::Income {
                    amount,
                    category,
                    description,
                } => {
                    self.ledger
                        .create_income(user_id, *amount, *category, description, idempotency_key)
                        .await
                }
                Completed::QuickPayment {
                    amount,
                    counterparty,
                    category,
                } => {
                    self.ledger
                        .record_quick_payment(
                            user_id,
                            *amount,
                            counterparty,
                            *category,
                            idempotency_key,
                        )
                        .await
                }
            }
        };

        let result = tokio::time::timeout(self.call_timeout, call)
            .await
            .unwrap_or(Err(BackendError::Timeout));
        match result {
            Ok(record) => {
                tracing::info!(
                    "stored {kind:?} {} for user {user_id}",
                    record.id
                );
                self.presenter.saved(&record)
            }
            Err(BackendError::Duplicate) => {
                tracing::info!("{kind:?} {idempotency_key} was already stored");
                self.presenter.already_saved(kind)
            }
            Err(err) => {
                tracing::warn!("failed to store {kind:?} for user {user_id}: {err}");
                self.presenter.persistence_failed()
            }
        }
    }

    /// Replaces the keyboard message of a used inline button with a short
    /// summary. Cosmetic; failures are ignored.
    async fn retire_keyboard(
        &self,
        conversation: ConversationId,
        message_id: Option<MessageId>,
        label: &str,
    ) {
        let Some(message) = message_id else {
            return;
        };
        let summary = self.presenter.selection_recorded(label);
        if let Err(err) = self
            .bounded_transport(self.transport.edit_message(conversation, message, &summary))
            .await
        {
            tracing::debug!("could not edit message in {conversation}: {err}");
        }
    }

    async fn deliver(&self, conversation: ConversationId, reply: Reply) {
        let Err(err) = self
            .bounded_transport(self.transport.send_text(conversation, &reply))
            .await
        else {
            return;
        };
        tracing::warn!("reply to {conversation} failed: {err}; sending fallback");

        let fallback = self.presenter.delivery_fallback();
        if let Err(err) = self
            .bounded_transport(self.transport.send_text(conversation, &fallback))
            .await
        {
            tracing::error!("dropping reply to {conversation}: {err}");
        }
    }

    async fn bounded_transport<F>(&self, call: F) -> Result<(), TransportError>
    where
        F: Future<Output = Result<(), TransportError>>,
    {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .unwrap_or_else(|_| Err(TransportError("timed out".to_string())))
    }
}
