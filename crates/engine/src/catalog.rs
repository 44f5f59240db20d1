//! User-facing wording.

use api_types::transaction::{TransactionCreated, TransactionKind};

use crate::{
    auth::AccessMode,
    draft::FlowKind,
    error::ValidationError,
    flows::FlowState,
};

/// Source of every string the engine shows to users.
///
/// Keyboards and button payloads are built by the presenter; a catalog only
/// decides wording.
pub trait MessageCatalog: Send + Sync {
    fn welcome(&self) -> String;
    fn help(&self) -> String;
    fn menu(&self) -> String;
    fn onboarding(&self, mode: AccessMode) -> String;
    fn onboarding_failed(&self) -> String;
    fn prompt(&self, kind: FlowKind, state: FlowState) -> String;
    fn invalid_input(&self, state: FlowState, error: &ValidationError) -> String;
    fn cancelled(&self) -> String;
    fn nothing_to_cancel(&self) -> String;
    fn saved(&self, record: &TransactionCreated) -> String;
    fn already_saved(&self, kind: FlowKind) -> String;
    fn persistence_failed(&self) -> String;
    fn unrecognized(&self) -> String;
    fn settings(&self, user_id: &str, mode: AccessMode, active: Option<FlowKind>) -> String;
    fn session_reset(&self) -> String;
    fn session_expired(&self) -> String;
    /// Replaces the text of a message whose buttons were just used.
    fn selection_recorded(&self, label: &str) -> String;
    /// Minimal reply sent when a richer reply could not be delivered.
    fn delivery_fallback(&self) -> String;
    fn skip_label(&self) -> String;
    fn cancel_label(&self) -> String;
    fn menu_label(&self) -> String;
    fn reset_label(&self) -> String;
}

/// English catalog.
#[derive(Clone, Debug)]
pub struct DefaultCatalog {
    currency_symbol: String,
}

impl Default for DefaultCatalog {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
        }
    }
}

impl DefaultCatalog {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }

    fn money(&self, amount_minor: i64) -> String {
        let sign = if amount_minor < 0 { "-" } else { "" };
        let abs = amount_minor.unsigned_abs();
        format!(
            "{sign}{}{}.{:02}",
            self.currency_symbol,
            group_thousands(abs / 100),
            abs % 100
        )
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn flow_name(kind: FlowKind) -> &'static str {
    match kind {
        FlowKind::Expense => "expense",
        FlowKind::Income => "income",
        FlowKind::QuickPayment => "quick payment",
    }
}

impl MessageCatalog for DefaultCatalog {
    fn welcome(&self) -> String {
        "Welcome! I keep track of your money.\n\nUse the menu below to record an expense, an income or a quick payment.".to_string()
    }

    fn help(&self) -> String {
        "Commands:\n\n/expense - record an expense\n/income - record an income\n/quickpay - pay someone quickly\n/cancel - stop the current entry\n/menu - show the main menu\n/settings - your settings\n\nAmounts can be written like 250, 99.95 or ₹1,250.50.".to_string()
    }

    fn menu(&self) -> String {
        "What would you like to do?".to_string()
    }

    fn onboarding(&self, mode: AccessMode) -> String {
        match mode {
            AccessMode::Open => {
                "I could not register your account right now. Please send /start again in a moment.".to_string()
            }
            AccessMode::Closed => {
                "This assistant is invite-only.\n\nSend /start followed by your invite code, e.g.\n/start ABC123".to_string()
            }
        }
    }

    fn onboarding_failed(&self) -> String {
        "That invite code was not accepted. Check it and try again with /start <code>.".to_string()
    }

    fn prompt(&self, kind: FlowKind, state: FlowState) -> String {
        let text = match (kind, state) {
            (FlowKind::Expense, FlowState::Amount) => "💸 New expense\n\nHow much did you spend?",
            (FlowKind::Income, FlowState::Amount) => "💰 New income\n\nHow much did you receive?",
            (FlowKind::QuickPayment, FlowState::Amount) => "⚡ Quick payment\n\nHow much are you paying?",
            (FlowKind::QuickPayment, FlowState::CounterpartyName) => "Who are you paying?",
            (_, FlowState::Category) => "Pick a category:",
            (_, FlowState::PaymentMethod) => "How did you pay?",
            (_, FlowState::Description) => "Add a short description, or tap Skip.",
            (_, FlowState::CounterpartyName) => "Who is the other party?",
            (_, FlowState::Idle) => "What would you like to do?",
        };
        text.to_string()
    }

    fn invalid_input(&self, state: FlowState, error: &ValidationError) -> String {
        let hint = match state {
            FlowState::Amount => "Please send a positive amount with at most two decimals, e.g. 250 or 99.95.",
            FlowState::Category => "Please pick one of the categories below.",
            FlowState::PaymentMethod => "Please pick one of the payment methods below.",
            FlowState::CounterpartyName => "Please send the name of the person or shop.",
            FlowState::Description | FlowState::Idle => "Please try again.",
        };
        format!("⚠️ {error}\n{hint}")
    }

    fn cancelled(&self) -> String {
        "❌ Cancelled. Nothing was saved.".to_string()
    }

    fn nothing_to_cancel(&self) -> String {
        "There is nothing to cancel.".to_string()
    }

    fn saved(&self, record: &TransactionCreated) -> String {
        let title = match record.kind {
            TransactionKind::Expense => "✅ Expense saved",
            TransactionKind::Income => "✅ Income saved",
            TransactionKind::QuickPayment => "✅ Payment recorded",
        };
        let mut text = format!(
            "{title}\n\nAmount: {}\nCategory: {}",
            self.money(record.amount_minor),
            record.category
        );
        if let Some(counterparty) = &record.counterparty {
            text.push_str(&format!("\nPaid to: {counterparty}"));
        }
        if let Some(method) = &record.payment_method {
            text.push_str(&format!("\nPayment method: {method}"));
        }
        if let Some(description) = record.description.as_deref().filter(|d| !d.is_empty()) {
            text.push_str(&format!("\nDescription: {description}"));
        }
        text
    }

    fn already_saved(&self, kind: FlowKind) -> String {
        format!("✅ This {} was already saved.", flow_name(kind))
    }

    fn persistence_failed(&self) -> String {
        "Sorry, something went wrong while saving. Nothing was recorded, please start again.".to_string()
    }

    fn unrecognized(&self) -> String {
        "I did not understand that. Pick an option from the menu:".to_string()
    }

    fn settings(&self, user_id: &str, mode: AccessMode, active: Option<FlowKind>) -> String {
        let mode = match mode {
            AccessMode::Open => "open",
            AccessMode::Closed => "invite-only",
        };
        let active = active.map_or("none", flow_name);
        format!("⚙️ Settings\n\nUser id: {user_id}\nAccess: {mode}\nEntry in progress: {active}")
    }

    fn session_reset(&self) -> String {
        "Your conversation was reset.".to_string()
    }

    fn session_expired(&self) -> String {
        "Your previous entry timed out and was discarded.".to_string()
    }

    fn selection_recorded(&self, label: &str) -> String {
        format!("✔️ {label}")
    }

    fn delivery_fallback(&self) -> String {
        "Something went wrong. Send /menu to continue.".to_string()
    }

    fn skip_label(&self) -> String {
        "⏭ Skip".to_string()
    }

    fn cancel_label(&self) -> String {
        "❌ Cancel".to_string()
    }

    fn menu_label(&self) -> String {
        "🏠 Menu".to_string()
    }

    fn reset_label(&self) -> String {
        "♻️ Reset conversation".to_string()
    }
}
