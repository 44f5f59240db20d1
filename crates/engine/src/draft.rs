//! Transaction drafts and the closed value sets they draw from.

use serde::{Deserialize, Serialize};

use crate::money::Amount;

/// The three conversations the engine knows how to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Expense,
    Income,
    QuickPayment,
}

impl FlowKind {
    /// Categories a user may pick while running this flow.
    #[must_use]
    pub const fn categories(self) -> &'static [Category] {
        match self {
            FlowKind::Expense | FlowKind::QuickPayment => Category::EXPENSE,
            FlowKind::Income => Category::INCOME,
        }
    }

    /// Identifier used in callback payloads (`flow_<slug>`).
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            FlowKind::Expense => "expense",
            FlowKind::Income => "income",
            FlowKind::QuickPayment => "quickpay",
        }
    }

    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "expense" => Some(FlowKind::Expense),
            "income" => Some(FlowKind::Income),
            "quickpay" | "quick_payment" => Some(FlowKind::QuickPayment),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Food,
    Transport,
    Shopping,
    Bills,
    Entertainment,
    Health,
    Education,
    Salary,
    Freelance,
    Business,
    Investment,
    Gift,
    #[default]
    Other,
}

impl Category {
    pub const EXPENSE: &'static [Category] = &[
        Category::Food,
        Category::Transport,
        Category::Shopping,
        Category::Bills,
        Category::Entertainment,
        Category::Health,
        Category::Education,
        Category::Other,
    ];

    pub const INCOME: &'static [Category] = &[
        Category::Salary,
        Category::Freelance,
        Category::Business,
        Category::Investment,
        Category::Gift,
        Category::Other,
    ];

    /// Display name, also the value handed to the ledger.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Salary => "Salary",
            Category::Freelance => "Freelance",
            Category::Business => "Business",
            Category::Investment => "Investment",
            Category::Gift => "Gift",
            Category::Other => "Other",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Category::Food => "🍔",
            Category::Transport => "🚕",
            Category::Shopping => "🛍",
            Category::Bills => "🧾",
            Category::Entertainment => "🎬",
            Category::Health => "💊",
            Category::Education => "📚",
            Category::Salary => "💼",
            Category::Freelance => "🧑‍💻",
            Category::Business => "🏪",
            Category::Investment => "📈",
            Category::Gift => "🎁",
            Category::Other => "📦",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
    NetBanking,
    Wallet,
}

impl PaymentMethod {
    pub const ALL: &'static [PaymentMethod] = &[
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Upi,
        PaymentMethod::NetBanking,
        PaymentMethod::Wallet,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::NetBanking => "Net Banking",
            PaymentMethod::Wallet => "Wallet",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "💵",
            PaymentMethod::Card => "💳",
            PaymentMethod::Upi => "📱",
            PaymentMethod::NetBanking => "🏦",
            PaymentMethod::Wallet => "👛",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Field of a [`TransactionDraft`] a flow step writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftField {
    Amount,
    Category,
    PaymentMethod,
    Description,
    Counterparty,
}

/// A validated value, ready to be merged into a draft.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Amount(Amount),
    Category(Category),
    PaymentMethod(PaymentMethod),
    Text(String),
}

impl FieldValue {
    /// The draft field this value can be merged into, when it is unambiguous.
    ///
    /// Text can land in more than one field, so it returns `None`.
    #[must_use]
    pub fn field(&self) -> Option<DraftField> {
        match self {
            FieldValue::Amount(_) => Some(DraftField::Amount),
            FieldValue::Category(_) => Some(DraftField::Category),
            FieldValue::PaymentMethod(_) => Some(DraftField::PaymentMethod),
            FieldValue::Text(_) => None,
        }
    }
}

/// Partial fields of the record being collected by an active flow.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub amount: Option<Amount>,
    pub category: Option<Category>,
    pub payment_method: Option<PaymentMethod>,
    pub description: Option<String>,
    pub counterparty: Option<String>,
}

impl TransactionDraft {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Stores `value` into `field`.
    ///
    /// Returns `false`, leaving the draft untouched, when the value does not
    /// fit the field.
    pub fn merge(&mut self, field: DraftField, value: FieldValue) -> bool {
        match (field, value) {
            (DraftField::Amount, FieldValue::Amount(amount)) => self.amount = Some(amount),
            (DraftField::Category, FieldValue::Category(category)) => {
                self.category = Some(category)
            }
            (DraftField::PaymentMethod, FieldValue::PaymentMethod(method)) => {
                self.payment_method = Some(method)
            }
            (DraftField::Description, FieldValue::Text(text)) => self.description = Some(text),
            (DraftField::Counterparty, FieldValue::Text(text)) => self.counterparty = Some(text),
            _ => return false,
        }
        true
    }
}
