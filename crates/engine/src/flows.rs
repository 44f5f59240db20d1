//! Conversation flows.
//!
//! Every flow is a strictly linear list of [`Step`]s. A step binds a
//! [`FlowState`] to the validator that checks the user's answer and to the
//! draft field the answer is stored in. The same [`advance`] routine drives all
//! three flows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    draft::{Category, DraftField, FieldValue, FlowKind, PaymentMethod, TransactionDraft},
    error::ValidationError,
    money::Amount,
    validators,
};

/// Position of a conversation inside its flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Idle,
    Amount,
    Category,
    PaymentMethod,
    Description,
    CounterpartyName,
}

pub type Validator = fn(&str) -> Result<FieldValue, ValidationError>;

#[derive(Clone, Copy, Debug)]
pub struct Step {
    pub state: FlowState,
    pub validate: Validator,
    pub field: DraftField,
}

const EXPENSE_STEPS: &[Step] = &[
    Step {
        state: FlowState::Amount,
        validate: validators::validate_amount,
        field: DraftField::Amount,
    },
    Step {
        state: FlowState::Category,
        validate: validators::validate_expense_category,
        field: DraftField::Category,
    },
    Step {
        state: FlowState::PaymentMethod,
        validate: validators::validate_payment_method,
        field: DraftField::PaymentMethod,
    },
    Step {
        state: FlowState::Description,
        validate: validators::validate_description,
        field: DraftField::Description,
    },
];

const INCOME_STEPS: &[Step] = &[
    Step {
        state: FlowState::Amount,
        validate: validators::validate_amount,
        field: DraftField::Amount,
    },
    Step {
        state: FlowState::Category,
        validate: validators::validate_income_category,
        field: DraftField::Category,
    },
    Step {
        state: FlowState::Description,
        validate: validators::validate_description,
        field: DraftField::Description,
    },
];

const QUICK_PAYMENT_STEPS: &[Step] = &[
    Step {
        state: FlowState::Amount,
        validate: validators::validate_amount,
        field: DraftField::Amount,
    },
    Step {
        state: FlowState::CounterpartyName,
        validate: validators::validate_counterparty,
        field: DraftField::Counterparty,
    },
    Step {
        state: FlowState::Category,
        validate: validators::validate_expense_category,
        field: DraftField::Category,
    },
];

/// Ordered step table of a flow.
#[must_use]
pub fn steps(kind: FlowKind) -> &'static [Step] {
    match kind {
        FlowKind::Expense => EXPENSE_STEPS,
        FlowKind::Income => INCOME_STEPS,
        FlowKind::QuickPayment => QUICK_PAYMENT_STEPS,
    }
}

/// A flow in progress: which flow, where it is, and what has been collected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveFlow {
    pub kind: FlowKind,
    pub state: FlowState,
    pub draft: TransactionDraft,
    /// Minted when the flow starts and sent along with the persistence call.
    pub idempotency_key: Uuid,
}

impl ActiveFlow {
    #[must_use]
    pub fn start(kind: FlowKind) -> Self {
        Self {
            kind,
            state: steps(kind)[0].state,
            draft: TransactionDraft::default(),
            idempotency_key: Uuid::new_v4(),
        }
    }

    fn position(&self) -> Option<usize> {
        steps(self.kind).iter().position(|s| s.state == self.state)
    }
}

/// What the user sent while a flow is active.
#[derive(Clone, Debug, PartialEq)]
pub enum Input<'a> {
    /// Typed text, or the text of a reply-keyboard button.
    Text(&'a str),
    /// A value picked from an inline keyboard, already resolved.
    Selected(FieldValue),
    Cancel,
}

/// A draft with every field its flow requires.
#[derive(Clone, Debug, PartialEq)]
pub enum Completed {
    Expense {
        amount: Amount,
        category: Category,
        payment_method: PaymentMethod,
        description: String,
    },
    Income {
        amount: Amount,
        category: Category,
        description: String,
    },
    QuickPayment {
        amount: Amount,
        counterparty: String,
        category: Category,
    },
}

/// Outcome of feeding one input to an active flow.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// The flow was dropped together with its draft.
    Cancelled,
    /// The input did not pass validation; nothing changed.
    Rejected {
        state: FlowState,
        error: ValidationError,
    },
    /// A selection for another step (an old keyboard); nothing changed.
    Stale { state: FlowState },
    /// The value was stored and the flow moved on.
    Advanced { state: FlowState },
    /// The last step was answered; the record is ready to be persisted.
    Completed(Completed),
}

/// Feeds `input` to `flow`.
///
/// The flow is only mutated when the input is accepted. The caller owns the
/// session reset on [`Transition::Cancelled`] and [`Transition::Completed`].
pub fn advance(flow: &mut ActiveFlow, input: Input<'_>) -> Transition {
    let table = steps(flow.kind);
    let Some(position) = flow.position() else {
        // Idle is never stored inside an active flow; treat it as a dead flow.
        return Transition::Cancelled;
    };
    let step = table[position];

    let value = match input {
        Input::Cancel => return Transition::Cancelled,
        Input::Selected(value) => {
            if value.field() != Some(step.field) {
                return Transition::Stale { state: step.state };
            }
            value
        }
        Input::Text(text) => match (step.validate)(text) {
            Ok(value) => value,
            Err(error) => {
                return Transition::Rejected {
                    state: step.state,
                    error,
                };
            }
        },
    };

    let mut draft = flow.draft.clone();
    if !draft.merge(step.field, value) {
        return Transition::Stale { state: step.state };
    }

    match table.get(position + 1) {
        Some(next) => {
            flow.draft = draft;
            flow.state = next.state;
            Transition::Advanced { state: next.state }
        }
        None => match complete(flow.kind, &draft) {
            Some(completed) => {
                flow.draft = draft;
                Transition::Completed(completed)
            }
            None => Transition::Cancelled,
        },
    }
}

fn complete(kind: FlowKind, draft: &TransactionDraft) -> Option<Completed> {
    let amount = draft.amount?;
    let category = draft.category.unwrap_or_default();
    let completed = match kind {
        FlowKind::Expense => Completed::Expense {
            amount,
            category,
            payment_method: draft.payment_method?,
            description: draft.description.clone().unwrap_or_default(),
        },
        FlowKind::Income => Completed::Income {
            amount,
            category,
            description: draft.description.clone().unwrap_or_default(),
        },
        FlowKind::QuickPayment => Completed::QuickPayment {
            amount,
            counterparty: draft.counterparty.clone()?,
            category,
        },
    };
    Some(completed)
}
