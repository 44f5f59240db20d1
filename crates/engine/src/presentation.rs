//! Builds replies (text + buttons) for each point of a conversation.

use std::sync::Arc;

use api_types::transaction::TransactionCreated;

use crate::{
    auth::AccessMode,
    catalog::MessageCatalog,
    draft::{Category, FlowKind, PaymentMethod},
    error::ValidationError,
    event::MenuButton,
    flows::FlowState,
    transport::{Button, Keyboard, Reply},
};

const BUTTONS_PER_ROW: usize = 2;

#[derive(Clone)]
pub struct Presenter {
    catalog: Arc<dyn MessageCatalog>,
}

impl Presenter {
    pub fn new(catalog: Arc<dyn MessageCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &dyn MessageCatalog {
        self.catalog.as_ref()
    }

    /// Question for `state`, preceded by `notice` when the last answer was
    /// rejected.
    pub fn prompt(&self, kind: FlowKind, state: FlowState, notice: Option<String>) -> Reply {
        let question = self.catalog.prompt(kind, state);
        let text = match notice {
            Some(notice) => format!("{notice}\n\n{question}"),
            None => question,
        };
        Reply::text(text).with_keyboard(self.step_keyboard(kind, state))
    }

    pub fn rejected(&self, kind: FlowKind, state: FlowState, error: &ValidationError) -> Reply {
        let notice = self.catalog.invalid_input(state, error);
        self.prompt(kind, state, Some(notice))
    }

    pub fn main_menu(&self, text: String) -> Reply {
        let rows = MenuButton::ALL
            .chunks(BUTTONS_PER_ROW)
            .map(|chunk| chunk.iter().map(|b| b.label().to_string()).collect())
            .collect();
        Reply::text(text).with_keyboard(Keyboard::Menu(rows))
    }

    pub fn welcome(&self) -> Reply {
        self.main_menu(self.catalog.welcome())
    }

    pub fn menu(&self) -> Reply {
        self.main_menu(self.catalog.menu())
    }

    pub fn help(&self) -> Reply {
        Reply::text(self.catalog.help())
    }

    pub fn unrecognized(&self) -> Reply {
        self.main_menu(self.catalog.unrecognized())
    }

    pub fn onboarding(&self, mode: AccessMode) -> Reply {
        Reply::text(self.catalog.onboarding(mode)).with_keyboard(Keyboard::Remove)
    }

    pub fn onboarding_failed(&self) -> Reply {
        Reply::text(self.catalog.onboarding_failed()).with_keyboard(Keyboard::Remove)
    }

    pub fn cancelled(&self) -> Reply {
        self.main_menu(self.catalog.cancelled())
    }

    pub fn nothing_to_cancel(&self) -> Reply {
        self.main_menu(self.catalog.nothing_to_cancel())
    }

    pub fn saved(&self, record: &TransactionCreated) -> Reply {
        self.main_menu(self.catalog.saved(record))
    }

    pub fn already_saved(&self, kind: FlowKind) -> Reply {
        self.main_menu(self.catalog.already_saved(kind))
    }

    pub fn persistence_failed(&self) -> Reply {
        self.main_menu(self.catalog.persistence_failed())
    }

    pub fn settings(&self, user_id: &str, mode: AccessMode, active: Option<FlowKind>) -> Reply {
        let rows = vec![
            vec![Button::callback(self.catalog.reset_label(), "settings_reset")],
            vec![Button::callback(self.catalog.menu_label(), "menu")],
        ];
        Reply::text(self.catalog.settings(user_id, mode, active))
            .with_keyboard(Keyboard::Inline(rows))
    }

    pub fn session_reset(&self) -> Reply {
        self.main_menu(self.catalog.session_reset())
    }

    /// Text that replaces an inline keyboard once one of its buttons was used.
    pub fn selection_recorded(&self, label: &str) -> Reply {
        Reply::text(self.catalog.selection_recorded(label))
    }

    pub fn delivery_fallback(&self) -> Reply {
        Reply::text(self.catalog.delivery_fallback())
    }

    fn step_keyboard(&self, kind: FlowKind, state: FlowState) -> Keyboard {
        let cancel = vec![Button::callback(self.catalog.cancel_label(), "cancel")];
        let mut rows: Vec<Vec<Button>> = match state {
            FlowState::Category => kind
                .categories()
                .chunks(BUTTONS_PER_ROW)
                .map(|chunk| chunk.iter().map(|c| category_button(*c)).collect())
                .collect(),
            FlowState::PaymentMethod => PaymentMethod::ALL
                .chunks(BUTTONS_PER_ROW)
                .map(|chunk| chunk.iter().map(|m| payment_button(*m)).collect())
                .collect(),
            FlowState::Description => {
                vec![vec![Button::callback(self.catalog.skip_label(), "skip")]]
            }
            FlowState::Amount | FlowState::CounterpartyName | FlowState::Idle => Vec::new(),
        };
        rows.push(cancel);
        Keyboard::Inline(rows)
    }
}

fn payload_slug(label: &str) -> String {
    label.to_ascii_lowercase().replace(' ', "_")
}

fn category_button(category: Category) -> Button {
    Button::callback(
        format!("{} {}", category.icon(), category.label()),
        format!("category_{}", payload_slug(category.label())),
    )
}

fn payment_button(method: PaymentMethod) -> Button {
    Button::callback(
        format!("{} {}", method.icon(), method.label()),
        format!("payment_{}", payload_slug(method.label())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::DefaultCatalog, event::CallbackAction, validators};

    fn presenter() -> Presenter {
        Presenter::new(Arc::new(DefaultCatalog::default()))
    }

    fn inline_payloads(reply: &Reply) -> Vec<String> {
        match &reply.keyboard {
            Some(Keyboard::Inline(rows)) => rows
                .iter()
                .flatten()
                .map(|b| b.payload.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn category_buttons_round_trip_through_validators() {
        let reply = presenter().prompt(FlowKind::Income, FlowState::Category, None);
        let payloads = inline_payloads(&reply);
        assert!(payloads.contains(&"cancel".to_string()));

        for payload in payloads.iter().filter(|p| p.starts_with("category_")) {
            let CallbackAction::Category(value) = CallbackAction::parse(payload) else {
                panic!("not a category payload: {payload}");
            };
            assert!(validators::parse_category(&value, Category::INCOME).is_ok());
        }
    }

    #[test]
    fn payment_buttons_round_trip_through_validators() {
        let reply = presenter().prompt(FlowKind::Expense, FlowState::PaymentMethod, None);
        let payloads = inline_payloads(&reply);
        assert!(payloads.contains(&"payment_net_banking".to_string()));
        for payload in payloads.iter().filter(|p| p.starts_with("payment_")) {
            let CallbackAction::Payment(value) = CallbackAction::parse(payload) else {
                panic!("not a payment payload: {payload}");
            };
            assert!(validators::parse_payment_method(&value).is_ok());
        }
    }

    #[test]
    fn description_prompt_offers_skip() {
        let reply = presenter().prompt(FlowKind::Expense, FlowState::Description, None);
        assert_eq!(inline_payloads(&reply), vec!["skip", "cancel"]);
    }

    #[test]
    fn rejection_keeps_question() {
        let reply = presenter().rejected(
            FlowKind::Expense,
            FlowState::Amount,
            &ValidationError::InvalidAmount("abc".into()),
        );
        assert!(reply.text.contains("abc"));
        assert!(reply.text.contains("How much did you spend?"));
    }
}
