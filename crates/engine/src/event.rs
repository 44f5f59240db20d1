//! Inbound chat events.

use crate::{
    backend::ProfileHints,
    draft::FlowKind,
    session::ConversationId,
    transport::MessageId,
    validators::normalize_label,
};

/// One inbound event, tagged with where it came from and who sent it.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub conversation_id: ConversationId,
    pub user_id: String,
    pub profile: ProfileHints,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    Command(Command),
    Text(String),
    Callback {
        id: String,
        /// Message carrying the tapped keyboard, when the client still has it.
        message_id: Option<MessageId>,
        payload: String,
    },
}

impl EventKind {
    /// Classifies a chat message: recognised `/commands` become
    /// [`EventKind::Command`], everything else stays text.
    pub fn from_text(text: &str) -> Self {
        match parse_command(text) {
            Some(command) => EventKind::Command(command),
            None => EventKind::Text(text.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start { code: Option<String> },
    Help,
    Menu,
    Cancel,
    Settings,
    StartFlow(FlowKind),
}

/// Parses `/name [argument]`, tolerating a `@botname` suffix.
pub fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    let rest = trimmed.strip_prefix('/')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let name = name.split('@').next().unwrap_or(name).to_ascii_lowercase();
    let arg = parts
        .next()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(ToString::to_string);

    match name.as_str() {
        "start" => Some(Command::Start { code: arg }),
        "help" => Some(Command::Help),
        "menu" | "home" => Some(Command::Menu),
        "cancel" => Some(Command::Cancel),
        "settings" => Some(Command::Settings),
        "expense" => Some(Command::StartFlow(FlowKind::Expense)),
        "income" => Some(Command::StartFlow(FlowKind::Income)),
        "quickpay" | "pay" => Some(Command::StartFlow(FlowKind::QuickPayment)),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsAction {
    Show,
    Reset,
}

/// Structured inline-button payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Category(String),
    Payment(String),
    StartFlow(FlowKind),
    Settings(SettingsAction),
    Skip,
    Cancel,
    Menu,
    Unknown(String),
}

impl CallbackAction {
    pub fn parse(payload: &str) -> Self {
        let payload = payload.trim();
        match payload {
            "cancel" => return CallbackAction::Cancel,
            "skip" => return CallbackAction::Skip,
            "menu" => return CallbackAction::Menu,
            _ => {}
        }

        if let Some(value) = payload.strip_prefix("category_") {
            CallbackAction::Category(value.to_string())
        } else if let Some(value) = payload.strip_prefix("payment_") {
            CallbackAction::Payment(value.to_string())
        } else if let Some(kind) = payload.strip_prefix("flow_").and_then(FlowKind::from_slug) {
            CallbackAction::StartFlow(kind)
        } else {
            match payload.strip_prefix("settings_") {
                Some("show") => CallbackAction::Settings(SettingsAction::Show),
                Some("reset") => CallbackAction::Settings(SettingsAction::Reset),
                _ => CallbackAction::Unknown(payload.to_string()),
            }
        }
    }
}

/// Buttons of the persistent main menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuButton {
    AddExpense,
    AddIncome,
    QuickPayment,
    Settings,
    Help,
}

impl MenuButton {
    pub const ALL: &'static [MenuButton] = &[
        MenuButton::AddExpense,
        MenuButton::AddIncome,
        MenuButton::QuickPayment,
        MenuButton::Settings,
        MenuButton::Help,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            MenuButton::AddExpense => "💸 Add Expense",
            MenuButton::AddIncome => "💰 Add Income",
            MenuButton::QuickPayment => "⚡ Quick Payment",
            MenuButton::Settings => "⚙️ Settings",
            MenuButton::Help => "❓ Help",
        }
    }

    /// Matches the text of a tapped menu button (icon optional, any case).
    pub fn match_label(text: &str) -> Option<Self> {
        let wanted = normalize_label(text);
        if wanted.is_empty() {
            return None;
        }
        MenuButton::ALL
            .iter()
            .copied()
            .find(|button| normalize_label(button.label()) == wanted)
    }
}
