//! Command list shown by Telegram clients.
//!
//! Parsing happens in the engine; this enum only feeds `set_my_commands`.

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum MenuCommands {
    #[command(description = "Show the main menu, or register with an invite code.")]
    Start,
    #[command(description = "Record an expense.")]
    Expense,
    #[command(description = "Record an income.")]
    Income,
    #[command(description = "Pay someone quickly.")]
    Quickpay,
    #[command(description = "Stop the current entry.")]
    Cancel,
    #[command(description = "Show the main menu.")]
    Menu,
    #[command(description = "Your settings.")]
    Settings,
    #[command(description = "Show this message.")]
    Help,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_is_listed() {
        let names: Vec<String> = MenuCommands::bot_commands()
            .into_iter()
            .map(|c| c.command.trim_start_matches('/').to_string())
            .collect();
        for expected in ["start", "expense", "income", "quickpay", "cancel"] {
            assert!(names.iter().any(|n| n == expected), "{expected} missing");
        }
    }
}
