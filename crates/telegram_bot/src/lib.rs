//! Telegram bot.
//!
//! The bot is a thin client: updates become engine events, records go to the
//! HTTP ledger server, replies go back through the Bot API.

use std::{path::PathBuf, sync::Arc, time::Duration};

use base64::Engine as _;
use chrono_tz::Tz;
use engine::{
    AccessMode, DefaultCatalog, Engine, JsonSessionStore, MemorySessionStore, SessionStore,
};
use reqwest::{Client, header};
use teloxide::{prelude::*, utils::command::BotCommands};

mod api;
mod commands;
mod handlers;
mod transport;
mod ui;

const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

#[derive(Clone)]
pub struct ConfigParameters {
    engine: Arc<Engine>,
}

pub struct Bot {
    token: String,
    allowed_users: Vec<UserId>,
    server: String,
    client: Client,
    mode: AccessMode,
    state_path: Option<PathBuf>,
    session_ttl: Duration,
    call_timeout: Duration,
    timezone: Tz,
    currency_symbol: String,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub async fn run(&self) -> Result<(), String> {
        tracing::info!("Starting telegram bot...");

        let bot = teloxide::Bot::new(&self.token);
        let api = Arc::new(api::ApiClient::new(
            self.client.clone(),
            self.server.clone(),
            self.timezone,
        ));
        let store: Arc<dyn SessionStore> = match &self.state_path {
            Some(path) => Arc::new(JsonSessionStore::load_or_empty(path.clone())),
            None => Arc::new(MemorySessionStore::default()),
        };

        let engine = Engine::builder()
            .store(store)
            .ledger(api.clone())
            .directory(api)
            .transport(Arc::new(transport::TelegramTransport::new(bot.clone())))
            .catalog(Arc::new(DefaultCatalog::new(self.currency_symbol.clone())))
            .mode(self.mode)
            .session_ttl(self.session_ttl)
            .call_timeout(self.call_timeout)
            .build()
            .map_err(|err| format!("failed to build engine: {err}"))?;

        engine.bootstrap().await;
        for user in &self.allowed_users {
            engine.authorize(user.0.to_string()).await;
        }

        if let Err(err) = bot.set_my_commands(commands::MenuCommands::bot_commands()).await {
            tracing::warn!("failed to register bot commands: {err}");
        }

        let parameters = ConfigParameters {
            engine: Arc::new(engine),
        };

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handlers::handle_message))
            .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![parameters])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
        Ok(())
    }
}

#[derive(Default, Debug)]
pub struct BotBuilder {
    token: String,
    allowed_users: Vec<UserId>,
    server: String,
    username: String,
    password: String,
    mode: AccessMode,
    state_path: Option<PathBuf>,
    session_ttl: Option<Duration>,
    call_timeout: Option<Duration>,
    timezone: Option<String>,
    currency_symbol: Option<String>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    /// Users authorized at startup, in addition to those the server lists.
    pub fn allowed_users(mut self, allowed_users: impl IntoIterator<Item = u64>) -> BotBuilder {
        self.allowed_users = allowed_users.into_iter().map(UserId).collect();
        self
    }

    pub fn server(mut self, server: &str, username: &str, password: &str) -> BotBuilder {
        self.server = server.to_string();
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    pub fn mode(mut self, mode: AccessMode) -> BotBuilder {
        self.mode = mode;
        self
    }

    /// Keep sessions in a JSON file instead of memory.
    pub fn state_path(mut self, path: impl Into<PathBuf>) -> BotBuilder {
        self.state_path = Some(path.into());
        self
    }

    pub fn session_ttl(mut self, ttl: Duration) -> BotBuilder {
        self.session_ttl = Some(ttl);
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> BotBuilder {
        self.call_timeout = Some(timeout);
        self
    }

    /// IANA zone used to timestamp records, e.g. `Asia/Kolkata`.
    pub fn timezone(mut self, timezone: &str) -> BotBuilder {
        self.timezone = Some(timezone.to_string());
        self
    }

    pub fn currency_symbol(mut self, symbol: &str) -> BotBuilder {
        self.currency_symbol = Some(symbol.to_string());
        self
    }

    pub fn build(self) -> Result<Bot, String> {
        tracing::info!("Initializing telegram bot...");

        let timezone = match self.timezone.as_deref() {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|err| format!("invalid timezone {name}: {err}"))?,
            None => Tz::UTC,
        };
        let call_timeout = self.call_timeout.unwrap_or(DEFAULT_CALL_TIMEOUT);

        // Basic authorization is in the form "Basic `secret`" where `secret` is
        // the base64 of the string "username:password".
        let secret = format!("{}:{}", self.username, self.password);
        let secret = format!("Basic {}", base64::prelude::BASE64_STANDARD.encode(secret));

        let mut auth = header::HeaderValue::try_from(secret)
            .map_err(|err| format!("invalid auth header value: {err}"))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(call_timeout)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;

        Ok(Bot {
            token: self.token,
            allowed_users: self.allowed_users,
            server: self.server,
            client,
            mode: self.mode,
            state_path: self.state_path,
            session_ttl: self.session_ttl.unwrap_or(DEFAULT_SESSION_TTL),
            call_timeout,
            timezone,
            currency_symbol: self
                .currency_symbol
                .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_unknown_timezone() {
        let err = Bot::builder().timezone("Mars/Olympus").build().err();
        assert!(err.is_some_and(|e| e.contains("Mars/Olympus")));
    }

    #[test]
    fn builder_defaults() {
        let bot = Bot::builder()
            .token("123:abc")
            .server("http://localhost:3000", "bot", "secret")
            .build()
            .unwrap();
        assert_eq!(bot.timezone, Tz::UTC);
        assert_eq!(bot.mode, AccessMode::Open);
        assert_eq!(bot.session_ttl, DEFAULT_SESSION_TTL);
        assert_eq!(bot.currency_symbol, "₹");
        assert!(bot.state_path.is_none());
    }
}
