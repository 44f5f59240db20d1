use std::time::Duration;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tallybot={level},telegram_bot={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(telegram) = settings.telegram else {
        tracing::warn!("No telegram settings found, nothing to run");
        return Ok(());
    };

    tracing::info!("Found telegram settings...");
    let mut builder = telegram_bot::Bot::builder()
        .token(&telegram.token)
        .server(&telegram.server, &telegram.username, &telegram.password)
        .allowed_users(telegram.allowed_users)
        .mode(telegram.mode)
        .session_ttl(Duration::from_secs(telegram.session_ttl_secs))
        .call_timeout(Duration::from_secs(telegram.call_timeout_secs))
        .timezone(&telegram.timezone)
        .currency_symbol(&telegram.currency_symbol);
    if let Some(path) = telegram.state_path {
        builder = builder.state_path(path);
    }

    let bot = builder.build()?;
    bot.run().await?;
    Ok(())
}
