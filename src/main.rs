//! Entry point: logging, configuration, database, the Telegram dispatcher,
//! the notifier schedule and the health server.

use anyhow::Result;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uni_timetable_bot::bot::handlers::BotHandler;
use uni_timetable_bot::config::Config;
use uni_timetable_bot::database::connection::DatabaseManager;
use uni_timetable_bot::services::health::HealthService;
use uni_timetable_bot::services::notifier::NotifierService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uni_timetable_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting University Timetable Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}",
        config.database_url, config.http_port
    );

    info!("Initializing database connection...");
    let db = DatabaseManager::new(&config.database_url).await?;
    info!("Running database migrations...");
    db.run_migrations().await?;
    info!("Database initialized successfully");

    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.telegram_bot_token);
    let handler = BotHandler::new(bot.clone(), db.clone())
        .map_err(|e| anyhow::anyhow!("Failed to build dispatch schema: {}", e))?;

    info!("Initializing notifier...");
    let mut notifier = NotifierService::new(bot.clone(), db.clone(), &config.notify_cron)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create notifier: {}", e))?;
    if let Err(e) = notifier.start().await {
        tracing::error!("Failed to start notifier: {}", e);
    }

    let health_service = HealthService::new(db.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;
    info!("Health check server starting on port {}", config.http_port);

    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(bot, handler.schema())
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    tokio::select! {
        result = bot_task => {
            if let Err(e) = result {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result = health_task => {
            if let Err(e) = result {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    if let Err(e) = notifier.stop().await {
        tracing::warn!("Error stopping notifier: {}", e);
    }

    info!("Application stopped");
    Ok(())
}
