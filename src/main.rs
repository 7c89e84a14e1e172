use depositdesk::communication::telegram::TelegramService;
use depositdesk::communication::BotContext;
use depositdesk::configuration::{require_env, Context};
use depositdesk::core::ServiceManager;
use depositdesk::database::DatabaseService;
use depositdesk::AppError;
use dotenvy::dotenv;
use std::str::FromStr;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    let context = Context::new("config.json").map_err(|e| AppError::ConfigError(e.to_string()))?;

    let log_level = Level::from_str(&context.config.log_level).unwrap_or(Level::INFO);
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(log_level.to_string()))
        .init();
    tracing::info!("Starting Deposit Desk");

    // Missing credentials are a boot failure, not a first-use failure.
    require_env("TELOXIDE_TOKEN").map_err(|e| AppError::ConfigError(e.to_string()))?;
    let store =
        Arc::new(DatabaseService::new().map_err(|e| AppError::DatabaseError(e.to_string()))?);

    let mut service_manager = ServiceManager::new(BotContext { context, store });
    service_manager.spawn::<TelegramService>();

    service_manager
        .wait()
        .await
        .map_err(|_| AppError::ServiceError)
}
