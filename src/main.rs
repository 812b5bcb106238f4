use anyhow::Result;
use id_scanner::bot::{self, ScannerServices};
use id_scanner::config::AppConfig;
use id_scanner::dialogue::{ScanDialogue, ScanDialogueState};
use id_scanner::errors::error_logging;
use id_scanner::instance_manager::OcrInstanceManager;
use id_scanner::localization;
use id_scanner::observability;
use id_scanner::session::SessionStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let startup_start = Instant::now();

    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    // Load and validate configuration before anything else runs
    let config = AppConfig::from_env()?;
    if let Err(e) = config.validate() {
        error_logging::log_config_error(&e, "app_config", "startup_validation");
        return Err(anyhow::anyhow!(
            "Configuration validation failed: {}. Please check your environment variables.",
            e
        ));
    }

    // Initialize complete observability stack (logging, metrics, tracing)
    observability::init_observability_with_config(&config.observability, &config.ocr).await?;
    info!("{}", config.summary());

    // Start background metrics recording tasks
    let _health_metrics_handle = observability::start_health_metrics_recorder(config.ocr.clone());

    // Initialize localization manager
    let localization_manager = localization::create_localization_manager()?;

    // Telegram client with a timeout; submissions use their own client so that
    // only the connection test is time-limited
    let telegram_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.bot.http_timeout_secs))
        .build()?;
    let bot = Bot::with_client(config.bot.token.clone(), telegram_client);

    let services = Arc::new(ScannerServices {
        sessions: SessionStore::new(config.api.to_api_config()),
        localization: localization_manager,
        ocr_config: config.ocr.clone(),
        ocr_instances: OcrInstanceManager::new(),
        http_client: reqwest::Client::builder().build()?,
    });

    info!(
        http_timeout_secs = config.bot.http_timeout_secs,
        "Bot initialized, starting dispatcher"
    );

    // Create shared dialogue storage
    let dialogue_storage = InMemStorage::<ScanDialogueState>::new();

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let storage = dialogue_storage.clone();
            let services = Arc::clone(&services);
            move |bot: Bot, msg: Message| {
                let dialogue = ScanDialogue::new(storage.clone(), msg.chat.id);
                let services = Arc::clone(&services);
                async move { bot::message_handler(bot, msg, dialogue, services).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let storage = dialogue_storage.clone();
            let services = Arc::clone(&services);
            move |bot: Bot, q: CallbackQuery| {
                // Use the chat ID from the original message that contained the inline keyboard
                let dialogue = ScanDialogue::new(storage.clone(), bot::callback_chat_id(&q));
                let services = Arc::clone(&services);
                async move { bot::callback_handler(bot, q, dialogue, services).await }
            }
        }));

    observability::record_startup_metrics(startup_start.elapsed());

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
