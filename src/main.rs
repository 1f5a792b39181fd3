use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::update_listeners::Polling;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

use soxbot::bot::update::independent_updates;
use soxbot::bot::{Incoming, IncomingCallback, IncomingMessage, Outcome, TelegramClient, VoiceEngine};
use soxbot::config::Config;

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let level = if config.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let mut _guard = None;
    let file_layer = match config.log_file.as_ref() {
        Some(path) => match std::fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(log_file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
                _guard = Some(guard);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into())),
                )
            }
            Err(e) => {
                eprintln!("Failed to open log file '{}': {e}", path.display());
                None
            }
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into())),
        )
        .with(file_layer)
        .init();

    info!("Loaded config from {config_path}");
    info!("Allowed ids: {:?}", config.available_ids);
    info!("Presets: {:?}", config.presets.keys().collect::<Vec<_>>());

    let bot = Bot::new(&config.api_token);

    match bot.get_me().await {
        Ok(me) => info!("🚀 Launching bot: @{} ({})", me.username(), me.first_name),
        Err(e) => {
            error!("Failed to get info of the bot: {e}");
            std::process::exit(1);
        }
    }

    let poll_timeout = config.monitor_interval;
    let telegram = Arc::new(TelegramClient::new(bot.clone()));
    let engine = Arc::new(VoiceEngine::new(Arc::new(config), telegram));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback_query));

    // Updates can't be polled while a webhook is set
    let listener = Polling::builder(bot.clone())
        .timeout(poll_timeout)
        .delete_webhook()
        .await
        .build();

    // No converter timeout, so a hung sox must not block later updates in its chat
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .distribution_function(independent_updates)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("*** Error while receiving update"),
        )
        .await;
}

async fn handle_message(msg: Message, engine: Arc<VoiceEngine>) -> ResponseResult<()> {
    let outcome = engine.handle(Incoming::Message(IncomingMessage::from(&msg))).await;
    if outcome == Outcome::Failed {
        warn!("Message {} in chat {} was not handled cleanly", msg.id, msg.chat.id.0);
    }
    Ok(())
}

async fn handle_callback_query(q: CallbackQuery, engine: Arc<VoiceEngine>) -> ResponseResult<()> {
    let outcome = engine.handle(Incoming::Callback(IncomingCallback::from(&q))).await;
    if outcome == Outcome::Failed {
        warn!("Callback query {} was not handled cleanly", q.id);
    }
    Ok(())
}
