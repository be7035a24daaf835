//! REPL runner: converts teloxide messages to core messages, routes them, sends replies.

use std::sync::Arc;

use apibot_core::{init_tracing, Bot as CoreBot, Handler, HandlerResponse, Message, ToCoreMessage};
use teloxide::prelude::*;
use tracing::{error, info, instrument, warn};

use super::adapters::TelegramMessageWrapper;
use super::bot_adapter::TelegramBotAdapter;
use crate::config::{load_config, BaseConfig};
use crate::http::ReqwestHttpClient;
use crate::registry::EndpointRegistry;
use crate::router::CommandRouter;

/// Runs `handler` on one message and delivers a `Reply`. Failures are logged, never returned.
#[instrument(skip_all, fields(user_id = message.user.id, chat_id = message.chat.id, message_id = %message.id))]
pub async fn dispatch(handler: &dyn Handler, bot: &dyn CoreBot, message: &Message) {
    match handler.handle(message).await {
        Ok(HandlerResponse::Reply(text)) => {
            if let Err(e) = bot.reply_to(message, &text).await {
                error!(error = %e, "Failed to send reply");
            }
        }
        Ok(_) => {}
        Err(e) => error!(error = %e, "Handler failed"),
    }
}

/// Starts the teloxide REPL. Each text message is handled in its own spawned task.
/// Returns when the REPL stops (Ctrl-C).
#[instrument(skip_all)]
pub async fn run_repl(bot: teloxide::Bot, handler: Arc<dyn Handler>) -> anyhow::Result<()> {
    let core_bot: Arc<dyn CoreBot> = Arc::new(TelegramBotAdapter::new(bot.clone()));

    teloxide::repl(bot, move |_bot: Bot, msg: teloxide::types::Message| {
        let handler = handler.clone();
        let core_bot = core_bot.clone();

        async move {
            let core_msg = TelegramMessageWrapper(&msg).to_core();
            if msg.text().is_none() {
                info!(
                    user_id = core_msg.user.id,
                    chat_id = core_msg.chat.id,
                    "Received non-text message"
                );
                return Ok(());
            }

            info!(
                user_id = core_msg.user.id,
                chat_id = core_msg.chat.id,
                message_content = %core_msg.content,
                "Received message"
            );

            tokio::spawn(async move {
                dispatch(handler.as_ref(), core_bot.as_ref(), &core_msg).await;
            });

            Ok(())
        }
    })
    .await;

    Ok(())
}

/// Creates the teloxide Bot, pointing it at a custom Bot API server when configured.
pub fn build_telegram_bot(token: &str, api_url: Option<&str>) -> teloxide::Bot {
    let bot = teloxide::Bot::new(token);
    match api_url {
        Some(url_str) => match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        },
        None => bot,
    }
}

/// Main entry: validate config, init logging, load bindings, build the router, run the REPL.
#[instrument(skip(config))]
pub async fn run_bot(config: BaseConfig) -> anyhow::Result<()> {
    config.validate()?;
    let token = config.require_token()?.to_string();
    init_tracing(&config.log_file)?;

    info!(
        commands_config = %config.commands_config.display(),
        prefix = %config.command_prefix,
        "Initializing bot"
    );

    let commands = load_config(&config.commands_config)?;
    let client = ReqwestHttpClient::new(&config.http)?;
    let registry = EndpointRegistry::from_config(commands, Arc::new(client))?;
    for binding in registry.bindings() {
        info!(command = %binding.command_name, api_url = %binding.api_url, "Command registered");
    }

    let bot = build_telegram_bot(&token, config.telegram_api_url.as_deref());
    let bot_username = match bot.get_me().await {
        Ok(me) => me.user.username.clone(),
        Err(e) => {
            warn!(error = %e, "get_me failed, @mentions will not be checked");
            None
        }
    };
    if let Some(ref username) = bot_username {
        info!(username = %username, "Bot username set before repl");
    }

    let router = CommandRouter::from_registry(config.command_prefix.clone(), &registry)
        .with_bot_username(bot_username);

    info!("Bot started");
    run_repl(bot, Arc::new(router)).await?;
    info!("shutdown complete");
    Ok(())
}
