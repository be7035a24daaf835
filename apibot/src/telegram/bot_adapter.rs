//! Wraps teloxide::Bot and implements core [`Bot`](apibot_core::Bot).

use apibot_core::{ApibotError, Bot as CoreBot, Chat, Result};
use async_trait::async_trait;
use teloxide::{prelude::*, types::ChatId};

/// Sends replies through the Telegram Bot API.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(|e| ApibotError::Bot(e.to_string()))?;
        Ok(())
    }
}
