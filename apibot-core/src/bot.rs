//! Bot abstraction for delivering replies.
//!
//! [`Bot`] is transport-agnostic; the Telegram implementation lives in `apibot::telegram`.

use crate::error::Result;
use crate::types::{Chat, Message};
use async_trait::async_trait;

/// Abstraction for sending messages. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a text message to the given chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;

    /// Sends a reply to the given message (same chat).
    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        self.send_message(&message.chat, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::User;
    use std::sync::Mutex;

    struct RecordingBot {
        sent: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl Bot for RecordingBot {
        async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
            self.sent
                .lock()
                .map_err(|e| crate::error::ApibotError::Bot(e.to_string()))?
                .push((chat.id, text.to_string()));
            Ok(())
        }
    }

    /// **Test: Default reply_to sends to the message's chat.**
    #[tokio::test]
    async fn test_reply_to_uses_message_chat() {
        let bot = RecordingBot {
            sent: Mutex::new(Vec::new()),
        };
        let message = Message {
            id: "1".to_string(),
            user: User::anonymous(),
            chat: Chat {
                id: -100,
                chat_type: "supergroup".to_string(),
            },
            content: ".joke".to_string(),
            created_at: chrono::Utc::now(),
        };

        bot.reply_to(&message, "ha").await.unwrap();

        assert_eq!(*bot.sent.lock().unwrap(), vec![(-100, "ha".to_string())]);
    }
}
