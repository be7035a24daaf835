//! Routes `<prefix><command>[@bot] [args]` messages to registered command callbacks.

use std::collections::HashMap;

use apibot_core::{Handler, HandlerResponse, Message, Result};
use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use crate::registry::{CommandCallback, EndpointRegistry};

/// Command name and optional `@bot` suffix, as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: &'a str,
    pub mention: Option<&'a str>,
}

/// Handler that answers bound commands. Unknown commands and plain text are ignored.
pub struct CommandRouter {
    prefix: String,
    commands: HashMap<String, CommandCallback>,
    bot_username: Option<String>,
}

impl CommandRouter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: HashMap::new(),
            bot_username: None,
        }
    }

    /// Commands addressed to another bot (`.joke@otherbot`) are ignored once this is set.
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    /// Registers a callback. The first registration of a name wins.
    pub fn add_command(&mut self, name: &str, callback: CommandCallback) {
        self.commands.entry(name.to_string()).or_insert(callback);
    }

    /// Router with every binding of `registry` registered.
    pub fn from_registry(prefix: impl Into<String>, registry: &EndpointRegistry) -> Self {
        let mut router = Self::new(prefix);
        registry.for_each_binding(|name, callback| router.add_command(name, callback));
        router
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Splits `text` into command name and mention. `None` unless it starts with the prefix.
    pub fn parse_command<'a>(&self, text: &'a str) -> Option<ParsedCommand<'a>> {
        let rest = text.trim_start().strip_prefix(self.prefix.as_str())?;
        let word = rest.split(char::is_whitespace).next()?;
        let (name, mention) = match word.split_once('@') {
            Some((name, bot)) => (name, Some(bot)),
            None => (word, None),
        };
        if name.is_empty() {
            return None;
        }
        Some(ParsedCommand { name, mention })
    }

    fn addressed_to_us(&self, mention: Option<&str>) -> bool {
        match (mention, &self.bot_username) {
            (Some(target), Some(ours)) => target.eq_ignore_ascii_case(ours),
            _ => true,
        }
    }
}

#[async_trait]
impl Handler for CommandRouter {
    #[instrument(skip(self, message), fields(user_id = message.user.id, chat_id = message.chat.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let Some(parsed) = self.parse_command(&message.content) else {
            return Ok(HandlerResponse::Ignore);
        };
        if !self.addressed_to_us(parsed.mention) {
            return Ok(HandlerResponse::Ignore);
        }
        let Some(callback) = self.commands.get(parsed.name) else {
            return Ok(HandlerResponse::Ignore);
        };

        info!(command = %parsed.name, "step: command invoked");
        match callback().await {
            Ok(text) if text.is_empty() => {
                warn!(command = %parsed.name, "command rendered empty text, nothing sent");
                Ok(HandlerResponse::Stop)
            }
            Ok(text) => {
                info!(command = %parsed.name, reply_len = text.len(), "step: command done");
                Ok(HandlerResponse::Reply(text))
            }
            Err(e) => {
                error!(command = %parsed.name, error = %e, "command failed");
                Ok(HandlerResponse::Stop)
            }
        }
    }
}
