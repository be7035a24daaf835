//! Telegram transport: teloxide adapters and the REPL runner.

mod adapters;
mod bot_adapter;
mod runner;

pub use adapters::{TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::TelegramBotAdapter;
pub use runner::{build_telegram_bot, dispatch, run_bot, run_repl};
