//! # apibot-core
//!
//! Core types and traits shared by the bot: [`Bot`], [`Handler`], message and user types,
//! and tracing initialization. Transport-agnostic; used by the `apibot` crate and its Telegram runner.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::Bot;
pub use error::{ApibotError, Result};
pub use logger::init_tracing;
pub use types::{Chat, Handler, HandlerResponse, Message, ToCoreMessage, ToCoreUser, User};
