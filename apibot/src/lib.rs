//! # apibot
//!
//! Chat commands answered from JSON APIs. Each configured command names an API URL and a
//! template; an invocation fetches the URL, decodes the body as JSON, renders the template
//! against it and replies with the trimmed text.
//!
//! - [`config`]: env settings and the `commands:` YAML document.
//! - [`registry`]: immutable binding table, hands out one callback per command.
//! - [`pipeline`]: fetch → decode → render → trim.
//! - [`router`]: `.command` parsing, implemented as a core [`Handler`](apibot_core::Handler).
//! - [`telegram`]: teloxide REPL and adapters.

pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod registry;
pub mod router;
pub mod telegram;

pub use config::{load_config, parse_config, BaseConfig, CommandsConfig};
pub use error::{ConfigError, FieldError, PipelineError, TransportError};
pub use http::{HttpClient, HttpConfig, ReqwestHttpClient};
pub use pipeline::{download, execute, execute_template};
pub use registry::{CommandCallback, EndpointBinding, EndpointRegistry};
pub use router::{CommandRouter, ParsedCommand};
pub use telegram::{dispatch, run_bot, run_repl, TelegramBotAdapter};
