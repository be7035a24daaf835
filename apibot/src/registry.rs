//! Immutable table of command bindings sharing one [`HttpClient`].

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use gotemplate::Template;
use tracing::{info, instrument};

use crate::config::CommandsConfig;
use crate::error::{ConfigError, FieldError, PipelineError};
use crate::http::HttpClient;
use crate::pipeline;

/// One configured command: name typed by users, API to fetch, template to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointBinding {
    pub command_name: String,
    pub api_url: String,
    pub template: String,
}

/// Zero-argument callback handed to a router; each call runs the pipeline once.
pub type CommandCallback =
    Arc<dyn Fn() -> BoxFuture<'static, Result<String, PipelineError>> + Send + Sync>;

struct Endpoint {
    binding: EndpointBinding,
    template: Arc<Template>,
}

/// Bindings in configuration order. Built once at startup, read-only afterwards.
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
    client: Arc<dyn HttpClient>,
}

impl EndpointRegistry {
    /// Parses every template up front so a broken one fails startup, not the first invocation.
    pub fn new(
        bindings: Vec<EndpointBinding>,
        client: Arc<dyn HttpClient>,
    ) -> Result<Self, ConfigError> {
        let mut endpoints = Vec::with_capacity(bindings.len());
        let mut errors = Vec::new();
        for (i, binding) in bindings.into_iter().enumerate() {
            match Template::parse(&binding.template) {
                Ok(template) => endpoints.push(Endpoint {
                    binding,
                    template: Arc::new(template),
                }),
                Err(e) => errors.push(FieldError::new(
                    format!("Commands[{i}].Template"),
                    e.to_string(),
                )),
            }
        }
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        info!(commands = endpoints.len(), "endpoint registry built");
        Ok(Self { endpoints, client })
    }

    pub fn from_config(
        config: CommandsConfig,
        client: Arc<dyn HttpClient>,
    ) -> Result<Self, ConfigError> {
        Self::new(config.commands, client)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &EndpointBinding> {
        self.endpoints.iter().map(|e| &e.binding)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// First binding with this command name.
    pub fn get(&self, command_name: &str) -> Option<&EndpointBinding> {
        self.find(command_name).map(|e| &e.binding)
    }

    /// Callback running the pipeline for `command_name`, if bound.
    pub fn callback(&self, command_name: &str) -> Option<CommandCallback> {
        self.find(command_name).map(|e| self.make_callback(e))
    }

    /// Calls `f(command_name, callback)` once per binding, in configuration order.
    pub fn for_each_binding<F>(&self, mut f: F)
    where
        F: FnMut(&str, CommandCallback),
    {
        for endpoint in &self.endpoints {
            f(&endpoint.binding.command_name, self.make_callback(endpoint));
        }
    }

    /// Runs `command_name` once. `None` when no such command is bound.
    #[instrument(skip(self))]
    pub async fn execute(&self, command_name: &str) -> Option<Result<String, PipelineError>> {
        let endpoint = self.find(command_name)?;
        Some(
            pipeline::execute_template(
                &endpoint.binding.api_url,
                &endpoint.template,
                self.client.as_ref(),
            )
            .await,
        )
    }

    fn find(&self, command_name: &str) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|e| e.binding.command_name == command_name)
    }

    fn make_callback(&self, endpoint: &Endpoint) -> CommandCallback {
        let api_url = endpoint.binding.api_url.clone();
        let template = Arc::clone(&endpoint.template);
        let client = Arc::clone(&self.client);
        Arc::new(move || {
            let api_url = api_url.clone();
            let template = Arc::clone(&template);
            let client = Arc::clone(&client);
            async move { pipeline::execute_template(&api_url, &template, client.as_ref()).await }
                .boxed()
        })
    }
}
