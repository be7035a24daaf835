//! Command bindings document: `commands: [{command, apiUrl, template}]`, parsed from YAML and validated.

use std::collections::HashSet;
use std::path::Path;

use gotemplate::Template;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{ConfigError, FieldError, BLANK};
use crate::registry::EndpointBinding;

/// Validated set of bindings, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandsConfig {
    pub commands: Vec<EndpointBinding>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    commands: Option<Vec<RawCommand>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCommand {
    #[serde(default)]
    command: Option<String>,
    #[serde(default, rename = "apiUrl")]
    api_url: Option<String>,
    #[serde(default)]
    template: Option<String>,
}

/// Reads `path` and parses it with [`parse_config`].
#[instrument]
pub fn load_config(path: &Path) -> Result<CommandsConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content)?;
    debug!(commands = config.commands.len(), "commands config loaded");
    Ok(config)
}

/// Parses and validates a YAML document. Every invalid field is reported, not just the first.
pub fn parse_config(content: &str) -> Result<CommandsConfig, ConfigError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let raw = if is_blank_document(content) {
        RawConfig::default()
    } else {
        serde_yaml::from_str::<Option<RawConfig>>(content)?.unwrap_or_default()
    };
    validate(raw)
}

/// True for documents holding nothing but whitespace, comments and document markers.
fn is_blank_document(content: &str) -> bool {
    content.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn validate(raw: RawConfig) -> Result<CommandsConfig, ConfigError> {
    let entries = match raw.commands {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            return Err(ConfigError::Validation(vec![FieldError::new(
                "Commands", BLANK,
            )]))
        }
    };

    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    let mut commands = Vec::with_capacity(entries.len());

    for (i, entry) in entries.into_iter().enumerate() {
        let command = non_blank(entry.command);
        let api_url = non_blank(entry.api_url);
        let template = non_blank(entry.template);

        match &command {
            None => errors.push(FieldError::new(format!("Commands[{i}].Command"), BLANK)),
            Some(name) if !is_command_name(name) => errors.push(FieldError::new(
                format!("Commands[{i}].Command"),
                "must contain English letters and digits only",
            )),
            Some(name) if !seen.insert(name.clone()) => errors.push(FieldError::new(
                format!("Commands[{i}].Command"),
                format!("duplicate command \"{name}\""),
            )),
            Some(_) => {}
        }

        match &api_url {
            None => errors.push(FieldError::new(format!("Commands[{i}].ApiUrl"), BLANK)),
            Some(url) if !is_http_url(url) => errors.push(FieldError::new(
                format!("Commands[{i}].ApiUrl"),
                "must be a valid URL",
            )),
            Some(_) => {}
        }

        match &template {
            None => errors.push(FieldError::new(format!("Commands[{i}].Template"), BLANK)),
            Some(source) => {
                if let Err(e) = Template::parse(source) {
                    errors.push(FieldError::new(format!("Commands[{i}].Template"), e.to_string()));
                }
            }
        }

        if let (Some(command_name), Some(api_url), Some(template)) = (command, api_url, template) {
            commands.push(EndpointBinding {
                command_name,
                api_url,
                template,
            });
        }
    }

    if errors.is_empty() {
        Ok(CommandsConfig { commands })
    } else {
        Err(ConfigError::Validation(errors))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Command names are typed by users after the prefix: ASCII letters and digits only.
pub fn is_command_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_http_url(url: &str) -> bool {
    match reqwest::Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}
