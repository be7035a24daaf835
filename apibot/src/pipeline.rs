//! Fetch → decode → render → trim. One call per command invocation; nothing is cached.

use gotemplate::Template;
use serde::de::{self, Unexpected};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::error::{PipelineError, TransportError};
use crate::http::HttpClient;

/// GETs `url` and returns the full body. Transport failures propagate unchanged.
pub async fn download(url: &str, client: &dyn HttpClient) -> Result<Vec<u8>, TransportError> {
    client.get(url).await
}

/// Runs the pipeline with template source, parsing it on every call.
#[instrument(skip(template, client))]
pub async fn execute(
    api_url: &str,
    template: &str,
    client: &dyn HttpClient,
) -> Result<String, PipelineError> {
    let data = fetch_json(api_url, client).await?;
    let text = gotemplate::render(template, &data)?;
    Ok(text.trim().to_string())
}

/// Runs the pipeline with a template parsed at config load.
#[instrument(skip(template, client))]
pub async fn execute_template(
    api_url: &str,
    template: &Template,
    client: &dyn HttpClient,
) -> Result<String, PipelineError> {
    let data = fetch_json(api_url, client).await?;
    let text = template.render(&data)?;
    debug!(len = text.len(), "step: rendered");
    Ok(text.trim().to_string())
}

async fn fetch_json(api_url: &str, client: &dyn HttpClient) -> Result<Value, PipelineError> {
    let body = download(api_url, client).await?;
    debug!(bytes = body.len(), "step: downloaded");
    let data = decode_mapping(&body)?;
    debug!("step: decoded");
    Ok(data)
}

/// Decodes a JSON object. `null` decodes to an empty object; any other non-object is a
/// decode error.
fn decode_mapping(body: &[u8]) -> Result<Value, serde_json::Error> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Null => Ok(Value::Object(Map::new())),
        object @ Value::Object(_) => Ok(object),
        other => Err(<serde_json::Error as de::Error>::invalid_type(
            unexpected(&other),
            &"a JSON object",
        )),
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
            (Some(u), _, _) => Unexpected::Unsigned(u),
            (None, Some(i), _) => Unexpected::Signed(i),
            (None, None, Some(f)) => Unexpected::Float(f),
            _ => Unexpected::Other("number"),
        },
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Null | Value::Object(_) => Unexpected::Map,
    }
}
