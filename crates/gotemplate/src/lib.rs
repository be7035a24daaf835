//! # gotemplate
//!
//! A small `text/template`-style renderer over [`serde_json::Value`]. Supports field access
//! (`.a.b`), `if`/`else if`/`else`, `range`, `with`, variables, pipelines and a handful of
//! builtin functions (`eq ne lt le gt ge and or not len index print println`).
//!
//! Rendering never fails on a missing key: the action prints [`NO_VALUE`]. Output of
//! [`render`] / [`Template::render`] has HTML character entities decoded, since API payloads
//! frequently carry `&amp;`, `&quot;` or `&#39;`.
//!
//! ```
//! use serde_json::json;
//!
//! let data = json!({"type": "single", "joke": "Tom &amp; Jerry"});
//! let out = gotemplate::render(
//!     r#"{{ if eq .type "twopart" }}{{ .setup }}{{ else }}{{ .joke }}{{ end }}"#,
//!     &data,
//! )
//! .unwrap();
//! assert_eq!(out, "Tom & Jerry");
//! ```

mod error;
mod exec;
mod funcs;
mod lex;
mod parse;
mod value;

use serde_json::Value;

pub use error::{Result, TemplateError};
pub use value::NO_VALUE;

/// A parsed template. Immutable and `Send + Sync`; one instance can be executed concurrently.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<parse::Node>,
}

impl Template {
    /// Parses template source. Unknown functions, undefined variables and unbalanced
    /// control structures are reported here, before any data is seen.
    pub fn parse(source: &str) -> Result<Self> {
        Ok(Self {
            nodes: parse::parse(source)?,
        })
    }

    /// Executes against `data` and returns the raw output (entities left as-is).
    pub fn execute(&self, data: &Value) -> Result<String> {
        exec::execute(&self.nodes, data)
    }

    /// Executes against `data` and decodes HTML entities in the output.
    pub fn render(&self, data: &Value) -> Result<String> {
        let raw = self.execute(data)?;
        Ok(unescape_html(&raw))
    }
}

/// Parses `template` and renders it against `data`. See [`Template::render`].
pub fn render(template: &str, data: &Value) -> Result<String> {
    Template::parse(template)?.render(data)
}

/// Decodes named and numeric HTML character references (`&amp;`, `&#39;`, `&#x27;`, ...).
pub fn unescape_html(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
