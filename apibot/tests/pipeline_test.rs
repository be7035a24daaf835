//! Integration tests for the fetch → decode → render → trim pipeline.
//!
//! Uses an in-memory [`HttpClient`] for pipeline semantics and a `mockito` server for
//! [`ReqwestHttpClient`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use apibot::{
    download, execute, HttpClient, HttpConfig, PipelineError, ReqwestHttpClient, TransportError,
};
use async_trait::async_trait;

/// Serves fixed bodies by URL; unknown URLs fail like a refused connection.
#[derive(Default)]
struct FakeClient {
    bodies: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl FakeClient {
    fn with(url: &str, body: &str) -> Self {
        let mut client = Self::default();
        client.bodies.insert(url.to_string(), body.as_bytes().to_vec());
        client
    }

    fn and(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }
}

#[async_trait]
impl HttpClient for FakeClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::new(url, "connection refused"))
    }
}

/// **Test: Fields are substituted from the decoded body.**
///
/// **Setup:** Body `{"a":1,"b":2,"c":3}`.
/// **Action:** `execute` with `{{ .a }} {{ .b }} {{ .c }}`.
/// **Expected:** `"1 2 3"`.
#[tokio::test]
async fn test_execute_renders_fields() {
    let client = FakeClient::with("http://api/x", r#"{"a":1,"b":2,"c":3}"#);
    let text = execute("http://api/x", "{{ .a }} {{ .b }} {{ .c }}", &client)
        .await
        .unwrap();
    assert_eq!(text, "1 2 3");
}

/// **Test: Non-JSON body is a decode error.**
#[tokio::test]
async fn test_execute_non_json_is_decode_error() {
    let client = FakeClient::with("http://api/x", "def");
    let err = execute("http://api/x", "{{ .a }}", &client).await.unwrap_err();
    assert!(matches!(err, PipelineError::Decode(_)), "got {err:?}");
}

/// **Test: Missing key prints the placeholder.**
#[tokio::test]
async fn test_execute_missing_key() {
    let client = FakeClient::with("http://api/x", r#"{"a":1}"#);
    let text = execute("http://api/x", "{{ .a }} {{ .b }}", &client).await.unwrap();
    assert_eq!(text, "1 <no value>");
}

/// **Test: Output is trimmed and entities decoded.**
#[tokio::test]
async fn test_execute_trims_and_unescapes() {
    let client = FakeClient::with("http://api/x", r#"{"joke":"Tom &amp; Jerry"}"#);
    let text = execute("http://api/x", "\n\n  {{ .joke }}  \n", &client).await.unwrap();
    assert_eq!(text, "Tom & Jerry");
}

/// **Test: Newlines inside the rendered text survive; only the ends are trimmed.**
///
/// **Setup:** Body `{"a":"line1","b":"line2"}`.
/// **Action:** `execute` with `{{ .a }}\n{{ .b }}\n`.
/// **Expected:** `"line1\nline2"`.
#[tokio::test]
async fn test_execute_keeps_inner_newlines() {
    let client = FakeClient::with("http://api/x", r#"{"a":"line1","b":"line2"}"#);
    let text = execute("http://api/x", "{{ .a }}\n{{ .b }}\n", &client).await.unwrap();
    assert_eq!(text, "line1\nline2");
}

/// **Test: Valid JSON that is not an object is a decode error.**
///
/// **Setup:** Bodies `[1,2]`, `"def"`, `42`, `true`.
/// **Action:** `execute` with templates that would otherwise render or fail at execution.
/// **Expected:** `PipelineError::Decode` every time; nothing is rendered.
#[tokio::test]
async fn test_execute_non_object_json_is_decode_error() {
    let cases = [
        (r#"[1,2]"#, "{{ .a }}"),
        (r#"[1,2]"#, "{{ range . }}{{ . }}{{ end }}"),
        (r#""def""#, "{{ . }}"),
        ("42", "{{ . }}"),
        ("true", "{{ . }}"),
    ];
    for (body, template) in cases {
        let client = FakeClient::with("http://api/x", body);
        let err = execute("http://api/x", template, &client).await.unwrap_err();
        assert!(
            matches!(err, PipelineError::Decode(_)),
            "body {body} with {template:?}: got {err:?}"
        );
    }
}

/// **Test: A `null` body decodes as an empty object.**
#[tokio::test]
async fn test_execute_null_body_is_empty_object() {
    let client = FakeClient::with("http://api/x", "null");
    let text = execute("http://api/x", "{{ .a }}", &client).await.unwrap();
    assert_eq!(text, "<no value>");
}

#[tokio::test]
async fn test_execute_transport_error_propagates() {
    let client = FakeClient::default();
    let err = execute("http://down/x", "{{ .a }}", &client).await.unwrap_err();
    match err {
        PipelineError::Transport(e) => assert_eq!(e.url, "http://down/x"),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_execute_template_errors() {
    let client = FakeClient::with("http://api/x", r#"{"n":5}"#);
    let err = execute("http://api/x", "{{ if .n }}", &client).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Render(gotemplate::TemplateError::Parse { .. })
    ));
    let err = execute("http://api/x", "{{ range .n }}{{ end }}", &client)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Render(gotemplate::TemplateError::Exec { .. })
    ));
}

/// **Test: Every invocation fetches again.**
#[tokio::test]
async fn test_execute_does_not_cache() {
    let client = FakeClient::with("http://api/x", r#"{"a":1}"#);
    for _ in 0..3 {
        execute("http://api/x", "{{ .a }}", &client).await.unwrap();
    }
    assert_eq!(client.calls.load(Ordering::SeqCst), 3);
}

/// **Test: Concurrent invocations of different commands do not interfere.**
///
/// **Setup:** Two URLs with different bodies, one shared client.
/// **Action:** 20 interleaved spawned executions.
/// **Expected:** Each result matches its own URL.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_execute_concurrent_invocations() {
    let client: Arc<dyn HttpClient> = Arc::new(
        FakeClient::with("http://api/a", r#"{"v":"alpha"}"#).and("http://api/b", r#"{"v":"beta"}"#),
    );

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let (url, want) = if i % 2 == 0 {
                    ("http://api/a", "alpha")
                } else {
                    ("http://api/b", "beta")
                };
                let text = execute(url, "{{ .v }}", client.as_ref()).await.unwrap();
                (text, want)
            })
        })
        .collect();

    for handle in handles {
        let (text, want) = handle.await.unwrap();
        assert_eq!(text, want);
    }
}

/// **Test: Real HTTP client returns the body without inspecting the status.**
///
/// **Setup:** mockito server answering 500 with a JSON body.
/// **Action:** `execute` against it.
/// **Expected:** The body is rendered normally.
#[tokio::test]
async fn test_reqwest_client_ignores_status() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/joke")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":true,"message":"No matching joke found"}"#)
        .create_async()
        .await;

    let client = ReqwestHttpClient::new(&HttpConfig::default()).unwrap();
    let url = format!("{}/joke", server.url());
    let text = execute(&url, "{{ .message }}", &client).await.unwrap();

    assert_eq!(text, "No matching joke found");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_reqwest_client_download_bodies() {
    let mut server = mockito::Server::new_async().await;
    let _empty = server.mock("GET", "/empty").with_body("").create_async().await;
    let _text = server.mock("GET", "/text").with_body("text\n").create_async().await;

    let client = ReqwestHttpClient::new(&HttpConfig::default()).unwrap();
    let empty = download(&format!("{}/empty", server.url()), &client).await.unwrap();
    let text = download(&format!("{}/text", server.url()), &client).await.unwrap();

    assert!(empty.is_empty());
    assert_eq!(text, b"text\n");

    let err = execute(&format!("{}/empty", server.url()), "{{ . }}", &client)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Decode(_)));
}

#[tokio::test]
async fn test_reqwest_client_body_limit() {
    let mut server = mockito::Server::new_async().await;
    let _big = server
        .mock("GET", "/big")
        .with_body("x".repeat(4096))
        .create_async()
        .await;

    let config = HttpConfig {
        max_body_bytes: 1024,
        ..HttpConfig::default()
    };
    let client = ReqwestHttpClient::new(&config).unwrap();
    let url = format!("{}/big", server.url());
    let err = download(&url, &client).await.unwrap_err();

    assert_eq!(err.url, url);
    assert!(err.to_string().contains("exceeds 1024 bytes"));
}

#[tokio::test]
async fn test_reqwest_client_connection_refused() {
    let client = ReqwestHttpClient::new(&HttpConfig::default()).unwrap();
    // Port 9 (discard) on localhost is closed in test environments.
    let err = download("http://127.0.0.1:9/x", &client).await.unwrap_err();
    assert_eq!(err.url, "http://127.0.0.1:9/x");
}
