// crates/piwigo-mock-server/tests/common/mod.rs
// =============================================================================
// Module: Mock Server Test Helpers
// Description: Shared helpers for listener integration tests.
// Purpose: Start servers on ephemeral ports and build Piwigo request bodies.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::error::Error;
use std::net::SocketAddr;

use piwigo_mock_config::LogSinkKind;
use piwigo_mock_config::MockServerConfig;
use piwigo_mock_server::MockServer;

/// Result alias used by listener test suites.
pub type TestResult = Result<(), Box<dyn Error>>;

/// Multipart boundary used by request builders.
pub const BOUNDARY: &str = "----PiwigoMockBoundary7MA4YWxkTrZu0gW";

/// Returns a loopback config on an ephemeral port with the given delay.
pub fn test_config(response_delay_ms: u64) -> MockServerConfig {
    let mut config = MockServerConfig::default();
    config.server.port = 0;
    config.server.response_delay_ms = response_delay_ms;
    config.logging.sink = LogSinkKind::None;
    config
}

/// Binds the server and runs its accept loop on a background task.
pub async fn spawn_server(config: MockServerConfig) -> Result<SocketAddr, Box<dyn Error>> {
    let bound = MockServer::from_config(config)?.bind().await?;
    let addr = bound.local_addr();
    tokio::spawn(bound.serve());
    Ok(addr)
}

/// Returns the `/ws.php` URL for a bound address.
pub fn endpoint(addr: SocketAddr) -> String {
    format!("http://{addr}/ws.php")
}

/// Builds a `multipart/form-data` body and its content type.
pub fn multipart_body(fields: &[(&str, &[u8])]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

/// Response fields inspected by the suites.
pub struct RpcResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header value.
    pub content_type: Option<String>,
    /// `Set-Cookie` header value.
    pub set_cookie: Option<String>,
    /// Response body as text.
    pub body: String,
}

/// Posts a raw body with an explicit content type.
pub async fn post(
    client: &reqwest::Client,
    url: &str,
    content_type: &str,
    body: Vec<u8>,
) -> Result<RpcResponse, Box<dyn Error>> {
    let response =
        client.post(url).header("content-type", content_type).body(body).send().await?;
    let status = response.status().as_u16();
    let header = |name: &str| {
        response.headers().get(name).and_then(|value| value.to_str().ok()).map(ToString::to_string)
    };
    let content_type = header("content-type");
    let set_cookie = header("set-cookie");
    let body = String::from_utf8(response.bytes().await?.to_vec())?;
    Ok(RpcResponse {
        status,
        content_type,
        set_cookie,
        body,
    })
}

/// Posts an urlencoded form body.
pub async fn post_form(
    client: &reqwest::Client,
    url: &str,
    body: &str,
) -> Result<RpcResponse, Box<dyn Error>> {
    post(client, url, "application/x-www-form-urlencoded", body.as_bytes().to_vec()).await
}
