//! Executes an `HttpRequest` over the network and records the response.
//!
//! # Design
//! `HttpClient` wraps a blocking `ureq::Agent` with status-as-error turned
//! off: a 404 or 500 is a response to record, not a failure. Only transport
//! problems (refused connection, DNS, broken stream) become
//! `HarnessError::Network`.
//!
//! Headers and cookies go out on every verb. Whether the JSON payload goes out
//! is decided by the client's `BodyPolicy`.

use ureq::http::{header, HeaderMap};
use ureq::{Agent, RequestBuilder};

use crate::error::{HarnessError, Result};
use crate::http::{BodyPolicy, HttpMethod, HttpRequest, HttpResponse, ResponseBody};
use crate::kv::KeyValues;

/// Blocking HTTP client for one request/response exchange.
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: Agent,
    body_policy: BodyPolicy,
}

impl HttpClient {
    pub fn new(body_policy: BodyPolicy) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent, body_policy }
    }

    /// Send `req` with the verb it names and collect the response.
    pub fn execute(&self, req: &HttpRequest) -> Result<HttpResponse> {
        let body = if self.body_policy.sends_body(req.method) {
            Some(serde_json::to_vec(&req.payload).map_err(|source| {
                HarnessError::Configuration(format!(
                    "request payload cannot be serialized: {source}"
                ))
            })?)
        } else {
            None
        };

        let mut response = match (req.method, body) {
            (HttpMethod::Get, _) => decorate(self.agent.get(&req.url), req).call(),
            (HttpMethod::Delete, None) => decorate(self.agent.delete(&req.url), req).call(),
            (HttpMethod::Delete, Some(body)) => {
                send_json(decorate(self.agent.delete(&req.url).force_send_body(), req), &body)
            }
            (HttpMethod::Post, body) => send(decorate(self.agent.post(&req.url), req), body),
            (HttpMethod::Put, body) => send(decorate(self.agent.put(&req.url), req), body),
            (HttpMethod::Patch, body) => send(decorate(self.agent.patch(&req.url), req), body),
        }?;

        let status_code = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let cookies = collect_cookies(response.headers());
        let content_type = headers
            .get(header::CONTENT_TYPE.as_str())
            .cloned()
            .unwrap_or_default();
        // ureq caps `read_to_string` at 10 MiB by default; bodies are
        // recorded whatever their size.
        let text = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_string()?;

        let body = if content_type.contains("json") {
            ResponseBody::Json(text)
        } else {
            ResponseBody::Text(text)
        };

        Ok(HttpResponse {
            status_code,
            headers,
            cookies,
            body,
            content_type,
        })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(BodyPolicy::default())
    }
}

impl HttpRequest {
    /// Execute with a default client.
    pub fn do_http(&self) -> Result<HttpResponse> {
        HttpClient::default().execute(self)
    }
}

type UreqResult = std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error>;

fn decorate<B>(mut builder: RequestBuilder<B>, req: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(cookie) = cookie_header(&req.cookies) {
        builder = builder.header(header::COOKIE.as_str(), cookie);
    }
    builder
}

fn send(builder: RequestBuilder<ureq::typestate::WithBody>, body: Option<Vec<u8>>) -> UreqResult {
    match body {
        Some(body) => send_json(builder, &body),
        None => builder.send_empty(),
    }
}

fn send_json(builder: RequestBuilder<ureq::typestate::WithBody>, body: &[u8]) -> UreqResult {
    builder.content_type("application/json").send(body)
}

/// `a=1; b=2`, or `None` when there are no cookies to send.
fn cookie_header(cookies: &KeyValues) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    let pairs: Vec<String> = cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    Some(pairs.join("; "))
}

/// Header names come out lower-case; repeated headers are joined with `, `.
fn collect_headers(headers: &HeaderMap) -> KeyValues {
    let mut map = KeyValues::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map
}

/// The `name=value` part of every `Set-Cookie` header.
fn collect_cookies(headers: &HeaderMap) -> KeyValues {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}
