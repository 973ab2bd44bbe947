//! HTTP request and response records.
//!
//! # Design
//! These types describe one request and one response as plain data. The
//! request is assembled from files by `request::read_http_parameters`, the
//! response is filled in by `client::HttpClient` and written back out by
//! `response::write_response_files`. Neither changes after construction.
//!
//! Header and cookie maps are `BTreeMap`s so iteration, and therefore every
//! file written from them, is sorted by key.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{HarnessError, Result};
use crate::kv::KeyValues;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = HarnessError;

    /// Case-insensitive; anything but the five verbs is unsupported.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(HarnessError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which methods transmit the parsed payload.
///
/// GET never does. DELETE is off by default and can be switched on with
/// `including_delete`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyPolicy {
    send_on_delete: bool,
}

impl BodyPolicy {
    pub fn including_delete() -> Self {
        Self {
            send_on_delete: true,
        }
    }

    pub fn sends_body(self, method: HttpMethod) -> bool {
        match method {
            HttpMethod::Get => false,
            HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => true,
            HttpMethod::Delete => self.send_on_delete,
        }
    }
}

/// One HTTP call, as read from the request files.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: KeyValues,
    pub cookies: KeyValues,
    /// `{}` when no body file was given.
    pub payload: Value,
}

/// The response body, kept as the raw text the server sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Json(String),
    Text(String),
}

impl ResponseBody {
    pub fn as_str(&self) -> &str {
        match self {
            ResponseBody::Json(text) | ResponseBody::Text(text) => text,
        }
    }
}

/// One HTTP response, as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: KeyValues,
    pub cookies: KeyValues,
    pub body: ResponseBody,
    /// Empty when the server sent no `content-type`.
    pub content_type: String,
}

impl HttpResponse {
    /// True when the content type mentioned `json`.
    pub fn is_json(&self) -> bool {
        matches!(self.body, ResponseBody::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    }

    #[test]
    fn unknown_method_is_unsupported() {
        let err = "head".parse::<HttpMethod>().unwrap_err();
        assert!(matches!(err, HarnessError::UnsupportedMethod(m) if m == "HEAD"));
    }

    #[test]
    fn default_policy_skips_get_and_delete() {
        let policy = BodyPolicy::default();
        assert!(!policy.sends_body(HttpMethod::Get));
        assert!(policy.sends_body(HttpMethod::Post));
        assert!(policy.sends_body(HttpMethod::Put));
        assert!(policy.sends_body(HttpMethod::Patch));
        assert!(!policy.sends_body(HttpMethod::Delete));
    }

    #[test]
    fn delete_policy_never_sends_on_get() {
        let policy = BodyPolicy::including_delete();
        assert!(policy.sends_body(HttpMethod::Delete));
        assert!(!policy.sends_body(HttpMethod::Get));
    }

    #[test]
    fn json_body_is_flagged() {
        let response = HttpResponse {
            status_code: 200,
            headers: KeyValues::new(),
            cookies: KeyValues::new(),
            body: ResponseBody::Json(r#"{"ok":true}"#.to_string()),
            content_type: "application/json".to_string(),
        };
        assert!(response.is_json());
        assert_eq!(response.body.as_str(), r#"{"ok":true}"#);
    }
}
