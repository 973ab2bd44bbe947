//! Builds the `HttpRequest` from the request files in a working directory.
//!
//! | file                  | required | default |
//! |-----------------------|----------|---------|
//! | `request_url.txt`     | yes      |         |
//! | `request_headers.txt` | no       | empty   |
//! | `request_cookies.txt` | no       | empty   |
//! | `request_body.json`   | no       | `{}`    |

use std::fs;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;
use ureq::http::{HeaderName, HeaderValue};

use crate::error::{HarnessError, Result};
use crate::http::{HttpMethod, HttpRequest};
use crate::kv::{read_key_value_file, KeyValues};

pub const REQUEST_URL_FILE: &str = "request_url.txt";
pub const REQUEST_HEADERS_FILE: &str = "request_headers.txt";
pub const REQUEST_COOKIES_FILE: &str = "request_cookies.txt";
pub const REQUEST_BODY_FILE: &str = "request_body.json";

/// Read the request files under `root_directory`. The final URL is
/// `base_url` followed by the path from `request_url.txt`.
pub fn read_http_parameters(base_url: &str, root_directory: &Path) -> Result<HttpRequest> {
    let (method, path) = read_request_line(&root_directory.join(REQUEST_URL_FILE))?;

    let headers_path = root_directory.join(REQUEST_HEADERS_FILE);
    let headers = read_key_value_file(&headers_path)?;
    check_headers(&headers, &headers_path)?;

    let cookies_path = root_directory.join(REQUEST_COOKIES_FILE);
    let cookies = read_key_value_file(&cookies_path)?;
    check_cookies(&cookies, &cookies_path)?;

    Ok(HttpRequest {
        url: format!("{base_url}{path}"),
        method,
        headers,
        cookies,
        payload: read_payload_file(&root_directory.join(REQUEST_BODY_FILE))?,
    })
}

/// Every entry must be a legal header name and value.
fn check_headers(headers: &KeyValues, path: &Path) -> Result<()> {
    for (name, value) in headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(invalid_entry(path, "header name", name));
        }
        if HeaderValue::from_str(value).is_err() {
            return Err(invalid_entry(path, "header value", value));
        }
    }
    Ok(())
}

/// Cookies end up as `name=value` pairs in one `Cookie` header.
fn check_cookies(cookies: &KeyValues, path: &Path) -> Result<()> {
    for (name, value) in cookies {
        if name.contains(['=', ';']) || value.contains(';') {
            return Err(invalid_entry(path, "cookie", name));
        }
        if HeaderValue::from_str(&format!("{name}={value}")).is_err() {
            return Err(invalid_entry(path, "cookie", name));
        }
    }
    Ok(())
}

fn invalid_entry(path: &Path, what: &str, text: &str) -> HarnessError {
    HarnessError::Configuration(format!("{}: invalid {what} {text:?}", path.display()))
}

/// `<METHOD> <path>`, whitespace separated.
fn read_request_line(path: &Path) -> Result<(HttpMethod, String)> {
    let text = fs::read_to_string(path).map_err(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            HarnessError::Configuration(format!("file does not exist: {}", path.display()))
        } else {
            HarnessError::io(path, err)
        }
    })?;

    let mut tokens = text.split_whitespace();
    let (Some(method), Some(url_path), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(HarnessError::Configuration(format!(
            "{}: expected `<METHOD> <path>`, got {:?}",
            path.display(),
            text.trim()
        )));
    };

    let method: HttpMethod = method.parse()?;
    info!("found http method {method} for url {url_path}");
    Ok((method, url_path.to_string()))
}

fn read_payload_file(path: &Path) -> Result<Value> {
    match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).map_err(|source| HarnessError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Value::Object(Map::new())),
        Err(err) => Err(HarnessError::io(path, err)),
    }
}
