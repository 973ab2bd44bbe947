//! One-shot HTTP request/response harness for text-based acceptance tests.
//!
//! # Overview
//! A test picks a port, starts the server under test, performs exactly one
//! HTTP request described by flat files in a working directory, writes the
//! response back out as flat files, and stops the server:
//!
//! ```text
//! find_unique_port -> start_server -> do_request_response -> stop_server
//! ```
//!
//! # Design
//! - Everything is synchronous; the only concurrent thing is the server.
//! - `ServerProcess` stops the server on drop, so cleanup happens on every
//!   path out of the test.
//! - Environment lookups (`TEXTTEST_SANDBOX`, `TEXTTEST_HOME`) live in
//!   `HarnessConfig`; the functions here take plain values.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod kv;
pub mod ports;
pub mod process;
pub mod request;
pub mod response;

use std::path::Path;

pub use client::HttpClient;
pub use config::HarnessConfig;
pub use error::{HarnessError, Result};
pub use http::{BodyPolicy, HttpMethod, HttpRequest, HttpResponse, ResponseBody};
pub use kv::KeyValues;
pub use ports::{find_available_ports, find_unique_port, DEFAULT_MINIMUM_PORT};
pub use process::{start_server, stop_server, ServerCommand, ServerProcess};
pub use request::read_http_parameters;
pub use response::write_response_files;

pub fn get_base_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}")
}

/// Perform one request/response using the files in `root_directory`.
pub fn do_request_response(base_url: &str, root_directory: &Path) -> Result<HttpResponse> {
    do_request_response_with(&HttpClient::default(), base_url, root_directory)
}

/// Like `do_request_response`, with an explicit client.
pub fn do_request_response_with(
    client: &HttpClient,
    base_url: &str,
    root_directory: &Path,
) -> Result<HttpResponse> {
    let request = read_http_parameters(base_url, root_directory)?;
    let response = client.execute(&request)?;
    write_response_files(&response, root_directory)?;
    Ok(response)
}
