//! Writes an `HttpResponse` back out as flat files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{HarnessError, Result};
use crate::http::HttpResponse;
use crate::kv::write_key_value_file;

pub const RESPONSE_STATUS_FILE: &str = "response_status_code.txt";
pub const RESPONSE_HEADERS_FILE: &str = "response_headers.txt";
pub const RESPONSE_COOKIES_FILE: &str = "response_cookies.txt";
pub const RESPONSE_JSON_BODY_FILE: &str = "response_body.json";
pub const RESPONSE_TEXT_BODY_FILE: &str = "response_body.txt";

/// Write status, body, headers and cookies under `root_directory`.
///
/// The status and exactly one body file are always written. The headers and
/// cookies files only appear when there is something to put in them.
pub fn write_response_files(response: &HttpResponse, root_directory: &Path) -> Result<()> {
    write_file(
        &root_directory.join(RESPONSE_STATUS_FILE),
        &response.status_code.to_string(),
    )?;

    let body_file = if response.is_json() {
        RESPONSE_JSON_BODY_FILE
    } else {
        RESPONSE_TEXT_BODY_FILE
    };
    write_file(&root_directory.join(body_file), response.body.as_str())?;

    write_key_value_file(&response.headers, &root_directory.join(RESPONSE_HEADERS_FILE))?;
    write_key_value_file(&response.cookies, &root_directory.join(RESPONSE_COOKIES_FILE))?;
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| HarnessError::io(path, e))?;
    debug!(path = %path.display(), bytes = contents.len(), "wrote response file");
    Ok(())
}
