//! `key: value` flat files used for headers and cookies.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::{HarnessError, Result};

pub type KeyValues = BTreeMap<String, String>;

/// Parse `key: value` lines. Blank lines are skipped; everything after the
/// first colon is the value.
pub fn parse_key_values(text: &str, path: &Path) -> Result<KeyValues> {
    let mut map = KeyValues::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line.split_once(':').ok_or_else(|| {
            HarnessError::Configuration(format!(
                "{}:{}: expected `key: value`, got {line:?}",
                path.display(),
                index + 1
            ))
        })?;
        map.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(map)
}

/// Read a key-value file; an absent file is an empty map.
pub fn read_key_value_file(path: &Path) -> Result<KeyValues> {
    match fs::read_to_string(path) {
        Ok(text) => parse_key_values(&text, path),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(KeyValues::new()),
        Err(err) => Err(HarnessError::io(path, err)),
    }
}

pub fn format_key_values(map: &KeyValues) -> String {
    let mut out = String::new();
    for (key, value) in map {
        let _ = writeln!(out, "{key}: {value}");
    }
    out
}

/// Write `map` sorted by key. An empty map writes no file at all.
pub fn write_key_value_file(map: &KeyValues, path: &Path) -> Result<()> {
    if map.is_empty() {
        return Ok(());
    }
    fs::write(path, format_key_values(map)).map_err(|e| HarnessError::io(path, e))?;
    debug!(path = %path.display(), entries = map.len(), "wrote key-value file");
    Ok(())
}
