use std::path::PathBuf;

use clap::Parser;

/// Perform one HTTP request/response described by files in a directory,
/// optionally starting and stopping the server under test around it.
#[derive(Parser, Debug)]
#[command(name = "http-text-cli", version, about)]
pub struct Cli {
    /// Host the server listens on.
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Use this port instead of deriving one.
    #[arg(long, conflicts_with = "identity")]
    pub port: Option<u16>,

    /// Test identity to derive the port from. Defaults to $TEXTTEST_SANDBOX.
    #[arg(long)]
    pub identity: Option<String>,

    /// Lowest port the derivation may return.
    #[arg(long, default_value_t = http_text_core::DEFAULT_MINIMUM_PORT)]
    pub minimum_port: u16,

    /// Directory holding the request files; response files are written here.
    #[arg(long, default_value = ".")]
    pub root_directory: PathBuf,

    /// Text the server prints on stdout once it accepts connections.
    #[arg(long)]
    pub ready_message: Option<String>,

    /// How many stdout lines to read while waiting for the ready message.
    #[arg(long, default_value_t = http_text_core::process::DEFAULT_RETRY_COUNT)]
    pub retry_count: usize,

    /// Extra environment for the server, as KEY=VALUE. Repeatable.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Also send the request body on DELETE.
    #[arg(long)]
    pub send_body_on_delete: bool,

    /// Server command to start before the request and stop after it.
    #[arg(last = true)]
    pub command: Vec<String>,
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))
}
