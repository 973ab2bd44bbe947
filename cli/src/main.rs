mod args;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::Cli;
use http_text_core::{
    do_request_response_with, get_base_url, start_server, stop_server, BodyPolicy,
    HarnessConfig, HttpClient, ServerCommand,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = HarnessConfig::from_env();

    let port = cli
        .port
        .unwrap_or_else(|| config.unique_port(cli.identity.as_deref(), cli.minimum_port));
    let base_url = get_base_url(&cli.host, port);
    let policy = if cli.send_body_on_delete {
        BodyPolicy::including_delete()
    } else {
        BodyPolicy::default()
    };
    let client = HttpClient::new(policy);

    // Dropping the handle on an early return stops the server too.
    let server = match server_command(&cli) {
        Some(command) => {
            info!(%base_url, home = %config.home.display(), "starting application");
            Some(start_server(&command, port).context("could not start server")?)
        }
        None => None,
    };

    let response = do_request_response_with(&client, &base_url, &cli.root_directory)
        .with_context(|| format!("request against {base_url} failed"))?;
    info!(status = response.status_code, "response written");

    if let Some(server) = server {
        stop_server(server);
    }
    Ok(())
}

fn server_command(cli: &Cli) -> Option<ServerCommand> {
    let (program, args) = cli.command.split_first()?;
    let mut command = ServerCommand::new(program.as_str())
        .args(args.iter().cloned())
        .retry_count(cli.retry_count);
    for (key, value) in &cli.env {
        command = command.env(key.as_str(), value.as_str());
    }
    if let Some(message) = &cli.ready_message {
        command = command.ready_message(message.as_str());
    }
    Some(command)
}
