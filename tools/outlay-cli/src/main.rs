//! outlay - session tool for the budgeting API
//!
//! Drives the authenticated request pipeline from a terminal: manage the
//! session and issue raw API calls against the remote. Domain screens live
//! elsewhere; this binary only produces credentials and passes requests
//! through the pipeline.
//!
//! Usage:
//!   outlay [--config PATH] login <username>
//!   outlay [--config PATH] register <username> <email>
//!   outlay [--config PATH] status
//!   outlay [--config PATH] logout
//!   outlay [--config PATH] get <path>
//!   outlay [--config PATH] request <METHOD> <path> [json-body]
//!
//! The login password is read from the first line of stdin so it never
//! lands in shell history or process listings.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use outlay_auth::CredentialStore;
use outlay_client::{ApiResponse, Client, Config, Method, RequestDescriptor, SessionState};

/// Parsed invocation: optional --config plus one subcommand.
#[derive(Debug, PartialEq)]
enum Command {
    Login { username: String },
    Register { username: String, email: String },
    Status,
    Logout,
    Get { path: String },
    Request {
        method: String,
        path: String,
        body: Option<String>,
    },
}

fn parse_args(args: &[String]) -> Result<(Option<String>, Command)> {
    let mut config_path = None;
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let value = iter.next().context("--config requires a path")?;
            config_path = Some(value.clone());
        } else {
            rest.push(arg.clone());
        }
    }

    let command = match rest.first().map(String::as_str) {
        Some("login") => Command::Login {
            username: rest.get(1).context("usage: login <username>")?.clone(),
        },
        Some("register") => Command::Register {
            username: rest.get(1).context("usage: register <username> <email>")?.clone(),
            email: rest.get(2).context("usage: register <username> <email>")?.clone(),
        },
        Some("status") => Command::Status,
        Some("logout") => Command::Logout,
        Some("get") => Command::Get {
            path: rest.get(1).context("usage: get <path>")?.clone(),
        },
        Some("request") => Command::Request {
            method: rest
                .get(1)
                .context("usage: request <METHOD> <path> [json-body]")?
                .clone(),
            path: rest
                .get(2)
                .context("usage: request <METHOD> <path> [json-body]")?
                .clone(),
            body: rest.get(3).cloned(),
        },
        Some(other) => bail!("unknown command: {other}"),
        None => bail!(
            "usage: outlay [--config PATH] <login|register|status|logout|get|request> ..."
        ),
    };

    Ok((config_path, command))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (cli_config, command) = parse_args(&args)?;

    let config_path = Config::resolve_path(cli_config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    info!(api_base_url = %config.api_base_url, "configuration loaded");

    let store = Arc::new(
        CredentialStore::load(config.credentials_file.clone())
            .await
            .context("opening credential store")?,
    );
    let http = Client::http_client(&config)?;
    let client = Client::new(&config, http, store);

    run(client, command).await
}

async fn run(client: Client, command: Command) -> Result<()> {
    match command {
        Command::Login { username } => {
            let password = read_password()?;
            client.login(&username, &password).await?;
            println!("signed in as {username}");
        }
        Command::Register { username, email } => {
            let password = read_password()?;
            client.register(&username, &email, &password).await?;
            println!("account {username} created, sign in with: outlay login {username}");
        }
        Command::Status => match client.session_state().await {
            SessionState::Authenticated => println!("authenticated"),
            SessionState::Anonymous => println!("anonymous"),
        },
        Command::Logout => {
            client.logout().await?;
            println!("signed out");
        }
        Command::Get { path } => {
            let response = client.send(RequestDescriptor::new(Method::GET, path)).await?;
            print_response(response)?;
        }
        Command::Request { method, path, body } => {
            let method: Method = method
                .to_uppercase()
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid HTTP method: {method}"))?;
            let mut descriptor = RequestDescriptor::new(method, path);
            if let Some(raw) = body {
                let json: serde_json::Value =
                    serde_json::from_str(&raw).context("request body must be valid JSON")?;
                descriptor = descriptor.with_json(json);
            }
            let response = client.send(descriptor).await?;
            print_response(response)?;
        }
    }
    Ok(())
}

/// Read the password from the first line of stdin.
///
/// Interactive users get a prompt on stderr; piped input just reads the
/// line. Either way the password stays out of argv.
fn read_password() -> Result<String> {
    eprint!("password: ");
    let _ = std::io::stderr().flush();

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("empty password");
    }
    Ok(password)
}

fn print_response(response: ApiResponse) -> Result<()> {
    info!(status = response.status.as_u16(), "request completed");

    let text = response.text();
    if text.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{text}"),
    }
    Ok(())
}
