//! quizgate - command line front end for the quiz session layer.
//!
//! Logs in against the quiz API, keeps the session between runs, issues
//! authorized requests and shows what the navigation guard would do for a
//! given page.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use quizgate_core::api::{ReqwestTransport, RequestError};
use quizgate_core::auth::AuthError;
use quizgate_core::{
    AuthService, Config, CredentialStore, EventBus, HttpClient, NavigationDecision, RouteTable,
    SessionEvent, SessionGuard,
};

/// Directory for a persistent log file, in addition to stderr
const ENV_LOG_DIR: &str = "QUIZGATE_LOG_DIR";

const LOG_FILE: &str = "quizgate.log";

const EXIT_OK: u8 = 0;
const EXIT_FAILURE: u8 = 1;
const EXIT_SESSION_EXPIRED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "quizgate", about = "Quiz API session and request CLI")]
struct Cli {
    /// API base address (overrides config and QUIZGATE_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(long, env = "QUIZGATE_USERNAME")]
        username: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored session
    Whoami,
    /// GET a resource, with optional key=value query parameters
    Get {
        path: String,
        params: Vec<String>,
    },
    /// POST a JSON body
    Post { path: String, body: String },
    /// PUT a JSON body
    Put { path: String, body: String },
    /// DELETE a resource
    Delete { path: String },
    /// Show the guard's decision for a page path
    Navigate { path: String },
    /// List the application routes and their requirements
    Routes,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::never(dir, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

struct AppContext {
    config: Config,
    store: CredentialStore,
    client: HttpClient,
    events: broadcast::Receiver<SessionEvent>,
}

impl AppContext {
    fn new(base_url: Option<String>) -> Result<Self> {
        let mut config = Config::load()?;
        if let Some(url) = base_url {
            config.base_url = url;
        }

        let store = CredentialStore::new(config.open_storage()?);
        let transport = Arc::new(ReqwestTransport::new().context("Failed to build HTTP client")?);
        let bus = EventBus::new();
        let events = bus.subscribe();
        let client = HttpClient::from_config(&config, transport, store.clone()).with_events(bus);

        Ok(Self {
            config,
            store,
            client,
            events,
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // Held until main returns so buffered file logs are flushed
    let _log_guard = init_tracing();
    let cli = Cli::parse();
    let code = run(cli).await?;
    Ok(ExitCode::from(code))
}

async fn run(cli: Cli) -> Result<u8> {
    let mut ctx = AppContext::new(cli.base_url)?;
    info!(base_url = %ctx.config.base_url, "quizgate starting");

    match cli.command {
        Command::Login { username } => login(ctx, username).await,
        Command::Logout => {
            AuthService::new(ctx.client).logout()?;
            println!("Logged out");
            Ok(EXIT_OK)
        }
        Command::Whoami => {
            match ctx.store.load() {
                Some(session) => {
                    let role = if session.is_privileged() { "admin" } else { "user" };
                    println!("{} (id {}, {})", session.user.display_name(), session.user.id, role);
                }
                None => println!("Not logged in"),
            }
            Ok(EXIT_OK)
        }
        Command::Get { path, params } => {
            let params = parse_params(&params)?;
            let result = ctx.client.get(&path, params.as_slice()).await;
            report(&mut ctx.events, result)
        }
        Command::Post { path, body } => {
            let body = parse_body(&body)?;
            let result = ctx.client.post(&path, &body).await;
            report(&mut ctx.events, result)
        }
        Command::Put { path, body } => {
            let body = parse_body(&body)?;
            let result = ctx.client.put(&path, &body).await;
            report(&mut ctx.events, result)
        }
        Command::Delete { path } => {
            let result = ctx.client.delete(&path).await;
            report(&mut ctx.events, result)
        }
        Command::Navigate { path } => {
            let guard = SessionGuard::new(ctx.store, RouteTable::default_routes());
            match guard.navigate(&path) {
                NavigationDecision::Allow => println!("allow {}", path),
                NavigationDecision::RedirectTo(dest) => {
                    let target = guard.routes().by_name(&dest).map(|r| r.path.as_str()).unwrap_or("/");
                    println!("redirect {} -> {} ({})", path, dest, target);
                }
            }
            Ok(EXIT_OK)
        }
        Command::Routes => {
            for route in RouteTable::default_routes().routes() {
                let access = match (route.requirement.requires_auth(), route.requirement.requires_privilege()) {
                    (true, true) => "admin",
                    (true, false) => "user",
                    _ => "public",
                };
                println!("{:<28} {:<18} {}", route.path, route.name, access);
            }
            Ok(EXIT_OK)
        }
    }
}

async fn login(mut ctx: AppContext, username: Option<String>) -> Result<u8> {
    let username = match username.or_else(|| ctx.config.last_username.clone()) {
        Some(name) => name,
        None => prompt("Username: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", username))
        .context("Failed to read password")?;

    let auth = AuthService::new(ctx.client.clone());
    match auth.login(&username, &password).await {
        Ok(session) => {
            println!("Logged in as {}", session.user.display_name());
            ctx.config.last_username = Some(username);
            ctx.config.save()?;
            Ok(EXIT_OK)
        }
        Err(AuthError::Rejected(message)) => {
            eprintln!("Login failed: {}", message);
            Ok(EXIT_FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

/// Print a request result and pick the process exit code for it.
fn report(
    events: &mut broadcast::Receiver<SessionEvent>,
    result: Result<Option<Value>, RequestError>,
) -> Result<u8> {
    match result {
        Ok(Some(body)) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(EXIT_OK)
        }
        Ok(None) => Ok(EXIT_OK),
        Err(RequestError::AuthExpired) => {
            // The client has already cleared the session
            if let Ok(event) = events.try_recv() {
                info!(event = event.name(), "Session invalidated");
            }
            eprintln!("Session expired, please log in again (quizgate login)");
            Ok(EXIT_SESSION_EXPIRED)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(EXIT_FAILURE)
        }
    }
}

fn parse_params(raw: &[String]) -> Result<Vec<(String, Option<String>)>> {
    raw.iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Expected key=value, got {}", pair))?;
            // `key=` sends nothing for that key
            let value = (!value.is_empty()).then(|| value.to_string());
            Ok((key.to_string(), value))
        })
        .collect()
}

fn parse_body(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).context("Request body must be valid JSON")
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let params = parse_params(&["page=2".to_string(), "q=".to_string()]).unwrap();
        assert_eq!(
            params,
            vec![("page".to_string(), Some("2".to_string())), ("q".to_string(), None)]
        );
        assert!(parse_params(&["bad".to_string()]).is_err());
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(r#"{"a": 1}"#).unwrap()["a"], 1);
        assert!(parse_body("{").is_err());
    }

    #[test]
    fn test_report_exit_codes() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        assert_eq!(report(&mut rx, Ok(None)).unwrap(), EXIT_OK);
        assert_eq!(report(&mut rx, Ok(Some(serde_json::json!({"id": 1})))).unwrap(), EXIT_OK);
        assert_eq!(report(&mut rx, Err(RequestError::Timeout)).unwrap(), EXIT_FAILURE);

        bus.publish(SessionEvent::AuthChanged);
        assert_eq!(report(&mut rx, Err(RequestError::AuthExpired)).unwrap(), EXIT_SESSION_EXPIRED);
        // The notification was consumed while reporting
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_cli_parses_get_with_params() {
        let cli = Cli::parse_from(["quizgate", "get", "/users/scores", "page=2"]);
        match cli.command {
            Command::Get { path, params } => {
                assert_eq!(path, "/users/scores");
                assert_eq!(params, vec!["page=2".to_string()]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
