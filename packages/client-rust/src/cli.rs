//! Command-line surface of the `settle` binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use settle_core::AsyncState;

use crate::api::{ApiClient, ApiError, Backend};
use crate::board::{RequestAction, RequestBoard};
use crate::config::{ClientConfig, DEFAULT_API_URL};
use crate::flow::CommunicationFlow;
use crate::models::{CommunicationRequest, Decision};
use crate::session::AuthSession;
use crate::storage::{FileStorage, MemoryStorage, SessionStorage};

/// Settle - visitor requests and resident dashboard.
#[derive(Debug, Parser)]
#[command(name = "settle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API base URL.
    #[arg(long, env = "SETTLE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// File the session token and house are kept in.
    #[arg(long, env = "SETTLE_SESSION_FILE", default_value = "settle-session.json")]
    pub session_file: PathBuf,

    /// Polling period of `requests --watch` in milliseconds. Zero disables polling.
    #[arg(long, env = "SETTLE_POLL_MS", default_value_t = 5_000)]
    pub poll_ms: u64,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            poll_interval: Duration::from_millis(self.poll_ms),
            session_path: Some(self.session_file.clone()),
            ..ClientConfig::default()
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in as a resident.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SETTLE_PASSWORD")]
        password: String,
    },
    /// Sign out, forgetting the stored token.
    Logout,
    /// Resolve a provider from its access code.
    Provider { code: String },
    /// List the houses a provider serves.
    Houses { provider_id: String },
    /// Show the communication requests of the signed-in resident's house.
    Requests {
        /// House to show instead of the stored one.
        #[arg(long)]
        house: Option<String>,
        /// Keep polling until interrupted.
        #[arg(long)]
        watch: bool,
    },
    /// Accept or reject a pending request.
    Validate { id: String, verdict: Verdict },
    /// Create a communication request as a visitor.
    Create {
        /// Provider access code.
        #[arg(long)]
        code: String,
        #[arg(long)]
        house: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        contact: String,
        #[arg(long)]
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Verdict {
    Accept,
    Reject,
}

impl From<Verdict> for Decision {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accept => Self::Accepted,
            Verdict::Reject => Self::Rejected,
        }
    }
}

/// Runs one subcommand to completion.
///
/// # Errors
///
/// Returns an error if the session cannot be loaded or a backend call fails.
pub async fn execute(command: Commands, config: &ClientConfig) -> Result<()> {
    let storage: Arc<dyn SessionStorage> = match &config.session_path {
        Some(path) => Arc::new(
            FileStorage::open(path)
                .with_context(|| format!("failed to open session file {}", path.display()))?,
        ),
        None => Arc::new(MemoryStorage::new()),
    };
    let api: Arc<dyn Backend> = Arc::new(ApiClient::new(config, Arc::clone(&storage))?);
    let mut session = AuthSession::restore(storage);

    match command {
        Commands::Login { email, password } => {
            let user = session.login(api.as_ref(), &email, &password).await?;
            println!("Signed in as {} <{}>", user.name, user.email);
            if let Some(house) = session.house() {
                println!("House: {house}");
            }
        }
        Commands::Logout => {
            session.logout()?;
            println!("Signed out");
        }
        Commands::Provider { code } => {
            let provider = api.validate_provider(&code).await?;
            println!("{} ({})", provider.name, provider.id);
        }
        Commands::Houses { provider_id } => {
            for house in api.houses_for_provider(&provider_id).await? {
                println!("{}  {}", house.id, house.name);
            }
        }
        Commands::Requests { house, watch } => {
            ensure_signed_in(&session)?;
            let Some(house) = house.or_else(|| session.house().map(str::to_string)) else {
                bail!("no house selected; sign in or pass --house");
            };
            show_requests(api, &house, config.poll_interval, watch).await?;
        }
        Commands::Validate { id, verdict } => {
            ensure_signed_in(&session)?;
            api.validate_communication_request(&id, verdict.into())
                .await?;
            println!("Request {id} updated");
        }
        Commands::Create {
            code,
            house,
            name,
            contact,
            message,
        } => {
            let mut flow = CommunicationFlow::new(api);
            let houses = flow.choose_provider(&code).await?;
            let Some(selected) = houses.into_iter().find(|h| h.id == house) else {
                bail!("house {house} is not served by provider {code}");
            };
            flow.select_house(selected);
            flow.create_request(&name, &contact, &message).await?;
            println!("Request sent");
        }
    }
    Ok(())
}

fn ensure_signed_in(session: &AuthSession) -> Result<(), ApiError> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(ApiError::MissingSession)
    }
}

async fn show_requests(
    api: Arc<dyn Backend>,
    house: &str,
    poll: Duration,
    watch: bool,
) -> Result<()> {
    let board = RequestBoard::new(api, house, if watch { poll } else { Duration::ZERO });
    if let Some(initial) = board.start() {
        // Failures are rendered from the state below.
        drop(initial.await);
    }
    print!("{}", render(&board.state()));
    if !watch {
        return Ok(());
    }

    let mut updates = board.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if !state.loading {
                    print!("{}", render(&state));
                }
            }
            _ = &mut shutdown => break,
        }
    }
    board.stop();
    Ok(())
}

/// Renders the request list with the action available for each entry.
#[must_use]
pub fn render(state: &AsyncState<Vec<CommunicationRequest>, ApiError>) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    if let Some(error) = &state.error {
        let _ = writeln!(out, "error: {error}");
    }
    match state.data.as_deref() {
        Some([]) => out.push_str("No requests\n"),
        Some(requests) => {
            for request in requests {
                let hint = match RequestAction::for_request(request) {
                    Some(RequestAction::Validate) => "  [validate]",
                    Some(RequestAction::EnterChat) => "  [chat]",
                    None => "",
                };
                let _ = writeln!(
                    out,
                    "{}  {:<20} {:?}{hint}",
                    request.id, request.visitor_name, request.status
                );
            }
        }
        None => {}
    }
    out
}
