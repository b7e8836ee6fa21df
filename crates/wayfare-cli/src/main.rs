//! Wayfare CLI - drive the client session store from a terminal.
//!
//! Opens, inspects, refreshes and closes the local session the web client
//! uses, and answers route-guard questions against it.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wayfare_core::utils::{format_remaining, mask_email};
use wayfare_core::{
    AuthError, Authenticator, Config, GuardDecision, LoginForm, RouteGuard, SessionStore,
    SignupForm, StorageBackend, SystemClock,
};

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "wayfare.log";

#[derive(Parser)]
#[command(name = "wayfare")]
#[command(about = "Manage the wayfare client session")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage backend for the session (file or keyring)
    #[arg(long)]
    storage: Option<StorageBackend>,

    /// Data directory for file-backed storage and logs
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Also write logs to a daily file under the data directory
    #[arg(long)]
    log_file: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and open a session
    Login {
        /// Email address (defaults to the last one used)
        #[arg(short, long)]
        email: Option<String>,

        /// Keep the session for 30 days instead of 24 hours
        #[arg(long)]
        remember: bool,
    },

    /// Create an account and open a session
    Signup {
        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Email address
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Close the current session
    Logout,

    /// Show the current session
    Status {
        /// Print the session record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extend the current session
    Refresh {
        /// Hours to extend by (defaults to the configured refresh window)
        #[arg(long)]
        hours: Option<i64>,
    },

    /// Ask the route guard what happens when navigating to a path
    Guard {
        /// Path to check, e.g. /trips
        path: String,

        /// Only look at the auth-token cookie, not the session record
        #[arg(long)]
        cookie_only: bool,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing(verbose: bool, log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.apply_process_env()?;
    if let Some(storage) = cli.storage {
        config.storage = storage;
    }
    if let Some(ref dir) = cli.data_dir {
        config.data_dir = Some(dir.clone());
    }

    let log_dir = if cli.log_file {
        Some(config.data_dir()?.join("logs"))
    } else {
        None
    };
    let _log_guard = init_tracing(cli.verbose, log_dir);
    info!(storage = %config.storage, "Wayfare CLI starting");

    let storage = config
        .open_storage()
        .context("Failed to open session storage")?;
    let store = SessionStore::create(storage, Arc::new(SystemClock), config.session.clone());

    let result = run(cli.command, &store, &mut config);
    store.dispose();
    result
}

fn run(command: Commands, store: &SessionStore, config: &mut Config) -> Result<()> {
    match command {
        Commands::Login { email, remember } => {
            let email = match email.or_else(|| config.last_email.clone()) {
                Some(email) => email,
                None => prompt("Email: ")?,
            };
            let password = rpassword::prompt_password("Password: ")?;
            let form = LoginForm {
                email,
                password,
                remember_me: remember,
            };
            Authenticator::new(store)
                .login(&form)
                .map_err(report_auth_error)?;
            remember_email(config, &form.email);
            println!("Login successful!");
            print_status(store);
        }
        Commands::Signup { name, email } => {
            let name = match name {
                Some(name) => name,
                None => prompt("Name: ")?,
            };
            let email = match email {
                Some(email) => email,
                None => prompt("Email: ")?,
            };
            let password = rpassword::prompt_password("Password: ")?;
            let confirm_password = rpassword::prompt_password("Confirm password: ")?;
            let form = SignupForm {
                name,
                email,
                password,
                confirm_password,
            };
            Authenticator::new(store)
                .signup(&form)
                .map_err(report_auth_error)?;
            remember_email(config, &form.email);
            println!("Account created. You're signed in.");
            print_status(store);
        }
        Commands::Logout => {
            Authenticator::new(store).logout();
            println!("Signed out.");
        }
        Commands::Status { json } => {
            if json {
                let record = store.get();
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                print_status(store);
            }
        }
        Commands::Refresh { hours } => {
            let refreshed = match hours {
                Some(hours) => store.refresh(hours),
                None => store.refresh_default(),
            }
            .context("Failed to refresh session")?;
            if refreshed {
                println!("Session refreshed.");
                print_status(store);
            } else {
                println!("No active session to refresh. Run `wayfare login` first.");
            }
        }
        Commands::Guard { path, cookie_only } => {
            let guard = RouteGuard::new().with_cookie_name(&store.config().cookie_name);
            let decision = if cookie_only {
                guard.check_cookie(store.cookies(), &path)
            } else {
                guard.check_session(store, &path)
            };
            match decision {
                GuardDecision::Allow => println!("allow {}", path),
                GuardDecision::RedirectToLogin { location }
                | GuardDecision::RedirectHome { location } => println!("redirect {}", location),
            }
        }
    }
    Ok(())
}

fn print_status(store: &SessionStore) {
    let Some(record) = store.get() else {
        println!("Not signed in.");
        return;
    };

    println!("Signed in as {}", record.email);
    match store.minutes_remaining() {
        Some(minutes) => {
            println!("Expires in {}", format_remaining(minutes));
            if store.expiring_soon_default() {
                println!("Session expires soon. Run `wayfare refresh` to extend it.");
            }
        }
        None => println!("Session does not expire."),
    }
    if let Some(cookie) = store.auth_cookie() {
        println!("Cookie: {}", cookie.to_header());
    }
}

fn remember_email(config: &mut Config, email: &str) {
    config.last_email = Some(email.trim().to_string());
    if let Err(e) = Config::save_last_email(email) {
        warn!(email = %mask_email(email), error = %e, "Failed to save config");
    }
}

fn report_auth_error(e: AuthError) -> anyhow::Error {
    let mut message = e.user_message();
    if e.is_retryable() {
        message.push_str(" (retry once storage is available)");
    }
    anyhow::anyhow!(message)
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
