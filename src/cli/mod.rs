//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod auth;
pub mod say;
pub mod settings;
pub mod threads;

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::api::BackendClient;
use crate::cli::auth::{run_login, run_logout, run_signup};
use crate::cli::say::run_say;
use crate::cli::settings::SettingRegistry;
use crate::cli::threads::list_threads;
use crate::core::config::Config;
use crate::core::session::{open_credential_store, CredentialStore, SessionStore};
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "threadline")]
#[command(about = "A terminal client for a thread-based streaming chat backend")]
#[command(
    long_about = "Threadline is a full-screen terminal chat client. Conversations are kept as \
threads on the backend; replies stream in as they are generated.\n\n\
Getting started:\n\
  threadline signup   Create an account\n\
  threadline login    Sign in and remember the session\n\
  threadline          Open the chat screen\n\n\
Environment Variables:\n\
  THREADLINE_API_URL  Backend base URL (defaults to http://localhost:8000)\n\
  THREADLINE_LOG      Log filter when logging to a file (defaults to info)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Shift+Enter       Insert a newline\n\
  Ctrl+O            Options menu (attach file, web search, thinking)\n\
  Ctrl+N            Start a new chat\n\
  Ctrl+B            Show or hide the thread list\n\
  Tab               Move focus between thread list and input\n\
  Esc               Close menu, leave search mode, or stop a reply\n\
  Ctrl+L            Log out\n\
  Ctrl+C            Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Model provider sent with chat requests
    #[arg(short = 'p', long, global = true, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Write diagnostic logs to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Create an account
    Signup,
    /// Sign in and store the session
    Login,
    /// Forget the stored session
    Logout,
    /// List your conversation threads
    Threads,
    /// Send one message and stream the reply to stdout
    Say {
        /// Continue an existing thread instead of creating a new one
        #[arg(short = 't', long, value_name = "THREAD_ID")]
        thread: Option<String>,
        /// Message to send
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Set configuration values, or show them when no value is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Chat);

    // Settings commands must work even when the config file is broken.
    match &command {
        Commands::Set { key, value } => {
            if let Err(err) = SettingRegistry::new().run_set(key.as_deref(), value) {
                err.print();
                std::process::exit(1);
            }
            return Ok(());
        }
        Commands::Unset { key } => {
            if let Err(err) = SettingRegistry::new().run_unset(key) {
                err.print();
                std::process::exit(1);
            }
            return Ok(());
        }
        _ => {}
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };

    let log_file = args.log.as_deref().or(config.log_file.as_deref());
    if let Err(err) = init_tracing(log_file) {
        eprintln!("⚠️  Logging disabled: {err}");
    }

    let client = BackendClient::new(&config.resolve_api_url(args.api_url.as_deref()));
    let provider = config.resolve_provider(args.provider.as_deref());

    let result = match command {
        Commands::Signup => run_signup(&client).await,
        Commands::Login => {
            let mut sessions = restore_session(&config)?;
            run_login(&client, &mut sessions).await
        }
        Commands::Logout => {
            let mut sessions = restore_session(&config)?;
            run_logout(&mut sessions)
        }
        Commands::Threads => {
            let sessions = restore_session(&config)?;
            let token = require_token(&sessions);
            list_threads(&client, &token).await
        }
        Commands::Say { thread, prompt } => {
            let sessions = restore_session(&config)?;
            let token = require_token(&sessions);
            run_say(&client, &token, &provider, thread, prompt).await
        }
        Commands::Chat => {
            let sessions = restore_session(&config)?;
            let token = require_token(&sessions);
            run_chat(&config, client, token, provider, sessions).await
        }
        Commands::Set { .. } | Commands::Unset { .. } => Ok(()),
    };

    if let Err(err) = result {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
    Ok(())
}

fn restore_session(
    config: &Config,
) -> Result<SessionStore<Box<dyn CredentialStore>>, Box<dyn Error>> {
    SessionStore::restore(open_credential_store(config)).map_err(|err| -> Box<dyn Error> {
        warn!(error = %err, "could not read the stored session");
        format!("Could not read the stored session: {err}").into()
    })
}

/// Protected commands stop here when nobody is logged in.
fn require_token<S: CredentialStore>(sessions: &SessionStore<S>) -> String {
    match sessions.token() {
        Some(token) => token.to_string(),
        None => {
            eprintln!("❌ You are not logged in.");
            eprintln!("   Run 'threadline login' first (or 'threadline signup' to create an account).");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests;
