use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_PROVIDER: &str = "openai";
pub const API_URL_ENV: &str = "THREADLINE_API_URL";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the chat backend
    pub api_url: Option<String>,
    /// Model provider sent with every chat request (e.g., "openai")
    pub provider: Option<String>,
    /// Enable markdown rendering in the chat area
    pub markdown: Option<bool>,
    /// Store the session in the system keyring instead of a file
    pub use_keyring: Option<bool>,
    /// Write tracing output to this file
    pub log_file: Option<String>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn markdown(&self) -> bool {
        self.markdown.unwrap_or(true)
    }

    pub fn use_keyring(&self) -> bool {
        self.use_keyring.unwrap_or(true)
    }

    pub fn provider(&self) -> &str {
        self.provider
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_PROVIDER)
    }

    /// Backend URL with flag > environment > config file > built-in default.
    pub fn resolve_api_url(&self, flag: Option<&str>) -> String {
        let env_value = std::env::var(API_URL_ENV).ok();
        self.resolve_api_url_with_env(flag, env_value.as_deref())
    }

    pub(crate) fn resolve_api_url_with_env(
        &self,
        flag: Option<&str>,
        env: Option<&str>,
    ) -> String {
        [flag, env, self.api_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string()
    }

    /// Provider from the command line when given, else the configured one.
    pub fn resolve_provider(&self, flag: Option<&str>) -> String {
        flag.map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.provider())
            .to_string()
    }
}
