//! Failures reported by `threadline set` and `threadline unset`.

use std::fmt;

/// Why a settings change was refused or could not be stored.
#[derive(Debug)]
pub enum SettingError {
    /// No handler is registered under `key`. `known` holds the registered
    /// keys in display order.
    UnknownKey {
        key: String,
        known: Vec<&'static str>,
    },
    /// The value given for an on/off key is not one of the accepted spellings.
    InvalidBoolean(String),
    /// The backend URL is not an absolute http(s) URL.
    InvalidUrl { input: String, reason: String },
    /// The key was given without a value.
    MissingArgs {
        hint: &'static str,
        example: &'static str,
    },
    /// `config.toml` exists but could not be read or parsed.
    ConfigLoad(String),
    /// The updated `config.toml` could not be written.
    ConfigSave(String),
}

impl SettingError {
    /// Write the error and a follow-up hint to stderr.
    pub fn print(&self) {
        match self {
            SettingError::UnknownKey { key, known } => {
                eprintln!("❌ Unknown config key: {key}");
                if !known.is_empty() {
                    eprintln!("   Available keys: {}", known.join(", "));
                }
            }
            SettingError::InvalidBoolean(input) => {
                eprintln!("❌ Invalid boolean value: {input}");
                eprintln!("   Use 'on' or 'off' (also accepts true/false, yes/no, 1/0)");
            }
            SettingError::InvalidUrl { input, reason } => {
                eprintln!("❌ Invalid backend URL '{input}': {reason}");
                eprintln!("   Example: http://localhost:8000");
            }
            SettingError::MissingArgs { hint, example } => {
                eprintln!("⚠️  {hint}");
                eprintln!("Example: {example}");
            }
            SettingError::ConfigLoad(msg) => {
                eprintln!("❌ Failed to read configuration: {msg}");
            }
            SettingError::ConfigSave(msg) => {
                eprintln!("❌ Failed to save configuration: {msg}");
            }
        }
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey { key, .. } => write!(f, "unknown config key '{key}'"),
            SettingError::InvalidBoolean(input) => write!(f, "invalid boolean value '{input}'"),
            SettingError::InvalidUrl { input, reason } => {
                write!(f, "invalid backend URL '{input}': {reason}")
            }
            SettingError::MissingArgs { hint, .. } => f.write_str(hint),
            SettingError::ConfigLoad(msg) => write!(f, "failed to read config: {msg}"),
            SettingError::ConfigSave(msg) => write!(f, "failed to save config: {msg}"),
        }
    }
}

impl std::error::Error for SettingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_input() {
        let err = SettingError::UnknownKey {
            key: "theme".into(),
            known: vec!["api-url", "markdown"],
        };
        assert_eq!(err.to_string(), "unknown config key 'theme'");

        let err = SettingError::InvalidUrl {
            input: "localhost".into(),
            reason: "relative URL without a base".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid backend URL 'localhost': relative URL without a base"
        );
    }

    #[test]
    fn load_and_save_failures_read_differently() {
        let load = SettingError::ConfigLoad("bad toml".into()).to_string();
        let save = SettingError::ConfigSave("read-only".into()).to_string();
        assert!(load.starts_with("failed to read config"));
        assert!(save.starts_with("failed to save config"));
    }
}
