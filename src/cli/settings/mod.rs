//! Settings management for the `set` and `unset` commands.
//!
//! Each configuration key has a [`SettingHandler`]; the [`SettingRegistry`]
//! looks them up by the dashed names users type (`api-url`, `use-keyring`).

pub mod error;
pub mod handlers;

use std::collections::HashMap;

pub use error::SettingError;

use crate::core::config::Config;
use handlers::{
    api_url_handler, log_file_handler, markdown_handler, provider_handler, use_keyring_handler,
};

pub trait SettingHandler: Send + Sync {
    fn key(&self) -> &'static str;

    /// Apply `args` to `config`, returning the message to show.
    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError>;

    fn unset(&self, config: &mut Config) -> String;
}

pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };
        registry.register(Box::new(api_url_handler()));
        registry.register(Box::new(provider_handler()));
        registry.register(Box::new(markdown_handler()));
        registry.register(Box::new(use_keyring_handler()));
        registry.register(Box::new(log_file_handler()));
        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        self.handlers.insert(handler.key(), handler);
    }

    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    fn unknown_key(&self, key: &str) -> SettingError {
        SettingError::UnknownKey {
            key: key.to_string(),
            known: self.keys_sorted(),
        }
    }

    pub fn keys_sorted(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.handlers.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Run `threadline set`. With no value, the current settings are printed.
    pub fn run_set(&self, key: Option<&str>, args: &[String]) -> Result<(), SettingError> {
        let mut config = load_config()?;
        let Some(key) = key else {
            config.print_all();
            return Ok(());
        };
        let handler = self
            .get(key)
            .ok_or_else(|| self.unknown_key(key))?;
        if args.is_empty() {
            config.print_all();
            return Ok(());
        }
        let message = handler.set(args, &mut config)?;
        save_config(&config)?;
        println!("{message}");
        Ok(())
    }

    pub fn run_unset(&self, key: &str) -> Result<(), SettingError> {
        let handler = self
            .get(key)
            .ok_or_else(|| self.unknown_key(key))?;
        let mut config = load_config()?;
        let message = handler.unset(&mut config);
        save_config(&config)?;
        println!("{message}");
        Ok(())
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn load_config() -> Result<Config, SettingError> {
    Config::load().map_err(|e| SettingError::ConfigLoad(e.to_string()))
}

fn save_config(config: &Config) -> Result<(), SettingError> {
    config
        .save()
        .map_err(|e| SettingError::ConfigSave(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::handlers::parse_bool;
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn registry_knows_every_key() {
        let registry = SettingRegistry::new();
        assert_eq!(
            registry.keys_sorted(),
            vec!["api-url", "log-file", "markdown", "provider", "use-keyring"]
        );
        assert!(registry.get("theme").is_none());
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        for yes in ["on", "TRUE", "yes", "1"] {
            assert_eq!(parse_bool(yes), Some(true), "{yes}");
        }
        for no in ["off", "False", "no", "0"] {
            assert_eq!(parse_bool(no), Some(false), "{no}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn boolean_set_and_unset_update_config() {
        let registry = SettingRegistry::new();
        let handler = registry.get("markdown").expect("handler");
        let mut config = Config::default();

        let message = handler.set(&args(&["off"]), &mut config).expect("set");
        assert_eq!(config.markdown, Some(false));
        assert_eq!(message, "✅ Set markdown to: off");

        let message = handler.unset(&mut config);
        assert_eq!(config.markdown, None);
        assert!(message.contains("default: on"));
    }

    #[test]
    fn invalid_boolean_is_rejected() {
        let registry = SettingRegistry::new();
        let handler = registry.get("use-keyring").expect("handler");
        let mut config = Config::default();

        let err = handler
            .set(&args(&["sometimes"]), &mut config)
            .expect_err("invalid");
        assert!(matches!(err, SettingError::InvalidBoolean(ref v) if v == "sometimes"));
        assert_eq!(config.use_keyring, None);
    }

    #[test]
    fn string_values_join_words() {
        let registry = SettingRegistry::new();
        let handler = registry.get("log-file").expect("handler");
        let mut config = Config::default();

        handler
            .set(&args(&["/tmp/my", "log.txt"]), &mut config)
            .expect("set");
        assert_eq!(config.log_file.as_deref(), Some("/tmp/my log.txt"));
    }

    #[test]
    fn blank_string_value_asks_for_an_argument() {
        let registry = SettingRegistry::new();
        let handler = registry.get("api-url").expect("handler");
        let mut config = Config::default();

        let err = handler.set(&args(&["  "]), &mut config).expect_err("blank");
        assert!(matches!(err, SettingError::MissingArgs { .. }));
    }

    #[test]
    fn api_url_must_be_absolute_http() {
        let registry = SettingRegistry::new();
        let handler = registry.get("api-url").expect("handler");
        let mut config = Config::default();

        for bad in ["localhost", "localhost:8000", "ftp://example.com", "http://"] {
            let err = handler.set(&args(&[bad]), &mut config).expect_err(bad);
            assert!(
                matches!(err, SettingError::InvalidUrl { ref input, .. } if input == bad),
                "{bad}: {err:?}"
            );
        }
        assert_eq!(config.api_url, None);

        handler
            .set(&args(&["https://chat.example.com/api"]), &mut config)
            .expect("valid url");
        assert_eq!(config.api_url.as_deref(), Some("https://chat.example.com/api"));
    }

    #[test]
    fn unknown_key_lists_registered_keys() {
        let registry = SettingRegistry::new();
        let err = registry.unknown_key("theme");
        match err {
            SettingError::UnknownKey { key, known } => {
                assert_eq!(key, "theme");
                assert_eq!(known, registry.keys_sorted());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
