//! Data-driven handlers for each configuration key.

use super::error::SettingError;
use super::SettingHandler;
use crate::core::config::Config;

/// Accepts: on/off, true/false, yes/no, 1/0 (case-insensitive).
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Handler for on/off settings.
pub struct BooleanHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default_display: &'static str,
    set_field: fn(&mut Config, Option<bool>),
}

impl SettingHandler for BooleanHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }
        let input = args.join(" ");
        let value = parse_bool(&input).ok_or(SettingError::InvalidBoolean(input))?;
        (self.set_field)(config, Some(value));
        Ok(format!("✅ Set {} to: {}", self.key, format_bool(value)))
    }

    fn unset(&self, config: &mut Config) -> String {
        (self.set_field)(config, None);
        format!(
            "✅ Unset {} (will use default: {})",
            self.key, self.default_display
        )
    }
}

/// Handler for free-form string settings. Multi-word values are joined with
/// spaces.
pub struct StringHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    validate: Option<fn(&str) -> Result<(), SettingError>>,
    set_field: fn(&mut Config, Option<String>),
}

impl SettingHandler for StringHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], config: &mut Config) -> Result<String, SettingError> {
        let value = args.join(" ").trim().to_string();
        if value.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }
        if let Some(validate) = self.validate {
            validate(&value)?;
        }
        let message = format!("✅ Set {} to: {value}", self.key);
        (self.set_field)(config, Some(value));
        Ok(message)
    }

    fn unset(&self, config: &mut Config) -> String {
        (self.set_field)(config, None);
        format!("✅ Unset {}", self.key)
    }
}

/// The backend URL must be absolute and use http or https.
pub fn validate_api_url(input: &str) -> Result<(), SettingError> {
    let invalid = |reason: String| SettingError::InvalidUrl {
        input: input.to_string(),
        reason,
    };
    let url = reqwest::Url::parse(input).map_err(|err| invalid(err.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(()),
        "http" | "https" => Err(invalid("missing host".into())),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

pub fn api_url_handler() -> StringHandler {
    StringHandler {
        key: "api-url",
        hint: "To set the backend URL, specify it:",
        example: "threadline set api-url http://localhost:8000",
        validate: Some(validate_api_url),
        set_field: |c, v| c.api_url = v,
    }
}

pub fn provider_handler() -> StringHandler {
    StringHandler {
        key: "provider",
        hint: "To set the model provider, specify its name:",
        example: "threadline set provider openai",
        validate: None,
        set_field: |c, v| c.provider = v,
    }
}

pub fn log_file_handler() -> StringHandler {
    StringHandler {
        key: "log-file",
        hint: "To write diagnostics to a file, specify its path:",
        example: "threadline set log-file ~/threadline.log",
        validate: None,
        set_field: |c, v| c.log_file = v,
    }
}

pub fn markdown_handler() -> BooleanHandler {
    BooleanHandler {
        key: "markdown",
        hint: "To set markdown rendering, specify on or off:",
        example: "threadline set markdown off",
        default_display: "on",
        set_field: |c, v| c.markdown = v,
    }
}

pub fn use_keyring_handler() -> BooleanHandler {
    BooleanHandler {
        key: "use-keyring",
        hint: "To choose where the session is stored, specify on or off:",
        example: "threadline set use-keyring off",
        default_display: "on",
        set_field: |c, v| c.use_keyring = v,
    }
}
