use crate::core::config::data::{Config, DEFAULT_API_URL, DEFAULT_PROVIDER};

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

impl Config {
    /// One line per setting, in the order `threadline set` shows them.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match &self.api_url {
            Some(url) => lines.push(format!("  api-url: {url}")),
            None => lines.push(format!("  api-url: (unset, default: {DEFAULT_API_URL})")),
        }
        match &self.provider {
            Some(provider) => lines.push(format!("  provider: {provider}")),
            None => lines.push(format!("  provider: (unset, default: {DEFAULT_PROVIDER})")),
        }
        match self.markdown {
            Some(value) => lines.push(format!("  markdown: {}", on_off(value))),
            None => lines.push("  markdown: (unset, default: on)".to_string()),
        }
        match self.use_keyring {
            Some(value) => lines.push(format!("  use-keyring: {}", on_off(value))),
            None => lines.push("  use-keyring: (unset, default: on)".to_string()),
        }
        match &self.log_file {
            Some(path) => lines.push(format!("  log-file: {path}")),
            None => lines.push("  log-file: (unset)".to_string()),
        }
        lines
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        for line in self.describe() {
            println!("{line}");
        }
    }
}
