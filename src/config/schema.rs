/// Configuration schema and defaults for the kontaktio admin console.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[session]`, `[logging]` and `[display]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

/// Hosted backend the admin console talks to when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "https://chatbot-backend-x2cy.onrender.com";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level kontaktio configuration.
///
/// Maps directly to the `~/.kontaktio/config.toml` and `.kontaktio.toml`
/// file schemas. Missing sections and fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub display: DisplayConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Remote admin API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the chatbot backend (no trailing slash required).
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Number of log entries requested for the logs panel. `0` lets the
    /// backend pick its own default.
    pub logs_limit: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_ms: 15_000,
            logs_limit: 50,
        }
    }
}

impl ApiConfig {
    /// The logs limit as an optional query value.
    pub fn logs_limit(&self) -> Option<u32> {
        (self.logs_limit > 0).then_some(self.logs_limit)
    }
}

// ---------------------------------------------------------------------------
// [session]
// ---------------------------------------------------------------------------

/// Where the bearer token and last selected client are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path to the session file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: "~/.kontaktio/session.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether admin actions are appended to the activity log.
    pub enabled: bool,
    /// Path to the JSONL activity log. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.kontaktio/activity.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [display]
// ---------------------------------------------------------------------------

/// Terminal rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Render a true-color swatch next to color fields.
    pub swatches: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { swatches: true }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl AdminConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `kontaktio config init`.
    pub fn default_toml() -> String {
        format!(
            r#"# kontaktio Configuration
# Admin console for hosted chatbot widget clients
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (KONTAKTIO_*)
#   2. Project config (.kontaktio.toml in current directory)
#   3. User global config (~/.kontaktio/config.toml)
#   4. Built-in defaults

[api]
base_url = "{DEFAULT_API_BASE}"
timeout_ms = 15000
logs_limit = 50                       # 0 = backend default

[session]
path = "~/.kontaktio/session.json"

[logging]
enabled = true
path = "~/.kontaktio/activity.jsonl"

[display]
swatches = true                       # true-color swatches next to color fields
"#
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = AdminConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE);
        assert_eq!(config.api.timeout_ms, 15_000);
        assert_eq!(config.api.logs_limit(), Some(50));
        assert!(config.logging.enabled);
        assert!(config.display.swatches);
        assert!(config.session.path.ends_with("session.json"));
    }

    #[test]
    fn deserialize_minimal_toml() {
        let config: AdminConfig = toml::from_str(
            r#"
[api]
base_url = "http://localhost:3000"
"#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.api.timeout_ms, 15_000);
        assert!(config.logging.enabled);
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: AdminConfig = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE);
        assert_eq!(config.api.logs_limit, 50);
    }

    #[test]
    fn zero_logs_limit_means_backend_default() {
        let mut config = AdminConfig::default();
        config.api.logs_limit = 0;
        assert_eq!(config.api.logs_limit(), None);
    }

    #[test]
    fn default_toml_parses_back() {
        let toml_str = AdminConfig::default_toml();
        let config: AdminConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE);
        assert!(config.display.swatches);
    }
}
