/// Configuration system for kontaktio.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::AdminConfig::default()`]
/// 2. **User global config**: `~/.kontaktio/config.toml`
/// 3. **Project local config**: `.kontaktio.toml` in the current working directory
/// 4. **Environment variables**: `KONTAKTIO_*` overrides (highest precedence)
///
/// Missing sections in a TOML file fall back to defaults.
///
/// # Usage
///
/// ```rust,ignore
/// use kontaktio::config;
///
/// let cfg = config::load();
/// let api = kontaktio::api::AdminApi::from_config(&cfg.api, session);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::AdminConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved kontaktio configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> AdminConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for path in [global_config_path(), project_config_path()] {
        if let Some(layer) = load_toml_layer(path) {
            merge_toml(&mut merged, layer);
        }
    }

    let mut config = merged.try_into::<AdminConfig>().unwrap_or_else(|e| {
        eprintln!("warning: ignoring config files: {e}");
        AdminConfig::default()
    });
    apply_env_overrides(&mut config);

    config
}

/// Load one TOML config layer from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content does not fit the schema. Malformed files are reported on stderr
/// and skipped.
fn load_toml_layer(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    let checked = toml::from_str::<AdminConfig>(&content).and_then(|_| toml::from_str(&content));
    match checked {
        Ok(layer) => Some(layer),
        Err(e) => {
            eprintln!("warning: ignoring malformed config {}: {e}", path.display());
            None
        }
    }
}

/// Deep-merge `overlay` into `base`: tables merge key by key, anything else
/// in the overlay replaces the base value.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Directory holding every kontaktio file: `~/.kontaktio/`.
pub fn state_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kontaktio"))
}

fn global_config_path() -> Option<PathBuf> {
    state_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".kontaktio.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Expand a leading `~` to the home directory.
///
/// Returns `None` when the path starts with `~` and the home directory is
/// unknown.
pub fn expand_path(raw: &str) -> Option<PathBuf> {
    if raw == "~" {
        return dirs::home_dir();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(raw)),
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `KONTAKTIO_API_URL`: backend base URL
/// - `KONTAKTIO_TIMEOUT_MS`: request timeout
/// - `KONTAKTIO_LOGS_LIMIT`: log entries fetched per client
/// - `KONTAKTIO_SESSION_PATH`: session file location
/// - `KONTAKTIO_ACTIVITY_LOG`: activity log on/off (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut AdminConfig) {
    if let Ok(val) = std::env::var("KONTAKTIO_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("KONTAKTIO_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("KONTAKTIO_LOGS_LIMIT")
        && let Ok(limit) = val.parse::<u32>()
    {
        config.api.logs_limit = limit;
    }
    if let Ok(val) = std::env::var("KONTAKTIO_SESSION_PATH")
        && !val.is_empty()
    {
        config.session.path = val;
    }
    if let Ok(val) = std::env::var("KONTAKTIO_ACTIVITY_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
pub fn is_truthy(val: &str) -> bool {
    matches!(
        val.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.kontaktio/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.kontaktio/ directory")?;
    }

    fs::write(&path, AdminConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `api.base_url`. The file is rewritten with
/// every key, defaults included.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    // Start from the defaults so keys missing from the file can still be set.
    let mut value_table = toml::Value::try_from(AdminConfig::default())
        .context("failed to serialize default config")?;
    if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        let file: toml::Value =
            toml::from_str(&content).context("failed to parse config as TOML value")?;
        merge_toml(&mut value_table, file);
    }

    set_toml_value(&mut value_table, key, value)?;

    // Reject values that no longer fit the schema before touching disk.
    let rendered =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;
    toml::from_str::<AdminConfig>(&rendered)
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, rendered).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("malformed config key: '{key}'");
    }

    let mut current = root;
    for &part in &parts[..parts.len() - 1] {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let leaf = parts[parts.len() - 1];

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("config key '{key}' cannot be set from the command line"),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
