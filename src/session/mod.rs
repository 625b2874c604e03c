/// File-backed admin session: bearer token and last selected client.
///
/// State is persisted to `~/.kontaktio/session.json` (see
/// [`SessionConfig`](crate::config::schema::SessionConfig)) so that a login
/// survives across short-lived `kontaktio` process invocations. Writes are
/// best-effort: a read-only home directory degrades to an in-process session
/// instead of failing the command.
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{self, schema::SessionConfig};

/// Token and selection store.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: Option<PathBuf>,
    state: SessionState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    logged_in_at: Option<DateTime<Utc>>,
}

impl SessionStore {
    /// Open the store at the configured path, or a fresh one if the file is
    /// missing or unreadable.
    pub fn load(config: &SessionConfig) -> Self {
        match config::expand_path(&config.path) {
            Some(path) => Self::open(path),
            None => Self::in_memory(),
        }
    }

    /// Open the store backed by a specific file.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = load_state(&path).unwrap_or_default();
        Self {
            path: Some(path),
            state,
        }
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: SessionState::default(),
        }
    }

    /// The stored bearer token, if any.
    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Store a new token (or clear it with `None`).
    pub fn set_token(&mut self, token: Option<String>) {
        self.state.token = token.filter(|t| !t.is_empty());
        self.state.logged_in_at = self.state.token.as_ref().map(|_| Utc::now());
        self.persist();
    }

    /// Forget the token. The last selected client is kept.
    pub fn clear_token(&mut self) {
        if self.state.token.is_none() {
            return;
        }
        self.set_token(None);
    }

    /// When the current token was stored.
    pub fn logged_in_at(&self) -> Option<DateTime<Utc>> {
        self.state.logged_in_at
    }

    /// The client selected most recently.
    pub fn last_client(&self) -> Option<&str> {
        self.state.last_client.as_deref()
    }

    /// Remember (or forget) the selected client.
    pub fn set_last_client(&mut self, id: Option<&str>) {
        let next = id.map(str::to_string);
        if self.state.last_client == next {
            return;
        }
        self.state.last_client = next;
        self.persist();
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self) {
        if let Some(path) = &self.path {
            let _ = save_state(path, &self.state);
        }
    }
}

// ---------------------------------------------------------------------------
// File I/O (best-effort)
// ---------------------------------------------------------------------------

fn load_state(path: &Path) -> Option<SessionState> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn save_state(path: &Path, state: &SessionState) -> Option<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let json = serde_json::to_string_pretty(state).ok()?;
    let mut file = owner_only(path).ok()?;
    file.write_all(json.as_bytes()).ok()
}

/// Open `path` for writing, readable by the owner only on unix.
fn owner_only(path: &Path) -> std::io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(path)?;
    #[cfg(unix)]
    {
        // mode() only applies on creation; tighten files written earlier.
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    Ok(file)
}
