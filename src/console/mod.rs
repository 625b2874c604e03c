//! Application state for one admin session.
//!
//! [`Console`] owns everything the admin works with: the backend handle
//! (and through it the token store), the client registry, the current view
//! and tab, and the selected client's edit session with its read-only
//! panels. Every operation is a method on it; nothing lives in globals.
//!
//! Any call that comes back `Unauthorized` forces a logout: registry and
//! selection are dropped and the view returns to [`View::Login`].

pub mod view;

use thiserror::Error;

use crate::activity::{Action, ActivityLog};
use crate::api::{ApiError, Backend};
use crate::error::ValidationError;
use crate::form::{Commit, EditSession, FieldError};
use crate::model::{ClientConfig, ClientStats, LogEntry};
use crate::registry::ClientRegistry;
pub use view::{Panel, Tab, View};

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error("no client selected")]
    NoSelection,
    #[error("unknown client '{0}'")]
    UnknownClient(String),
    #[error("cancelled")]
    Cancelled,
}

impl ConsoleError {
    /// Whether this error ended the session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_unauthorized())
    }
}

/// Outcome of [`Console::save`].
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The buffer matched the snapshot; nothing was sent.
    Unchanged,
    /// The server accepted the record. Carries the changed paths.
    Saved(Vec<String>),
}

/// The selected client: its edit session and read-only panels.
#[derive(Debug, Clone)]
pub struct Selection {
    pub form: EditSession,
    pub stats: Panel<ClientStats>,
    pub logs: Panel<Vec<LogEntry>>,
    pub preview_url: String,
}

impl Selection {
    pub fn client_id(&self) -> &str {
        self.form.client_id()
    }
}

pub struct Console<B: Backend> {
    backend: B,
    registry: ClientRegistry,
    view: View,
    tab: Tab,
    selection: Option<Selection>,
    activity: ActivityLog,
    logs_limit: Option<u32>,
}

impl<B: Backend> Console<B> {
    pub fn new(backend: B, activity: ActivityLog, logs_limit: Option<u32>) -> Self {
        Self {
            backend,
            registry: ClientRegistry::new(),
            view: View::Login,
            tab: Tab::default(),
            selection: None,
            activity,
            logs_limit,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selection.as_ref().map(Selection::client_id)
    }

    pub fn is_dirty(&self) -> bool {
        self.selection.as_ref().is_some_and(|s| s.form.is_dirty())
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    /// Clients whose id or company name contains `query`, case-insensitively.
    pub fn clients(&self, query: &str) -> Vec<(&str, &ClientConfig)> {
        self.registry.filter(query)
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Resume a stored session.
    ///
    /// Without a token the console stays on the login view. With one, the
    /// client list is loaded and the last selected client restored when it
    /// still exists. Only a rejected token is discarded; other failures are
    /// returned with the token kept.
    pub fn init(&mut self) -> Result<View, ConsoleError> {
        if self.resume()? == View::Login {
            return Ok(self.view);
        }

        let last = self.backend.session().last_client().map(str::to_string);
        if let Some(id) = last
            && self.registry.contains(&id)
        {
            // A failed restore leaves the panel open with nothing selected.
            let _ = self.select(&id, |_| true);
        }
        Ok(self.view)
    }

    /// Load the client list with the stored token, without restoring a
    /// selection.
    pub fn resume(&mut self) -> Result<View, ConsoleError> {
        if self.backend.session().token().is_none() {
            self.view = View::Login;
            return Ok(self.view);
        }

        match self.load_clients() {
            Ok(_) => {
                self.view = View::Panel;
                Ok(self.view)
            }
            // guard() has already logged out.
            Err(err) if err.is_unauthorized() => Ok(self.view),
            Err(err) => Err(err),
        }
    }

    pub fn login(&mut self, password: &str) -> Result<usize, ConsoleError> {
        if password.trim().is_empty() {
            return Err(ValidationError::EmptyPassword.into());
        }

        if let Err(err) = self.backend.login(password) {
            self.activity
                .record(Action::Login, None, false, Some(err.to_string()));
            return Err(err.into());
        }
        self.activity.record(Action::Login, None, true, None);

        let count = self.load_clients()?;
        self.view = View::Panel;
        Ok(count)
    }

    pub fn logout(&mut self) {
        self.force_logout();
        self.activity.record(Action::Logout, None, true, None);
    }

    fn force_logout(&mut self) {
        self.backend.session_mut().clear_token();
        self.registry.clear();
        self.selection = None;
        self.view = View::Login;
    }

    /// Run the outcome of a backend call through the auth-failure path.
    fn guard<T>(&mut self, result: Result<T, ApiError>) -> Result<T, ConsoleError> {
        result.map_err(|err| {
            if err.is_unauthorized() {
                self.force_logout();
            }
            ConsoleError::Api(err)
        })
    }

    // -----------------------------------------------------------------------
    // Registry and selection
    // -----------------------------------------------------------------------

    /// Replace the registry with the server's list.
    pub fn load_clients(&mut self) -> Result<usize, ConsoleError> {
        let result = self.backend.list_clients();
        let clients = self.guard(result)?;
        self.registry.replace_all(clients);

        if let Some(id) = self.selected_id()
            && !self.registry.contains(id)
        {
            self.selection = None;
        }
        Ok(self.registry.len())
    }

    /// Make `id` the selected client.
    ///
    /// `confirm` is asked before unsaved edits are discarded; returning
    /// `false` cancels without touching anything.
    pub fn select(
        &mut self,
        id: &str,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<(), ConsoleError> {
        let config = self
            .registry
            .get(id)
            .cloned()
            .ok_or_else(|| ConsoleError::UnknownClient(id.to_string()))?;
        self.confirm_discard(confirm)?;
        self.open(&config)
    }

    fn confirm_discard(&self, confirm: impl FnOnce(&str) -> bool) -> Result<(), ConsoleError> {
        match &self.selection {
            Some(current) if current.form.is_dirty() => {
                let prompt = format!("Discard unsaved changes to '{}'?", current.client_id());
                if confirm(&prompt) {
                    Ok(())
                } else {
                    Err(ConsoleError::Cancelled)
                }
            }
            _ => Ok(()),
        }
    }

    fn open(&mut self, config: &ClientConfig) -> Result<(), ConsoleError> {
        let id = config.id.clone();
        let stats = self.fetch_stats(&id);
        let logs = self.fetch_logs(&id);
        if self.view == View::Login {
            return Err(ApiError::Unauthorized.into());
        }

        self.selection = Some(Selection {
            form: EditSession::new(config),
            stats,
            logs,
            preview_url: self.backend.preview_url(&id),
        });
        self.backend.session_mut().set_last_client(Some(&id));
        Ok(())
    }

    fn fetch_stats(&mut self, id: &str) -> Panel<ClientStats> {
        let result = self.backend.stats(id);
        self.panel(result)
    }

    fn fetch_logs(&mut self, id: &str) -> Panel<Vec<LogEntry>> {
        let result = self.backend.logs(id, self.logs_limit);
        self.panel(result)
    }

    fn panel<T>(&mut self, result: Result<T, ApiError>) -> Panel<T> {
        match result {
            Ok(value) => Panel::Loaded(value),
            Err(err) => {
                if err.is_unauthorized() {
                    self.force_logout();
                }
                Panel::Failed(err.to_string())
            }
        }
    }

    /// Re-fetch the stats and logs of the selected client.
    pub fn refresh_panels(&mut self) -> Result<(), ConsoleError> {
        let id = self.require_selection()?.client_id().to_string();
        let stats = self.fetch_stats(&id);
        let logs = self.fetch_logs(&id);
        if self.view == View::Login {
            return Err(ApiError::Unauthorized.into());
        }
        if let Some(selection) = self.selection.as_mut() {
            selection.stats = stats;
            selection.logs = logs;
        }
        Ok(())
    }

    fn require_selection(&self) -> Result<&Selection, ConsoleError> {
        self.selection.as_ref().ok_or(ConsoleError::NoSelection)
    }

    fn require_selection_mut(&mut self) -> Result<&mut Selection, ConsoleError> {
        self.selection.as_mut().ok_or(ConsoleError::NoSelection)
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<Commit, ConsoleError> {
        let selection = self.require_selection_mut()?;
        Ok(selection.form.set_field(name, raw)?)
    }

    pub fn revert(&mut self) -> Result<(), ConsoleError> {
        self.require_selection_mut()?.form.revert();
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, ConsoleError> {
        Ok(self.require_selection()?.form.export_json())
    }

    /// Load a JSON record into the edit buffer. Nothing is sent until save.
    pub fn import_json(&mut self, text: &str) -> Result<(), ConsoleError> {
        let selection = self.require_selection_mut()?;
        let id = selection.client_id().to_string();
        match selection.form.import_json(text) {
            Ok(()) => {
                self.activity.record(Action::Import, Some(&id), true, None);
                Ok(())
            }
            Err(err) => {
                self.activity
                    .record(Action::Import, Some(&id), false, Some(err.to_string()));
                Err(err.into())
            }
        }
    }

    /// Send the edit buffer to the server.
    ///
    /// A clean buffer is not sent. On success the registry entry and the
    /// edit session are replaced by the server's copy.
    pub fn save(&mut self) -> Result<SaveOutcome, ConsoleError> {
        let selection = self.require_selection()?;
        if !selection.form.is_dirty() {
            return Ok(SaveOutcome::Unchanged);
        }
        let id = selection.client_id().to_string();
        let changed: Vec<String> = selection
            .form
            .changes()
            .into_iter()
            .map(|change| change.path)
            .collect();
        let config = selection.form.to_config()?;

        let result = self.backend.update_client(&id, &config);
        let saved = match self.guard(result) {
            Ok(saved) => saved,
            Err(err) => {
                self.activity
                    .record(Action::Save, Some(&id), false, Some(err.to_string()));
                return Err(err);
            }
        };

        self.registry.upsert(&id, saved);
        if let Some(stored) = self.registry.get(&id)
            && let Some(selection) = self.selection.as_mut()
        {
            selection.form.reset(stored);
        }
        self.activity
            .record(Action::Save, Some(&id), true, Some(changed.join(", ")));
        Ok(SaveOutcome::Saved(changed))
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Create `id`, optionally copying the configuration of `template`, and
    /// select it.
    ///
    /// The id and template are checked before anything is sent.
    pub fn create(
        &mut self,
        id: &str,
        template: Option<&str>,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<(), ConsoleError> {
        self.registry.check_new_id(id)?;
        let base = match template {
            Some(source) => Some(
                self.registry
                    .get(source)
                    .cloned()
                    .ok_or_else(|| ConsoleError::UnknownClient(source.to_string()))?,
            ),
            None => None,
        };
        self.confirm_discard(confirm)?;

        let detail = template.map(|source| format!("from {source}"));
        match self.provision(id, base) {
            Ok(config) => {
                self.activity.record(Action::Create, Some(id), true, detail);
                self.open(&config)
            }
            Err(err) => {
                self.activity
                    .record(Action::Create, Some(id), false, Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// Create `new_id` from the current edit buffer and select it.
    pub fn duplicate(
        &mut self,
        new_id: &str,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<(), ConsoleError> {
        let selection = self.require_selection()?;
        let source = selection.client_id().to_string();
        self.registry.check_new_id(new_id)?;
        let base = selection.form.to_config()?;
        self.confirm_discard(confirm)?;

        match self.provision(new_id, Some(base)) {
            Ok(config) => {
                self.activity.record(
                    Action::Duplicate,
                    Some(new_id),
                    true,
                    Some(format!("from {source}")),
                );
                self.open(&config)
            }
            Err(err) => {
                self.activity
                    .record(Action::Duplicate, Some(new_id), false, Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// POST the id, PUT `base` under it when given, and register the result.
    fn provision(
        &mut self,
        id: &str,
        base: Option<ClientConfig>,
    ) -> Result<ClientConfig, ConsoleError> {
        let result = self.backend.create_client(id);
        let mut config = self.guard(result)?;

        if let Some(mut base) = base {
            base.id = id.to_string();
            let result = self.backend.update_client(id, &base);
            config = self.guard(result)?;
        }

        self.registry.upsert(id, config);
        self.registry
            .get(id)
            .cloned()
            .ok_or_else(|| ConsoleError::UnknownClient(id.to_string()))
    }

    /// Delete `id` after `confirm` agrees.
    ///
    /// When `id` is the selected client the selection is cleared, along
    /// with the persisted last-selected id if it points at it.
    pub fn delete(
        &mut self,
        id: &str,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<(), ConsoleError> {
        if !self.registry.contains(id) {
            return Err(ConsoleError::UnknownClient(id.to_string()));
        }
        if !confirm(&format!("Delete client '{id}'? This cannot be undone.")) {
            return Err(ConsoleError::Cancelled);
        }

        let result = self.backend.delete_client(id);
        if let Err(err) = self.guard(result) {
            self.activity
                .record(Action::Delete, Some(id), false, Some(err.to_string()));
            return Err(err);
        }

        self.registry.remove(id);
        if self.selected_id() == Some(id) {
            self.selection = None;
        }
        if self.backend.session().last_client() == Some(id) {
            self.backend.session_mut().set_last_client(None);
        }
        self.activity.record(Action::Delete, Some(id), true, None);
        Ok(())
    }
}
