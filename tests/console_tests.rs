/// Console scenario tests.
///
/// Drives [`Console`] against an in-memory backend that keeps its own copy
/// of the client map and records every call, so tests can assert both the
/// resulting state and which requests were (or were not) sent.
use std::collections::BTreeMap;

use kontaktio::activity::{Action, ActivityLog};
use kontaktio::api::{ApiError, Backend};
use kontaktio::console::{Console, ConsoleError, Panel, SaveOutcome, Tab, View};
use kontaktio::error::ValidationError;
use kontaktio::form::Commit;
use kontaktio::form::field::find_field;
use kontaktio::model::{ClientConfig, ClientStats, LogEntry};
use kontaktio::session::SessionStore;
use serde_json::json;

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

struct FakeBackend {
    session: SessionStore,
    clients: BTreeMap<String, ClientConfig>,
    calls: Vec<String>,
    /// Every call after this many answers 401.
    expire_after: Option<usize>,
    fail_stats: bool,
    offline: bool,
}

impl FakeBackend {
    fn with_clients(raw: serde_json::Value) -> Self {
        let clients = raw
            .as_object()
            .unwrap()
            .iter()
            .map(|(id, value)| (id.clone(), ClientConfig::from_value(value.clone()).unwrap()))
            .collect();
        let mut session = SessionStore::in_memory();
        session.set_token(Some("token".into()));
        Self {
            session,
            clients,
            calls: Vec::new(),
            expire_after: None,
            fail_stats: false,
            offline: false,
        }
    }

    fn record(&mut self, call: String) -> Result<(), ApiError> {
        self.calls.push(call);
        if self.offline {
            return Err(ApiError::Network("connection refused".into()));
        }
        if let Some(limit) = self.expire_after
            && self.calls.len() > limit
        {
            self.session.clear_token();
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }
}

impl Backend for FakeBackend {
    fn session(&self) -> &SessionStore {
        &self.session
    }

    fn session_mut(&mut self) -> &mut SessionStore {
        &mut self.session
    }

    fn login(&mut self, password: &str) -> Result<String, ApiError> {
        self.calls.push("login".into());
        if password != "correct horse" {
            return Err(ApiError::LoginRejected("invalid password".into()));
        }
        self.session.set_token(Some("token".into()));
        Ok("token".into())
    }

    fn list_clients(&mut self) -> Result<BTreeMap<String, ClientConfig>, ApiError> {
        self.record("list".into())?;
        Ok(self.clients.clone())
    }

    fn create_client(&mut self, id: &str) -> Result<ClientConfig, ApiError> {
        self.record(format!("create {id}"))?;
        if self.clients.contains_key(id) {
            return Err(ApiError::Server {
                status: 409,
                message: "Client already exists".into(),
            });
        }
        let config = ClientConfig::new(id);
        self.clients.insert(id.into(), config.clone());
        Ok(config)
    }

    fn update_client(
        &mut self,
        id: &str,
        config: &ClientConfig,
    ) -> Result<ClientConfig, ApiError> {
        self.record(format!("update {id}"))?;
        let mut stored = config.clone();
        stored
            .extra
            .insert("updatedAt".into(), json!("2026-10-19T12:00:00Z"));
        self.clients.insert(id.into(), stored.clone());
        Ok(stored)
    }

    fn delete_client(&mut self, id: &str) -> Result<(), ApiError> {
        self.record(format!("delete {id}"))?;
        self.clients.remove(id);
        Ok(())
    }

    fn stats(&mut self, id: &str) -> Result<ClientStats, ApiError> {
        self.record(format!("stats {id}"))?;
        if self.fail_stats {
            return Err(ApiError::Server {
                status: 500,
                message: "stats unavailable".into(),
            });
        }
        Ok(ClientStats {
            conversations: Some(4),
            ..ClientStats::default()
        })
    }

    fn logs(&mut self, id: &str, limit: Option<u32>) -> Result<Vec<LogEntry>, ApiError> {
        self.record(format!("logs {id} {limit:?}"))?;
        Ok(vec![LogEntry {
            role: "user".into(),
            content: "Dzień dobry".into(),
            created_at: None,
            session_id: Some("s1".into()),
        }])
    }

    fn preview_url(&self, id: &str) -> String {
        format!("https://backend.test/admin/preview.html?client={id}")
    }
}

fn acme_backend() -> FakeBackend {
    FakeBackend::with_clients(json!({
        "acme": {"status": "active", "company": {"name": "Acme"}},
        "bistro": {"status": "maintenance", "company": {"name": "Bistro Pod Lipą"}},
    }))
}

fn ready(backend: FakeBackend) -> Console<FakeBackend> {
    let mut console = Console::new(backend, ActivityLog::disabled(), Some(20));
    assert_eq!(console.init().unwrap(), View::Panel);
    console
}

fn calls(console: &Console<FakeBackend>) -> Vec<String> {
    console.backend().calls.clone()
}

// ---------------------------------------------------------------------------
// Editing and saving
// ---------------------------------------------------------------------------

#[test]
fn edit_temperature_and_save() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();
    assert!(!console.is_dirty());

    let commit = console.set_field("temperature", "0.9").unwrap();
    assert_eq!(commit, Commit::Applied(json!(0.9)));
    assert!(console.is_dirty());

    let outcome = console.save().unwrap();
    assert_eq!(outcome, SaveOutcome::Saved(vec!["temperature".to_string()]));
    assert_eq!(console.registry().get("acme").unwrap().temperature, Some(0.9));
    assert!(!console.is_dirty());
    assert_eq!(console.backend().clients["acme"].temperature, Some(0.9));

    // The server's copy (with its extra field) is the new snapshot.
    let selection = console.selection().unwrap();
    assert_eq!(selection.form.snapshot()["updatedAt"], json!("2026-10-19T12:00:00Z"));
}

#[test]
fn reverting_a_field_by_hand_clears_dirty() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();
    console.set_field("company.name", "Acme Corp").unwrap();
    assert!(console.is_dirty());
    console.set_field("company.name", "Acme").unwrap();
    assert!(!console.is_dirty());
}

#[test]
fn revert_restores_snapshot() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();
    console.set_field("theme.buttonBg", "#ff0000").unwrap();
    console.revert().unwrap();
    assert!(!console.is_dirty());
    assert!(console.selection().unwrap().form.changes().is_empty());
}

#[test]
fn invalid_json_blob_flags_without_error() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();
    let before = console.selection().unwrap().form.buffer().clone();

    let commit = console.set_field("lead_form_fields", "not valid json").unwrap();
    assert!(matches!(commit, Commit::Flagged(_)));

    let form = &console.selection().unwrap().form;
    assert_eq!(form.buffer(), &before);
    assert!(!form.is_dirty());
    let view = form.view(find_field("lead_form_fields").unwrap());
    assert!(view.flag.is_some());
}

#[test]
fn save_normalizes_required_shapes() {
    let mut backend = acme_backend();
    backend.clients.insert(
        "legacy".into(),
        ClientConfig::from_value(json!({"id": "legacy", "company": "Legacy", "quick_replies": "A,B"}))
            .unwrap(),
    );
    let mut console = ready(backend);
    console.select("legacy", |_| true).unwrap();
    console.set_field("welcome_message", "Cześć!").unwrap();
    console.save().unwrap();

    let sent = console.backend().clients["legacy"].to_value();
    assert!(sent["company"].is_object());
    assert!(sent["theme"].is_object());
    assert_eq!(sent["quick_replies"], json!(["A", "B"]));
    assert_eq!(sent["blocked_keywords"], json!([]));
}

#[test]
fn writes_to_id_are_refused() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();
    let err = console.set_field("id", "other").unwrap_err();
    assert!(matches!(err, ConsoleError::Field(_)));
}

#[test]
fn editing_without_selection_fails() {
    let mut console = ready(acme_backend());
    assert!(matches!(
        console.set_field("temperature", "1"),
        Err(ConsoleError::NoSelection)
    ));
    assert!(matches!(console.save(), Err(ConsoleError::NoSelection)));
}

// ---------------------------------------------------------------------------
// Create / duplicate / delete
// ---------------------------------------------------------------------------

#[test]
fn create_rejects_malformed_id_before_network() {
    let mut console = ready(acme_backend());
    let before = calls(&console);

    let err = console.create("ab cd", None, |_| true).unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Validation(ValidationError::InvalidId(_))
    ));
    assert_eq!(calls(&console), before);
}

#[test]
fn create_rejects_existing_id_before_network() {
    let mut console = ready(acme_backend());
    let before = calls(&console);

    let err = console.create("acme", None, |_| true).unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Validation(ValidationError::DuplicateId(_))
    ));
    assert_eq!(calls(&console), before);
}

#[test]
fn create_selects_new_client() {
    let mut console = ready(acme_backend());
    console.create("nowy-klient", None, |_| true).unwrap();

    assert_eq!(console.selected_id(), Some("nowy-klient"));
    assert!(console.registry().contains("nowy-klient"));
    assert!(calls(&console).contains(&"create nowy-klient".to_string()));
    assert!(!calls(&console).iter().any(|c| c.starts_with("update")));
    assert_eq!(
        console.backend().session().last_client(),
        Some("nowy-klient")
    );
}

#[test]
fn create_from_template_copies_configuration() {
    let mut console = ready(acme_backend());
    console.create("acme_2", Some("acme"), |_| true).unwrap();

    let copy = console.registry().get("acme_2").unwrap();
    assert_eq!(copy.id, "acme_2");
    assert_eq!(copy.company.name.as_deref(), Some("Acme"));
    // The template itself is untouched.
    assert_eq!(console.registry().get("acme").unwrap().id, "acme");

    let tail: Vec<String> = calls(&console).into_iter().rev().take(4).collect();
    assert!(tail.contains(&"update acme_2".to_string()));
}

#[test]
fn duplicate_uses_current_buffer() {
    let mut console = ready(acme_backend());
    console.select("bistro", |_| true).unwrap();
    console.set_field("temperature", "0.2").unwrap();

    console.duplicate("bistro-2", |_| true).unwrap();
    let copy = console.registry().get("bistro-2").unwrap();
    assert_eq!(copy.temperature, Some(0.2));
    assert_eq!(copy.status.as_deref(), Some("maintenance"));
    assert_eq!(console.selected_id(), Some("bistro-2"));
    assert!(!console.is_dirty());
}

#[test]
fn duplicate_rejects_collision_before_network() {
    let mut console = ready(acme_backend());
    console.select("bistro", |_| true).unwrap();
    let before = calls(&console);
    assert!(console.duplicate("acme", |_| true).is_err());
    assert_eq!(calls(&console), before);
}

#[test]
fn delete_selected_client_clears_selection() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();
    console.set_field("temperature", "0.7").unwrap();

    console.delete("acme", |_| true).unwrap();
    assert!(!console.registry().contains("acme"));
    assert!(console.selection().is_none());
    assert!(console.backend().session().last_client().is_none());
    assert!(!console.backend().clients.contains_key("acme"));
}

#[test]
fn delete_other_client_keeps_selection() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();
    console.delete("bistro", |_| true).unwrap();
    assert_eq!(console.selected_id(), Some("acme"));
    assert_eq!(console.backend().session().last_client(), Some("acme"));
}

#[test]
fn declined_delete_sends_nothing() {
    let mut console = ready(acme_backend());
    let before = calls(&console);
    assert!(matches!(
        console.delete("acme", |_| false),
        Err(ConsoleError::Cancelled)
    ));
    assert_eq!(calls(&console), before);
}

// ---------------------------------------------------------------------------
// Navigation, panels, and auth
// ---------------------------------------------------------------------------

#[test]
fn selection_fetches_panels_and_preview() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();

    let selection = console.selection().unwrap();
    assert_eq!(selection.stats.loaded().unwrap().conversations, Some(4));
    assert_eq!(selection.logs.loaded().unwrap().len(), 1);
    assert!(selection.preview_url.ends_with("client=acme"));
    assert!(calls(&console).contains(&"logs acme Some(20)".to_string()));
}

#[test]
fn stats_failure_is_inline() {
    let mut backend = acme_backend();
    backend.fail_stats = true;
    let mut console = ready(backend);
    console.select("acme", |_| true).unwrap();

    let selection = console.selection().unwrap();
    assert_eq!(selection.stats, Panel::Failed("stats unavailable".into()));
    assert!(selection.logs.loaded().is_some());
    assert_eq!(console.view(), View::Panel);
}

#[test]
fn dirty_buffer_survives_declined_navigation() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();
    console.set_field("model", "gpt-4o").unwrap();

    let mut asked = None;
    let result = console.select("bistro", |prompt| {
        asked = Some(prompt.to_string());
        false
    });
    assert!(matches!(result, Err(ConsoleError::Cancelled)));
    assert!(asked.unwrap().contains("acme"));
    assert!(console.is_dirty());
    assert_eq!(console.selected_id(), Some("acme"));
}

#[test]
fn filter_matches_id_or_company() {
    let console = ready(acme_backend());
    let ids = |q: &str| -> Vec<String> {
        console.clients(q).into_iter().map(|(id, _)| id.to_string()).collect()
    };
    assert_eq!(ids("LIP"), vec!["bistro"]);
    assert_eq!(ids("ac"), vec!["acme"]);
    assert_eq!(ids("").len(), 2);
}

#[test]
fn unauthorized_mid_session_returns_to_login() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();
    console.set_field("temperature", "0.5").unwrap();

    let made = console.backend().calls.len();
    console.backend_mut().expire_after = Some(made);
    let err = console.save().unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(console.view(), View::Login);
    assert!(console.backend().session().token().is_none());
    assert!(console.registry().is_empty());
    assert!(console.selection().is_none());
}

#[test]
fn unreachable_backend_keeps_the_session() {
    let mut backend = acme_backend();
    backend.offline = true;
    let mut console = Console::new(backend, ActivityLog::disabled(), None);

    let err = console.resume().unwrap_err();
    assert!(matches!(err, ConsoleError::Api(ApiError::Network(_))));
    assert_eq!(err.to_string(), "could not connect to the server");
    assert_eq!(console.backend().session().token(), Some("token"));

    console.backend_mut().offline = false;
    assert_eq!(console.resume().unwrap(), View::Panel);
    assert_eq!(console.registry().len(), 2);
}

#[test]
fn init_restores_last_selected_client() {
    let mut backend = acme_backend();
    backend.session.set_last_client(Some("bistro"));
    let console = ready(backend);
    assert_eq!(console.selected_id(), Some("bistro"));
}

#[test]
fn init_skips_vanished_last_client() {
    let mut backend = acme_backend();
    backend.session.set_last_client(Some("gone"));
    let console = ready(backend);
    assert!(console.selection().is_none());
}

#[test]
fn login_then_logout() {
    let mut backend = acme_backend();
    backend.session.clear_token();
    let mut console = Console::new(backend, ActivityLog::disabled(), None);
    assert_eq!(console.init().unwrap(), View::Login);

    assert!(matches!(
        console.login("wrong"),
        Err(ConsoleError::Api(ApiError::LoginRejected(_)))
    ));
    assert_eq!(console.view(), View::Login);

    assert_eq!(console.login("correct horse").unwrap(), 2);
    assert_eq!(console.view(), View::Panel);

    console.logout();
    assert_eq!(console.view(), View::Login);
    assert!(console.registry().is_empty());
    assert!(console.backend().session().token().is_none());
}

#[test]
fn switching_tabs() {
    let mut console = ready(acme_backend());
    console.switch_tab("theme".parse::<Tab>().unwrap());
    assert_eq!(console.tab(), Tab::Theme);
}

// ---------------------------------------------------------------------------
// Import / export and activity
// ---------------------------------------------------------------------------

#[test]
fn import_keeps_id_and_marks_dirty() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();

    console
        .import_json(r#"{"id": "evil", "company": {"name": "Imported"}, "temperature": 0.1}"#)
        .unwrap();
    assert!(console.is_dirty());
    let buffer = console.selection().unwrap().form.buffer();
    assert_eq!(buffer["id"], json!("acme"));
    assert_eq!(buffer["company"]["name"], json!("Imported"));
}

#[test]
fn import_rejects_non_object() {
    let mut console = ready(acme_backend());
    console.select("acme", |_| true).unwrap();
    let err = console.import_json("[]").unwrap_err();
    assert!(matches!(
        err,
        ConsoleError::Validation(ValidationError::ImportNotObject)
    ));
    assert!(!console.is_dirty());
}

#[test]
fn activity_is_recorded() {
    let dir = std::env::temp_dir().join(format!("kontaktio-console-activity-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let log = ActivityLog::at(dir.join("activity.jsonl"));

    let mut console = Console::new(acme_backend(), log.clone(), None);
    console.init().unwrap();
    console.create("gamma", None, |_| true).unwrap();
    console.set_field("temperature", "0.3").unwrap();
    console.save().unwrap();
    console.delete("gamma", |_| true).unwrap();

    let actions: Vec<Action> = log.read_all().into_iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![Action::Create, Action::Save, Action::Delete]);
    let save = &log.read_all()[1];
    assert_eq!(save.client_id.as_deref(), Some("gamma"));
    assert_eq!(save.detail.as_deref(), Some("temperature"));
}
