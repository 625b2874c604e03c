/// HTTP client for the chatbot backend's admin API.
///
/// Uses the synchronous `ureq` client. Every call goes through
/// [`AdminApi::call`], which:
///
/// - **injects** `Authorization: Bearer <token>` when the session has one,
/// - **encodes** JSON bodies with a JSON content type and form bodies
///   url-encoded,
/// - **maps** 401/403 to [`ApiError::Unauthorized`] after discarding the
///   stored token, and any other non-2xx to [`ApiError::Server`] carrying the
///   server's `error` message.
///
/// The typed endpoint helpers live on the [`Backend`] trait so the console
/// can be driven by a fake in tests.
use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{Value, json};
use url::Url;

pub mod error;

pub use error::ApiError;
use error::{GENERIC_LOGIN_ERROR, GENERIC_SERVER_ERROR};

use crate::config::schema::ApiConfig;
use crate::model::{ClientConfig, ClientStats, LogEntry};
use crate::session::SessionStore;

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// The admin operations the console needs from the remote backend.
pub trait Backend {
    /// Token store consulted (and cleared on auth failure) by every call.
    fn session(&self) -> &SessionStore;

    fn session_mut(&mut self) -> &mut SessionStore;

    /// `POST /admin/login`. Stores and returns the token.
    fn login(&mut self, password: &str) -> Result<String, ApiError>;

    /// `GET /admin/clients`.
    fn list_clients(&mut self) -> Result<BTreeMap<String, ClientConfig>, ApiError>;

    /// `POST /admin/clients {id}`.
    fn create_client(&mut self, id: &str) -> Result<ClientConfig, ApiError>;

    /// `PUT /admin/clients/:id`. Returns the server's copy.
    fn update_client(&mut self, id: &str, config: &ClientConfig)
    -> Result<ClientConfig, ApiError>;

    /// `DELETE /admin/clients/:id`.
    fn delete_client(&mut self, id: &str) -> Result<(), ApiError>;

    /// `GET /admin/stats/:id`.
    fn stats(&mut self, id: &str) -> Result<ClientStats, ApiError>;

    /// `GET /admin/logs/:id[?limit=]`.
    fn logs(&mut self, id: &str, limit: Option<u32>) -> Result<Vec<LogEntry>, ApiError>;

    /// Source URL of the widget preview page.
    fn preview_url(&self, id: &str) -> String;
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// HTTP method of an admin API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Request body.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Json(Value),
    /// Sent url-encoded, without the JSON content type.
    Form(Vec<(String, String)>),
}

/// A fully addressed admin API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub body: Body,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: Body::Empty,
            headers: Vec::new(),
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Body::Form(fields);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Synchronous admin API client.
///
/// Owns the [`SessionStore`] so an auth failure can discard the token in the
/// same place it was read.
#[derive(Debug)]
pub struct AdminApi {
    base_url: String,
    agent: ureq::Agent,
    session: SessionStore,
}

impl AdminApi {
    /// Build a client from the resolved config.
    pub fn from_config(config: &ApiConfig, session: SessionStore) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve path segments against the base URL, percent-encoding each.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Perform an authenticated call and decode the JSON response.
    ///
    /// Empty or non-JSON success bodies decode as `{}`.
    pub fn call(&mut self, request: ApiRequest) -> Result<Value, ApiError> {
        match self.send(request, true) {
            Ok(resp) => Ok(read_json(resp)),
            Err(ureq::Error::Status(status, resp)) if status == 401 || status == 403 => {
                drop(resp);
                self.session.clear_token();
                Err(ApiError::Unauthorized)
            }
            Err(ureq::Error::Status(status, resp)) => {
                let data = read_json(resp);
                Err(ApiError::Server {
                    status,
                    message: server_message(&data).unwrap_or(GENERIC_SERVER_ERROR).to_string(),
                })
            }
            Err(ureq::Error::Transport(transport)) => Err(ApiError::Network(transport.to_string())),
        }
    }

    fn send(&self, request: ApiRequest, with_auth: bool) -> Result<ureq::Response, ureq::Error> {
        let mut req = self
            .agent
            .request_url(request.method.as_str(), &request.url);

        if with_auth && let Some(token) = self.session.token() {
            req = req.set("Authorization", &format!("Bearer {token}"));
        }
        for (name, value) in &request.headers {
            req = req.set(name, value);
        }

        match request.body {
            Body::Empty => req.set("Content-Type", "application/json").call(),
            Body::Json(value) => req.send_json(value),
            Body::Form(fields) => {
                let pairs: Vec<(&str, &str)> = fields
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                req.send_form(&pairs)
            }
        }
    }
}

impl Backend for AdminApi {
    fn session(&self) -> &SessionStore {
        &self.session
    }

    fn session_mut(&mut self) -> &mut SessionStore {
        &mut self.session
    }

    fn login(&mut self, password: &str) -> Result<String, ApiError> {
        let url = self.endpoint(&["admin", "login"])?;
        let request = ApiRequest::new(Method::Post, url).json(json!({ "password": password }));

        // Login bypasses the auth-failure path: a 401 here is a wrong
        // password, not an expired session.
        let data = match self.send(request, false) {
            Ok(resp) => read_json(resp),
            Err(ureq::Error::Status(_, resp)) => {
                let data = read_json(resp);
                let message = server_message(&data).unwrap_or(GENERIC_LOGIN_ERROR);
                return Err(ApiError::LoginRejected(message.to_string()));
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(ApiError::Network(transport.to_string()));
            }
        };

        match data.get("token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => {
                self.session.set_token(Some(token.to_string()));
                Ok(token.to_string())
            }
            _ => Err(ApiError::LoginRejected(
                server_message(&data).unwrap_or(GENERIC_LOGIN_ERROR).to_string(),
            )),
        }
    }

    fn list_clients(&mut self) -> Result<BTreeMap<String, ClientConfig>, ApiError> {
        let url = self.endpoint(&["admin", "clients"])?;
        let data = self.call(ApiRequest::new(Method::Get, url))?;
        decode_client_map(data)
    }

    fn create_client(&mut self, id: &str) -> Result<ClientConfig, ApiError> {
        let url = self.endpoint(&["admin", "clients"])?;
        let data = self.call(ApiRequest::new(Method::Post, url).json(json!({ "id": id })))?;
        decode_client(data, id)
    }

    fn update_client(
        &mut self,
        id: &str,
        config: &ClientConfig,
    ) -> Result<ClientConfig, ApiError> {
        let url = self.endpoint(&["admin", "clients", id])?;
        let data = self.call(ApiRequest::new(Method::Put, url).json(config.to_value()))?;
        decode_client(data, id)
    }

    fn delete_client(&mut self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["admin", "clients", id])?;
        self.call(ApiRequest::new(Method::Delete, url))?;
        Ok(())
    }

    fn stats(&mut self, id: &str) -> Result<ClientStats, ApiError> {
        let url = self.endpoint(&["admin", "stats", id])?;
        let data = self.call(ApiRequest::new(Method::Get, url))?;
        serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn logs(&mut self, id: &str, limit: Option<u32>) -> Result<Vec<LogEntry>, ApiError> {
        let mut url = self.endpoint(&["admin", "logs", id])?;
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        let data = self.call(ApiRequest::new(Method::Get, url))?;
        match data {
            Value::Array(_) => {
                serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
            }
            _ => Ok(Vec::new()),
        }
    }

    fn preview_url(&self, id: &str) -> String {
        match self.endpoint(&["admin", "preview.html"]) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("client", id);
                url.to_string()
            }
            Err(_) => format!("{}/admin/preview.html?client={id}", self.base_url),
        }
    }
}

// ---------------------------------------------------------------------------
// Response decoding
// ---------------------------------------------------------------------------

fn read_json(resp: ureq::Response) -> Value {
    resp.into_string()
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_else(|| json!({}))
}

/// The `error` field of a failure body, when present and non-empty.
fn server_message(data: &Value) -> Option<&str> {
    data.get("error")
        .and_then(Value::as_str)
        .filter(|msg| !msg.trim().is_empty())
}

/// Decode a `{client}` envelope, falling back to the bare body.
pub fn decode_client(data: Value, id: &str) -> Result<ClientConfig, ApiError> {
    let raw = match data {
        Value::Object(mut obj) if obj.get("client").is_some_and(Value::is_object) => {
            obj.remove("client").unwrap_or_default()
        }
        other => other,
    };
    let mut config = ClientConfig::from_value(raw).map_err(|e| ApiError::Decode(e.to_string()))?;
    if config.id.is_empty() {
        config.id = id.to_string();
    }
    Ok(config)
}

/// Decode the `{id: ClientConfig}` listing.
///
/// A record that does not decode is reported on stderr and left out rather
/// than failing the whole listing.
pub fn decode_client_map(data: Value) -> Result<BTreeMap<String, ClientConfig>, ApiError> {
    let entries = match data {
        Value::Object(obj) => obj,
        Value::Null => return Ok(BTreeMap::new()),
        other => {
            return Err(ApiError::Decode(format!(
                "expected an object of clients, got {}",
                type_name(&other)
            )));
        }
    };

    let mut clients = BTreeMap::new();
    for (id, raw) in entries {
        match ClientConfig::from_value(raw) {
            Ok(mut config) => {
                if config.id.is_empty() {
                    config.id = id.clone();
                }
                clients.insert(id, config);
            }
            Err(e) => eprintln!("warning: skipping client '{id}': {e}"),
        }
    }
    Ok(clients)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
