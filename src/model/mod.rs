//! Wire types for the chatbot backend's admin API.
//!
//! [`ClientConfig`] is the full configuration record of one tenant's widget.
//! It is deliberately lenient on input (every field optional, unknown fields
//! preserved in `extra`) and strict on output: `company` and `theme` are
//! always objects and the keyword/quick-reply lists are always arrays.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields that must serialize as JSON arrays even when empty.
pub const ARRAY_FIELDS: &[&str] = &["quick_replies", "blocked_keywords", "allowed_keywords"];

/// Nested sections that must always be present as objects.
pub const OBJECT_FIELDS: &[&str] = &["company", "theme"];

/// Status assumed when a client record carries none.
pub const DEFAULT_STATUS: &str = "active";

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Configuration record for one tenant's chatbot widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,

    // -- identity / status --
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "statusMessage", skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    pub company: Company,

    // -- AI model parameters --
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "maxTokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_limit: Option<i64>,

    // -- prompt blocks --
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,

    // -- behavior --
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launcher_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_open_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_open_delay: Option<i64>,
    pub quick_replies: Vec<String>,

    // -- theme and layout --
    pub theme: Theme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launcher_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bubble_radius: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode_theme: Option<Value>,

    // -- business links --
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_maps_url: Option<String>,

    // -- lead capture --
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_form_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_form_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_form_success_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_form_fields: Option<Value>,

    // -- routing --
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_to_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zapier_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_url: Option<String>,

    // -- keyword logic --
    pub blocked_keywords: Vec<String>,
    pub allowed_keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff_message: Option<String>,

    /// Fields this console does not know about, sent back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Company contact details shown by the widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Company {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Widget color scheme and placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_bg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_bubble_bg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_bubble_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_bubble_bg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_bubble_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widget_bg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_bg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_bg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClientConfig {
    /// An empty record for a freshly created client.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Decode a raw JSON record, normalizing it first.
    pub fn from_value(mut value: Value) -> Result<Self, serde_json::Error> {
        normalize(&mut value);
        serde_json::from_value(value)
    }

    /// The record as a JSON value (the shape the edit buffer works on).
    pub fn to_value(&self) -> Value {
        // A struct of strings, numbers, and JSON values always serializes.
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Company name when set, otherwise the client id.
    pub fn display_name(&self) -> &str {
        match self.company.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.id,
        }
    }

    /// Status, defaulting to `active`.
    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or(DEFAULT_STATUS)
    }
}

/// Bring a raw record into the shape the backend expects on save.
///
/// `company` and `theme` become objects when missing or not objects. Array
/// fields become arrays: a comma separated string is split, anything else
/// that is not an array becomes `[]`. Non-object values are left alone.
pub fn normalize(value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };

    for &key in OBJECT_FIELDS {
        if !obj.get(key).is_some_and(Value::is_object) {
            obj.insert(key.to_string(), Value::Object(Map::new()));
        }
    }

    for &key in ARRAY_FIELDS {
        let normalized = match obj.remove(key) {
            Some(Value::Array(items)) => Value::Array(items),
            Some(Value::String(text)) => Value::Array(
                split_list(&text).into_iter().map(Value::String).collect(),
            ),
            _ => Value::Array(Vec::new()),
        };
        obj.insert(key.to_string(), normalized);
    }
}

/// Split comma separated text into trimmed, non-empty items.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Stats and logs
// ---------------------------------------------------------------------------

/// Per-client conversation statistics.
///
/// The backend has shipped both snake_case and camelCase names for these
/// fields; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientStats {
    pub conversations: Option<u64>,
    #[serde(alias = "messagesUser")]
    pub messages_user: Option<u64>,
    #[serde(alias = "messagesAssistant")]
    pub messages_assistant: Option<u64>,
    #[serde(alias = "lastActivity")]
    pub last_activity: Option<String>,
}

/// One stored chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "createdAt", alias = "created_at", default)]
    pub created_at: Option<String>,
    #[serde(rename = "sessionId", alias = "session_id", default)]
    pub session_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
