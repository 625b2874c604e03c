//! Form engine: an edit buffer bound to typed field descriptors, compared
//! against the last confirmed snapshot.
//!
//! An [`EditSession`] is created when a client is selected. Field edits go
//! through [`EditSession::set_field`], which parses the raw text with the
//! field's kind, writes it at the field's path, and recomputes the dirty
//! flag. Rejected input never touches the buffer; it flags the field
//! instead. After a successful save the session is reset from the server's
//! copy, which becomes the new snapshot.

pub mod binding;
pub mod dirty;
pub mod field;
pub mod path;

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::error::ValidationError;
use crate::model::ClientConfig;
use dirty::{Change, DirtyTracker};
use field::{FieldDescriptor, find_field};

/// Programming errors in a field write (as opposed to bad user input).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("'{0}' cannot be changed")]
    ReadOnly(String),
    #[error(transparent)]
    Path(#[from] path::PathError),
}

/// Result of a field write.
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    /// The value was stored.
    Applied(Value),
    /// The input was rejected; the buffer is unchanged.
    Flagged(String),
}

/// A field whose last input was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFlag {
    pub input: String,
    pub reason: String,
}

/// Rendered state of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldView<'a> {
    pub field: &'static FieldDescriptor,
    pub text: String,
    pub flag: Option<&'a FieldFlag>,
}

/// Edit buffer + snapshot for the selected client.
#[derive(Debug, Clone)]
pub struct EditSession {
    client_id: String,
    snapshot: Value,
    buffer: Value,
    tracker: DirtyTracker,
    dirty: bool,
    flags: BTreeMap<&'static str, FieldFlag>,
}

impl EditSession {
    /// Start editing `config`. Buffer and snapshot are independent copies.
    pub fn new(config: &ClientConfig) -> Self {
        let snapshot = config.to_value();
        Self {
            client_id: config.id.clone(),
            tracker: DirtyTracker::new(&snapshot),
            buffer: snapshot.clone(),
            snapshot,
            dirty: false,
            flags: BTreeMap::new(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn buffer(&self) -> &Value {
        &self.buffer
    }

    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Parse `raw` for the field named `name` (path or key) and store it.
    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<Commit, FieldError> {
        if name == "id" {
            return Err(FieldError::ReadOnly(name.to_string()));
        }
        let field = find_field(name).ok_or_else(|| FieldError::UnknownField(name.to_string()))?;

        match binding::parse_input(field, raw) {
            Ok(value) => {
                path::set(&mut self.buffer, field.path, value.clone())?;
                self.restore_if_unchanged(field)?;
                self.flags.remove(field.path);
                self.refresh();
                Ok(Commit::Applied(value))
            }
            Err(reason) => {
                self.flags.insert(
                    field.path,
                    FieldFlag {
                        input: raw.to_string(),
                        reason: reason.clone(),
                    },
                );
                Ok(Commit::Flagged(reason))
            }
        }
    }

    /// Current text and flag state of `field`.
    pub fn view(&self, field: &'static FieldDescriptor) -> FieldView<'_> {
        FieldView {
            field,
            text: binding::display_value(field, &self.buffer),
            flag: self.flags.get(field.path),
        }
    }

    pub fn flags(&self) -> impl Iterator<Item = (&'static str, &FieldFlag)> {
        self.flags.iter().map(|(path, flag)| (*path, flag))
    }

    /// Leaf differences between snapshot and buffer.
    pub fn changes(&self) -> Vec<Change> {
        dirty::diff(&self.snapshot, &self.buffer)
    }

    /// Throw away every edit.
    pub fn revert(&mut self) {
        self.buffer = self.snapshot.clone();
        self.flags.clear();
        self.refresh();
    }

    /// Adopt the server's copy as both snapshot and buffer.
    pub fn reset(&mut self, config: &ClientConfig) {
        *self = Self::new(config);
    }

    /// The buffer as a normalized, structurally checked record.
    pub fn to_config(&self) -> Result<ClientConfig, ValidationError> {
        let mut config = ClientConfig::from_value(self.buffer.clone())
            .map_err(|e| ValidationError::InvalidConfig(e.to_string()))?;
        config.id = self.client_id.clone();
        Ok(config)
    }

    /// The buffer as pretty-printed JSON.
    pub fn export_json(&self) -> String {
        serde_json::to_string_pretty(&self.buffer).unwrap_or_else(|_| self.buffer.to_string())
    }

    /// Replace the buffer with an imported JSON record.
    ///
    /// The import must be an object that decodes as a client record; its
    /// `id` is ignored in favor of the current one. On any rejection the
    /// buffer is left as it was.
    pub fn import_json(&mut self, text: &str) -> Result<(), ValidationError> {
        let mut value: Value =
            serde_json::from_str(text).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
        let Some(obj) = value.as_object_mut() else {
            return Err(ValidationError::ImportNotObject);
        };
        obj.insert("id".to_string(), Value::String(self.client_id.clone()));

        let config = ClientConfig::from_value(value)
            .map_err(|e| ValidationError::InvalidConfig(e.to_string()))?;
        self.buffer = config.to_value();
        self.flags.clear();
        self.refresh();
        Ok(())
    }

    /// Typing back what the snapshot shows restores the snapshot's value, so
    /// a field missing from the record does not stay dirty as `""` or as
    /// its display default.
    fn restore_if_unchanged(&mut self, field: &FieldDescriptor) -> Result<(), FieldError> {
        let shown = binding::display_value(field, &self.buffer);
        if shown != binding::display_value(field, &self.snapshot) {
            return Ok(());
        }
        match path::get(&self.snapshot, field.path) {
            Some(original) => path::set(&mut self.buffer, field.path, original.clone())?,
            None => {
                path::remove(&mut self.buffer, field.path);
            }
        }
        Ok(())
    }

    fn refresh(&mut self) {
        self.dirty = self.tracker.is_dirty(&self.buffer);
    }
}
