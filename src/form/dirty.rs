//! Dirty tracking by canonical JSON comparison.
//!
//! Two records are equal when their canonical serializations are equal:
//! object keys sorted recursively, array order kept. Key insertion order
//! therefore never makes a buffer look modified.

use serde_json::Value;

/// Serialize `value` with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&obj[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Remembers the canonical form of the last confirmed record.
#[derive(Debug, Clone)]
pub struct DirtyTracker {
    baseline: String,
}

impl DirtyTracker {
    pub fn new(snapshot: &Value) -> Self {
        Self {
            baseline: canonical_json(snapshot),
        }
    }

    /// Whether `buffer` differs from the baseline.
    pub fn is_dirty(&self, buffer: &Value) -> bool {
        canonical_json(buffer) != self.baseline
    }

    /// Adopt a new confirmed record as the baseline.
    pub fn rebase(&mut self, snapshot: &Value) {
        self.baseline = canonical_json(snapshot);
    }
}

/// One leaf that differs between two records.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub path: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// Leaf-level differences between `before` and `after`, sorted by path.
///
/// Objects are compared key by key; anything else (arrays included) is
/// compared as a whole.
pub fn diff(before: &Value, after: &Value) -> Vec<Change> {
    let mut changes = Vec::new();
    diff_into("", Some(before), Some(after), &mut changes);
    changes.sort_by(|a, b| a.path.cmp(&b.path));
    changes
}

fn diff_into(prefix: &str, before: Option<&Value>, after: Option<&Value>, out: &mut Vec<Change>) {
    match (before, after) {
        (Some(Value::Object(a)), Some(Value::Object(b))) => {
            let mut keys: Vec<&String> = a.keys().chain(b.keys()).collect();
            keys.sort();
            keys.dedup();
            for key in keys {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                diff_into(&path, a.get(key), b.get(key), out);
            }
        }
        (a, b) => {
            let same = match (a, b) {
                (Some(a), Some(b)) => canonical_json(a) == canonical_json(b),
                (None, None) => true,
                _ => false,
            };
            if !same {
                out.push(Change {
                    path: prefix.to_string(),
                    before: a.cloned(),
                    after: b.cloned(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_sorts_keys_recursively() {
        let a: Value =
            serde_json::from_str(r#"{"b":1,"a":{"y":[3,1],"x":"s"}}"#).unwrap();
        assert_eq!(canonical_json(&a), r#"{"a":{"x":"s","y":[3,1]},"b":1}"#);
    }

    #[test]
    fn canonical_escapes_keys_and_strings() {
        let v = json!({"a\"b": "line\nbreak"});
        assert_eq!(canonical_json(&v), r#"{"a\"b":"line\nbreak"}"#);
    }

    #[test]
    fn arrays_keep_order() {
        assert_ne!(canonical_json(&json!([1, 2])), canonical_json(&json!([2, 1])));
    }

    #[test]
    fn tracker_follows_rebase() {
        let snapshot = json!({"temperature": 0.4});
        let mut tracker = DirtyTracker::new(&snapshot);
        let edited = json!({"temperature": 0.9});
        assert!(!tracker.is_dirty(&snapshot));
        assert!(tracker.is_dirty(&edited));
        tracker.rebase(&edited);
        assert!(!tracker.is_dirty(&edited));
    }

    #[test]
    fn diff_reports_leaf_changes() {
        let before = json!({"company": {"name": "Acme"}, "temperature": 0.4, "quick_replies": ["a"]});
        let after = json!({"company": {"name": "Acme", "email": "x@acme.pl"}, "temperature": 0.9, "quick_replies": ["a"]});
        let changes = diff(&before, &after);
        let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["company.email", "temperature"]);
        assert_eq!(changes[0].before, None);
        assert_eq!(changes[1].after, Some(json!(0.9)));
    }
}
