//! In-memory cache of every client configuration, keyed by client id.
//!
//! The registry is replaced wholesale by a listing and patched entry by
//! entry after create, save, and delete. It also owns the client-side
//! checks that must pass before a create reaches the network.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::model::ClientConfig;

static CLIENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid client id regex"));

/// Check the id charset: ASCII letters, digits, `-`, `_`.
pub fn validate_client_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if !CLIENT_ID_RE.is_match(id) {
        return Err(ValidationError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Client configurations keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<String, ClientConfig>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry with a fresh listing.
    pub fn replace_all(&mut self, clients: BTreeMap<String, ClientConfig>) {
        self.clients = clients;
    }

    pub fn clear(&mut self) {
        self.clients.clear();
    }

    pub fn get(&self, id: &str) -> Option<&ClientConfig> {
        self.clients.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.clients.contains_key(id)
    }

    /// Insert or replace one entry. The key is authoritative for `id`.
    pub fn upsert(&mut self, id: &str, mut config: ClientConfig) {
        config.id = id.to_string();
        self.clients.insert(id.to_string(), config);
    }

    pub fn remove(&mut self, id: &str) -> Option<ClientConfig> {
        self.clients.remove(id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ClientConfig)> {
        self.clients.iter().map(|(id, cfg)| (id.as_str(), cfg))
    }

    /// Entries whose id or company name contains `query`, case-insensitively.
    /// A blank query matches everything.
    pub fn filter<'a>(&'a self, query: &str) -> Vec<(&'a str, &'a ClientConfig)> {
        let needle = query.trim().to_lowercase();
        self.iter()
            .filter(|(id, cfg)| {
                needle.is_empty()
                    || id.to_lowercase().contains(&needle)
                    || cfg
                        .company
                        .name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Validate a prospective new id against the charset and this registry.
    pub fn check_new_id(&self, id: &str) -> Result<(), ValidationError> {
        validate_client_id(id)?;
        if self.contains(id) {
            return Err(ValidationError::DuplicateId(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ClientRegistry {
        let mut reg = ClientRegistry::new();
        let mut acme = ClientConfig::new("acme");
        acme.company.name = Some("Acme Dental".into());
        reg.upsert("acme", acme);
        let mut beta = ClientConfig::new("beta-shop");
        beta.company.name = Some("Beta Bakery".into());
        reg.upsert("beta-shop", beta);
        reg.upsert("gamma_1", ClientConfig::default());
        reg
    }

    #[test]
    fn id_charset() {
        assert!(validate_client_id("acme").is_ok());
        assert!(validate_client_id("Acme-2_b").is_ok());
        assert_eq!(
            validate_client_id("ab cd"),
            Err(ValidationError::InvalidId("ab cd".into()))
        );
        assert!(validate_client_id("zażółć").is_err());
        assert!(validate_client_id("a/b").is_err());
        assert_eq!(validate_client_id(""), Err(ValidationError::EmptyId));
    }

    #[test]
    fn check_new_id_rejects_collisions() {
        let reg = registry();
        assert_eq!(
            reg.check_new_id("acme"),
            Err(ValidationError::DuplicateId("acme".into()))
        );
        assert!(reg.check_new_id("delta").is_ok());
    }

    #[test]
    fn filter_matches_id_and_company_name() {
        let reg = registry();
        let ids = |q: &str| -> Vec<String> {
            reg.filter(q).into_iter().map(|(id, _)| id.to_string()).collect()
        };
        assert_eq!(ids("BAKERY"), vec!["beta-shop"]);
        assert_eq!(ids("gamma"), vec!["gamma_1"]);
        assert_eq!(ids("a"), vec!["acme", "beta-shop", "gamma_1"]);
        assert_eq!(ids("  "), vec!["acme", "beta-shop", "gamma_1"]);
        assert!(ids("zzz").is_empty());
    }

    #[test]
    fn upsert_forces_id_from_key() {
        let mut reg = ClientRegistry::new();
        reg.upsert("acme", ClientConfig::new("something-else"));
        assert_eq!(reg.get("acme").unwrap().id, "acme");
    }

    #[test]
    fn replace_all_drops_old_entries() {
        let mut reg = registry();
        let mut fresh = BTreeMap::new();
        fresh.insert("solo".to_string(), ClientConfig::new("solo"));
        reg.replace_all(fresh);
        assert_eq!(reg.len(), 1);
        assert!(!reg.contains("acme"));
        assert_eq!(reg.remove("solo").map(|c| c.id), Some("solo".into()));
        assert!(reg.is_empty());
    }
}
