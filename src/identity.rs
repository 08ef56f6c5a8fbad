use std::collections::HashMap;

use serde_json::{Map, Value, json};

use crate::config::Config;
use crate::error::Result;
use crate::model::LegacyUser;
use crate::zammad::{HelpdeskTarget, TargetUser};

/// Per-run identity state: the configured email remap, the default
/// attributes for newly created accounts, and the lowercased-email cache
/// that keeps any one user from being searched or created twice.
pub struct UserDirectory {
    usermap: HashMap<String, String>,
    defaults: Map<String, Value>,
    by_email: HashMap<String, TargetUser>,
}

impl UserDirectory {
    pub fn new(config: &Config) -> Self {
        let usermap = config
            .usermap
            .iter()
            .map(|(legacy, canonical)| (legacy.to_lowercase(), canonical.clone()))
            .collect();
        Self {
            usermap,
            defaults: config.userdata.clone(),
            by_email: HashMap::new(),
        }
    }

    /// Seed the cache with every existing target account up front.
    pub fn preload<T: HelpdeskTarget>(&mut self, target: &mut T) -> Result<()> {
        for user in target.list_users()? {
            self.cache(user);
        }
        Ok(())
    }

    fn cache(&mut self, user: TargetUser) {
        self.by_email.insert(user.email.to_lowercase(), user);
    }

    /// Canonical lowercased email for a legacy address, after the
    /// configured remap.
    pub fn canonical_email(&self, email: &str) -> String {
        let lower = email.to_lowercase();
        match self.usermap.get(&lower) {
            Some(mapped) => mapped.to_lowercase(),
            None => lower,
        }
    }

    /// Resolve a legacy user to a target account: cache, then a server
    /// search, then account creation. Whatever is found or created is
    /// cached for the rest of the run.
    pub fn resolve<T: HelpdeskTarget>(
        &mut self,
        target: &mut T,
        legacy: &LegacyUser,
    ) -> Result<TargetUser> {
        let email = self.canonical_email(&legacy.email);
        if let Some(user) = self.by_email.get(&email) {
            return Ok(user.clone());
        }
        for found in target.search_users(&email)? {
            self.cache(found);
        }
        if let Some(user) = self.by_email.get(&email) {
            return Ok(user.clone());
        }
        let payload = create_payload(&email, legacy.real_name.as_deref(), &self.defaults);
        let user = target.create_user(&payload)?;
        self.cache(user.clone());
        // Guard against the server normalizing the address differently.
        self.by_email.entry(email).or_insert_with(|| user.clone());
        Ok(user)
    }
}

/// Creation payload: configured defaults, the canonical email, and a
/// first/last split of the display name when one exists.
fn create_payload(email: &str, real_name: Option<&str>, defaults: &Map<String, Value>) -> Value {
    let mut payload = defaults.clone();
    payload.insert("email".into(), json!(email));
    if let Some(real_name) = real_name {
        let (first, last) = split_real_name(real_name);
        payload.insert("firstname".into(), json!(first));
        payload.insert("lastname".into(), json!(last));
    }
    Value::Object(payload)
}

/// Split a display name into `(first, last)`: `"Last, First"` on the
/// comma, otherwise `"First Last"` on the first whitespace run,
/// otherwise the whole string is the last name.
pub fn split_real_name(real_name: &str) -> (String, String) {
    if let Some((last, first)) = real_name.split_once(", ") {
        return (first.to_string(), last.to_string());
    }
    if let Some((first, last)) = real_name.split_once(char::is_whitespace) {
        return (first.to_string(), last.trim_start().to_string());
    }
    (String::new(), real_name.to_string())
}
