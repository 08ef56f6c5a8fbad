use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{MigrateError, Result};

/// Starter configuration printed when no config file exists.
pub const TEMPLATE: &str = r#"{
  "zammad_host": "",
  "zammad_user": "",
  "zammad_password": "",
  "zammad_secure": true,
  "rt_url": "",
  "rt_user": "",
  "rt_pass": "",
  "rt_start": 1,
  "rt_end": 1000,
  "usermap": {},
  "userdata": {}
}
"#;

/// Migration run configuration, loaded once and immutable afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub zammad_host: String,
    pub zammad_user: String,
    pub zammad_password: String,
    pub zammad_secure: bool,
    /// REST 1.0 root of the legacy tracker, e.g. "https://rt.example.com/REST/1.0".
    pub rt_url: String,
    pub rt_user: String,
    pub rt_pass: String,
    /// First ticket ID to extract (inclusive).
    pub rt_start: u64,
    /// Upper bound of the ticket ID range (exclusive).
    pub rt_end: u64,
    /// Lowercased legacy email -> canonical email overrides.
    #[serde(default)]
    pub usermap: HashMap<String, String>,
    /// Default attributes merged into newly created target users.
    #[serde(default)]
    pub userdata: serde_json::Map<String, serde_json::Value>,
}

impl Config {
    /// Load the configuration from `path`. A missing file is reported as
    /// its own error variant so the caller can print the template and exit
    /// with the contractual status code.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MigrateError::ConfigMissing(path.to_path_buf()));
        }
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
