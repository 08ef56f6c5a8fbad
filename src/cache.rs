use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};
use crate::model::{LegacyAttachment, LegacyUser, TicketRecord};

/// Current snapshot format. Bumped whenever the serialized shape changes
/// so a stale cache is rejected instead of silently misread.
pub const CACHE_VERSION: u32 = 1;

/// Everything extracted from the legacy tracker for one ID range.
///
/// Persisted to disk after extraction; when the cache file exists on a
/// later run it is trusted wholesale and extraction is skipped entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    /// Legacy users keyed by tracker username.
    pub users: BTreeMap<String, LegacyUser>,
    /// Every distinct queue name seen across the extracted tickets.
    pub queues: BTreeSet<String>,
    /// Tickets with history, in ascending extraction order.
    pub tickets: Vec<TicketRecord>,
    /// Attachment payloads keyed by tracker-wide attachment ID.
    pub attachments: BTreeMap<u64, LegacyAttachment>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self {
            version: CACHE_VERSION,
            created_at: Utc::now(),
            users: BTreeMap::new(),
            queues: BTreeSet::new(),
            tickets: Vec::new(),
            attachments: BTreeMap::new(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&data)?;
        if snapshot.version != CACHE_VERSION {
            return Err(MigrateError::CacheVersion {
                found: snapshot.version,
                expected: CACHE_VERSION,
            });
        }
        Ok(snapshot)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}
