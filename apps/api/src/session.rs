//! Per-upload session state carried from `/process` to `/generate_resume_html`.
//!
//! Each upload gets its own entry keyed by a random id that the client echoes
//! back. Entries expire after a TTL and are evicted lazily on access and insert.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct SessionEntry {
    raw_text: String,
    created_at: DateTime<Utc>,
}

/// Shared, cloneable handle to the session map.
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Stores the extracted text and returns the new session id.
    pub async fn create(&self, raw_text: String) -> Uuid {
        self.create_at(raw_text, Utc::now()).await
    }

    /// Extracted text for a live session, or `None` if unknown or expired.
    pub async fn raw_text(&self, id: Uuid) -> Option<String> {
        self.raw_text_at(id, Utc::now()).await
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn create_at(&self, raw_text: String, now: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        let mut entries = self.entries.write().await;

        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!("Evicted {evicted} expired sessions");
        }

        entries.insert(
            id,
            SessionEntry {
                raw_text,
                created_at: now,
            },
        );
        id
    }

    async fn raw_text_at(&self, id: Uuid, now: DateTime<Utc>) -> Option<String> {
        {
            let entries = self.entries.read().await;
            match entries.get(&id) {
                Some(entry) if !self.is_expired(entry, now) => {
                    return Some(entry.raw_text.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        self.entries.write().await.remove(&id);
        None
    }

    fn is_expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.created_at >= self.ttl
    }
}
