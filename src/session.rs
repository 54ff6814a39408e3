//! Per-session trip slot storage.
//!
//! Sessions accumulate origin, destination, and date across turns. The store
//! is bounded: entries idle past the TTL are dropped on access, and when the
//! session cap is reached the least-recently-used entry is evicted. Each
//! session's read-modify-write runs under its own async mutex, so two
//! concurrent messages for the same session merge sequentially instead of
//! losing an update.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::extract::ExtractedSlots;

/// The three trip parameters collected before a search can run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TripSlots {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
}

impl TripSlots {
    pub fn is_complete(&self) -> bool {
        self.origin.is_some() && self.destination.is_some() && self.date.is_some()
    }

    /// A present extracted value overwrites the stored one; an absent value
    /// never clears it. There is no other way to forget a slot.
    fn merge(&mut self, update: &ExtractedSlots) {
        if let Some(origin) = &update.origin {
            self.origin = Some(origin.clone());
        }
        if let Some(destination) = &update.destination {
            self.destination = Some(destination.clone());
        }
        if let Some(date) = &update.date {
            self.date = Some(date.clone());
        }
    }
}

struct SessionEntry {
    slots: Arc<Mutex<TripSlots>>,
    last_seen: Instant,
}

pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Merge freshly extracted slots into the session, creating it if needed,
    /// and return the merged snapshot.
    pub async fn merge(&self, session: &str, update: &ExtractedSlots) -> TripSlots {
        let handle = {
            let mut sessions = self.sessions.lock().await;
            Self::evict_idle(&mut sessions, self.idle_ttl, session);

            let entry = sessions
                .entry(session.to_string())
                .or_insert_with(|| SessionEntry {
                    slots: Arc::new(Mutex::new(TripSlots::default())),
                    last_seen: Instant::now(),
                });
            entry.last_seen = Instant::now();
            let handle = entry.slots.clone();

            Self::evict_lru(&mut sessions, self.max_sessions, session);
            handle
        };

        let mut slots = handle.lock().await;
        slots.merge(update);
        slots.clone()
    }

    /// Current slots for a session without touching its recency, if it is
    /// still resident.
    pub async fn snapshot(&self, session: &str) -> Option<TripSlots> {
        let handle = {
            let sessions = self.sessions.lock().await;
            sessions.get(session).map(|entry| entry.slots.clone())
        }?;
        Some(handle.lock().await.clone())
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn evict_idle(sessions: &mut HashMap<String, SessionEntry>, ttl: Duration, current: &str) {
        let before = sessions.len();
        sessions.retain(|key, entry| key.as_str() == current || entry.last_seen.elapsed() <= ttl);
        let dropped = before - sessions.len();
        if dropped > 0 {
            debug!(dropped, "evicted idle sessions");
        }
    }

    fn evict_lru(sessions: &mut HashMap<String, SessionEntry>, max: usize, current: &str) {
        while sessions.len() > max {
            let oldest = sessions
                .iter()
                .filter(|(key, _)| key.as_str() != current)
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    debug!(session = %key, "evicted session at capacity");
                    sessions.remove(&key);
                }
                None => break,
            }
        }
    }
}
