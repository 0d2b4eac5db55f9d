//! Response cache
//!
//! Best-effort, non-authoritative cache for single-shot responses. Losing it
//! changes performance, never behavior.

use scout_provider::Message;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// How much of each message body participates in the key.
const KEY_CONTENT_PREFIX: usize = 80;

pub struct ResponseCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    ttl: Duration,
    capacity: usize,
}

impl ResponseCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    /// Cache key from a truncated rendering of the message list.
    pub fn key_for(messages: &[Message]) -> String {
        messages
            .iter()
            .map(|m| {
                let content = m.text();
                let cut = content
                    .char_indices()
                    .nth(KEY_CONTENT_PREFIX)
                    .map(|(i, _)| i)
                    .unwrap_or(content.len());
                format!("{}:{}", m.role, &content[..cut])
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some((value, stored_at)) if stored_at.elapsed() <= self.ttl => {
                debug!("response cache hit");
                Some(value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: String, value: String) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.len() >= self.capacity {
            // wholesale eviction, same as the selector memo
            entries.clear();
        }
        entries.insert(key, (value, Instant::now()));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
