//! Session state: conversation history and todos

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Default maximum number of messages kept in a session
pub const DEFAULT_MAX_MESSAGES: usize = 100;

/// A message in the session log.
///
/// Messages are append-only for the lifetime of the session; `extra` carries
/// auxiliary records such as the reasoning chain behind an assistant answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role: user, assistant, system, tool
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Local>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A tracked task item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub text: String,
    pub done: bool,
}

/// A conversation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub todos: Vec<Todo>,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

fn default_max_messages() -> usize {
    DEFAULT_MAX_MESSAGES
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_max_messages(id, DEFAULT_MAX_MESSAGES)
    }

    pub fn with_max_messages(id: impl Into<String>, max_messages: usize) -> Self {
        let now = Local::now();
        Self {
            id: id.into(),
            messages: Vec::new(),
            todos: Vec::new(),
            created_at: now,
            updated_at: now,
            max_messages,
        }
    }

    /// Append a message.
    pub fn add_message(&mut self, role: impl Into<String>, content: impl Into<String>) {
        self.push(Message {
            role: role.into(),
            content: content.into(),
            timestamp: Local::now(),
            extra: HashMap::new(),
        });
    }

    /// Append a message carrying extra metadata (reasoning chain, step count).
    pub fn add_message_with_extra(
        &mut self,
        role: impl Into<String>,
        content: impl Into<String>,
        extra: HashMap<String, serde_json::Value>,
    ) {
        self.push(Message {
            role: role.into(),
            content: content.into(),
            timestamp: Local::now(),
            extra,
        });
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Local::now();
        self.enforce_max_messages();
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn enforce_max_messages(&mut self) {
        if self.messages.len() > self.max_messages {
            let to_remove = self.messages.len() - self.max_messages;
            self.messages.drain(0..to_remove);
            debug!(
                "session {} truncated to {} messages",
                self.id,
                self.messages.len()
            );
        }
    }

    /// Last `max_messages` messages converted for the model backend.
    pub fn get_history(&self, max_messages: usize) -> Vec<scout_provider::Message> {
        self.messages
            .iter()
            .skip(self.messages.len().saturating_sub(max_messages))
            .map(|m| scout_provider::Message {
                role: m.role.clone(),
                content: Some(m.content.clone()),
                tool_calls: None,
                tool_call_id: None,
                name: None,
            })
            .collect()
    }

    /// Add a todo; returns its id.
    pub fn add_todo(&mut self, text: impl Into<String>) -> String {
        let id = Uuid::new_v4().to_string();
        self.todos.push(Todo {
            id: id.clone(),
            text: text.into(),
            done: false,
        });
        self.updated_at = Local::now();
        id
    }

    /// Mark a todo done; false when the id is unknown.
    pub fn complete_todo(&mut self, id: &str) -> bool {
        match self.todos.iter_mut().find(|t| t.id == id) {
            Some(todo) => {
                todo.done = true;
                self.updated_at = Local::now();
                true
            }
            None => false,
        }
    }

    pub fn open_todos(&self) -> Vec<&Todo> {
        self.todos.iter().filter(|t| !t.done).collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.todos.clear();
        self.updated_at = Local::now();
    }
}

/// Loads, caches and persists sessions as JSON files.
pub struct SessionManager {
    sessions_dir: PathBuf,
    cache: HashMap<String, Session>,
    max_messages: usize,
}

impl SessionManager {
    pub fn new(sessions_dir: impl AsRef<Path>) -> Self {
        Self::with_max_messages(sessions_dir, DEFAULT_MAX_MESSAGES)
    }

    pub fn with_max_messages(sessions_dir: impl AsRef<Path>, max_messages: usize) -> Self {
        let sessions_dir = sessions_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&sessions_dir).ok();

        Self {
            sessions_dir,
            cache: HashMap::new(),
            max_messages,
        }
    }

    /// Get a cached session, loading from disk or creating as needed.
    pub async fn get_or_create(&mut self, id: &str) -> &mut Session {
        if !self.cache.contains_key(id) {
            let session = self
                .load(id)
                .await
                .unwrap_or_else(|| Session::with_max_messages(id, self.max_messages));
            self.cache.insert(id.to_string(), session);
        }
        self.cache.get_mut(id).expect("session just inserted")
    }

    pub async fn save(&self, session: &Session) -> std::io::Result<()> {
        let path = self.session_path(&session.id);
        let content = serde_json::to_string_pretty(session)?;
        tokio::fs::write(path, content).await?;
        debug!("saved session {}", session.id);
        Ok(())
    }

    async fn load(&self, id: &str) -> Option<Session> {
        let path = self.session_path(id);
        if !path.exists() {
            return None;
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("failed to read session {}: {}", id, e);
                return None;
            }
        };

        match serde_json::from_str::<Session>(&content) {
            Ok(mut session) => {
                if session.max_messages != self.max_messages {
                    session.max_messages = self.max_messages;
                    session.enforce_max_messages();
                }
                debug!("loaded session {}", id);
                Some(session)
            }
            Err(e) => {
                warn!("failed to parse session {}: {}", id, e);
                None
            }
        }
    }

    fn session_path(&self, id: &str) -> PathBuf {
        let safe = id.replace([':', '/'], "_");
        self.sessions_dir.join(format!("{}.json", safe))
    }

    pub async fn delete(&mut self, id: &str) -> std::io::Result<bool> {
        self.cache.remove(id);
        let path = self.session_path(id);
        if path.exists() {
            tokio::fs::remove_file(path).await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub async fn list(&self) -> Vec<String> {
        let mut ids = Vec::new();

        if let Ok(mut entries) = tokio::fs::read_dir(&self.sessions_dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                if let Some(name) = entry.file_name().to_str() {
                    if let Some(stripped) = name.strip_suffix(".json") {
                        ids.push(stripped.to_string());
                    }
                }
            }
        }

        ids
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }
}
