//! Mode selector
//!
//! Decides, per user message, whether the reasoning loop is engaged or a
//! single-shot request suffices. Pure function of the message text, memoized
//! per normalized text in a bounded instance-owned map.

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use tracing::debug;

/// Default memo capacity; cleared wholesale when exceeded.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

const ACTION_VERBS: &[&str] = &[
    "analyze", "search", "find", "look", "debug", "implement", "refactor", "create", "build",
    "fix", "run", "execute", "install", "list", "modify", "update", "delete", "remove", "rename",
    "move", "write", "edit", "read", "check", "test", "grep", "compile", "generate", "show",
];

const SUBJECT_NOUNS: &[&str] = &[
    "file", "files", "code", "project", "directory", "folder", "function", "class", "module",
    "test", "tests", "bug", "error", "repo", "repository", "script", "dependency", "config",
    "command", "output", "log", "logs",
];

const COMPLEX_PHRASES: &[&str] = &[
    "step by step",
    "one by one",
    "and then",
    "after that",
    "make sure",
    "for each",
    "all of the",
];

/// Greetings and small talk that stay single-shot regardless of other signals.
const SIMPLE_PATTERNS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "yo",
    "thanks",
    "thank you",
    "good morning",
    "good evening",
    "good night",
    "how are you",
    "who are you",
    "what can you do",
];

fn call_syntax_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z_][a-z0-9_]*\s*\([^)]*\)").expect("static regex"))
}

/// Classifies messages as multi-step (reasoning loop) or single-shot.
pub struct ModeSelector {
    cache: Mutex<HashMap<String, bool>>,
    capacity: usize,
}

impl ModeSelector {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// True when the message needs the reasoning loop.
    ///
    /// Identical input text yields the identical decision within one process
    /// lifetime; the memo is purely a shortcut.
    pub fn needs_multi_step(&self, message: &str) -> bool {
        let normalized = message.trim().to_lowercase();

        if let Ok(cache) = self.cache.lock() {
            if let Some(&decision) = cache.get(&normalized) {
                return decision;
            }
        }

        let decision = classify(&normalized);
        debug!(multi_step = decision, "mode selected");

        if let Ok(mut cache) = self.cache.lock() {
            // approximate eviction: drop everything rather than tracking
            // recency
            if cache.len() >= self.capacity {
                cache.clear();
            }
            cache.insert(normalized, decision);
        }

        decision
    }
}

impl Default for ModeSelector {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

/// The decision function proper. Input is already trimmed and lowercased.
fn classify(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    // denylist wins over everything
    if SIMPLE_PATTERNS.iter().any(|p| {
        text == *p
            || text.strip_prefix(p).is_some_and(|rest| {
                rest.chars().all(|c| c.is_whitespace() || c == '!' || c == '?' || c == '.' || c == ',')
            })
    }) {
        return false;
    }

    let words: Vec<&str> = text.split_whitespace().collect();

    // short bare fact questions stay single-shot
    if text.ends_with('?')
        && words.len() < 8
        && !SUBJECT_NOUNS.iter().any(|n| words.contains(n))
    {
        return false;
    }

    // explicit tool-call syntax
    if call_syntax_regex().is_match(text) {
        return true;
    }

    if COMPLEX_PHRASES.iter().any(|p| text.contains(p)) {
        return true;
    }

    let has_verb = ACTION_VERBS.iter().any(|v| words.contains(v));
    let has_noun = SUBJECT_NOUNS.iter().any(|n| words.contains(n));
    if has_verb && has_noun {
        return true;
    }

    // long, involved requests get the loop even without keyword hits
    if words.len() > 40 && has_verb {
        return true;
    }

    false
}
