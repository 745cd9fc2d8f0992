//! Narration output
//!
//! The combat core narrates through a `NarrationSink`; delivering the text
//! to a client is someone else's job.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Combat,
    Info,
    System,
    Success,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Combat => "combat",
            Severity::Info => "info",
            Severity::System => "system",
            Severity::Success => "success",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

pub trait NarrationSink {
    fn send(&mut self, to: EntityId, severity: Severity, text: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub to: EntityId,
    pub severity: Severity,
    pub text: String,
}

/// In-memory sink; the default for tests and the demo binary
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    pub messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_entity(&self, id: EntityId) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter().filter(move |m| m.to == id)
    }

    pub fn last_for(&self, id: EntityId) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.to == id)
    }

    /// Did `id` receive any message containing `needle`?
    pub fn saw(&self, id: EntityId, needle: &str) -> bool {
        self.for_entity(id).any(|m| m.text.contains(needle))
    }

    pub fn drain(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl NarrationSink for MessageLog {
    fn send(&mut self, to: EntityId, severity: Severity, text: &str) {
        self.messages.push(Message {
            to,
            severity,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filters_by_recipient() {
        let a = EntityId::new();
        let b = EntityId::new();
        let mut log = MessageLog::new();
        log.send(a, Severity::Info, "hello a");
        log.send(b, Severity::Combat, "hello b");

        assert_eq!(log.for_entity(a).count(), 1);
        assert!(log.saw(b, "hello"));
        assert!(!log.saw(a, "hello b"));
        assert_eq!(log.last_for(b).map(|m| m.severity), Some(Severity::Combat));

        assert_eq!(log.drain().len(), 2);
        assert!(log.messages.is_empty());
    }
}
