use crate::error::StoreError;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A single dismissable error message shown to the user.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub timestamp: String,
    pub text: String,
}

/// Process-wide ordered list of user-facing error messages.
///
/// Ids come from a counter that only ever moves forward, so a dismissed
/// message never gives its id to a later one.
#[derive(Debug, Default)]
pub struct MessageLog {
    next_id: u64,
    messages: Vec<Notification>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its id.
    pub fn add(&mut self, text: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Notification {
            id,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            text: text.into(),
        });
        id
    }

    /// Dismiss a message by id.
    pub fn remove(&mut self, id: u64) -> Result<(), StoreError> {
        if !self.messages.iter().any(|m| m.id == id) {
            return Err(StoreError::Failed(format!(
                "Error message with given 'messageId' being '{id}' does not exist!"
            )));
        }
        self.messages.retain(|m| m.id != id);
        Ok(())
    }

    pub fn messages(&self) -> &[Notification] {
        &self.messages
    }
}

/// Shared handle passed to the stores so both can report failures.
#[derive(Clone, Default)]
pub struct Messages {
    inner: Arc<Mutex<MessageLog>>,
}

impl Messages {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, text: impl Into<String>) -> u64 {
        let text = text.into();
        tracing::warn!("{}", text);
        self.inner.lock().await.add(text)
    }

    pub async fn dismiss(&self, id: u64) -> Result<(), StoreError> {
        self.inner.lock().await.remove(id)
    }

    pub async fn snapshot(&self) -> Vec<Notification> {
        self.inner.lock().await.messages().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut log = MessageLog::new();
        let a = log.add("first");
        let b = log.add("second");
        assert_eq!((a, b), (0, 1));

        log.remove(b).expect("remove");
        let c = log.add("third");
        assert_eq!(c, 2);

        let ids: Vec<u64> = log.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn removing_unknown_id_fails() {
        let mut log = MessageLog::new();
        log.add("only");
        let err = log.remove(42).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error message with given 'messageId' being '42' does not exist!"
        );
        assert_eq!(log.messages().len(), 1);
    }

    #[test]
    fn messages_keep_insertion_order_and_timestamps() {
        let mut log = MessageLog::new();
        log.add("one");
        log.add("two");
        let texts: Vec<&str> = log.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        // RFC 3339 with a trailing Z, good enough to catch format drift.
        assert!(log.messages()[0].timestamp.ends_with('Z'));
        assert!(log.messages()[0].timestamp.contains('T'));
    }
}
