use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::lock;
use crate::types::{MessageId, PrincipalId};

/// Internal note between staff members.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub id: MessageId,
    pub sender: PrincipalId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Staff message board. Posting is not an audited action.
#[derive(Clone)]
pub struct Inbox {
    messages: Arc<RwLock<Vec<Message>>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Inbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inbox")
            .field("messages", &lock::read(&self.messages).len())
            .finish_non_exhaustive()
    }
}

impl Inbox {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
            clock,
        }
    }

    pub fn send(&self, sender: &PrincipalId, content: &str) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }
        let message = Message {
            id: MessageId::generate(),
            sender: sender.clone(),
            content: content.to_string(),
            created_at: self.clock.now(),
        };
        lock::write(&self.messages).push(message.clone());
        Ok(message)
    }

    /// Messages in the order they were sent.
    pub fn list(&self) -> Vec<Message> {
        lock::read(&self.messages).clone()
    }
}
