// web-server/src/message_store.rs
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the visitor was asking about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inquiry {
    #[default]
    Contact,
    Property { property_id: u64 },
    HomeLoan {
        #[serde(default)]
        loan_amount: Option<u64>,
    },
}

/// Inbound message from the public site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub inquiry: Inquiry,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    #[serde(default)]
    pub inquiry: Inquiry,
}

impl NewMessage {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Name is required");
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err("A valid email address is required");
        }
        if self.message.trim().is_empty() {
            return Err("Message is required");
        }
        Ok(())
    }
}

/// Inbox the admin back-office reads from
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: DashMap<Uuid, ContactMessage>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&self, new: NewMessage) -> ContactMessage {
        let message = ContactMessage {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            email: new.email.trim().to_string(),
            phone: new.phone.filter(|phone| !phone.trim().is_empty()),
            message: new.message,
            inquiry: new.inquiry,
            is_read: false,
            created_at: Utc::now(),
        };
        self.messages.insert(message.id, message.clone());
        message
    }

    /// Newest first
    pub fn list(&self) -> Vec<ContactMessage> {
        let mut messages: Vec<ContactMessage> =
            self.messages.iter().map(|entry| entry.value().clone()).collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        messages
    }

    pub fn get(&self, id: Uuid) -> Option<ContactMessage> {
        self.messages.get(&id).map(|entry| entry.value().clone())
    }

    pub fn mark_read(&self, id: Uuid) -> Option<ContactMessage> {
        self.messages.get_mut(&id).map(|mut entry| {
            entry.is_read = true;
            entry.value().clone()
        })
    }

    pub fn delete(&self, id: Uuid) -> bool {
        self.messages.remove(&id).is_some()
    }
}
