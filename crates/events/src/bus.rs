//! In-process fan-out of domain events over a `tokio::sync::broadcast`
//! channel.
//!
//! Handlers publish what happened (logins, account changes, ad mutations)
//! and move on; subscribers such as [`AuditLog`](crate::audit::AuditLog)
//! consume at their own pace. A subscriber that falls more than the channel
//! capacity behind loses the oldest events and sees `RecvError::Lagged`.

use chrono::{DateTime, Utc};
use classifieds_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 1024;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "identity.login")]
    Login,
    #[serde(rename = "identity.logout")]
    Logout,
    #[serde(rename = "account.registered")]
    Registered,
    #[serde(rename = "account.verified")]
    Verified,
    #[serde(rename = "account.password_changed")]
    PasswordChanged,
    #[serde(rename = "user.created")]
    UserCreated,
    #[serde(rename = "user.updated")]
    UserUpdated,
    #[serde(rename = "user.role_changed")]
    RoleChanged,
    #[serde(rename = "user.deleted")]
    UserDeleted,
    #[serde(rename = "ad.created")]
    AdCreated,
    #[serde(rename = "ad.updated")]
    AdUpdated,
    #[serde(rename = "ad.deleted")]
    AdDeleted,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "identity.login",
            Self::Logout => "identity.logout",
            Self::Registered => "account.registered",
            Self::Verified => "account.verified",
            Self::PasswordChanged => "account.password_changed",
            Self::UserCreated => "user.created",
            Self::UserUpdated => "user.updated",
            Self::RoleChanged => "user.role_changed",
            Self::UserDeleted => "user.deleted",
            Self::AdCreated => "ad.created",
            Self::AdUpdated => "ad.updated",
            Self::AdDeleted => "ad.deleted",
        }
    }
}

/// The record an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Subject {
    User(DbId),
    Ad(DbId),
}

impl Subject {
    pub fn kind(self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Ad(_) => "ad",
        }
    }

    pub fn id(self) -> DbId {
        match self {
            Self::User(id) | Self::Ad(id) => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub kind: EventKind,
    pub subject: Subject,
    /// User whose request caused the event.
    pub actor: Option<DbId>,
    /// Kind-specific extras, e.g. `{"remember": true}` on a login.
    pub detail: serde_json::Value,
    pub at: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(kind: EventKind, subject: Subject) -> Self {
        Self {
            kind,
            subject,
            actor: None,
            detail: serde_json::Value::Null,
            at: Utc::now(),
        }
    }

    pub fn by(mut self, user_id: DbId) -> Self {
        self.actor = Some(user_id);
        self
    }

    pub fn detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }
}

/// Shared as `Arc<EventBus>` in the application state.
///
/// ```rust
/// use classifieds_events::bus::{DomainEvent, EventBus, EventKind, Subject};
///
/// let bus = EventBus::default();
/// let _rx = bus.subscribe();
/// bus.publish(DomainEvent::new(EventKind::Login, Subject::User(1)).by(1));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Fire and forget. Events published with no subscriber are dropped.
    pub fn publish(&self, event: DomainEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_each_receive_the_event() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(
            DomainEvent::new(EventKind::Login, Subject::User(42))
                .by(42)
                .detail(serde_json::json!({ "remember": true })),
        );

        let event = first.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::Login);
        assert_eq!(event.subject, Subject::User(42));
        assert_eq!(event.actor, Some(42));
        assert_eq!(event.detail["remember"], true);
        assert_eq!(second.recv().await.unwrap().kind, EventKind::Login);
    }

    #[test]
    fn publishing_into_the_void_is_fine() {
        EventBus::default().publish(DomainEvent::new(EventKind::AdDeleted, Subject::Ad(1)));
    }

    #[test]
    fn wire_names_match_as_str() {
        for kind in [EventKind::Login, EventKind::RoleChanged, EventKind::AdUpdated] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
        let subject = serde_json::to_value(Subject::Ad(7)).unwrap();
        assert_eq!(subject, serde_json::json!({ "type": "ad", "id": 7 }));
    }
}
