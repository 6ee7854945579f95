//! Conversation data model
//!
//! Messages serialize camelCase so a persisted conversation round-trips with
//! the JSON the web clients exchange.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human user
    User,
    /// The assistant model
    Assistant,
}

/// Lifecycle state of the turn a message belongs to
///
/// An assistant message is mutated only while its own turn streams; once it
/// reaches `Complete` or `Error` it is frozen. Carrying the state explicitly
/// replaces the older trick of inferring "still streaming" from an empty
/// content field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    /// Placeholder created, stream not yet producing
    Pending,
    /// Stream in progress, content growing
    Streaming,
    /// Turn finished normally
    #[default]
    Complete,
    /// Turn terminated by a transport failure
    Error,
}

/// A web citation surfaced alongside an assistant response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Absolute URL; unique key within one assistant turn
    pub uri: String,
    /// Display text; the URL itself when the upstream candidate had no title
    pub title: String,
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Opaque message identifier
    pub id: Uuid,

    /// Message author
    pub role: Role,

    /// Message text; grows monotonically while an assistant turn streams
    pub content: String,

    /// Turn state; defaults to `Complete` for data persisted before the
    /// field existed
    #[serde(default)]
    pub status: TurnStatus,

    /// Deduplicated citations, in first-seen order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl Message {
    /// Create a finalized user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            status: TurnStatus::Complete,
            sources: Vec::new(),
        }
    }

    /// Create a finalized assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            status: TurnStatus::Complete,
            sources: Vec::new(),
        }
    }

    /// Create the empty placeholder an assistant turn streams into
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: String::new(),
            status: TurnStatus::Pending,
            sources: Vec::new(),
        }
    }

    /// Whether this message may no longer be mutated
    pub fn is_frozen(&self) -> bool {
        matches!(self.status, TurnStatus::Complete | TurnStatus::Error)
    }
}

/// An ordered, append-only sequence of messages owned by one user key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Opaque owner identifier (an email string in practice)
    pub user_key: String,

    /// Messages in turn order
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation for a user key
    pub fn new(user_key: impl Into<String>) -> Self {
        Self {
            user_key: user_key.into(),
            messages: Vec::new(),
        }
    }

    /// Create a conversation from previously stored messages
    pub fn with_messages(user_key: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            user_key: user_key.into(),
            messages,
        }
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation holds no messages yet
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_is_frozen() {
        let msg = Message::user("hello");
        assert_eq!(msg.role, Role::User);
        assert!(msg.is_frozen());
    }

    #[test]
    fn test_placeholder_is_mutable() {
        let msg = Message::assistant_placeholder();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.content.is_empty());
        assert_eq!(msg.status, TurnStatus::Pending);
        assert!(!msg.is_frozen());
    }

    #[test]
    fn test_message_serde_round_trip() {
        let mut msg = Message::assistant("**Hello**");
        msg.sources.push(Source {
            uri: "http://kenyalaw.org".to_string(),
            title: "Kenya Law".to_string(),
        });

        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_message_deserializes_without_status() {
        // Older persisted data carries only id/role/content.
        let json = format!(
            r#"{{"id":"{}","role":"user","content":"hi"}}"#,
            Uuid::new_v4()
        );
        let msg: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg.status, TurnStatus::Complete);
        assert!(msg.sources.is_empty());
    }

    #[test]
    fn test_conversation_round_trip() {
        let conversation = Conversation::with_messages(
            "user@example.com",
            vec![Message::user("hi"), Message::assistant("hello")],
        );
        let json = serde_json::to_string(&conversation).unwrap();
        assert!(json.contains("\"userKey\":\"user@example.com\""));
        let back: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, conversation);
    }
}
