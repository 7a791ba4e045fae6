// src/models/event.rs

use serde::{Deserialize, Serialize};

/// Chat/conversation identifier assigned by the transport.
pub type ConversationId = i64;

/// The account that sent a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: i64,
    /// Account handle, if the platform provides one.
    #[serde(default)]
    pub username: Option<String>,
}

impl Caller {
    /// Identity used by the duplicate guard: the handle, or `id_<id>`.
    pub fn resolved_username(&self) -> String {
        match self.username.as_deref().map(str::trim) {
            Some(handle) if !handle.is_empty() => handle.to_string(),
            _ => format!("id_{}", self.id),
        }
    }
}

/// An inbound message, already attributed by the transport adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub conversation_id: ConversationId,
    pub caller: Caller,
    pub is_operator: bool,
    pub text: String,
}

/// Keyboard hint; the transport decides how to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuHint {
    MainMenu,
    BackOnly,
    TestList {
        with_delete_marker: bool,
        labels: Vec<String>,
    },
}

/// What the transport should do in response to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outbound {
    Message {
        conversation_id: ConversationId,
        text: String,
        menu: Option<MenuHint>,
    },
    NotifyOperators {
        recipients: Vec<i64>,
        text: String,
    },
    Noop,
}

impl Outbound {
    pub fn message(conversation_id: ConversationId, text: impl Into<String>) -> Self {
        Outbound::Message {
            conversation_id,
            text: text.into(),
            menu: None,
        }
    }

    pub fn with_menu(conversation_id: ConversationId, text: impl Into<String>, menu: MenuHint) -> Self {
        Outbound::Message {
            conversation_id,
            text: text.into(),
            menu: Some(menu),
        }
    }
}
