//! Message, model-response, and session types for the conversation loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use advisor_core::{Language, WeatherSnapshot};

/// Name of the single capability offered to the model.
pub const WEATHER_TOOL: &str = "get_weather";

// =============================================================================
// Messages
// =============================================================================

/// One entry of a conversation, tagged by role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        /// Capability requests made alongside (or instead of) text.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
    },
    /// Result of executing a capability, linked to its request.
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// The role tag, e.g. `"assistant"`.
    pub fn role(&self) -> &'static str {
        match self {
            ChatMessage::System { .. } => "system",
            ChatMessage::User { .. } => "user",
            ChatMessage::Assistant { .. } => "assistant",
            ChatMessage::Tool { .. } => "tool",
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System { content }
            | ChatMessage::User { content }
            | ChatMessage::Assistant { content, .. }
            | ChatMessage::Tool { content, .. } => content,
        }
    }
}

/// A capability request issued by the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Provider-assigned call id, echoed back in the tool result.
    pub id: String,
    pub name: String,
    /// Parsed argument object, e.g. `{"location": "Tokyo"}`.
    pub arguments: serde_json::Value,
}

impl ToolInvocation {
    /// The `location` argument, if present and a string.
    pub fn location(&self) -> Option<&str> {
        self.arguments.get("location").and_then(|v| v.as_str())
    }
}

/// What the model returned for one completion call.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelResponse {
    /// A final natural-language answer.
    Text(String),
    /// The model wants one or more capabilities executed first.
    ToolRequest(Vec<ToolInvocation>),
}

// =============================================================================
// Sessions
// =============================================================================

/// Process-lifetime conversational state keyed by an opaque id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub id: String,
    /// User/assistant exchange history, oldest first.
    pub messages: Vec<ChatMessage>,
    pub last_weather: Option<WeatherSnapshot>,
    /// Fixed at creation; selects prompt templates.
    pub language: Language,
    pub created_at: DateTime<Utc>,
}

impl ConversationSession {
    /// A fresh session. A missing id gets a random UUID.
    pub fn new(id: Option<String>, language: Language) -> Self {
        Self {
            id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            messages: Vec::new(),
            last_weather: None,
            language,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_with_role_tag() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));

        let json = serde_json::to_value(ChatMessage::assistant("hello")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "assistant", "content": "hello"})
        );
    }

    #[test]
    fn test_tool_message_serialization() {
        let msg = ChatMessage::Tool {
            tool_call_id: "call_1".into(),
            name: WEATHER_TOOL.into(),
            content: "Weather in Tokyo".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
        let back: ChatMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_role_and_content_accessors() {
        let msg = ChatMessage::system("be brief");
        assert_eq!(msg.role(), "system");
        assert_eq!(msg.content(), "be brief");
    }

    #[test]
    fn test_invocation_location() {
        let call = ToolInvocation {
            id: "c".into(),
            name: WEATHER_TOOL.into(),
            arguments: serde_json::json!({"location": "Osaka"}),
        };
        assert_eq!(call.location(), Some("Osaka"));

        let call = ToolInvocation {
            arguments: serde_json::json!({}),
            ..call
        };
        assert_eq!(call.location(), None);
    }

    #[test]
    fn test_new_session() {
        let s = ConversationSession::new(None, Language::Ja);
        assert!(Uuid::parse_str(&s.id).is_ok());
        assert!(s.messages.is_empty());
        assert!(s.last_weather.is_none());
        assert_eq!(s.language, Language::Ja);

        let s = ConversationSession::new(Some("fixed".into()), Language::En);
        assert_eq!(s.id, "fixed");
    }
}
