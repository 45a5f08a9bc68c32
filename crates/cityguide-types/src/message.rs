//! Wire shapes for chat front ends (HTTP, CLI, UI).

use serde::{Deserialize, Serialize};

/// Conversation id reported when the caller does not supply one.
pub const DEFAULT_CONVERSATION_ID: &str = "default";

/// Incoming chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Response returned to the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    /// Name of the agent that produced the final answer.
    pub agent_used: String,
}
