//! The language-model capability consumed by agents.
//!
//! Inference itself is an external collaborator: agents only see
//! `generate(request) -> text`. Drivers are expected to tell the model how
//! to ask for actions: a line `[[tool:NAME]] {json}` calls one of
//! `request.tools`, and a `[[handoff:AGENT]]` tag passes the request to one
//! of `request.handoff_targets`.

use crate::agent::{AgentId, ModelParams};
use crate::tool::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for model invocations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DriverError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Empty response from model")]
    EmptyResponse,
}

/// Everything the model needs for one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Agent issuing the request.
    pub agent: AgentId,
    /// Model-invocation parameters from the agent manifest.
    pub model: ModelParams,
    /// Instruction profile.
    pub system: String,
    /// The (possibly augmented) user message.
    pub prompt: String,
    /// Tools the agent may call.
    pub tools: Vec<ToolDefinition>,
    /// Peers the agent may hand the request to.
    pub handoff_targets: Vec<AgentId>,
    /// Results of tool calls made earlier in this turn.
    pub tool_results: Vec<ToolResult>,
    /// Zero-based generation round within the turn.
    pub round: u32,
}

/// Trait for text generation.
#[async_trait]
pub trait LlmDriver: Send + Sync {
    /// Generate a reply for the request.
    async fn generate(&self, request: CompletionRequest) -> Result<String, DriverError>;
}
