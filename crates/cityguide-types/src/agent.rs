//! Agent identity and manifest types.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique agent identifier. Agents are addressed by their display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    /// Create an identifier from an agent name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The agent name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for AgentId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for AgentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Default model-invocation parameters for an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Model name passed to the driver.
    pub model: String,
    /// Response-length cap in tokens.
    pub max_tokens: u32,
    /// Randomness level.
    pub temperature: f32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Declarative agent definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentManifest {
    /// Unique agent name.
    pub name: String,
    /// One-line description of the agent's responsibility.
    #[serde(default)]
    pub description: String,
    /// Instruction profile handed to the model as the system prompt.
    #[serde(default)]
    pub instructions: String,
    /// Names of the tools this agent may call, in catalogue order.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Peers this agent intends to hand off to. Each one needs a flow edge.
    /// When empty, every outgoing edge in the communication graph is offered.
    #[serde(default)]
    pub handoffs: Vec<String>,
    /// Model-invocation defaults.
    #[serde(default)]
    pub model: ModelParams,
}

impl AgentManifest {
    /// The identifier derived from the manifest name.
    pub fn id(&self) -> AgentId {
        AgentId::new(self.name.clone())
    }
}

/// Directed permission for `from` to forward a request to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
}

impl FlowEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}
