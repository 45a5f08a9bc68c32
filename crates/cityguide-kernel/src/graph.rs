//! Communication graph: which agent may forward a request to which.
//!
//! Built once at boot and read-only afterwards. Cycles are legal; the
//! orchestrator's hop limit is what bounds forwarding.

use cityguide_types::agent::{AgentId, FlowEdge};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Construction-time graph violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Entry agent '{0}' is not declared")]
    UnknownEntry(String),

    #[error("Flow {from} -> {to} references undeclared agent '{missing}'")]
    UndeclaredAgent {
        from: String,
        to: String,
        missing: String,
    },

    #[error("Agent '{0}' may not forward to itself")]
    SelfLoop(String),

    #[error("Agent '{0}' is declared more than once")]
    DuplicateAgent(String),

    #[error("Agent '{from}' hands off to '{to}' but no flow {from} -> {to} is declared")]
    MissingEdge { from: String, to: String },
}

/// Directed graph over declared agents with a distinguished entry agent.
#[derive(Debug, Clone)]
pub struct CommunicationGraph {
    entry: AgentId,
    agents: Vec<AgentId>,
    edges: HashMap<AgentId, Vec<AgentId>>,
}

impl CommunicationGraph {
    /// Validate and build the graph.
    ///
    /// Fails if an agent is declared twice, the entry agent is undeclared, a
    /// flow names an undeclared agent, or a flow points an agent at itself.
    /// Repeated flows are collapsed.
    pub fn new(
        agents: impl IntoIterator<Item = AgentId>,
        entry: AgentId,
        flows: &[FlowEdge],
    ) -> Result<Self, GraphError> {
        let mut declared = Vec::new();
        let mut seen = HashSet::new();
        for agent in agents {
            if !seen.insert(agent.clone()) {
                return Err(GraphError::DuplicateAgent(agent.0));
            }
            declared.push(agent);
        }

        if !seen.contains(&entry) {
            return Err(GraphError::UnknownEntry(entry.0));
        }

        let mut edges: HashMap<AgentId, Vec<AgentId>> = HashMap::new();
        for flow in flows {
            for name in [&flow.from, &flow.to] {
                if !seen.contains(name.as_str()) {
                    return Err(GraphError::UndeclaredAgent {
                        from: flow.from.clone(),
                        to: flow.to.clone(),
                        missing: name.clone(),
                    });
                }
            }
            if flow.from == flow.to {
                return Err(GraphError::SelfLoop(flow.from.clone()));
            }
            let targets = edges.entry(AgentId::new(flow.from.as_str())).or_default();
            let to = AgentId::new(flow.to.as_str());
            if !targets.contains(&to) {
                targets.push(to);
            }
        }

        Ok(Self {
            entry,
            agents: declared,
            edges,
        })
    }

    /// Whether `from` has an outgoing edge to `to`.
    pub fn can_forward(&self, from: &AgentId, to: &AgentId) -> bool {
        self.edges
            .get(from)
            .is_some_and(|targets| targets.contains(to))
    }

    /// The agent that receives every new message.
    pub fn entry_agent(&self) -> &AgentId {
        &self.entry
    }

    /// Outgoing neighbours of `from`, in flow declaration order.
    pub fn peers(&self, from: &AgentId) -> &[AgentId] {
        self.edges.get(from).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, agent: &AgentId) -> bool {
        self.agents.contains(agent)
    }

    /// Declared agents in declaration order.
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Agents reachable from the entry agent (entry included), breadth-first.
    pub fn reachable_from_entry(&self) -> Vec<AgentId> {
        let mut visited = vec![self.entry.clone()];
        let mut queue = VecDeque::from([self.entry.clone()]);
        while let Some(current) = queue.pop_front() {
            for peer in self.peers(&current) {
                if !visited.contains(peer) {
                    visited.push(peer.clone());
                    queue.push_back(peer.clone());
                }
            }
        }
        visited
    }
}
