//! Orchestration kernel for City Guide.
//!
//! The kernel validates the agency (agents, tools, communication graph) at
//! boot and then routes each incoming message through the response cache and
//! the agent chain.

pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod orchestrator;

pub use error::{KernelError, KernelResult};
pub use graph::{CommunicationGraph, GraphError};
pub use orchestrator::{HandleOutcome, HandoffRecord, Orchestrator};
