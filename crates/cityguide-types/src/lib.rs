//! Core types and traits for the City Guide agent orchestrator.
//!
//! This crate defines the shared data structures used by the memory store,
//! the agent runtime, and the orchestration kernel. It contains no business
//! logic; external capabilities (language model, business directory, cultural
//! archive, cache storage) are expressed as traits here and implemented by
//! collaborators.

pub mod agent;
pub mod cache;
pub mod collaborator;
pub mod config;
pub mod driver;
pub mod error;
pub mod message;
pub mod tool;
