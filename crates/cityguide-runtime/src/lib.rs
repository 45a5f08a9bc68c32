//! Agent execution for City Guide.
//!
//! An [`agent::Agent`] turns one incoming message into either an answer or a
//! request to forward the message to a peer. Tool calls go through the
//! [`tool_runner::ToolInvoker`]; finished answers are memoised by the
//! [`response_cache::ResponseCache`].

pub mod agent;
pub mod directives;
pub mod response_cache;
pub mod tool_runner;
pub mod tools;
