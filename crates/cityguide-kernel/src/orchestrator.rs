//! The orchestrator: cache lookup, agent dispatch, and the hand-off loop.
//!
//! Every agent, tool binding and graph edge is validated when the
//! orchestrator is built. Request handling never fails for configuration
//! reasons; the only per-request error is an empty message.

use crate::error::{KernelError, KernelResult};
use crate::graph::{CommunicationGraph, GraphError};
use cityguide_memory::SqliteCacheStore;
use cityguide_runtime::agent::{Agent, AgentStep};
use cityguide_runtime::response_cache::{fingerprint, ResponseCache};
use cityguide_runtime::tool_runner::ToolRegistry;
use cityguide_types::agent::AgentId;
use cityguide_types::cache::CachedResponse;
use cityguide_types::config::{CacheConfig, CityGuideConfig};
use cityguide_types::driver::LlmDriver;
use cityguide_types::error::CityGuideError;
use cityguide_types::message::{ChatRequest, ChatResponse, DEFAULT_CONVERSATION_ID};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Response returned when a request is forwarded more than `max_hops` times.
pub const HOP_LIMIT_RESPONSE: &str =
    "I'm sorry, I couldn't complete this request: it was handed between agents too many times.";

const UNAVAILABLE_RESPONSE: &str = "I'm sorry, I couldn't complete this request right now.";

/// One attempted hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRecord {
    pub from: AgentId,
    pub to: AgentId,
    /// False when no flow edge allowed it.
    pub accepted: bool,
}

/// Result of [`Orchestrator::handle`].
#[derive(Debug, Clone, PartialEq)]
pub struct HandleOutcome {
    pub response: String,
    /// Agent that produced the response. For a cache hit, the agent that
    /// produced the cached response.
    pub terminal_agent: String,
    pub conversation_id: String,
    pub from_cache: bool,
    /// Accepted hand-offs.
    pub hops: u32,
    /// The response is incomplete: a model or tool failure, a rejected
    /// hand-off, or the hop limit.
    pub degraded: bool,
    pub handoffs: Vec<HandoffRecord>,
}

/// Routes messages through the response cache and the agent chain.
pub struct Orchestrator {
    agents: HashMap<AgentId, Arc<Agent>>,
    graph: CommunicationGraph,
    cache: Arc<ResponseCache>,
    max_hops: u32,
}

impl Orchestrator {
    /// Build and validate the agency.
    ///
    /// Fails if agent names repeat, the entry agent or a flow endpoint is
    /// undeclared, a flow is a self-loop, a manifest hand-off has no flow
    /// edge, or a manifest tool is not registered.
    pub fn new(
        config: &CityGuideConfig,
        driver: Arc<dyn LlmDriver>,
        tools: &ToolRegistry,
        cache: Arc<ResponseCache>,
    ) -> KernelResult<Self> {
        if config.agents.is_empty() {
            return Err(KernelError::BootFailed("no agents declared".to_string()));
        }

        let graph = CommunicationGraph::new(
            config.agents.iter().map(|m| m.id()),
            AgentId::new(config.entry_agent.as_str()),
            &config.flows,
        )?;

        let mut agents = HashMap::with_capacity(config.agents.len());
        for manifest in &config.agents {
            let id = manifest.id();
            let handoff_targets = if manifest.handoffs.is_empty() {
                graph.peers(&id).to_vec()
            } else {
                let mut targets = Vec::with_capacity(manifest.handoffs.len());
                for name in &manifest.handoffs {
                    let target = AgentId::new(name.as_str());
                    if !graph.contains(&target) {
                        return Err(CityGuideError::AgentNotFound(name.clone()).into());
                    }
                    if !graph.can_forward(&id, &target) {
                        return Err(GraphError::MissingEdge {
                            from: manifest.name.clone(),
                            to: name.clone(),
                        }
                        .into());
                    }
                    targets.push(target);
                }
                targets
            };
            let invoker = tools.invoker_for(&manifest.tools)?;
            let agent = Agent::new(
                manifest.clone(),
                invoker,
                handoff_targets,
                Arc::clone(&driver),
                config.max_tool_rounds,
            );
            agents.insert(id, Arc::new(agent));
        }

        let reachable = graph.reachable_from_entry();
        for id in graph.agents() {
            if !reachable.contains(id) {
                warn!(agent = %id, "Agent is not reachable from the entry agent");
            }
        }

        info!(
            agents = agents.len(),
            flows = config.flows.len(),
            entry = %graph.entry_agent(),
            max_hops = config.max_hops,
            cache_ttl_secs = cache.ttl().as_secs(),
            "Orchestrator ready"
        );

        Ok(Self {
            agents,
            graph,
            cache,
            max_hops: config.max_hops,
        })
    }

    /// Open the configured cache storage, then build the agency.
    pub fn boot(
        config: &CityGuideConfig,
        driver: Arc<dyn LlmDriver>,
        tools: &ToolRegistry,
    ) -> KernelResult<Self> {
        let cache = open_cache(&config.cache);
        Self::new(config, driver, tools, cache)
    }

    pub fn graph(&self) -> &CommunicationGraph {
        &self.graph
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn agent(&self, id: &str) -> Option<&Arc<Agent>> {
        self.agents.get(id)
    }

    pub fn max_hops(&self) -> u32 {
        self.max_hops
    }

    /// Answer `message`.
    ///
    /// Served from the response cache when an unexpired entry exists;
    /// otherwise the entry agent runs and the request follows hand-offs
    /// until some agent answers. Dropping the returned future stops further
    /// hops.
    pub async fn handle(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> KernelResult<HandleOutcome> {
        let conversation_id = session_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CONVERSATION_ID)
            .to_string();
        if message.trim().is_empty() {
            return Err(CityGuideError::InvalidInput("message must not be empty".to_string()).into());
        }

        let span = info_span!(
            "handle",
            request_id = %Uuid::new_v4(),
            conversation_id = %conversation_id
        );
        Ok(self.dispatch(message, conversation_id).instrument(span).await)
    }

    /// Wire-shaped adapter for chat front ends.
    pub async fn chat(&self, request: ChatRequest) -> KernelResult<ChatResponse> {
        let outcome = self
            .handle(&request.message, request.conversation_id.as_deref())
            .await?;
        Ok(ChatResponse {
            response: outcome.response,
            conversation_id: outcome.conversation_id,
            agent_used: outcome.terminal_agent,
        })
    }

    /// Drop expired cache entries, then flush the rest to storage.
    pub fn shutdown(&self) {
        let evicted = self.cache.evict_expired();
        let written = self.cache.flush();
        info!(evicted, written, "Orchestrator shut down");
    }

    async fn dispatch(&self, message: &str, conversation_id: String) -> HandleOutcome {
        let key = fingerprint(message);
        if let Some(hit) = self.cache.get(&key) {
            debug!(fingerprint = %key, agent = %hit.terminal_agent, "Cache hit");
            return HandleOutcome {
                response: hit.response,
                terminal_agent: hit.terminal_agent,
                conversation_id,
                from_cache: true,
                hops: 0,
                degraded: false,
                handoffs: Vec::new(),
            };
        }
        debug!(fingerprint = %key, "Cache miss");

        let mut current = self.graph.entry_agent().clone();
        let mut prompt = message.to_string();
        let mut hops = 0u32;
        let mut degraded = false;
        let mut handoffs = Vec::new();

        loop {
            // Every graph node has an agent; checked in `new`.
            let Some(agent) = self.agents.get(&current) else {
                warn!(agent = %current, "Dispatch target has no agent");
                return HandleOutcome {
                    response: UNAVAILABLE_RESPONSE.to_string(),
                    terminal_agent: current.0,
                    conversation_id,
                    from_cache: false,
                    hops,
                    degraded: true,
                    handoffs,
                };
            };

            let turn = agent.run_turn(&prompt).await;
            degraded |= turn.degraded;

            let (target, findings, forwarded) = match turn.step {
                AgentStep::Answer(response) => {
                    if degraded {
                        warn!(agent = %current, hops, "Degraded answer, not cached");
                    } else {
                        self.cache.put(
                            key,
                            CachedResponse::new(response.clone(), current.as_str()),
                        );
                    }
                    info!(agent = %current, hops, degraded, "Request complete");
                    return HandleOutcome {
                        response,
                        terminal_agent: current.0,
                        conversation_id,
                        from_cache: false,
                        hops,
                        degraded,
                        handoffs,
                    };
                }
                AgentStep::Forward {
                    target,
                    findings,
                    message,
                } => (target, findings, message),
            };

            if !self.graph.can_forward(&current, &target) {
                warn!(from = %current, to = %target, "Rejected hand-off without a flow edge");
                let response = rejected_response(&current, &target, &findings);
                handoffs.push(HandoffRecord {
                    from: current.clone(),
                    to: target,
                    accepted: false,
                });
                return HandleOutcome {
                    response,
                    terminal_agent: current.0,
                    conversation_id,
                    from_cache: false,
                    hops,
                    degraded: true,
                    handoffs,
                };
            }

            if hops >= self.max_hops {
                warn!(agent = %current, hops, max_hops = self.max_hops, "Hop limit exceeded");
                return HandleOutcome {
                    response: HOP_LIMIT_RESPONSE.to_string(),
                    terminal_agent: current.0,
                    conversation_id,
                    from_cache: false,
                    hops,
                    degraded: true,
                    handoffs,
                };
            }

            hops += 1;
            debug!(from = %current, to = %target, hop = hops, "Hand-off");
            handoffs.push(HandoffRecord {
                from: current,
                to: target.clone(),
                accepted: true,
            });
            current = target;
            prompt = forwarded;
        }
    }
}

/// Build the response cache described by `config`.
///
/// An unreadable cache file is moved aside to `<path>.corrupt` and replaced
/// by a fresh one. Storage that still cannot be opened leaves a memory-only
/// cache.
pub fn open_cache(config: &CacheConfig) -> Arc<ResponseCache> {
    let ttl = if config.enabled {
        config.ttl()
    } else {
        Duration::ZERO
    };
    if ttl.is_zero() {
        info!("Response cache disabled");
        return Arc::new(ResponseCache::new(ttl));
    }
    let Some(path) = &config.path else {
        return Arc::new(ResponseCache::new(ttl));
    };
    let store = match SqliteCacheStore::open(path) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to open response cache storage");
            reopen_fresh(path)
        }
    };
    match store {
        Some(store) => Arc::new(ResponseCache::with_store(ttl, Arc::new(store))),
        None => {
            warn!(path = %path.display(), "Response cache continuing in memory only");
            Arc::new(ResponseCache::new(ttl))
        }
    }
}

/// Move an unreadable cache file aside and create an empty store in its place.
fn reopen_fresh(path: &Path) -> Option<SqliteCacheStore> {
    if !path.is_file() {
        return None;
    }
    let aside = corrupt_path(path);
    if let Err(e) = std::fs::rename(path, &aside) {
        warn!(path = %path.display(), error = %e, "Failed to move unreadable cache file aside");
        return None;
    }
    warn!(
        path = %path.display(),
        moved_to = %aside.display(),
        "Moved unreadable response cache aside"
    );
    match SqliteCacheStore::open(path) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to recreate response cache storage");
            None
        }
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    PathBuf::from(name)
}

fn rejected_response(from: &AgentId, to: &AgentId, findings: &str) -> String {
    let notice = format!("Note: {from} is not permitted to hand this request to {to}.");
    if findings.trim().is_empty() {
        notice
    } else {
        format!("{findings}\n\n{notice}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_response_text() {
        let from = AgentId::new("Itinerary Planner");
        let to = AgentId::new("Cultural Curator");
        assert_eq!(
            rejected_response(&from, &to, ""),
            "Note: Itinerary Planner is not permitted to hand this request to Cultural Curator."
        );
        assert!(rejected_response(&from, &to, "Day 1: museum").starts_with("Day 1: museum\n\n"));
    }

    #[test]
    fn test_open_cache_disabled() {
        let cache = open_cache(&CacheConfig {
            enabled: false,
            ttl_secs: 3600,
            path: None,
        });
        assert!(cache.is_disabled());
    }

    fn persistent(path: PathBuf) -> CacheConfig {
        CacheConfig {
            enabled: true,
            ttl_secs: 60,
            path: Some(path),
        }
    }

    #[test]
    fn test_open_cache_corrupt_file_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("response_cache.db");
        let garbage = "not a database ".repeat(128);
        std::fs::write(&path, &garbage).unwrap();

        let cache = open_cache(&persistent(path.clone()));
        cache.put("k".to_string(), CachedResponse::new("v", "A"));
        assert_eq!(cache.stats().write_failures, 0);

        let aside = dir.path().join("response_cache.db.corrupt");
        assert_eq!(std::fs::read_to_string(&aside).unwrap(), garbage);

        // Persistence works again on the next start.
        drop(cache);
        let restarted = open_cache(&persistent(path));
        assert_eq!(restarted.get("k").unwrap().response, "v");
    }

    #[test]
    fn test_open_cache_unusable_location_is_memory_only() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();

        let cache = open_cache(&persistent(blocker.join("response_cache.db")));
        assert!(!cache.is_disabled());
        cache.put("k".to_string(), CachedResponse::new("v", "A"));
        assert_eq!(cache.get("k").unwrap().response, "v");
        assert_eq!(cache.stats().write_failures, 0);
    }
}
