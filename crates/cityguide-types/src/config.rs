//! Orchestrator configuration.
//!
//! Every section defaults, so a partial `config.toml` only overrides what it names.
//! The default agency is the three-agent city guide: a City Explorer entry point
//! that can consult an Itinerary Planner and a Cultural Curator, which in turn
//! consult each other.

use crate::agent::{AgentManifest, FlowEdge, ModelParams};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const CITY_EXPLORER: &str = "City Explorer";
pub const ITINERARY_PLANNER: &str = "Itinerary Planner";
pub const CULTURAL_CURATOR: &str = "Cultural Curator";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityGuideConfig {
    /// Agent that receives every new message.
    pub entry_agent: String,
    /// Maximum number of hand-offs per request.
    pub max_hops: u32,
    /// Maximum generate→tool→generate cycles inside one agent turn.
    pub max_tool_rounds: u32,
    /// Response cache settings.
    pub cache: CacheConfig,
    /// Log output settings.
    pub log: LogConfig,
    /// Declared agents.
    pub agents: Vec<AgentManifest>,
    /// Communication graph edges.
    pub flows: Vec<FlowEdge>,
}

impl Default for CityGuideConfig {
    fn default() -> Self {
        Self {
            entry_agent: CITY_EXPLORER.to_string(),
            max_hops: 5,
            max_tool_rounds: 3,
            cache: CacheConfig::default(),
            log: LogConfig::default(),
            agents: default_agents(),
            flows: vec![
                FlowEdge::new(CITY_EXPLORER, ITINERARY_PLANNER),
                FlowEdge::new(CITY_EXPLORER, CULTURAL_CURATOR),
                FlowEdge::new(ITINERARY_PLANNER, CULTURAL_CURATOR),
                FlowEdge::new(CULTURAL_CURATOR, ITINERARY_PLANNER),
            ],
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Master switch. Disabled means every request runs the agent chain.
    pub enabled: bool,
    /// Entry time-to-live in seconds. `0` disables caching.
    pub ttl_secs: u64,
    /// SQLite file holding persisted entries. `None` keeps the cache in memory.
    pub path: Option<PathBuf>,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            path: dirs::home_dir().map(|h| h.join(".cityguide").join("response_cache.db")),
        }
    }
}

/// Log output settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn default_agents() -> Vec<AgentManifest> {
    vec![
        AgentManifest {
            name: CITY_EXPLORER.to_string(),
            description: "Discovers Black-owned businesses, events, and landmarks in a chosen U.S. city."
                .to_string(),
            instructions: "You are the first point of contact for travellers. Find Black-owned \
                businesses with the business_search tool and cultural landmarks with the \
                landmark_discovery tool. Hand trip-planning requests to the Itinerary Planner \
                and history or culture questions to the Cultural Curator."
                .to_string(),
            tools: vec![
                "business_search".to_string(),
                "landmark_discovery".to_string(),
            ],
            handoffs: vec![ITINERARY_PLANNER.to_string(), CULTURAL_CURATOR.to_string()],
            model: ModelParams::default(),
        },
        AgentManifest {
            name: ITINERARY_PLANNER.to_string(),
            description: "Builds day-by-day itineraries around discovered businesses and landmarks."
                .to_string(),
            instructions: "Turn the traveller's dates, interests and budget into a structured \
                itinerary with the itinerary_builder tool. Consult the Cultural Curator when a \
                stop needs historical context."
                .to_string(),
            tools: vec!["itinerary_builder".to_string()],
            handoffs: vec![CULTURAL_CURATOR.to_string()],
            model: ModelParams {
                temperature: 0.4,
                ..ModelParams::default()
            },
        },
        AgentManifest {
            name: CULTURAL_CURATOR.to_string(),
            description: "Narrates the cultural and historical significance of places.".to_string(),
            instructions: "Explain why a business or landmark matters to its community using the \
                cultural_story tool. Suggest the Itinerary Planner when the traveller wants to \
                fit a place into a trip."
                .to_string(),
            tools: vec!["cultural_story".to_string()],
            handoffs: vec![ITINERARY_PLANNER.to_string()],
            model: ModelParams::default(),
        },
    ]
}
