//! Built-in tools.
//!
//! Each tool holds a typed reference to the collaborator it queries and turns
//! every collaborator failure into a [`ToolOutput::Failure`](cityguide_types::tool::ToolOutput).

mod business_search;
mod cultural_story;
mod itinerary;
mod landmark_discovery;

pub use business_search::BusinessSearchTool;
pub use cultural_story::CulturalStoryTool;
pub use itinerary::ItineraryBuilderTool;
pub use landmark_discovery::{LandmarkDiscoveryTool, StaticLandmarks};

use cityguide_types::tool::ToolOutput;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deserialize already-validated tool input into the tool's typed arguments.
fn parse_input<T: DeserializeOwned>(tool: &str, input: Value) -> Result<T, ToolOutput> {
    serde_json::from_value(input)
        .map_err(|e| ToolOutput::failure(format!("Invalid input for {tool}: {e}")))
}
