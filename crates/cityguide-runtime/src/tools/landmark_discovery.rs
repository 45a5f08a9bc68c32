//! `landmark_discovery`: cultural landmarks and notable places in a city.

use super::parse_input;
use crate::tool_runner::Tool;
use async_trait::async_trait;
use cityguide_types::collaborator::{LandmarkDirectory, LandmarkQuery, LandmarkRecord};
use cityguide_types::tool::{FieldSpec, InputSchema, ToolDefinition, ToolOutput};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_TYPE: &str = "cultural";
const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
struct DiscoveryInput {
    city: String,
    #[serde(default)]
    landmark_type: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

/// Finds landmarks through a [`LandmarkDirectory`].
pub struct LandmarkDiscoveryTool {
    directory: Arc<dyn LandmarkDirectory>,
}

impl LandmarkDiscoveryTool {
    pub fn new(directory: Arc<dyn LandmarkDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for LandmarkDiscoveryTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "landmark_discovery".to_string(),
            description: "Find cultural landmarks and notable places in a city.".to_string(),
            input_schema: InputSchema::new()
                .field(
                    FieldSpec::non_empty_text("city", "The city to search for landmarks")
                        .required(),
                )
                .field(FieldSpec::text(
                    "landmark_type",
                    "Type of landmark (cultural, historical, museum); default 'cultural'",
                ))
                .field(FieldSpec::integer(
                    "limit",
                    "Maximum number of landmarks to return",
                    Some(1),
                    Some(MAX_LIMIT),
                )),
        }
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: DiscoveryInput = match parse_input("landmark_discovery", input) {
            Ok(input) => input,
            Err(failure) => return failure,
        };
        let query = LandmarkQuery {
            city: input.city.trim().to_string(),
            landmark_type: input
                .landmark_type
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TYPE.to_string()),
            limit: input.limit.unwrap_or(DEFAULT_LIMIT),
        };

        match self.directory.discover(&query).await {
            Ok(records) if records.is_empty() => ToolOutput::Data(Value::String(format!(
                "No {} landmarks found in {}.",
                query.landmark_type, query.city
            ))),
            Ok(mut records) => {
                records.truncate(query.limit);
                match serde_json::to_value(&records) {
                    Ok(value) => ToolOutput::Data(value),
                    Err(e) => ToolOutput::failure(format!("Error searching landmarks: {e}")),
                }
            }
            Err(e) => ToolOutput::failure(format!("Error searching landmarks: {e}")),
        }
    }
}

/// Built-in list of well-known Oakland landmarks, used when no landmark
/// service is configured. Other cities get no results.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticLandmarks;

#[async_trait]
impl LandmarkDirectory for StaticLandmarks {
    async fn discover(&self, query: &LandmarkQuery) -> Result<Vec<LandmarkRecord>, String> {
        if !query.city.to_lowercase().contains("oakland") {
            return Ok(Vec::new());
        }
        Ok(oakland_landmarks().into_iter().take(query.limit).collect())
    }
}

fn oakland_landmarks() -> Vec<LandmarkRecord> {
    let landmark = |name: &str, kind: &str, description: &str, address: &str, rating: f32| {
        LandmarkRecord {
            name: name.to_string(),
            kind: kind.to_string(),
            description: description.to_string(),
            address: address.to_string(),
            rating: Some(rating),
        }
    };
    vec![
        landmark(
            "African American Museum and Library at Oakland",
            "Museum",
            "Dedicated to preserving African American history and culture",
            "659 14th St, Oakland, CA 94612",
            4.5,
        ),
        landmark(
            "Jack London Square",
            "Historic District",
            "Historic waterfront area with cultural significance",
            "Broadway, Oakland, CA 94607",
            4.2,
        ),
        landmark(
            "Fox Theater",
            "Historic Venue",
            "Art Deco theater and cultural landmark",
            "1807 Telegraph Ave, Oakland, CA 94612",
            4.6,
        ),
        landmark(
            "Oakland Museum of California",
            "Museum",
            "Museum showcasing California art, history, and natural sciences",
            "1000 Oak St, Oakland, CA 94607",
            4.3,
        ),
    ]
}
