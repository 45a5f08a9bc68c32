//! `cultural_story`: cultural and historical context for a place.
//!
//! Fields the archive does not know are filled with generic narrative text
//! naming the place and its location.

use super::parse_input;
use crate::tool_runner::Tool;
use async_trait::async_trait;
use cityguide_types::collaborator::{CulturalArchive, CulturalFact};
use cityguide_types::tool::{FieldSpec, InputSchema, ToolDefinition, ToolOutput};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_LOCATION: &str = "Oakland, CA";

#[derive(Debug, Deserialize)]
struct StoryInput {
    business_name: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    topic_focus: Option<String>,
}

/// Looks up cultural narratives in the archive.
pub struct CulturalStoryTool {
    archive: Arc<dyn CulturalArchive>,
}

impl CulturalStoryTool {
    pub fn new(archive: Arc<dyn CulturalArchive>) -> Self {
        Self { archive }
    }
}

#[async_trait]
impl Tool for CulturalStoryTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "cultural_story".to_string(),
            description: "Fetch cultural and historical context for a business, landmark, or location."
                .to_string(),
            input_schema: InputSchema::new()
                .field(
                    FieldSpec::non_empty_text(
                        "business_name",
                        "Name of the business, landmark, or location to research",
                    )
                    .required(),
                )
                .field(FieldSpec::text(
                    "location",
                    "City or location context (default 'Oakland, CA')",
                ))
                .field(FieldSpec::text(
                    "topic_focus",
                    "Aspect to focus on (history, culture, community impact)",
                )),
        }
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: StoryInput = match parse_input("cultural_story", input) {
            Ok(input) => input,
            Err(failure) => return failure,
        };
        let name = input.business_name.trim();
        let location = input
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCATION);

        let fact = match self.archive.lookup(name, location).await {
            Ok(fact) => fact.unwrap_or_default(),
            Err(e) => return ToolOutput::failure(format!("Error fetching cultural context: {e}")),
        };

        let mut story = narrate(name, location, fact);
        if let Some(focus) = input.topic_focus.filter(|f| !f.trim().is_empty()) {
            story["topic_focus"] = Value::String(focus);
        }
        ToolOutput::Data(story)
    }
}

fn narrate(name: &str, location: &str, fact: CulturalFact) -> Value {
    let city = location.split(',').next().unwrap_or(location).trim();
    json!({
        "business_name": name,
        "location": location,
        "cultural_context": fact.cultural_context.unwrap_or_else(|| format!(
            "{name} represents an important part of {city}'s diverse cultural landscape, \
             contributing to the city's vibrant community and rich heritage."
        )),
        "historical_significance": fact.historical_significance.unwrap_or_else(|| format!(
            "{name} has played a significant role in {city}'s development and continues to be \
             an important part of the city's ongoing story."
        )),
        "community_impact": fact.community_impact.unwrap_or_else(|| format!(
            "{name} contributes to {city}'s economy, provides employment opportunities, and \
             enriches the cultural fabric of the community."
        )),
        "recommended_visit_context": fact.visit_context.unwrap_or_else(|| format!(
            "When visiting {name}, take time to appreciate its cultural significance and how it \
             contributes to {city}'s diverse community."
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct OneFactArchive;

    #[async_trait]
    impl CulturalArchive for OneFactArchive {
        async fn lookup(
            &self,
            business_name: &str,
            _location: &str,
        ) -> Result<Option<CulturalFact>, String> {
            if business_name == "Fox Theater" {
                Ok(Some(CulturalFact {
                    historical_significance: Some("Built in 1928.".to_string()),
                    ..Default::default()
                }))
            } else {
                Ok(None)
            }
        }
    }

    struct DownArchive;

    #[async_trait]
    impl CulturalArchive for DownArchive {
        async fn lookup(&self, _: &str, _: &str) -> Result<Option<CulturalFact>, String> {
            Err("archive offline".to_string())
        }
    }

    #[tokio::test]
    async fn test_known_fields_kept_and_gaps_filled() {
        let tool = CulturalStoryTool::new(Arc::new(OneFactArchive));
        let out = tool.run(json!({"business_name": "Fox Theater"})).await;
        let ToolOutput::Data(story) = out else {
            panic!("expected data");
        };
        assert_eq!(story["historical_significance"], "Built in 1928.");
        assert_eq!(story["location"], "Oakland, CA");
        let context = story["cultural_context"].as_str().unwrap();
        assert!(context.contains("Fox Theater"));
        assert!(context.contains("Oakland's"));
    }

    #[tokio::test]
    async fn test_unknown_place_uses_location() {
        let tool = CulturalStoryTool::new(Arc::new(OneFactArchive));
        let out = tool
            .run(json!({
                "business_name": "Sweet Auburn Curb Market",
                "location": "Atlanta, GA",
                "topic_focus": "history"
            }))
            .await;
        let ToolOutput::Data(story) = out else {
            panic!("expected data");
        };
        assert!(story["community_impact"]
            .as_str()
            .unwrap()
            .contains("Atlanta's economy"));
        assert_eq!(story["topic_focus"], "history");
    }

    #[tokio::test]
    async fn test_archive_error_is_failure() {
        let tool = CulturalStoryTool::new(Arc::new(DownArchive));
        let out = tool.run(json!({"business_name": "Lake Merritt"})).await;
        assert_eq!(
            out,
            ToolOutput::failure("Error fetching cultural context: archive offline")
        );
    }
}
