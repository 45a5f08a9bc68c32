//! `itinerary_builder`: structured day-by-day trip plans.
//!
//! Pure function of its input. Pre-selected places fill the morning,
//! afternoon and evening slots first, in order; remaining slots get
//! suggestions chosen from the traveller's interests.

use super::parse_input;
use crate::tool_runner::Tool;
use async_trait::async_trait;
use chrono::{Days, NaiveTime, Utc};
use cityguide_types::tool::{FieldSpec, InputSchema, ToolDefinition, ToolOutput};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MAX_DAYS: i64 = 14;
const THEMES: [&str; 4] = [
    "Cultural Discovery",
    "Food & Shopping",
    "History & Arts",
    "Community & Events",
];
const TRANSPORTATION_NOTES: &str =
    "Consider public transit, rideshare for convenience, or walking in downtown areas";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Budget {
    Budget,
    Medium,
    Luxury,
}

impl Budget {
    fn parse(level: Option<&str>) -> Self {
        match level.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
            Some("budget") => Self::Budget,
            Some("luxury") => Self::Luxury,
            _ => Self::Medium,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::Medium => "medium",
            Self::Luxury => "luxury",
        }
    }

    fn daily_cost(self) -> &'static str {
        match self {
            Self::Budget => "$50-100",
            Self::Medium => "$100-200",
            Self::Luxury => "$200-400",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ItineraryInput {
    city: String,
    #[serde(default)]
    days: Option<u32>,
    #[serde(default)]
    interests: Vec<String>,
    #[serde(default)]
    budget_level: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    selected_locations: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Activity {
    time: String,
    duration: &'static str,
    activity: String,
    #[serde(rename = "type")]
    kind: &'static str,
    description: String,
    cost_estimate: &'static str,
}

#[derive(Debug, Serialize)]
struct DayPlan {
    day: u32,
    date: Option<String>,
    theme: &'static str,
    activities: Vec<Activity>,
    estimated_cost: &'static str,
    transportation_notes: &'static str,
}

#[derive(Debug, Serialize)]
struct Itinerary {
    city: String,
    duration_days: u32,
    interests: Vec<String>,
    budget_level: &'static str,
    created_at: String,
    daily_plans: Vec<DayPlan>,
}

/// Builds itineraries. Holds no collaborator.
pub struct ItineraryBuilderTool;

#[async_trait]
impl Tool for ItineraryBuilderTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "itinerary_builder".to_string(),
            description: "Generate a structured, day-by-day trip itinerary from preferences and \
                          discovered businesses or landmarks."
                .to_string(),
            input_schema: InputSchema::new()
                .field(FieldSpec::non_empty_text("city", "The city for the itinerary").required())
                .field(FieldSpec::integer(
                    "days",
                    "Number of days for the trip",
                    Some(1),
                    Some(MAX_DAYS),
                ))
                .field(FieldSpec::text_list(
                    "interests",
                    "Interests such as 'food', 'culture', 'shopping', 'history'",
                ))
                .field(FieldSpec::choice(
                    "budget_level",
                    "Budget level",
                    &["budget", "medium", "luxury"],
                ))
                .field(FieldSpec::text(
                    "start_time",
                    "Preferred start time for each day, 24-hour HH:MM (default 09:00)",
                ))
                .field(FieldSpec::text_list(
                    "selected_locations",
                    "Names of pre-selected businesses or landmarks to include",
                )),
        }
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: ItineraryInput = match parse_input("itinerary_builder", input) {
            Ok(input) => input,
            Err(failure) => return failure,
        };
        match build(input) {
            Ok(itinerary) => match serde_json::to_value(&itinerary) {
                Ok(value) => ToolOutput::Data(value),
                Err(e) => ToolOutput::failure(format!("Error creating itinerary: {e}")),
            },
            Err(reason) => ToolOutput::Failure(reason),
        }
    }
}

fn build(input: ItineraryInput) -> Result<Itinerary, String> {
    let start_time = input.start_time.as_deref().map(str::trim).unwrap_or("09:00");
    let start_time = NaiveTime::parse_from_str(start_time, "%H:%M")
        .map_err(|_| format!("Invalid start_time '{start_time}': expected HH:MM"))?
        .format("%H:%M")
        .to_string();
    let city = input.city.trim().to_string();
    let days = input.days.unwrap_or(1).clamp(1, MAX_DAYS as u32);
    let budget = Budget::parse(input.budget_level.as_deref());
    let interests: Vec<String> = input
        .interests
        .iter()
        .map(|i| i.trim().to_lowercase())
        .filter(|i| !i.is_empty())
        .collect();

    let today = Utc::now().date_naive();
    let mut selected = input
        .selected_locations
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());

    let planner = SlotPlanner {
        city: &city,
        interests: &interests,
        budget,
    };
    let daily_plans = (1..=days)
        .map(|day| {
            let mut activities = Vec::with_capacity(4);
            activities.push(
                selected
                    .next()
                    .map(|name| Activity::selected(name, &start_time))
                    .unwrap_or_else(|| planner.morning(&start_time)),
            );
            activities.push(planner.lunch());
            activities.push(
                selected
                    .next()
                    .map(|name| Activity::selected(name, "14:00"))
                    .unwrap_or_else(|| planner.afternoon()),
            );
            activities.push(
                selected
                    .next()
                    .map(|name| Activity::selected(name, "18:00"))
                    .unwrap_or_else(|| planner.evening()),
            );
            DayPlan {
                day,
                date: today
                    .checked_add_days(Days::new(u64::from(day - 1)))
                    .map(|d| d.format("%Y-%m-%d").to_string()),
                theme: THEMES[(day as usize - 1) % THEMES.len()],
                activities,
                estimated_cost: budget.daily_cost(),
                transportation_notes: TRANSPORTATION_NOTES,
            }
        })
        .collect();

    Ok(Itinerary {
        city,
        duration_days: days,
        interests,
        budget_level: budget.as_str(),
        created_at: Utc::now().to_rfc3339(),
        daily_plans,
    })
}

impl Activity {
    fn selected(name: &str, time: &str) -> Self {
        Self {
            time: time.to_string(),
            duration: "2-3 hours",
            activity: name.to_string(),
            kind: "Selected",
            description: format!("Visit {name}"),
            cost_estimate: "Varies",
        }
    }
}

struct SlotPlanner<'a> {
    city: &'a str,
    interests: &'a [String],
    budget: Budget,
}

impl SlotPlanner<'_> {
    fn likes(&self, interest: &str) -> bool {
        self.interests.iter().any(|i| i == interest)
    }

    fn morning(&self, start_time: &str) -> Activity {
        let city = self.city;
        let (activity, kind, description, cost) = if self.likes("culture") {
            (
                format!("{city} African American history museum"),
                "Museum",
                "Explore African American history and culture".to_string(),
                if self.budget == Budget::Budget {
                    "$10-15"
                } else {
                    "$15-25"
                },
            )
        } else if self.likes("food") {
            (
                format!("{city} farmers market"),
                "Market",
                "Local market with fresh produce and artisanal goods".to_string(),
                "$20-40",
            )
        } else {
            (
                format!("{city} waterfront walk"),
                "Nature",
                format!("Walk and take in the sights of {city}"),
                "Free",
            )
        };
        Activity {
            time: start_time.to_string(),
            duration: "2-3 hours",
            activity,
            kind,
            description,
            cost_estimate: cost,
        }
    }

    fn lunch(&self) -> Activity {
        let (activity, description, cost) = if self.budget == Budget::Budget {
            (
                "Black-owned soul food kitchen",
                "Southern comfort food and soul food",
                "$12-20",
            )
        } else {
            (
                "Black-owned Caribbean restaurant",
                "Caribbean cuisine with Black-owned heritage",
                "$15-25",
            )
        };
        Activity {
            time: "12:00".to_string(),
            duration: "1.5 hours",
            activity: activity.to_string(),
            kind: "Restaurant",
            description: description.to_string(),
            cost_estimate: cost,
        }
    }

    fn afternoon(&self) -> Activity {
        let city = self.city;
        let (activity, kind, description, cost) = if self.likes("shopping") {
            (
                format!("African imports boutique in {city}"),
                "Shopping",
                "African goods and cultural items",
                "$30-100",
            )
        } else {
            (
                format!("{city} historic district"),
                "Historic District",
                "Historic neighbourhood with shops and restaurants",
                "$20-50",
            )
        };
        Activity {
            time: "14:00".to_string(),
            duration: "2-3 hours",
            activity,
            kind,
            description: description.to_string(),
            cost_estimate: cost,
        }
    }

    fn evening(&self) -> Activity {
        Activity {
            time: "18:00".to_string(),
            duration: "2 hours",
            activity: format!("Live performance in {}", self.city),
            kind: "Entertainment",
            description: "Historic theater or music venue with live performances".to_string(),
            cost_estimate: "$25-75",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn plan(input: Value) -> Value {
        match ItineraryBuilderTool.run(input).await {
            ToolOutput::Data(value) => value,
            ToolOutput::Failure(reason) => panic!("unexpected failure: {reason}"),
        }
    }

    #[tokio::test]
    async fn test_two_day_plan_shape() {
        let it = plan(json!({"city": "Oakland", "days": 2, "interests": ["Culture", "food"]})).await;
        assert_eq!(it["duration_days"], 2);
        assert_eq!(it["budget_level"], "medium");
        let days = it["daily_plans"].as_array().unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0]["theme"], "Cultural Discovery");
        assert_eq!(days[1]["theme"], "Food & Shopping");
        assert_eq!(days[0]["estimated_cost"], "$100-200");

        let times: Vec<_> = days[0]["activities"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["time"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(times, vec!["09:00", "12:00", "14:00", "18:00"]);
        assert_eq!(days[0]["activities"][0]["type"], "Museum");
    }

    #[tokio::test]
    async fn test_themes_rotate_and_budget_band() {
        let it = plan(json!({"city": "Atlanta", "days": 5, "budget_level": "Luxury"})).await;
        let days = it["daily_plans"].as_array().unwrap();
        assert_eq!(days[3]["theme"], "Community & Events");
        assert_eq!(days[4]["theme"], "Cultural Discovery");
        assert_eq!(days[0]["estimated_cost"], "$200-400");
    }

    #[tokio::test]
    async fn test_selected_locations_fill_slots_first() {
        let it = plan(json!({
            "city": "Oakland",
            "start_time": "10:30",
            "selected_locations": ["Fox Theater", "Lake Merritt"]
        }))
        .await;
        let acts = it["daily_plans"][0]["activities"].as_array().unwrap();
        assert_eq!(acts[0]["activity"], "Fox Theater");
        assert_eq!(acts[0]["time"], "10:30");
        assert_eq!(acts[2]["activity"], "Lake Merritt");
        assert_eq!(acts[3]["type"], "Entertainment");
    }

    #[tokio::test]
    async fn test_bad_start_time_is_failure() {
        let out = ItineraryBuilderTool
            .run(json!({"city": "Oakland", "start_time": "9am"}))
            .await;
        assert_eq!(
            out,
            ToolOutput::failure("Invalid start_time '9am': expected HH:MM")
        );
    }

    #[test]
    fn test_schema_rejects_too_many_days() {
        let schema = ItineraryBuilderTool.definition().input_schema;
        assert!(schema.validate(&json!({"city": "Oakland", "days": 15})).is_err());
        assert!(schema.validate(&json!({"city": "Oakland", "days": 14})).is_ok());
    }
}
