//! `business_search`: query the Black-owned business directory.

use super::parse_input;
use crate::tool_runner::Tool;
use async_trait::async_trait;
use cityguide_types::collaborator::{BusinessDirectory, BusinessQuery};
use cityguide_types::tool::{FieldSpec, InputSchema, ToolDefinition, ToolOutput};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
struct SearchInput {
    category: String,
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

/// Searches the business directory by category and optional keyword.
pub struct BusinessSearchTool {
    directory: Arc<dyn BusinessDirectory>,
}

impl BusinessSearchTool {
    pub fn new(directory: Arc<dyn BusinessDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for BusinessSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "business_search".to_string(),
            description: "Search Black-owned businesses by category, keyword, or business type."
                .to_string(),
            input_schema: InputSchema::new()
                .field(
                    FieldSpec::non_empty_text(
                        "category",
                        "Business category or type (e.g. 'restaurant', 'bakery', 'accountant')",
                    )
                    .required(),
                )
                .field(FieldSpec::text(
                    "keyword",
                    "Optional refinement matched against name, address and description",
                ))
                .field(FieldSpec::integer(
                    "limit",
                    "Maximum number of results to return",
                    Some(1),
                    Some(MAX_LIMIT),
                )),
        }
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input: SearchInput = match parse_input("business_search", input) {
            Ok(input) => input,
            Err(failure) => return failure,
        };
        let query = BusinessQuery {
            category: input.category.trim().to_string(),
            keyword: input.keyword.unwrap_or_default().trim().to_string(),
            limit: input.limit.unwrap_or(DEFAULT_LIMIT),
        };

        match self.directory.search(&query).await {
            Ok(records) if records.is_empty() => ToolOutput::Data(Value::String(format!(
                "No results found for category '{}' with keyword '{}'.",
                query.category, query.keyword
            ))),
            Ok(mut records) => {
                records.truncate(query.limit);
                match serde_json::to_value(&records) {
                    Ok(value) => ToolOutput::Data(value),
                    Err(e) => ToolOutput::failure(format!("Error searching businesses: {e}")),
                }
            }
            Err(e) => ToolOutput::failure(format!("Error searching businesses: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityguide_types::collaborator::BusinessRecord;
    use serde_json::json;
    use std::sync::Mutex;

    struct StaticDirectory {
        records: Vec<BusinessRecord>,
        last_query: Mutex<Option<BusinessQuery>>,
    }

    #[async_trait]
    impl BusinessDirectory for StaticDirectory {
        async fn search(&self, query: &BusinessQuery) -> Result<Vec<BusinessRecord>, String> {
            *self.last_query.lock().unwrap() = Some(query.clone());
            Ok(self
                .records
                .iter()
                .filter(|r| r.category.contains(&query.category))
                .cloned()
                .collect())
        }
    }

    struct BrokenDirectory;

    #[async_trait]
    impl BusinessDirectory for BrokenDirectory {
        async fn search(&self, _query: &BusinessQuery) -> Result<Vec<BusinessRecord>, String> {
            Err("directory file missing".to_string())
        }
    }

    fn bakery(name: &str) -> BusinessRecord {
        BusinessRecord {
            name: name.to_string(),
            category: "bakery".to_string(),
            address: "Oakland, CA".to_string(),
            ..Default::default()
        }
    }

    fn directory() -> Arc<StaticDirectory> {
        Arc::new(StaticDirectory {
            records: vec![bakery("Sweet Bites"), bakery("Crumbs"), bakery("Rise Up")],
            last_query: Mutex::new(None),
        })
    }

    #[tokio::test]
    async fn test_default_limit_and_trimmed_query() {
        let dir = directory();
        let tool = BusinessSearchTool::new(dir.clone());
        let out = tool.run(json!({"category": " bakery "})).await;
        assert!(matches!(out, ToolOutput::Data(Value::Array(ref a)) if a.len() == 3));
        let query = dir.last_query.lock().unwrap().clone().unwrap();
        assert_eq!(query.category, "bakery");
        assert_eq!(query.keyword, "");
        assert_eq!(query.limit, DEFAULT_LIMIT);
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let tool = BusinessSearchTool::new(directory());
        let out = tool.run(json!({"category": "bakery", "limit": 2})).await;
        match out {
            ToolOutput::Data(Value::Array(items)) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0]["name"], "Sweet Bites");
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_results_message() {
        let tool = BusinessSearchTool::new(directory());
        let out = tool
            .run(json!({"category": "accountant", "keyword": "tax"}))
            .await;
        assert!(!out.is_failure());
        assert_eq!(
            out,
            ToolOutput::Data(json!(
                "No results found for category 'accountant' with keyword 'tax'."
            ))
        );
    }

    #[tokio::test]
    async fn test_directory_error_is_failure() {
        let tool = BusinessSearchTool::new(Arc::new(BrokenDirectory));
        let out = tool.run(json!({"category": "restaurant"})).await;
        assert_eq!(
            out,
            ToolOutput::failure("Error searching businesses: directory file missing")
        );
    }

    #[test]
    fn test_schema_bounds_limit() {
        let schema = BusinessSearchTool::new(directory()).definition().input_schema;
        assert!(schema.validate(&json!({"category": "bakery", "limit": 50})).is_ok());
        assert!(schema.validate(&json!({"category": "bakery", "limit": 51})).is_err());
        assert!(schema.validate(&json!({"limit": 5})).is_err());
    }
}
