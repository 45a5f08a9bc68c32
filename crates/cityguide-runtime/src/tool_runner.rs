//! Tool trait, registry, and invoker.
//!
//! The registry is the process-wide catalogue of tool instances. Each agent
//! gets a [`ToolInvoker`] holding only the tools its manifest declares, so an
//! agent can never reach a tool it was not given.

use async_trait::async_trait;
use cityguide_types::collaborator::{BusinessDirectory, CulturalArchive, LandmarkDirectory};
use cityguide_types::error::{CityGuideError, CityGuideResult};
use cityguide_types::tool::{ToolDefinition, ToolOutput};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// A callable capability with a typed input schema.
///
/// `run` receives input that already passed schema validation and reports
/// every problem through [`ToolOutput::Failure`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and input schema.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool.
    async fn run(&self, input: Value) -> ToolOutput;
}

/// Record of a single tool execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool: String,
    pub success: bool,
    pub duration_ms: u64,
    pub output: ToolOutput,
}

/// Catalogue of tool instances by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in tools wired to the given collaborators.
    pub fn with_builtin_tools(
        directory: Arc<dyn BusinessDirectory>,
        landmarks: Arc<dyn LandmarkDirectory>,
        archive: Arc<dyn CulturalArchive>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::tools::BusinessSearchTool::new(directory)));
        registry.register(Arc::new(crate::tools::LandmarkDiscoveryTool::new(landmarks)));
        registry.register(Arc::new(crate::tools::CulturalStoryTool::new(archive)));
        registry.register(Arc::new(crate::tools::ItineraryBuilderTool));
        registry
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        if self.tools.insert(name.clone(), tool).is_some() {
            debug!(tool = %name, "Replaced registered tool");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Build an invoker over `names`, in that order.
    ///
    /// Fails with `ToolNotFound` on the first name that is not registered.
    pub fn invoker_for(&self, names: &[String]) -> CityGuideResult<ToolInvoker> {
        let tools = names
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| CityGuideError::ToolNotFound(name.clone()))
            })
            .collect::<CityGuideResult<Vec<_>>>()?;
        Ok(ToolInvoker::new(tools))
    }
}

/// The fixed tool set owned by one agent.
#[derive(Clone, Default)]
pub struct ToolInvoker {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolInvoker {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// Definitions in catalogue order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate `input` and run the named tool.
    ///
    /// Never fails: an unknown tool, a schema violation or a panicking tool
    /// all come back as [`ToolOutput::Failure`]. The tool runs on its own
    /// task, so if the caller is dropped mid-call the tool still finishes and
    /// its result is discarded.
    pub async fn invoke(&self, name: &str, input: Value) -> ToolInvocation {
        let start = Instant::now();
        let output = match self.find(name) {
            None => ToolOutput::failure(format!("Unknown tool: {name}")),
            Some(tool) => run_validated(tool, name, input).await,
        };
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        if let ToolOutput::Failure(reason) = &output {
            warn!(tool = %name, duration_ms, reason = %reason, "Tool invocation failed");
        } else {
            debug!(tool = %name, duration_ms, "Tool invocation succeeded");
        }

        ToolInvocation {
            tool: name.to_string(),
            success: !output.is_failure(),
            duration_ms,
            output,
        }
    }

    fn find(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|t| t.definition().name == name)
            .cloned()
    }
}

async fn run_validated(tool: Arc<dyn Tool>, name: &str, input: Value) -> ToolOutput {
    if let Err(reason) = tool.definition().input_schema.validate(&input) {
        return ToolOutput::failure(format!("Invalid input for {name}: {reason}"));
    }
    match tokio::spawn(async move { tool.run(input).await }).await {
        Ok(output) => output,
        Err(e) if e.is_panic() => ToolOutput::failure(format!("Tool {name} crashed")),
        Err(e) => ToolOutput::failure(format!("Tool {name} was cancelled: {e}")),
    }
}
