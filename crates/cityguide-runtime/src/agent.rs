//! A single agent turn.
//!
//! The agent asks the model for a reply, runs any tool calls the reply
//! requests, and repeats until the model either answers or asks to hand the
//! request to a peer. The agent never fails: model and tool failures end in
//! a degraded answer.

use crate::directives::parse_reply;
use crate::tool_runner::{ToolInvocation, ToolInvoker};
use cityguide_types::agent::{AgentId, AgentManifest};
use cityguide_types::driver::{CompletionRequest, DriverError, LlmDriver};
use cityguide_types::tool::ToolResult;
use std::sync::Arc;
use tracing::{debug, warn};

const NO_ANSWER: &str = "I'm sorry, I don't have an answer for that right now.";

/// What the agent decided to do with the message.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentStep {
    /// A terminal answer.
    Answer(String),
    /// Hand the request to `target`.
    Forward {
        target: AgentId,
        /// The agent's partial findings, possibly empty.
        findings: String,
        /// Message for the peer: the incoming message plus the findings.
        message: String,
    },
}

/// Result of one turn.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub step: AgentStep,
    /// Set when the model call or any tool call failed.
    pub degraded: bool,
    pub invocations: Vec<ToolInvocation>,
}

/// A configured agent. Immutable after construction.
pub struct Agent {
    id: AgentId,
    manifest: AgentManifest,
    tools: ToolInvoker,
    handoff_targets: Vec<AgentId>,
    driver: Arc<dyn LlmDriver>,
    max_tool_rounds: u32,
}

impl Agent {
    pub fn new(
        manifest: AgentManifest,
        tools: ToolInvoker,
        handoff_targets: Vec<AgentId>,
        driver: Arc<dyn LlmDriver>,
        max_tool_rounds: u32,
    ) -> Self {
        Self {
            id: manifest.id(),
            manifest,
            tools,
            handoff_targets,
            driver,
            max_tool_rounds,
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn manifest(&self) -> &AgentManifest {
        &self.manifest
    }

    /// Peers offered to the model as hand-off targets.
    pub fn handoff_targets(&self) -> &[AgentId] {
        &self.handoff_targets
    }

    /// Run one turn on `message`.
    pub async fn run_turn(&self, message: &str) -> AgentTurn {
        let mut tool_results: Vec<ToolResult> = Vec::new();
        let mut invocations = Vec::new();
        let mut degraded = false;
        let mut round = 0u32;

        loop {
            let request = CompletionRequest {
                agent: self.id.clone(),
                model: self.manifest.model.clone(),
                system: self.manifest.instructions.clone(),
                prompt: message.to_string(),
                tools: self.tools.definitions(),
                handoff_targets: self.handoff_targets.clone(),
                tool_results: tool_results.clone(),
                round,
            };

            let reply = match self.generate(request).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(agent = %self.id, round, error = %e, "Model call failed");
                    return AgentTurn {
                        step: AgentStep::Answer(apology(&e, &tool_results)),
                        degraded: true,
                        invocations,
                    };
                }
            };
            let parsed = parse_reply(&reply);

            if let Some(target) = parsed.handoff {
                let findings = if parsed.text.is_empty() {
                    summarize(&tool_results)
                } else {
                    parsed.text
                };
                debug!(agent = %self.id, target = %target, "Agent requested hand-off");
                let message = self.forward_message(message, &findings);
                return AgentTurn {
                    step: AgentStep::Forward {
                        target,
                        findings,
                        message,
                    },
                    degraded,
                    invocations,
                };
            }

            if !parsed.tool_calls.is_empty() && round < self.max_tool_rounds {
                for call in parsed.tool_calls {
                    let invocation = self.tools.invoke(&call.name, call.input).await;
                    degraded |= !invocation.success;
                    tool_results.push(ToolResult {
                        tool: invocation.tool.clone(),
                        content: invocation.output.render(),
                        is_error: !invocation.success,
                    });
                    invocations.push(invocation);
                }
                round += 1;
                continue;
            }

            if !parsed.tool_calls.is_empty() {
                debug!(agent = %self.id, round, "Tool round limit reached, answering");
            }
            let text = if parsed.text.is_empty() {
                let summary = summarize(&tool_results);
                if summary.is_empty() {
                    NO_ANSWER.to_string()
                } else {
                    format!("Here is what I found:\n\n{summary}")
                }
            } else {
                parsed.text
            };
            return AgentTurn {
                step: AgentStep::Answer(text),
                degraded,
                invocations,
            };
        }
    }

    /// Run the model on its own task so that a dropped caller does not
    /// abort a call already in flight.
    async fn generate(&self, request: CompletionRequest) -> Result<String, DriverError> {
        let driver = Arc::clone(&self.driver);
        let reply = tokio::spawn(async move { driver.generate(request).await })
            .await
            .map_err(|e| DriverError::Request(format!("model task failed: {e}")))??;
        if reply.trim().is_empty() {
            return Err(DriverError::EmptyResponse);
        }
        Ok(reply)
    }

    fn forward_message(&self, message: &str, findings: &str) -> String {
        if findings.is_empty() {
            message.to_string()
        } else {
            format!("{message}\n\n[Notes from {}]\n{findings}", self.id)
        }
    }
}

fn summarize(results: &[ToolResult]) -> String {
    results
        .iter()
        .map(|r| format!("{}: {}", r.tool, r.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn apology(error: &DriverError, results: &[ToolResult]) -> String {
    let mut text = format!("I'm sorry, I ran into a problem while working on this ({error}).");
    let summary = summarize(results);
    if !summary.is_empty() {
        text.push_str("\n\nHere is what I found so far:\n\n");
        text.push_str(&summary);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_runner::{Tool, ToolRegistry};
    use async_trait::async_trait;
    use cityguide_types::tool::{InputSchema, ToolDefinition, ToolOutput};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies from a fixed queue and records every request.
    struct ScriptedDriver {
        replies: Mutex<VecDeque<Result<String, DriverError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedDriver {
        fn new(replies: Vec<Result<&str, DriverError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string))
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmDriver for ScriptedDriver {
        async fn generate(&self, request: CompletionRequest) -> Result<String, DriverError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok("out of script".to_string()))
        }
    }

    struct LookupTool {
        fail: bool,
    }

    #[async_trait]
    impl Tool for LookupTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "lookup".to_string(),
                description: "Look something up".to_string(),
                input_schema: InputSchema::new(),
            }
        }

        async fn run(&self, _input: Value) -> ToolOutput {
            if self.fail {
                ToolOutput::failure("Error searching businesses: timeout")
            } else {
                ToolOutput::Data(json!(["Sweet Bites"]))
            }
        }
    }

    fn agent(driver: Arc<ScriptedDriver>, fail_tool: bool, rounds: u32) -> Agent {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(LookupTool { fail: fail_tool }));
        let manifest = AgentManifest {
            name: "City Explorer".to_string(),
            description: String::new(),
            instructions: "Find businesses.".to_string(),
            tools: vec!["lookup".to_string()],
            handoffs: vec![],
            model: Default::default(),
        };
        let tools = registry.invoker_for(&manifest.tools).unwrap();
        Agent::new(
            manifest,
            tools,
            vec![AgentId::new("Itinerary Planner")],
            driver,
            rounds,
        )
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let driver = ScriptedDriver::new(vec![Ok("Try Sweet Bites.")]);
        let turn = agent(driver.clone(), false, 3).run_turn("find bakeries").await;
        assert_eq!(turn.step, AgentStep::Answer("Try Sweet Bites.".to_string()));
        assert!(!turn.degraded);
        let requests = driver.requests.lock().unwrap();
        assert_eq!(requests[0].system, "Find businesses.");
        assert_eq!(requests[0].tools[0].name, "lookup");
        assert_eq!(requests[0].handoff_targets, vec![AgentId::new("Itinerary Planner")]);
    }

    #[tokio::test]
    async fn test_tool_round_then_answer() {
        let driver = ScriptedDriver::new(vec![
            Ok("[[tool:lookup]] {}"),
            Ok("Sweet Bites is a great bakery."),
        ]);
        let turn = agent(driver.clone(), false, 3).run_turn("find bakeries").await;
        assert_eq!(
            turn.step,
            AgentStep::Answer("Sweet Bites is a great bakery.".to_string())
        );
        assert_eq!(turn.invocations.len(), 1);
        let requests = driver.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].round, 1);
        assert!(requests[1].tool_results[0].content.contains("Sweet Bites"));
    }

    #[tokio::test]
    async fn test_tool_failure_degrades_but_answers() {
        let driver = ScriptedDriver::new(vec![Ok("[[tool:lookup]] {}"), Ok("")]);
        let turn = agent(driver, true, 3).run_turn("find restaurants").await;
        assert!(turn.degraded);
        match turn.step {
            AgentStep::Answer(text) => assert!(text.contains("Error searching businesses")),
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_round_limit_stops_tool_loop() {
        let driver = ScriptedDriver::new(vec![
            Ok("[[tool:lookup]] {}"),
            Ok("[[tool:lookup]] {}"),
            Ok("[[tool:lookup]] {}"),
        ]);
        let turn = agent(driver.clone(), false, 1).run_turn("find bakeries").await;
        assert_eq!(turn.invocations.len(), 1);
        assert_eq!(driver.requests.lock().unwrap().len(), 2);
        match turn.step {
            AgentStep::Answer(text) => assert!(text.starts_with("Here is what I found")),
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_handoff_carries_findings() {
        let driver = ScriptedDriver::new(vec![Ok(
            "Found Sweet Bites.\n[[handoff:Itinerary Planner]]",
        )]);
        let turn = agent(driver, false, 3).run_turn("plan a 2-day trip").await;
        assert_eq!(
            turn.step,
            AgentStep::Forward {
                target: AgentId::new("Itinerary Planner"),
                findings: "Found Sweet Bites.".to_string(),
                message: "plan a 2-day trip\n\n[Notes from City Explorer]\nFound Sweet Bites."
                    .to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_model_failure_is_apology() {
        let driver = ScriptedDriver::new(vec![Err(DriverError::RateLimited("slow down".into()))]);
        let turn = agent(driver, false, 3).run_turn("find bakeries").await;
        assert!(turn.degraded);
        match turn.step {
            AgentStep::Answer(text) => {
                assert!(text.starts_with("I'm sorry"));
                assert!(text.contains("slow down"));
            }
            other => panic!("unexpected step: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blank_reply_is_degraded() {
        let driver = ScriptedDriver::new(vec![Ok("   ")]);
        let turn = agent(driver, false, 3).run_turn("hi").await;
        assert!(turn.degraded);
        assert!(matches!(turn.step, AgentStep::Answer(ref t) if !t.is_empty()));
    }
}
