//! Tool definition, input schema, and result types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Definition of a tool that an agent can use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool identifier.
    pub name: String,
    /// Human-readable description for the LLM.
    pub description: String,
    /// Typed description of the accepted arguments.
    pub input_schema: InputSchema,
}

/// Semantic type and constraints of a single tool argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// A string, optionally required to contain non-whitespace text.
    Text { non_empty: bool },
    /// A whole number within optional inclusive bounds.
    Integer { min: Option<i64>, max: Option<i64> },
    /// A list of strings.
    TextList,
    /// One of a fixed set of strings (case-insensitive).
    Choice { options: Vec<String> },
}

/// One named argument of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub description: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    /// Optional free-text argument.
    pub fn text(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_kind(name, description, FieldKind::Text { non_empty: false })
    }

    /// Optional argument that must contain non-whitespace text when given.
    pub fn non_empty_text(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_kind(name, description, FieldKind::Text { non_empty: true })
    }

    /// Optional integer argument bounded to `min..=max`.
    pub fn integer(
        name: impl Into<String>,
        description: impl Into<String>,
        min: Option<i64>,
        max: Option<i64>,
    ) -> Self {
        Self::with_kind(name, description, FieldKind::Integer { min, max })
    }

    /// Optional list-of-strings argument.
    pub fn text_list(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::with_kind(name, description, FieldKind::TextList)
    }

    /// Optional argument restricted to `options`.
    pub fn choice(
        name: impl Into<String>,
        description: impl Into<String>,
        options: &[&str],
    ) -> Self {
        let options = options.iter().map(|o| o.to_string()).collect();
        Self::with_kind(name, description, FieldKind::Choice { options })
    }

    /// Mark the argument as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn with_kind(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: FieldKind,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
        }
    }

    fn check(&self, value: &Value) -> Result<(), String> {
        let name = &self.name;
        match &self.kind {
            FieldKind::Text { non_empty } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| format!("Field '{name}' must be a string"))?;
                if *non_empty && s.trim().is_empty() {
                    return Err(format!("Field '{name}' must not be empty"));
                }
            }
            FieldKind::Integer { min, max } => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| format!("Field '{name}' must be an integer"))?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(format!("Field '{name}' must be at least {min}"));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        return Err(format!("Field '{name}' must be at most {max}"));
                    }
                }
            }
            FieldKind::TextList => {
                let items = value
                    .as_array()
                    .ok_or_else(|| format!("Field '{name}' must be a list of strings"))?;
                if items.iter().any(|item| !item.is_string()) {
                    return Err(format!("Field '{name}' must be a list of strings"));
                }
            }
            FieldKind::Choice { options } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| format!("Field '{name}' must be a string"))?;
                if !options.iter().any(|o| o.eq_ignore_ascii_case(s)) {
                    return Err(format!(
                        "Field '{name}' must be one of: {}",
                        options.join(", ")
                    ));
                }
            }
        }
        Ok(())
    }

    fn json_schema(&self) -> Value {
        let mut schema = match &self.kind {
            FieldKind::Text { .. } => serde_json::json!({ "type": "string" }),
            FieldKind::Integer { min, max } => {
                let mut s = serde_json::json!({ "type": "integer" });
                if let Some(min) = min {
                    s["minimum"] = (*min).into();
                }
                if let Some(max) = max {
                    s["maximum"] = (*max).into();
                }
                s
            }
            FieldKind::TextList => {
                serde_json::json!({ "type": "array", "items": { "type": "string" } })
            }
            FieldKind::Choice { options } => {
                serde_json::json!({ "type": "string", "enum": options })
            }
        };
        schema["description"] = Value::String(self.description.clone());
        schema
    }
}

/// Ordered argument list for a tool.
///
/// Unknown arguments are ignored; missing optional arguments are left to the
/// tool's own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    pub fields: Vec<FieldSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Check `input` against every field, reporting the first violation.
    pub fn validate(&self, input: &Value) -> Result<(), String> {
        let obj = input
            .as_object()
            .ok_or_else(|| "Tool input must be a JSON object".to_string())?;
        for field in &self.fields {
            match obj.get(&field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        return Err(format!("Missing required field '{}'", field.name));
                    }
                }
                Some(value) => field.check(value)?,
            }
        }
        Ok(())
    }

    /// Render as a JSON Schema object for inclusion in model prompts.
    pub fn to_json_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Which tool to call.
    pub name: String,
    /// The input parameters.
    pub input: Value,
}

/// Outcome of running a tool. Tools never error past this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "content", rename_all = "snake_case")]
pub enum ToolOutput {
    /// Structured records or a mapping.
    Data(Value),
    /// Human-readable description of what went wrong.
    Failure(String),
}

impl ToolOutput {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure(reason.into())
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Text form handed back to the model.
    pub fn render(&self) -> String {
        match self {
            Self::Data(Value::String(text)) => text.clone(),
            Self::Data(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            Self::Failure(reason) => reason.clone(),
        }
    }
}

/// Result of a tool execution as shown to the model on the next round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The tool that produced this result.
    pub tool: String,
    /// The output content.
    pub content: String,
    /// Whether the tool execution resulted in an error.
    pub is_error: bool,
}
