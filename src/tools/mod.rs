//! The fixed tool set the model may invoke, with JSON-schema definitions
//! and context-injecting executors.
//!
//! Each schema declares only the parameters the model is allowed to
//! supply; birth data never appears in a schema and is always injected
//! from the `ConversationContext`, so the model cannot override or guess
//! it. Executor failures are swallowed into `{"error": …}` tool results —
//! the model reacts to them in natural language, the turn never aborts.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::engine::ZodiacEngine;
use crate::traits::ToolCall;
use crate::types::ConversationContext;

pub const DAILY_TRANSIT_TOOL: &str = "get_daily_transit_context";
pub const NATAL_CHART_TOOL: &str = "get_natal_chart_context";

/// Model-supplied arguments for the daily-transit tool.
#[derive(Debug, Deserialize)]
pub struct DailyTransitArgs {
    pub transit_datetime: String,
}

/// A tool call resolved to a known tool with typed arguments. Anything
/// the model invents lands in `Unknown` and produces a swallowed error
/// result.
#[derive(Debug)]
pub enum ToolInvocation {
    DailyTransit(DailyTransitArgs),
    NatalChart,
    Unknown(String),
}

impl ToolInvocation {
    pub fn parse(call: &ToolCall) -> Result<Self, serde_json::Error> {
        match call.name.as_str() {
            DAILY_TRANSIT_TOOL => Ok(Self::DailyTransit(serde_json::from_str(&call.arguments)?)),
            NATAL_CHART_TOOL => Ok(Self::NatalChart),
            other => Ok(Self::Unknown(other.to_string())),
        }
    }
}

/// Tool definitions sent to the model on every round, in OpenAI
/// function-calling wire format.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "type": "function",
            "function": {
                "name": DAILY_TRANSIT_TOOL,
                "description": "Get the raw astrological transit data (aspects between current planets and birth chart). Use this to interpret the daily vibe.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "transit_datetime": {
                            "type": "string",
                            "description": "The current date/time in ISO format (e.g. 2025-01-04T12:00:00)"
                        }
                    },
                    "required": ["transit_datetime"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": NATAL_CHART_TOOL,
                "description": "Get the user's natal chart data: planet placements, key aspects, and house cusps. Use this when the question needs birth chart facts (rising sign, moon sign, house placements).",
                "parameters": {
                    "type": "object",
                    "properties": {},
                    "required": []
                }
            }
        }),
    ]
}

/// Executes tool calls against the engine, injecting birth data from the
/// conversation context.
pub struct ToolRegistry {
    engine: Arc<ZodiacEngine>,
}

impl ToolRegistry {
    pub fn new(engine: Arc<ZodiacEngine>) -> Self {
        Self { engine }
    }

    /// Execute one tool call. Infallible by contract: every failure mode
    /// becomes a `{"error": …}` JSON string in the tool result.
    pub async fn execute(&self, call: &ToolCall, ctx: &ConversationContext) -> String {
        info!(tool = %call.name, arguments = %call.arguments, "Executing tool");

        let invocation = match ToolInvocation::parse(call) {
            Ok(invocation) => invocation,
            Err(err) => {
                warn!(tool = %call.name, error = %err, "Malformed tool arguments");
                return json!({ "error": format!("Invalid arguments: {}", err) }).to_string();
            }
        };

        let result = match invocation {
            ToolInvocation::DailyTransit(args) => {
                // The model supplies only the transit datetime; everything
                // else comes from the caller's context.
                self.engine
                    .transit_natal_aspects(
                        &ctx.birth_datetime,
                        &ctx.birth_coordinates,
                        &args.transit_datetime,
                        &ctx.current_coordinates,
                    )
                    .await
                    .and_then(|aspects| Ok(serde_json::to_string(&aspects)?))
            }
            ToolInvocation::NatalChart => self
                .engine
                .natal_chart(&ctx.birth_datetime, &ctx.birth_coordinates)
                .await
                .and_then(|chart| Ok(serde_json::to_string(&chart)?)),
            ToolInvocation::Unknown(name) => {
                warn!(tool = %name, "Attempted to execute unknown tool");
                return json!({ "error": "Unknown tool" }).to_string();
            }
        };

        match result {
            Ok(payload) => {
                debug!(tool = %call.name, bytes = payload.len(), "Tool result");
                payload
            }
            Err(err) => {
                warn!(tool = %call.name, error = %err, "Tool execution failed");
                json!({ "error": err.to_string() }).to_string()
            }
        }
    }
}
