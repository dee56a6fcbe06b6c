use serde_json::{json, Value};

/// A message in the conversation history.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Option<String>,
    /// Set on `role: tool` messages — the id of the call being answered.
    pub tool_call_id: Option<String>,
    /// Set on assistant messages that requested tool calls.
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    /// An assistant message carrying the tool calls the model requested.
    /// Echoed back in history so the follow-up call sees its own request.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_call_id: None,
            tool_calls,
        }
    }

    /// A `role: tool` message answering one tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: Vec::new(),
        }
    }

    /// OpenAI chat-completions wire form.
    pub fn wire(&self) -> Value {
        let mut msg = json!({ "role": self.role.as_str() });
        // `content` must be present (possibly null) on assistant tool-call
        // messages, so always emit it.
        msg["content"] = match &self.content {
            Some(text) => json!(text),
            None => Value::Null,
        };
        if let Some(id) = &self.tool_call_id {
            msg["tool_call_id"] = json!(id);
        }
        if !self.tool_calls.is_empty() {
            msg["tool_calls"] = Value::Array(self.tool_calls.iter().map(ToolCall::wire).collect());
        }
        msg
    }
}

/// A single tool call as returned by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON object text, exactly as the model produced it.
    pub arguments: String,
}

impl ToolCall {
    pub fn wire(&self) -> Value {
        json!({
            "id": self.id,
            "type": "function",
            "function": {
                "name": self.name,
                "arguments": self.arguments,
            }
        })
    }
}
