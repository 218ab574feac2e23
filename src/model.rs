// Request shapes and response normalization.
//
// The MoltPhone endpoints do not agree on a schema: the authenticated call
// endpoint nests the call under `call`, the webapp endpoint returns it flat,
// and transcripts arrive under `transcript` or `transcripts`. Every reader
// here takes a decoded `serde_json::Value`, tries the known keys in a fixed
// order and yields `None` when none of them match.

use serde_json::{json, Value};

use crate::config::{AssistantConfig, AssistantOverrides, CallDefaults};

/// How a call is placed.
#[derive(Debug, Clone, PartialEq)]
pub enum CallMode {
    /// `POST /call` with a bearer credential and a full assistant config.
    Authenticated { assistant_config: AssistantConfig },
    /// `POST /call/webapp`, anonymous, free-text task.
    Webapp { task: String, agent_name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub to_number: String,
    pub mode: CallMode,
}

impl CallRequest {
    /// Pick the call mode from credential presence alone.
    pub fn select(
        to_number: &str,
        has_credential: bool,
        defaults: &CallDefaults,
        overrides: &AssistantOverrides,
        task: Option<&str>,
        agent_name: Option<&str>,
    ) -> CallRequest {
        if has_credential {
            Self::authenticated(to_number, defaults, overrides)
        } else {
            Self::webapp(to_number, defaults, task, agent_name)
        }
    }

    pub fn authenticated(
        to_number: &str,
        defaults: &CallDefaults,
        overrides: &AssistantOverrides,
    ) -> CallRequest {
        CallRequest {
            to_number: to_number.to_string(),
            mode: CallMode::Authenticated {
                assistant_config: defaults.assistant.merged(overrides),
            },
        }
    }

    pub fn webapp(
        to_number: &str,
        defaults: &CallDefaults,
        task: Option<&str>,
        agent_name: Option<&str>,
    ) -> CallRequest {
        CallRequest {
            to_number: to_number.to_string(),
            mode: CallMode::Webapp {
                task: non_blank(task).unwrap_or(defaults.task.as_str()).to_string(),
                agent_name: non_blank(agent_name)
                    .unwrap_or(defaults.agent_name.as_str())
                    .to_string(),
            },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.mode, CallMode::Authenticated { .. })
    }

    /// Endpoint path for this mode.
    pub fn path(&self) -> &'static str {
        match self.mode {
            CallMode::Authenticated { .. } => "/call",
            CallMode::Webapp { .. } => "/call/webapp",
        }
    }

    /// JSON body in the shape the endpoint expects.
    pub fn payload(&self) -> Value {
        match &self.mode {
            CallMode::Authenticated { assistant_config } => json!({
                "to_number": self.to_number,
                "assistant_config": assistant_config,
            }),
            CallMode::Webapp { task, agent_name } => json!({
                "phoneNumber": self.to_number,
                "task": task,
                "agentName": agent_name,
            }),
        }
    }

    /// The text shown before dialing: the system prompt or the task.
    pub fn preview(&self) -> &str {
        match &self.mode {
            CallMode::Authenticated { assistant_config } => &assistant_config.system_prompt,
            CallMode::Webapp { task, .. } => task,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================
// Lookup helpers
// ============================================

/// First key present with a scalar value, rendered as a string.
fn text(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn number(obj: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

/// The nested `call` object when the response has one, else the body itself.
fn call_object(body: &Value) -> &Value {
    match body.get("call") {
        Some(call @ Value::Object(_)) => call,
        _ => body,
    }
}

/// Read from the nested call object first, then from the top level.
fn call_text(body: &Value, keys: &[&str]) -> Option<String> {
    text(call_object(body), keys).or_else(|| text(body, keys))
}

// ============================================
// Responses
// ============================================

/// Outcome of a successful call placement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallResult {
    pub call_id: Option<String>,
    pub provider_call_sid: Option<String>,
    pub status: Option<String>,
    pub mode: Option<String>,
    pub remaining_balance: Option<f64>,
}

impl CallResult {
    pub fn from_response(body: &Value) -> CallResult {
        CallResult {
            call_id: call_text(body, &["id", "callId", "call_id"]),
            provider_call_sid: call_text(
                body,
                &["twilioCallSid", "twilio_call_sid", "providerCallSid"],
            ),
            status: call_text(body, &["status"]),
            mode: call_text(body, &["mode"]),
            remaining_balance: number(body, &["remaining_balance", "remainingBalance"]),
        }
    }
}

/// `GET /calls/{id}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallDetails {
    pub status: Option<String>,
    pub to_number: Option<String>,
    pub mode: Option<String>,
    pub created_at: Option<String>,
}

impl CallDetails {
    pub fn from_response(body: &Value) -> CallDetails {
        CallDetails {
            status: call_text(body, &["status"]),
            to_number: call_text(body, &["toNumber", "to_number"]),
            mode: call_text(body, &["mode"]),
            created_at: call_text(body, &["createdAt", "created_at"]),
        }
    }
}

/// One row of `GET /calls`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallSummary {
    pub id: Option<String>,
    pub status: Option<String>,
    pub to_number: Option<String>,
    pub created_at: Option<String>,
}

impl CallSummary {
    fn from_value(value: &Value) -> CallSummary {
        CallSummary {
            id: text(value, &["id", "callId", "call_id"]),
            status: text(value, &["status"]),
            to_number: text(value, &["toNumber", "to_number"]),
            created_at: text(value, &["createdAt", "created_at"]),
        }
    }

    /// Entries of the `calls` array; anything else yields an empty list.
    pub fn list_from_response(body: &Value) -> Vec<CallSummary> {
        body.get("calls")
            .and_then(Value::as_array)
            .map(|calls| calls.iter().map(CallSummary::from_value).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Caller,
    Assistant,
}

impl Role {
    /// `"user"` is the person on the line; every other role is the AI.
    pub fn from_wire(role: &str) -> Role {
        if role == "user" {
            Role::Caller
        } else {
            Role::Assistant
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: Option<String>,
}

impl TranscriptEntry {
    fn from_value(value: &Value) -> TranscriptEntry {
        TranscriptEntry {
            role: Role::from_wire(value.get("role").and_then(Value::as_str).unwrap_or_default()),
            content: text(value, &["content"]).unwrap_or_default(),
            timestamp: text(value, &["timestamp"]),
        }
    }

    fn sort_key(&self) -> &str {
        self.timestamp.as_deref().unwrap_or("")
    }

    /// Entries from `transcript`, else `transcripts`, sorted ascending by
    /// timestamp. Entries without a timestamp sort first; ties keep server
    /// order.
    pub fn list_from_response(body: &Value) -> Vec<TranscriptEntry> {
        let entries = ["transcript", "transcripts"]
            .iter()
            .find_map(|key| body.get(key).filter(|v| !v.is_null()));

        let mut transcript: Vec<TranscriptEntry> = entries
            .and_then(Value::as_array)
            .map(|items| items.iter().map(TranscriptEntry::from_value).collect())
            .unwrap_or_default();
        transcript.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        transcript
    }
}

/// `GET /health`. Non-2xx responses still carry their fields, and the raw
/// body is kept for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Health {
    pub http_status: u16,
    pub status: Option<String>,
    pub service: Option<String>,
    pub body: Value,
}

impl Health {
    pub fn from_response(http_status: u16, body: &Value) -> Health {
        Health {
            http_status,
            status: text(body, &["status"]),
            service: text(body, &["service"]),
            body: body.clone(),
        }
    }

    pub fn is_up(&self) -> bool {
        (200..300).contains(&self.http_status)
    }
}

/// `GET /tokens/balance`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Balance {
    pub balance: Option<f64>,
    pub updated_at: Option<String>,
}

impl Balance {
    pub fn from_response(body: &Value) -> Balance {
        Balance {
            balance: number(body, &["balance"]),
            updated_at: text(body, &["updated_at", "updatedAt"]),
        }
    }
}

/// `POST /call/end/{id}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndedCall {
    pub message: Option<String>,
    pub call_id: Option<String>,
    pub status: Option<String>,
}

impl EndedCall {
    pub fn from_response(body: &Value) -> EndedCall {
        EndedCall {
            message: text(body, &["message"]),
            call_id: call_text(body, &["id", "callId", "call_id"]),
            status: call_text(body, &["status"]),
        }
    }
}
