//! Trace events for runtime verification.
//!
//! A [`TraceEmitter`] records call / return / state-change / check / error
//! events while a behavior executes, then finalizes into a [`Trace`] the
//! verdict layer can score. Traces live in memory; writing them anywhere is
//! the caller's concern.
//!
//! Values that look like personal data (emails, IPs, secret-bearing keys)
//! are redacted at emission time so traces are safe to ship to a report
//! layer.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use specl_core::value::Value;

/// Trace event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceEventType {
    Call,
    Return,
    StateChange,
    Check,
    Error,
}

/// One event emitted during behavior execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: TraceEventType,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

/// A finalized trace with pass/fail metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub id: String,
    pub domain: String,
    pub behavior: String,
    pub start_time: i64,
    pub end_time: i64,
    pub events: Vec<TraceEvent>,
    pub passed: bool,
    /// Total wall-clock duration in milliseconds.
    pub duration: i64,
}

/// Emits trace events during runtime verification of one behavior.
#[derive(Debug)]
pub struct TraceEmitter {
    domain: String,
    behavior: String,
    start_time: i64,
    events: Vec<TraceEvent>,
    event_counter: usize,
}

impl TraceEmitter {
    pub fn new(domain: impl Into<String>, behavior: impl Into<String>) -> Self {
        TraceEmitter {
            domain: domain.into(),
            behavior: behavior.into(),
            start_time: now_ms(),
            events: Vec::new(),
            event_counter: 0,
        }
    }

    /// Records a behavior invocation with its (redacted) input.
    pub fn emit_call(&mut self, function: &str, input: &Value) {
        let input_json = redact(input.to_json());
        self.push(
            TraceEventType::Call,
            serde_json::json!({
                "kind": "call",
                "function": function,
                "args": input_json,
            }),
            Some(input_json.clone()),
            None,
        );
    }

    /// Records a behavior return with its (redacted) result and duration.
    pub fn emit_return(&mut self, function: &str, result: &Value, duration_ms: i64) {
        let output = redact(result.to_json());
        self.push(
            TraceEventType::Return,
            serde_json::json!({
                "kind": "return",
                "function": function,
                "result": output,
                "duration": duration_ms,
            }),
            None,
            Some(output.clone()),
        );
    }

    /// Records an entity-state change observed during the call.
    pub fn emit_state_change(&mut self, path: &[String], old_value: &Value, new_value: &Value) {
        self.push(
            TraceEventType::StateChange,
            serde_json::json!({
                "kind": "state_change",
                "path": path,
                "oldValue": redact(old_value.to_json()),
                "newValue": redact(new_value.to_json()),
            }),
            None,
            None,
        );
    }

    /// Records a contract check outcome.
    pub fn emit_check(&mut self, expression: &str, passed: bool, category: &str) {
        self.push(
            TraceEventType::Check,
            serde_json::json!({
                "kind": "check",
                "expression": expression,
                "passed": passed,
                "category": category,
            }),
            None,
            None,
        );
    }

    /// Records an implementation error.
    pub fn emit_error(&mut self, code: &str, message: &str) {
        self.push(
            TraceEventType::Error,
            serde_json::json!({
                "kind": "error",
                "code": code,
                "message": message,
            }),
            None,
            None,
        );
    }

    /// Finalizes the trace with an overall verdict.
    pub fn finalize(&self, passed: bool) -> Trace {
        let end_time = now_ms();
        Trace {
            id: format!("trace_{}_{}", self.start_time, self.events.len()),
            domain: self.domain.clone(),
            behavior: self.behavior.clone(),
            start_time: self.start_time,
            end_time,
            events: self.events.clone(),
            passed,
            duration: end_time - self.start_time,
        }
    }

    fn push(
        &mut self,
        event_type: TraceEventType,
        data: serde_json::Value,
        input: Option<serde_json::Value>,
        output: Option<serde_json::Value>,
    ) {
        self.event_counter += 1;
        self.events.push(TraceEvent {
            id: format!("evt_{}", self.event_counter),
            event_type,
            timestamp: now_ms(),
            data,
            input,
            output,
        });
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Redaction
// ---------------------------------------------------------------------------

const FORBIDDEN_KEYS: &[&str] = &[
    "password",
    "password_hash",
    "secret",
    "api_key",
    "access_token",
    "refresh_token",
    "private_key",
    "credit_card",
    "ssn",
];

/// Strips secret-bearing keys and masks email/IP-shaped strings.
fn redact(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(fields) => {
            let mut out = serde_json::Map::new();
            for (key, val) in fields {
                let lower = key.to_lowercase();
                if FORBIDDEN_KEYS.iter().any(|f| lower.contains(f)) {
                    continue;
                }
                out.insert(key, redact(val));
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(redact).collect())
        }
        serde_json::Value::String(s) => serde_json::Value::String(redact_string(&s)),
        other => other,
    }
}

fn redact_string(s: &str) -> String {
    if let Some(at) = s.find('@') {
        if s[at..].contains('.') {
            let local = &s[..at];
            let masked = match local.len() {
                0 | 1 => "*".to_string(),
                n => format!("{}{}", &local[..1], "*".repeat((n - 1).min(3))),
            };
            return format!("{}{}", masked, &s[at..]);
        }
    }
    let looks_like_ip =
        s.matches('.').count() == 3 && s.chars().all(|c| c.is_ascii_digit() || c == '.');
    if looks_like_ip {
        let parts: Vec<&str> = s.split('.').collect();
        return format!("{}.{}.xxx.xxx", parts[0], parts[1]);
    }
    s.to_string()
}
