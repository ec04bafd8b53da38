//! Request interpretation.
//!
//! Sends the raw prompt to the language service under a fixed instruction and
//! decodes the reply into a [`ParsedIntent`]. Every failure here is fatal for
//! the request: there is no retry and no partial intent.

use crate::error::{PlanError, PlanResult};
use crate::model::{ParsedIntent, TravelRequest};
use crate::providers::LanguageService;
use serde_json::{Map, Value};
use std::time::Instant;

/// Instruction sent with every travel request.
pub const SYSTEM_INSTRUCTION: &str = "You are a travel planner. Parse the user input to extract: \
city, destinations/activities, and time constraints. Return a JSON object with city, \
destinations (array), and endTime. Return a single JSON object only. No prose or code fences.";

/// Interpret `request` into a structured intent with one language-service call.
pub fn interpret(
    service: &dyn LanguageService,
    request: &TravelRequest,
) -> PlanResult<ParsedIntent> {
    if request.is_blank() {
        return Err(PlanError::InvalidInput);
    }
    let start = Instant::now();
    let reply = service
        .complete(SYSTEM_INSTRUCTION, request.raw_text())
        .map_err(PlanError::LanguageService)?;
    let intent = decode_intent(&reply)?;
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis(),
        city = %intent.city,
        destinations = intent.destination_names.len(),
        "intent parsed"
    );
    Ok(intent)
}

/// Decode an LM reply into an intent, validating every field.
pub fn decode_intent(reply: &str) -> PlanResult<ParsedIntent> {
    let value = extract_object(reply)?;
    let city = required_string(&value, "city")?;
    let destination_names = required_names(&value, "destinations")?;
    let end_time = required_string(&value, "endTime")?;
    Ok(ParsedIntent {
        city,
        destination_names,
        end_time,
    })
}

/// Find the intent object in an LM reply.
///
/// Tried in order: the body of the first code fence, the whole reply, then the
/// first decodable object anywhere in the reply. Valid JSON that is not an
/// object is rejected outright.
fn extract_object(reply: &str) -> PlanResult<Map<String, Value>> {
    let trimmed = reply.trim();
    let mut first_error = None;
    for candidate in fenced_body(trimmed).into_iter().chain([trimmed]) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(other) => {
                return Err(PlanError::UpstreamParseError(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
            Err(err) => {
                first_error.get_or_insert(err);
            }
        }
    }
    if let Some(map) = first_embedded_object(reply) {
        tracing::debug!("intent object recovered from surrounding prose");
        return Ok(map);
    }
    let cause = first_error.map_or_else(|| "no JSON found".to_string(), |err| err.to_string());
    Err(PlanError::UpstreamParseError(format!(
        "{cause}; first 200 chars: {}",
        reply.chars().take(200).collect::<String>()
    )))
}

fn required_string(map: &Map<String, Value>, field: &'static str) -> PlanResult<String> {
    match map.get(field) {
        None | Some(Value::Null) => Err(PlanError::IncompleteIntent { field }),
        Some(Value::String(text)) if text.trim().is_empty() => {
            Err(PlanError::IncompleteIntent { field })
        }
        Some(Value::String(text)) => Ok(text.trim().to_string()),
        Some(other) => Err(PlanError::UpstreamParseError(format!(
            "`{field}` must be a string, got {}",
            json_kind(other)
        ))),
    }
}

fn required_names(map: &Map<String, Value>, field: &'static str) -> PlanResult<Vec<String>> {
    let items = match map.get(field) {
        None | Some(Value::Null) => return Err(PlanError::IncompleteIntent { field }),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(PlanError::UpstreamParseError(format!(
                "`{field}` must be an array, got {}",
                json_kind(other)
            )))
        }
    };
    if items.is_empty() {
        return Err(PlanError::IncompleteIntent { field });
    }
    let mut names = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(name) if name.trim().is_empty() => {
                return Err(PlanError::IncompleteIntent { field })
            }
            Value::String(name) => names.push(name.trim().to_string()),
            other => {
                return Err(PlanError::UpstreamParseError(format!(
                    "`{field}` entries must be strings, got {}",
                    json_kind(other)
                )))
            }
        }
    }
    Ok(names)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Body of the first closed ``` fence, minus an info string such as `json`.
fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find("```")? + 3;
    let rest = &text[open..];
    let body_start = match rest.find('\n') {
        Some(newline)
            if rest[..newline]
                .trim()
                .chars()
                .all(|c| c.is_ascii_alphanumeric()) =>
        {
            newline + 1
        }
        _ => 0,
    };
    let body = &rest[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// First `{` in `text` that starts a complete JSON object; trailing text after
/// the object is ignored.
fn first_embedded_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<Map<String, Value>>()
            .next()
            .and_then(Result::ok)
    })
}
