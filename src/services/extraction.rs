//! Turning raw generator output into a validated [`ItineraryPlan`].
//!
//! Two stages, each returning a typed result: [`extract_json_text`] unwraps the
//! transport envelope and code fences, [`parse_and_validate`] parses the text
//! and checks it against the `ItineraryPlan` schema.

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::{
    error::{PlannerError, Result},
    schemas::{deserialize_response, validate_response, ResponseSchema},
    types::ItineraryPlan,
};

const FENCE: &str = "```";

/// Keys produced by the older prompt, mapped to their current names.
const LEGACY_DAY_KEYS: &[(&str, &str)] = &[("plan", "activities")];
const LEGACY_ACTIVITY_KEYS: &[(&str, &str)] = &[
    ("activity", "description"),
    ("distance", "distanceFromPrevious"),
    ("distance_from_previous", "distanceFromPrevious"),
];

/// Run both stages over a raw generator response body.
pub fn parse_generated_plan(raw: &str) -> Result<ItineraryPlan> {
    let text = extract_json_text(raw)?;
    parse_and_validate(&text)
}

/// Pull the candidate text out of a `generateContent` response body and strip
/// code fences from it.
pub fn extract_json_text(raw: &str) -> Result<String> {
    let envelope: Value = serde_json::from_str(raw).map_err(|err| PlannerError::GenerationParse {
        reason: format!("response envelope is not JSON: {err}"),
        raw: raw.to_string(),
    })?;

    let Some(candidate) = envelope.pointer("/candidates/0") else {
        let reason = envelope
            .pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
            .map(|reason| format!("prompt was blocked ({reason})"))
            .unwrap_or_else(|| "response has no candidates".to_string());
        return Err(PlannerError::GenerationEmpty(reason));
    };

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let finish_reason = candidate
            .get("finishReason")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        return Err(PlannerError::GenerationEmpty(format!(
            "candidate has no text (finish reason: {finish_reason})"
        )));
    }

    debug!(target: "itinerary::generator", text = %text, "candidate text");
    Ok(strip_code_fences(&text).to_string())
}

/// Remove a surrounding code fence, optionally tagged `json`.
///
/// When prose surrounds a fenced block, the first block's body is returned.
/// Text without fences comes back trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find(FENCE) else {
        return trimmed;
    };

    let after_open = &trimmed[open + FENCE.len()..];
    let tag_len = after_open
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_open.len());
    let (tag, rest) = after_open.split_at(tag_len);
    let is_tag = !tag.is_empty()
        && (tag.eq_ignore_ascii_case("json") || rest.starts_with(char::is_whitespace));
    let body = if is_tag { rest } else { after_open };

    match body.find(FENCE) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Parse fence-free text and validate it as an itinerary.
///
/// Accepts a bare array of day objects or an object holding one under `days`.
pub fn parse_and_validate(text: &str) -> Result<ItineraryPlan> {
    let value: Value = serde_json::from_str(text).map_err(|err| {
        warn!(target: "itinerary::generator", error = %err, "generated text is not JSON");
        PlannerError::GenerationParse {
            reason: err.to_string(),
            raw: text.to_string(),
        }
    })?;

    let days = match value {
        Value::Array(days) => days,
        Value::Object(mut object) => match object.remove("days") {
            Some(Value::Array(days)) => days,
            _ => {
                return Err(PlannerError::GenerationInvalidShape(
                    "expected an array of day objects or an object with a `days` array"
                        .to_string(),
                ))
            }
        },
        other => {
            return Err(PlannerError::GenerationInvalidShape(format!(
                "expected an array of day objects, got {}",
                json_kind(&other)
            )))
        }
    };

    if days.is_empty() {
        return Err(PlannerError::GenerationInvalidShape(
            "plan contains no days".to_string(),
        ));
    }

    let payload = json!({ "days": days.into_iter().map(canonicalize_day).collect::<Vec<_>>() });
    validate_response(ItineraryPlan::schema(), &payload)?;
    deserialize_response::<ItineraryPlan>(payload)
}

fn canonicalize_day(day: Value) -> Value {
    let Value::Object(mut day) = day else {
        return day;
    };
    rename_legacy_keys(&mut day, LEGACY_DAY_KEYS);

    if let Some(Value::Array(activities)) = day.get_mut("activities") {
        for activity in activities.iter_mut() {
            if let Value::Object(activity) = activity {
                rename_legacy_keys(activity, LEGACY_ACTIVITY_KEYS);
            }
        }
    }

    Value::Object(day)
}

fn rename_legacy_keys(object: &mut Map<String, Value>, renames: &[(&str, &str)]) {
    for (legacy, current) in renames {
        if object.contains_key(*current) {
            continue;
        }
        if let Some(value) = object.remove(*legacy) {
            object.insert((*current).to_string(), value);
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_DAY: &str = r#"[{"day":1,"date":"2025-05-10","activities":[{"time":"9:00 AM","description":"Beach","distanceFromPrevious":"0 km"}]}]"#;

    fn envelope(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```JSON\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```json[1]```"), "[1]");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
        assert_eq!(
            strip_code_fences("Here you go:\n```json\n[1]\n```\nEnjoy!"),
            "[1]"
        );
        assert_eq!(strip_code_fences("```json\n[1]"), "[1]");
    }

    #[test]
    fn test_fenced_and_bare_parse_identically() {
        let fenced = parse_generated_plan(&envelope(&format!("```json\n{ONE_DAY}\n```"))).unwrap();
        let bare = parse_generated_plan(&envelope(ONE_DAY)).unwrap();

        assert_eq!(fenced, bare);
        assert_eq!(fenced.day_count(), 1);
        assert_eq!(fenced.activity_count(), 1);
        assert_eq!(fenced.days[0].activities[0].description, "Beach");
    }

    #[test]
    fn test_split_parts_are_joined() {
        let (head, tail) = ONE_DAY.split_at(20);
        let raw = json!({
            "candidates": [{ "content": { "parts": [{ "text": head }, { "text": tail }] } }]
        })
        .to_string();

        assert_eq!(parse_generated_plan(&raw).unwrap().day_count(), 1);
    }

    #[test]
    fn test_missing_text_is_empty() {
        let raw = json!({ "candidates": [{ "finishReason": "SAFETY" }] }).to_string();
        let err = extract_json_text(&raw).unwrap_err();
        assert!(matches!(err, PlannerError::GenerationEmpty(ref reason) if reason.contains("SAFETY")));

        let raw = json!({ "promptFeedback": { "blockReason": "OTHER" } }).to_string();
        let err = extract_json_text(&raw).unwrap_err();
        assert!(matches!(err, PlannerError::GenerationEmpty(ref reason) if reason.contains("OTHER")));
    }

    #[test]
    fn test_prose_is_a_parse_error_with_raw_text() {
        let err = parse_generated_plan(&envelope("Sure! Here is your plan: ...")).unwrap_err();
        assert_eq!(err.raw_response(), Some("Sure! Here is your plan: ..."));

        let err = extract_json_text("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, PlannerError::GenerationParse { .. }));
    }

    #[test]
    fn test_shape_errors() {
        for text in ["[]", "{\"days\": []}", "42", "{\"itinerary\": 1}"] {
            let err = parse_and_validate(text).unwrap_err();
            assert!(
                matches!(err, PlannerError::GenerationInvalidShape(_)),
                "{text}: {err:?}"
            );
        }

        let no_activities = r#"[{"day":1,"date":"2025-05-10","activities":[]}]"#;
        assert!(matches!(
            parse_and_validate(no_activities),
            Err(PlannerError::GenerationInvalidShape(_))
        ));
    }

    #[test]
    fn test_legacy_keys_are_accepted() {
        let legacy = r#"{"days":[{"day":1,"date":"2025-05-06","plan":[
            {"time":"9:00 AM","activity":"Start at Baga Beach","distance":"0 km"},
            {"time":"11:00 AM","activity":"Visit Chapora Fort","distance":"8 km"}
        ]}]}"#;

        let plan = parse_and_validate(legacy).unwrap();
        assert_eq!(plan.activity_count(), 2);
        assert_eq!(plan.days[0].activities[1].description, "Visit Chapora Fort");
        assert_eq!(plan.days[0].activities[1].distance_from_previous, "8 km");
    }
}
