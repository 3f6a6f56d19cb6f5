use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};

/// Inputs describing a trip to be planned.
///
/// Deserialization goes through [`TripDraft`], so stored documents written by
/// older callers (string budgets, `travelers`, mode→bool maps) come out in the
/// same canonical form as freshly built requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TripDraft")]
pub struct TripRequest {
    pub trip_id: String,
    pub owner_id: String,
    pub destination: String,
    pub budget: f64,
    pub transport_modes: TransportModes,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub traveler_count: u32,
}

impl TripRequest {
    /// Whole days between start and end; zero or negative for an invalid range.
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Check the preconditions that a typed request can still violate.
    pub fn validate(&self) -> Result<()> {
        validate_identifier("tripId", &self.trip_id)?;
        validate_identifier("ownerId", &self.owner_id)?;

        if self.destination.trim().is_empty() {
            return Err(PlannerError::validation("destination", "must not be empty"));
        }

        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err(PlannerError::validation(
                "budget",
                format!("must be a positive amount, got {}", self.budget),
            ));
        }

        if self.traveler_count == 0 {
            return Err(PlannerError::validation(
                "travelerCount",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}

/// Ids become path segments in the document store.
pub(crate) fn validate_identifier(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PlannerError::validation(field, "must not be empty"));
    }
    if value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(PlannerError::validation(
            field,
            format!("`{value}` cannot be used as a document key"),
        ));
    }
    Ok(())
}

/// Canonical transport modes: selected names only, sorted and de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TransportModesInput")]
pub struct TransportModes(Vec<String>);

impl TransportModes {
    pub fn new<I, S>(modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = modes
            .into_iter()
            .filter_map(|mode| canonical_mode_name(mode.as_ref()))
            .collect();
        names.sort();
        names.dedup();
        Self(names)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, mode: &str) -> bool {
        canonical_mode_name(mode).is_some_and(|name| self.0.binary_search(&name).is_ok())
    }
}

/// `"Own Car"`, `"own car"` and `"owncar"` all name the same mode.
fn canonical_mode_name(raw: &str) -> Option<String> {
    let name: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    (!name.is_empty()).then_some(name)
}

/// The two shapes transport modes have been stored in.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TransportModesInput {
    Sequence(Vec<String>),
    Mapping(BTreeMap<String, bool>),
}

impl From<TransportModesInput> for TransportModes {
    fn from(input: TransportModesInput) -> Self {
        match input {
            TransportModesInput::Sequence(modes) => TransportModes::new(modes),
            TransportModesInput::Mapping(flags) => TransportModes::new(
                flags
                    .into_iter()
                    .filter_map(|(mode, selected)| selected.then_some(mode)),
            ),
        }
    }
}

/// A number that may have been captured from a text field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrText::Number(value) => Some(*value),
            NumberOrText::Text(text) => text.trim().parse::<f64>().ok(),
        }
        .filter(|value| value.is_finite())
    }
}

impl From<f64> for NumberOrText {
    fn from(value: f64) -> Self {
        NumberOrText::Number(value)
    }
}

impl From<&str> for NumberOrText {
    fn from(value: &str) -> Self {
        NumberOrText::Text(value.to_string())
    }
}

/// Loosely-typed trip as it arrives from forms or older stored documents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDraft {
    pub trip_id: Option<String>,
    #[serde(alias = "userId")]
    pub owner_id: Option<String>,
    pub destination: Option<String>,
    pub budget: Option<NumberOrText>,
    pub transport_modes: Option<TransportModesInput>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(alias = "travelers", alias = "people")]
    pub traveler_count: Option<NumberOrText>,
}

impl TryFrom<TripDraft> for TripRequest {
    type Error = PlannerError;

    fn try_from(draft: TripDraft) -> Result<Self> {
        let request = TripRequest {
            trip_id: required("tripId", draft.trip_id)?,
            owner_id: required("ownerId", draft.owner_id)?,
            destination: required("destination", draft.destination)?
                .trim()
                .to_string(),
            budget: parse_budget(required("budget", draft.budget)?)?,
            transport_modes: required("transportModes", draft.transport_modes)?.into(),
            start_date: parse_calendar_date("startDate", &required("startDate", draft.start_date)?)?,
            end_date: parse_calendar_date("endDate", &required("endDate", draft.end_date)?)?,
            traveler_count: parse_traveler_count(required("travelerCount", draft.traveler_count)?)?,
        };
        request.validate()?;
        Ok(request)
    }
}

fn required<T>(field: &'static str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| PlannerError::validation(field, "is required"))
}

fn parse_budget(value: NumberOrText) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| PlannerError::validation("budget", format!("`{value:?}` is not a number")))
}

fn parse_traveler_count(value: NumberOrText) -> Result<u32> {
    let count = value.as_f64().filter(|count| count.fract() == 0.0);
    match count {
        Some(count) if count >= 1.0 && count <= f64::from(u32::MAX) => Ok(count as u32),
        _ => Err(PlannerError::validation(
            "travelerCount",
            format!("`{value:?}` is not a whole number of at least 1"),
        )),
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, compared by its UTC date.
pub fn parse_calendar_date(field: &'static str, raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc).date_naive()))
        .map_err(|_| PlannerError::validation(field, format!("`{raw}` is not a calendar date")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft_json() -> serde_json::Value {
        json!({
            "tripId": "trip-1",
            "userId": "owner-1",
            "tripName": "Goa getaway",
            "destination": " Goa ",
            "budget": "500",
            "transportModes": { "bus": true, "train": false, "flight": true },
            "startDate": "2025-05-10",
            "endDate": "2025-05-12T00:00:00.000Z",
            "travelers": "2"
        })
    }

    #[test]
    fn test_draft_is_normalized_on_ingress() {
        let request: TripRequest = serde_json::from_value(draft_json()).unwrap();

        assert_eq!(request.owner_id, "owner-1");
        assert_eq!(request.destination, "Goa");
        assert_eq!(request.budget, 500.0);
        assert_eq!(request.transport_modes.as_slice(), ["bus", "flight"]);
        assert_eq!(request.end_date, NaiveDate::from_ymd_opt(2025, 5, 12).unwrap());
        assert_eq!(request.traveler_count, 2);
        assert_eq!(request.day_count(), 2);
    }

    #[test]
    fn test_missing_field_is_named() {
        let mut value = draft_json();
        value.as_object_mut().unwrap().remove("transportModes");

        let err = serde_json::from_value::<TripRequest>(value).unwrap_err();
        assert!(err.to_string().contains("transportModes"));

        let draft = TripDraft {
            trip_id: Some("t".into()),
            owner_id: Some("o".into()),
            ..Default::default()
        };
        match TripRequest::try_from(draft) {
            Err(PlannerError::Validation { field, .. }) => assert_eq!(field, "destination"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_canonical_form_round_trips() {
        let request: TripRequest = serde_json::from_value(draft_json()).unwrap();
        let stored = serde_json::to_value(&request).unwrap();

        assert_eq!(stored["transportModes"], json!(["bus", "flight"]));
        assert_eq!(stored["startDate"], "2025-05-10");
        assert_eq!(stored["travelerCount"], 2);

        let reloaded: TripRequest = serde_json::from_value(stored).unwrap();
        assert_eq!(reloaded, request);
    }

    #[test]
    fn test_mode_names_are_canonical() {
        let modes = TransportModes::new(["Own Car", "Bus", "bus", "  "]);
        assert_eq!(modes.as_slice(), ["bus", "owncar"]);
        assert!(modes.contains("owncar"));
        assert!(modes.contains("OWN CAR"));
        assert!(!modes.contains("train"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut value = draft_json();
        value["budget"] = json!("lots");
        assert!(serde_json::from_value::<TripRequest>(value).is_err());

        let mut value = draft_json();
        value["travelers"] = json!(0);
        assert!(serde_json::from_value::<TripRequest>(value).is_err());

        let mut value = draft_json();
        value["tripId"] = json!("../etc");
        assert!(serde_json::from_value::<TripRequest>(value).is_err());

        let mut value = draft_json();
        value["startDate"] = json!("May 10th");
        assert!(serde_json::from_value::<TripRequest>(value).is_err());
    }
}
