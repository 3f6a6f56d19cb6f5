#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use serde_json::json;
use trip_itinerary::{ItineraryGenerator, PlannerError, TripRequest};

/// Fails the test if the planner reaches the generator.
pub struct UnreachableGenerator;

#[async_trait]
impl ItineraryGenerator for UnreachableGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, PlannerError> {
        panic!("generator must not be called, prompt was:\n{prompt}");
    }
}

/// Replays canned response bodies, repeating the last one.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            last: Mutex::new(None),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItineraryGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, PlannerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let next = self.responses.lock().unwrap().pop_front();
        let response = {
            let mut last = self.last.lock().unwrap();
            if let Some(next) = next {
                *last = Some(next);
            }
            last.clone().expect("ScriptedGenerator has no responses")
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(response)
    }
}

/// Wrap candidate text in a `generateContent` response body.
pub fn envelope(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

/// Plan text with `days` days, each with one activity named after `label`.
pub fn plan_text(days: u32, label: &str) -> String {
    let days: Vec<_> = (1..=days)
        .map(|day| {
            json!({
                "day": day,
                "date": format!("2025-05-{:02}", 9 + day),
                "activities": [{
                    "time": "9:00 AM",
                    "description": format!("{label} day {day}"),
                    "distanceFromPrevious": "0 km"
                }]
            })
        })
        .collect();
    serde_json::to_string(&days).unwrap()
}

pub fn trip(budget: f64) -> TripRequest {
    serde_json::from_value(json!({
        "tripId": "trip-1",
        "ownerId": "owner-1",
        "destination": "Goa",
        "budget": budget,
        "transportModes": ["bus", "flight"],
        "startDate": "2025-05-10",
        "endDate": "2025-05-12",
        "travelerCount": 2
    }))
    .unwrap()
}
