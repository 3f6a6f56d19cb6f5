//! trip-itinerary: cache-aside generation of day-by-day trip itineraries
//!
//! A trip's itinerary is generated once by a Gemini model, validated against a
//! JSON schema, and stored per (owner, trip). Later requests for an unchanged
//! trip are served from the store without calling the model.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trip_itinerary::{FilePlanStore, GeminiClient, ItineraryPlanner, TripRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api_key = std::env::var("GEMINI_API_KEY")?;
//!     let planner = ItineraryPlanner::new(
//!         Arc::new(FilePlanStore::new(".trip-plans")),
//!         Arc::new(GeminiClient::new(api_key)),
//!     );
//!
//!     let request: TripRequest = serde_json::from_str(
//!         r#"{"tripId":"t1","ownerId":"u1","destination":"Goa","budget":15000,
//!             "transportModes":["bus"],"startDate":"2025-05-10",
//!             "endDate":"2025-05-13","travelerCount":2}"#,
//!     )?;
//!     let plan = planner.get_or_create_plan(&request).await?;
//!     println!("{} days planned", plan.day_count());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod schemas;
pub mod services;
pub mod store;
pub mod types;

pub use crate::core::{
    changed_fields, fetch_record, same_trip, ItineraryPlanner, PlanResolution, PlanSource,
};
pub use config::PlannerConfig;
pub use error::{PlannerError, Result};
pub use schemas::{ResponseSchema, SchemaHandle};
pub use services::{
    build_itinerary_prompt, extract_json_text, parse_and_validate, GeminiClient,
    ItineraryGenerator, RetryPolicy,
};
pub use store::{FilePlanStore, MemoryPlanStore, PlanStore, StoreError, StoreKey};
pub use types::{
    Activity, CacheRecord, DayPlan, ItineraryPlan, TransportModes, TripDraft, TripRequest,
};

#[cfg(feature = "cli")]
pub mod cli;
