use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{itinerary::ItineraryPlan, trip::TripRequest};
use crate::store::StoreKey;

/// Persisted envelope for a generated itinerary.
///
/// Always written whole; a regeneration replaces every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub owner_id: String,
    pub trip_id: String,
    /// Request the plan was generated from
    pub source_request: TripRequest,
    pub plan: ItineraryPlan,
    pub created_at: DateTime<Utc>,
}

impl CacheRecord {
    pub fn new(request: &TripRequest, plan: ItineraryPlan) -> Self {
        Self {
            owner_id: request.owner_id.clone(),
            trip_id: request.trip_id.clone(),
            source_request: request.clone(),
            plan,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> StoreKey {
        StoreKey::new(&self.owner_id, &self.trip_id)
    }
}
