use std::sync::OnceLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schemas::{ResponseSchema, SchemaHandle};

/// Day-by-day itinerary generated for a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ItineraryPlan {
    /// One entry per day of the trip, in order
    #[schemars(length(min = 1))]
    pub days: Vec<DayPlan>,
}

impl ItineraryPlan {
    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn activity_count(&self) -> usize {
        self.days.iter().map(|day| day.activities.len()).sum()
    }
}

impl ResponseSchema for ItineraryPlan {
    fn schema() -> &'static SchemaHandle {
        static SCHEMA: OnceLock<SchemaHandle> = OnceLock::new();
        SCHEMA.get_or_init(|| SchemaHandle::derive::<Self>("ItineraryPlan"))
    }
}

/// Planned activities for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DayPlan {
    /// 1-based day counter within the trip
    #[schemars(range(min = 1))]
    pub day: u32,
    /// Calendar date of the day, e.g. "2025-05-10"
    pub date: String,
    /// Activities in chronological order
    #[schemars(length(min = 1))]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Free-form time of day, e.g. "9:00 AM"
    pub time: String,
    /// What happens at this time
    pub description: String,
    /// Travel distance from the previous activity, e.g. "8 km"
    pub distance_from_previous: String,
}
