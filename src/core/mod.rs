pub mod equality;
pub mod planner;

pub use equality::{changed_fields, same_trip};
pub use planner::{fetch_record, ItineraryPlanner, PlanResolution, PlanSource};
