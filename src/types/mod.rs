pub mod itinerary;
pub mod record;
pub mod trip;

pub use itinerary::{Activity, DayPlan, ItineraryPlan};
pub use record::CacheRecord;
pub use trip::{NumberOrText, TransportModes, TransportModesInput, TripDraft, TripRequest};
