use crate::types::TripRequest;

const PLANNING_REQUIREMENTS: &[&str] = &[
    "Famous and must-visit places, avoiding peak hours",
    "Proper breaks: breakfast, lunch, tea break, dinner and night stay",
    "Approximate distance from the previous place, in km",
    "Comfortable and relaxed pacing",
    "Exactly one entry per day of the trip, numbered from 1",
    "Respect the budget",
];

/// Build the generation prompt for a trip.
///
/// The caller guarantees a positive day count.
pub fn build_itinerary_prompt(request: &TripRequest) -> String {
    let modes = if request.transport_modes.is_empty() {
        "any".to_string()
    } else {
        request.transport_modes.as_slice().join(", ")
    };

    let requirements = PLANNING_REQUIREMENTS
        .iter()
        .map(|line| format!("- {line}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Plan a trip to {destination} with the following details:\n\
         - Start date: {start}\n\
         - Number of days: {days}\n\
         - Number of people: {people}\n\
         - Budget: {budget}\n\
         - Preferred transport modes: {modes}\n\
         \n\
         Requirements:\n\
         {requirements}\n\
         \n\
         Respond with a JSON array only, no explanation before or after it, in exactly this shape:\n\
         [\n  \
           {{\n    \
             \"day\": 1,\n    \
             \"date\": \"{start}\",\n    \
             \"activities\": [\n      \
               {{ \"time\": \"9:00 AM\", \"description\": \"Start at the first sight\", \"distanceFromPrevious\": \"0 km\" }},\n      \
               {{ \"time\": \"11:00 AM\", \"description\": \"Visit the next sight\", \"distanceFromPrevious\": \"8 km\" }}\n    \
             ]\n  \
           }}\n\
         ]",
        destination = request.destination,
        start = request.start_date.format("%Y-%m-%d"),
        days = request.day_count(),
        people = request.traveler_count,
        budget = format_amount(request.budget),
    )
}

/// `500.0` prints as `500`, `499.5` stays as is.
fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{amount}")
    }
}
