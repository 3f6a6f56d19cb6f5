use crate::types::TripRequest;

/// Fields whose change invalidates a cached plan.
///
/// Identity fields are excluded: they already form the cache key. Transport
/// modes compare as sorted selected names and budgets by numeric value. The
/// destination is compared trimmed, as it is after a store round trip.
pub fn changed_fields(stored: &TripRequest, incoming: &TripRequest) -> Vec<&'static str> {
    let checks = [
        (
            "destination",
            stored.destination.trim() == incoming.destination.trim(),
        ),
        ("budget", stored.budget == incoming.budget),
        (
            "transportModes",
            stored.transport_modes == incoming.transport_modes,
        ),
        ("startDate", stored.start_date == incoming.start_date),
        ("endDate", stored.end_date == incoming.end_date),
        (
            "travelerCount",
            stored.traveler_count == incoming.traveler_count,
        ),
    ];

    checks
        .into_iter()
        .filter_map(|(field, same)| (!same).then_some(field))
        .collect()
}

/// Whether a plan generated for `stored` is still valid for `incoming`.
pub fn same_trip(stored: &TripRequest, incoming: &TripRequest) -> bool {
    changed_fields(stored, incoming).is_empty()
}
