use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::equality::changed_fields;
use crate::{
    error::{PlannerError, Result},
    services::{build_itinerary_prompt, parse_generated_plan, ItineraryGenerator},
    store::{PlanStore, StoreKey},
    types::{trip::validate_identifier, CacheRecord, ItineraryPlan, TripRequest},
};

/// Where a returned plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    Cached,
    Generated,
}

/// A plan together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanResolution {
    pub plan: ItineraryPlan,
    pub source: PlanSource,
    pub created_at: DateTime<Utc>,
}

type KeyLocks = Mutex<HashMap<StoreKey, Arc<AsyncMutex<()>>>>;

/// Cache-aside orchestrator for generated itineraries.
///
/// Reads the stored record for a trip, reuses its plan while the trip is
/// unchanged, and otherwise generates, validates and stores a new one. A
/// stored record is only replaced after the new plan has fully validated.
pub struct ItineraryPlanner {
    store: Arc<dyn PlanStore>,
    generator: Arc<dyn ItineraryGenerator>,
    key_locks: Option<KeyLocks>,
}

impl ItineraryPlanner {
    pub fn new(store: Arc<dyn PlanStore>, generator: Arc<dyn ItineraryGenerator>) -> Self {
        Self {
            store,
            generator,
            key_locks: None,
        }
    }

    /// Serialise calls for the same (owner, trip) within this planner.
    ///
    /// Without it, concurrent calls for one trip may each generate and the
    /// last write wins.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.key_locks = enabled.then(KeyLocks::default);
        self
    }

    pub fn store(&self) -> &Arc<dyn PlanStore> {
        &self.store
    }

    /// Return the cached plan for an unchanged trip, or generate and store one.
    pub async fn get_or_create_plan(&self, request: &TripRequest) -> Result<ItineraryPlan> {
        self.resolve(request).await.map(|resolution| resolution.plan)
    }

    /// Like [`get_or_create_plan`](Self::get_or_create_plan), also reporting
    /// whether the plan was reused.
    pub async fn resolve(&self, request: &TripRequest) -> Result<PlanResolution> {
        request.validate()?;
        let key = StoreKey::new(&request.owner_id, &request.trip_id);
        let _guard = self.lock_key(&key).await;

        match self.store.get(&key).await? {
            Some(record) => {
                let changed = changed_fields(&record.source_request, request);
                if changed.is_empty() {
                    info!(target: "itinerary::cache", %key, "cache hit");
                    return Ok(PlanResolution {
                        plan: record.plan,
                        source: PlanSource::Cached,
                        created_at: record.created_at,
                    });
                }
                info!(target: "itinerary::cache", %key, ?changed, "trip changed, regenerating");
            }
            None => info!(target: "itinerary::cache", %key, "cache miss"),
        }

        self.generate_and_store(request, &key).await
    }

    /// Generate a fresh plan even if the stored one is still valid.
    pub async fn regenerate_plan(&self, request: &TripRequest) -> Result<PlanResolution> {
        request.validate()?;
        let key = StoreKey::new(&request.owner_id, &request.trip_id);
        let _guard = self.lock_key(&key).await;

        info!(target: "itinerary::cache", %key, "forced regeneration");
        self.generate_and_store(request, &key).await
    }

    /// Read the stored record without generating anything.
    pub async fn fetch_plan(&self, owner_id: &str, trip_id: &str) -> Result<CacheRecord> {
        fetch_record(self.store.as_ref(), owner_id, trip_id).await
    }

    async fn generate_and_store(
        &self,
        request: &TripRequest,
        key: &StoreKey,
    ) -> Result<PlanResolution> {
        let days = request.day_count();
        if days <= 0 {
            return Err(PlannerError::InvalidDateRange {
                start: request.start_date,
                end: request.end_date,
            });
        }

        let prompt = build_itinerary_prompt(request);
        debug!(target: "itinerary::generator", %key, days, "requesting itinerary");

        let raw = self.generator.generate(&prompt).await?;
        let plan = parse_generated_plan(&raw)?;

        if plan.day_count() as i64 != days {
            warn!(
                target: "itinerary::generator",
                %key,
                expected = days,
                received = plan.day_count(),
                "generated plan day count differs from trip length"
            );
        }

        let record = CacheRecord::new(request, plan);
        self.store.set(key, &record).await?;
        info!(
            target: "itinerary::cache",
            %key,
            store = self.store.name(),
            days = record.plan.day_count(),
            "plan stored"
        );

        Ok(PlanResolution {
            plan: record.plan,
            source: PlanSource::Generated,
            created_at: record.created_at,
        })
    }

    async fn lock_key(&self, key: &StoreKey) -> Option<OwnedMutexGuard<()>> {
        let locks = self.key_locks.as_ref()?;
        let lock = {
            let mut locks = locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        Some(lock.lock_owned().await)
    }
}

/// Read the record stored for a trip, failing with `PlanNotFound` when absent.
///
/// Needs only a store, so read-only callers can use it without a generator.
pub async fn fetch_record(
    store: &dyn PlanStore,
    owner_id: &str,
    trip_id: &str,
) -> Result<CacheRecord> {
    validate_identifier("ownerId", owner_id)?;
    validate_identifier("tripId", trip_id)?;

    store
        .get(&StoreKey::new(owner_id, trip_id))
        .await?
        .ok_or_else(|| PlannerError::PlanNotFound {
            owner_id: owner_id.to_string(),
            trip_id: trip_id.to_string(),
        })
}

impl fmt::Debug for ItineraryPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItineraryPlanner")
            .field("store", &self.store.name())
            .field("single_flight", &self.key_locks.is_some())
            .finish()
    }
}
