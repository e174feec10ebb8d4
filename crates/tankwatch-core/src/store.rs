//! History store boundary and an in-memory implementation
//!
//! The analytics never talk to a database directly: they receive an
//! `Arc<dyn HistoryStore>` and an `Arc<dyn Clock>`. `InMemoryHistoryStore`
//! backs the CLI, the web server and the tests. It uses DashMap for
//! per-entity locking and parking_lot::RwLock for the health flag.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::event::{DataEvent, EventBus};
use crate::models::{EntityKind, Generator, Reading, SeedData, Tank, clamp_level};

/// Longest history window a caller may ask for (100 years)
pub const MAX_WINDOW_HOURS: u32 = 24 * 366 * 100;

/// Start of a window ending at `now`
///
/// Windows longer than [`MAX_WINDOW_HOURS`] are rejected rather than
/// letting the date arithmetic overflow.
pub fn window_start(now: DateTime<Utc>, hours: u32) -> Result<DateTime<Utc>, CoreError> {
    let invalid = || CoreError::InvalidWindow {
        hours,
        max: MAX_WINDOW_HOURS,
    };
    if hours > MAX_WINDOW_HOURS {
        return Err(invalid());
    }
    now.checked_sub_signed(Duration::hours(i64::from(hours)))
        .ok_or_else(invalid)
}

/// Time source
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Read access to level history
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Readings of one entity within the last `hours`, ascending by
    /// timestamp, at most `limit` entries (the oldest ones are kept)
    async fn history(
        &self,
        kind: EntityKind,
        id: &str,
        hours: u32,
        limit: usize,
    ) -> Result<Vec<Reading>, CoreError>;

    /// Level the entity currently reports
    async fn current_level(&self, kind: EntityKind, id: &str) -> Result<f64, CoreError>;
}

/// Health of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreHealth {
    Healthy,
    /// All reads fail with `StoreUnavailable`
    Offline { reason: String },
}

impl StoreHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, StoreHealth::Healthy)
    }
}

type HistoryKey = (EntityKind, String);

/// In-memory history store
pub struct InMemoryHistoryStore {
    tanks: DashMap<String, Tank>,
    generators: DashMap<String, Generator>,
    /// Sorted ascending by timestamp
    readings: DashMap<HistoryKey, Vec<Reading>>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    health: RwLock<StoreHealth>,
}

impl InMemoryHistoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tanks: DashMap::new(),
            generators: DashMap::new(),
            readings: DashMap::new(),
            clock,
            event_bus: EventBus::default_capacity(),
            health: RwLock::new(StoreHealth::Healthy),
        }
    }

    /// Store backed by the wall clock
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn health(&self) -> StoreHealth {
        self.health.read().clone()
    }

    /// Take the store offline (`Some(reason)`) or bring it back (`None`)
    pub fn set_offline(&self, reason: Option<String>) {
        let mut health = self.health.write();
        *health = match reason {
            Some(reason) => {
                warn!(%reason, "History store marked offline");
                StoreHealth::Offline { reason }
            }
            None => StoreHealth::Healthy,
        };
    }

    fn ensure_online(&self) -> Result<(), CoreError> {
        match &*self.health.read() {
            StoreHealth::Healthy => Ok(()),
            StoreHealth::Offline { reason } => Err(CoreError::StoreUnavailable {
                reason: reason.clone(),
            }),
        }
    }

    fn exists(&self, kind: EntityKind, id: &str) -> bool {
        match kind {
            EntityKind::Tank => self.tanks.contains_key(id),
            EntityKind::Generator => self.generators.contains_key(id),
        }
    }

    /// Ids are unique across kinds, so a bulk result keyed by id is unambiguous
    fn ensure_unclaimed(&self, kind: EntityKind, id: &str) -> Result<(), CoreError> {
        let other = match kind {
            EntityKind::Tank => EntityKind::Generator,
            EntityKind::Generator => EntityKind::Tank,
        };
        if self.exists(other, id) {
            return Err(CoreError::DuplicateId {
                id: id.to_string(),
                existing: other,
            });
        }
        Ok(())
    }

    pub fn upsert_tank(&self, tank: Tank) -> Result<(), CoreError> {
        self.ensure_unclaimed(EntityKind::Tank, &tank.id)?;
        let id = tank.id.clone();
        self.tanks.insert(id.clone(), tank);
        self.event_bus.publish(DataEvent::EntityUpdated {
            kind: EntityKind::Tank,
            id,
        });
        Ok(())
    }

    pub fn upsert_generator(&self, generator: Generator) -> Result<(), CoreError> {
        self.ensure_unclaimed(EntityKind::Generator, &generator.id)?;
        let id = generator.id.clone();
        self.generators.insert(id.clone(), generator);
        self.event_bus.publish(DataEvent::EntityUpdated {
            kind: EntityKind::Generator,
            id,
        });
        Ok(())
    }

    /// Tanks sorted by id
    pub fn tanks(&self) -> Vec<Tank> {
        let mut tanks: Vec<Tank> = self.tanks.iter().map(|e| e.value().clone()).collect();
        tanks.sort_by(|a, b| a.id.cmp(&b.id));
        tanks
    }

    /// Generators sorted by id
    pub fn generators(&self) -> Vec<Generator> {
        let mut generators: Vec<Generator> =
            self.generators.iter().map(|e| e.value().clone()).collect();
        generators.sort_by(|a, b| a.id.cmp(&b.id));
        generators
    }

    pub fn tank_ids(&self) -> Vec<String> {
        self.tanks().into_iter().map(|t| t.id).collect()
    }

    pub fn generator_ids(&self) -> Vec<String> {
        self.generators().into_iter().map(|g| g.id).collect()
    }

    /// Record a level reading
    ///
    /// The level is clamped to 0-100. If the reading is the newest one for
    /// its entity, the entity's current level follows it.
    pub fn record(&self, mut reading: Reading) -> Result<(), CoreError> {
        let kind = reading.entity_type;
        let id = reading.entity_id.clone();
        if !self.exists(kind, &id) {
            return Err(CoreError::EntityNotFound { kind, id });
        }
        reading.level = clamp_level(reading.level);
        let level = reading.level;

        let is_latest = {
            let mut series = self.readings.entry((kind, id.clone())).or_default();
            let pos = series.partition_point(|r| r.timestamp <= reading.timestamp);
            series.insert(pos, reading);
            pos + 1 == series.len()
        };

        if is_latest {
            match kind {
                EntityKind::Tank => {
                    if let Some(mut tank) = self.tanks.get_mut(&id) {
                        tank.current_level = level;
                    }
                }
                EntityKind::Generator => {
                    if let Some(mut generator) = self.generators.get_mut(&id) {
                        generator.current_level = level;
                    }
                }
            }
        }

        debug!(%kind, %id, level, "Reading recorded");
        self.event_bus
            .publish(DataEvent::ReadingRecorded { kind, id, level });
        Ok(())
    }

    /// Load entities and readings from a seed; returns the number of readings kept
    pub fn load_seed(&self, mut seed: SeedData) -> usize {
        for tank in std::mem::take(&mut seed.tanks) {
            if let Err(e) = self.upsert_tank(tank) {
                warn!(error = %e, "Skipping seed tank");
            }
        }
        for generator in std::mem::take(&mut seed.generators) {
            if let Err(e) = self.upsert_generator(generator) {
                warn!(error = %e, "Skipping seed generator");
            }
        }

        let mut loaded = 0;
        let readings = std::mem::take(&mut seed.readings);
        for reading in readings {
            if !seed.may_record(&reading.recorded_by) {
                warn!(
                    entity_id = %reading.entity_id,
                    recorded_by = %reading.recorded_by,
                    "Skipping seed reading from user without update_levels"
                );
                continue;
            }
            match self.record(reading) {
                Ok(()) => loaded += 1,
                Err(e) => warn!(error = %e, "Skipping seed reading"),
            }
        }

        info!(
            tanks = self.tanks.len(),
            generators = self.generators.len(),
            readings = loaded,
            "Seed data loaded"
        );
        self.event_bus.publish(DataEvent::LoadCompleted);
        loaded
    }

    /// Drop readings older than `max_age`; returns how many were removed
    ///
    /// An age reaching past the earliest representable date keeps everything.
    pub fn retain(&self, max_age: Duration) -> usize {
        let Some(cutoff) = self.clock.now().checked_sub_signed(max_age) else {
            debug!("Retention window exceeds date range, nothing pruned");
            return 0;
        };
        let mut removed = 0;
        for mut series in self.readings.iter_mut() {
            let before = series.len();
            series.retain(|r| r.timestamp >= cutoff);
            removed += before - series.len();
        }
        if removed > 0 {
            info!(removed, "Pruned readings outside retention window");
            self.event_bus.publish(DataEvent::HistoryPruned { removed });
        }
        removed
    }

    /// Number of readings held for one entity
    pub fn reading_count(&self, kind: EntityKind, id: &str) -> usize {
        self.readings
            .get(&(kind, id.to_string()))
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn history(
        &self,
        kind: EntityKind,
        id: &str,
        hours: u32,
        limit: usize,
    ) -> Result<Vec<Reading>, CoreError> {
        self.ensure_online()?;
        if !self.exists(kind, id) {
            return Err(CoreError::EntityNotFound {
                kind,
                id: id.to_string(),
            });
        }

        let cutoff = window_start(self.clock.now(), hours)?;
        let window = self
            .readings
            .get(&(kind, id.to_string()))
            .map(|series| {
                series
                    .iter()
                    .filter(|r| r.timestamp >= cutoff)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(window)
    }

    async fn current_level(&self, kind: EntityKind, id: &str) -> Result<f64, CoreError> {
        self.ensure_online()?;
        let level = match kind {
            EntityKind::Tank => self.tanks.get(id).map(|t| t.current_level),
            EntityKind::Generator => self.generators.get(id).map(|g| g.current_level),
        };
        level.ok_or_else(|| CoreError::EntityNotFound {
            kind,
            id: id.to_string(),
        })
    }
}
