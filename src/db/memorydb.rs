// In-memory ticket store for tests: rows per generation, injectable failures,
// latency and a gate to hold a query open.
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{
    atomic::{self, AtomicBool, AtomicUsize},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::turndb::TurnExt;
use crate::{
    models::{
        schemamodel::{SchemaGeneration, SchemaMapping},
        turnmodel::RawRow,
    },
    utils::rowfields,
};

#[derive(Default)]
pub struct MemoryTurnStore {
    rows: Mutex<HashMap<SchemaGeneration, Vec<RawRow>>>,
    fail: AtomicBool,
    latency: Mutex<Option<Duration>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pub entered: Arc<Notify>,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MemoryTurnStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, generation: SchemaGeneration, row: RawRow) {
        self.rows
            .lock()
            .unwrap()
            .entry(generation)
            .or_default()
            .push(row);
    }

    pub fn clear(&self) {
        self.rows.lock().unwrap().clear();
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, atomic::Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// Hold every query open until the returned `Notify` is signalled.
    pub fn hold_queries(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> usize {
        self.calls.load(atomic::Ordering::SeqCst)
    }

    fn pick<F>(&self, mapping: &SchemaMapping, mut filter: F) -> Option<RawRow>
    where
        F: FnMut(&RawRow) -> bool,
    {
        let rows = self.rows.lock().unwrap();
        let mut matching: Vec<&RawRow> = rows
            .get(&mapping.generation)
            .map(|rows| rows.iter().filter(|row| filter(row)).collect())
            .unwrap_or_default();

        matching.sort_by(|a, b| newest_first(a, b, mapping.issued_column));
        matching.first().map(|row| (*row).clone())
    }

    // Same ordering as `now_serving_sql`: serving rows first (a NULL status is
    // not serving), newest call among them, then newest issuance.
    fn pick_now_serving(&self, mapping: &SchemaMapping) -> Option<RawRow> {
        let rows = self.rows.lock().unwrap();
        let serving = |row: &RawRow| {
            rowfields::text(row, mapping.status_column)
                .map(|s| s.to_lowercase() == mapping.serving_status)
                .unwrap_or(false)
        };

        let mut all: Vec<&RawRow> = rows
            .get(&mapping.generation)
            .map(|rows| rows.iter().collect())
            .unwrap_or_default();

        all.sort_by(|a, b| {
            serving(b)
                .cmp(&serving(a))
                .then_with(|| {
                    if serving(a) && serving(b) {
                        newest_first(a, b, mapping.called_column)
                    } else {
                        Ordering::Equal
                    }
                })
                .then_with(|| newest_first(a, b, mapping.issued_column))
        });
        all.first().map(|row| (*row).clone())
    }

    async fn enter(&self) -> Result<(), sqlx::Error> {
        self.calls.fetch_add(1, atomic::Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, atomic::Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, atomic::Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);
        self.entered.notify_one();

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.fail.load(atomic::Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }
}

// Released on drop so a query abandoned mid-flight still counts down.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl TurnExt for MemoryTurnStore {
    async fn query_most_recent_ticket_by_code(
        &self,
        mapping: &SchemaMapping,
        code: &str,
    ) -> Result<Option<RawRow>, sqlx::Error> {
        self.enter().await?;
        Ok(self.pick(mapping, |row| {
            rowfields::text(row, mapping.code_column).as_deref() == Some(code)
        }))
    }

    async fn query_now_serving(
        &self,
        mapping: &SchemaMapping,
    ) -> Result<Option<RawRow>, sqlx::Error> {
        self.enter().await?;
        Ok(self.pick_now_serving(mapping))
    }
}

// Descending by the timestamp in `column`, rows without one last.
fn newest_first(a: &RawRow, b: &RawRow, column: &str) -> Ordering {
    match (rowfields::timestamp(a, column), rowfields::timestamp(b, column)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
