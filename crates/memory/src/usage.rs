//! Per-day usage accounting: one additively mutated record per
//! (task type, calendar day) pair, updated under a single write lock so
//! concurrent requests never lose increments.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use promo_core::task::TaskType;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub task_type: TaskType,
    pub day: NaiveDate,
    pub invocations: u64,
    pub estimated_cost: f64,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
struct UsageKey {
    task_type: TaskType,
    day: NaiveDate,
}

#[derive(Default)]
pub struct UsageTracker {
    records: RwLock<HashMap<UsageKey, UsageRecord>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_invocation(&self, task_type: TaskType, estimated_cost: f64) {
        self.record_invocation_at(task_type, estimated_cost, Utc::now()).await;
    }

    pub async fn record_invocation_at(
        &self,
        task_type: TaskType,
        estimated_cost: f64,
        now: DateTime<Utc>,
    ) {
        let day = now.date_naive();
        let mut records = self.records.write().await;
        let record = records.entry(UsageKey { task_type, day }).or_insert(UsageRecord {
            task_type,
            day,
            invocations: 0,
            estimated_cost: 0.0,
        });
        record.invocations += 1;
        record.estimated_cost += estimated_cost;
    }

    pub async fn usage_for(&self, task_type: TaskType, day: NaiveDate) -> Option<UsageRecord> {
        let records = self.records.read().await;
        records.get(&UsageKey { task_type, day }).cloned()
    }

    /// Total estimated spend across all task types for one day.
    pub async fn daily_total(&self, day: NaiveDate) -> f64 {
        let records = self.records.read().await;
        records.values().filter(|record| record.day == day).map(|record| record.estimated_cost).sum()
    }

    pub async fn snapshot(&self) -> Vec<UsageRecord> {
        let records = self.records.read().await;
        let mut all: Vec<UsageRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| (a.day, a.task_type.as_str()).cmp(&(b.day, b.task_type.as_str())));
        all
    }
}
