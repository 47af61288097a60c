//! Two-tier memory store.
//!
//! Short-term tier: every built context, purged opportunistically once older
//! than the retention window. Durable tier: accepted responses keyed per task
//! type and campaign, FIFO-capped by insertion order (access never refreshes
//! recency). Each public operation takes the write lock once and performs the
//! whole read-modify-write under it.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use promo_core::config::MemoryConfig;
use promo_core::context::{fields, Context};
use promo_core::task::TaskType;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: Uuid,
    pub task_type: TaskType,
    pub context: Context,
    pub response: Option<Value>,
    pub recorded_at: DateTime<Utc>,
}

/// Durable history key: responses are grouped per task type and campaign.
/// Tasks with no campaign in scope share a per-task bucket.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
struct HistoryKey {
    task_type: TaskType,
    campaign_id: Option<String>,
}

pub struct MemoryStore {
    config: MemoryConfig,
    short_term: RwLock<VecDeque<MemoryRecord>>,
    histories: RwLock<HashMap<HistoryKey, VecDeque<MemoryRecord>>>,
}

impl MemoryStore {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            short_term: RwLock::new(VecDeque::new()),
            histories: RwLock::new(HashMap::new()),
        }
    }

    pub async fn record_context(&self, task_type: TaskType, context: &Context) {
        self.record_context_at(task_type, context, Utc::now()).await;
    }

    /// Clock-explicit variant so tests can drive retention directly.
    pub async fn record_context_at(
        &self,
        task_type: TaskType,
        context: &Context,
        now: DateTime<Utc>,
    ) {
        let record = MemoryRecord {
            id: Uuid::new_v4(),
            task_type,
            context: context.clone(),
            response: None,
            recorded_at: now,
        };

        let mut short_term = self.short_term.write().await;
        purge_expired(&mut short_term, now, self.config.short_term_ttl_secs);
        short_term.push_back(record);
    }

    pub async fn record_response(&self, task_type: TaskType, context: &Context, response: &Value) {
        self.record_response_at(task_type, context, response, Utc::now()).await;
    }

    pub async fn record_response_at(
        &self,
        task_type: TaskType,
        context: &Context,
        response: &Value,
        now: DateTime<Utc>,
    ) {
        let key = HistoryKey {
            task_type,
            campaign_id: context.scalar_str(fields::CAMPAIGN_ID).map(str::to_string),
        };
        let record = MemoryRecord {
            id: Uuid::new_v4(),
            task_type,
            context: context.clone(),
            response: Some(response.clone()),
            recorded_at: now,
        };

        let mut histories = self.histories.write().await;
        let history = histories.entry(key).or_default();
        history.push_back(record);
        while history.len() > self.config.campaign_cap {
            history.pop_front();
        }
    }

    /// Most recent short-lived contexts for a task, newest first, optionally
    /// narrowed to one business. Expired entries are purged on the way.
    pub async fn recent_contexts(
        &self,
        task_type: TaskType,
        business_id: Option<&str>,
        limit: usize,
    ) -> Vec<MemoryRecord> {
        self.recent_contexts_at(task_type, business_id, limit, Utc::now()).await
    }

    pub async fn recent_contexts_at(
        &self,
        task_type: TaskType,
        business_id: Option<&str>,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<MemoryRecord> {
        let mut short_term = self.short_term.write().await;
        purge_expired(&mut short_term, now, self.config.short_term_ttl_secs);

        short_term
            .iter()
            .rev()
            .filter(|record| record.task_type == task_type)
            .filter(|record| match business_id {
                Some(id) => record.context.scalar_str(fields::BUSINESS_ID) == Some(id),
                None => true,
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// Accepted responses for one campaign (or the per-task bucket when no
    /// campaign is given), newest first.
    pub async fn recent_responses(
        &self,
        task_type: TaskType,
        campaign_id: Option<&str>,
        limit: usize,
    ) -> Vec<MemoryRecord> {
        let key =
            HistoryKey { task_type, campaign_id: campaign_id.map(str::to_string) };
        let histories = self.histories.read().await;
        match histories.get(&key) {
            Some(history) => history.iter().rev().take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub async fn short_term_len(&self) -> usize {
        self.short_term.read().await.len()
    }
}

fn purge_expired(records: &mut VecDeque<MemoryRecord>, now: DateTime<Utc>, ttl_secs: u64) {
    let cutoff = now - Duration::seconds(ttl_secs as i64);
    // Insertion order means expired records are always at the front.
    while records.front().is_some_and(|record| record.recorded_at <= cutoff) {
        records.pop_front();
    }
}
