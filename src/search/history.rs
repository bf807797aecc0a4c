//! Search-history recording with TTL deduplication / 検索履歴
//!
//! An explicit component constructed once per process and passed by
//! reference; there is no process-wide singleton. Repeated identical
//! searches from the same session inside the TTL window are recorded only
//! once. A history failure is logged and never fails the search itself.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Which entry point produced the search / 検索種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Keyword,
    Multi,
    Location,
    Architect,
}

impl SearchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Multi => "multi",
            Self::Location => "location",
            Self::Architect => "architect",
        }
    }
}

/// TTL-keyed dedup map plus the recorder / 履歴レコーダ
pub struct SearchHistory {
    ttl: Duration,
    seen: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl SearchHistory {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            ttl: Duration::minutes(ttl_minutes),
            seen: RwLock::new(HashMap::new()),
        }
    }

    /// Check-and-mark in one step. Expired entries are swept on the way.
    pub fn should_record(&self, session_id: &str, query: &str, kind: SearchKind) -> bool {
        let key = format!("{}|{}|{}", session_id, query, kind.as_str());
        let now = Utc::now();

        let mut seen = self.seen.write();
        seen.retain(|_, recorded_at| now.signed_duration_since(*recorded_at) < self.ttl);

        if seen.contains_key(&key) {
            return false;
        }
        seen.insert(key, now);
        true
    }

    /// Record a search into the history table, deduplicated.
    pub async fn record(&self, pool: &SqlitePool, session_id: &str, query: &str, kind: SearchKind) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        if !self.should_record(session_id, query, kind) {
            tracing::debug!("Duplicate search skipped: {} ({})", query, kind.as_str());
            return;
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO search_history (session_id, query, search_type, searched_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(query)
        .bind(kind.as_str())
        .bind(&now)
        .execute(pool)
        .await;

        if let Err(e) = result {
            tracing::warn!("Failed to record search history: {}", e);
        }
    }
}
