//! In-memory store of recent analyses.
//!
//! Analyses are kept so clients can fetch them again (e.g. to render a graph)
//! without re-running EXPLAIN. The store is bounded: once full, the oldest
//! analysis is evicted for each new one.

use crate::models::analysis::{Analysis, AnalysisSummary};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared, bounded store of analyses, oldest first.
#[derive(Debug, Clone)]
pub struct AnalysisStore {
    entries: Arc<RwLock<VecDeque<Analysis>>>,
    capacity: usize,
}

impl AnalysisStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            capacity,
        }
    }

    /// Store an analysis, evicting the oldest ones beyond capacity.
    pub async fn insert(&self, analysis: Analysis) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.entries.write().await;
        while entries.len() >= self.capacity {
            if let Some(evicted) = entries.pop_front() {
                tracing::debug!(id = %evicted.id, "analysis evicted");
            }
        }
        entries.push_back(analysis);
    }

    pub async fn get(&self, id: Uuid) -> Option<Analysis> {
        self.entries
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    /// Summaries of the most recent analyses, newest first.
    ///
    /// When `fingerprint` is given only analyses of that query are listed.
    pub async fn list(&self, fingerprint: Option<&str>, limit: usize) -> Vec<AnalysisSummary> {
        self.entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|a| fingerprint.is_none_or(|f| a.fingerprint == f))
            .take(limit)
            .map(AnalysisSummary::from)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
