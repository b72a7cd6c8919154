//! Deployment history service

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use deploy_orchestrator_provider::DeploymentTarget;

use crate::error::CoreResult;
use crate::services::ServiceContext;
use crate::types::{DeployResult, DeployStatus, DeploymentRecord, DeploymentStats, HistoryFilter};

/// Records retained when no explicit bound is configured.
pub const DEFAULT_MAX_RECORDS: usize = 500;

/// Bounded, persisted log of dispatch attempts
///
/// The repository is read once, on first successful use. Every append rewrites
/// the whole retained set while the lock is held, so concurrent appends never
/// lose records. While the repository cannot be read, appends fail and nothing
/// is written over it.
pub struct DeploymentHistoryService {
    ctx: Arc<ServiceContext>,
    max_records: usize,
    state: Mutex<Option<Vec<DeploymentRecord>>>,
}

impl DeploymentHistoryService {
    #[must_use]
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self::with_max_records(ctx, DEFAULT_MAX_RECORDS)
    }

    #[must_use]
    pub fn with_max_records(ctx: Arc<ServiceContext>, max_records: usize) -> Self {
        Self {
            ctx,
            max_records: max_records.max(1),
            state: Mutex::new(None),
        }
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }

    /// Append one attempt, evicting the oldest beyond the bound.
    ///
    /// The record stays in memory even when persisting it fails.
    pub async fn record(
        &self,
        result: &DeployResult,
        target: DeploymentTarget,
        domain: &str,
    ) -> CoreResult<DeploymentRecord> {
        let record = DeploymentRecord::from_result(result, target, domain);

        let mut guard = self.state.lock().await;
        let records = self.loaded(&mut guard).await?;
        records.push(record.clone());
        trim_oldest(records, self.max_records);

        log::debug!(
            "Recorded {} deployment of {} to {target}",
            record.status,
            record.domain
        );
        self.ctx.history_repository.save(records).await?;
        Ok(record)
    }

    /// Matching records, newest first.
    pub async fn list(&self, filter: &HistoryFilter) -> Vec<DeploymentRecord> {
        let mut guard = self.state.lock().await;
        let records = match self.loaded(&mut guard).await {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Deployment history unavailable: {e}");
                return Vec::new();
            }
        };
        let matching = records.iter().rev().filter(|r| filter.matches(r)).cloned();
        match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        }
    }

    pub async fn stats(&self) -> DeploymentStats {
        self.stats_at(Utc::now()).await
    }

    /// Aggregates relative to `now`.
    pub async fn stats_at(&self, now: DateTime<Utc>) -> DeploymentStats {
        let mut guard = self.state.lock().await;
        match self.loaded(&mut guard).await {
            Ok(records) => compute_stats(records, now),
            Err(e) => {
                log::warn!("Deployment history unavailable: {e}");
                compute_stats(&[], now)
            }
        }
    }

    /// Drop every record, in memory and in storage.
    ///
    /// Also replaces a stored list that can no longer be read.
    pub async fn clear(&self) -> CoreResult<()> {
        let mut guard = self.state.lock().await;
        let removed = match self.loaded(&mut guard).await {
            Ok(records) => records.len(),
            Err(e) => {
                log::warn!("Replacing unreadable deployment history: {e}");
                0
            }
        };
        self.ctx.history_repository.save(&[]).await?;
        *guard = Some(Vec::new());
        log::info!("Cleared {removed} deployment record(s)");
        Ok(())
    }

    /// The retained list, loading it on first use. A failed load is not cached.
    async fn loaded<'a>(
        &self,
        state: &'a mut Option<Vec<DeploymentRecord>>,
    ) -> CoreResult<&'a mut Vec<DeploymentRecord>> {
        if state.is_none() {
            let mut records = self.ctx.history_repository.load().await?;
            trim_oldest(&mut records, self.max_records);
            log::debug!("Loaded {} deployment record(s)", records.len());
            *state = Some(records);
        }
        Ok(state.get_or_insert_with(Vec::new))
    }
}

fn trim_oldest(records: &mut Vec<DeploymentRecord>, max: usize) {
    if records.len() > max {
        let excess = records.len() - max;
        records.drain(..excess);
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn compute_stats(records: &[DeploymentRecord], now: DateTime<Utc>) -> DeploymentStats {
    let mut stats = DeploymentStats::default();
    let day_ago = now - Duration::hours(24);
    let week_ago = now - Duration::days(7);
    let mut duration_sum = 0u64;
    let mut duration_count = 0u64;

    for record in records {
        stats.total += 1;
        match record.status {
            DeployStatus::Success => {
                stats.success_count += 1;
                if record.duration_ms > 0 {
                    duration_sum += record.duration_ms;
                    duration_count += 1;
                }
            }
            DeployStatus::Failed => stats.failed_count += 1,
        }
        if record.timestamp >= day_ago {
            stats.last_24h += 1;
        }
        if record.timestamp >= week_ago {
            stats.last_week += 1;
        }
        *stats.by_target.entry(record.target).or_insert(0) += 1;
    }

    if stats.total > 0 {
        let ratio = stats.success_count as f64 / stats.total as f64;
        stats.success_rate = (ratio * 1000.0).round() / 10.0;
    }
    if duration_count > 0 {
        stats.avg_duration_ms = (duration_sum as f64 / duration_count as f64).round() as u64;
    }
    stats
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::test_utils::TestHarness;

    fn result(success: bool, duration_ms: u64) -> DeployResult {
        let mut r = if success {
            DeployResult::published(
                DeploymentTarget::Netlify,
                "https://a.netlify.app".to_string(),
                None,
            )
        } else {
            DeployResult::failed(Some(DeploymentTarget::Netlify), "boom")
        };
        r.duration_ms = duration_ms;
        r
    }

    #[tokio::test]
    async fn appends_are_listed_newest_first() {
        let h = TestHarness::new();
        let history = DeploymentHistoryService::new(h.ctx());
        history
            .record(&result(true, 10), DeploymentTarget::Netlify, "a.com")
            .await
            .unwrap();
        history
            .record(&result(false, 0), DeploymentTarget::GitPush, "b.com")
            .await
            .unwrap();

        let all = history.list(&HistoryFilter::default()).await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].domain, "b.com");
        assert_eq!(all[1].domain, "a.com");

        let limited = history
            .list(&HistoryFilter {
                limit: Some(1),
                ..HistoryFilter::default()
            })
            .await;
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].domain, "b.com");

        let failed = history
            .list(&HistoryFilter {
                status: Some(DeployStatus::Failed),
                ..HistoryFilter::default()
            })
            .await;
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].target, DeploymentTarget::GitPush);
    }

    #[tokio::test]
    async fn oldest_records_are_evicted() {
        let h = TestHarness::new();
        let history = DeploymentHistoryService::with_max_records(h.ctx(), 3);
        for i in 0..5 {
            history
                .record(&result(true, 1), DeploymentTarget::Netlify, &format!("{i}.com"))
                .await
                .unwrap();
        }
        let all = history.list(&HistoryFilter::default()).await;
        let domains: Vec<_> = all.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(domains, vec!["4.com", "3.com", "2.com"]);
        assert_eq!(h.history.stored().await.len(), 3);
    }

    #[tokio::test]
    async fn loads_persisted_history_once() {
        let h = TestHarness::new();
        let first = DeploymentHistoryService::new(h.ctx());
        first
            .record(&result(true, 5), DeploymentTarget::Netlify, "a.com")
            .await
            .unwrap();

        assert_eq!(h.history.load_count(), 1);

        let second = DeploymentHistoryService::new(h.ctx());
        assert_eq!(second.list(&HistoryFilter::default()).await.len(), 1);
        second.stats().await;
        assert_eq!(h.history.load_count(), 2);
    }

    #[tokio::test]
    async fn save_failure_keeps_record_in_memory() {
        let h = TestHarness::new();
        let history = DeploymentHistoryService::new(h.ctx());
        h.history.set_save_error(Some("disk full")).await;

        let err = history
            .record(&result(true, 5), DeploymentTarget::Netlify, "a.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::StorageError(_)));
        assert_eq!(history.list(&HistoryFilter::default()).await.len(), 1);
    }

    #[tokio::test]
    async fn unreadable_history_is_never_overwritten() {
        let h = TestHarness::new();
        let kept =
            DeploymentRecord::from_result(&result(true, 5), DeploymentTarget::Netlify, "keep.com");
        h.history.seed(vec![kept.clone()]).await;
        h.history.set_load_error(Some("unknown variant `vercel`")).await;
        let history = DeploymentHistoryService::new(h.ctx());

        let err = history
            .record(&result(true, 5), DeploymentTarget::Netlify, "new.com")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::SerializationError(_)));
        assert!(history.list(&HistoryFilter::default()).await.is_empty());
        assert_eq!(history.stats().await.total, 0);
        assert_eq!(h.history.stored().await, vec![kept]);

        // Readable again: the load is retried and the old records come back.
        h.history.set_load_error(None).await;
        history
            .record(&result(true, 5), DeploymentTarget::Netlify, "new.com")
            .await
            .unwrap();
        let domains: Vec<_> = h.history.stored().await.into_iter().map(|r| r.domain).collect();
        assert_eq!(domains, vec!["keep.com", "new.com"]);
    }

    #[tokio::test]
    async fn clear_replaces_unreadable_history() {
        let h = TestHarness::new();
        h.history.set_load_error(Some("garbage")).await;
        let history = DeploymentHistoryService::new(h.ctx());
        history.clear().await.unwrap();
        h.history.set_load_error(None).await;
        assert!(h.history.stored().await.is_empty());
        assert!(history.list(&HistoryFilter::default()).await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_appends_are_all_kept() {
        let h = TestHarness::new();
        let history = Arc::new(DeploymentHistoryService::new(h.ctx()));
        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let history = Arc::clone(&history);
                tokio::spawn(async move {
                    history
                        .record(&result(true, 1), DeploymentTarget::Netlify, &format!("{i}.com"))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(history.list(&HistoryFilter::default()).await.len(), 20);
        assert_eq!(h.history.stored().await.len(), 20);
    }

    #[tokio::test]
    async fn stats_aggregate_retained_records() {
        let h = TestHarness::new();
        let history = DeploymentHistoryService::new(h.ctx());
        history
            .record(&result(true, 100), DeploymentTarget::Netlify, "a.com")
            .await
            .unwrap();
        history
            .record(&result(true, 201), DeploymentTarget::Netlify, "a.com")
            .await
            .unwrap();
        history
            .record(&result(false, 900), DeploymentTarget::GitPush, "a.com")
            .await
            .unwrap();

        let stats = history.stats().await;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.failed_count, 1);
        assert!((stats.success_rate - 66.7).abs() < f64::EPSILON);
        assert_eq!(stats.avg_duration_ms, 151);
        assert_eq!(stats.last_24h, 3);
        assert_eq!(stats.by_target[&DeploymentTarget::Netlify], 2);

        let later = history.stats_at(Utc::now() + Duration::days(2)).await;
        assert_eq!(later.last_24h, 0);
        assert_eq!(later.last_week, 3);
    }

    #[tokio::test]
    async fn empty_history_has_zero_rate() {
        let h = TestHarness::new();
        let history = DeploymentHistoryService::new(h.ctx());
        let stats = history.stats().await;
        assert_eq!(stats.total, 0);
        assert!(stats.success_rate.abs() < f64::EPSILON);
        assert_eq!(stats.avg_duration_ms, 0);
    }

    #[tokio::test]
    async fn clear_empties_storage() {
        let h = TestHarness::new();
        let history = DeploymentHistoryService::new(h.ctx());
        history
            .record(&result(true, 1), DeploymentTarget::Netlify, "a.com")
            .await
            .unwrap();
        history.clear().await.unwrap();
        assert!(history.list(&HistoryFilter::default()).await.is_empty());
        assert!(h.history.stored().await.is_empty());
    }
}
