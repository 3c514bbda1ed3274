//! The reminder-processing run: claim due reminders, fan out delivery calls,
//! aggregate outcomes, write one audit row.
//!
//! One best-effort pass per invocation. A failed dispatch releases its claim
//! and waits for the next scheduled run; nothing here retries.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::Semaphore;
use uuid::Uuid;

use donorhub_reminders::{DispatchOutcome, Reminder, RunSummary, summarize};

use crate::external::DeliveryClient;
use crate::store::{ReminderStore, RunAuditRecord, RunAuditStore, StoreError};

/// Job name recorded on every audit row this run produces.
pub const REMINDER_JOB_NAME: &str = "reminders.process";

/// What the triggering caller gets back from a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    pub outcomes: Vec<DispatchOutcome>,
}

/// Run-level failure.
///
/// Per-item dispatch failures never surface here; they live in the outcome
/// tally. Only the loader and the audit write can fail a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The claim query failed: nothing was dispatched, nothing was audited.
    #[error("failed to load due reminders: {0}")]
    Load(#[source] StoreError),

    /// Dispatches completed but the audit row could not be written. The
    /// computed summary rides along so the caller can still report counts.
    #[error("failed to record run audit: {source}")]
    Audit {
        summary: RunSummary,
        #[source]
        source: StoreError,
    },
}

/// One cron-triggered pass over the due reminders.
pub struct ReminderRun {
    reminders: Arc<dyn ReminderStore>,
    audit: Arc<dyn RunAuditStore>,
    delivery: Arc<dyn DeliveryClient>,
    /// Fan-out width: how many dispatches may be in flight at once.
    concurrency: usize,
    /// How long a claim sticks before a stranded reminder is reclaimable.
    lease: Duration,
}

impl ReminderRun {
    pub fn new(
        reminders: Arc<dyn ReminderStore>,
        audit: Arc<dyn RunAuditStore>,
        delivery: Arc<dyn DeliveryClient>,
        concurrency: usize,
        lease: Duration,
    ) -> Self {
        Self {
            reminders,
            audit,
            delivery,
            concurrency: concurrency.max(1),
            lease,
        }
    }

    /// Execute one run: load → dispatch → aggregate → audit.
    #[tracing::instrument(skip(self), fields(job = REMINDER_JOB_NAME))]
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<RunReport, RunError> {
        let claimed = self
            .reminders
            .claim_due(now, self.lease)
            .await
            .map_err(RunError::Load)?;

        tracing::info!(claimed = claimed.len(), "reminder run claimed due set");

        let outcomes = self.dispatch_all(claimed).await;
        let summary = summarize(&outcomes);
        let finished_at = Utc::now();

        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            status = summary.status.as_str(),
            "reminder run settled"
        );

        let record = RunAuditRecord {
            id: Uuid::now_v7(),
            job_name: REMINDER_JOB_NAME.to_string(),
            status: summary.status,
            succeeded: summary.succeeded as i64,
            failed: summary.failed as i64,
            detail: serde_json::json!({
                "total": summary.total,
                "succeeded": summary.succeeded,
                "failed": summary.failed,
                "outcomes": outcomes,
            }),
            started_at: now,
            finished_at,
        };

        self.audit
            .append(&record)
            .await
            .map_err(|source| RunError::Audit { summary, source })?;

        Ok(RunReport { summary, outcomes })
    }

    /// Fan the claimed set out, bounded by the semaphore, and join on every
    /// dispatch. Each task folds its own failure into a value, so one bad
    /// reminder cannot abort or skew the rest.
    async fn dispatch_all(&self, claimed: Vec<Reminder>) -> Vec<DispatchOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(claimed.len());

        for reminder in claimed {
            let semaphore = semaphore.clone();
            let delivery = self.delivery.clone();
            let reminders = self.reminders.clone();
            let id = reminder.id;

            handles.push((
                id,
                tokio::spawn(async move {
                    // Closed only if the run is dropped, in which case the
                    // task never runs anyway.
                    let _permit = semaphore.acquire_owned().await.ok()?;

                    match delivery.deliver(id).await {
                        Ok(()) => Some(DispatchOutcome::success(id)),
                        Err(err) => {
                            tracing::warn!(reminder_id = %id, error = %err, "dispatch failed");
                            // Hand the claim back so the next run retries it;
                            // the lease expiry covers us if this write fails.
                            if let Err(release_err) =
                                reminders.release_claim(id, Utc::now()).await
                            {
                                tracing::warn!(
                                    reminder_id = %id,
                                    error = %release_err,
                                    "failed to release claim after dispatch error"
                                );
                            }
                            Some(DispatchOutcome::error(id, err.to_string()))
                        }
                    }
                }),
            ));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let outcome = match handle.await {
                Ok(Some(outcome)) => outcome,
                Ok(None) => DispatchOutcome::error(id, "dispatch was cancelled"),
                Err(join_err) => {
                    DispatchOutcome::error(id, format!("dispatch task panicked: {join_err}"))
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}
