//! Run outcomes and their aggregation.
//!
//! A run dispatches every claimed reminder independently and folds the
//! results into one summary. The aggregation here is a pure function; how
//! outcomes are produced (HTTP fan-out) and where the summary is persisted
//! (audit store) are infra concerns.

use serde::{Deserialize, Serialize};

use crate::ReminderId;

/// Result of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum DispatchResult {
    Success,
    Error { detail: String },
}

/// Per-reminder outcome within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub reminder_id: ReminderId,
    #[serde(flatten)]
    pub result: DispatchResult,
}

impl DispatchOutcome {
    pub fn success(reminder_id: ReminderId) -> Self {
        Self {
            reminder_id,
            result: DispatchResult::Success,
        }
    }

    pub fn error(reminder_id: ReminderId, detail: impl Into<String>) -> Self {
        Self {
            reminder_id,
            result: DispatchResult::Error {
                detail: detail.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, DispatchResult::Success)
    }
}

/// Run status: `success` only when every dispatch succeeded.
///
/// An empty run (nothing due) counts as `success`; an all-failed run is
/// still `partial` — the run itself completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Partial,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
        }
    }
}

impl core::str::FromStr for RunStatus {
    type Err = donorhub_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(RunStatus::Success),
            "partial" => Ok(RunStatus::Partial),
            other => Err(donorhub_core::DomainError::validation(format!(
                "unknown run status '{other}'"
            ))),
        }
    }
}

/// Aggregated tally of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub status: RunStatus,
}

/// Fold a complete outcome set into a summary.
pub fn summarize(outcomes: &[DispatchOutcome]) -> RunSummary {
    let total = outcomes.len();
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    let failed = total - succeeded;
    let status = if failed == 0 {
        RunStatus::Success
    } else {
        RunStatus::Partial
    };

    RunSummary {
        total,
        succeeded,
        failed,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use donorhub_core::RecordId;
    use proptest::prelude::*;

    fn test_reminder_id() -> ReminderId {
        ReminderId::new(RecordId::new())
    }

    #[test]
    fn empty_run_summarizes_as_success_with_zeros() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.status, RunStatus::Success);
    }

    #[test]
    fn mixed_outcomes_summarize_as_partial() {
        let outcomes = vec![
            DispatchOutcome::success(test_reminder_id()),
            DispatchOutcome::error(test_reminder_id(), "connection refused"),
            DispatchOutcome::success(test_reminder_id()),
        ];
        let summary = summarize(&outcomes);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.status, RunStatus::Partial);
    }

    #[test]
    fn all_failed_run_is_partial_not_a_separate_status() {
        let outcomes = vec![
            DispatchOutcome::error(test_reminder_id(), "timeout"),
            DispatchOutcome::error(test_reminder_id(), "timeout"),
        ];
        assert_eq!(summarize(&outcomes).status, RunStatus::Partial);
    }

    #[test]
    fn outcome_serializes_with_flat_result_tag() {
        let id = test_reminder_id();
        let ok = serde_json::to_value(DispatchOutcome::success(id)).unwrap();
        assert_eq!(ok["result"], "success");
        assert_eq!(ok["reminder_id"], serde_json::json!(id));

        let err = serde_json::to_value(DispatchOutcome::error(id, "boom")).unwrap();
        assert_eq!(err["result"], "error");
        assert_eq!(err["detail"], "boom");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any outcome vector, succeeded + failed == total and
        /// status is `success` exactly when nothing failed.
        #[test]
        fn tally_is_conserved_and_status_matches_failures(
            flags in prop::collection::vec(any::<bool>(), 0..64)
        ) {
            let outcomes: Vec<DispatchOutcome> = flags
                .iter()
                .map(|ok| {
                    if *ok {
                        DispatchOutcome::success(test_reminder_id())
                    } else {
                        DispatchOutcome::error(test_reminder_id(), "simulated failure")
                    }
                })
                .collect();

            let summary = summarize(&outcomes);
            prop_assert_eq!(summary.total, outcomes.len());
            prop_assert_eq!(summary.succeeded + summary.failed, summary.total);
            prop_assert_eq!(summary.status == RunStatus::Success, summary.failed == 0);
        }
    }
}
