use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use donorhub_core::{DomainError, DomainResult, OrgId, RecordId};
use donorhub_donors::DonorId;

/// Reminder identifier (org-scoped via the `org_id` field on the record).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(pub RecordId);

impl ReminderId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ReminderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Reminder status lifecycle.
///
/// `InFlight` means a run has claimed the reminder and its dispatch is (or
/// was) underway; the lease expiry bounds how long that claim can stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    InFlight,
    Sent,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::InFlight => "in_flight",
            ReminderStatus::Sent => "sent",
        }
    }
}

impl core::str::FromStr for ReminderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReminderStatus::Pending),
            "in_flight" => Ok(ReminderStatus::InFlight),
            "sent" => Ok(ReminderStatus::Sent),
            other => Err(DomainError::validation(format!(
                "unknown reminder status '{other}'"
            ))),
        }
    }
}

/// A due-work item: send a message to a donor at (or after) `due_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub org_id: OrgId,
    pub donor_id: DonorId,
    pub subject: Option<String>,
    pub message: String,
    pub status: ReminderStatus,
    pub due_at: DateTime<Utc>,
    /// Set while `in_flight`; a claim older than this is up for grabs again.
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReminder {
    pub donor_id: DonorId,
    pub subject: Option<String>,
    pub message: String,
    pub due_at: DateTime<Utc>,
}

impl Reminder {
    pub fn create(org_id: OrgId, input: NewReminder, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.message.trim().is_empty() {
            return Err(DomainError::validation("message cannot be empty"));
        }

        Ok(Self {
            id: ReminderId::new(RecordId::new()),
            org_id,
            donor_id: input.donor_id,
            subject: input.subject,
            message: input.message,
            status: ReminderStatus::Pending,
            due_at: input.due_at,
            lease_expires_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether a run may claim this reminder at `now`.
    ///
    /// Eligible: `pending` and past due, or `in_flight` with an expired lease
    /// (a crashed or stuck run must not hold work forever).
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            ReminderStatus::Pending => self.due_at <= now,
            ReminderStatus::InFlight => self
                .lease_expires_at
                .is_some_and(|expires| expires <= now),
            ReminderStatus::Sent => false,
        }
    }

    /// Claim this reminder for a run: `pending → in_flight` with a lease.
    pub fn claim(&mut self, now: DateTime<Utc>, lease: Duration) -> DomainResult<()> {
        if !self.is_eligible(now) {
            return Err(DomainError::conflict("reminder is not eligible for claim"));
        }
        self.status = ReminderStatus::InFlight;
        self.lease_expires_at = Some(now + lease);
        self.updated_at = now;
        Ok(())
    }

    /// Release a failed claim: `in_flight → pending`, clearing the lease.
    ///
    /// No-op for any other status, so a release racing a concurrent
    /// `mark_sent` cannot un-send the reminder.
    pub fn release(&mut self, now: DateTime<Utc>) {
        if self.status == ReminderStatus::InFlight {
            self.status = ReminderStatus::Pending;
            self.lease_expires_at = None;
            self.updated_at = now;
        }
    }

    /// Mark delivered. Accepts `in_flight` (the normal path) and `pending`
    /// (direct delivery outside a run); rejects double sends.
    pub fn mark_sent(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status == ReminderStatus::Sent {
            return Err(DomainError::conflict("reminder already sent"));
        }
        self.status = ReminderStatus::Sent;
        self.lease_expires_at = None;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn due_reminder(now: DateTime<Utc>) -> Reminder {
        Reminder::create(
            OrgId::new(),
            NewReminder {
                donor_id: DonorId::new(RecordId::new()),
                subject: Some("Monthly giving".to_string()),
                message: "Your pledge is due.".to_string(),
                due_at: now - Duration::minutes(5),
            },
            now - Duration::hours(1),
        )
        .unwrap()
    }

    #[test]
    fn create_rejects_empty_message() {
        let err = Reminder::create(
            OrgId::new(),
            NewReminder {
                donor_id: DonorId::new(RecordId::new()),
                subject: None,
                message: "   ".to_string(),
                due_at: Utc::now(),
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn pending_past_due_is_eligible() {
        let now = Utc::now();
        let reminder = due_reminder(now);
        assert!(reminder.is_eligible(now));
    }

    #[test]
    fn pending_not_yet_due_is_not_eligible() {
        let now = Utc::now();
        let mut reminder = due_reminder(now);
        reminder.due_at = now + Duration::hours(1);
        assert!(!reminder.is_eligible(now));
    }

    #[test]
    fn claim_sets_in_flight_with_lease() {
        let now = Utc::now();
        let mut reminder = due_reminder(now);

        reminder.claim(now, Duration::seconds(300)).unwrap();
        assert_eq!(reminder.status, ReminderStatus::InFlight);
        assert_eq!(reminder.lease_expires_at, Some(now + Duration::seconds(300)));
    }

    #[test]
    fn claimed_reminder_is_not_eligible_until_lease_expires() {
        let now = Utc::now();
        let mut reminder = due_reminder(now);
        reminder.claim(now, Duration::seconds(300)).unwrap();

        assert!(!reminder.is_eligible(now + Duration::seconds(299)));
        assert!(reminder.is_eligible(now + Duration::seconds(300)));
    }

    #[test]
    fn claim_rejects_ineligible_reminder() {
        let now = Utc::now();
        let mut reminder = due_reminder(now);
        reminder.claim(now, Duration::seconds(300)).unwrap();

        let err = reminder.claim(now, Duration::seconds(300)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn release_returns_claim_to_pending() {
        let now = Utc::now();
        let mut reminder = due_reminder(now);
        reminder.claim(now, Duration::seconds(300)).unwrap();

        reminder.release(now);
        assert_eq!(reminder.status, ReminderStatus::Pending);
        assert_eq!(reminder.lease_expires_at, None);
        assert!(reminder.is_eligible(now));
    }

    #[test]
    fn release_does_not_touch_sent_reminders() {
        let now = Utc::now();
        let mut reminder = due_reminder(now);
        reminder.claim(now, Duration::seconds(300)).unwrap();
        reminder.mark_sent(now).unwrap();

        reminder.release(now);
        assert_eq!(reminder.status, ReminderStatus::Sent);
    }

    #[test]
    fn mark_sent_clears_lease_and_rejects_double_send() {
        let now = Utc::now();
        let mut reminder = due_reminder(now);
        reminder.claim(now, Duration::seconds(300)).unwrap();

        reminder.mark_sent(now).unwrap();
        assert_eq!(reminder.status, ReminderStatus::Sent);
        assert_eq!(reminder.lease_expires_at, None);

        let err = reminder.mark_sent(now).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn sent_reminder_is_never_eligible() {
        let now = Utc::now();
        let mut reminder = due_reminder(now);
        reminder.mark_sent(now).unwrap();
        assert!(!reminder.is_eligible(now + Duration::days(365)));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ReminderStatus::Pending,
            ReminderStatus::InFlight,
            ReminderStatus::Sent,
        ] {
            let parsed: ReminderStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("unknown".parse::<ReminderStatus>().is_err());
    }
}
