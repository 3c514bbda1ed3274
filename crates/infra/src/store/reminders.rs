//! Reminder persistence, including the run's claim/lease step.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use donorhub_core::{OrgId, RecordId};
use donorhub_reminders::{Reminder, ReminderId, ReminderStatus};

use super::{StoreError, map_sqlx_error};

#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn insert(&self, reminder: &Reminder) -> Result<(), StoreError>;
    async fn get(&self, org_id: OrgId, id: ReminderId) -> Result<Option<Reminder>, StoreError>;
    /// Lookup without an org filter. Only the internal delivery endpoint uses
    /// this; it authenticates with the service secret, not an org token.
    async fn get_any(&self, id: ReminderId) -> Result<Option<Reminder>, StoreError>;
    /// List an org's reminders, newest first, optionally filtered by status.
    async fn list(
        &self,
        org_id: OrgId,
        status: Option<ReminderStatus>,
    ) -> Result<Vec<Reminder>, StoreError>;
    async fn update(&self, reminder: &Reminder) -> Result<(), StoreError>;
    async fn delete(&self, org_id: OrgId, id: ReminderId) -> Result<bool, StoreError>;

    /// Atomically claim every eligible reminder: `pending` and due, or
    /// `in_flight` with an expired lease. Claimed rows move to `in_flight`
    /// with `lease_expires_at = now + lease`, and the claimed set is
    /// returned. Two overlapping runs can never claim the same row.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Vec<Reminder>, StoreError>;

    /// Return a claim to `pending` after a failed dispatch, so the next run
    /// picks the reminder up without waiting out the lease. No-op unless the
    /// row is still `in_flight`.
    async fn release_claim(&self, id: ReminderId, now: DateTime<Utc>) -> Result<(), StoreError>;
}

/// In-memory reminder store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryReminderStore {
    rows: RwLock<HashMap<ReminderId, Reminder>>,
}

impl InMemoryReminderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReminderStore for InMemoryReminderStore {
    async fn insert(&self, reminder: &Reminder) -> Result<(), StoreError> {
        let mut rows = self.rows.write().unwrap();
        rows.insert(reminder.id, reminder.clone());
        Ok(())
    }

    async fn get(&self, org_id: OrgId, id: ReminderId) -> Result<Option<Reminder>, StoreError> {
        let rows = self.rows.read().unwrap();
        Ok(rows.get(&id).filter(|r| r.org_id == org_id).cloned())
    }

    async fn get_any(&self, id: ReminderId) -> Result<Option<Reminder>, StoreError> {
        let rows = self.rows.read().unwrap();
        Ok(rows.get(&id).cloned())
    }

    async fn list(
        &self,
        org_id: OrgId,
        status: Option<ReminderStatus>,
    ) -> Result<Vec<Reminder>, StoreError> {
        let rows = self.rows.read().unwrap();
        let mut result: Vec<_> = rows
            .values()
            .filter(|r| r.org_id == org_id)
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update(&self, reminder: &Reminder) -> Result<(), StoreError> {
        let mut rows = self.rows.write().unwrap();
        if let Some(existing) = rows.get_mut(&reminder.id) {
            *existing = reminder.clone();
        }
        Ok(())
    }

    async fn delete(&self, org_id: OrgId, id: ReminderId) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().unwrap();
        match rows.get(&id) {
            Some(r) if r.org_id == org_id => {
                rows.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Vec<Reminder>, StoreError> {
        // One write lock for the whole sweep keeps the claim atomic, same
        // guarantee the Postgres UPDATE ... RETURNING gives.
        let mut rows = self.rows.write().unwrap();
        let mut claimed = Vec::new();
        for reminder in rows.values_mut() {
            if reminder.is_eligible(now) && reminder.claim(now, lease).is_ok() {
                claimed.push(reminder.clone());
            }
        }
        Ok(claimed)
    }

    async fn release_claim(&self, id: ReminderId, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut rows = self.rows.write().unwrap();
        if let Some(reminder) = rows.get_mut(&id) {
            reminder.release(now);
        }
        Ok(())
    }
}

/// Postgres-backed reminder store.
#[derive(Debug, Clone)]
pub struct PostgresReminderStore {
    pool: PgPool,
}

impl PostgresReminderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const REMINDER_COLUMNS: &str = "id, org_id, donor_id, subject, message, status, \
     due_at, lease_expires_at, created_at, updated_at";

fn reminder_from_row(row: &PgRow) -> Result<Reminder, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Reminder {
        id: ReminderId::new(RecordId::from_uuid(row.try_get("id")?)),
        org_id: OrgId::from_uuid(row.try_get("org_id")?),
        donor_id: donorhub_donors::DonorId::new(RecordId::from_uuid(row.try_get("donor_id")?)),
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        status: status
            .parse::<ReminderStatus>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        due_at: row.try_get("due_at")?,
        lease_expires_at: row.try_get("lease_expires_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ReminderStore for PostgresReminderStore {
    async fn insert(&self, reminder: &Reminder) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reminders
                (id, org_id, donor_id, subject, message, status,
                 due_at, lease_expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(reminder.id.0.as_uuid())
        .bind(reminder.org_id.as_uuid())
        .bind(reminder.donor_id.0.as_uuid())
        .bind(&reminder.subject)
        .bind(&reminder.message)
        .bind(reminder.status.as_str())
        .bind(reminder.due_at)
        .bind(reminder.lease_expires_at)
        .bind(reminder.created_at)
        .bind(reminder.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_reminder", e))?;

        Ok(())
    }

    async fn get(&self, org_id: OrgId, id: ReminderId) -> Result<Option<Reminder>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders WHERE org_id = $1 AND id = $2"
        ))
        .bind(org_id.as_uuid())
        .bind(id.0.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_reminder", e))?;

        row.as_ref()
            .map(reminder_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_reminder", e))
    }

    async fn get_any(&self, id: ReminderId) -> Result<Option<Reminder>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders WHERE id = $1"
        ))
        .bind(id.0.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_any_reminder", e))?;

        row.as_ref()
            .map(reminder_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_any_reminder", e))
    }

    async fn list(
        &self,
        org_id: OrgId,
        status: Option<ReminderStatus>,
    ) -> Result<Vec<Reminder>, StoreError> {
        let rows = match status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {REMINDER_COLUMNS} FROM reminders \
                     WHERE org_id = $1 AND status = $2 ORDER BY created_at DESC"
                ))
                .bind(org_id.as_uuid())
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {REMINDER_COLUMNS} FROM reminders \
                     WHERE org_id = $1 ORDER BY created_at DESC"
                ))
                .bind(org_id.as_uuid())
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("list_reminders", e))?;

        rows.iter()
            .map(reminder_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_reminders", e))
    }

    async fn update(&self, reminder: &Reminder) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE reminders
            SET subject = $3, message = $4, status = $5, due_at = $6,
                lease_expires_at = $7, updated_at = $8
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(reminder.org_id.as_uuid())
        .bind(reminder.id.0.as_uuid())
        .bind(&reminder.subject)
        .bind(&reminder.message)
        .bind(reminder.status.as_str())
        .bind(reminder.due_at)
        .bind(reminder.lease_expires_at)
        .bind(reminder.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_reminder", e))?;

        Ok(())
    }

    async fn delete(&self, org_id: OrgId, id: ReminderId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reminders WHERE org_id = $1 AND id = $2")
            .bind(org_id.as_uuid())
            .bind(id.0.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_reminder", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease: Duration,
    ) -> Result<Vec<Reminder>, StoreError> {
        // Single atomic sweep. Row locks make concurrent runs disjoint:
        // whichever UPDATE commits first wins the row.
        let rows = sqlx::query(&format!(
            r#"
            UPDATE reminders
            SET status = 'in_flight', lease_expires_at = $2, updated_at = $1
            WHERE (status = 'pending' AND due_at <= $1)
               OR (status = 'in_flight' AND lease_expires_at <= $1)
            RETURNING {REMINDER_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(now + lease)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("claim_due_reminders", e))?;

        rows.iter()
            .map(reminder_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("claim_due_reminders", e))
    }

    async fn release_claim(&self, id: ReminderId, now: DateTime<Utc>) -> Result<(), StoreError> {
        // Status guard keeps a late release from clobbering a `sent` row.
        sqlx::query(
            r#"
            UPDATE reminders
            SET status = 'pending', lease_expires_at = NULL, updated_at = $2
            WHERE id = $1 AND status = 'in_flight'
            "#,
        )
        .bind(id.0.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("release_reminder_claim", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use donorhub_donors::DonorId;
    use donorhub_reminders::NewReminder;

    fn due_reminder(org_id: OrgId, now: DateTime<Utc>) -> Reminder {
        Reminder::create(
            org_id,
            NewReminder {
                donor_id: DonorId::new(RecordId::new()),
                subject: None,
                message: "Your pledge is due.".to_string(),
                due_at: now - Duration::minutes(1),
            },
            now - Duration::hours(1),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn claim_due_takes_only_eligible_rows() {
        let store = InMemoryReminderStore::new();
        let org = OrgId::new();
        let now = Utc::now();

        let due = due_reminder(org, now);
        let mut future = due_reminder(org, now);
        future.due_at = now + Duration::hours(1);
        let mut sent = due_reminder(org, now);
        sent.mark_sent(now).unwrap();

        store.insert(&due).await.unwrap();
        store.insert(&future).await.unwrap();
        store.insert(&sent).await.unwrap();

        let claimed = store.claim_due(now, Duration::seconds(300)).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].id, due.id);
        assert_eq!(claimed[0].status, ReminderStatus::InFlight);
    }

    #[tokio::test]
    async fn second_claim_finds_nothing_until_lease_expires() {
        let store = InMemoryReminderStore::new();
        let now = Utc::now();
        store.insert(&due_reminder(OrgId::new(), now)).await.unwrap();

        let first = store.claim_due(now, Duration::seconds(300)).await.unwrap();
        assert_eq!(first.len(), 1);

        let overlap = store.claim_due(now, Duration::seconds(300)).await.unwrap();
        assert!(overlap.is_empty());

        let later = now + Duration::seconds(301);
        let reclaimed = store.claim_due(later, Duration::seconds(300)).await.unwrap();
        assert_eq!(reclaimed.len(), 1);
    }

    #[tokio::test]
    async fn released_claim_is_immediately_reclaimable() {
        let store = InMemoryReminderStore::new();
        let now = Utc::now();
        let reminder = due_reminder(OrgId::new(), now);
        store.insert(&reminder).await.unwrap();

        store.claim_due(now, Duration::seconds(300)).await.unwrap();
        store.release_claim(reminder.id, now).await.unwrap();

        let reclaimed = store.claim_due(now, Duration::seconds(300)).await.unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].id, reminder.id);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let store = InMemoryReminderStore::new();
        let org = OrgId::new();
        let now = Utc::now();

        let pending = due_reminder(org, now);
        let mut sent = due_reminder(org, now);
        sent.mark_sent(now).unwrap();
        store.insert(&pending).await.unwrap();
        store.insert(&sent).await.unwrap();

        let all = store.list(org, None).await.unwrap();
        assert_eq!(all.len(), 2);
        let only_sent = store.list(org, Some(ReminderStatus::Sent)).await.unwrap();
        assert_eq!(only_sent.len(), 1);
        assert_eq!(only_sent[0].id, sent.id);
    }

    #[tokio::test]
    async fn get_any_ignores_org_while_get_does_not() {
        let store = InMemoryReminderStore::new();
        let now = Utc::now();
        let reminder = due_reminder(OrgId::new(), now);
        store.insert(&reminder).await.unwrap();

        assert!(store.get(OrgId::new(), reminder.id).await.unwrap().is_none());
        assert!(store.get_any(reminder.id).await.unwrap().is_some());
    }
}
