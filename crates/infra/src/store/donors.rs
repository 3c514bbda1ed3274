//! Donor persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use donorhub_core::{OrgId, RecordId};
use donorhub_donors::{Donor, DonorId};

use super::{StoreError, map_sqlx_error};

#[async_trait]
pub trait DonorStore: Send + Sync {
    async fn insert(&self, donor: &Donor) -> Result<(), StoreError>;
    async fn get(&self, org_id: OrgId, id: DonorId) -> Result<Option<Donor>, StoreError>;
    /// List an org's donors, newest first.
    async fn list(&self, org_id: OrgId) -> Result<Vec<Donor>, StoreError>;
    async fn update(&self, donor: &Donor) -> Result<(), StoreError>;
    async fn delete(&self, org_id: OrgId, id: DonorId) -> Result<bool, StoreError>;
}

/// In-memory donor store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDonorStore {
    rows: RwLock<HashMap<DonorId, Donor>>,
}

impl InMemoryDonorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DonorStore for InMemoryDonorStore {
    async fn insert(&self, donor: &Donor) -> Result<(), StoreError> {
        let mut rows = self.rows.write().unwrap();
        rows.insert(donor.id, donor.clone());
        Ok(())
    }

    async fn get(&self, org_id: OrgId, id: DonorId) -> Result<Option<Donor>, StoreError> {
        let rows = self.rows.read().unwrap();
        Ok(rows.get(&id).filter(|d| d.org_id == org_id).cloned())
    }

    async fn list(&self, org_id: OrgId) -> Result<Vec<Donor>, StoreError> {
        let rows = self.rows.read().unwrap();
        let mut result: Vec<_> = rows
            .values()
            .filter(|d| d.org_id == org_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update(&self, donor: &Donor) -> Result<(), StoreError> {
        let mut rows = self.rows.write().unwrap();
        if let Some(existing) = rows.get_mut(&donor.id) {
            *existing = donor.clone();
        }
        Ok(())
    }

    async fn delete(&self, org_id: OrgId, id: DonorId) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().unwrap();
        match rows.get(&id) {
            Some(d) if d.org_id == org_id => {
                rows.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Postgres-backed donor store.
#[derive(Debug, Clone)]
pub struct PostgresDonorStore {
    pool: PgPool,
}

impl PostgresDonorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn donor_from_row(row: &PgRow) -> Result<Donor, sqlx::Error> {
    Ok(Donor {
        id: DonorId::new(RecordId::from_uuid(row.try_get("id")?)),
        org_id: OrgId::from_uuid(row.try_get("org_id")?),
        display_name: row.try_get("display_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl DonorStore for PostgresDonorStore {
    async fn insert(&self, donor: &Donor) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO donors
                (id, org_id, display_name, email, phone, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(donor.id.0.as_uuid())
        .bind(donor.org_id.as_uuid())
        .bind(&donor.display_name)
        .bind(&donor.email)
        .bind(&donor.phone)
        .bind(&donor.notes)
        .bind(donor.created_at)
        .bind(donor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_donor", e))?;

        Ok(())
    }

    async fn get(&self, org_id: OrgId, id: DonorId) -> Result<Option<Donor>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, org_id, display_name, email, phone, notes, created_at, updated_at
            FROM donors
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(id.0.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_donor", e))?;

        row.as_ref()
            .map(donor_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_donor", e))
    }

    async fn list(&self, org_id: OrgId) -> Result<Vec<Donor>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, org_id, display_name, email, phone, notes, created_at, updated_at
            FROM donors
            WHERE org_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_donors", e))?;

        rows.iter()
            .map(donor_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_donors", e))
    }

    async fn update(&self, donor: &Donor) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE donors
            SET display_name = $3, email = $4, phone = $5, notes = $6, updated_at = $7
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(donor.org_id.as_uuid())
        .bind(donor.id.0.as_uuid())
        .bind(&donor.display_name)
        .bind(&donor.email)
        .bind(&donor.phone)
        .bind(&donor.notes)
        .bind(donor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_donor", e))?;

        Ok(())
    }

    async fn delete(&self, org_id: OrgId, id: DonorId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM donors WHERE org_id = $1 AND id = $2")
            .bind(org_id.as_uuid())
            .bind(id.0.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_donor", e))?;

        Ok(result.rows_affected() > 0)
    }
}
