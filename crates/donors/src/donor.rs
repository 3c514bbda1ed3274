use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use donorhub_core::{DomainError, DomainResult, OrgId, RecordId};

/// Donor identifier (org-scoped via the `org_id` field on the record).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonorId(pub RecordId);

impl DonorId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for DonorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A person (or organization contact) who gives to campaigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donor {
    pub id: DonorId,
    pub org_id: OrgId,
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a donor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDonor {
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorUpdate {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl Donor {
    pub fn create(org_id: OrgId, input: NewDonor, now: DateTime<Utc>) -> DomainResult<Self> {
        validate_display_name(&input.display_name)?;
        validate_email(&input.email)?;

        Ok(Self {
            id: DonorId::new(RecordId::new()),
            org_id,
            display_name: input.display_name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: DonorUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = update.display_name {
            validate_display_name(&name)?;
            self.display_name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            validate_email(&email)?;
            self.email = email.trim().to_string();
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        self.updated_at = now;
        Ok(())
    }
}

fn validate_display_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("display_name cannot be empty"));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(DomainError::validation("email cannot be empty"));
    }
    // Deliberately loose: the email provider is the real arbiter.
    if !email.contains('@') {
        return Err(DomainError::validation("email must contain '@'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_donor() -> NewDonor {
        NewDonor {
            display_name: "Ada Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            phone: None,
            notes: None,
        }
    }

    #[test]
    fn create_donor_sets_timestamps_and_trims() {
        let now = Utc::now();
        let input = NewDonor {
            display_name: "  Ada Lovelace  ".to_string(),
            email: " ada@example.org ".to_string(),
            phone: Some("+44 20 7946 0000".to_string()),
            notes: None,
        };
        let donor = Donor::create(OrgId::new(), input, now).unwrap();

        assert_eq!(donor.display_name, "Ada Lovelace");
        assert_eq!(donor.email, "ada@example.org");
        assert_eq!(donor.created_at, now);
        assert_eq!(donor.updated_at, now);
    }

    #[test]
    fn create_donor_rejects_empty_name() {
        let mut input = new_donor();
        input.display_name = "   ".to_string();
        let err = Donor::create(OrgId::new(), input, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_donor_rejects_email_without_at_sign() {
        let mut input = new_donor();
        input.email = "ada.example.org".to_string();
        let err = Donor::create(OrgId::new(), input, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_changes_only_provided_fields() {
        let created = Utc::now();
        let mut donor = Donor::create(OrgId::new(), new_donor(), created).unwrap();

        let later = created + chrono::Duration::minutes(5);
        donor
            .apply_update(
                DonorUpdate {
                    phone: Some(Some("+1 555 0100".to_string())),
                    ..DonorUpdate::default()
                },
                later,
            )
            .unwrap();

        assert_eq!(donor.display_name, "Ada Lovelace");
        assert_eq!(donor.phone.as_deref(), Some("+1 555 0100"));
        assert_eq!(donor.updated_at, later);
    }

    #[test]
    fn update_can_clear_optional_fields() {
        let mut donor = Donor::create(
            OrgId::new(),
            NewDonor {
                phone: Some("+1 555 0100".to_string()),
                ..new_donor()
            },
            Utc::now(),
        )
        .unwrap();

        donor
            .apply_update(
                DonorUpdate {
                    phone: Some(None),
                    ..DonorUpdate::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(donor.phone, None);
    }

    #[test]
    fn update_rejects_invalid_email() {
        let mut donor = Donor::create(OrgId::new(), new_donor(), Utc::now()).unwrap();
        let err = donor
            .apply_update(
                DonorUpdate {
                    email: Some("not-an-email".to_string()),
                    ..DonorUpdate::default()
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        // Original value untouched on rejection.
        assert_eq!(donor.email, "ada@example.org");
    }
}
