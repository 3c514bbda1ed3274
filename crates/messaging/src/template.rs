use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use donorhub_core::{DomainError, DomainResult, OrgId, RecordId};

/// Template identifier (org-scoped via the `org_id` field on the record).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub RecordId);

impl TemplateId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A reusable email template.
///
/// Subject and body may carry `{{name}}` and `{{email}}` merge fields,
/// substituted at render time from the target donor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub id: TemplateId,
    pub org_id: OrgId,
    pub name: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    pub subject: String,
    pub body: String,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// A template rendered against a concrete donor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub body: String,
}

impl EmailTemplate {
    pub fn create(org_id: OrgId, input: NewTemplate, now: DateTime<Utc>) -> DomainResult<Self> {
        validate_field("name", &input.name)?;
        validate_field("subject", &input.subject)?;
        validate_field("body", &input.body)?;

        Ok(Self {
            id: TemplateId::new(RecordId::new()),
            org_id,
            name: input.name.trim().to_string(),
            subject: input.subject,
            body: input.body,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: TemplateUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = &update.name {
            validate_field("name", name)?;
        }
        if let Some(subject) = &update.subject {
            validate_field("subject", subject)?;
        }
        if let Some(body) = &update.body {
            validate_field("body", body)?;
        }

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(subject) = update.subject {
            self.subject = subject;
        }
        if let Some(body) = update.body {
            self.body = body;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Substitute merge fields with the donor's details.
    ///
    /// Unknown `{{...}}` sequences pass through verbatim.
    pub fn render(&self, donor_name: &str, donor_email: &str) -> RenderedEmail {
        RenderedEmail {
            subject: substitute(&self.subject, donor_name, donor_email),
            body: substitute(&self.body, donor_name, donor_email),
        }
    }
}

fn substitute(text: &str, donor_name: &str, donor_email: &str) -> String {
    text.replace("{{name}}", donor_name)
        .replace("{{email}}", donor_email)
}

fn validate_field(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}
