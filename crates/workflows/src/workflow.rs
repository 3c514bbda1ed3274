use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use donorhub_core::{DomainError, DomainResult, OrgId, RecordId};

/// Workflow identifier (org-scoped via the `org_id` field on the record).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub RecordId);

impl WorkflowId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// What would fire the workflow (definition metadata; no engine here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    DonationReceived,
    DonorCreated,
    CampaignCompleted,
    Manual,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::DonationReceived => "donation_received",
            TriggerKind::DonorCreated => "donor_created",
            TriggerKind::CampaignCompleted => "campaign_completed",
            TriggerKind::Manual => "manual",
        }
    }
}

impl core::str::FromStr for TriggerKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donation_received" => Ok(TriggerKind::DonationReceived),
            "donor_created" => Ok(TriggerKind::DonorCreated),
            "campaign_completed" => Ok(TriggerKind::CampaignCompleted),
            "manual" => Ok(TriggerKind::Manual),
            other => Err(DomainError::validation(format!(
                "unknown trigger kind '{other}'"
            ))),
        }
    }
}

/// A workflow definition: trigger + opaque step list + enabled flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub org_id: OrgId,
    pub name: String,
    pub trigger: TriggerKind,
    /// Opaque JSON array, persisted verbatim.
    pub steps: Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWorkflow {
    pub name: String,
    pub trigger: TriggerKind,
    pub steps: Value,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowUpdate {
    pub name: Option<String>,
    pub trigger: Option<TriggerKind>,
    pub steps: Option<Value>,
}

impl Workflow {
    pub fn create(org_id: OrgId, input: NewWorkflow, now: DateTime<Utc>) -> DomainResult<Self> {
        validate_name(&input.name)?;
        validate_steps(&input.steps)?;

        Ok(Self {
            id: WorkflowId::new(RecordId::new()),
            org_id,
            name: input.name.trim().to_string(),
            trigger: input.trigger,
            steps: input.steps,
            enabled: false,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_update(&mut self, update: WorkflowUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        if let Some(steps) = &update.steps {
            validate_steps(steps)?;
        }

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(trigger) = update.trigger {
            self.trigger = trigger;
        }
        if let Some(steps) = update.steps {
            self.steps = steps;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Flip the enabled flag, returning the new value.
    pub fn toggle(&mut self, now: DateTime<Utc>) -> bool {
        self.enabled = !self.enabled;
        self.updated_at = now;
        self.enabled
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}

fn validate_steps(steps: &Value) -> DomainResult<()> {
    if !steps.is_array() {
        return Err(DomainError::validation("steps must be a JSON array"));
    }
    Ok(())
}
