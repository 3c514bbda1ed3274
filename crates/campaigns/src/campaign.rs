use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use donorhub_core::{DomainError, DomainResult, OrgId, RecordId};

/// Campaign identifier (org-scoped via the `org_id` field on the record).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub RecordId);

impl CampaignId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CampaignId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Campaign status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Completed,
    Archived,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Archived => "archived",
        }
    }
}

impl core::str::FromStr for CampaignStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "active" => Ok(CampaignStatus::Active),
            "completed" => Ok(CampaignStatus::Completed),
            "archived" => Ok(CampaignStatus::Archived),
            other => Err(DomainError::validation(format!(
                "unknown campaign status '{other}'"
            ))),
        }
    }
}

/// A fundraising campaign.
///
/// Amounts are minor units (cents) to keep arithmetic exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub org_id: OrgId,
    pub name: String,
    pub description: Option<String>,
    pub goal_minor: i64,
    pub raised_minor: i64,
    pub status: CampaignStatus,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub name: String,
    pub description: Option<String>,
    pub goal_minor: i64,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub goal_minor: Option<i64>,
    pub status: Option<CampaignStatus>,
    pub starts_at: Option<Option<DateTime<Utc>>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

impl Campaign {
    pub fn create(org_id: OrgId, input: NewCampaign, now: DateTime<Utc>) -> DomainResult<Self> {
        validate_name(&input.name)?;
        validate_goal(input.goal_minor)?;
        validate_window(input.starts_at, input.ends_at)?;

        Ok(Self {
            id: CampaignId::new(RecordId::new()),
            org_id,
            name: input.name.trim().to_string(),
            description: input.description,
            goal_minor: input.goal_minor,
            raised_minor: 0,
            status: CampaignStatus::Draft,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update.
    ///
    /// Archived campaigns are frozen: any update (including un-archiving) is
    /// rejected with a conflict.
    pub fn apply_update(&mut self, update: CampaignUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status == CampaignStatus::Archived {
            return Err(DomainError::conflict("campaign is archived"));
        }

        // Validate against the would-be values before mutating anything.
        let starts_at = update.starts_at.unwrap_or(self.starts_at);
        let ends_at = update.ends_at.unwrap_or(self.ends_at);
        validate_window(starts_at, ends_at)?;
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        if let Some(goal) = update.goal_minor {
            validate_goal(goal)?;
        }

        if let Some(name) = update.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(goal) = update.goal_minor {
            self.goal_minor = goal;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self.updated_at = now;
        Ok(())
    }
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(())
}

fn validate_goal(goal_minor: i64) -> DomainResult<()> {
    if goal_minor < 0 {
        return Err(DomainError::validation("goal_minor cannot be negative"));
    }
    Ok(())
}

fn validate_window(
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
) -> DomainResult<()> {
    if let (Some(start), Some(end)) = (starts_at, ends_at) {
        if end <= start {
            return Err(DomainError::validation("ends_at must be after starts_at"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_campaign() -> NewCampaign {
        NewCampaign {
            name: "Spring Appeal".to_string(),
            description: None,
            goal_minor: 500_000,
            starts_at: None,
            ends_at: None,
        }
    }

    #[test]
    fn create_campaign_starts_in_draft_with_zero_raised() {
        let campaign = Campaign::create(OrgId::new(), new_campaign(), Utc::now()).unwrap();
        assert_eq!(campaign.status, CampaignStatus::Draft);
        assert_eq!(campaign.raised_minor, 0);
    }

    #[test]
    fn create_campaign_rejects_empty_name() {
        let mut input = new_campaign();
        input.name = "  ".to_string();
        let err = Campaign::create(OrgId::new(), input, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_campaign_rejects_negative_goal() {
        let mut input = new_campaign();
        input.goal_minor = -1;
        let err = Campaign::create(OrgId::new(), input, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_campaign_rejects_inverted_window() {
        let now = Utc::now();
        let mut input = new_campaign();
        input.starts_at = Some(now + Duration::days(7));
        input.ends_at = Some(now);
        let err = Campaign::create(OrgId::new(), input, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_moves_status_through_lifecycle() {
        let mut campaign = Campaign::create(OrgId::new(), new_campaign(), Utc::now()).unwrap();

        campaign
            .apply_update(
                CampaignUpdate {
                    status: Some(CampaignStatus::Active),
                    ..CampaignUpdate::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(campaign.status, CampaignStatus::Active);

        campaign
            .apply_update(
                CampaignUpdate {
                    status: Some(CampaignStatus::Completed),
                    ..CampaignUpdate::default()
                },
                Utc::now(),
            )
            .unwrap();
        assert_eq!(campaign.status, CampaignStatus::Completed);
    }

    #[test]
    fn archived_campaign_rejects_updates() {
        let mut campaign = Campaign::create(OrgId::new(), new_campaign(), Utc::now()).unwrap();
        campaign
            .apply_update(
                CampaignUpdate {
                    status: Some(CampaignStatus::Archived),
                    ..CampaignUpdate::default()
                },
                Utc::now(),
            )
            .unwrap();

        let err = campaign
            .apply_update(
                CampaignUpdate {
                    name: Some("Renamed".to_string()),
                    ..CampaignUpdate::default()
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(campaign.name, "Spring Appeal");
    }

    #[test]
    fn update_validates_window_across_old_and_new_values() {
        let now = Utc::now();
        let mut input = new_campaign();
        input.starts_at = Some(now + Duration::days(7));
        let mut campaign = Campaign::create(OrgId::new(), input, now).unwrap();

        // New end before the existing start.
        let err = campaign
            .apply_update(
                CampaignUpdate {
                    ends_at: Some(Some(now)),
                    ..CampaignUpdate::default()
                },
                now,
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(campaign.ends_at, None);
    }

    #[test]
    fn rejected_update_leaves_campaign_unchanged() {
        let mut campaign = Campaign::create(OrgId::new(), new_campaign(), Utc::now()).unwrap();
        let before = campaign.clone();

        let err = campaign
            .apply_update(
                CampaignUpdate {
                    name: Some("Renamed".to_string()),
                    goal_minor: Some(-5),
                    ..CampaignUpdate::default()
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(campaign, before);
    }
}
