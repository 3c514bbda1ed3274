use donorhub_auth::Role;
use donorhub_core::{OrgId, UserId};

/// Org context for a request.
///
/// This is immutable and must be present for all org-facing routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrgContext {
    org_id: OrgId,
}

impl OrgContext {
    pub fn new(org_id: OrgId) -> Self {
        Self { org_id }
    }

    pub fn org_id(&self) -> OrgId {
        self.org_id
    }
}

/// Principal context for a request (authenticated identity + roles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, roles: Vec<Role>) -> Self {
        Self { user_id, roles }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }
}
