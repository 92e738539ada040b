//! Role-based authorization.
//!
//! Every service operation that needs a role check builds an [`Action`] and
//! passes it to [`authorize`] together with the calling [`Actor`]. Denials
//! carry a generic message so they never reveal whether a resource exists.

use safenet_common::{AppError, AppResult};
use safenet_db::entities::user::{self, Role};

const DENIED: &str = "You do not have permission to perform this action";

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i32,
    pub role: Role,
    pub organization_id: Option<i32>,
}

impl Actor {
    /// Build an actor from a session user.
    #[must_use]
    pub const fn from_user(user: &user::Model) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            organization_id: user.organization_id,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The organization of a provider, or a denial for anyone else.
    pub fn provider_organization(&self) -> AppResult<i32> {
        match (self.role, self.organization_id) {
            (Role::Provider, Some(org)) => Ok(org),
            _ => Err(forbidden()),
        }
    }
}

impl From<&user::Model> for Actor {
    fn from(user: &user::Model) -> Self {
        Self::from_user(user)
    }
}

/// Operations subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewAllReports,
    VerifyOrganization,
    AssignReport,
    SetPriority,
    ViewAuditLog,
    ViewGlobalStats,
    ListOrganizations,
    /// View one report; `assigned_org` is `None` for unassigned or unknown reports.
    ViewReport { assigned_org: Option<i32> },
    UpdateReport { assigned_org: Option<i32> },
    UpdateAidRequest { assigned_org: Option<i32> },
    ManageOwnOrganization { organization_id: i32 },
    ViewOrganizationStats { organization_id: i32 },
}

/// Decide whether `actor` may perform `action`.
pub fn authorize(actor: &Actor, action: Action) -> AppResult<()> {
    let allowed = match actor.role {
        Role::Admin => matches!(
            action,
            Action::ViewAllReports
                | Action::VerifyOrganization
                | Action::AssignReport
                | Action::SetPriority
                | Action::ViewAuditLog
                | Action::ViewGlobalStats
                | Action::ListOrganizations
                | Action::ViewReport { .. }
                | Action::ViewOrganizationStats { .. }
        ),
        Role::Provider => match action {
            Action::ViewReport { assigned_org }
            | Action::UpdateReport { assigned_org }
            | Action::UpdateAidRequest { assigned_org } => {
                owns(actor, assigned_org)
            }
            Action::ManageOwnOrganization { organization_id }
            | Action::ViewOrganizationStats { organization_id } => {
                owns(actor, Some(organization_id))
            }
            _ => false,
        },
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!(user_id = actor.user_id, ?action, "Authorization denied");
        Err(forbidden())
    }
}

fn owns(actor: &Actor, org: Option<i32>) -> bool {
    matches!((actor.organization_id, org), (Some(own), Some(target)) if own == target)
}

fn forbidden() -> AppError {
    AppError::Forbidden(DENIED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn admin() -> Actor {
        Actor {
            user_id: 1,
            role: Role::Admin,
            organization_id: None,
        }
    }

    const fn provider(org: i32) -> Actor {
        Actor {
            user_id: 2,
            role: Role::Provider,
            organization_id: Some(org),
        }
    }

    #[test]
    fn test_admin_only_actions() {
        for action in [
            Action::ViewAllReports,
            Action::VerifyOrganization,
            Action::AssignReport,
            Action::SetPriority,
            Action::ViewAuditLog,
            Action::ViewGlobalStats,
            Action::ListOrganizations,
        ] {
            assert!(authorize(&admin(), action).is_ok(), "{action:?}");
            assert!(
                matches!(authorize(&provider(1), action), Err(AppError::Forbidden(_))),
                "{action:?}"
            );
        }
    }

    #[test]
    fn test_admin_views_but_does_not_update_reports() {
        let assigned = Some(4);
        assert!(authorize(&admin(), Action::ViewReport { assigned_org: assigned }).is_ok());
        assert!(authorize(&admin(), Action::UpdateReport { assigned_org: assigned }).is_err());
        assert!(authorize(&admin(), Action::UpdateAidRequest { assigned_org: assigned }).is_err());
        assert!(
            authorize(&admin(), Action::ManageOwnOrganization { organization_id: 4 }).is_err()
        );
    }

    #[test]
    fn test_provider_scoped_to_own_organization() {
        let actor = provider(4);
        assert!(authorize(&actor, Action::UpdateReport { assigned_org: Some(4) }).is_ok());
        assert!(authorize(&actor, Action::UpdateReport { assigned_org: Some(5) }).is_err());
        assert!(authorize(&actor, Action::ViewReport { assigned_org: None }).is_err());
        assert!(
            authorize(&actor, Action::ViewOrganizationStats { organization_id: 4 }).is_ok()
        );
        assert!(
            authorize(&actor, Action::ManageOwnOrganization { organization_id: 5 }).is_err()
        );
    }

    #[test]
    fn test_provider_without_organization_is_denied() {
        let actor = Actor {
            user_id: 3,
            role: Role::Provider,
            organization_id: None,
        };
        assert!(authorize(&actor, Action::ViewReport { assigned_org: None }).is_err());
        assert!(actor.provider_organization().is_err());
    }

    #[test]
    fn test_denials_are_indistinguishable() {
        let actor = provider(4);
        let foreign = authorize(&actor, Action::UpdateReport { assigned_org: Some(9) })
            .err()
            .map(|e| e.to_string());
        let missing = authorize(&actor, Action::UpdateReport { assigned_org: None })
            .err()
            .map(|e| e.to_string());
        assert_eq!(foreign, missing);
    }
}
