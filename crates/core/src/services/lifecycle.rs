//! Report and aid request state machines.
//!
//! ```text
//! Pending -> Assigned -> In Progress -> Resolved -> Closed
//! ```
//!
//! Nothing ever returns to Pending. Closed is terminal; Resolved is terminal
//! unless the reopen policy is enabled.

use safenet_common::{AppError, AppResult};
use safenet_db::entities::{aid_request::AidStatus, report::ReportStatus};

/// Configurable lifecycle rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// Let providers move a resolved report back to In Progress.
    pub allow_reopen: bool,
}

impl LifecyclePolicy {
    #[must_use]
    pub const fn new(allow_reopen: bool) -> Self {
        Self { allow_reopen }
    }

    /// Whether no further provider transition can leave `status`.
    #[must_use]
    pub const fn is_terminal(&self, status: ReportStatus) -> bool {
        match status {
            ReportStatus::Closed => true,
            ReportStatus::Resolved => !self.allow_reopen,
            _ => false,
        }
    }

    /// Check that a report in `current` may be (re)assigned.
    pub fn check_assignment(&self, current: ReportStatus) -> AppResult<()> {
        match current {
            ReportStatus::Pending | ReportStatus::Assigned | ReportStatus::InProgress => Ok(()),
            ReportStatus::Resolved | ReportStatus::Closed => Err(AppError::Validation(format!(
                "A report that is {current} cannot be reassigned"
            ))),
        }
    }

    /// Check a provider-initiated status change.
    pub fn check_provider_transition(
        &self,
        current: ReportStatus,
        target: ReportStatus,
    ) -> AppResult<()> {
        use ReportStatus::{Assigned, Closed, InProgress, Pending, Resolved};

        let allowed = match (current, target) {
            (Assigned | InProgress, InProgress | Resolved | Closed) => true,
            (Resolved, InProgress) => self.allow_reopen,
            _ => false,
        };

        if allowed {
            return Ok(());
        }

        let reason = match (current, target) {
            (Pending, _) => "the report has not been assigned yet".to_string(),
            (_, Pending | Assigned) => format!("providers cannot set status to {target}"),
            _ if self.is_terminal(current) => format!("the report is already {current}"),
            _ => format!("cannot move from {current} to {target}"),
        };
        Err(AppError::Validation(format!("Invalid status change: {reason}")))
    }

    /// Check an aid request status change.
    pub fn check_aid_transition(&self, current: AidStatus, target: AidStatus) -> AppResult<()> {
        use AidStatus::{Assigned, Declined, Fulfilled, Pending};

        match (current, target) {
            (Pending, Assigned | Declined) | (Assigned, Fulfilled | Declined) => Ok(()),
            _ => Err(AppError::Validation(format!(
                "Invalid aid request status change: {} to {}",
                current.as_str(),
                target.as_str()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReportStatus::{Assigned, Closed, InProgress, Pending, Resolved};

    #[test]
    fn test_assignment_allowed_from_open_states() {
        let policy = LifecyclePolicy::default();
        assert!(policy.check_assignment(Pending).is_ok());
        assert!(policy.check_assignment(Assigned).is_ok());
        assert!(policy.check_assignment(InProgress).is_ok());
        assert!(matches!(
            policy.check_assignment(Resolved),
            Err(AppError::Validation(_))
        ));
        assert!(policy.check_assignment(Closed).is_err());
    }

    #[test]
    fn test_provider_transitions() {
        let policy = LifecyclePolicy::default();
        assert!(policy.check_provider_transition(Assigned, InProgress).is_ok());
        assert!(policy.check_provider_transition(Assigned, Resolved).is_ok());
        assert!(policy.check_provider_transition(InProgress, InProgress).is_ok());
        assert!(policy.check_provider_transition(InProgress, Closed).is_ok());

        assert!(policy.check_provider_transition(Pending, InProgress).is_err());
        assert!(policy.check_provider_transition(InProgress, Pending).is_err());
        assert!(policy.check_provider_transition(InProgress, Assigned).is_err());
        assert!(policy.check_provider_transition(Closed, InProgress).is_err());
    }

    #[test]
    fn test_resolved_is_terminal_without_reopen() {
        let policy = LifecyclePolicy::new(false);
        assert!(policy.is_terminal(Resolved));
        assert!(policy.check_provider_transition(Resolved, InProgress).is_err());
        assert!(policy.check_provider_transition(Resolved, Closed).is_err());
    }

    #[test]
    fn test_reopen_policy() {
        let policy = LifecyclePolicy::new(true);
        assert!(!policy.is_terminal(Resolved));
        assert!(policy.is_terminal(Closed));
        assert!(policy.check_provider_transition(Resolved, InProgress).is_ok());
        assert!(policy.check_provider_transition(Resolved, Closed).is_err());
        // Still never back to Pending
        assert!(policy.check_provider_transition(Resolved, Pending).is_err());
    }

    #[test]
    fn test_aid_transitions() {
        let policy = LifecyclePolicy::default();
        assert!(policy.check_aid_transition(AidStatus::Pending, AidStatus::Assigned).is_ok());
        assert!(policy.check_aid_transition(AidStatus::Pending, AidStatus::Declined).is_ok());
        assert!(policy.check_aid_transition(AidStatus::Assigned, AidStatus::Fulfilled).is_ok());
        assert!(policy.check_aid_transition(AidStatus::Pending, AidStatus::Fulfilled).is_err());
        assert!(policy.check_aid_transition(AidStatus::Fulfilled, AidStatus::Declined).is_err());
    }
}
