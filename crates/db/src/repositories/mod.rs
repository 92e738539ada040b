//! Database repositories.

use safenet_common::AppError;
use sea_orm::{DbErr, SqlErr};

mod aid_request;
mod organization;
mod report;
mod report_attachment;
mod report_update;
mod session;
mod system_log;
mod user;
mod verification_record;

pub use aid_request::AidRequestRepository;
pub use organization::OrganizationRepository;
pub use report::{CategoryCount, ReportFilter, ReportRepository};
pub use report_attachment::ReportAttachmentRepository;
pub use report_update::ReportUpdateRepository;
pub use session::SessionRepository;
pub use system_log::SystemLogRepository;
pub use user::UserRepository;
pub use verification_record::VerificationRecordRepository;

/// Postgres message for SQLSTATE 23505.
const UNIQUE_VIOLATION_MESSAGE: &str = "duplicate key value violates unique constraint";

/// Map a failed insert. A unique-constraint violation becomes `Conflict` with
/// `conflict` as its message; anything else stays a database error.
pub(crate) fn write_error(err: DbErr, conflict: &str) -> AppError {
    let unique_violation = matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || err.to_string().contains(UNIQUE_VIOLATION_MESSAGE);
    if unique_violation {
        AppError::Conflict(conflict.to_string())
    } else {
        AppError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn test_write_error_maps_unique_violation_to_conflict() {
        let err = DbErr::Query(RuntimeErr::Internal(format!(
            "{UNIQUE_VIOLATION_MESSAGE} \"user_username_key\""
        )));
        assert!(matches!(write_error(err, "taken"), AppError::Conflict(m) if m == "taken"));

        let err = DbErr::Query(RuntimeErr::Internal("connection reset".to_string()));
        assert!(matches!(write_error(err, "taken"), AppError::Database(_)));
    }
}
