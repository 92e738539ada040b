//! Database entities.

pub mod aid_request;
pub mod organization;
pub mod report;
pub mod report_attachment;
pub mod report_update;
pub mod session;
pub mod system_log;
pub mod user;
pub mod verification_record;

pub use aid_request::Entity as AidRequest;
pub use organization::Entity as Organization;
pub use report::Entity as Report;
pub use report_attachment::Entity as ReportAttachment;
pub use report_update::Entity as ReportUpdate;
pub use session::Entity as Session;
pub use system_log::Entity as SystemLog;
pub use user::Entity as User;
pub use verification_record::Entity as VerificationRecord;
