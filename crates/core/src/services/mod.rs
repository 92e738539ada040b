//! Business logic services.

#![allow(missing_docs)]

pub mod access;
pub mod account;
pub mod aid_request;
pub mod audit;
pub mod lifecycle;
pub mod organization;
pub mod report;
pub mod stats;

pub use access::{Action, Actor, authorize};
pub use account::{
    AccountService, ChangePasswordInput, LoginOutcome, RegisterProviderInput, hash_password,
    verify_password,
};
pub use aid_request::AidRequestService;
pub use audit::{AuditEvent, AuditLogger};
pub use lifecycle::LifecyclePolicy;
pub use organization::{
    OrganizationDetail, OrganizationService, UpdateOrganizationInput, VerificationAction,
    VerifyOrganizationInput,
};
pub use report::{
    AidRequestInput, AttachmentUpload, ReportDetail, ReportService, StatusUpdateInput,
    SubmissionOptions, SubmitReportInput, TrackedReport,
};
pub use stats::{AdminDashboard, Dashboard, ProviderDashboard, Stats, StatsService, StatusCount};
