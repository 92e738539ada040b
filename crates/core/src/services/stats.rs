//! Dashboards and aggregate counts.

use safenet_common::AppResult;
use safenet_db::{
    entities::{
        aid_request, organization,
        report::{self, ReportStatus},
    },
    repositories::{
        AidRequestRepository, CategoryCount, OrganizationRepository, ReportFilter,
        ReportRepository,
    },
};
use sea_orm::Iterable;
use serde::Serialize;

use super::access::{Action, Actor, authorize};

/// Reports shown on the administrator dashboard.
const RECENT_REPORTS: u64 = 10;

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: ReportStatus,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub recent_reports: Vec<report::Model>,
    pub organizations: Vec<organization::Model>,
    pub total_reports: u64,
    pub pending_reports: u64,
    pub verified_organizations: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderDashboard {
    pub organization_id: i32,
    pub reports: Vec<report::Model>,
    pub active_reports: usize,
    pub resolved_reports: usize,
    pub aid_requests: Vec<aid_request::Model>,
    pub aid_request_count: usize,
}

/// Role-dependent landing data.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
    Admin(AdminDashboard),
    Provider(ProviderDashboard),
}

/// Role-dependent aggregate counts.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum Stats {
    Global {
        by_status: Vec<StatusCount>,
        by_category: Vec<CategoryCount>,
        organizations: u64,
        verified_organizations: u64,
    },
    Organization {
        organization_id: i32,
        by_status: Vec<StatusCount>,
    },
}

/// Stats service for dashboards.
#[derive(Clone)]
pub struct StatsService {
    report_repo: ReportRepository,
    org_repo: OrganizationRepository,
    aid_repo: AidRequestRepository,
}

impl StatsService {
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        org_repo: OrganizationRepository,
        aid_repo: AidRequestRepository,
    ) -> Self {
        Self {
            report_repo,
            org_repo,
            aid_repo,
        }
    }

    /// Dashboard for the calling user.
    pub async fn dashboard(&self, actor: &Actor) -> AppResult<Dashboard> {
        if actor.is_admin() {
            return self.admin_dashboard(actor).await.map(Dashboard::Admin);
        }
        self.provider_dashboard(actor).await.map(Dashboard::Provider)
    }

    async fn admin_dashboard(&self, actor: &Actor) -> AppResult<AdminDashboard> {
        authorize(actor, Action::ViewAllReports)?;

        let recent_reports = self.report_repo.list_recent(RECENT_REPORTS).await?;
        let organizations = self.org_repo.list(None).await?;
        let total_reports = self.report_repo.count(&ReportFilter::default()).await?;
        let pending_reports = self
            .report_repo
            .count(&ReportFilter {
                status: Some(ReportStatus::Pending),
                ..ReportFilter::default()
            })
            .await?;
        let verified_organizations = self.org_repo.count_verified().await?;

        Ok(AdminDashboard {
            recent_reports,
            organizations,
            total_reports,
            pending_reports,
            verified_organizations,
        })
    }

    async fn provider_dashboard(&self, actor: &Actor) -> AppResult<ProviderDashboard> {
        let organization_id = actor.provider_organization()?;
        authorize(actor, Action::ViewOrganizationStats { organization_id })?;

        let reports = self.report_repo.list_for_provider(organization_id).await?;
        let active_reports = reports
            .iter()
            .filter(|r| matches!(r.status, ReportStatus::Assigned | ReportStatus::InProgress))
            .count();
        let resolved_reports = reports
            .iter()
            .filter(|r| r.status == ReportStatus::Resolved)
            .count();

        let report_ids: Vec<i32> = reports.iter().map(|r| r.id).collect();
        let aid_requests = self.aid_repo.list_for_reports(&report_ids).await?;

        Ok(ProviderDashboard {
            organization_id,
            active_reports,
            resolved_reports,
            aid_request_count: aid_requests.len(),
            aid_requests,
            reports,
        })
    }

    /// Aggregate counts: global for administrators, own organization for providers.
    pub async fn stats(&self, actor: &Actor) -> AppResult<Stats> {
        if actor.is_admin() {
            authorize(actor, Action::ViewGlobalStats)?;
            return Ok(Stats::Global {
                by_status: self.count_by_status(None).await?,
                by_category: self.report_repo.count_by_category().await?,
                organizations: self.org_repo.count().await?,
                verified_organizations: self.org_repo.count_verified().await?,
            });
        }

        let organization_id = actor.provider_organization()?;
        authorize(actor, Action::ViewOrganizationStats { organization_id })?;
        Ok(Stats::Organization {
            organization_id,
            by_status: self.count_by_status(Some(organization_id)).await?,
        })
    }

    async fn count_by_status(&self, provider_id: Option<i32>) -> AppResult<Vec<StatusCount>> {
        let mut counts = Vec::new();
        for status in ReportStatus::iter() {
            let filter = ReportFilter {
                status: Some(status),
                provider_id,
                ..ReportFilter::default()
            };
            counts.push(StatusCount {
                status,
                count: self.report_repo.count(&filter).await?,
            });
        }
        Ok(counts)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use safenet_db::entities::{report::Priority, user::Role};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn count_row(n: i64) -> [std::collections::BTreeMap<&'static str, sea_orm::Value>; 1] {
        [maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }]
    }

    fn service(reports: MockDatabase, orgs: MockDatabase, aids: MockDatabase) -> StatsService {
        StatsService::new(
            ReportRepository::new(Arc::new(reports.into_connection())),
            OrganizationRepository::new(Arc::new(orgs.into_connection())),
            AidRequestRepository::new(Arc::new(aids.into_connection())),
        )
    }

    fn test_report(id: i32, status: ReportStatus) -> report::Model {
        let now = Utc::now();
        report::Model {
            id,
            tracking_code: format!("code-{id}"),
            category: "Legal".to_string(),
            description: "Eviction".to_string(),
            location: "Abuja".to_string(),
            latitude: None,
            longitude: None,
            incident_date: now.into(),
            status,
            priority: Priority::Medium,
            assigned_provider_id: Some(2),
            submitted_at: now.into(),
            assigned_at: Some(now.into()),
            resolved_at: None,
            updated_at: now.into(),
            ip_hash: None,
        }
    }

    #[tokio::test]
    async fn test_admin_dashboard_counts() {
        let reports = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_report(1, ReportStatus::Pending)]])
            .append_query_results([count_row(12)])
            .append_query_results([count_row(4)]);
        let orgs = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<organization::Model>::new()])
            .append_query_results([count_row(3)]);
        let admin = Actor {
            user_id: 1,
            role: Role::Admin,
            organization_id: None,
        };

        let dashboard = service(reports, orgs, MockDatabase::new(DatabaseBackend::Postgres))
            .dashboard(&admin)
            .await
            .unwrap();

        let Dashboard::Admin(dashboard) = dashboard else {
            panic!("expected admin dashboard");
        };
        assert_eq!(dashboard.recent_reports.len(), 1);
        assert_eq!(dashboard.total_reports, 12);
        assert_eq!(dashboard.pending_reports, 4);
        assert_eq!(dashboard.verified_organizations, 3);
    }

    #[tokio::test]
    async fn test_provider_dashboard_splits_active_and_resolved() {
        let reports = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![
            test_report(1, ReportStatus::Assigned),
            test_report(2, ReportStatus::InProgress),
            test_report(3, ReportStatus::Resolved),
        ]]);
        let aids = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<aid_request::Model>::new()]);
        let provider = Actor {
            user_id: 5,
            role: Role::Provider,
            organization_id: Some(2),
        };

        let dashboard = service(reports, MockDatabase::new(DatabaseBackend::Postgres), aids)
            .dashboard(&provider)
            .await
            .unwrap();

        let Dashboard::Provider(dashboard) = dashboard else {
            panic!("expected provider dashboard");
        };
        assert_eq!(dashboard.reports.len(), 3);
        assert_eq!(dashboard.active_reports, 2);
        assert_eq!(dashboard.resolved_reports, 1);
        assert_eq!(dashboard.aid_request_count, 0);
    }

    #[tokio::test]
    async fn test_provider_stats_cover_every_status() {
        let mut reports = MockDatabase::new(DatabaseBackend::Postgres);
        for n in [0, 2, 1, 5, 0] {
            reports = reports.append_query_results([count_row(n)]);
        }
        let provider = Actor {
            user_id: 5,
            role: Role::Provider,
            organization_id: Some(2),
        };

        let stats = service(
            reports,
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        )
        .stats(&provider)
        .await
        .unwrap();

        let Stats::Organization { by_status, .. } = stats else {
            panic!("expected organization stats");
        };
        assert_eq!(by_status.len(), 5);
        assert_eq!(by_status[3].status, ReportStatus::Resolved);
        assert_eq!(by_status[3].count, 5);
    }
}
