//! Backend boundary for the dashboard.
//!
//! The REST client itself lives outside this workspace; everything here talks
//! to it through `DashboardApi`. Each method names the endpoint it stands for.
use async_trait::async_trait;

use crate::error::ApiResult;
use crate::model::{
    Emergency, EmergencyUnit, Guide, GuideDraft, GuideFilterParams, HealthAlert, ScanSchedule,
    User, VerifyAction,
};

#[async_trait]
pub trait DashboardApi: Send + Sync {
    /// `GET /users`
    async fn list_users(&self) -> ApiResult<Vec<User>>;

    /// `POST /admin/verify-user` with `{ userId, action }`
    async fn verify_user(&self, id: &str, action: VerifyAction) -> ApiResult<User>;

    /// `DELETE /users/{id}`
    async fn delete_user(&self, id: &str) -> ApiResult<()>;

    /// `GET /emergency`
    async fn list_emergencies(&self) -> ApiResult<Vec<Emergency>>;

    /// `PUT /emergency/{id}/resolve`
    async fn resolve_emergency(&self, id: &str) -> ApiResult<Emergency>;

    /// `DELETE /emergency/{id}`
    async fn delete_emergency(&self, id: &str) -> ApiResult<()>;

    /// `GET /emergency-units`
    async fn list_emergency_units(&self) -> ApiResult<Vec<EmergencyUnit>>;

    /// `POST /admin/verify-user` for a unit account
    async fn verify_emergency_unit(&self, id: &str, action: VerifyAction)
        -> ApiResult<EmergencyUnit>;

    /// `PUT /emergency-units/{id}/availability` with `{ availabilityStatus }`
    async fn set_unit_availability(&self, id: &str, available: bool) -> ApiResult<EmergencyUnit>;

    /// `DELETE /emergency-units/{id}`
    async fn delete_emergency_unit(&self, id: &str) -> ApiResult<()>;

    /// `GET /firstAidGuide?category=&language=&severity=`
    async fn list_guides(&self, params: GuideFilterParams) -> ApiResult<Vec<Guide>>;

    /// `POST /firstAidGuide`
    async fn create_guide(&self, draft: &GuideDraft) -> ApiResult<Guide>;

    /// `PUT /firstAidGuide/{id}` (full replace)
    async fn update_guide(&self, id: &str, draft: &GuideDraft) -> ApiResult<Guide>;

    /// `DELETE /firstAidGuide/{id}`
    async fn delete_guide(&self, id: &str) -> ApiResult<()>;

    /// `GET /health-alert?resolved=`
    async fn list_health_alerts(&self, resolved: Option<bool>) -> ApiResult<Vec<HealthAlert>>;

    /// `PATCH /health-alert/{id}/resolve`
    async fn resolve_health_alert(&self, id: &str) -> ApiResult<HealthAlert>;

    /// `GET /health-alert/scan`; returns the alerts raised by this scan.
    async fn trigger_health_scan(&self) -> ApiResult<Vec<HealthAlert>>;

    /// `GET /cron/health-alert/status`
    async fn scan_schedule(&self) -> ApiResult<ScanSchedule>;

    /// `POST /cron/health-alert/start` or `/stop`
    async fn set_scan_schedule_running(&self, running: bool) -> ApiResult<ScanSchedule>;
}
