//! In-memory `DashboardApi` backed by a JSON snapshot.
//!
//! Serves the snapshot binary and the page tests. A failure can be queued with
//! `fail_next`, which the next call returns instead of touching state.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::api::DashboardApi;
use crate::error::{ApiError, ApiResult};
use crate::model::{
    Emergency, EmergencyStatus, EmergencyUnit, Guide, GuideDraft, GuideFilterParams, HealthAlert,
    ScanSchedule, User, VerifyAction,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub emergencies: Vec<Emergency>,
    #[serde(default)]
    pub emergency_units: Vec<EmergencyUnit>,
    #[serde(default)]
    pub guides: Vec<Guide>,
    #[serde(default)]
    pub health_alerts: Vec<HealthAlert>,
    pub scan_schedule: Option<ScanSchedule>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

pub struct InMemoryApi {
    state: RwLock<Snapshot>,
    staged_scan: Mutex<Vec<HealthAlert>>,
    failure: Mutex<Option<ApiError>>,
    next_id: AtomicU64,
}

impl InMemoryApi {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
            staged_scan: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Make the next call fail with `err`.
    pub fn fail_next(&self, err: ApiError) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(err);
        }
    }

    /// Alerts the next `trigger_health_scan` will raise.
    pub fn stage_scan_alerts(&self, alerts: Vec<HealthAlert>) {
        if let Ok(mut staged) = self.staged_scan.lock() {
            staged.extend(alerts);
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.clone()
    }

    fn check_failure(&self) -> ApiResult<()> {
        let queued = self.failure.lock().ok().and_then(|mut f| f.take());
        match queued {
            Some(err) => {
                debug!(error = %err, "returning queued failure");
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn mint_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{n}")
    }
}

fn not_found(kind: &'static str, id: &str) -> ApiError {
    ApiError::NotFound {
        kind,
        id: id.to_string(),
    }
}

fn remove_by_id<T>(items: &mut Vec<T>, id: &str, id_of: impl Fn(&T) -> &str) -> bool {
    let before = items.len();
    items.retain(|item| id_of(item) != id);
    items.len() != before
}

#[async_trait]
impl DashboardApi for InMemoryApi {
    async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.check_failure()?;
        Ok(self.state.read().await.users.clone())
    }

    async fn verify_user(&self, id: &str, action: VerifyAction) -> ApiResult<User> {
        self.check_failure()?;
        let mut state = self.state.write().await;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| not_found("user", id))?;
        let verified = action == VerifyAction::Verify;
        user.is_verified = verified;
        user.is_approved_by_admin = verified;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> ApiResult<()> {
        self.check_failure()?;
        let mut state = self.state.write().await;
        if remove_by_id(&mut state.users, id, |u| &u.id) {
            Ok(())
        } else {
            Err(not_found("user", id))
        }
    }

    async fn list_emergencies(&self) -> ApiResult<Vec<Emergency>> {
        self.check_failure()?;
        Ok(self.state.read().await.emergencies.clone())
    }

    async fn resolve_emergency(&self, id: &str) -> ApiResult<Emergency> {
        self.check_failure()?;
        let mut state = self.state.write().await;
        let emergency = state
            .emergencies
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found("emergency", id))?;
        emergency.status = EmergencyStatus::Resolved;
        emergency.resolved_at = Some(Utc::now());
        Ok(emergency.clone())
    }

    async fn delete_emergency(&self, id: &str) -> ApiResult<()> {
        self.check_failure()?;
        let mut state = self.state.write().await;
        if remove_by_id(&mut state.emergencies, id, |e| &e.id) {
            Ok(())
        } else {
            Err(not_found("emergency", id))
        }
    }

    async fn list_emergency_units(&self) -> ApiResult<Vec<EmergencyUnit>> {
        self.check_failure()?;
        Ok(self.state.read().await.emergency_units.clone())
    }

    async fn verify_emergency_unit(
        &self,
        id: &str,
        action: VerifyAction,
    ) -> ApiResult<EmergencyUnit> {
        self.check_failure()?;
        let mut state = self.state.write().await;
        let unit = state
            .emergency_units
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| not_found("emergency unit", id))?;
        let verified = action == VerifyAction::Verify;
        unit.is_verified = verified;
        unit.is_approved_by_admin = verified;
        Ok(unit.clone())
    }

    async fn set_unit_availability(&self, id: &str, available: bool) -> ApiResult<EmergencyUnit> {
        self.check_failure()?;
        let mut state = self.state.write().await;
        let unit = state
            .emergency_units
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| not_found("emergency unit", id))?;
        unit.availability_status = available;
        Ok(unit.clone())
    }

    async fn delete_emergency_unit(&self, id: &str) -> ApiResult<()> {
        self.check_failure()?;
        let mut state = self.state.write().await;
        if remove_by_id(&mut state.emergency_units, id, |u| &u.id) {
            Ok(())
        } else {
            Err(not_found("emergency unit", id))
        }
    }

    async fn list_guides(&self, params: GuideFilterParams) -> ApiResult<Vec<Guide>> {
        self.check_failure()?;
        let state = self.state.read().await;
        Ok(state
            .guides
            .iter()
            .filter(|g| params.matches(g))
            .cloned()
            .collect())
    }

    async fn create_guide(&self, draft: &GuideDraft) -> ApiResult<Guide> {
        self.check_failure()?;
        let now = Utc::now();
        let guide = Guide {
            id: self.mint_id("guide"),
            title: draft.title.clone(),
            category: draft.category,
            language: draft.language,
            severity: draft.severity,
            description: draft.description.clone(),
            content: draft.content.clone(),
            created_at: Some(now),
            updated_at: now,
            view_count: 0,
        };
        self.state.write().await.guides.push(guide.clone());
        Ok(guide)
    }

    async fn update_guide(&self, id: &str, draft: &GuideDraft) -> ApiResult<Guide> {
        self.check_failure()?;
        let mut state = self.state.write().await;
        let guide = state
            .guides
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| not_found("guide", id))?;
        guide.title = draft.title.clone();
        guide.category = draft.category;
        guide.language = draft.language;
        guide.severity = draft.severity;
        guide.description = draft.description.clone();
        guide.content = draft.content.clone();
        guide.updated_at = Utc::now();
        Ok(guide.clone())
    }

    async fn delete_guide(&self, id: &str) -> ApiResult<()> {
        self.check_failure()?;
        let mut state = self.state.write().await;
        if remove_by_id(&mut state.guides, id, |g| &g.id) {
            Ok(())
        } else {
            Err(not_found("guide", id))
        }
    }

    async fn list_health_alerts(&self, resolved: Option<bool>) -> ApiResult<Vec<HealthAlert>> {
        self.check_failure()?;
        let state = self.state.read().await;
        Ok(state
            .health_alerts
            .iter()
            .filter(|a| resolved.map_or(true, |r| a.resolved == r))
            .cloned()
            .collect())
    }

    async fn resolve_health_alert(&self, id: &str) -> ApiResult<HealthAlert> {
        self.check_failure()?;
        let mut state = self.state.write().await;
        let alert = state
            .health_alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found("health alert", id))?;
        alert.resolved = true;
        alert.resolved_at = Some(Utc::now());
        Ok(alert.clone())
    }

    async fn trigger_health_scan(&self) -> ApiResult<Vec<HealthAlert>> {
        self.check_failure()?;
        let raised = self
            .staged_scan
            .lock()
            .map(|mut staged| std::mem::take(&mut *staged))
            .unwrap_or_default();
        self.state
            .write()
            .await
            .health_alerts
            .extend(raised.iter().cloned());
        Ok(raised)
    }

    async fn scan_schedule(&self) -> ApiResult<ScanSchedule> {
        self.check_failure()?;
        self.state
            .read()
            .await
            .scan_schedule
            .clone()
            .ok_or_else(|| ApiError::Unavailable("scan scheduler not configured".to_string()))
    }

    async fn set_scan_schedule_running(&self, running: bool) -> ApiResult<ScanSchedule> {
        self.check_failure()?;
        let mut state = self.state.write().await;
        let schedule = state
            .scan_schedule
            .get_or_insert_with(|| ScanSchedule::fallback(Utc::now()));
        schedule.is_running = running;
        Ok(schedule.clone())
    }
}
