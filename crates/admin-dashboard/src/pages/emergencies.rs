use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use dashboard_common::api::DashboardApi;
use dashboard_common::model::{Emergency, EmergencyStatus};
use dashboard_common::notify::{Notification, Notifier};

use super::{report_failure, ListPage};

pub struct EmergenciesPage {
    api: Arc<dyn DashboardApi>,
    notifier: Arc<dyn Notifier>,
    pub list: ListPage<Emergency>,
}

impl EmergenciesPage {
    pub fn new(api: Arc<dyn DashboardApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            list: ListPage::new(),
        }
    }

    pub async fn load(&mut self, now: DateTime<Utc>) -> bool {
        match self.api.list_emergencies().await {
            Ok(emergencies) => {
                info!(count = emergencies.len(), "emergencies loaded");
                self.list.replace_all(emergencies, now);
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to load emergencies");
                false
            }
        }
    }

    /// Emergency types present in the cache, for the type filter.
    pub fn type_options(&self) -> Vec<String> {
        self.list.facet_options("type")
    }

    pub async fn resolve(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        match self.api.resolve_emergency(id).await {
            Ok(updated) => {
                if !self.list.replace(updated, now) {
                    self.list.update(id, now, |e| {
                        e.status = EmergencyStatus::Resolved;
                        e.resolved_at = Some(now);
                    });
                }
                info!(emergency_id = %id, "emergency resolved");
                self.notifier
                    .notify(Notification::success("Emergency marked as resolved"));
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to resolve emergency");
                false
            }
        }
    }

    pub async fn delete(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        match self.api.delete_emergency(id).await {
            Ok(()) => {
                self.list.remove(id, now);
                info!(emergency_id = %id, "emergency deleted");
                self.notifier
                    .notify(Notification::success("Emergency deleted successfully"));
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to delete emergency");
                false
            }
        }
    }
}
