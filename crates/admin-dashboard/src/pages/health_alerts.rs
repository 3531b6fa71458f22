use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use dashboard_common::api::DashboardApi;
use dashboard_common::model::{HealthAlert, ScanSchedule};
use dashboard_common::notify::{Notification, Notifier};

use super::{report_failure, ListPage};

pub struct HealthAlertsPage {
    api: Arc<dyn DashboardApi>,
    notifier: Arc<dyn Notifier>,
    schedule: Option<ScanSchedule>,
    pub list: ListPage<HealthAlert>,
}

impl HealthAlertsPage {
    pub fn new(api: Arc<dyn DashboardApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            schedule: None,
            list: ListPage::new(),
        }
    }

    pub async fn load(&mut self, now: DateTime<Utc>) -> bool {
        match self.api.list_health_alerts(None).await {
            Ok(alerts) => {
                info!(count = alerts.len(), "health alerts loaded");
                self.list.replace_all(alerts, now);
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to load health alerts");
                false
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.list.items().iter().filter(|a| !a.resolved).count()
    }

    pub async fn resolve(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        match self.api.resolve_health_alert(id).await {
            Ok(updated) => {
                self.list.replace(updated, now);
                info!(alert_id = %id, "health alert resolved");
                self.notifier.notify(
                    Notification::success("Health alert has been marked as resolved")
                        .with_title("Alert Resolved"),
                );
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to resolve alert");
                false
            }
        }
    }

    /// Run a scan now. New alerts are added to the cache.
    pub async fn scan(&mut self, now: DateTime<Utc>) -> Option<usize> {
        match self.api.trigger_health_scan().await {
            Ok(raised) => {
                let count = raised.len();
                info!(count, "health scan finished");
                for alert in raised.into_iter().rev() {
                    if !self.list.replace(alert.clone(), now) {
                        self.list.prepend(alert);
                    }
                }
                let description = if count > 0 {
                    format!("{count} new health alerts detected")
                } else {
                    "No new health risks detected".to_string()
                };
                self.notifier
                    .notify(Notification::success(description).with_title("Scan Complete"));
                Some(count)
            }
            Err(e) => {
                warn!(error = %e, "health scan failed");
                self.notifier.notify(
                    Notification::error("Failed to perform health risk scan")
                        .with_title("Scan Failed"),
                );
                None
            }
        }
    }

    /// Fetch the scheduler status, assuming the default schedule when the
    /// backend cannot report one.
    pub async fn load_schedule(&mut self, now: DateTime<Utc>) -> &ScanSchedule {
        let schedule = match self.api.scan_schedule().await {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!(error = %e, "scan schedule unavailable, using default");
                ScanSchedule::fallback(now)
            }
        };
        self.schedule.insert(schedule)
    }

    pub fn schedule(&self) -> Option<&ScanSchedule> {
        self.schedule.as_ref()
    }

    /// Stop the scheduler when running, start it otherwise.
    pub async fn toggle_schedule(&mut self) -> bool {
        let running = self.schedule.as_ref().is_some_and(|s| s.is_running);
        match self.api.set_scan_schedule_running(!running).await {
            Ok(schedule) => {
                let notification = if schedule.is_running {
                    Notification::success("Automatic health scanning has been started")
                        .with_title("Cron Started")
                } else {
                    Notification::success("Automatic health scanning has been stopped")
                        .with_title("Cron Stopped")
                };
                info!(running = schedule.is_running, "scan schedule updated");
                self.schedule = Some(schedule);
                self.notifier.notify(notification);
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to control cron job");
                false
            }
        }
    }

    pub fn next_run_countdown(&self, now: DateTime<Utc>) -> String {
        format_countdown(self.schedule.as_ref().and_then(|s| s.next_run), now)
    }
}

/// Time left until `next_run` as "Xh Ym", "Ym" or "Soon".
pub fn format_countdown(next_run: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(next_run) = next_run else {
        return "Unknown".to_string();
    };
    let remaining = next_run.signed_duration_since(now);
    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        "Soon".to_string()
    }
}
