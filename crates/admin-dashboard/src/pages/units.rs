use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use dashboard_common::api::DashboardApi;
use dashboard_common::error::ApiError;
use dashboard_common::model::{EmergencyUnit, Role, UnitStats, VerifyAction};
use dashboard_common::notify::{Notification, Notifier};

use super::{report_failure, ListPage};

pub struct UnitsPage {
    api: Arc<dyn DashboardApi>,
    notifier: Arc<dyn Notifier>,
    pub list: ListPage<EmergencyUnit>,
}

impl UnitsPage {
    pub fn new(api: Arc<dyn DashboardApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            list: ListPage::new(),
        }
    }

    /// Only accounts with the emergency-unit role are kept.
    pub async fn load(&mut self, now: DateTime<Utc>) -> bool {
        match self.api.list_emergency_units().await {
            Ok(units) => {
                let units: Vec<EmergencyUnit> = units
                    .into_iter()
                    .filter(|u| u.role == Role::EmergencyUnit)
                    .collect();
                info!(count = units.len(), "emergency units loaded");
                self.list.replace_all(units, now);
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to load emergency units");
                false
            }
        }
    }

    pub fn stats(&self) -> UnitStats {
        UnitStats::from_units(self.list.items())
    }

    pub fn service_options(&self) -> Vec<String> {
        self.list.facet_options("service")
    }

    pub async fn verify(&mut self, id: &str, action: VerifyAction, now: DateTime<Utc>) -> bool {
        match self.api.verify_emergency_unit(id, action).await {
            Ok(updated) => {
                self.list.replace(updated, now);
                info!(unit_id = %id, action = action.as_str(), "emergency unit verification updated");
                self.notifier.notify(Notification::success(format!(
                    "Emergency unit {} successfully",
                    action.past_tense()
                )));
                true
            }
            Err(e) => {
                let fallback = format!("Failed to {} emergency unit", action.as_str());
                report_failure(self.notifier.as_ref(), &e, &fallback);
                false
            }
        }
    }

    /// Flip availability for a cached unit.
    pub async fn toggle_availability(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let Some(current) = self.list.get(id).map(|u| u.availability_status) else {
            report_failure(
                self.notifier.as_ref(),
                &ApiError::NotFound {
                    kind: "emergency unit",
                    id: id.to_string(),
                },
                "Failed to update availability status",
            );
            return false;
        };
        let wanted = !current;
        match self.api.set_unit_availability(id, wanted).await {
            Ok(updated) => {
                let now_available = updated.availability_status;
                self.list.replace(updated, now);
                info!(unit_id = %id, available = now_available, "availability updated");
                self.notifier.notify(Notification::success(format!(
                    "Availability status updated to {}",
                    if now_available { "available" } else { "unavailable" }
                )));
                true
            }
            Err(e) => {
                report_failure(
                    self.notifier.as_ref(),
                    &e,
                    "Failed to update availability status",
                );
                false
            }
        }
    }

    pub async fn delete(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        match self.api.delete_emergency_unit(id).await {
            Ok(()) => {
                self.list.remove(id, now);
                info!(unit_id = %id, "emergency unit deleted");
                self.notifier
                    .notify(Notification::success("Emergency unit deleted successfully"));
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to delete emergency unit");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::fixtures::*;
    use dashboard_common::memory::Snapshot;

    fn snapshot() -> Snapshot {
        let mut rescue = unit("rescue-1", Role::EmergencyUnit, false, true, false);
        rescue.services_offered = vec!["rescue".to_string(), "fire".to_string()];
        Snapshot {
            emergency_units: vec![
                unit("amb-1", Role::EmergencyUnit, true, true, true),
                rescue,
                unit("amb-2", Role::EmergencyUnit, false, false, true),
                unit("nurse", Role::Freelancer, false, true, true),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn load_keeps_units_and_counts_them() {
        let (api, notifier) = backend(snapshot());
        let mut page = UnitsPage::new(api, notifier);
        assert!(page.load(now()).await);
        assert_eq!(page.list.items().len(), 3);
        assert_eq!(
            page.stats(),
            UnitStats {
                total: 3,
                verified: 1,
                available: 2,
                pending: 1
            }
        );
        assert_eq!(page.service_options(), vec!["ambulance", "fire", "rescue"]);
    }

    #[tokio::test]
    async fn verify_and_toggle_availability() {
        let (api, notifier) = backend(snapshot());
        let mut page = UnitsPage::new(api.clone(), notifier.clone());
        page.load(now()).await;

        assert!(page.verify("rescue-1", VerifyAction::Verify, now()).await);
        assert_eq!(page.stats().verified, 2);
        assert_eq!(page.stats().pending, 0);
        assert_eq!(
            notifier.last().map(|n| n.description),
            Some("Emergency unit verified successfully".to_string())
        );

        assert!(page.toggle_availability("rescue-1", now()).await);
        assert!(page.list.get("rescue-1").expect("cached").availability_status);
        assert_eq!(
            notifier.last().map(|n| n.description),
            Some("Availability status updated to available".to_string())
        );

        api.fail_next(ApiError::Unavailable("offline".to_string()));
        assert!(!page.toggle_availability("rescue-1", now()).await);
        assert!(page.list.get("rescue-1").expect("cached").availability_status);

        assert!(!page.toggle_availability("ghost", now()).await);

        page.list.query_mut().set_filter("availability", "unavailable");
        assert!(page.list.page(now()).items.is_empty());
    }
}
