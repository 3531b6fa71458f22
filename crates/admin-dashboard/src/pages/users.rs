use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use dashboard_common::api::DashboardApi;
use dashboard_common::model::{User, VerifyAction};
use dashboard_common::notify::{Notification, Notifier};

use super::{report_failure, ListPage};

pub struct UsersPage {
    api: Arc<dyn DashboardApi>,
    notifier: Arc<dyn Notifier>,
    pub list: ListPage<User>,
}

impl UsersPage {
    pub fn new(api: Arc<dyn DashboardApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            list: ListPage::new(),
        }
    }

    pub async fn load(&mut self, now: DateTime<Utc>) -> bool {
        match self.api.list_users().await {
            Ok(users) => {
                info!(count = users.len(), "users loaded");
                self.list.replace_all(users, now);
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to load users");
                false
            }
        }
    }

    /// Professionals with documents on file who still need a decision,
    /// most recent upload first.
    pub fn pending_verifications(&self) -> Vec<&User> {
        let mut pending: Vec<&User> = self
            .list
            .items()
            .iter()
            .filter(|u| u.awaiting_verification())
            .collect();
        pending.sort_by(|a, b| {
            b.documents_uploaded_at
                .cmp(&a.documents_uploaded_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        pending
    }

    pub async fn verify(&mut self, id: &str, action: VerifyAction, now: DateTime<Utc>) -> bool {
        match self.api.verify_user(id, action).await {
            Ok(updated) => {
                if !self.list.replace(updated, now) {
                    let verified = action == VerifyAction::Verify;
                    self.list.update(id, now, |u| {
                        u.is_verified = verified;
                        u.is_approved_by_admin = verified;
                    });
                }
                info!(user_id = %id, action = action.as_str(), "user verification updated");
                self.notifier.notify(Notification::success(format!(
                    "User {} successfully",
                    action.past_tense()
                )));
                true
            }
            Err(e) => {
                let fallback = format!("Failed to {} user", action.as_str());
                report_failure(self.notifier.as_ref(), &e, &fallback);
                false
            }
        }
    }

    pub async fn delete(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        match self.api.delete_user(id).await {
            Ok(()) => {
                self.list.remove(id, now);
                info!(user_id = %id, "user deleted");
                self.notifier
                    .notify(Notification::success("User deleted successfully"));
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to delete user");
                false
            }
        }
    }
}
