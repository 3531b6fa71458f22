use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use dashboard_common::api::DashboardApi;
use dashboard_common::error::{ApiResult, ValidationError};
use dashboard_common::model::{Guide, GuideFilterParams};
use dashboard_common::notify::{Notification, Notifier};
use guide_editor::{DialogMode, EditorConfig, GuideDialog, SubmitTicket};

use super::{report_failure, ListPage};

pub struct GuidesPage {
    api: Arc<dyn DashboardApi>,
    notifier: Arc<dyn Notifier>,
    editor_config: EditorConfig,
    params: GuideFilterParams,
    dialog: Option<GuideDialog>,
    pub list: ListPage<Guide>,
}

impl GuidesPage {
    pub fn new(
        api: Arc<dyn DashboardApi>,
        notifier: Arc<dyn Notifier>,
        editor_config: EditorConfig,
    ) -> Self {
        Self {
            api,
            notifier,
            editor_config,
            params: GuideFilterParams::default(),
            dialog: None,
            list: ListPage::new(),
        }
    }

    pub async fn load(&mut self, now: DateTime<Utc>) -> bool {
        match self.api.list_guides(self.params).await {
            Ok(guides) => {
                info!(count = guides.len(), "guides loaded");
                self.list.replace_all(guides, now);
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to load guides");
                false
            }
        }
    }

    pub fn server_params(&self) -> GuideFilterParams {
        self.params
    }

    /// Change the server-side category/language/severity filter and refetch.
    pub async fn set_server_params(
        &mut self,
        params: GuideFilterParams,
        now: DateTime<Utc>,
    ) -> bool {
        self.params = params;
        self.list.query_mut().first_page();
        self.load(now).await
    }

    pub fn dialog(&self) -> Option<&GuideDialog> {
        self.dialog.as_ref()
    }

    pub fn dialog_mut(&mut self) -> Option<&mut GuideDialog> {
        self.dialog.as_mut()
    }

    /// Open an empty create dialog, replacing any open one.
    pub fn open_create(&mut self) -> &mut GuideDialog {
        self.close_dialog();
        self.dialog.insert(GuideDialog::create(self.editor_config.clone()))
    }

    /// Open the edit dialog for a cached guide.
    pub fn open_edit(&mut self, id: &str) -> Option<&mut GuideDialog> {
        let dialog = GuideDialog::edit(self.list.get(id)?, self.editor_config.clone());
        self.close_dialog();
        Some(self.dialog.insert(dialog))
    }

    pub fn close_dialog(&mut self) {
        if let Some(mut dialog) = self.dialog.take() {
            dialog.close();
        }
    }

    /// Validate the open dialog. Validation failures are reported here and
    /// no ticket is issued.
    pub fn begin_submit(&mut self) -> Option<SubmitTicket> {
        let dialog = self.dialog.as_mut()?;
        match dialog.begin_submit() {
            Ok(ticket) => Some(ticket),
            Err(e) => {
                debug!(error = %e, "guide form rejected");
                self.notifier
                    .notify(Notification::validation(validation_message(&e)));
                None
            }
        }
    }

    /// Send a validated ticket to the backend. Touches no local state, so the
    /// result must go through `finish_submit`.
    pub async fn send(&self, ticket: &SubmitTicket) -> ApiResult<Guide> {
        match &ticket.mode {
            DialogMode::Create => self.api.create_guide(&ticket.draft).await,
            DialogMode::Edit { guide_id } => self.api.update_guide(guide_id, &ticket.draft).await,
        }
    }

    /// Apply a completion. Ignored (returns false) when the dialog that issued
    /// the ticket has closed or been replaced.
    pub fn finish_submit(
        &mut self,
        ticket: &SubmitTicket,
        result: ApiResult<Guide>,
        now: DateTime<Utc>,
    ) -> bool {
        let accepted = self.dialog.as_ref().is_some_and(|d| d.accepts(ticket));
        if !accepted {
            debug!(dialog_id = ticket.dialog_id(), "ignoring completion for closed dialog");
            return false;
        }

        let creating = ticket.mode == DialogMode::Create;
        match result {
            Ok(guide) => {
                info!(guide_id = %guide.id, creating, "guide saved");
                if creating {
                    self.list.prepend(guide);
                } else {
                    self.list.replace(guide, now);
                }
                self.close_dialog();
                self.notifier.notify(Notification::success(if creating {
                    "First aid guide created successfully"
                } else {
                    "First aid guide updated successfully"
                }));
                true
            }
            Err(e) => {
                let fallback = if creating {
                    "Failed to create guide"
                } else {
                    "Failed to update guide"
                };
                report_failure(self.notifier.as_ref(), &e, fallback);
                if let Some(dialog) = self.dialog.as_mut() {
                    dialog.submit_failed();
                }
                false
            }
        }
    }

    /// Validate, send and apply in one go.
    pub async fn submit(&mut self, now: DateTime<Utc>) -> bool {
        let Some(ticket) = self.begin_submit() else {
            return false;
        };
        let result = self.send(&ticket).await;
        self.finish_submit(&ticket, result, now)
    }

    pub async fn delete(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        match self.api.delete_guide(id).await {
            Ok(()) => {
                self.list.remove(id, now);
                info!(guide_id = %id, "guide deleted");
                self.notifier
                    .notify(Notification::success("First aid guide deleted successfully"));
                true
            }
            Err(e) => {
                report_failure(self.notifier.as_ref(), &e, "Failed to delete guide");
                false
            }
        }
    }
}

fn validation_message(err: &ValidationError) -> String {
    match err {
        ValidationError::MissingField(_) => "Please fill in all required fields".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::fixtures::*;
    use dashboard_common::error::ApiError;
    use dashboard_common::memory::Snapshot;
    use dashboard_common::model::{GuideCategory, Severity};
    use dashboard_common::notify::NotificationKind;
    use guide_editor::HtmlSurface;

    fn snapshot() -> Snapshot {
        Snapshot {
            guides: vec![
                guide("g1", GuideCategory::Burns, Severity::Moderate),
                guide("g2", GuideCategory::Cpr, Severity::Critical),
                guide("g3", GuideCategory::Burns, Severity::Minor),
            ],
            ..Default::default()
        }
    }

    fn fill(dialog: &mut GuideDialog, title: &str) {
        dialog.form.title = title.to_string();
        dialog.form.category = "Choking".to_string();
        dialog.form.severity = "severe".to_string();
        let surface = HtmlSurface::new();
        dialog.editor().initialize(&surface, "");
        surface.type_html("<p>Five back blows</p>");
    }

    #[tokio::test]
    async fn create_prepends_and_closes_dialog() {
        let (api, notifier) = backend(snapshot());
        let mut page = GuidesPage::new(api.clone(), notifier.clone(), EditorConfig::default());
        assert!(page.load(now()).await);
        assert_eq!(page.list.page(now()).ids(), vec!["g2", "g1", "g3"]);

        fill(page.open_create(), "Choking adult");
        assert!(page.submit(now()).await);
        assert!(page.dialog().is_none());
        assert_eq!(page.list.items()[0].title, "Choking adult");
        assert_eq!(page.list.items().len(), 4);
        assert_eq!(
            notifier.last().map(|n| n.description),
            Some("First aid guide created successfully".to_string())
        );
        assert_eq!(api.snapshot().await.guides.len(), 4);
    }

    #[tokio::test]
    async fn edit_replaces_in_place() {
        let (api, notifier) = backend(snapshot());
        let mut page = GuidesPage::new(api, notifier, EditorConfig::default());
        page.load(now()).await;

        let dialog = page.open_edit("g3").expect("cached guide");
        assert_eq!(dialog.form.category, "Burns");
        dialog.form.title = "Minor burns".to_string();
        assert!(page.submit(now()).await);
        assert_eq!(page.list.items()[2].title, "Minor burns");
        assert_eq!(page.list.items().len(), 3);
        assert!(page.open_edit("missing").is_none());
    }

    #[tokio::test]
    async fn validation_failure_sends_nothing() {
        let (api, notifier) = backend(snapshot());
        let mut page = GuidesPage::new(api.clone(), notifier.clone(), EditorConfig::default());
        page.load(now()).await;

        page.open_create().form.title = "No content yet".to_string();
        assert!(!page.submit(now()).await);
        let last = notifier.last().expect("notified");
        assert_eq!(last.kind, NotificationKind::Validation);
        assert_eq!(last.description, "Please fill in all required fields");
        assert!(page.dialog().is_some_and(|d| d.is_open() && !d.is_submitting()));
        assert_eq!(api.snapshot().await.guides.len(), 3);

        let dialog = page.dialog_mut().expect("open");
        fill(dialog, "Bad severity");
        dialog.form.severity = "extreme".to_string();
        assert!(!page.submit(now()).await);
        assert_eq!(
            notifier.last().map(|n| n.description),
            Some("unknown severity: extreme".to_string())
        );
    }

    #[tokio::test]
    async fn completion_for_closed_dialog_is_ignored() {
        let (api, notifier) = backend(snapshot());
        let mut page = GuidesPage::new(api.clone(), notifier.clone(), EditorConfig::default());
        page.load(now()).await;

        fill(page.open_create(), "Slow request");
        let ticket = page.begin_submit().expect("valid form");
        page.close_dialog();
        page.open_create();

        let result = page.send(&ticket).await;
        assert!(result.is_ok());
        assert!(!page.finish_submit(&ticket, result, now()));
        assert_eq!(page.list.items().len(), 3);
        assert!(page.dialog().is_some_and(|d| d.is_open()));
        assert!(notifier.take().is_empty());
    }

    #[tokio::test]
    async fn server_error_keeps_dialog_open() {
        let (api, notifier) = backend(snapshot());
        let mut page = GuidesPage::new(api.clone(), notifier.clone(), EditorConfig::default());
        page.load(now()).await;

        fill(page.open_create(), "Retry me");
        api.fail_next(ApiError::Upstream {
            status: 400,
            message: "Title already exists".to_string(),
        });
        assert!(!page.submit(now()).await);
        assert_eq!(
            notifier.last().map(|n| n.description),
            Some("Title already exists".to_string())
        );
        assert!(page.dialog().is_some_and(|d| d.is_open() && !d.is_submitting()));
        assert!(page.submit(now()).await);
    }

    #[tokio::test]
    async fn server_filter_and_delete() {
        let (api, notifier) = backend(snapshot());
        let mut page = GuidesPage::new(api, notifier.clone(), EditorConfig::default());
        let burns = GuideFilterParams {
            category: Some(GuideCategory::Burns),
            ..Default::default()
        };
        assert!(page.set_server_params(burns, now()).await);
        assert_eq!(page.list.items().len(), 2);
        assert_eq!(page.server_params(), burns);

        assert!(page.delete("g1", now()).await);
        assert_eq!(page.list.items().len(), 1);
        assert!(!page.delete("g1", now()).await);
        assert_eq!(
            notifier.last().map(|n| n.description),
            Some("guide not found".to_string())
        );
    }
}
