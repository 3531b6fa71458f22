//! List page controllers.
//!
//! Each page owns its cached collection plus a `QueryState`, talks to the
//! backend through `DashboardApi` and reports every outcome through a
//! `Notifier`. Local state only changes after the backend confirms.
pub mod emergencies;
pub mod guides;
pub mod health_alerts;
pub mod units;
pub mod users;

use chrono::{DateTime, Utc};
use tracing::warn;

use dashboard_common::error::ApiError;
use dashboard_common::notify::{Notification, Notifier};
use list_query::{facet_options, run_query, Listable, QueryPage, QueryState};

/// Cached collection plus the query that views it.
#[derive(Debug, Clone)]
pub struct ListPage<T> {
    items: Vec<T>,
    query: QueryState,
}

impl<T> Default for ListPage<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            query: QueryState::new(),
        }
    }
}

impl<T: Listable> ListPage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// Direct access for tab, search, filter and page-size changes.
    pub fn query_mut(&mut self) -> &mut QueryState {
        &mut self.query
    }

    pub fn page(&self, now: DateTime<Utc>) -> QueryPage<'_, T> {
        run_query(&self.items, &self.query, now)
    }

    pub fn total_pages(&self, now: DateTime<Utc>) -> usize {
        self.page(now).total_pages
    }

    pub fn go_to_page(&mut self, page: usize, now: DateTime<Utc>) {
        let total = self.total_pages(now);
        self.query.go_to_page(page, total);
    }

    pub fn next_page(&mut self, now: DateTime<Utc>) {
        let total = self.total_pages(now);
        self.query.next_page(total);
    }

    pub fn last_page(&mut self, now: DateTime<Utc>) {
        let total = self.total_pages(now);
        self.query.last_page(total);
    }

    pub fn facet_options(&self, name: &str) -> Vec<String> {
        facet_options(&self.items, name)
    }

    pub fn replace_all(&mut self, items: Vec<T>, now: DateTime<Utc>) {
        self.items = items;
        self.clamp(now);
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Swap in the server's copy of a record. Returns false when the record
    /// is no longer cached. The record may leave the current tab or filter,
    /// so the cursor is clamped afterwards.
    pub fn replace(&mut self, updated: T, now: DateTime<Utc>) -> bool {
        let Some(slot) = self.items.iter_mut().find(|item| item.id() == updated.id()) else {
            return false;
        };
        *slot = updated;
        self.clamp(now);
        true
    }

    pub fn update(&mut self, id: &str, now: DateTime<Utc>, apply: impl FnOnce(&mut T)) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id() == id) else {
            return false;
        };
        apply(item);
        self.clamp(now);
        true
    }

    pub fn prepend(&mut self, item: T) {
        self.items.insert(0, item);
    }

    pub fn remove(&mut self, id: &str, now: DateTime<Utc>) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        let removed = self.items.len() != before;
        if removed {
            self.clamp(now);
        }
        removed
    }

    /// Keep the cursor on a page that still exists.
    fn clamp(&mut self, now: DateTime<Utc>) {
        let total = self.total_pages(now);
        self.query.clamp_to(total);
    }
}

pub(crate) fn report_failure(notifier: &dyn Notifier, err: &ApiError, fallback: &str) {
    warn!(error = %err, "{fallback}");
    notifier.notify(Notification::error(err.user_message(fallback)));
}
