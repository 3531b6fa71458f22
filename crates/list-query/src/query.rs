use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tab or filter value meaning "no constraint".
pub const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("items per page must be one of 5, 10, 25, 50, 100 (got {0})")]
    InvalidPageSize(usize),
}

/// Page size restricted to the sizes the list views offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct ItemsPerPage(usize);

impl ItemsPerPage {
    pub const ALLOWED: [usize; 5] = [5, 10, 25, 50, 100];

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for ItemsPerPage {
    fn default() -> Self {
        Self(10)
    }
}

impl TryFrom<usize> for ItemsPerPage {
    type Error = QueryError;

    fn try_from(n: usize) -> Result<Self, Self::Error> {
        if Self::ALLOWED.contains(&n) {
            Ok(Self(n))
        } else {
            Err(QueryError::InvalidPageSize(n))
        }
    }
}

impl From<ItemsPerPage> for usize {
    fn from(value: ItemsPerPage) -> Self {
        value.0
    }
}

impl fmt::Display for ItemsPerPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything that drives one list view: tab, search, categorical filters and
/// the pagination cursor.
///
/// Fields are private so every narrowing write goes through a method that
/// puts `current_page` back to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawQueryState")]
pub struct QueryState {
    active_tab: String,
    search_term: String,
    filters: BTreeMap<String, String>,
    current_page: usize,
    items_per_page: ItemsPerPage,
}

/// Wire shape of `QueryState`, normalized on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawQueryState {
    active_tab: String,
    search_term: String,
    filters: BTreeMap<String, String>,
    current_page: usize,
    items_per_page: ItemsPerPage,
}

impl Default for RawQueryState {
    fn default() -> Self {
        let state = QueryState::default();
        Self {
            active_tab: state.active_tab,
            search_term: state.search_term,
            filters: state.filters,
            current_page: state.current_page,
            items_per_page: state.items_per_page,
        }
    }
}

impl From<RawQueryState> for QueryState {
    fn from(mut raw: RawQueryState) -> Self {
        raw.filters.retain(|_, value| value != ALL);
        Self {
            active_tab: raw.active_tab,
            search_term: raw.search_term,
            filters: raw.filters,
            current_page: raw.current_page.max(1),
            items_per_page: raw.items_per_page,
        }
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            active_tab: ALL.to_string(),
            search_term: String::new(),
            filters: BTreeMap::new(),
            current_page: 1,
            items_per_page: ItemsPerPage::default(),
        }
    }
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tab(&self) -> &str {
        &self.active_tab
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Active filters only; "all" selections are never stored.
    pub fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn filter(&self, name: &str) -> &str {
        self.filters.get(name).map(String::as_str).unwrap_or(ALL)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> ItemsPerPage {
        self.items_per_page
    }

    pub fn set_tab(&mut self, tab: impl Into<String>) {
        self.active_tab = tab.into();
        self.current_page = 1;
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.current_page = 1;
    }

    /// Selecting "all" removes the filter.
    pub fn set_filter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if value == ALL {
            self.filters.remove(&name);
        } else {
            self.filters.insert(name, value);
        }
        self.current_page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.current_page = 1;
    }

    pub fn set_items_per_page(&mut self, per_page: ItemsPerPage) {
        self.items_per_page = per_page;
        self.current_page = 1;
    }

    pub fn go_to_page(&mut self, page: usize, total_pages: usize) {
        self.current_page = page.clamp(1, total_pages.max(1));
    }

    pub fn first_page(&mut self) {
        self.current_page = 1;
    }

    pub fn last_page(&mut self, total_pages: usize) {
        self.current_page = total_pages.max(1);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        self.go_to_page(self.current_page.saturating_add(1), total_pages);
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.saturating_sub(1).max(1);
    }

    /// Pull the cursor back inside `[1, total_pages]` after the collection
    /// itself shrank (for example after a delete).
    pub fn clamp_to(&mut self, total_pages: usize) {
        self.go_to_page(self.current_page, total_pages);
    }
}
