use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use list_query::{ItemsPerPage, QueryState};

use crate::error::AppError;

/// Which list page the binary renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Users,
    Emergencies,
    Units,
    Guides,
    Alerts,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::Users => "users",
            View::Emergencies => "emergencies",
            View::Units => "units",
            View::Guides => "guides",
            View::Alerts => "alerts",
        }
    }
}

impl FromStr for View {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "users" => Ok(View::Users),
            "emergencies" => Ok(View::Emergencies),
            "units" | "emergency-units" => Ok(View::Units),
            "guides" | "first-aid" => Ok(View::Guides),
            "alerts" | "health-alerts" => Ok(View::Alerts),
            other => Err(AppError::Config(format!(
                "unknown view '{other}' (expected users, emergencies, units, guides or alerts)"
            ))),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON snapshot the in-memory backend is seeded from.
    pub snapshot_path: PathBuf,
    pub view: View,
    /// Tab, search, filters and page size. The page number is applied
    /// separately once the collection is loaded.
    pub query: QueryState,
    pub page: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DASHBOARD_SNAPSHOT_PATH`: JSON snapshot file
    ///
    /// Optional:
    /// - `DASHBOARD_VIEW`: users | emergencies | units | guides | alerts (default guides)
    /// - `DASHBOARD_TAB`, `DASHBOARD_SEARCH`
    /// - `DASHBOARD_FILTERS`: `name=value,name=value`
    /// - `DASHBOARD_PAGE` (default 1), `DASHBOARD_PER_PAGE` (5, 10, 25, 50 or 100)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let snapshot_path = lookup("DASHBOARD_SNAPSHOT_PATH").map(PathBuf::from).ok_or_else(|| {
            AppError::Config("DASHBOARD_SNAPSHOT_PATH environment variable is required".to_string())
        })?;
        if !snapshot_path.exists() {
            return Err(AppError::Config(format!(
                "snapshot not found at {}",
                snapshot_path.display()
            )));
        }

        let view = match lookup("DASHBOARD_VIEW") {
            Some(raw) => raw.parse()?,
            None => View::Guides,
        };

        let mut query = QueryState::new();
        if let Some(per_page) = lookup("DASHBOARD_PER_PAGE") {
            let n = per_page.trim().parse::<usize>().map_err(|_| {
                AppError::Config(format!("DASHBOARD_PER_PAGE is not a number: {per_page}"))
            })?;
            let per_page =
                ItemsPerPage::try_from(n).map_err(|e| AppError::Config(e.to_string()))?;
            query.set_items_per_page(per_page);
        }
        if let Some(tab) = lookup("DASHBOARD_TAB") {
            query.set_tab(tab.trim());
        }
        if let Some(search) = lookup("DASHBOARD_SEARCH") {
            query.set_search(search);
        }
        if let Some(filters) = lookup("DASHBOARD_FILTERS") {
            for (name, value) in parse_filters(&filters)? {
                query.set_filter(name, value);
            }
        }

        let page = match lookup("DASHBOARD_PAGE") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| AppError::Config(format!("DASHBOARD_PAGE is not a number: {raw}")))?,
            None => 1,
        };

        Ok(Self {
            snapshot_path,
            view,
            query,
            page,
        })
    }
}

fn parse_filters(raw: &str) -> Result<Vec<(&str, &str)>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            pair.split_once('=')
                .map(|(name, value)| (name.trim(), value.trim()))
                .filter(|(name, _)| !name.is_empty())
                .ok_or_else(|| {
                    AppError::Config(format!("DASHBOARD_FILTERS entry '{pair}' is not name=value"))
                })
        })
        .collect()
}
