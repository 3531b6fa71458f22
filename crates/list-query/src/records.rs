//! List contracts for each dashboard collection.
use chrono::{DateTime, Duration, Utc};

use dashboard_common::model::{Emergency, EmergencyUnit, Guide, HealthAlert, User};

use crate::engine::{FacetValue, Listable};

/// Window for the guides "recent" tab.
pub const RECENT_WINDOW_DAYS: i64 = 7;

impl Listable for User {
    const TABS: &'static [&'static str] = &["all", "pending"];

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        match self.documents_uploaded_at {
            Some(uploaded) if self.awaiting_verification() => uploaded,
            _ => self.created_at,
        }
    }

    /// Professionals waiting on verification come first.
    fn priority(&self) -> i64 {
        i64::from(self.awaiting_verification())
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.name, &self.email]
    }

    fn facet(&self, name: &str) -> Option<FacetValue<'_>> {
        match name {
            "role" => Some(FacetValue::One(self.role.as_str())),
            "status" => Some(FacetValue::Many(self.status_labels())),
            _ => None,
        }
    }

    fn in_tab(&self, tab: &str, _now: DateTime<Utc>) -> bool {
        match tab {
            "pending" => self.awaiting_verification(),
            _ => true,
        }
    }
}

impl Listable for Emergency {
    const TABS: &'static [&'static str] = &["all", "active", "accepted", "resolved", "rejected"];

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.emergency_type.as_str()];
        fields.extend(self.description.as_deref());
        fields.extend(self.location.as_ref().and_then(|l| l.address.as_deref()));
        fields
    }

    fn facet(&self, name: &str) -> Option<FacetValue<'_>> {
        match name {
            "status" => Some(FacetValue::One(self.status.as_str())),
            "type" => Some(FacetValue::One(&self.emergency_type)),
            _ => None,
        }
    }

    fn in_tab(&self, tab: &str, _now: DateTime<Utc>) -> bool {
        self.status.as_str() == tab
    }
}

impl Listable for EmergencyUnit {
    const TABS: &'static [&'static str] = &["all", "verified", "pending", "available"];

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.email.as_str()];
        fields.extend(self.location.as_ref().and_then(|l| l.city.as_deref()));
        fields.extend(self.services_offered.iter().map(String::as_str));
        fields
    }

    fn facet(&self, name: &str) -> Option<FacetValue<'_>> {
        match name {
            "status" => Some(FacetValue::Many(self.status_labels())),
            "service" => Some(FacetValue::Many(
                self.services_offered.iter().map(String::as_str).collect(),
            )),
            "availability" => Some(FacetValue::One(if self.availability_status {
                "available"
            } else {
                "unavailable"
            })),
            _ => None,
        }
    }

    fn in_tab(&self, tab: &str, _now: DateTime<Utc>) -> bool {
        match tab {
            "verified" => self.is_fully_verified(),
            "pending" => self.is_pending(),
            "available" => self.availability_status,
            _ => true,
        }
    }
}

impl Listable for Guide {
    const TABS: &'static [&'static str] = &["all", "recent", "popular"];

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn priority(&self) -> i64 {
        i64::from(self.severity.priority())
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.title.as_str(),
            self.category.as_str(),
            self.description.as_str(),
            self.content.as_str(),
        ]
    }

    fn facet(&self, name: &str) -> Option<FacetValue<'_>> {
        match name {
            "category" => Some(FacetValue::One(self.category.as_str())),
            "language" => Some(FacetValue::One(self.language.code())),
            "severity" => Some(FacetValue::One(self.severity.as_str())),
            _ => None,
        }
    }

    fn in_tab(&self, tab: &str, now: DateTime<Utc>) -> bool {
        match tab {
            "recent" => now.signed_duration_since(self.updated_at) <= Duration::days(RECENT_WINDOW_DAYS),
            "popular" => self.view_count > 0,
            _ => true,
        }
    }
}

impl Listable for HealthAlert {
    const TABS: &'static [&'static str] = &["all", "active", "resolved"];

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.description]
    }

    fn facet(&self, name: &str) -> Option<FacetValue<'_>> {
        match name {
            "severity" => Some(FacetValue::One(self.severity().as_str())),
            _ => None,
        }
    }

    fn in_tab(&self, tab: &str, _now: DateTime<Utc>) -> bool {
        match tab {
            "active" => !self.resolved,
            "resolved" => self.resolved,
            _ => true,
        }
    }
}
