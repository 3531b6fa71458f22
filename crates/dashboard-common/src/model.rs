use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// --- Guide registries ---

/// First-aid guide category. Closed set; anything else is rejected at the
/// validation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GuideCategory {
    #[serde(rename = "CPR")]
    Cpr,
    Burns,
    Bleeding,
    Choking,
    Fractures,
    Poisoning,
    Shock,
}

impl GuideCategory {
    pub const ALL: [GuideCategory; 7] = [
        GuideCategory::Cpr,
        GuideCategory::Burns,
        GuideCategory::Bleeding,
        GuideCategory::Choking,
        GuideCategory::Fractures,
        GuideCategory::Poisoning,
        GuideCategory::Shock,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GuideCategory::Cpr => "CPR",
            GuideCategory::Burns => "Burns",
            GuideCategory::Bleeding => "Bleeding",
            GuideCategory::Choking => "Choking",
            GuideCategory::Fractures => "Fractures",
            GuideCategory::Poisoning => "Poisoning",
            GuideCategory::Shock => "Shock",
        }
    }
}

impl FromStr for GuideCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        GuideCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for GuideCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Es, Language::Fr, Language::De];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
        }
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownLanguage(s.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Display metadata for a severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityMeta {
    pub label: &'static str,
    /// Higher sorts first.
    pub priority: u8,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Severe,
    Moderate,
    Minor,
}

static SEVERITY_TABLE: [(Severity, SeverityMeta); 4] = [
    (
        Severity::Critical,
        SeverityMeta { label: "Critical", priority: 4, color: "bg-red-100 text-red-800" },
    ),
    (
        Severity::Severe,
        SeverityMeta { label: "Severe", priority: 3, color: "bg-orange-100 text-orange-800" },
    ),
    (
        Severity::Moderate,
        SeverityMeta { label: "Moderate", priority: 2, color: "bg-yellow-100 text-yellow-800" },
    ),
    (
        Severity::Minor,
        SeverityMeta { label: "Minor", priority: 1, color: "bg-blue-100 text-blue-800" },
    ),
];

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Severe,
        Severity::Moderate,
        Severity::Minor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Severe => "severe",
            Severity::Moderate => "moderate",
            Severity::Minor => "minor",
        }
    }

    pub fn meta(self) -> &'static SeverityMeta {
        SEVERITY_TABLE
            .iter()
            .find(|(s, _)| *s == self)
            .map(|(_, meta)| meta)
            .unwrap_or(&SEVERITY_TABLE[SEVERITY_TABLE.len() - 1].1)
    }

    pub fn priority(self) -> u8 {
        self.meta().priority
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::UnknownSeverity(s.to_string()))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Records ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Freelancer,
    EmergencyUnit,
    Admin,
    #[serde(other)]
    Other,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Freelancer => "freelancer",
            Role::EmergencyUnit => "emergency_unit",
            Role::Admin => "admin",
            Role::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_approved_by_admin: bool,
    #[serde(default)]
    pub has_uploaded_documents: bool,
    pub documents_uploaded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub location: Option<Location>,
    #[serde(default)]
    pub services_offered: Vec<String>,
}

impl User {
    pub fn is_professional(&self) -> bool {
        matches!(self.role, Role::Freelancer | Role::EmergencyUnit)
    }

    /// Professional with documents on file who has not been verified yet.
    pub fn awaiting_verification(&self) -> bool {
        self.is_professional() && self.has_uploaded_documents && !self.is_verified
    }

    /// Verification labels this user carries; the "status" filter matches
    /// when the selected label is among them.
    pub fn status_labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::with_capacity(3);
        if self.is_verified {
            labels.push("verified");
        } else if self.has_uploaded_documents {
            labels.push("pending");
        }
        labels.push(if self.is_approved_by_admin { "approved" } else { "unapproved" });
        labels.push(if self.has_uploaded_documents {
            "documents_uploaded"
        } else {
            "no_documents"
        });
        labels
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyStatus {
    Active,
    Accepted,
    Resolved,
    Rejected,
    #[serde(other)]
    Other,
}

impl EmergencyStatus {
    pub const KNOWN: [EmergencyStatus; 4] = [
        EmergencyStatus::Active,
        EmergencyStatus::Accepted,
        EmergencyStatus::Resolved,
        EmergencyStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmergencyStatus::Active => "active",
            EmergencyStatus::Accepted => "accepted",
            EmergencyStatus::Resolved => "resolved",
            EmergencyStatus::Rejected => "rejected",
            EmergencyStatus::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emergency {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: Option<String>,
    pub emergency_type: String,
    pub description: Option<String>,
    pub location: Option<Location>,
    pub status: EmergencyStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyUnit {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_approved_by_admin: bool,
    #[serde(default)]
    pub has_uploaded_documents: bool,
    #[serde(default)]
    pub availability_status: bool,
    pub location: Option<Location>,
    #[serde(default)]
    pub services_offered: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl EmergencyUnit {
    pub fn is_fully_verified(&self) -> bool {
        self.is_verified && self.is_approved_by_admin
    }

    pub fn is_pending(&self) -> bool {
        self.has_uploaded_documents && !self.is_verified
    }

    pub fn status_labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::with_capacity(2);
        if self.is_fully_verified() {
            labels.push("verified");
        }
        if self.is_pending() {
            labels.push("pending");
        }
        if !self.is_verified {
            labels.push("unverified");
        }
        labels
    }
}

/// Headline counts for the emergency-units page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnitStats {
    pub total: usize,
    pub verified: usize,
    pub available: usize,
    pub pending: usize,
}

impl UnitStats {
    pub fn from_units(units: &[EmergencyUnit]) -> Self {
        Self {
            total: units.len(),
            verified: units.iter().filter(|u| u.is_fully_verified()).count(),
            available: units.iter().filter(|u| u.availability_status).count(),
            pending: units.iter().filter(|u| u.is_pending()).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guide {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub category: GuideCategory,
    #[serde(default)]
    pub language: Language,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    pub content: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub view_count: u64,
}

/// Full field set sent on guide create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideDraft {
    pub title: String,
    pub category: GuideCategory,
    pub language: Language,
    pub severity: Severity,
    pub description: String,
    pub content: String,
}

/// Server-side filters accepted by the guide list endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GuideFilterParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<GuideCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl GuideFilterParams {
    pub fn matches(&self, guide: &Guide) -> bool {
        self.category.map_or(true, |c| c == guide.category)
            && self.language.map_or(true, |l| l == guide.language)
            && self.severity.map_or(true, |s| s == guide.severity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyAction {
    Verify,
    Reject,
}

impl VerifyAction {
    pub fn as_str(self) -> &'static str {
        match self {
            VerifyAction::Verify => "verify",
            VerifyAction::Reject => "reject",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            VerifyAction::Verify => "verified",
            VerifyAction::Reject => "rejected",
        }
    }
}

// --- Health alerts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        }
    }

    /// Severity inferred from the alert's free-text description.
    pub fn from_description(description: &str) -> Self {
        let lower = description.to_lowercase();
        if ["urgent", "severe", "critical"].iter().any(|w| lower.contains(w)) {
            AlertSeverity::High
        } else if ["moderate", "concern"].iter().any(|w| lower.contains(w)) {
            AlertSeverity::Medium
        } else {
            AlertSeverity::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAlert {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: Option<String>,
    pub description: String,
    #[serde(default)]
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl HealthAlert {
    pub fn severity(&self) -> AlertSeverity {
        AlertSeverity::from_description(&self.description)
    }
}

/// UTC hours at which the backend health scan runs.
pub const SCAN_HOURS_UTC: [u32; 4] = [0, 6, 12, 18];
pub const DEFAULT_SCAN_CRON: &str = "0 */6 * * *";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSchedule {
    pub is_running: bool,
    pub next_run: Option<DateTime<Utc>>,
    pub schedule: String,
    pub timezone: String,
}

impl ScanSchedule {
    /// Status assumed when the backend cannot report one.
    pub fn fallback(now: DateTime<Utc>) -> Self {
        Self {
            is_running: true,
            next_run: Some(next_scan_run(now)),
            schedule: DEFAULT_SCAN_CRON.to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

/// The first scan slot strictly after `now`, rolling over to midnight of the
/// next day after the 18:00 run.
pub fn next_scan_run(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    for hour in SCAN_HOURS_UTC {
        let Some(time) = NaiveTime::from_hms_opt(hour, 0, 0) else {
            continue;
        };
        let slot = today.and_time(time).and_utc();
        if slot > now {
            return slot;
        }
    }
    (today + Duration::days(1)).and_time(NaiveTime::default()).and_utc()
}
