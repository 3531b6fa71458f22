//! Fixed callout snippets that can be dropped into guide content.
//!
//! The markup is static and inserted as trusted HTML, so nothing here may ever
//! be built from user input.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKey {
    EmergencyStep,
    WarningBox,
    InfoBox,
    SuccessBox,
}

/// Display metadata plus the HTML fragment for one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub key: TemplateKey,
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub html: &'static str,
}

static TEMPLATES: [Template; 4] = [
    Template {
        key: TemplateKey::EmergencyStep,
        name: "Emergency Step",
        icon: "🚨",
        color: "bg-red-100 text-red-800",
        html: concat!(
            r#"<div style="background: linear-gradient(135deg, #fef2f2 0%, #fee2e2 100%); border: 2px solid #fca5a5; border-radius: 12px; padding: 1.5rem; margin: 1.5rem 0; box-shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1);">"#,
            r#"<h4 style="color: #dc2626; margin: 0 0 0.75rem 0; font-size: 1.1em; font-weight: 600;">🚨 Emergency Step</h4>"#,
            r#"<p style="margin: 0; color: #7f1d1d;">Enter critical emergency action here...</p>"#,
            "</div>"
        ),
    },
    Template {
        key: TemplateKey::WarningBox,
        name: "Warning",
        icon: "⚠️",
        color: "bg-orange-100 text-orange-800",
        html: concat!(
            r#"<div style="background: linear-gradient(135deg, #fffbeb 0%, #fef3c7 100%); border: 2px solid #fbbf24; border-radius: 12px; padding: 1.5rem; margin: 1.5rem 0; box-shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1);">"#,
            r#"<h4 style="color: #d97706; margin: 0 0 0.75rem 0; font-size: 1.1em; font-weight: 600;">⚠️ Warning</h4>"#,
            r#"<p style="margin: 0; color: #92400e;">Enter important warning information here...</p>"#,
            "</div>"
        ),
    },
    Template {
        key: TemplateKey::InfoBox,
        name: "Information",
        icon: "ℹ️",
        color: "bg-blue-100 text-blue-800",
        html: concat!(
            r#"<div style="background: linear-gradient(135deg, #eff6ff 0%, #dbeafe 100%); border: 2px solid #60a5fa; border-radius: 12px; padding: 1.5rem; margin: 1.5rem 0; box-shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1);">"#,
            r#"<h4 style="color: #2563eb; margin: 0 0 0.75rem 0; font-size: 1.1em; font-weight: 600;">ℹ️ Information</h4>"#,
            r#"<p style="margin: 0; color: #1e40af;">Enter helpful information here...</p>"#,
            "</div>"
        ),
    },
    Template {
        key: TemplateKey::SuccessBox,
        name: "Success",
        icon: "✅",
        color: "bg-green-100 text-green-800",
        html: concat!(
            r#"<div style="background: linear-gradient(135deg, #f0fdf4 0%, #dcfce7 100%); border: 2px solid #4ade80; border-radius: 12px; padding: 1.5rem; margin: 1.5rem 0; box-shadow: 0 4px 6px -1px rgba(0, 0, 0, 0.1);">"#,
            r#"<h4 style="color: #16a34a; margin: 0 0 0.75rem 0; font-size: 1.1em; font-weight: 600;">✅ Success</h4>"#,
            r#"<p style="margin: 0; color: #15803d;">Enter success criteria or positive outcome here...</p>"#,
            "</div>"
        ),
    },
];

impl TemplateKey {
    pub const ALL: [TemplateKey; 4] = [
        TemplateKey::EmergencyStep,
        TemplateKey::WarningBox,
        TemplateKey::InfoBox,
        TemplateKey::SuccessBox,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TemplateKey::EmergencyStep => "emergency-step",
            TemplateKey::WarningBox => "warning-box",
            TemplateKey::InfoBox => "info-box",
            TemplateKey::SuccessBox => "success-box",
        }
    }

    /// `None` for keys outside the registry.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }

    pub fn template(self) -> &'static Template {
        match self {
            TemplateKey::EmergencyStep => &TEMPLATES[0],
            TemplateKey::WarningBox => &TEMPLATES[1],
            TemplateKey::InfoBox => &TEMPLATES[2],
            TemplateKey::SuccessBox => &TEMPLATES[3],
        }
    }

    pub fn html(self) -> &'static str {
        self.template().html
    }
}

impl FromStr for TemplateKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| format!("unknown template: {s}"))
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every template, in toolbar order.
pub fn all_templates() -> &'static [Template] {
    &TEMPLATES
}
