use std::time::Duration;

use tracing::warn;

pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_PLACEHOLDER: &str = "Write your emergency guide here...";

/// Editor behavior settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Save automatically once edits have been quiet for `autosave_interval`.
    pub autosave: bool,
    pub autosave_interval: Duration,
    pub placeholder: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave: false,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl EditorConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `GUIDE_AUTOSAVE`: `true`/`false` (default false)
    /// - `GUIDE_AUTOSAVE_INTERVAL_SECS`: debounce in seconds (default 30)
    /// - `GUIDE_EDITOR_PLACEHOLDER`: text shown in an empty editor
    ///
    /// Unparseable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let autosave = match lookup("GUIDE_AUTOSAVE").as_deref().map(str::trim) {
            None | Some("") => defaults.autosave,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(v) => {
                warn!(value = v, "GUIDE_AUTOSAVE is not a boolean, using default");
                defaults.autosave
            }
        };

        let autosave_interval = match lookup("GUIDE_AUTOSAVE_INTERVAL_SECS") {
            None => defaults.autosave_interval,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(value = %raw, "GUIDE_AUTOSAVE_INTERVAL_SECS is not a positive integer, using default");
                    defaults.autosave_interval
                }
            },
        };

        let placeholder = lookup("GUIDE_EDITOR_PLACEHOLDER")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(defaults.placeholder);

        Self {
            autosave,
            autosave_interval,
            placeholder,
        }
    }
}
