//! Create/edit dialog for a first-aid guide.
//!
//! Form fields arrive as raw strings and are only turned into a `GuideDraft`
//! by `begin_submit`, which rejects anything missing or outside the closed
//! registries before a request is made. Each dialog gets its own id and every
//! ticket carries it, so the host can drop completions for a dialog that has
//! since closed or been replaced.
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use dashboard_common::error::ValidationError;
use dashboard_common::model::{Guide, GuideCategory, GuideDraft, Language, Severity};

use crate::config::EditorConfig;
use crate::editor::GuideEditor;
use crate::engine::plain_text;

static DIALOG_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogMode {
    Create,
    Edit { guide_id: String },
}

/// Form fields as typed or selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideForm {
    pub title: String,
    pub category: String,
    pub language: String,
    pub severity: String,
    pub description: String,
}

impl Default for GuideForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            category: String::new(),
            language: Language::default().code().to_string(),
            severity: String::new(),
            description: String::new(),
        }
    }
}

impl GuideForm {
    fn from_guide(guide: &Guide) -> Self {
        Self {
            title: guide.title.clone(),
            category: guide.category.as_str().to_string(),
            language: guide.language.code().to_string(),
            severity: guide.severity.as_str().to_string(),
            description: guide.description.clone(),
        }
    }
}

/// A validated submission, tied to the dialog that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitTicket {
    dialog_id: u64,
    pub mode: DialogMode,
    pub draft: GuideDraft,
}

impl SubmitTicket {
    pub fn dialog_id(&self) -> u64 {
        self.dialog_id
    }
}

pub struct GuideDialog {
    id: u64,
    mode: DialogMode,
    pub form: GuideForm,
    editor: GuideEditor,
    open: bool,
    submitting: bool,
}

impl GuideDialog {
    pub fn create(config: EditorConfig) -> Self {
        Self::open(DialogMode::Create, GuideForm::default(), String::new(), config)
    }

    /// Pre-filled with the guide's fields and content.
    pub fn edit(guide: &Guide, config: EditorConfig) -> Self {
        Self::open(
            DialogMode::Edit {
                guide_id: guide.id.clone(),
            },
            GuideForm::from_guide(guide),
            guide.content.clone(),
            config,
        )
    }

    fn open(mode: DialogMode, form: GuideForm, content: String, config: EditorConfig) -> Self {
        let id = DIALOG_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
        let editor = GuideEditor::new(config);
        editor.sync_content(&content);
        debug!(dialog_id = id, mode = ?mode, "guide dialog opened");
        Self {
            id,
            mode,
            form,
            editor,
            open: true,
            submitting: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn mode(&self) -> &DialogMode {
        &self.mode
    }

    pub fn editor(&self) -> &GuideEditor {
        &self.editor
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Validate the form and editor content into a ticket. Nothing is sent
    /// when this fails.
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, ValidationError> {
        let draft = self.validate()?;
        self.submitting = true;
        Ok(SubmitTicket {
            dialog_id: self.id,
            mode: self.mode.clone(),
            draft,
        })
    }

    fn validate(&self) -> Result<GuideDraft, ValidationError> {
        let title = self.form.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if self.form.category.trim().is_empty() {
            return Err(ValidationError::MissingField("category"));
        }
        let category: GuideCategory = self.form.category.parse()?;

        let language = if self.form.language.trim().is_empty() {
            Language::default()
        } else {
            self.form.language.parse()?
        };

        if self.form.severity.trim().is_empty() {
            return Err(ValidationError::MissingField("severity"));
        }
        let severity: Severity = self.form.severity.parse()?;

        let content = self.editor.get_content();
        if plain_text(&content).trim().is_empty() {
            return Err(ValidationError::MissingField("content"));
        }

        Ok(GuideDraft {
            title: title.to_string(),
            category,
            language,
            severity,
            description: self.form.description.trim().to_string(),
            content,
        })
    }

    /// Whether a completion for `ticket` still belongs to this open dialog.
    pub fn accepts(&self, ticket: &SubmitTicket) -> bool {
        self.open && ticket.dialog_id == self.id
    }

    /// The request failed; the dialog stays open for another try.
    pub fn submit_failed(&mut self) {
        self.submitting = false;
    }

    pub fn close(&mut self) {
        if self.open {
            debug!(dialog_id = self.id, "guide dialog closed");
        }
        self.open = false;
        self.submitting = false;
        self.editor.close();
    }
}
