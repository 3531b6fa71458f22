pub mod config;
pub mod dialog;
pub mod editor;
pub mod engine;
pub mod templates;

pub use config::EditorConfig;
pub use dialog::{DialogMode, GuideDialog, GuideForm, SubmitTicket};
pub use editor::{EditorSnapshot, EditorStatus, GuideEditor, RenderTarget, SaveHandler, SaveOutcome};
pub use engine::{EngineError, EngineFactory, HtmlSurface, RichTextEngine};
pub use templates::TemplateKey;
