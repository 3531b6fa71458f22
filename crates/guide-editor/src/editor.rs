//! Guide content editor session.
//!
//! Wraps one `RichTextEngine` mount and adds templates, word counts, the
//! dirty flag, autosave, fullscreen and preview. Every save attempt is stamped
//! with a sequence id; a completion only counts if it belongs to the most
//! recent attempt, and it only clears `dirty` if no edit happened after the
//! attempt started.
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use dashboard_common::error::ApiError;

use crate::config::EditorConfig;
use crate::engine::{ChangeSource, EngineFactory, RichTextEngine, Selection, TextChange};
use crate::templates::TemplateKey;

pub const CANCEL_KEY: &str = "Escape";

/// Persists editor content on behalf of the host.
#[async_trait]
pub trait SaveHandler: Send + Sync {
    async fn save(&self, html: String) -> Result<(), ApiError>;
}

pub type ChangeCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorStatus {
    /// No engine yet, or construction failed. Template and save actions
    /// should be disabled until `initialize` succeeds.
    Uninitialized,
    Ready,
}

/// Where the host should render the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTarget {
    Inline,
    /// Full-viewport layer above everything else.
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// A newer save was started, or the editor closed, before this one
    /// finished. Its result was discarded.
    Stale,
    NoHandler,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub status: EditorStatus,
    pub word_count: usize,
    pub char_count: usize,
    pub dirty: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub fullscreen: bool,
    pub preview: bool,
    pub render_target: RenderTarget,
}

struct Inner {
    config: EditorConfig,
    engine: Option<Box<dyn RichTextEngine>>,
    /// Content held before an engine exists.
    pending_html: String,
    word_count: usize,
    char_count: usize,
    dirty: bool,
    last_saved_at: Option<DateTime<Utc>>,
    fullscreen: bool,
    preview: bool,
    alive: bool,
    save_seq: u64,
    edit_generation: u64,
    autosave: Option<JoinHandle<()>>,
    autosave_timer: u64,
    on_change: Option<ChangeCallback>,
    save_handler: Option<Arc<dyn SaveHandler>>,
}

impl Inner {
    fn html(&self) -> String {
        match &self.engine {
            Some(engine) => engine.html(),
            None => self.pending_html.clone(),
        }
    }

    fn recount(&mut self, text: &str) {
        self.word_count = text.split_whitespace().count();
        self.char_count = text.chars().count();
    }

    fn recount_from_engine(&mut self) {
        let text = match &self.engine {
            Some(engine) => engine.text(),
            None => crate::engine::plain_text(&self.pending_html),
        };
        self.recount(&text);
    }

    fn cancel_autosave(&mut self) {
        if let Some(timer) = self.autosave.take() {
            timer.abort();
        }
    }
}

/// Handle to one editor session. Clones share the session.
#[derive(Clone)]
pub struct GuideEditor {
    inner: Arc<Mutex<Inner>>,
}

impl GuideEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                config,
                engine: None,
                pending_html: String::new(),
                word_count: 0,
                char_count: 0,
                dirty: false,
                last_saved_at: None,
                fullscreen: false,
                preview: false,
                alive: true,
                save_seq: 0,
                edit_generation: 0,
                autosave: None,
                autosave_timer: 0,
                on_change: None,
                save_handler: None,
            })),
        }
    }

    pub fn with_on_change(self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.lock().on_change = Some(Arc::new(callback));
        self
    }

    pub fn with_save_handler(self, handler: Arc<dyn SaveHandler>) -> Self {
        self.lock().save_handler = Some(handler);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Build the engine on first call. Later calls return the current status
    /// without touching the engine.
    pub fn initialize(&self, factory: &dyn EngineFactory, initial_html: &str) -> EditorStatus {
        let mut inner = self.lock();
        if inner.engine.is_some() {
            return EditorStatus::Ready;
        }
        if !inner.alive {
            return EditorStatus::Uninitialized;
        }

        let mut engine = match factory.create(&inner.config.placeholder) {
            Ok(engine) => engine,
            Err(e) => {
                error!(error = %e, "failed to initialize guide editor");
                return EditorStatus::Uninitialized;
            }
        };

        let initial = if initial_html.is_empty() {
            std::mem::take(&mut inner.pending_html)
        } else {
            initial_html.to_string()
        };
        if !initial.is_empty() {
            engine.set_html(&initial);
        }

        let session = Arc::downgrade(&self.inner);
        engine.on_change(Arc::new(move |change: &TextChange| {
            if change.source != ChangeSource::User {
                return;
            }
            if let Some(inner) = session.upgrade() {
                GuideEditor { inner }.on_user_edit(&change.html, &change.text);
            }
        }));

        let text = engine.text();
        inner.engine = Some(engine);
        inner.recount(&text);
        debug!(chars = inner.char_count, "guide editor initialized");
        EditorStatus::Ready
    }

    pub fn status(&self) -> EditorStatus {
        if self.lock().engine.is_some() {
            EditorStatus::Ready
        } else {
            EditorStatus::Uninitialized
        }
    }

    /// Entry point for engine change events. Only user edits count.
    pub fn on_text_change(&self, change: &TextChange) {
        match change.source {
            ChangeSource::User => self.on_user_edit(&change.html, &change.text),
            ChangeSource::Api => {}
        }
    }

    pub fn on_user_edit(&self, html: &str, text: &str) {
        let callback = {
            let mut inner = self.lock();
            if !inner.alive {
                return;
            }
            if inner.engine.is_none() {
                inner.pending_html = html.to_string();
            }
            inner.recount(text);
            inner.dirty = true;
            inner.edit_generation += 1;
            self.restart_autosave(&mut inner);
            inner.on_change.clone()
        };
        if let Some(callback) = callback {
            callback(html);
        }
    }

    /// Insert a template at the caret, or at the end without one. Returns
    /// false (and changes nothing) for unknown keys or before initialization.
    pub fn insert_template(&self, key: &str) -> bool {
        let Some(template) = TemplateKey::from_key(key) else {
            debug!(key, "ignoring unknown template");
            return false;
        };

        let (html, text) = {
            let mut inner = self.lock();
            if !inner.alive {
                return false;
            }
            let Some(engine) = inner.engine.as_mut() else {
                debug!(key, "editor not initialized, template ignored");
                return false;
            };
            let index = engine.selection().map_or_else(|| engine.len(), |s| s.index);
            let caret = engine.insert_html(index, template.html());
            if let Err(e) = engine.set_selection(Selection::caret(caret)) {
                debug!(error = %e, "could not move caret after template");
            }
            (engine.html(), engine.text())
        };

        self.on_user_edit(&html, &text);
        true
    }

    pub async fn save(&self) -> Result<SaveOutcome, ApiError> {
        self.run_save(None).await
    }

    /// `timer` is the tag of the autosave timer driving this save, `None` for
    /// an explicit save.
    async fn run_save(&self, timer: Option<u64>) -> Result<SaveOutcome, ApiError> {
        let explicit = timer.is_none();
        let (seq, generation, html, handler) = {
            let mut inner = self.lock();
            if !inner.alive {
                return Ok(SaveOutcome::Closed);
            }
            match timer {
                None => inner.cancel_autosave(),
                // The timer task is the caller; aborting it would cancel this save.
                Some(tag) if tag == inner.autosave_timer => inner.autosave = None,
                // A newer timer owns the slot.
                Some(_) => {}
            }
            let Some(handler) = inner.save_handler.clone() else {
                return Ok(SaveOutcome::NoHandler);
            };
            inner.save_seq += 1;
            (inner.save_seq, inner.edit_generation, inner.html(), handler)
        };

        debug!(seq, explicit, "saving guide content");
        let result = handler.save(html).await;

        let mut inner = self.lock();
        if !inner.alive || seq != inner.save_seq {
            debug!(seq, latest = inner.save_seq, "ignoring stale save completion");
            return Ok(SaveOutcome::Stale);
        }
        match result {
            Ok(()) => {
                inner.last_saved_at = Some(Utc::now());
                if inner.edit_generation == generation {
                    inner.dirty = false;
                }
                info!(seq, dirty = inner.dirty, "guide content saved");
                Ok(SaveOutcome::Saved)
            }
            Err(e) => {
                warn!(seq, error = %e, "guide content save failed");
                Err(e)
            }
        }
    }

    fn restart_autosave(&self, inner: &mut Inner) {
        inner.cancel_autosave();
        if !inner.config.autosave || inner.save_handler.is_none() {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            debug!("no async runtime, autosave disabled for this edit");
            return;
        };
        inner.autosave_timer += 1;
        let tag = inner.autosave_timer;
        let delay = inner.config.autosave_interval;
        let session: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        inner.autosave = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = session.upgrade() else {
                return;
            };
            let editor = GuideEditor { inner };
            let dirty = editor.lock().dirty;
            if !dirty {
                return;
            }
            if let Err(e) = editor.run_save(Some(tag)).await {
                warn!(error = %e, "autosave failed");
            }
        }));
    }

    pub fn get_content(&self) -> String {
        self.lock().html()
    }

    /// Programmatic replace. Leaves `dirty` alone and fires no change
    /// callback.
    pub fn set_content(&self, html: &str) {
        let mut inner = self.lock();
        match inner.engine.as_mut() {
            Some(engine) => engine.set_html(html),
            None => inner.pending_html = html.to_string(),
        }
        inner.recount_from_engine();
    }

    /// Adopt content supplied by the host when it differs from what the
    /// editor holds, as when a dialog switches to a different guide. The
    /// caret is restored when it still fits. Returns whether anything changed.
    pub fn sync_content(&self, html: &str) -> bool {
        let mut inner = self.lock();
        if inner.html() == html {
            return false;
        }
        match inner.engine.as_mut() {
            Some(engine) => {
                let selection = engine.selection();
                engine.set_html(html);
                if let Some(selection) = selection {
                    if let Err(e) = engine.set_selection(selection) {
                        debug!(error = %e, "selection not restored after sync");
                    }
                }
            }
            None => inner.pending_html = html.to_string(),
        }
        inner.recount_from_engine();
        inner.dirty = false;
        inner.edit_generation += 1;
        inner.cancel_autosave();
        true
    }

    pub fn focus(&self) {
        if let Some(engine) = self.lock().engine.as_mut() {
            engine.focus();
        }
    }

    pub fn toggle_fullscreen(&self) -> bool {
        let mut inner = self.lock();
        inner.fullscreen = !inner.fullscreen;
        inner.fullscreen
    }

    pub fn exit_fullscreen(&self) {
        self.lock().fullscreen = false;
    }

    /// Returns true when the key was consumed.
    pub fn handle_key(&self, key: &str) -> bool {
        let mut inner = self.lock();
        if key == CANCEL_KEY && inner.fullscreen {
            inner.fullscreen = false;
            return true;
        }
        false
    }

    /// Page scrolling is suppressed while fullscreen.
    pub fn scroll_locked(&self) -> bool {
        self.lock().fullscreen
    }

    pub fn render_target(&self) -> RenderTarget {
        if self.lock().fullscreen {
            RenderTarget::Overlay
        } else {
            RenderTarget::Inline
        }
    }

    pub fn toggle_preview(&self) -> bool {
        let mut inner = self.lock();
        inner.preview = !inner.preview;
        inner.preview
    }

    /// Markup to render read-only while preview is on.
    pub fn preview_html(&self) -> Option<String> {
        let inner = self.lock();
        inner.preview.then(|| inner.html())
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        let inner = self.lock();
        EditorSnapshot {
            status: if inner.engine.is_some() {
                EditorStatus::Ready
            } else {
                EditorStatus::Uninitialized
            },
            word_count: inner.word_count,
            char_count: inner.char_count,
            dirty: inner.dirty,
            last_saved_at: inner.last_saved_at,
            fullscreen: inner.fullscreen,
            preview: inner.preview,
            render_target: if inner.fullscreen {
                RenderTarget::Overlay
            } else {
                RenderTarget::Inline
            },
        }
    }

    /// Tear down: stop the autosave timer and discard any in-flight save.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.alive = false;
        inner.fullscreen = false;
        inner.save_seq += 1;
        inner.cancel_autosave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{plain_text, EngineError, HtmlSurface};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct RecordingSaver {
        saved: Mutex<Vec<String>>,
    }

    impl RecordingSaver {
        fn count(&self) -> usize {
            self.saved.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SaveHandler for RecordingSaver {
        async fn save(&self, html: String) -> Result<(), ApiError> {
            self.saved.lock().unwrap().push(html);
            Ok(())
        }
    }

    /// Each save waits on the next gate, so completions arrive in whatever
    /// order the test releases them.
    struct GatedSaver {
        gates: Mutex<VecDeque<oneshot::Receiver<Result<(), ApiError>>>>,
    }

    #[async_trait]
    impl SaveHandler for GatedSaver {
        async fn save(&self, _html: String) -> Result<(), ApiError> {
            let gate = self.gates.lock().unwrap().pop_front();
            match gate {
                Some(gate) => gate.await.unwrap_or(Ok(())),
                None => Ok(()),
            }
        }
    }

    struct BrokenFactory;

    impl EngineFactory for BrokenFactory {
        fn create(&self, _placeholder: &str) -> Result<Box<dyn RichTextEngine>, EngineError> {
            Err(EngineError::Construction("mount point missing".to_string()))
        }
    }

    fn autosaving() -> EditorConfig {
        EditorConfig {
            autosave: true,
            ..EditorConfig::default()
        }
    }

    fn gated(n: usize) -> (Arc<GatedSaver>, Vec<oneshot::Sender<Result<(), ApiError>>>) {
        let (senders, receivers): (Vec<_>, VecDeque<_>) = (0..n).map(|_| oneshot::channel()).unzip();
        let saver = Arc::new(GatedSaver {
            gates: Mutex::new(receivers),
        });
        (saver, senders)
    }

    #[test]
    fn initialize_is_idempotent() {
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default());
        assert_eq!(editor.status(), EditorStatus::Uninitialized);
        assert_eq!(editor.initialize(&surface, "<p>Start here</p>"), EditorStatus::Ready);
        assert_eq!(editor.initialize(&surface, "<p>Other</p>"), EditorStatus::Ready);
        assert_eq!(surface.mounts(), 1);
        assert_eq!(editor.get_content(), "<p>Start here</p>");
        assert_eq!(surface.placeholder(), "Write your emergency guide here...");
        assert_eq!(editor.snapshot().word_count, 2);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn failed_construction_leaves_editor_inert() {
        let editor = GuideEditor::new(EditorConfig::default());
        assert_eq!(editor.initialize(&BrokenFactory, "<p>x</p>"), EditorStatus::Uninitialized);
        assert!(!editor.insert_template("warning-box"));
        assert_eq!(editor.snapshot().status, EditorStatus::Uninitialized);

        let surface = HtmlSurface::new();
        assert_eq!(editor.initialize(&surface, ""), EditorStatus::Ready);
    }

    #[test]
    fn user_edits_mark_dirty_and_notify() {
        let calls = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen = calls.clone();
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default())
            .with_on_change(move |html| seen.lock().unwrap().push(html.to_string()));
        editor.initialize(&surface, "");

        surface.type_html("<p>Check   breathing now</p>");
        let snap = editor.snapshot();
        assert!(snap.dirty);
        assert_eq!(snap.word_count, 3);
        assert_eq!(snap.char_count, "Check   breathing now\n".chars().count());
        assert_eq!(*calls.lock().unwrap(), vec!["<p>Check   breathing now</p>"]);

        editor.on_text_change(&TextChange {
            html: "<p>from api</p>".to_string(),
            text: "from api".to_string(),
            source: ChangeSource::Api,
        });
        assert_eq!(calls.lock().unwrap().len(), 1);
        assert_eq!(editor.snapshot().word_count, 3);
    }

    #[test]
    fn warning_template_into_empty_editor() {
        let changes = Arc::new(AtomicUsize::new(0));
        let counter = changes.clone();
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default()).with_on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        editor.initialize(&surface, "");
        let before = editor.snapshot();

        assert!(editor.insert_template("warning-box"));

        let fragment = TemplateKey::WarningBox.html();
        let content = editor.get_content();
        assert_eq!(content.matches(fragment).count(), 1);
        let rendered = plain_text(fragment);
        let after = editor.snapshot();
        assert!(after.dirty);
        assert_eq!(after.word_count - before.word_count, rendered.split_whitespace().count());
        assert_eq!(after.char_count - before.char_count, rendered.chars().count());
        assert_eq!(changes.load(Ordering::SeqCst), 1);

        assert!(!editor.insert_template("danger-box"));
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn template_goes_to_caret_or_end() {
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default());
        editor.initialize(&surface, "<p>one</p><p>two</p>");

        editor.insert_template("info-box");
        assert!(editor.get_content().starts_with("<p>one</p><p>two</p><div"));

        editor.set_content("<p>one</p><p>two</p>");
        surface.select(Some(Selection::caret(10)));
        editor.insert_template("success-box");
        let content = editor.get_content();
        assert!(content.starts_with("<p>one</p><div"));
        assert!(content.ends_with("</div><p>two</p>"));
    }

    #[test]
    fn set_content_round_trip_is_a_no_op() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default()).with_on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        editor.initialize(&surface, "");
        surface.type_html("<p>Apply pressure</p>");

        let before = editor.snapshot();
        editor.set_content(&editor.get_content());
        assert_eq!(editor.snapshot(), before);
        assert_eq!(editor.get_content(), "<p>Apply pressure</p>");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_content_round_trip_keeps_the_caret() {
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default());
        editor.initialize(&surface, "");
        surface.type_html("<p>ab</p>");
        surface.select(Some(Selection::caret(4)));

        editor.set_content(&editor.get_content());
        assert!(editor.insert_template("info-box"));
        let html = editor.get_content();
        assert!(html.starts_with("<p>a"));
        assert!(html.ends_with("</p>"));
        assert!(!html.starts_with("<p>ab</p>"));

        editor.set_content("<p>replaced</p>");
        assert!(editor.insert_template("info-box"));
        assert!(editor.get_content().starts_with("<p>replaced</p>"));
    }

    #[test]
    fn sync_replaces_content_and_forgets_edits() {
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default());
        editor.initialize(&surface, "");
        surface.type_html("<p>A long draft that the user was typing</p>");
        assert!(editor.is_dirty());

        assert!(editor.sync_content("<p>x</p>"));
        assert_eq!(editor.get_content(), "<p>x</p>");
        assert!(!editor.is_dirty());
        assert_eq!(editor.snapshot().word_count, 1);
        assert!(!editor.sync_content("<p>x</p>"));
    }

    #[test]
    fn fullscreen_and_preview_flags() {
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default());
        editor.initialize(&surface, "<p>Body</p>");
        surface.type_html("<p>Body edited</p>");

        assert!(!editor.handle_key(CANCEL_KEY));
        assert!(editor.toggle_fullscreen());
        assert_eq!(editor.render_target(), RenderTarget::Overlay);
        assert!(editor.scroll_locked());
        assert!(!editor.handle_key("Enter"));
        assert!(editor.handle_key(CANCEL_KEY));
        assert_eq!(editor.render_target(), RenderTarget::Inline);
        assert!(!editor.scroll_locked());

        editor.toggle_fullscreen();
        editor.exit_fullscreen();
        assert!(!editor.snapshot().fullscreen);

        assert_eq!(editor.preview_html(), None);
        assert!(editor.toggle_preview());
        assert_eq!(editor.preview_html().as_deref(), Some("<p>Body edited</p>"));
        assert!(editor.is_dirty());
        assert!(!editor.toggle_preview());

        editor.focus();
        assert!(surface.is_focused());
    }

    #[tokio::test]
    async fn save_clears_dirty() {
        let saver = Arc::new(RecordingSaver::default());
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default()).with_save_handler(saver.clone());
        editor.initialize(&surface, "");
        surface.type_html("<p>Step one</p>");

        assert_eq!(editor.save().await, Ok(SaveOutcome::Saved));
        let snap = editor.snapshot();
        assert!(!snap.dirty);
        assert!(snap.last_saved_at.is_some());
        assert_eq!(*saver.saved.lock().unwrap(), vec!["<p>Step one</p>"]);

        let bare = GuideEditor::new(EditorConfig::default());
        assert_eq!(bare.save().await, Ok(SaveOutcome::NoHandler));
    }

    #[tokio::test]
    async fn failed_save_keeps_dirty() {
        let (saver, mut gates) = gated(1);
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default()).with_save_handler(saver);
        editor.initialize(&surface, "");
        surface.type_html("<p>Draft</p>");

        let pending = editor.save();
        tokio::pin!(pending);
        assert!(futures::poll!(&mut pending).is_pending());
        let _ = gates
            .remove(0)
            .send(Err(ApiError::Unavailable("offline".to_string())));
        assert!(pending.await.is_err());
        assert!(editor.is_dirty());
        assert!(editor.snapshot().last_saved_at.is_none());
    }

    #[tokio::test]
    async fn older_save_finishing_last_is_ignored() {
        let (saver, mut gates) = gated(2);
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default()).with_save_handler(saver);
        editor.initialize(&surface, "");
        surface.type_html("<p>v1</p>");

        let first = editor.save();
        tokio::pin!(first);
        assert!(futures::poll!(&mut first).is_pending());

        surface.type_html("<p>v2</p>");
        let second = editor.save();
        tokio::pin!(second);
        assert!(futures::poll!(&mut second).is_pending());

        surface.type_html("<p>v3</p>");
        let second_gate = gates.remove(1);
        let first_gate = gates.remove(0);

        let _ = second_gate.send(Ok(()));
        assert_eq!(second.await, Ok(SaveOutcome::Saved));
        // v3 came after the second save started
        assert!(editor.is_dirty());
        let saved_at = editor.snapshot().last_saved_at;
        assert!(saved_at.is_some());

        let _ = first_gate.send(Ok(()));
        assert_eq!(first.await, Ok(SaveOutcome::Stale));
        assert!(editor.is_dirty());
        assert_eq!(editor.snapshot().last_saved_at, saved_at);
    }

    #[tokio::test]
    async fn older_save_finishing_first_is_ignored() {
        let (saver, mut gates) = gated(2);
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default()).with_save_handler(saver);
        editor.initialize(&surface, "");
        surface.type_html("<p>v1</p>");

        let first = editor.save();
        tokio::pin!(first);
        assert!(futures::poll!(&mut first).is_pending());
        surface.type_html("<p>v2</p>");
        let second = editor.save();
        tokio::pin!(second);
        assert!(futures::poll!(&mut second).is_pending());

        let second_gate = gates.remove(1);
        let _ = gates.remove(0).send(Ok(()));
        assert_eq!(first.await, Ok(SaveOutcome::Stale));
        assert!(editor.is_dirty());
        assert!(editor.snapshot().last_saved_at.is_none());

        let _ = second_gate.send(Ok(()));
        assert_eq!(second.await, Ok(SaveOutcome::Saved));
        assert!(!editor.is_dirty());
    }

    #[tokio::test]
    async fn close_discards_in_flight_save() {
        let (saver, mut gates) = gated(1);
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(EditorConfig::default()).with_save_handler(saver);
        editor.initialize(&surface, "");
        surface.type_html("<p>Draft</p>");

        let pending = editor.save();
        tokio::pin!(pending);
        assert!(futures::poll!(&mut pending).is_pending());
        editor.close();
        let _ = gates.remove(0).send(Ok(()));
        assert_eq!(pending.await, Ok(SaveOutcome::Stale));
        assert!(editor.snapshot().last_saved_at.is_none());
        assert_eq!(editor.save().await, Ok(SaveOutcome::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn autosave_waits_for_quiet_period() {
        let saver = Arc::new(RecordingSaver::default());
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(autosaving()).with_save_handler(saver.clone());
        editor.initialize(&surface, "");

        surface.type_html("<p>one</p>");
        tokio::time::sleep(Duration::from_secs(20)).await;
        surface.type_html("<p>one two</p>");
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(saver.count(), 0);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(saver.count(), 1);
        assert!(!editor.is_dirty());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(saver.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_save_and_close_cancel_autosave() {
        let saver = Arc::new(RecordingSaver::default());
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(autosaving()).with_save_handler(saver.clone());
        editor.initialize(&surface, "");

        surface.type_html("<p>one</p>");
        assert_eq!(editor.save().await, Ok(SaveOutcome::Saved));
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(saver.count(), 1);

        surface.type_html("<p>one two</p>");
        editor.close();
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(saver.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn late_timer_save_keeps_the_newer_timer() {
        let saver = Arc::new(RecordingSaver::default());
        let surface = HtmlSurface::new();
        let editor = GuideEditor::new(autosaving()).with_save_handler(saver.clone());
        editor.initialize(&surface, "");

        surface.type_html("<p>one</p>");
        let first = editor.lock().autosave_timer;
        surface.type_html("<p>one two</p>");
        assert!(editor.lock().autosave_timer > first);

        assert_eq!(editor.run_save(Some(first)).await, Ok(SaveOutcome::Saved));
        assert!(editor.lock().autosave.is_some());

        editor.close();
        assert!(editor.lock().autosave.is_none());
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(saver.count(), 1);
    }
}
