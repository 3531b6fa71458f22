//! The narrow seam between the guide editor and whatever rich-text engine
//! renders it.
//!
//! `HtmlSurface` is the bundled engine: it keeps markup as a string, treats
//! selection indices as character offsets into that markup, and reports
//! user-originated edits to its listeners. Programmatic writes never notify.
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use regex::{Captures, Regex};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("engine construction failed: {0}")]
    Construction(String),

    #[error("selection {index}+{length} is outside content of length {len}")]
    SelectionOutOfRange {
        index: usize,
        length: usize,
        len: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub index: usize,
    pub length: usize,
}

impl Selection {
    pub fn caret(index: usize) -> Self {
        Self { index, length: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    User,
    Api,
}

/// One change event emitted by an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub html: String,
    pub text: String,
    pub source: ChangeSource,
}

pub type ChangeListener = Arc<dyn Fn(&TextChange) + Send + Sync>;

pub trait RichTextEngine: Send {
    /// Current content serialized as HTML.
    fn html(&self) -> String;

    /// Replace the content programmatically. Does not emit a change event.
    fn set_html(&mut self, html: &str);

    fn text(&self) -> String;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn selection(&self) -> Option<Selection>;

    fn set_selection(&mut self, selection: Selection) -> Result<(), EngineError>;

    /// Insert trusted markup at `index` and return the caret position right
    /// after it.
    fn insert_html(&mut self, index: usize, html: &str) -> usize;

    fn focus(&mut self);

    fn on_change(&mut self, listener: ChangeListener);
}

/// Builds an engine bound to one mount point.
pub trait EngineFactory {
    fn create(&self, placeholder: &str) -> Result<Box<dyn RichTextEngine>, EngineError>;
}

const BLOCK_TAGS: [&str; 12] = [
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre", "tr",
];

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<!--.*?-->|<(/?)([a-z][a-z0-9]*)[^>]*>").expect("valid regex"))
}

/// Text a reader would see: tags dropped, block ends and `<br>` turned into
/// newlines, the common entities decoded.
pub fn plain_text(html: &str) -> String {
    let stripped = tag_re().replace_all(html, |caps: &Captures| {
        let Some(name) = caps.get(2) else {
            return "";
        };
        let name = name.as_str().to_ascii_lowercase();
        let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        if name == "br" || (closing && BLOCK_TAGS.contains(&name.as_str())) {
            "\n"
        } else {
            ""
        }
    });
    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[derive(Default)]
struct SurfaceState {
    html: String,
    placeholder: String,
    selection: Option<Selection>,
    focused: bool,
    mounts: usize,
    listeners: Vec<ChangeListener>,
}

/// A string-backed editing surface. Clones share the same state, so a host
/// can keep a handle to feed user input while the editor owns the engine.
#[derive(Clone, Default)]
pub struct HtmlSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl HtmlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replace the content as the user would, then notify listeners.
    pub fn type_html(&self, html: &str) {
        let listeners = {
            let mut state = self.lock();
            state.html = html.to_string();
            let len = state.html.chars().count();
            state.selection = Some(Selection::caret(len));
            state.listeners.clone()
        };
        let change = TextChange {
            html: html.to_string(),
            text: plain_text(html),
            source: ChangeSource::User,
        };
        for listener in listeners {
            listener(&change);
        }
    }

    /// Place the caret or a range as the user would.
    pub fn select(&self, selection: Option<Selection>) {
        self.lock().selection = selection;
    }

    pub fn html(&self) -> String {
        self.lock().html.clone()
    }

    pub fn placeholder(&self) -> String {
        self.lock().placeholder.clone()
    }

    pub fn is_focused(&self) -> bool {
        self.lock().focused
    }

    /// How many engines have been built on this surface.
    pub fn mounts(&self) -> usize {
        self.lock().mounts
    }
}

impl EngineFactory for HtmlSurface {
    fn create(&self, placeholder: &str) -> Result<Box<dyn RichTextEngine>, EngineError> {
        let mut state = self.lock();
        state.placeholder = placeholder.to_string();
        state.mounts += 1;
        Ok(Box::new(SimpleHtmlEngine {
            surface: self.clone(),
        }))
    }
}

/// Engine handle over an `HtmlSurface`.
pub struct SimpleHtmlEngine {
    surface: HtmlSurface,
}

impl RichTextEngine for SimpleHtmlEngine {
    fn html(&self) -> String {
        self.surface.html()
    }

    /// Replacing the markup drops the selection; identical markup keeps it.
    fn set_html(&mut self, html: &str) {
        let mut state = self.surface.lock();
        if state.html == html {
            return;
        }
        state.html = html.to_string();
        state.selection = None;
    }

    fn text(&self) -> String {
        plain_text(&self.surface.lock().html)
    }

    fn len(&self) -> usize {
        self.surface.lock().html.chars().count()
    }

    fn selection(&self) -> Option<Selection> {
        self.surface.lock().selection
    }

    fn set_selection(&mut self, selection: Selection) -> Result<(), EngineError> {
        let mut state = self.surface.lock();
        let len = state.html.chars().count();
        if selection.index.saturating_add(selection.length) > len {
            return Err(EngineError::SelectionOutOfRange {
                index: selection.index,
                length: selection.length,
                len,
            });
        }
        state.selection = Some(selection);
        Ok(())
    }

    fn insert_html(&mut self, index: usize, html: &str) -> usize {
        let mut state = self.surface.lock();
        let at = insertion_point(&state.html, index);
        state.html.insert_str(at, html);
        let caret = state.html[..at + html.len()].chars().count();
        state.selection = Some(Selection::caret(caret));
        caret
    }

    fn focus(&mut self) {
        self.surface.lock().focused = true;
    }

    fn on_change(&mut self, listener: ChangeListener) {
        self.surface.lock().listeners.push(listener);
    }
}

/// Byte offset for the character `index`, clamped to the end and moved past
/// the end of any tag it lands inside.
fn insertion_point(html: &str, index: usize) -> usize {
    let at = html
        .char_indices()
        .nth(index)
        .map_or(html.len(), |(byte, _)| byte);
    let before = &html[..at];
    let inside_tag = match (before.rfind('<'), before.rfind('>')) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    };
    if !inside_tag {
        return at;
    }
    html[at..].find('>').map_or(html.len(), |end| at + end + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn plain_text_separates_blocks() {
        let text = plain_text("<h4>Stop</h4><p>Apply <b>firm</b> pressure&nbsp;now</p><!-- note -->");
        assert_eq!(text, "Stop\nApply firm pressure now\n");
        assert_eq!(plain_text("a<br>b &amp; c"), "a\nb & c");
    }

    #[test]
    fn insert_snaps_out_of_tags() {
        let html = "<p>ab</p>";
        assert_eq!(insertion_point(html, 0), 0);
        assert_eq!(insertion_point(html, 1), 3);
        assert_eq!(insertion_point(html, 4), 4);
        assert_eq!(insertion_point(html, 6), 9);
        assert_eq!(insertion_point(html, 99), html.len());
    }

    #[test]
    fn programmatic_writes_do_not_notify() {
        let surface = HtmlSurface::new();
        let mut engine = surface.create("Type here").expect("engine");
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        engine.on_change(Arc::new(move |change: &TextChange| {
            assert_eq!(change.source, ChangeSource::User);
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        engine.set_html("<p>api</p>");
        engine.insert_html(0, "<p>x</p>");
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        surface.type_html("<p>typed</p>");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(engine.html(), "<p>typed</p>");
        assert_eq!(surface.placeholder(), "Type here");
    }

    #[test]
    fn selection_must_fit_content() {
        let surface = HtmlSurface::new();
        let mut engine = surface.create("").expect("engine");
        engine.set_html("<p>é</p>");
        assert!(engine.set_selection(Selection { index: 3, length: 5 }).is_ok());
        assert_eq!(
            engine.set_selection(Selection::caret(9)),
            Err(EngineError::SelectionOutOfRange { index: 9, length: 0, len: 8 })
        );
    }
}
