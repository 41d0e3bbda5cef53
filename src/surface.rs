//! Tabs as seen by the shell, and the seam towards the rendering engine.
//!
//! A [`Surface`] is the shell's record of one browsing context: identity,
//! title, URL, load state. The engine side of the tab lives behind the
//! [`SurfaceBackend`] trait; the shell never sees engine types.
//!
//! Engine notifications come back as [`SurfaceEvent`]s. Each event carries the
//! [`SurfaceId`] of the tab that emitted it, so a background tab changing its
//! title updates that tab and not whichever tab happens to be active.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use url::Url;

use crate::filter::{NavigationFilter, NavigationType};

/// Placeholder label shown while a navigation is in flight.
pub const LOADING_TITLE: &str = "Loading…";

/// Label for a tab that has neither a title nor a URL yet.
pub const NEW_TAB_TITLE: &str = "New Tab";

/// Stable identity of a tab. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
}

/// Engine-side handle of one tab.
///
/// Implementations own the engine view and the [`NavigationFilter`] bound to
/// it. Empty-history back/forward must be a no-op, not an error.
pub trait SurfaceBackend {
    fn load(&self, url: &Url, navigation_type: NavigationType);
    fn go_back(&self);
    fn go_forward(&self);
    fn reload(&self);
    /// Only the active tab is shown; hidden ones stop producing frames.
    fn set_visible(&self, visible: bool);
}

/// Factory for engine views.
pub trait Engine {
    type Backend: SurfaceBackend;

    /// Creates the engine view for tab `id`, bound to `filter`, and starts
    /// loading `url` as a typed navigation.
    fn create_surface(&mut self, id: SurfaceId, filter: NavigationFilter, url: &Url)
    -> Self::Backend;
}

/// Notification emitted by a tab's engine view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    TitleChanged { surface: SurfaceId, title: Option<String> },
    UrlChanged { surface: SurfaceId, url: Url },
    LoadStarted { surface: SurfaceId },
    LoadFinished { surface: SurfaceId },
    RequestBlocked { surface: SurfaceId, url: String },
    FrameReady { surface: SurfaceId },
}

impl SurfaceEvent {
    pub fn surface(&self) -> SurfaceId {
        match self {
            Self::TitleChanged { surface, .. }
            | Self::UrlChanged { surface, .. }
            | Self::LoadStarted { surface }
            | Self::LoadFinished { surface }
            | Self::RequestBlocked { surface, .. }
            | Self::FrameReady { surface } => *surface,
        }
    }
}

/// Single-thread queue between engine callbacks and the window loop.
///
/// Delegates push while the engine spins; the window drains afterwards and
/// applies the events to the shell.
#[derive(Debug, Clone, Default)]
pub struct EventQueue(Rc<RefCell<VecDeque<SurfaceEvent>>>);

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: SurfaceEvent) {
        self.0.borrow_mut().push_back(event);
    }

    /// Removes and returns every pending event, oldest first.
    pub fn drain(&self) -> Vec<SurfaceEvent> {
        self.0.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

/// The shell's record of one tab.
pub struct Surface<B> {
    id: SurfaceId,
    backend: B,
    title: String,
    url: Option<Url>,
    load_state: LoadState,
    blocked_requests: usize,
}

impl<B: SurfaceBackend> Surface<B> {
    pub(crate) fn new(id: SurfaceId, backend: B, url: Url) -> Self {
        Self {
            id,
            backend,
            title: LOADING_TITLE.to_owned(),
            url: Some(url),
            load_state: LoadState::Loading,
            blocked_requests: 0,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    /// Requests denied by the filter since the last top-level navigation.
    pub fn blocked_requests(&self) -> usize {
        self.blocked_requests
    }

    /// Text for the tab strip.
    pub fn label(&self) -> &str {
        if !self.title.is_empty() {
            return &self.title;
        }
        match &self.url {
            Some(url) => url.as_str(),
            None => NEW_TAB_TITLE,
        }
    }

    /// Issues a load and enters `Loading`.
    pub(crate) fn load(&mut self, url: Url, navigation_type: NavigationType) {
        self.backend.load(&url, navigation_type);
        self.url = Some(url);
        self.begin_loading();
    }

    pub(crate) fn begin_loading(&mut self) {
        self.load_state = LoadState::Loading;
        self.title = LOADING_TITLE.to_owned();
        self.blocked_requests = 0;
    }

    pub(crate) fn finish_loading(&mut self) {
        self.load_state = LoadState::Idle;
        if self.title == LOADING_TITLE {
            // The page never reported a <title>.
            self.title.clear();
        }
    }

    pub(crate) fn set_title(&mut self, title: Option<String>) {
        self.title = title.unwrap_or_default();
    }

    pub(crate) fn set_url(&mut self, url: Url) {
        self.url = Some(url);
    }

    pub(crate) fn record_blocked(&mut self) {
        self.blocked_requests += 1;
    }
}

impl<B> fmt::Debug for Surface<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("load_state", &self.load_state)
            .field("blocked_requests", &self.blocked_requests)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBackend;

    impl SurfaceBackend for NullBackend {
        fn load(&self, _url: &Url, _navigation_type: NavigationType) {}
        fn go_back(&self) {}
        fn go_forward(&self) {}
        fn reload(&self) {}
    }

    fn surface() -> Surface<NullBackend> {
        let url = Url::parse("https://example.com").unwrap();
        Surface::new(SurfaceId::new(1), NullBackend, url)
    }

    #[test]
    fn test_new_surface_is_loading_with_placeholder() {
        let s = surface();
        assert!(s.is_loading());
        assert_eq!(s.label(), LOADING_TITLE);
    }

    #[test]
    fn test_finish_without_title_falls_back_to_url() {
        let mut s = surface();
        s.finish_loading();
        assert_eq!(s.load_state(), LoadState::Idle);
        assert_eq!(s.label(), "https://example.com/");
    }

    #[test]
    fn test_finish_keeps_reported_title() {
        let mut s = surface();
        s.set_title(Some("Example Domain".into()));
        s.finish_loading();
        assert_eq!(s.label(), "Example Domain");
    }

    #[test]
    fn test_new_navigation_resets_blocked_counter() {
        let mut s = surface();
        s.record_blocked();
        s.record_blocked();
        assert_eq!(s.blocked_requests(), 2);
        s.begin_loading();
        assert_eq!(s.blocked_requests(), 0);
    }

    #[test]
    fn test_event_queue_drains_in_order() {
        let queue = EventQueue::new();
        let id = SurfaceId::new(7);
        queue.push(SurfaceEvent::LoadStarted { surface: id });
        queue.push(SurfaceEvent::LoadFinished { surface: id });

        let drained = queue.drain();
        assert_eq!(
            drained,
            vec![
                SurfaceEvent::LoadStarted { surface: id },
                SurfaceEvent::LoadFinished { surface: id },
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_event_reports_its_surface() {
        let id = SurfaceId::new(3);
        let event = SurfaceEvent::TitleChanged {
            surface: id,
            title: None,
        };
        assert_eq!(event.surface(), id);
        assert_eq!(id.to_string(), "tab#3");
    }
}
