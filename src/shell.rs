//! Tab/session state machine.
//!
//! [`BrowserShell`] owns the tabs, the active selection and the process-wide
//! block-list. Toolbar actions and keyboard shortcuts map 1:1 to its
//! operations. Every operation is best-effort: an unknown tab id or an
//! out-of-range index is a silent no-op, never an error.
//!
//! ```text
//! Idle ──navigate_to / reload / LoadStarted──▶ Loading ──LoadFinished──▶ Idle
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::blocklist::BlockList;
use crate::filter::{NavigationFilter, NavigationType};
use crate::surface::{Engine, Surface, SurfaceBackend, SurfaceEvent, SurfaceId};

/// Prefixes that mark text as already carrying a scheme.
const RECOGNIZED_SCHEMES: &[&str] = &["http://", "https://", "file://", "about:", "data:"];

/// Scheme prepended to bare addresses.
const DEFAULT_SCHEME: &str = "https://";

/// Turns address-bar text into a URL.
///
/// The only normalisation is scheme prefixing: text that does not start with
/// a recognised scheme gets `https://` in front. Returns `None` when the
/// result still is not a URL.
pub fn normalize_url(text: &str) -> Option<Url> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let lower = text.to_ascii_lowercase();
    let candidate = if RECOGNIZED_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        text.to_owned()
    } else {
        format!("{DEFAULT_SCHEME}{text}")
    };
    Url::parse(&candidate).ok()
}

pub struct BrowserShell<E: Engine> {
    engine: E,
    blocklist: Arc<BlockList>,
    homepage: Url,
    surfaces: Vec<Surface<E::Backend>>,
    active: Option<usize>,
    next_id: u64,
}

impl<E: Engine> BrowserShell<E> {
    /// Creates an empty shell. No tab exists until [`Self::open_new_surface`].
    pub fn new(engine: E, blocklist: Arc<BlockList>, homepage: Url) -> Self {
        Self {
            engine,
            blocklist,
            homepage,
            surfaces: Vec::new(),
            active: None,
            next_id: 1,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn homepage(&self) -> &Url {
        &self.homepage
    }

    pub fn blocklist(&self) -> &Arc<BlockList> {
        &self.blocklist
    }

    // ── Tab collection ────────────────────────────────────────────────────

    /// Opens a tab loading `url` (or the homepage), appends it and makes it
    /// active.
    pub fn open_new_surface(&mut self, url: Option<&str>) -> SurfaceId {
        let target = match url.map(|text| (text, normalize_url(text))) {
            Some((_, Some(url))) => url,
            Some((text, None)) => {
                warn!(input = text, "Unparseable URL for new tab, opening homepage");
                self.homepage.clone()
            }
            None => self.homepage.clone(),
        };

        let id = SurfaceId::new(self.next_id);
        self.next_id += 1;

        let filter = NavigationFilter::new(Arc::clone(&self.blocklist));
        let backend = self.engine.create_surface(id, filter, &target);
        info!(%id, url = %target, "Tab opened");

        self.surfaces.push(Surface::new(id, backend, target));
        self.set_active(Some(self.surfaces.len() - 1));
        id
    }

    /// Closes the tab at `index`. Out of range is a no-op.
    ///
    /// The selection stays on the same position when possible, otherwise
    /// moves to the new last tab. Closing the last tab leaves the shell empty.
    pub fn close_surface(&mut self, index: usize) {
        if index >= self.surfaces.len() {
            debug!(index, len = self.surfaces.len(), "close_surface: index out of range");
            return;
        }
        let closed = self.surfaces.remove(index);
        info!(id = %closed.id(), "Tab closed");

        let next = match self.active {
            _ if self.surfaces.is_empty() => None,
            Some(active) if active > index => Some(active - 1),
            Some(active) => Some(active.min(self.surfaces.len() - 1)),
            None => Some(0),
        };
        // Indices shifted; the old selection no longer names a tab.
        self.active = None;
        self.set_active(next);
    }

    /// Makes the tab at `index` active. Out of range is a no-op.
    pub fn select_surface(&mut self, index: usize) {
        if index < self.surfaces.len() {
            self.set_active(Some(index));
        } else {
            debug!(index, "select_surface: index out of range");
        }
    }

    /// Activates the next tab (wrapping), or the previous one when `backwards`.
    pub fn cycle_surface(&mut self, backwards: bool) {
        let len = self.surfaces.len();
        if let Some(active) = self.active
            && len > 0
        {
            let next = if backwards {
                (active + len - 1) % len
            } else {
                (active + 1) % len
            };
            self.set_active(Some(next));
        }
    }

    /// Hides the previously active tab and shows the new one.
    fn set_active(&mut self, index: Option<usize>) {
        if self.active == index {
            return;
        }
        if let Some(previous) = self.active.and_then(|i| self.surfaces.get(i)) {
            previous.backend().set_visible(false);
        }
        if let Some(current) = index.and_then(|i| self.surfaces.get(i)) {
            current.backend().set_visible(true);
        }
        self.active = index;
    }

    pub fn surfaces(&self) -> &[Surface<E::Backend>] {
        &self.surfaces
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_surface(&self) -> Option<&Surface<E::Backend>> {
        self.active.and_then(|i| self.surfaces.get(i))
    }

    pub fn active_id(&self) -> Option<SurfaceId> {
        self.active_surface().map(Surface::id)
    }

    pub fn index_of(&self, id: SurfaceId) -> Option<usize> {
        self.surfaces.iter().position(|s| s.id() == id)
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&Surface<E::Backend>> {
        self.surfaces.iter().find(|s| s.id() == id)
    }

    fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut Surface<E::Backend>> {
        let found = self.surfaces.iter_mut().find(|s| s.id() == id);
        if found.is_none() {
            debug!(%id, "No such tab, ignoring");
        }
        found
    }

    // ── Navigation commands ───────────────────────────────────────────────

    /// Normalises `url_text` and loads it in `surface` as a typed navigation.
    pub fn navigate_to(&mut self, surface: SurfaceId, url_text: &str) {
        let Some(url) = normalize_url(url_text) else {
            warn!(input = url_text, "Not a URL even with a scheme, ignoring");
            return;
        };
        if let Some(s) = self.surface_mut(surface) {
            debug!(%surface, %url, "Navigating");
            s.load(url, NavigationType::Typed);
        }
    }

    pub fn go_home(&mut self, surface: SurfaceId) {
        let home = self.homepage.to_string();
        self.navigate_to(surface, &home);
    }

    pub fn go_back(&mut self, surface: SurfaceId) {
        if let Some(s) = self.surface_mut(surface) {
            s.backend().go_back();
        }
    }

    pub fn go_forward(&mut self, surface: SurfaceId) {
        if let Some(s) = self.surface_mut(surface) {
            s.backend().go_forward();
        }
    }

    pub fn reload(&mut self, surface: SurfaceId) {
        if let Some(s) = self.surface_mut(surface) {
            s.backend().reload();
            s.begin_loading();
        }
    }

    // ── Engine notifications ──────────────────────────────────────────────

    /// Updates the label of the tab that reported the change, and only that
    /// tab. The active tab is irrelevant here.
    pub fn on_title_changed(&mut self, surface: SurfaceId, title: Option<String>) {
        if let Some(s) = self.surface_mut(surface) {
            s.set_title(title);
        }
    }

    /// Applies an engine notification to the tab it names.
    pub fn handle_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::TitleChanged { surface, title } => self.on_title_changed(surface, title),
            SurfaceEvent::UrlChanged { surface, url } => {
                if let Some(s) = self.surface_mut(surface) {
                    s.set_url(url);
                }
            }
            SurfaceEvent::LoadStarted { surface } => {
                if let Some(s) = self.surface_mut(surface)
                    && !s.is_loading()
                {
                    s.begin_loading();
                }
            }
            SurfaceEvent::LoadFinished { surface } => {
                if let Some(s) = self.surface_mut(surface) {
                    s.finish_loading();
                }
            }
            SurfaceEvent::RequestBlocked { surface, url } => {
                if let Some(s) = self.surface_mut(surface) {
                    s.record_blocked();
                    debug!(%surface, url = %url, total = s.blocked_requests(), "Request blocked");
                }
            }
            SurfaceEvent::FrameReady { .. } => {}
        }
    }
}
