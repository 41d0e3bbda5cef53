//! Couche d'intégration entre Servo et le shell de navigation.
//!
//! 1. **[`Waker`] / [`WakerEvent`]** : le pont `Send + Sync` entre les threads
//!    internes de Servo et le thread principal Winit.
//!
//! 2. **[`ServoEngine`] / [`ServoSurface`]** : implémentations de
//!    [`Engine`] et [`SurfaceBackend`] au-dessus de `servo::WebView`. Chaque
//!    onglet est une WebView qui rend dans son propre contexte offscreen.
//!
//! 3. **[`SurfaceDelegate`]** : un `WebViewDelegate` par onglet. Il ne touche
//!    jamais au shell : il pousse des [`SurfaceEvent`] dans la file que la
//!    boucle Winit vide après `spin_event_loop()`. C'est aussi lui qui
//!    applique le [`NavigationFilter`] à chaque requête réseau.

use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::time::{Duration, Instant};

use euclid::Scale;
use servo::{
    LoadStatus, NavigationRequest as EngineNavigationRequest, OffscreenRenderingContext,
    RenderingContext, Servo, WebResourceLoad, WebResourceResponse, WebView, WebViewBuilder,
    WebViewDelegate, WindowRenderingContext,
};
use tracing::{debug, trace, warn};
use url::Url;
use winit::dpi::PhysicalSize;
use winit::event_loop::{EventLoop, EventLoopProxy};

use crate::filter::{FrameTarget, NavigationFilter, NavigationRequest, NavigationType};
use crate::surface::{Engine, EventQueue, SurfaceBackend, SurfaceEvent, SurfaceId};

// ─────────────────────────────────────────────────────────────────────────────
// Waker : pont Servo → Winit
// ─────────────────────────────────────────────────────────────────────────────

/// Événement marqueur envoyé à travers le `EventLoopProxy` de Winit.
///
/// La boucle le reçoit dans `user_event()` et appelle
/// `servo.spin_event_loop()` en réponse.
#[derive(Debug)]
pub struct WakerEvent;

/// Pont thread-safe entre les threads internes de Servo (Constellation,
/// script, réseau) et la boucle d'événements Winit.
#[derive(Clone)]
pub struct Waker(EventLoopProxy<WakerEvent>);

impl Waker {
    pub fn new(event_loop: &EventLoop<WakerEvent>) -> Self {
        Self(event_loop.create_proxy())
    }
}

impl embedder_traits::EventLoopWaker for Waker {
    fn clone_box(&self) -> Box<dyn embedder_traits::EventLoopWaker> {
        Box::new(Self(self.0.clone()))
    }

    fn wake(&self) {
        if let Err(error) = self.0.send_event(WakerEvent) {
            warn!(?error, "Échec du réveil de la boucle d'événements Winit");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine : fabrique de WebViews
// ─────────────────────────────────────────────────────────────────────────────

/// Le moteur Servo vu par le shell.
///
/// Chaque onglet reçoit son propre FBO dérivé du contexte fenêtre ; seul
/// celui de l'onglet actif est blitté.
pub struct ServoEngine {
    servo: Servo,
    window_context: Rc<WindowRenderingContext>,
    viewport: Cell<PhysicalSize<u32>>,
    hidpi_scale: f32,
    /// Une page `file://` ne charge rien depuis le réseau.
    isolate_local_content: bool,
    events: EventQueue,
}

impl ServoEngine {
    pub fn new(
        servo: Servo,
        window_context: Rc<WindowRenderingContext>,
        viewport: PhysicalSize<u32>,
        hidpi_scale: f32,
        isolate_local_content: bool,
        events: EventQueue,
    ) -> Self {
        Self {
            servo,
            window_context,
            viewport: Cell::new(viewport),
            hidpi_scale,
            isolate_local_content,
            events,
        }
    }

    /// Fait avancer Servo. Les délégués remplissent la file pendant l'appel.
    pub fn spin(&self) {
        self.servo.spin_event_loop();
    }

    /// Taille donnée aux FBO des prochains onglets.
    pub fn set_viewport(&self, size: PhysicalSize<u32>) {
        self.viewport.set(size);
    }
}

impl Engine for ServoEngine {
    type Backend = ServoSurface;

    fn create_surface(&mut self, id: SurfaceId, filter: NavigationFilter, url: &Url) -> ServoSurface {
        let delegate = Rc::new(SurfaceDelegate::new(
            id,
            filter,
            self.isolate_local_content,
            self.events.clone(),
        ));
        delegate.expect_navigation(url.clone(), NavigationType::Typed);

        let rendering_context = Rc::new(self.window_context.offscreen_context(self.viewport.get()));
        let webview = WebViewBuilder::new(
            &self.servo,
            rendering_context.clone() as Rc<dyn RenderingContext>,
        )
        .url(url.clone())
        .hidpi_scale_factor(Scale::new(self.hidpi_scale))
        .delegate(delegate.clone())
        .build();

        debug!(%id, %url, "WebView créée");
        ServoSurface {
            webview,
            delegate,
            rendering_context,
            visible: Cell::new(true),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SurfaceBackend : une WebView par onglet
// ─────────────────────────────────────────────────────────────────────────────

pub struct ServoSurface {
    webview: WebView,
    delegate: Rc<SurfaceDelegate>,
    rendering_context: Rc<OffscreenRenderingContext>,
    visible: Cell<bool>,
}

impl ServoSurface {
    pub fn webview(&self) -> &WebView {
        &self.webview
    }

    pub fn rendering_context(&self) -> &OffscreenRenderingContext {
        &self.rendering_context
    }

    pub fn resize(&self, size: PhysicalSize<u32>) {
        self.rendering_context.resize(size);
        self.webview.resize(size);
    }

    /// À appeler quand l'utilisateur clique ou valide dans la page.
    pub fn note_user_activation(&self) {
        self.delegate.note_user_activation(Instant::now());
    }
}

impl SurfaceBackend for ServoSurface {
    fn load(&self, url: &Url, navigation_type: NavigationType) {
        self.delegate.expect_navigation(url.clone(), navigation_type);
        self.webview.load(url.clone());
    }

    fn go_back(&self) {
        self.delegate.forget_navigation();
        self.webview.go_back(1);
    }

    fn go_forward(&self) {
        self.delegate.forget_navigation();
        self.webview.go_forward(1);
    }

    fn reload(&self) {
        self.delegate.forget_navigation();
        self.webview.reload();
    }

    fn set_visible(&self, visible: bool) {
        if self.visible.replace(visible) == visible {
            return;
        }
        if visible {
            self.webview.show(false);
        } else {
            self.webview.hide();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// WebViewDelegate : callbacks Servo → file d'événements (par onglet)
// ─────────────────────────────────────────────────────────────────────────────

/// Navigation annoncée avant que Servo n'émette la requête correspondante.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingNavigation {
    url: Url,
    navigation_type: NavigationType,
}

/// Durée pendant laquelle un clic ou Entrée dans la page rend la
/// navigation suivante explicite.
const USER_ACTIVATION_WINDOW: Duration = Duration::from_secs(1);

/// Classe une requête réseau.
///
/// Seule une requête du cadre principal, non redirigée, portant exactement
/// l'URL annoncée hérite du type annoncé. Tout le reste est `Other`.
fn classify(
    pending: Option<&PendingNavigation>,
    url: &Url,
    is_for_main_frame: bool,
    is_redirect: bool,
) -> (NavigationType, FrameTarget) {
    if !is_for_main_frame {
        return (NavigationType::Other, FrameTarget::SubResource);
    }
    let navigation_type = match pending {
        Some(p) if !is_redirect && p.url == *url => p.navigation_type,
        _ => NavigationType::Other,
    };
    (navigation_type, FrameTarget::TopLevel)
}

/// Délégué Servo d'un onglet.
pub struct SurfaceDelegate {
    id: SurfaceId,
    filter: NavigationFilter,
    pending: RefCell<Option<PendingNavigation>>,
    user_activation: Cell<Option<Instant>>,
    isolate_local_content: bool,
    page_is_local: Cell<bool>,
    events: EventQueue,
}

impl SurfaceDelegate {
    fn new(id: SurfaceId, filter: NavigationFilter, isolate_local_content: bool, events: EventQueue) -> Self {
        Self {
            id,
            filter,
            pending: RefCell::new(None),
            user_activation: Cell::new(None),
            isolate_local_content,
            page_is_local: Cell::new(false),
            events,
        }
    }

    fn page_changed(&self, url: &Url) {
        self.page_is_local.set(url.scheme() == "file");
    }

    /// Ressource réseau demandée par une page locale.
    fn crosses_local_boundary(&self, url: &Url, is_for_main_frame: bool) -> bool {
        self.isolate_local_content
            && !is_for_main_frame
            && self.page_is_local.get()
            && matches!(url.scheme(), "http" | "https" | "ws" | "wss")
    }

    fn expect_navigation(&self, url: Url, navigation_type: NavigationType) {
        *self.pending.borrow_mut() = Some(PendingNavigation {
            url,
            navigation_type,
        });
    }

    fn forget_navigation(&self) {
        self.pending.borrow_mut().take();
    }

    fn note_user_activation(&self, at: Instant) {
        self.user_activation.set(Some(at));
    }

    /// Navigation lancée par la page. Elle n'est explicite que si elle suit
    /// de près une activation utilisateur, consommée au passage ; sinon
    /// (script, redirection `<meta>`) la requête sera filtrée.
    fn announce_page_navigation(&self, url: Url, now: Instant) {
        let activated = self
            .user_activation
            .take()
            .is_some_and(|at| now.saturating_duration_since(at) <= USER_ACTIVATION_WINDOW);
        if activated {
            self.expect_navigation(url, NavigationType::LinkClicked);
        } else {
            trace!(surface = %self.id, %url, "Navigation sans activation utilisateur");
            self.forget_navigation();
        }
    }

    /// Décide du sort d'une requête. Consomme la navigation annoncée dès
    /// qu'une requête du cadre principal passe.
    fn check(&self, url: &Url, is_for_main_frame: bool, is_redirect: bool) -> bool {
        let pending = if is_for_main_frame {
            self.pending.borrow_mut().take()
        } else {
            None
        };
        let (navigation_type, frame) = classify(pending.as_ref(), url, is_for_main_frame, is_redirect);
        let request = NavigationRequest::new(url.as_str(), navigation_type, frame);

        if self.crosses_local_boundary(url, is_for_main_frame) {
            debug!(surface = %self.id, url = %url, "Accès réseau refusé à une page locale");
            self.push(SurfaceEvent::RequestBlocked {
                surface: self.id,
                url: url.to_string(),
            });
            return false;
        }

        match self.filter.blocking_entry(&request) {
            Some(entry) => {
                debug!(surface = %self.id, url = %url, entry, ?navigation_type, "Requête bloquée");
                self.events.push(SurfaceEvent::RequestBlocked {
                    surface: self.id,
                    url: url.to_string(),
                });
                false
            }
            None => {
                trace!(surface = %self.id, url = %url, ?navigation_type, "Requête autorisée");
                true
            }
        }
    }

    fn push(&self, event: SurfaceEvent) {
        self.events.push(event);
    }
}

/// Les callbacks sont appelés depuis le code de Servo : une panique ne doit
/// pas le traverser.
fn guarded(callback: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        warn!("Panique dans un callback Servo, ignorée");
    }
}

impl WebViewDelegate for SurfaceDelegate {
    fn notify_new_frame_ready(&self, _webview: WebView) {
        guarded(|| self.push(SurfaceEvent::FrameReady { surface: self.id }));
    }

    fn notify_url_changed(&self, _webview: WebView, url: Url) {
        guarded(|| {
            self.page_changed(&url);
            self.push(SurfaceEvent::UrlChanged {
                surface: self.id,
                url,
            })
        });
    }

    fn notify_page_title_changed(&self, _webview: WebView, title: Option<String>) {
        guarded(|| {
            self.push(SurfaceEvent::TitleChanged {
                surface: self.id,
                title,
            })
        });
    }

    fn notify_load_status_changed(&self, _webview: WebView, status: LoadStatus) {
        guarded(|| match status {
            LoadStatus::Started => self.push(SurfaceEvent::LoadStarted { surface: self.id }),
            LoadStatus::Complete => self.push(SurfaceEvent::LoadFinished { surface: self.id }),
            _ => {}
        });
    }

    /// Navigation initiée par la page. Autorisée ici ; le filtre s'applique
    /// à la requête qui suit.
    fn request_navigation(&self, _webview: WebView, navigation_request: EngineNavigationRequest) {
        guarded(|| {
            self.announce_page_navigation(navigation_request.url.clone(), Instant::now());
        });
        navigation_request.allow();
    }

    fn load_web_resource(&self, _webview: WebView, load: WebResourceLoad) {
        guarded(|| {
            let request = load.request();
            let allowed = self.check(&request.url, request.is_for_main_frame, request.is_redirect);
            if !allowed {
                let response = WebResourceResponse::new(request.url.clone());
                load.intercept(response).cancel();
            }
        });
    }
}
