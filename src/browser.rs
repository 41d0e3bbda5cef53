//! Boucle d'événements Winit et cycle de vie de la fenêtre.
//!
//! ## Pattern "Two-Phase App"
//!
//! Winit 0.30 impose que les fenêtres soient créées dans `resumed()`, et
//! Servo a besoin d'un handle de fenêtre pour son `WindowRenderingContext` :
//!
//! ```text
//! App::Initial { waker, config, blocklist }  →  [resumed()]  →  App::Running(AppState)
//! ```
//!
//! ## Flux Servo → shell
//!
//! ```text
//! Threads Servo ──wake()──▶ EventLoopProxy ──▶ user_event()
//!     └─ engine.spin()                      (les délégués remplissent l'EventQueue)
//!     └─ events.drain() → shell.handle_event()
//!     └─ barre d'URL + titre de fenêtre resynchronisés sur l'onglet actif
//! ```
//!
//! ## Disposition
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Bande d'onglets                      │
//! │ Barre d'outils + barre d'URL         │  chrome, GL direct sur la fenêtre
//! ├──────────────────────────────────────┤
//! │ WebView active, blittée depuis son   │
//! │ FBO dans la zone restante            │
//! └──────────────────────────────────────┘
//! ```

use std::cell::{Cell, RefCell};
use std::error::Error;
use std::rc::Rc;
use std::sync::Arc;

use servo::{
    InputEvent, MouseButton as ServoMouseButton, MouseButtonAction, MouseButtonEvent,
    MouseLeftViewportEvent, MouseMoveEvent, RenderingContext, ServoBuilder, WebView, WheelDelta,
    WheelEvent, WheelMode, WindowRenderingContext,
};
use tracing::{debug, error, info};
use webrender_api::units::DevicePoint;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{
    ElementState, KeyEvent, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::{Window, WindowId};

use crate::blocklist::BlockList;
use crate::chrome::{self, ChromeFrame, ChromeRenderer};
use crate::config::Config;
use crate::keyutils::keyboard_event_from_winit;
use crate::preferences::build_servo_preferences;
use crate::rendering;
use crate::resources;
use crate::servo_glue::{ServoEngine, ServoSurface, Waker, WakerEvent};
use crate::shell::BrowserShell;
use crate::surface::EventQueue;
use crate::toolbar::{ChromeHit, ChromeLayout, ToolbarButton};
use crate::urlbar::UrlBar;

/// Pixels par "ligne" de molette.
const LINE_HEIGHT: f32 = 76.0;

// ─────────────────────────────────────────────────────────────────────────────
// Raccourcis clavier
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shortcut {
    FocusUrlBar,
    NewTab,
    CloseTab,
    NextTab,
    PreviousTab,
    Reload,
    Back,
    Forward,
    Home,
}

/// Raccourci global correspondant à une touche pressée, s'il y en a un.
fn shortcut_for(key: &Key, mods: ModifiersState) -> Option<Shortcut> {
    let ctrl = mods.control_key();
    let alt = mods.alt_key();
    match key {
        Key::Character(c) if ctrl && !alt => match c.to_ascii_lowercase().as_str() {
            "l" => Some(Shortcut::FocusUrlBar),
            "t" => Some(Shortcut::NewTab),
            "w" => Some(Shortcut::CloseTab),
            "r" => Some(Shortcut::Reload),
            _ => None,
        },
        Key::Named(NamedKey::Tab) if ctrl => Some(if mods.shift_key() {
            Shortcut::PreviousTab
        } else {
            Shortcut::NextTab
        }),
        Key::Named(NamedKey::F5) => Some(Shortcut::Reload),
        Key::Named(NamedKey::ArrowLeft) if alt => Some(Shortcut::Back),
        Key::Named(NamedKey::ArrowRight) if alt => Some(Shortcut::Forward),
        Key::Named(NamedKey::Home) if alt => Some(Shortcut::Home),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AppState
// ─────────────────────────────────────────────────────────────────────────────

/// État de la fenêtre, créé lors de `resumed()`.
pub struct AppState {
    window: Window,
    config: Config,
    window_rendering_context: Rc<WindowRenderingContext>,
    shell: RefCell<BrowserShell<ServoEngine>>,
    events: EventQueue,
    urlbar: RefCell<UrlBar>,
    chrome: ChromeRenderer,
    /// Position courante du curseur en device pixels, coordonnées fenêtre.
    cursor_position: Cell<DevicePoint>,
    modifiers: Cell<ModifiersState>,
}

impl AppState {
    fn start(
        event_loop: &ActiveEventLoop,
        waker: Waker,
        config: Config,
        blocklist: Arc<BlockList>,
    ) -> Result<Self, Box<dyn Error>> {
        // ── 1. Fenêtre ──────────────────────────────────────────────────
        let icon = crate::icon::load(&resources::resolve(&config.resources.icon));
        let window_attributes = Window::default_attributes()
            .with_title(config.general.window_title.clone())
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
            .with_window_icon(icon);
        let window = event_loop.create_window(window_attributes)?;

        // ── 2. Contextes de rendu ───────────────────────────────────────
        let display_handle = event_loop.display_handle()?;
        let window_handle = window.window_handle()?;
        let inner_size = window.inner_size();
        let window_rendering_context =
            rendering::create_rendering_context(display_handle, window_handle, inner_size)?;

        // ── 3. Chrome ───────────────────────────────────────────────────
        let font = chrome::load_font(&resources::resolve(&config.resources.font));
        let gl = window_rendering_context.glow_gl_api();
        let chrome = unsafe { ChromeRenderer::new(gl, &config.chrome, font.as_ref())? };

        // ── 4. Servo ────────────────────────────────────────────────────
        let servo = ServoBuilder::default()
            .preferences(build_servo_preferences(&config))
            .event_loop_waker(Box::new(waker))
            .build();

        let events = EventQueue::new();
        let engine = ServoEngine::new(
            servo,
            window_rendering_context.clone(),
            rendering::webview_size(inner_size, chrome_height(&config)),
            window.scale_factor() as f32,
            config.privacy.isolate_local_content,
            events.clone(),
        );

        // ── 5. Shell avec un premier onglet ─────────────────────────────
        let mut shell = BrowserShell::new(engine, blocklist, config.homepage_url());
        shell.open_new_surface(None);

        let state = Self {
            window,
            config,
            window_rendering_context,
            shell: RefCell::new(shell),
            events,
            urlbar: RefCell::new(UrlBar::new()),
            chrome,
            cursor_position: Cell::new(DevicePoint::zero()),
            modifiers: Cell::new(ModifiersState::default()),
        };
        state.focus_active_webview();
        state.sync_chrome();
        info!("Fenêtre prête");
        Ok(state)
    }

    fn layout(&self) -> ChromeLayout {
        ChromeLayout::compute(
            self.window.inner_size().width,
            self.shell.borrow().len(),
            &self.config.chrome,
        )
    }

    fn with_active_surface(&self, f: impl FnOnce(&ServoSurface)) {
        let shell = self.shell.borrow();
        if let Some(surface) = shell.active_surface() {
            f(surface.backend());
        }
    }

    fn with_active_webview(&self, f: impl FnOnce(&WebView)) {
        self.with_active_surface(|surface| f(surface.webview()));
    }

    fn focus_active_webview(&self) {
        self.with_active_webview(|webview| webview.focus());
    }

    // ── Servo → shell ─────────────────────────────────────────────────────

    /// Fait tourner Servo puis applique au shell tout ce que les délégués
    /// ont signalé.
    fn pump(&self) {
        self.shell.borrow().engine().spin();

        let events = self.events.drain();
        if events.is_empty() {
            return;
        }
        {
            let mut shell = self.shell.borrow_mut();
            for event in events {
                shell.handle_event(event);
            }
        }
        self.sync_chrome();
    }

    /// Recale la barre d'URL et le titre de fenêtre sur l'onglet actif.
    fn sync_chrome(&self) {
        let shell = self.shell.borrow();
        let active = shell.active_surface();
        self.urlbar.borrow_mut().set_url(active.and_then(|s| s.url()));

        let app_title = &self.config.general.window_title;
        let title = match active {
            Some(surface) => format!("{} - {app_title}", surface.label()),
            None => app_title.clone(),
        };
        self.window.set_title(&title);
        self.window.request_redraw();
    }

    // ── Actions ───────────────────────────────────────────────────────────

    fn activate(&self, hit: ChromeHit, event_loop: &ActiveEventLoop) {
        match hit {
            ChromeHit::Tab(index) => self.select_tab(index),
            ChromeHit::CloseTab(index) => self.close_tab(index, event_loop),
            ChromeHit::UrlField => self.urlbar.borrow_mut().focus(),
            ChromeHit::Button(button) => self.press(button),
        }
        self.sync_chrome();
    }

    fn press(&self, button: ToolbarButton) {
        match button {
            ToolbarButton::NewTab => self.open_tab(),
            ToolbarButton::Go => self.submit_url(),
            ToolbarButton::Back | ToolbarButton::Forward | ToolbarButton::Reload | ToolbarButton::Home => {
                let mut shell = self.shell.borrow_mut();
                let Some(id) = shell.active_id() else { return };
                match button {
                    ToolbarButton::Back => shell.go_back(id),
                    ToolbarButton::Forward => shell.go_forward(id),
                    ToolbarButton::Reload => shell.reload(id),
                    _ => shell.go_home(id),
                }
            }
        }
    }

    fn run_shortcut(&self, shortcut: Shortcut, event_loop: &ActiveEventLoop) {
        debug!(?shortcut, "Raccourci");
        match shortcut {
            Shortcut::FocusUrlBar => self.urlbar.borrow_mut().focus(),
            Shortcut::NewTab => self.press(ToolbarButton::NewTab),
            Shortcut::Reload => self.press(ToolbarButton::Reload),
            Shortcut::Back => self.press(ToolbarButton::Back),
            Shortcut::Forward => self.press(ToolbarButton::Forward),
            Shortcut::Home => self.press(ToolbarButton::Home),
            Shortcut::CloseTab => {
                let active = self.shell.borrow().active_index();
                if let Some(index) = active {
                    self.close_tab(index, event_loop);
                }
            }
            Shortcut::NextTab | Shortcut::PreviousTab => {
                self.urlbar.borrow_mut().unfocus();
                self.shell
                    .borrow_mut()
                    .cycle_surface(shortcut == Shortcut::PreviousTab);
                self.focus_active_webview();
            }
        }
        self.sync_chrome();
    }

    fn open_tab(&self) {
        self.urlbar.borrow_mut().unfocus();
        self.shell.borrow_mut().open_new_surface(None);
        self.focus_active_webview();
    }

    fn select_tab(&self, index: usize) {
        self.urlbar.borrow_mut().unfocus();
        self.shell.borrow_mut().select_surface(index);
        self.focus_active_webview();
    }

    /// Ferme l'onglet ; fermer le dernier ferme la fenêtre.
    fn close_tab(&self, index: usize, event_loop: &ActiveEventLoop) {
        self.urlbar.borrow_mut().unfocus();
        let now_empty = {
            let mut shell = self.shell.borrow_mut();
            shell.close_surface(index);
            shell.is_empty()
        };
        if now_empty {
            info!("Dernier onglet fermé");
            event_loop.exit();
            return;
        }
        self.focus_active_webview();
    }

    /// Charge le texte de la barre d'URL dans l'onglet actif.
    fn submit_url(&self) {
        let Some(text) = self.urlbar.borrow_mut().submit() else {
            return;
        };
        let mut shell = self.shell.borrow_mut();
        match shell.active_id() {
            Some(id) => shell.navigate_to(id, &text),
            None => {
                shell.open_new_surface(Some(&text));
            }
        }
    }

    // ── Entrées ───────────────────────────────────────────────────────────

    /// Position dans la WebView, ou `None` si le point est dans le chrome.
    fn webview_point(&self, point: DevicePoint) -> Option<DevicePoint> {
        let chrome_h = self.layout().height();
        (point.y >= chrome_h).then(|| DevicePoint::new(point.x, point.y - chrome_h))
    }

    fn on_mouse_input(
        &self,
        button_state: ElementState,
        button: WinitMouseButton,
        event_loop: &ActiveEventLoop,
    ) {
        let pos = self.cursor_position.get();
        let Some(point) = self.webview_point(pos) else {
            if button_state == ElementState::Pressed && button == WinitMouseButton::Left {
                if let Some(hit) = self.layout().hit_test(pos.x, pos.y) {
                    self.activate(hit, event_loop);
                } else if self.urlbar.borrow().is_focused() {
                    self.urlbar.borrow_mut().unfocus();
                    self.window.request_redraw();
                }
            }
            return;
        };

        if button_state == ElementState::Pressed && self.urlbar.borrow().is_focused() {
            self.urlbar.borrow_mut().unfocus();
            self.window.request_redraw();
        }

        let activates = button_state == ElementState::Pressed && button == WinitMouseButton::Left;
        let servo_button = match button {
            WinitMouseButton::Left => ServoMouseButton::Left,
            WinitMouseButton::Right => ServoMouseButton::Right,
            WinitMouseButton::Middle => ServoMouseButton::Middle,
            WinitMouseButton::Back => ServoMouseButton::Back,
            WinitMouseButton::Forward => ServoMouseButton::Forward,
            WinitMouseButton::Other(id) => ServoMouseButton::Other(id),
        };
        let action = match button_state {
            ElementState::Pressed => MouseButtonAction::Down,
            ElementState::Released => MouseButtonAction::Up,
        };
        self.with_active_surface(|surface| {
            if activates {
                surface.note_user_activation();
            }
            surface.webview().notify_input_event(InputEvent::MouseButton(MouseButtonEvent::new(
                action,
                servo_button,
                point.into(),
            )));
        });
    }

    fn on_keyboard_input(&self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        let mods = self.modifiers.get();

        if event.state == ElementState::Pressed
            && let Some(shortcut) = shortcut_for(&event.logical_key, mods)
        {
            self.run_shortcut(shortcut, event_loop);
            return;
        }

        if self.urlbar.borrow().is_focused() {
            if event.state == ElementState::Pressed {
                self.edit_urlbar(event, mods);
                self.window.request_redraw();
            }
            return;
        }

        let keyboard_event = keyboard_event_from_winit(event, mods);
        let activates = event.state == ElementState::Pressed
            && matches!(event.logical_key, Key::Named(NamedKey::Enter | NamedKey::Space));
        self.with_active_surface(|surface| {
            if activates {
                surface.note_user_activation();
            }
            surface.webview().notify_input_event(InputEvent::Keyboard(keyboard_event));
        });
    }

    fn edit_urlbar(&self, event: &KeyEvent, mods: ModifiersState) {
        let mut urlbar = self.urlbar.borrow_mut();
        match &event.logical_key {
            Key::Named(NamedKey::Enter) => {
                drop(urlbar);
                self.submit_url();
                self.focus_active_webview();
                self.sync_chrome();
            }
            Key::Named(NamedKey::Escape) => urlbar.unfocus(),
            Key::Named(NamedKey::Backspace) => urlbar.backspace(),
            Key::Named(NamedKey::Delete) => urlbar.delete(),
            Key::Named(NamedKey::ArrowLeft) => urlbar.move_cursor_left(),
            Key::Named(NamedKey::ArrowRight) => urlbar.move_cursor_right(),
            Key::Named(NamedKey::Home) => urlbar.home(),
            Key::Named(NamedKey::End) => urlbar.end(),
            Key::Named(NamedKey::Space) if !mods.control_key() => urlbar.insert_char(' '),
            Key::Character(c) if mods.control_key() => {
                if c.eq_ignore_ascii_case("a") {
                    urlbar.select_all();
                }
            }
            Key::Character(c) if !mods.alt_key() => urlbar.insert_str(c),
            _ => {}
        }
    }

    fn on_mouse_wheel(&self, delta: MouseScrollDelta) {
        let Some(point) = self.webview_point(self.cursor_position.get()) else {
            return;
        };
        let (x, y, mode) = match delta {
            MouseScrollDelta::LineDelta(dx, dy) => (
                (dx * LINE_HEIGHT) as f64,
                (dy * LINE_HEIGHT) as f64,
                WheelMode::DeltaLine,
            ),
            MouseScrollDelta::PixelDelta(delta) => (delta.x, delta.y, WheelMode::DeltaPixel),
        };
        self.with_active_webview(|webview| {
            webview.notify_input_event(InputEvent::Wheel(WheelEvent::new(
                WheelDelta { x, y, z: 0.0, mode },
                point.into(),
            )));
        });
    }

    fn on_cursor_moved(&self, point: DevicePoint) {
        self.cursor_position.set(point);
        if let Some(point) = self.webview_point(point) {
            self.with_active_webview(|webview| {
                webview.notify_input_event(InputEvent::MouseMove(MouseMoveEvent::new(point.into())));
            });
        }
    }

    fn on_resized(&self, new_size: PhysicalSize<u32>) {
        self.window_rendering_context.resize(new_size);
        let size = rendering::webview_size(new_size, chrome_height(&self.config));
        let shell = self.shell.borrow();
        shell.engine().set_viewport(size);
        for surface in shell.surfaces() {
            surface.backend().resize(size);
        }
    }

    // ── Rendu ─────────────────────────────────────────────────────────────

    /// Peint l'onglet actif dans son FBO, le blitte sous le chrome, puis
    /// dessine le chrome par-dessus.
    fn redraw(&self) {
        let inner_size = self.window.inner_size();
        let chrome_h = chrome_height(&self.config);
        let shell = self.shell.borrow();

        self.window_rendering_context.prepare_for_rendering();

        if let Some(surface) = shell.active_surface() {
            let backend = surface.backend();
            backend.webview().paint();
            if let Some(blit) = backend.rendering_context().render_to_parent_callback() {
                let gl = self.window_rendering_context.glow_gl_api();
                // Origine GL en bas à gauche : la zone web commence à y = 0.
                let target_rect = euclid::default::Rect::new(
                    euclid::default::Point2D::new(0, 0),
                    euclid::default::Size2D::new(
                        inner_size.width as i32,
                        inner_size.height.saturating_sub(chrome_h) as i32,
                    ),
                );
                blit(&gl, target_rect);
            }
        }

        let labels: Vec<&str> = shell.surfaces().iter().map(|s| s.label()).collect();
        let layout = ChromeLayout::compute(inner_size.width, labels.len(), &self.config.chrome);
        let urlbar = self.urlbar.borrow();
        let frame = ChromeFrame {
            layout: &layout,
            tab_labels: &labels,
            active_tab: shell.active_index(),
            url_text: urlbar.display_text(),
            url_badge: urlbar.badge(),
            url_focused: urlbar.is_focused(),
            cursor_char_offset: urlbar.cursor_char_offset(),
        };
        unsafe {
            self.chrome.draw(inner_size.width, inner_size.height, &frame);
        }

        self.window_rendering_context.present();
    }
}

fn chrome_height(config: &Config) -> u32 {
    config.chrome.tab_strip_height + config.chrome.toolbar_height
}

// ─────────────────────────────────────────────────────────────────────────────
// App : enum deux phases
// ─────────────────────────────────────────────────────────────────────────────

pub enum App {
    /// Phase pré-initialisation : on attend que Winit appelle `resumed()`.
    Initial {
        waker: Waker,
        config: Config,
        blocklist: Arc<BlockList>,
    },

    /// Phase opérationnelle.
    Running(Box<AppState>),
}

impl App {
    pub fn new(event_loop: &EventLoop<WakerEvent>, config: Config, blocklist: Arc<BlockList>) -> Self {
        Self::Initial {
            waker: Waker::new(event_loop),
            config,
            blocklist,
        }
    }
}

impl ApplicationHandler<WakerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Self::Initial {
            waker,
            config,
            blocklist,
        } = self
        else {
            return;
        };

        match AppState::start(event_loop, waker.clone(), config.clone(), blocklist.clone()) {
            Ok(state) => *self = Self::Running(Box::new(state)),
            Err(error) => {
                error!(%error, "Impossible de démarrer la fenêtre");
                event_loop.exit();
            }
        }
    }

    /// Un `WakerEvent` arrive depuis les threads Servo.
    fn user_event(&mut self, _event_loop: &ActiveEventLoop, _event: WakerEvent) {
        if let Self::Running(state) = self {
            state.pump();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Self::Running(state) = self else {
            return;
        };
        // Toujours faire tourner la boucle Servo en premier.
        state.pump();

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested => state.redraw(),
            WindowEvent::Resized(new_size) => state.on_resized(new_size),
            WindowEvent::ModifiersChanged(modifiers) => state.modifiers.set(modifiers.state()),
            WindowEvent::CursorMoved { position, .. } => {
                state.on_cursor_moved(DevicePoint::new(position.x as f32, position.y as f32));
            }
            WindowEvent::CursorLeft { .. } => state.with_active_webview(|webview| {
                webview.notify_input_event(InputEvent::MouseLeftViewport(
                    MouseLeftViewportEvent::default(),
                ));
            }),
            WindowEvent::MouseWheel { delta, .. } => state.on_mouse_wheel(delta),
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => state.on_mouse_input(button_state, button, event_loop),
            WindowEvent::KeyboardInput { event, .. } => state.on_keyboard_input(&event, event_loop),
            _ => (),
        }
    }
}
