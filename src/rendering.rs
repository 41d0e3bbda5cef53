//! Contextes de rendu GPU.
//!
//! Un `WindowRenderingContext` couvre toute la fenêtre (chrome + blit).
//! Chaque onglet peint dans un `OffscreenRenderingContext` qui en dérive
//! (voir [`crate::servo_glue::ServoEngine`]).

use std::fmt;
use std::rc::Rc;

use servo::{RenderingContext, WindowRenderingContext};
use winit::dpi::PhysicalSize;
use winit::raw_window_handle::{DisplayHandle, WindowHandle};

#[derive(Debug)]
pub enum RenderingError {
    /// Pas de contexte OpenGL pour cette fenêtre (driver, handles).
    Create(String),
    MakeCurrent(String),
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(e) => write!(f, "impossible de créer le contexte OpenGL : {e}"),
            Self::MakeCurrent(e) => write!(f, "impossible de rendre le contexte OpenGL courant : {e}"),
        }
    }
}

impl std::error::Error for RenderingError {}

/// Crée le contexte de rendu lié à la fenêtre Winit et le rend courant,
/// ce qui est requis avant de créer des WebViews.
pub fn create_rendering_context(
    display_handle: DisplayHandle<'_>,
    window_handle: WindowHandle<'_>,
    size: PhysicalSize<u32>,
) -> Result<Rc<WindowRenderingContext>, RenderingError> {
    let rendering_context = WindowRenderingContext::new(display_handle, window_handle, size)
        .map_err(|e| RenderingError::Create(format!("{e:?}")))?;

    rendering_context
        .make_current()
        .map_err(|e| RenderingError::MakeCurrent(format!("{e:?}")))?;

    Ok(Rc::new(rendering_context))
}

/// Taille de la zone web : la fenêtre moins le chrome, jamais nulle.
pub fn webview_size(window_size: PhysicalSize<u32>, chrome_height: u32) -> PhysicalSize<u32> {
    PhysicalSize::new(
        window_size.width.max(1),
        window_size.height.saturating_sub(chrome_height).max(1),
    )
}
