//! Window icon loading.
//!
//! Best-effort: a missing or undecodable file leaves the window without an
//! icon and logs a warning.

use std::path::Path;

use tracing::{info, warn};
use winit::window::Icon;

/// Decoded RGBA8 pixels, ready for `Icon::from_rgba`.
#[derive(Debug)]
pub struct IconPixels {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Reads and decodes the image at `path`.
pub fn decode(path: &Path) -> Option<IconPixels> {
    let image = match image::open(path) {
        Ok(image) => image.into_rgba8(),
        Err(error) => {
            warn!(path = %path.display(), %error, "Window icon not loaded");
            return None;
        }
    };
    let (width, height) = image.dimensions();
    Some(IconPixels {
        rgba: image.into_raw(),
        width,
        height,
    })
}

/// Loads the window icon at `path`, if possible.
pub fn load(path: &Path) -> Option<Icon> {
    let pixels = decode(path)?;
    match Icon::from_rgba(pixels.rgba, pixels.width, pixels.height) {
        Ok(icon) => {
            info!(path = %path.display(), "Window icon loaded");
            Some(icon)
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "Window icon rejected");
            None
        }
    }
}
