//! TOML-based configuration system.
//!
//! Loads settings from a `config.toml` file, falling back to defaults for
//! anything missing. Every struct is `#[serde(default)]`, so a missing or
//! partial file behaves like the built-in values.
//!
//! ## Config file search order
//!
//! 1. `DAEMON_SEARCH_CONFIG` environment variable (explicit override)
//! 2. Next to the executable (`<exe_dir>/config.toml`)
//! 3. Platform config directory (`%APPDATA%\DaemonSearch\config.toml` on Windows,
//!    `$XDG_CONFIG_HOME/daemon-search/config.toml` elsewhere)
//! 4. Current working directory (`./config.toml`)
//! 5. No file found → `Config::default()`

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

/// Homepage used when the config has none, or an unparseable one.
pub const DEFAULT_HOMEPAGE: &str = "https://duckduckgo.com/";

// ─────────────────────────────────────────────────────────────────────────────
// Config structs
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub window: WindowConfig,
    pub chrome: ChromeConfig,
    pub resources: ResourcesConfig,
    pub servo: ServoConfig,
    pub privacy: PrivacyConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Loaded by Home, by new tabs and at startup.
    pub homepage: String,
    pub window_title: String,
}

/// Window dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
}

/// Chrome (tab strip + toolbar) geometry and appearance, in physical pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeConfig {
    pub tab_strip_height: u32,
    pub toolbar_height: u32,
    pub font_size: f32,
    pub text_left_pad: f32,
    pub bar_margin: f32,
    pub button_width: f32,
    pub tab_width: f32,
    pub colors: ChromeColors,
}

/// RGBA colors for the chrome UI (values 0.0–1.0).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeColors {
    pub background: [f32; 4],
    pub background_focused: [f32; 4],
    pub text: [f32; 4],
    pub cursor: [f32; 4],
    pub bar_background: [f32; 4],
    pub bar_border: [f32; 4],
    pub button: [f32; 4],
    pub tab: [f32; 4],
    pub tab_active: [f32; 4],
}

/// Files read at startup. Relative paths are resolved against the working
/// directory, then the resources directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// One blocked substring per line.
    pub blocklist: PathBuf,
    /// PNG window icon.
    pub icon: PathBuf,
    /// TrueType font for the chrome, relative to the resources directory.
    pub font: PathBuf,
}

/// Servo engine performance tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Maximum layout threads. 0 = auto-detect from CPU count.
    pub layout_threads: i64,
    /// HTTP cache size in bytes.
    pub cache_size: i64,
    /// User-agent string. Empty = engine default.
    pub user_agent: String,
    /// Pre-cache GPU shaders at startup.
    pub precache_shaders: bool,
}

/// Privacy and security toggles forwarded to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    pub enforce_tls: bool,
    pub disable_mime_sniff: bool,
    pub disable_geolocation: bool,
    pub disable_bluetooth: bool,
    pub disable_notifications: bool,
    pub disable_webrtc: bool,
    /// No IndexedDB or service workers: nothing a page stores outlives the session.
    pub disable_web_storage: bool,
    /// `file://` pages may not fetch sub-resources over the network.
    pub isolate_local_content: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            homepage: DEFAULT_HOMEPAGE.to_string(),
            window_title: "Daemon Search".to_string(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            tab_strip_height: 30,
            toolbar_height: 40,
            font_size: 15.0,
            text_left_pad: 10.0,
            bar_margin: 6.0,
            button_width: 34.0,
            tab_width: 200.0,
            colors: ChromeColors::default(),
        }
    }
}

impl Default for ChromeColors {
    fn default() -> Self {
        // Dark theme, page background is rgb(30, 30, 30).
        Self {
            background: [0.12, 0.12, 0.12, 1.0],
            background_focused: [0.18, 0.18, 0.18, 1.0],
            text: [0.9, 0.9, 0.9, 1.0],
            cursor: [1.0, 1.0, 1.0, 1.0],
            bar_background: [0.08, 0.08, 0.08, 1.0],
            bar_border: [0.3, 0.3, 0.3, 1.0],
            button: [0.2, 0.2, 0.2, 1.0],
            tab: [0.15, 0.15, 0.15, 1.0],
            tab_active: [0.25, 0.25, 0.25, 1.0],
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            blocklist: PathBuf::from("adservers.txt"),
            icon: PathBuf::from("mask.png"),
            font: PathBuf::from("fonts/Inter-Regular.ttf"),
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            layout_threads: 0,
            cache_size: 50_000,
            user_agent: String::new(),
            precache_shaders: true,
        }
    }
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            enforce_tls: true,
            disable_mime_sniff: true,
            disable_geolocation: true,
            disable_bluetooth: true,
            disable_notifications: true,
            disable_webrtc: true,
            disable_web_storage: true,
            isolate_local_content: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Loads configuration from a TOML file. Never panics: returns defaults
    /// if no file is found or if parsing fails.
    pub fn load() -> Self {
        match find_config_path() {
            Some(path) => match fs::read_to_string(&path) {
                Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                    warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                    Config::default()
                }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot read config, using defaults");
                    Config::default()
                }
            },
            None => {
                info!("No config file found, using defaults");
                Config::default()
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// The configured homepage, or [`DEFAULT_HOMEPAGE`] if it does not parse.
    pub fn homepage_url(&self) -> Url {
        crate::shell::normalize_url(&self.general.homepage).unwrap_or_else(|| {
            warn!(
                homepage = %self.general.homepage,
                "Invalid homepage in config, using default"
            );
            Url::parse(DEFAULT_HOMEPAGE).expect("DEFAULT_HOMEPAGE is a valid URL")
        })
    }
}

/// Searches for a config file in the standard locations.
fn find_config_path() -> Option<PathBuf> {
    // 1. Explicit env var override
    if let Ok(path) = std::env::var("DAEMON_SEARCH_CONFIG") {
        let p = PathBuf::from(path);
        if p.is_file() {
            return Some(p);
        }
    }

    // 2. Next to the executable
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // 3. Platform config directory
    if let Some(dir) = platform_config_dir() {
        let p = dir.join("config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // 4. Current working directory
    let p = PathBuf::from("config.toml");
    if p.is_file() {
        return Some(p);
    }

    None
}

/// Returns the platform config directory without adding a dependency.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join("DaemonSearch"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .or_else(|| std::env::var("HOME").ok().map(|h| format!("{h}/.config")))
            .map(|dir| PathBuf::from(dir).join("daemon-search"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.general.homepage, "https://duckduckgo.com/");
        assert_eq!(c.general.window_title, "Daemon Search");
        assert_eq!(c.window.width, 1024);
        assert_eq!(c.window.height, 768);
        assert_eq!(c.resources.blocklist, PathBuf::from("adservers.txt"));
        assert_eq!(c.resources.icon, PathBuf::from("mask.png"));
        assert!(c.privacy.enforce_tls);
    }

    #[test]
    fn test_empty_toml_returns_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.chrome.toolbar_height, 40);
        assert_eq!(config.chrome.tab_strip_height, 30);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml = r#"
[general]
homepage = "https://example.org/"

[resources]
blocklist = "/etc/daemon-search/hosts.txt"
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.general.homepage, "https://example.org/");
        assert_eq!(config.general.window_title, "Daemon Search");
        assert_eq!(
            config.resources.blocklist,
            PathBuf::from("/etc/daemon-search/hosts.txt")
        );
        assert_eq!(config.resources.icon, PathBuf::from("mask.png"));
    }

    #[test]
    fn test_color_arrays_parse() {
        let toml = r#"
[chrome.colors]
tab_active = [0.1, 0.2, 0.3, 1.0]
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.chrome.colors.tab_active, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(config.chrome.colors.text, [0.9, 0.9, 0.9, 1.0]);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(Config::from_toml("[window]\nwidth = \"wide\"").is_err());
    }

    #[test]
    fn test_homepage_without_scheme_is_normalized() {
        let mut config = Config::default();
        config.general.homepage = "example.org".into();
        assert_eq!(config.homepage_url().as_str(), "https://example.org/");
    }

    #[test]
    fn test_invalid_homepage_falls_back() {
        let mut config = Config::default();
        config.general.homepage = "not a homepage".into();
        assert_eq!(config.homepage_url().as_str(), DEFAULT_HOMEPAGE);
    }
}
