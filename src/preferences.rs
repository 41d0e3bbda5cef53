//! Servo engine preferences built from the `[servo]` and `[privacy]` config sections.
//!
//! - Thread pools sized to available CPU cores (clamped)
//! - HTTPS enforcement, MIME sniffing, tracking APIs and web storage per config

use tracing::info;

use crate::config::Config;

/// Builds Servo `Preferences` for the current machine and `config`.
#[allow(clippy::field_reassign_with_default)]
pub fn build_servo_preferences(config: &Config) -> servo::Preferences {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get() as i64)
        .unwrap_or(4);

    let mut prefs = servo::Preferences::default();

    // ── Performance Tuning ────────────────────────────────────────────────
    prefs.layout_threads = if config.servo.layout_threads > 0 {
        config.servo.layout_threads
    } else {
        cpus.min(8)
    };
    prefs.threadpools_async_runtime_workers_max = (cpus * 2).min(16);
    prefs.threadpools_image_cache_workers_max = cpus.min(8);
    prefs.threadpools_webrender_workers_max = (cpus / 2).clamp(2, 8);
    prefs.threadpools_resource_workers_max = cpus.min(8);
    prefs.network_http_cache_size = config.servo.cache_size;
    prefs.gfx_precache_shaders = config.servo.precache_shaders;

    if !config.servo.user_agent.is_empty() {
        prefs.user_agent = config.servo.user_agent.clone();
    }

    // ── Privacy ───────────────────────────────────────────────────────────
    let privacy = &config.privacy;
    prefs.network_enforce_tls_enabled = privacy.enforce_tls;
    prefs.network_mime_sniff = !privacy.disable_mime_sniff;
    prefs.dom_geolocation_enabled = !privacy.disable_geolocation;
    prefs.dom_bluetooth_enabled = !privacy.disable_bluetooth;
    prefs.dom_notification_enabled = !privacy.disable_notifications;
    prefs.dom_webrtc_enabled = !privacy.disable_webrtc;
    prefs.dom_indexeddb_enabled = !privacy.disable_web_storage;
    prefs.dom_serviceworker_enabled = !privacy.disable_web_storage;

    info!(
        cpus,
        layout_threads = prefs.layout_threads,
        cache_size = prefs.network_http_cache_size,
        tls_enforced = prefs.network_enforce_tls_enabled,
        "Servo preferences configured"
    );

    prefs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_layout_threads_bounded() {
        let prefs = build_servo_preferences(&Config::default());
        assert!(prefs.layout_threads >= 1);
        assert!(prefs.layout_threads <= 8);
    }

    #[test]
    fn test_explicit_layout_threads() {
        let mut config = Config::default();
        config.servo.layout_threads = 3;
        assert_eq!(build_servo_preferences(&config).layout_threads, 3);
    }

    #[test]
    fn test_privacy_defaults_applied() {
        let prefs = build_servo_preferences(&Config::default());
        assert!(prefs.network_enforce_tls_enabled);
        assert!(!prefs.network_mime_sniff);
        assert!(!prefs.dom_geolocation_enabled);
        assert!(!prefs.dom_bluetooth_enabled);
        assert!(!prefs.dom_notification_enabled);
        assert!(!prefs.dom_webrtc_enabled);
        assert!(!prefs.dom_indexeddb_enabled);
        assert!(!prefs.dom_serviceworker_enabled);
    }

    #[test]
    fn test_web_storage_can_be_enabled() {
        let mut config = Config::default();
        config.privacy.disable_web_storage = false;
        let prefs = build_servo_preferences(&config);
        assert!(prefs.dom_indexeddb_enabled);
        assert!(prefs.dom_serviceworker_enabled);
    }

    #[test]
    fn test_privacy_toggles_follow_config() {
        let mut config = Config::default();
        config.privacy.enforce_tls = false;
        config.privacy.disable_webrtc = false;
        let prefs = build_servo_preferences(&config);
        assert!(!prefs.network_enforce_tls_enabled);
        assert!(prefs.dom_webrtc_enabled);
    }

    #[test]
    fn test_custom_user_agent() {
        let mut config = Config::default();
        config.servo.user_agent = "DaemonSearch/0.1".into();
        assert_eq!(build_servo_preferences(&config).user_agent, "DaemonSearch/0.1");
    }

    #[test]
    fn test_cache_and_shaders_from_config() {
        let mut config = Config::default();
        config.servo.cache_size = 1234;
        config.servo.precache_shaders = false;
        let prefs = build_servo_preferences(&config);
        assert_eq!(prefs.network_http_cache_size, 1234);
        assert!(!prefs.gfx_precache_shaders);
    }
}
