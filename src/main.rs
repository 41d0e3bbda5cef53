//! Point d'entrée de Daemon Search.
//!
//! Pas d'arguments : la page d'accueil et les chemins viennent de
//! `config.toml` (voir [`daemon_search::config`]).
//!
//! ```text
//! RUST_LOG=daemon_search=debug cargo run --release
//! ```

use std::error::Error;
use std::sync::Arc;

use daemon_search::blocklist::BlockList;
use daemon_search::browser::App;
use daemon_search::config::Config;
use daemon_search::resources;
use winit::event_loop::EventLoop;

fn main() -> Result<(), Box<dyn Error>> {
    // ── 1. Logging / Tracing ───────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    #[cfg(debug_assertions)]
    tracing::warn!("Build DEBUG : les pages chargent très lentement, préférez `cargo run --release`.");

    // ── 2. Provider crypto TLS ─────────────────────────────────────────
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| "un provider crypto rustls est déjà installé")?;

    // ── 3. Lecteur de ressources Servo ─────────────────────────────────
    resources::init();

    // ── 4. Configuration et block-list (lue une seule fois) ───────────
    let config = Config::load();
    let blocklist = Arc::new(BlockList::load(&resources::resolve(&config.resources.blocklist)));

    // ── 5. Boucle d'événements Winit ───────────────────────────────────
    let event_loop = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config, blocklist);

    Ok(event_loop.run_app(&mut app)?)
}
