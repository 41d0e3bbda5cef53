//! # Daemon Search : navigateur à onglets minimal
//!
//! Fenêtre unique sur le moteur Servo : bande d'onglets, barre d'outils
//! (précédent, suivant, recharger, accueil, nouvel onglet), barre d'URL, et
//! un filtre qui bloque les requêtes vers les domaines publicitaires listés
//! dans `adservers.txt`.
//!
//! ## Architecture des modules
//!
//! Logique pure, testable sans moteur ni fenêtre :
//!
//! - [`blocklist`] : chargement et recherche par sous-chaîne dans la liste.
//! - [`filter`] : décision autoriser/bloquer par requête.
//! - [`surface`] : un onglet, ses événements et les traits [`surface::Engine`]
//!   / [`surface::SurfaceBackend`] derrière lesquels le moteur se cache.
//! - [`shell`] : la collection d'onglets et les commandes de navigation.
//! - [`toolbar`] : géométrie du chrome et hit-testing.
//! - [`urlbar`] : édition du texte de la barre d'URL.
//! - [`config`] : `config.toml`.
//!
//! Intégration :
//!
//! - [`browser`] : boucle d'événements Winit, pattern "Two-Phase App".
//! - [`servo_glue`] : `Waker`, implémentation Servo des traits moteur,
//!   délégué par onglet qui applique le filtre.
//! - [`chrome`] : rendu GL du chrome (glow + fontdue).
//! - [`rendering`] : contextes de rendu surfman.
//! - [`preferences`], [`resources`], [`keyutils`], [`icon`] : plomberie Servo
//!   et Winit.

pub mod blocklist;
pub mod browser;
pub mod chrome;
pub mod config;
pub mod filter;
pub mod icon;
pub mod keyutils;
pub mod preferences;
pub mod rendering;
pub mod resources;
pub mod servo_glue;
pub mod shell;
pub mod surface;
pub mod toolbar;
pub mod urlbar;
