//! Recherche du dossier `resources/` et lecteur de ressources Servo.
//!
//! Le dossier `resources/` contient les fichiers exigés par Servo
//! (préférences, certificats, domaines publics...) ainsi que la police du
//! chrome. La block-list et l'icône peuvent aussi y être placées.
//!
//! Ordre de recherche :
//! 1. Variable d'environnement `DAEMON_SEARCH_RESOURCES`
//! 2. À côté de l'exécutable (`<exe_dir>/resources/`)
//! 3. Racine du projet si l'exécutable est dans `target/{debug,release}/`
//! 4. Répertoire courant (`./resources/`)

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::{env, fs};

use servo::resources::{self, Resource};
use tracing::{error, warn};

/// Chemin vers le dossier resources/, mis en cache après la première résolution.
static RESOURCES_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Installe le lecteur de ressources Servo.
///
/// **Doit être appelé avant `ServoBuilder::build()`**.
pub fn init() {
    resources::set(Box::new(ResourceReader));
}

/// Cherche `relative` dans le dossier resources/.
pub fn locate(relative: &Path) -> Option<PathBuf> {
    let path = resources_dir()?.join(relative);
    path.is_file().then_some(path)
}

/// Résout un chemin de fichier configuré (block-list, icône, police).
///
/// Un chemin absolu ou existant depuis le répertoire courant est pris tel
/// quel ; sinon on le cherche dans resources/. À défaut, le chemin configuré
/// est rendu pour que le diagnostic « introuvable » le nomme.
pub fn resolve(configured: &Path) -> PathBuf {
    if configured.is_absolute() || configured.is_file() {
        return configured.to_path_buf();
    }
    locate(configured).unwrap_or_else(|| configured.to_path_buf())
}

struct ResourceReader;

impl resources::ResourceReaderMethods for ResourceReader {
    fn read(&self, file: Resource) -> Vec<u8> {
        let Some(dir) = resources_dir() else {
            error!(file = file.filename(), "Dossier resources/ introuvable");
            return Vec::new();
        };

        match read_inside(&dir, Path::new(file.filename())) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(file = file.filename(), error = %e, "Impossible de lire la ressource Servo");
                Vec::new()
            }
        }
    }

    fn sandbox_access_files_dirs(&self) -> Vec<PathBuf> {
        resources_dir().into_iter().collect()
    }

    fn sandbox_access_files(&self) -> Vec<PathBuf> {
        vec![]
    }
}

/// Lit `relative` sous `dir`, en refusant tout chemin qui, une fois
/// canonicalisé, sort de `dir`.
fn read_inside(dir: &Path, relative: &Path) -> std::io::Result<Vec<u8>> {
    let root = dir.canonicalize()?;
    let canonical = dir.join(relative).canonicalize()?;
    if !canonical.starts_with(&root) {
        return Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("path escapes resources dir: {}", canonical.display()),
        ));
    }
    fs::read(canonical)
}

/// Résout et met en cache le chemin du dossier `resources/`.
pub fn resources_dir() -> Option<PathBuf> {
    let mut cached = RESOURCES_DIR.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(ref path) = *cached {
        return Some(path.clone());
    }
    let found = search_resources_dir();
    if found.is_none() {
        warn!("Dossier resources/ introuvable. Définissez DAEMON_SEARCH_RESOURCES.");
    }
    cached.clone_from(&found);
    found
}

fn search_resources_dir() -> Option<PathBuf> {
    // 1. Variable d'environnement
    if let Ok(path) = env::var("DAEMON_SEARCH_RESOURCES") {
        let path = PathBuf::from(path);
        if path.is_dir() {
            return Some(path);
        }
    }

    // 2. À côté de l'exécutable
    if let Ok(exe_path) = env::current_exe()
        && let Ok(canonical) = exe_path.canonicalize()
    {
        let exe_dir = canonical.parent().unwrap_or(&canonical);
        let path = exe_dir.join("resources");
        if path.is_dir() {
            return Some(path);
        }

        // 3. target/{debug,release}/ → racine du projet
        if let Some(target_dir) = exe_dir.parent()
            && target_dir.file_name().is_some_and(|n| n == "target")
            && let Some(project_root) = target_dir.parent()
        {
            let path = project_root.join("resources");
            if path.is_dir() {
                return Some(path);
            }
        }
    }

    // 4. Répertoire courant
    let path = env::current_dir().ok()?.join("resources");
    path.is_dir().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_inside_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("prefs.json"), b"{}").unwrap();
        assert_eq!(read_inside(dir.path(), Path::new("prefs.json")).unwrap(), b"{}");
    }

    #[test]
    fn test_read_inside_rejects_traversal() {
        let outer = tempfile::tempdir().unwrap();
        let inner = outer.path().join("resources");
        fs::create_dir(&inner).unwrap();
        fs::write(outer.path().join("secret.txt"), b"nope").unwrap();

        let err = read_inside(&inner, Path::new("../secret.txt")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_resolve_keeps_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adservers.txt");
        assert_eq!(resolve(&path), path);
    }

    #[test]
    fn test_resolve_unknown_relative_is_unchanged() {
        let path = Path::new("definitely-not-here/adservers.txt");
        assert_eq!(resolve(path), path);
    }

    #[test]
    fn test_read_inside_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_inside(dir.path(), Path::new("absent.txt")).is_err());
    }
}
