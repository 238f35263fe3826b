//! Host file access used by the plugin shim.
//!
//! - photo files typed into the publish form
//! - the hosted collaborator's access token (`session.json`), the equivalent
//!   of a browser SDK's persisted session

use super::paths::{expand_tilde, strip_host_prefix};
use crate::domain::error::{MascotasError, Result};
use crate::domain::image::mime_from_file_name;
use crate::domain::{ImageFile, ValidationError, MAX_IMAGE_BYTES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the persisted hosted session.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Reads a photo from a user-typed path. The MIME type is derived from the
/// extension. Type and size are checked against the file's metadata before
/// any byte is read.
///
/// # Errors
///
/// Returns [`ValidationError::NotAnImage`] or [`ValidationError::ImageTooLarge`]
/// for rejected files, and an I/O error if the file cannot be read.
pub fn load_image(typed_path: &str) -> Result<ImageFile> {
    let resolved = expand_tilde(typed_path);
    let _span = tracing::debug_span!("load_image", path = %strip_host_prefix(&resolved)).entered();

    let file_name = Path::new(&resolved)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(typed_path)
        .to_string();

    if !mime_from_file_name(&file_name).starts_with("image/") {
        return Err(ValidationError::NotAnImage.into());
    }
    let size = fs::metadata(&resolved)?.len();
    if usize::try_from(size).map_or(true, |size| size > MAX_IMAGE_BYTES) {
        tracing::debug!(size, "photo too large, not read");
        return Err(ValidationError::ImageTooLarge.into());
    }

    let bytes = fs::read(&resolved)?;

    tracing::debug!(size = bytes.len(), "photo read");
    Ok(ImageFile::from_name(file_name, bytes))
}

#[derive(Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
}

/// Persists the hosted access token across plugin reloads.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Stored token, or `None` if absent or unreadable.
    #[must_use]
    pub fn load(&self) -> Option<String> {
        let contents = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<StoredSession>(&contents) {
            Ok(stored) => Some(stored.access_token),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable session file");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, access_token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(&StoredSession {
            access_token: access_token.to_string(),
        })
        .map_err(|e| MascotasError::Storage(e.to_string()))?;

        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join(SESSION_FILE_NAME));
        assert_eq!(store.load(), None);

        store.save("tok-123").unwrap();
        assert_eq!(store.load().as_deref(), Some("tok-123"));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn loads_absolute_image_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("luna.JPG");
        fs::write(&path, [0xff, 0xd8]).unwrap();

        let image = load_image(path.to_str().unwrap()).unwrap();
        assert_eq!(image.file_name, "luna.JPG");
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.size(), 2);
    }

    #[test]
    fn oversized_and_non_image_files_are_rejected_unread() {
        let dir = tempfile::tempdir().unwrap();
        let huge = dir.path().join("enorme.png");
        let file = fs::File::create(&huge).unwrap();
        file.set_len(2 * 1024 * 1024 * 1024).unwrap();

        let err = load_image(huge.to_str().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "La imagen no puede superar los 5 MB");

        let notes = dir.path().join("notas.txt");
        fs::write(&notes, b"hola").unwrap();
        let err = load_image(notes.to_str().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "El archivo seleccionado no es una imagen");
    }

    #[test]
    fn missing_image_is_an_io_error() {
        let err = load_image("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, MascotasError::Io(_)));
    }
}
