//! Selected photo files and their upload constraints.

use super::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Maximum accepted image size in bytes (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// A photo picked by the user, fully read into memory.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    /// File name as selected, without directories.
    pub file_name: String,
    /// MIME type derived from the extension.
    pub mime_type: String,
    #[serde(with = "crate::backend::request::base64_bytes")]
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Builds an image from a file name and its contents, guessing the MIME
    /// type from the extension.
    pub fn from_name(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_from_file_name(&file_name).to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Lowercase extension of the file name, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /// Checks MIME type and size.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAnImage`] for non-`image/*` types and
    /// [`ValidationError::ImageTooLarge`] above [`MAX_IMAGE_BYTES`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.mime_type.starts_with("image/") {
            return Err(ValidationError::NotAnImage);
        }
        if self.size() > MAX_IMAGE_BYTES {
            return Err(ValidationError::ImageTooLarge);
        }
        Ok(())
    }

    /// Random object name for the upload, keeping the original extension.
    #[must_use]
    pub fn random_object_name(&self) -> String {
        let stem = uuid::Uuid::new_v4();
        match self.extension() {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_string(),
        }
    }
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Maps a file name to a MIME type by extension.
///
/// Unknown extensions map to `application/octet-stream`, which fails the
/// image check.
#[must_use]
pub fn mime_from_file_name(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_images() {
        let file = ImageFile::from_name("notas.txt", b"hola".to_vec());
        assert_eq!(file.validate(), Err(ValidationError::NotAnImage));
    }

    #[test]
    fn rejects_oversized_images() {
        let file = ImageFile::from_name("grande.png", vec![0; MAX_IMAGE_BYTES + 1]);
        assert_eq!(file.validate(), Err(ValidationError::ImageTooLarge));
    }

    #[test]
    fn accepts_image_at_the_limit() {
        let file = ImageFile::from_name("justo.JPG", vec![0; MAX_IMAGE_BYTES]);
        assert_eq!(file.mime_type, "image/jpeg");
        assert!(file.validate().is_ok());
    }

    #[test]
    fn object_name_keeps_extension() {
        let file = ImageFile::from_name("Firulais.JPEG", vec![1, 2, 3]);
        let name = file.random_object_name();
        assert!(name.ends_with(".jpeg"));
        assert_ne!(name, file.random_object_name());
    }
}
