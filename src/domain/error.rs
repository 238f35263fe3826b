//! Error types for the Mascotas plugin.
//!
//! This module defines the centralized error type [`MascotasError`], the
//! client-side [`ValidationError`] whose messages are shown to the user as-is,
//! and a [`Result`] alias used throughout the crate. Both enums are built on
//! `thiserror`.
//!
//! Errors fall into three user-facing groups:
//!
//! - **Validation**: detected before any request leaves the plugin
//! - **Backend**: anything the collaborator rejected, surfaced verbatim
//! - **Precondition**: a view needs a signed-in identity and there is none
//!
//! Everything else (I/O, storage file corruption, worker transport) is an
//! infrastructure failure that ends up as a `Backend` message once it crosses
//! the worker boundary.

use thiserror::Error;

/// Input problems caught before contacting the collaborator.
///
/// The `Display` text of each variant is the exact message rendered in the
/// form banner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The selected file does not carry an `image/*` MIME type.
    #[error("El archivo seleccionado no es una imagen")]
    NotAnImage,

    /// The selected image exceeds the upload limit.
    #[error("La imagen no puede superar los 5 MB")]
    ImageTooLarge,

    /// A submission was attempted without a photo.
    #[error("Debes seleccionar una foto")]
    MissingImage,

    /// A required form field is blank. Carries the field label.
    #[error("El campo {0} es obligatorio")]
    MissingField(&'static str),

    /// The email field does not look like an address.
    #[error("Ingresa un correo electrónico válido")]
    InvalidEmail,

    /// Registration password shorter than the minimum.
    #[error("La contraseña debe tener al menos 6 caracteres")]
    PasswordTooShort,

    /// Registration password and confirmation differ.
    #[error("Las contraseñas no coinciden")]
    PasswordMismatch,
}

/// The main error type for Mascotas operations.
///
/// # Examples
///
/// ```
/// use mascotas::domain::MascotasError;
///
/// let err = MascotasError::Backend("Invalid login credentials".to_string());
/// assert_eq!(err.to_string(), "Invalid login credentials");
/// ```
#[derive(Debug, Error)]
pub enum MascotasError {
    /// Client-side validation failed. No request was issued.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The collaborator returned an error. The message is shown verbatim.
    #[error("{0}")]
    Backend(String),

    /// An operation needs an authenticated identity and none is present.
    ///
    /// Views react to this with a redirect rather than an error banner.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The local collaborator's data file could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem or I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Theme parsing or application failed.
    #[error("Theme error: {0}")]
    Theme(String),

    /// Communication with the background worker failed.
    #[error("Worker communication error: {0}")]
    Worker(String),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MascotasError {
    /// Returns the text to put in a form's message field.
    ///
    /// Validation and backend errors keep their own wording; infrastructure
    /// failures keep their prefixed description so they remain diagnosable.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Whether this error should trigger a redirect instead of a banner.
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

/// A specialized `Result` type for Mascotas operations.
pub type Result<T> = std::result::Result<T, MascotasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_is_verbatim() {
        let err = MascotasError::Backend("duplicate key value".to_string());
        assert_eq!(err.user_message(), "duplicate key value");
    }

    #[test]
    fn validation_message_passes_through() {
        let err: MascotasError = ValidationError::PasswordMismatch.into();
        assert_eq!(err.user_message(), "Las contraseñas no coinciden");
        assert!(!err.is_precondition());
    }

    #[test]
    fn missing_field_names_the_field() {
        let err = ValidationError::MissingField("Ubicación");
        assert_eq!(err.to_string(), "El campo Ubicación es obligatorio");
    }
}
