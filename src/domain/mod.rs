//! Domain layer for the Mascotas plugin.
//!
//! Core types shared by every other layer, independent of Zellij APIs and of
//! which collaborator is in use.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`report`]: Lost-pet reports and their enums
//! - [`identity`]: Authenticated identities and user profiles
//! - [`image`]: Selected photo files and upload constraints

pub mod error;
pub mod identity;
pub mod image;
pub mod report;

pub use error::{MascotasError, Result, ValidationError};
pub use identity::{Identity, ReportStats, UserProfile};
pub use image::{ImageFile, MAX_IMAGE_BYTES};
pub use report::{NewReport, PetType, Report, ReportStatus};
