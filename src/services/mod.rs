//! Service layer for towerdocs business logic.
//!
//! Domain logic separated from HTTP concerns so the CLI and the web server
//! share it.

pub mod auth;
pub mod registrar;
pub mod validation;

pub use auth::{AuthOutcome, ConfiguredAdmin, CredentialVerifier};
pub use registrar::{DocumentRegistrar, PdfUpload, RegistrarError};
