//! Error types for the editor installer CLI.
//!
//! Each variant names the pipeline stage that failed and keeps the stage's
//! own error as its source, so the binary can print the full chain.

use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::deps::DependencyError;
use crate::dirs::CacheRootError;
use crate::manifest::ManifestError;
use crate::project::ProjectError;

/// Errors that can occur while provisioning the editor.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The configuration file could not be loaded.
    #[error("failed to load configuration")]
    Config(#[from] ConfigError),

    /// The per-user cache root could not be determined.
    #[error("failed to locate the editor cache")]
    CacheRoot(#[from] CacheRootError),

    /// The Module version could not be determined.
    #[error("failed to get cardinal version")]
    Resolve(#[from] ManifestError),

    /// The release could not be fetched into the cache.
    #[error("failed to cache editor release")]
    Cache(#[from] CacheError),

    /// The release could not be installed into the project.
    #[error("failed to install editor into project")]
    Install(#[from] ProjectError),

    /// One or more host tools are missing.
    #[error("dependency checks failed")]
    Dependencies(#[from] DependencyError),
}

/// Result type alias using [`InstallerError`].
pub type Result<T> = std::result::Result<T, InstallerError>;
