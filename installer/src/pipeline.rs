//! Provisioning pipeline orchestration.
//!
//! Resolves the Module version to a release, makes sure that release is in
//! the per-user cache, and installs it into the project directory. When the
//! compatibility table pins a tag that the project already carries, the run
//! ends before any release request is made.

use camino::{Utf8Path, Utf8PathBuf};
use log::info;

use crate::cache::ReleaseCache;
use crate::config::EditorConfig;
use crate::dirs::{BaseDirs, cache_root};
use crate::error::Result;
use crate::extraction::{ArchiveExtractor, ZipExtractor};
use crate::fetch::{ContentFetcher, HttpFetcher};
use crate::project::{InstallOutcome, has_marker};
use crate::resolver::{CompatibilityResolver, Resolution};

/// Summary of a provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupOutcome {
    /// How the release was chosen.
    pub resolution: Resolution,
    /// The release now installed in the project.
    pub release: String,
    /// Whether the release archive was downloaded during this run.
    pub downloaded: bool,
    /// What happened to the project directory.
    pub install: InstallOutcome,
}

/// Provision the editor using HTTP and the platform cache directory.
///
/// `config.cache_dir` takes precedence over the directory reported by
/// `dirs`.
///
/// # Errors
///
/// Returns an [`InstallerError`](crate::error::InstallerError) naming the
/// stage that failed.
pub fn setup_editor(config: &EditorConfig, dirs: &dyn BaseDirs) -> Result<SetupOutcome> {
    let root = effective_cache_root(config, dirs)?;
    setup_editor_with(config, &root, &HttpFetcher, &ZipExtractor)
}

/// Provision the editor with injected network and archive handling.
///
/// # Errors
///
/// Returns an [`InstallerError`](crate::error::InstallerError) naming the
/// stage that failed.
pub fn setup_editor_with(
    config: &EditorConfig,
    cache_root: &Utf8Path,
    fetcher: &dyn ContentFetcher,
    extractor: &dyn ArchiveExtractor,
) -> Result<SetupOutcome> {
    let resolver = CompatibilityResolver::new(
        fetcher,
        &config.compatibility_map_url,
        &config.fallback_map,
    );
    let resolution = resolver.resolve(&config.manifest_path, &config.dependency)?;
    info!(
        "Cardinal {} uses editor release {}",
        resolution.module_version, resolution.target
    );

    if let Some(tag) = resolution
        .target
        .tag()
        .filter(|tag| has_marker(&config.project_dir, tag))
    {
        info!("Editor {tag} is already installed in {}", config.project_dir);
        return Ok(SetupOutcome {
            release: tag.to_owned(),
            resolution,
            downloaded: false,
            install: InstallOutcome::AlreadyCurrent,
        });
    }

    let cache = ReleaseCache::new(cache_root, fetcher, extractor);
    let cached = cache.ensure_cached(&resolution.target.endpoint(&config.releases_url))?;
    let install = config
        .installer()
        .install(&cached.path, cached.name.as_str(), &config.project_dir)?;

    Ok(SetupOutcome {
        resolution,
        release: cached.name.to_string(),
        downloaded: cached.downloaded,
        install,
    })
}

/// Cache root actually used for `config`, for reporting.
///
/// # Errors
///
/// Returns an [`InstallerError`](crate::error::InstallerError) if no cache
/// directory is configured and the platform one cannot be determined.
pub fn effective_cache_root(config: &EditorConfig, dirs: &dyn BaseDirs) -> Result<Utf8PathBuf> {
    match &config.cache_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(cache_root(dirs)?),
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
