//! Per-user cache of extracted editor releases.
//!
//! Each release lives at `<cache_root>/editor/<release-name>`. The presence
//! of that directory is the only freshness signal, so it must never exist in
//! a half-written state: archives are downloaded and extracted inside a
//! temporary sibling directory and the finished tree is renamed into place
//! in one step.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs::{self, File};
use std::io::BufWriter;

use crate::extraction::{ArchiveExtractor, ExtractionError};
use crate::fetch::{ContentFetcher, FetchError};
use crate::release::{ReleaseMetadata, ReleaseName};

/// Subdirectory of the cache root that holds editor releases.
pub const EDITOR_CACHE_DIR: &str = "editor";

/// Name of the downloaded archive inside the staging directory.
const ARCHIVE_FILENAME: &str = ".download.zip";

/// Errors arising from populating the release cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Release metadata or archive could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Release metadata could not be parsed.
    #[error("malformed release metadata from {url}")]
    Metadata {
        /// The release endpoint.
        url: String,
        /// The parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The release lists no downloadable assets.
    #[error("release {release} has no downloadable assets")]
    NoAssets {
        /// The release name.
        release: ReleaseName,
    },

    /// The archive body could not be streamed to disk.
    #[error("failed to download {url}")]
    Download {
        /// The archive URL.
        url: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The archive could not be extracted.
    #[error("failed to extract release {release}")]
    Extraction {
        /// The release name.
        release: ReleaseName,
        /// The extraction error.
        #[source]
        source: ExtractionError,
    },

    /// A filesystem operation on the cache failed.
    #[error("cache I/O error at {path}")]
    Io {
        /// The path being operated on.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// An extracted release ready to be copied into a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRelease {
    /// The cache entry directory.
    pub path: Utf8PathBuf,
    /// The release name, which is also the installed version tag.
    pub name: ReleaseName,
    /// Whether the archive was downloaded during this call.
    pub downloaded: bool,
}

/// Cache of extracted releases beneath a per-user root.
pub struct ReleaseCache<'a> {
    root: Utf8PathBuf,
    fetcher: &'a dyn ContentFetcher,
    extractor: &'a dyn ArchiveExtractor,
}

impl<'a> ReleaseCache<'a> {
    /// Create a cache rooted at `cache_root`.
    #[must_use]
    pub fn new(
        cache_root: &Utf8Path,
        fetcher: &'a dyn ContentFetcher,
        extractor: &'a dyn ArchiveExtractor,
    ) -> Self {
        Self {
            root: cache_root.join(EDITOR_CACHE_DIR),
            fetcher,
            extractor,
        }
    }

    /// Directory holding the cache entry for `name`.
    #[must_use]
    pub fn entry_dir(&self, name: &ReleaseName) -> Utf8PathBuf {
        self.root.join(name.as_str())
    }

    /// Ensure the release behind `endpoint` is extracted in the cache.
    ///
    /// The metadata is always fetched; the archive only on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if any fetch, parse, extraction, or
    /// filesystem step fails. On error no cache entry is left behind.
    pub fn ensure_cached(&self, endpoint: &str) -> Result<CachedRelease, CacheError> {
        let metadata = self.fetch_metadata(endpoint)?;
        let path = self.entry_dir(&metadata.name);

        if path.is_dir() {
            debug!("release {} already cached at {path}", metadata.name);
            return Ok(CachedRelease {
                path,
                name: metadata.name,
                downloaded: false,
            });
        }

        let downloaded = self.populate(&metadata, &path)?;
        Ok(CachedRelease {
            path,
            name: metadata.name,
            downloaded,
        })
    }

    fn fetch_metadata(&self, endpoint: &str) -> Result<ReleaseMetadata, CacheError> {
        let body = self.fetcher.fetch_json(endpoint)?;
        ReleaseMetadata::parse(&body).map_err(|source| CacheError::Metadata {
            url: endpoint.to_owned(),
            source,
        })
    }

    /// Download and extract the release, then move it to `entry`.
    ///
    /// Returns `false` when another run populated `entry` first; that copy
    /// is kept and ours is discarded with the staging directory.
    fn populate(&self, metadata: &ReleaseMetadata, entry: &Utf8Path) -> Result<bool, CacheError> {
        let url = metadata
            .archive_url()
            .ok_or_else(|| CacheError::NoAssets {
                release: metadata.name.clone(),
            })?;

        fs::create_dir_all(&self.root).map_err(|source| io_error(&self.root, source))?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.root)
            .map_err(|source| io_error(&self.root, source))?;

        info!("Downloading editor release {} from {url}", metadata.name);
        let archive_path = staging.path().join(ARCHIVE_FILENAME);
        self.download(url, &archive_path)?;

        let extracted = staging.path().join(metadata.name.as_str());
        self.extractor
            .extract(&archive_path, &extracted)
            .map_err(|source| CacheError::Extraction {
                release: metadata.name.clone(),
                source,
            })?;

        if let Err(source) = fs::rename(&extracted, entry) {
            if entry.is_dir() {
                debug!("release {} was cached concurrently at {entry}", metadata.name);
                return Ok(false);
            }
            return Err(io_error(entry, source));
        }
        debug!("cached release {} at {entry}", metadata.name);
        Ok(true)
    }

    fn download(&self, url: &str, dest: &std::path::Path) -> Result<(), CacheError> {
        let mut body = self.fetcher.fetch_binary(url)?;
        let download_error = |source: std::io::Error| CacheError::Download {
            url: url.to_owned(),
            source,
        };
        let mut file = BufWriter::new(File::create(dest).map_err(download_error)?);
        std::io::copy(&mut body, &mut file).map_err(download_error)?;
        file.into_inner()
            .map_err(|e| download_error(e.into_error()))?
            .sync_all()
            .map_err(download_error)
    }
}

fn io_error(path: &Utf8Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_owned(),
        source,
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
