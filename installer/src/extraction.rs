//! Archive extraction for editor release bundles.
//!
//! Extracts `.zip` release archives next to a destination directory with
//! path traversal protection (zip-slip), then renames the archive's
//! top-level directory to the destination so that callers control the final
//! name regardless of how the archive was packed.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use log::debug;

/// Trait for extracting release archives, enabling test mocking.
///
/// # Examples
///
/// ```
/// use editor_installer::extraction::ZipExtractor;
///
/// let extractor = ZipExtractor;
/// // Use extractor.extract(archive_path, destination) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` so that its top-level directory
    /// ends up at `destination`.
    ///
    /// Entries are written beneath the parent of `destination`, which must
    /// already exist. Returns the number of file entries written.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry resolves
    /// outside the parent of `destination`, [`ExtractionError::EmptyArchive`]
    /// or [`ExtractionError::MissingTopLevelDirectory`] for structurally
    /// unusable archives, and I/O or zip errors otherwise.
    fn extract(&self, archive_path: &Path, destination: &Path) -> Result<usize, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive could not be read as a zip file.
    #[error("malformed archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An entry attempts to escape the extraction root.
    #[error("{path}: illegal file path")]
    PathTraversal {
        /// The offending entry name from the archive.
        path: String,
    },

    /// The archive contains no entries.
    #[error("archive contains no entries")]
    EmptyArchive,

    /// The first entry is a bare file, so there is no directory to rename.
    #[error("archive has no top-level directory (first entry is {entry})")]
    MissingTopLevelDirectory {
        /// Name of the first entry.
        entry: String,
    },

    /// The destination has no parent directory to extract into.
    #[error("destination {} has no parent directory", .path.display())]
    NoParent {
        /// The destination that was requested.
        path: PathBuf,
    },
}

/// Default extractor backed by the `zip` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive_path: &Path, destination: &Path) -> Result<usize, ExtractionError> {
        let root = destination
            .parent()
            .map(normalise)
            .ok_or_else(|| ExtractionError::NoParent {
                path: destination.to_path_buf(),
            })?;

        let file = File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
        if archive.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }

        let mut top_level: Option<PathBuf> = None;
        let mut written = 0;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = entry.name().to_owned();
            let out_path = sanitize_extract_path(&root, &name)?;

            if top_level.is_none() {
                top_level = Some(top_level_dir(&root, &out_path, &name, entry.is_dir())?);
            }

            if entry.is_dir() {
                fs::create_dir_all(&out_path)?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out)?;
            written += 1;
        }

        if let Some(extracted) = top_level {
            if extracted != destination {
                debug!(
                    "renaming extracted {} to {}",
                    extracted.display(),
                    destination.display()
                );
                fs::rename(&extracted, destination)?;
            }
        }

        Ok(written)
    }
}

/// Resolve `entry_name` beneath `root`, rejecting anything that escapes it.
///
/// The join is normalised lexically (`.` dropped, `..` popped) and the result
/// must keep `root` as a component-wise prefix. Absolute entry names and
/// entries that resolve to `root` itself are rejected as well.
///
/// # Errors
///
/// Returns [`ExtractionError::PathTraversal`] naming the rejected entry.
pub fn sanitize_extract_path(root: &Path, entry_name: &str) -> Result<PathBuf, ExtractionError> {
    let illegal = || ExtractionError::PathTraversal {
        path: entry_name.to_owned(),
    };

    let mut resolved = root.to_path_buf();
    for component in Path::new(entry_name).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(illegal());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(illegal()),
        }
    }

    if resolved.starts_with(root) && resolved != root {
        Ok(resolved)
    } else {
        Err(illegal())
    }
}

/// Determine the extracted top-level directory from the first entry.
fn top_level_dir(
    root: &Path,
    out_path: &Path,
    name: &str,
    is_dir: bool,
) -> Result<PathBuf, ExtractionError> {
    let relative = out_path.strip_prefix(root).map_err(|_| ExtractionError::PathTraversal {
        path: name.to_owned(),
    })?;
    let mut components = relative.components();
    let first = components.next();
    let nested = components.next().is_some();
    match first {
        Some(Component::Normal(part)) if is_dir || nested => Ok(root.join(part)),
        _ => Err(ExtractionError::MissingTopLevelDirectory {
            entry: name.to_owned(),
        }),
    }
}

/// Lexically clean a path by dropping `.` components.
fn normalise(path: &Path) -> PathBuf {
    path.components().collect()
}
