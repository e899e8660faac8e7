//! Module manifest reading.
//!
//! The Module declares its dependencies in a Go module file. Only `require`
//! directives matter here, in both forms:
//!
//! ```text
//! require pkg.world.dev/world-engine/cardinal v1.2.2-beta
//!
//! require (
//!     pkg.world.dev/world-engine/cardinal v1.2.2-beta
//!     github.com/rs/zerolog v1.31.0 // indirect
//! )
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// The version of a dependency as declared in the manifest.
///
/// # Examples
///
/// ```
/// use editor_installer::manifest::ModuleVersion;
///
/// let version = ModuleVersion::from("v1.2.2-beta");
/// assert_eq!(version.as_str(), "v1.2.2-beta");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleVersion(String);

impl ModuleVersion {
    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModuleVersion {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single `require` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// The module path, e.g. `pkg.world.dev/world-engine/cardinal`.
    pub path: String,
    /// The declared version.
    pub version: ModuleVersion,
}

/// Errors arising from reading the Module manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest could not be read.
    #[error("failed to read module manifest {path}")]
    Read {
        /// Path to the manifest.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A `require` line is missing its version.
    #[error("{path}:{line}: malformed require directive: {text}")]
    Malformed {
        /// Path to the manifest.
        path: Utf8PathBuf,
        /// One-based line number.
        line: usize,
        /// The offending line, trimmed.
        text: String,
    },

    /// The `require` patterns failed to compile.
    #[error("invalid require pattern")]
    Pattern(#[source] regex::Error),

    /// No `require` entry names the requested module.
    #[error("module {module} not found in {path}")]
    ModuleNotFound {
        /// The module path that was looked up.
        module: String,
        /// Path to the manifest.
        path: Utf8PathBuf,
    },
}

/// Read the manifest at `path` and return the declared version of `module`.
///
/// # Errors
///
/// Returns [`ManifestError::Read`] if the file cannot be read,
/// [`ManifestError::Malformed`] for unparseable `require` directives, and
/// [`ManifestError::ModuleNotFound`] if no entry matches.
pub fn module_version(path: &Utf8Path, module: &str) -> Result<ModuleVersion, ManifestError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_owned(),
        source,
    })?;
    parse_requirements(path, &contents)?
        .into_iter()
        .find(|requirement| requirement.path == module)
        .map(|requirement| requirement.version)
        .ok_or_else(|| ManifestError::ModuleNotFound {
            module: module.to_owned(),
            path: path.to_owned(),
        })
}

/// Compiled patterns for `require` directives.
struct RequireSyntax {
    /// `require module/path v1.2.3`
    single_require_re: Regex,
    /// `require (`
    block_start_re: Regex,
    /// `module/path v1.2.3 // comment`, with the version optional so a
    /// missing one can be reported.
    require_spec_re: Regex,
}

impl RequireSyntax {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            single_require_re: Regex::new(r"^require\s+(.+)$")?,
            block_start_re: Regex::new(r"^require\s*\(\s*(?://.*)?$")?,
            require_spec_re: Regex::new(
                r#"^"?(?P<module>[^\s"]+)"?(?:\s+(?P<version>[^\s/]\S*))?\s*(?://.*)?$"#,
            )?,
        })
    }

    fn shared() -> Result<&'static Self, ManifestError> {
        static SYNTAX: OnceLock<Result<RequireSyntax, regex::Error>> = OnceLock::new();
        SYNTAX
            .get_or_init(Self::new)
            .as_ref()
            .map_err(|err| ManifestError::Pattern(err.clone()))
    }

    /// Parse one requirement, or `None` when `entry` has no version.
    fn requirement(&self, entry: &str) -> Option<Requirement> {
        let caps = self.require_spec_re.captures(entry)?;
        let module = caps.name("module")?;
        let version = caps.name("version")?;
        Some(Requirement {
            path: module.as_str().to_owned(),
            version: ModuleVersion::from(version.as_str()),
        })
    }
}

/// Parse every `require` entry in `contents`.
///
/// `path` is used only for error reporting.
///
/// # Errors
///
/// Returns [`ManifestError::Malformed`] when a `require` entry lacks a
/// version.
pub fn parse_requirements(
    path: &Utf8Path,
    contents: &str,
) -> Result<Vec<Requirement>, ManifestError> {
    let syntax = RequireSyntax::shared()?;
    let mut requirements = Vec::new();
    let mut in_block = false;

    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let entry = if in_block {
            if line == ")" {
                in_block = false;
                continue;
            }
            line
        } else if syntax.block_start_re.is_match(line) {
            in_block = true;
            continue;
        } else if let Some(caps) = syntax.single_require_re.captures(line) {
            caps.get(1).map_or("", |m| m.as_str())
        } else {
            continue;
        };

        let requirement = syntax
            .requirement(entry)
            .ok_or_else(|| ManifestError::Malformed {
                path: path.to_owned(),
                line: index + 1,
                text: line.to_owned(),
            })?;
        requirements.push(requirement);
    }

    Ok(requirements)
}
