//! Installer configuration.
//!
//! Every field has a default matching the hosted Editor, so an absent
//! configuration file is equivalent to an empty one. A file may override any
//! subset of fields:
//!
//! ```toml
//! project_dir = ".editor"
//! compatibility_map_url = "https://mirror.example/version_map.json"
//!
//! [fallback_map]
//! "v1.2.2-beta" = "v0.1.0"
//! ```

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::compatibility::CompatibilityMap;
use crate::project::{DEFAULT_ASSETS_DIR, DEFAULT_SCRIPT_EXTENSION, Placeholder, ProjectInstaller};

/// Configuration filename looked up in the working directory.
pub const CONFIG_FILENAME: &str = "editor-installer.toml";

/// Remote compatibility table.
pub const DEFAULT_COMPATIBILITY_MAP_URL: &str =
    "https://raw.githubusercontent.com/Argus-Labs/cardinal-editor/main/version_map.json";

/// Release listing endpoint.
pub const DEFAULT_RELEASES_URL: &str =
    "https://api.github.com/repos/Argus-Labs/cardinal-editor/releases";

/// Module manifest, relative to the working directory.
pub const DEFAULT_MANIFEST_PATH: &str = "cardinal/go.mod";

/// Module path of the dependency whose version selects the release.
pub const DEFAULT_DEPENDENCY: &str = "pkg.world.dev/world-engine/cardinal";

/// Project install directory, relative to the working directory.
pub const DEFAULT_PROJECT_DIR: &str = ".editor";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}")]
    Read {
        /// The configuration path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid.
    #[error("invalid configuration in {path}")]
    Parse {
        /// The configuration path.
        path: Utf8PathBuf,
        /// The TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// Settings for one provisioning run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// URL of the remote compatibility table.
    pub compatibility_map_url: String,
    /// Base URL of the release listing.
    pub releases_url: String,
    /// Path to the Module manifest.
    pub manifest_path: Utf8PathBuf,
    /// Module path of the dependency to look up in the manifest.
    pub dependency: String,
    /// Project install directory.
    pub project_dir: Utf8PathBuf,
    /// Override for the per-user cache root.
    pub cache_dir: Option<Utf8PathBuf>,
    /// Token replaced with the project identifier in script assets.
    pub placeholder: Placeholder,
    /// Subdirectory of the release holding script assets.
    #[serde(deserialize_with = "nested_dir")]
    pub assets_dir: String,
    /// Extension of script assets, without the dot.
    #[serde(deserialize_with = "bare_extension")]
    pub script_extension: String,
    /// Table used when the remote one cannot be fetched or parsed.
    pub fallback_map: CompatibilityMap,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            compatibility_map_url: DEFAULT_COMPATIBILITY_MAP_URL.to_owned(),
            releases_url: DEFAULT_RELEASES_URL.to_owned(),
            manifest_path: Utf8PathBuf::from(DEFAULT_MANIFEST_PATH),
            dependency: DEFAULT_DEPENDENCY.to_owned(),
            project_dir: Utf8PathBuf::from(DEFAULT_PROJECT_DIR),
            cache_dir: None,
            placeholder: Placeholder::default(),
            assets_dir: DEFAULT_ASSETS_DIR.to_owned(),
            script_extension: DEFAULT_SCRIPT_EXTENSION.to_owned(),
            fallback_map: CompatibilityMap::builtin(),
        }
    }
}

impl EditorConfig {
    /// Parse configuration from TOML text; absent fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or unknown fields.
    ///
    /// # Examples
    ///
    /// ```
    /// use editor_installer::config::EditorConfig;
    ///
    /// let config = EditorConfig::from_toml_str("project_dir = \"web\"").expect("valid config");
    /// assert_eq!(config.project_dir, "web");
    /// assert_eq!(config.dependency, "pkg.world.dev/world-engine/cardinal");
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |p| std::fs::read_to_string(p))
    }

    /// Load configuration from `path` if it exists, else use defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load_or_default(path: &Utf8Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration through an injected reader.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `read` fails or the contents are invalid.
    pub fn load_with<F>(path: &Utf8Path, read: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&Utf8Path) -> std::io::Result<String>,
    {
        let contents = read(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Build the project installer described by this configuration.
    #[must_use]
    pub fn installer(&self) -> ProjectInstaller {
        ProjectInstaller::new(self.placeholder.clone())
            .with_assets_dir(self.assets_dir.as_str())
            .with_script_extension(self.script_extension.as_str())
    }
}

/// A relative path that stays inside the release directory.
fn nested_dir<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = String::deserialize(deserializer)?;
    let nested = !value.is_empty()
        && Utf8Path::new(&value)
            .components()
            .all(|component| matches!(component, Utf8Component::Normal(_)));
    if nested {
        Ok(value)
    } else {
        Err(D::Error::custom(format!(
            "\"{value}\" must be a relative path inside the release"
        )))
    }
}

/// A file extension without a leading dot or path separators.
fn bare_extension<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = String::deserialize(deserializer)?;
    if value.is_empty() || value.contains(['.', '/', '\\']) {
        Err(D::Error::custom(format!(
            "\"{value}\" must be a bare file extension such as \"js\""
        )))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ModuleVersion;
    use rstest::rstest;

    #[test]
    fn empty_file_yields_defaults() {
        let config = EditorConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.fallback_map.len(), 4);
    }

    #[test]
    fn fallback_map_override_replaces_builtin() {
        let config = EditorConfig::from_toml_str(
            r#"
            [fallback_map]
            "v2.0.0" = "v1.0.0"
            "#,
        )
        .expect("config");

        assert_eq!(config.fallback_map.len(), 1);
        assert_eq!(
            config.fallback_map.release_for(&ModuleVersion::from("v2.0.0")),
            Some("v1.0.0")
        );
    }

    #[rstest]
    #[case::unknown_field("colour = \"red\"")]
    #[case::wrong_type("project_dir = 3")]
    #[case::not_toml("project_dir = ")]
    #[case::empty_placeholder("placeholder = \"\"")]
    #[case::assets_outside_release("assets_dir = \"../../outside\"")]
    #[case::absolute_assets_dir("assets_dir = \"/etc\"")]
    #[case::empty_assets_dir("assets_dir = \"\"")]
    #[case::dotted_extension("script_extension = \".js\"")]
    #[case::empty_extension("script_extension = \"\"")]
    #[case::unsafe_fallback_tag("[fallback_map]\n\"v1.2.2-beta\" = \"../v0.1.0\"")]
    fn rejects_invalid_files(#[case] contents: &str) {
        assert!(EditorConfig::from_toml_str(contents).is_err());
    }

    #[test]
    fn empty_placeholder_is_reported_by_name() {
        let err = EditorConfig::load_with(Utf8Path::new(CONFIG_FILENAME), |_| {
            Ok("placeholder = \"\"\n".to_owned())
        })
        .expect_err("empty placeholder");

        let ConfigError::Parse { source, .. } = &err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert!(source.to_string().contains("placeholder must not be empty"));
    }

    #[test]
    fn parses_script_settings() {
        let config = EditorConfig::from_toml_str(
            "placeholder = \"__ID__\"\nassets_dir = \"static/js\"\nscript_extension = \"mjs\"\n",
        )
        .expect("config");

        assert_eq!(config.placeholder.as_str(), "__ID__");
        assert_eq!(config.assets_dir, "static/js");
        assert_eq!(config.script_extension, "mjs");
    }

    #[test]
    fn load_with_reports_read_errors_with_path() {
        let err = EditorConfig::load_with(Utf8Path::new("missing.toml"), |_| {
            Err(std::io::Error::from(std::io::ErrorKind::NotFound))
        })
        .expect_err("read failure");

        assert!(matches!(err, ConfigError::Read { ref path, .. } if path == "missing.toml"));
    }

    #[test]
    fn load_with_reports_parse_errors_with_path() {
        let err = EditorConfig::load_with(Utf8Path::new("bad.toml"), |_| Ok("[[".to_owned()))
            .expect_err("parse failure");

        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn load_or_default_tolerates_absent_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().join(CONFIG_FILENAME)).expect("UTF-8 path");

        let config = EditorConfig::load_or_default(&path).expect("defaults");

        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().join(CONFIG_FILENAME)).expect("UTF-8 path");
        std::fs::write(&path, "cache_dir = \"/var/cache/editor\"\n").expect("write config");

        let config = EditorConfig::load(&path).expect("config");

        assert_eq!(config.cache_dir, Some(Utf8PathBuf::from("/var/cache/editor")));
    }
}
