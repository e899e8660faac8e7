//! CLI argument definitions for the editor installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::config::{CONFIG_FILENAME, ConfigError, EditorConfig};

/// Provision the Cardinal Editor for the current project.
#[derive(Parser, Debug)]
#[command(name = "editor-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Provision the Cardinal Editor for the current project.\n\n",
    "The installer reads the Cardinal version from cardinal/go.mod, looks up the ",
    "matching Editor release in the published compatibility table, caches that ",
    "release once per user, and installs a fresh copy into .editor with a unique ",
    "project identifier. Re-running is a no-op while the installed release is ",
    "still the right one.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Provision the editor for the project in the current directory:\n",
    "    $ editor-installer\n\n",
    "  Use a different manifest and install directory:\n",
    "    $ editor-installer setup --manifest shard/go.mod --project-dir web/.editor\n\n",
    "  Check that Git, Go and Docker are available:\n",
    "    $ editor-installer doctor\n",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Setup arguments (used when no subcommand is given).
    #[command(flatten)]
    pub setup: SetupArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Provision the editor (default when no subcommand given).
    Setup(SetupArgs),

    /// Check that required host tools are installed.
    Doctor(DoctorArgs),
}

/// Arguments for the setup command.
#[derive(Parser, Debug, Clone, Default)]
pub struct SetupArgs {
    /// Configuration file [default: ./editor-installer.toml when present].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Module manifest declaring the Cardinal dependency.
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<Utf8PathBuf>,

    /// Module path of the dependency that selects the editor release.
    #[arg(long, value_name = "MODULE")]
    pub dependency: Option<String>,

    /// URL of the compatibility table.
    #[arg(long, value_name = "URL")]
    pub compat_url: Option<String>,

    /// Cache root [default: per-user configuration directory].
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Directory the editor is installed into.
    #[arg(short, long, value_name = "DIR")]
    pub project_dir: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        alias = "verbosity",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Arguments for the doctor command.
#[derive(Parser, Debug, Clone, Default)]
pub struct DoctorArgs {
    /// Only report failures.
    #[arg(short, long)]
    pub quiet: bool,
}

impl SetupArgs {
    /// Load the configuration file and apply command-line overrides.
    ///
    /// An explicit `--config` must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration file cannot be read or
    /// parsed.
    pub fn resolve_config(&self) -> Result<EditorConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => EditorConfig::load(path)?,
            None => EditorConfig::load_or_default(Utf8Path::new(CONFIG_FILENAME))?,
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Overwrite configuration fields with any flags that were given.
    ///
    /// # Examples
    ///
    /// ```
    /// use editor_installer::cli::SetupArgs;
    /// use editor_installer::config::EditorConfig;
    ///
    /// let args = SetupArgs {
    ///     project_dir: Some("web/.editor".into()),
    ///     ..SetupArgs::default()
    /// };
    /// let mut config = EditorConfig::default();
    /// args.apply_overrides(&mut config);
    /// assert_eq!(config.project_dir, "web/.editor");
    /// assert_eq!(config.manifest_path, "cardinal/go.mod");
    /// ```
    pub fn apply_overrides(&self, config: &mut EditorConfig) {
        if let Some(manifest) = &self.manifest {
            config.manifest_path.clone_from(manifest);
        }
        if let Some(dependency) = &self.dependency {
            config.dependency.clone_from(dependency);
        }
        if let Some(url) = &self.compat_url {
            config.compatibility_map_url.clone_from(url);
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.project_dir {
            config.project_dir.clone_from(dir);
        }
    }

    /// Log level selected by `-v` and `-q`.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        match (self.quiet, self.verbosity) {
            (true, _) => LevelFilter::Error,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        }
    }
}

impl Cli {
    /// Returns the effective setup arguments.
    ///
    /// If a `Setup` subcommand was provided, returns those arguments.
    /// Otherwise returns the flattened setup arguments.
    #[must_use]
    pub fn setup_args(&self) -> &SetupArgs {
        match &self.command {
            Some(Command::Setup(args)) => args,
            Some(Command::Doctor(_)) | None => &self.setup,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
