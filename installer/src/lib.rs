//! Cardinal Editor installer library.
//!
//! This crate provides the core functionality for provisioning a
//! version-matched copy of the Cardinal Editor into a project: resolving the
//! Cardinal version to an Editor release, caching that release once per
//! user, and installing a uniquely identified working copy. It is used by the
//! `editor-installer` CLI binary and can be consumed programmatically for
//! testing or custom workflows.
//!
//! # Modules
//!
//! - [`cache`] - Per-user cache of extracted releases
//! - [`cli`] - Command-line argument definitions
//! - [`compatibility`] - Module-version to release compatibility table
//! - [`config`] - Configuration file loading and defaults
//! - [`deps`] - Host tool checks
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Stage-level error types
//! - [`extraction`] - Zip extraction with path-traversal defence
//! - [`fetch`] - Bounded-timeout HTTP fetching
//! - [`manifest`] - Go module manifest parsing
//! - [`output`] - CLI message formatting
//! - [`pipeline`] - Provisioning pipeline orchestration
//! - [`project`] - Project directory installation
//! - [`release`] - Release metadata
//! - [`resolver`] - Version-to-release resolution

pub mod cache;
pub mod cli;
pub mod compatibility;
pub mod config;
pub mod deps;
pub mod dirs;
pub mod error;
pub mod extraction;
pub mod fetch;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod project;
pub mod release;
pub mod resolver;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
