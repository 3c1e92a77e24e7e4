//! # Play Store Release
//!
//! Transactional publishing of Android artifacts to Google Play.
//!
//! One artifact is published inside a single edit: the edit is opened, the
//! artifact and its mapping file are uploaded, the track is updated and the
//! edit is committed. When any step after opening fails, the edit is deleted
//! so it cannot block later publishes of the same package.
//!
//! A batch configuration publishes many product flavors in order. File names
//! and package names come from templates, and countries, release notes and
//! locales can be overridden per flavor.
//!
//! ## Features
//!
//! - **Compensating edits**: every failure after the edit exists deletes it
//! - **Flavor batches**: JSON or TOML configuration with per-flavor overrides
//! - **APK metadata**: package, version and label read from the binary manifest
//! - **Abort policy**: stop at the first failed flavor, or record it and go on
//!
//! ## Usage
//!
//! ```bash
//! playstore_release --key key.json --file app-release.apk --track beta
//! playstore_release --key key.json --file release.json --dry-run
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod orchestrator;
pub mod play;
pub mod release;
pub mod transaction;

pub use cli::Args;
pub use config::Configuration;
pub use error::{ReleaseError, Result};
pub use metadata::{ApkMetadataReader, ArtifactMetadata, MetadataReader};
pub use orchestrator::{BatchOrchestrator, BatchReport, Confirm, FlavorPlan};
pub use play::{EditHandle, PlayClient, PlayService, ReleaseDescriptor};
pub use release::{ArtifactKind, PublishRequest, ReleaseStatus};
pub use transaction::{PublishReceipt, Transactor};
