//! Error types for playstore_release operations.
//!
//! Every failure carries an actionable message. Fatal errors additionally expose
//! recovery suggestions that the binary prints before exiting.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for playstore_release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all playstore_release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Configuration errors (fatal at load, before any network call)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A single publish transaction failed
    #[error("{0}")]
    Transaction(#[from] TransactionError),

    /// Batch halted because `abortOnError` is set
    #[error("Batch aborted at flavor #{index} '{flavor}': {source}")]
    BatchAborted {
        /// Flavor whose transaction failed
        flavor: String,
        /// 1-based position of the flavor in the configuration
        index: usize,
        /// The transaction failure that stopped the batch
        #[source]
        source: TransactionError,
    },

    /// Remote distribution service errors
    #[error("Play service error: {0}")]
    Service(#[from] ServiceError),

    /// Artifact metadata errors
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration or referenced file could not be read
    #[error("Failed to read {path}: {source}")]
    Unreadable {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// JSON content could not be parsed
    #[error("Failed to parse {path}: {source}")]
    Json {
        /// File being parsed
        path: PathBuf,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// TOML content could not be parsed
    #[error("Failed to parse {path}: {source}")]
    Toml {
        /// File being parsed
        path: PathBuf,
        /// Parser error
        #[source]
        source: toml::de::Error,
    },

    /// Configuration file has an extension we cannot parse
    #[error("Unsupported configuration format for {path} (expected .json or .toml)")]
    UnsupportedFormat {
        /// Offending file
        path: PathBuf,
    },

    /// A field holds a value that cannot be used
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField {
        /// Configuration key
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A required field is missing or empty
    #[error("Missing required field '{field}'")]
    MissingField {
        /// Configuration key
        field: String,
    },

    /// The same flavor is listed twice
    #[error("Flavor '{flavor}' is listed more than once")]
    DuplicateFlavor {
        /// Repeated flavor id
        flavor: String,
    },

    /// Release notes contain two entries for one language
    #[error("Release notes in {path} contain more than one entry for '{language}'")]
    DuplicateLanguage {
        /// Notes file
        path: PathBuf,
        /// Repeated language tag
        language: String,
    },
}

/// Step of the single-release transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStep {
    /// Creating the edit
    Open,
    /// Reading package id, label and version from the artifact
    ResolveMetadata,
    /// Uploading the APK/AAB
    UploadArtifact,
    /// Uploading the deobfuscation file
    UploadSymbols,
    /// Attaching the release to its track
    UpdateTrack,
    /// Committing the edit
    Commit,
}

impl fmt::Display for TransactionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionStep::Open => "Opening edit",
            TransactionStep::ResolveMetadata => "Reading artifact metadata",
            TransactionStep::UploadArtifact => "Uploading artifact",
            TransactionStep::UploadSymbols => "Uploading mapping file",
            TransactionStep::UpdateTrack => "Updating track release",
            TransactionStep::Commit => "Committing edit",
        };
        f.write_str(name)
    }
}

/// Outcome of the compensating edit deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    /// Nothing was created remotely, so nothing was deleted
    NotNeeded,
    /// The edit was deleted
    EditDeleted,
    /// Deleting the edit failed as well
    DeleteFailed(String),
}

impl fmt::Display for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compensation::NotNeeded | Compensation::EditDeleted => Ok(()),
            Compensation::DeleteFailed(reason) => write!(f, "\nFailed to delete edit: {reason}"),
        }
    }
}

/// A failed publish transaction.
///
/// The originating cause is always kept; a failed compensation only adds context.
#[derive(Error, Debug)]
#[error("Operation failed: {step} for '{package}': {source}{compensation}")]
pub struct TransactionError {
    /// Step that failed
    pub step: TransactionStep,
    /// Package the edit was opened for
    pub package: String,
    /// Originating failure
    #[source]
    pub source: Box<ReleaseError>,
    /// What happened to the edit afterwards
    pub compensation: Compensation,
}

impl TransactionError {
    /// Whether the remote edit is known to be gone (or never existed)
    pub fn edit_cleaned_up(&self) -> bool {
        !matches!(self.compensation, Compensation::DeleteFailed(_))
    }
}

/// Remote distribution service errors
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Request could not be sent or the connection broke
    #[error("{operation} request failed: {reason}")]
    Request {
        /// Service operation
        operation: String,
        /// Transport error description
        reason: String,
    },

    /// Service answered with a non-success status
    #[error("{operation} returned HTTP {status}: {message}")]
    Status {
        /// Service operation
        operation: String,
        /// HTTP status code
        status: u16,
        /// Message reported by the service
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("{operation} returned an unexpected response: {reason}")]
    Decode {
        /// Service operation
        operation: String,
        /// Decoding error
        reason: String,
    },

    /// Service-account key could not be used
    #[error("Invalid credentials: {reason}")]
    Credentials {
        /// Why the key was rejected
        reason: String,
    },

    /// Token exchange failed
    #[error("Authentication failed: {reason}")]
    Authentication {
        /// Why the exchange failed
        reason: String,
    },

    /// Local file needed for a request could not be read
    #[error("Failed to read {path}: {source}")]
    File {
        /// File being uploaded
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// Artifact metadata errors
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Artifact could not be opened
    #[error("Failed to open {path}: {source}")]
    Unreadable {
        /// Artifact path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Artifact is not a valid archive
    #[error("{path} is not a valid APK archive: {reason}")]
    NotAnArchive {
        /// Artifact path
        path: PathBuf,
        /// Archive error
        reason: String,
    },

    /// Archive has no manifest
    #[error("{path} does not contain AndroidManifest.xml")]
    ManifestMissing {
        /// Artifact path
        path: PathBuf,
    },

    /// Manifest could not be decoded
    #[error("Malformed AndroidManifest.xml: {0}")]
    Malformed(String),

    /// Manifest lacks a required attribute
    #[error("AndroidManifest.xml has no '{attribute}' attribute")]
    MissingAttribute {
        /// Attribute name
        attribute: &'static str,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// Input file type not recognised
    #[error("File type is not supported for: {file} (expected .apk, .aab, .json or .toml)")]
    UnsupportedFile {
        /// The file passed with --file
        file: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Config(ConfigError::DuplicateFlavor { flavor }) => vec![format!(
                "Remove the repeated '{}' entry from 'flavors'",
                flavor
            )],
            ReleaseError::Config(ConfigError::MissingField { field }) => {
                vec![format!("Add '{}' to the configuration file", field)]
            }
            ReleaseError::Config(ConfigError::UnsupportedFormat { .. }) => {
                vec!["Rename the configuration file to end in .json or .toml".to_string()]
            }
            ReleaseError::Service(ServiceError::Credentials { .. })
            | ReleaseError::Service(ServiceError::Authentication { .. }) => vec![
                "Check that --key points to a service-account JSON key".to_string(),
                "Verify the service account is invited in the Play Console with release permissions"
                    .to_string(),
            ],
            ReleaseError::Transaction(e) | ReleaseError::BatchAborted { source: e, .. }
                if !e.edit_cleaned_up() =>
            {
                vec![
                    "The edit could not be deleted; it expires on its own, or delete it via the Play Developer API"
                        .to_string(),
                ]
            }
            ReleaseError::BatchAborted { .. } => vec![
                "Fix the failing flavor and re-run; flavors after it were not attempted".to_string(),
                "Set abortOnError to false to continue past failing flavors".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Whether this error is a configuration problem detected before any network call
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ReleaseError::Config(_) | ReleaseError::Cli(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(compensation: Compensation) -> TransactionError {
        TransactionError {
            step: TransactionStep::UpdateTrack,
            package: "com.example.paid".to_string(),
            source: Box::new(ReleaseError::Service(ServiceError::Status {
                operation: "tracks.update".to_string(),
                status: 403,
                message: "forbidden".to_string(),
            })),
            compensation,
        }
    }

    #[test]
    fn test_original_cause_leads_the_message() {
        let message = failure(Compensation::EditDeleted).to_string();
        assert!(message.starts_with("Operation failed: Updating track release for 'com.example.paid'"));
        assert!(message.contains("HTTP 403: forbidden"));
        assert!(!message.contains("Failed to delete edit"));
    }

    #[test]
    fn test_delete_failure_is_appended() {
        let message = failure(Compensation::DeleteFailed("timeout".to_string())).to_string();
        assert!(message.contains("HTTP 403: forbidden"));
        assert!(message.ends_with("\nFailed to delete edit: timeout"));
    }

    #[test]
    fn test_source_chain_points_at_cause() {
        use std::error::Error as _;
        let error = failure(Compensation::EditDeleted);
        let source = error.source().map(|s| s.to_string()).unwrap_or_default();
        assert!(source.contains("forbidden"));
    }

    #[test]
    fn test_undeleted_edit_gets_suggestion() {
        let error = ReleaseError::Transaction(failure(Compensation::DeleteFailed("x".into())));
        assert!(error.recovery_suggestions()[0].contains("could not be deleted"));
    }

    #[test]
    fn test_configuration_classification() {
        let error = ReleaseError::Config(ConfigError::MissingField {
            field: "packageNamePattern".to_string(),
        });
        assert!(error.is_configuration_error());
        assert!(!ReleaseError::Transaction(failure(Compensation::NotNeeded)).is_configuration_error());
    }
}
