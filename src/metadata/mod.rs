//! Artifact metadata extraction.
//!
//! APKs carry their package id, version and label in a compiled
//! `AndroidManifest.xml`. Bundles are not inspected; callers supply those values.

mod axml;

use crate::error::MetadataError;
use std::io::Read;
use std::path::Path;

/// Manifest entry inside an APK
const MANIFEST_ENTRY: &str = "AndroidManifest.xml";

/// Facts read from an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMetadata {
    /// Application id declared by the manifest
    pub package_identifier: String,
    /// Application label, when it is an inline string
    pub display_name: Option<String>,
    /// Integer version code
    pub version_code: i64,
    /// Human-readable version name
    pub version_label: Option<String>,
}

/// Reads [`ArtifactMetadata`] from an artifact file
pub trait MetadataReader {
    /// Extract metadata from the artifact at `path`
    fn read_metadata(&self, path: &Path) -> Result<ArtifactMetadata, MetadataError>;
}

impl<T: MetadataReader + ?Sized> MetadataReader for &T {
    fn read_metadata(&self, path: &Path) -> Result<ArtifactMetadata, MetadataError> {
        (**self).read_metadata(path)
    }
}

/// Reads the binary manifest of an APK archive
#[derive(Debug, Default, Clone, Copy)]
pub struct ApkMetadataReader;

impl MetadataReader for ApkMetadataReader {
    fn read_metadata(&self, path: &Path) -> Result<ArtifactMetadata, MetadataError> {
        let file = std::fs::File::open(path).map_err(|source| MetadataError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| MetadataError::NotAnArchive {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut raw = Vec::new();
        {
            let mut entry = archive.by_name(MANIFEST_ENTRY).map_err(|e| match e {
                zip::result::ZipError::FileNotFound => MetadataError::ManifestMissing {
                    path: path.to_path_buf(),
                },
                other => MetadataError::NotAnArchive {
                    path: path.to_path_buf(),
                    reason: other.to_string(),
                },
            })?;
            entry
                .read_to_end(&mut raw)
                .map_err(|source| MetadataError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        let manifest =
            axml::parse_manifest(&raw).map_err(|e| MetadataError::Malformed(format!("{e:#}")))?;

        if let Some(id) = manifest.label_reference {
            log::debug!("Application label is resource {id:#010x}; leaving display name unset");
        }

        let metadata = ArtifactMetadata {
            package_identifier: manifest
                .package
                .filter(|p| !p.is_empty())
                .ok_or(MetadataError::MissingAttribute { attribute: "package" })?,
            display_name: manifest.label.filter(|l| !l.is_empty()),
            version_code: manifest
                .version_code
                .ok_or(MetadataError::MissingAttribute {
                    attribute: "versionCode",
                })?,
            version_label: manifest.version_name.filter(|v| !v.is_empty()),
        };

        log::info!("Application name: [{}]", metadata.display_name.as_deref().unwrap_or("-"));
        log::info!("Application id: [{}]", metadata.package_identifier);
        log::info!("Version code: [{}]", metadata.version_code);
        log::info!(
            "Version name: [{}]",
            metadata.version_label.as_deref().unwrap_or("-")
        );

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_apk(dir: &tempfile::TempDir, entries: &[(&str, Vec<u8>)]) -> std::path::PathBuf {
        let path = dir.path().join("app.apk");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, content) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_reads_metadata_from_apk() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = axml::fixture::manifest("com.example.paid", 1203, "3.1.0", Some("Paid"), false);
        let path = write_apk(&dir, &[(MANIFEST_ENTRY, manifest), ("classes.dex", vec![0; 16])]);

        let metadata = ApkMetadataReader.read_metadata(&path).unwrap();
        assert_eq!(
            metadata,
            ArtifactMetadata {
                package_identifier: "com.example.paid".to_string(),
                display_name: Some("Paid".to_string()),
                version_code: 1203,
                version_label: Some("3.1.0".to_string()),
            }
        );
    }

    #[test]
    fn test_referenced_label_leaves_name_unset() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = axml::fixture::manifest("com.example.free", 5, "1.0", None, true);
        let path = write_apk(&dir, &[(MANIFEST_ENTRY, manifest)]);

        let metadata = ApkMetadataReader.read_metadata(&path).unwrap();
        assert_eq!(metadata.display_name, None);
        assert_eq!(metadata.version_code, 5);
    }

    #[test]
    fn test_archive_without_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_apk(&dir, &[("classes.dex", vec![1, 2, 3])]);
        assert!(matches!(
            ApkMetadataReader.read_metadata(&path),
            Err(MetadataError::ManifestMissing { .. })
        ));
    }

    #[test]
    fn test_non_archive_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.apk");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        assert!(matches!(
            ApkMetadataReader.read_metadata(&path),
            Err(MetadataError::NotAnArchive { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ApkMetadataReader.read_metadata(Path::new("/no/such/app.apk")),
            Err(MetadataError::Unreadable { .. })
        ));
    }
}
