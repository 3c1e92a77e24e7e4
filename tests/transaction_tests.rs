mod common;

use common::{Call, Op, RecordingService, StubReader, request};
use playstore_release::error::{
    Compensation, MetadataError, ReleaseError, ServiceError, TransactionStep,
};
use playstore_release::release::{ArtifactKind, CountryTargeting, ReleaseNote, ReleaseStatus};
use playstore_release::transaction::Transactor;
use std::path::PathBuf;

fn artifact(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"binary").unwrap();
    path
}

#[tokio::test]
async fn test_successful_publish_commits_without_delete() {
    let dir = tempfile::tempdir().unwrap();
    let apk = artifact(&dir, "paid.apk");
    let mapping = artifact(&dir, "mapping.txt");

    let reader = StubReader::returning("com.example.paid", 7, "2.4.0");
    let transactor = Transactor::new(RecordingService::new(), &reader);

    let mut req = request("com.example.paid", &apk);
    req.symbols_file_path = Some(mapping);
    req.country_targeting = CountryTargeting::from_countries(["de"]);
    req.release_notes = vec![ReleaseNote::new("de-DE", "Fehlerbehebungen")];

    let receipt = transactor.publish(req).await.unwrap();

    assert_eq!(
        transactor.service().ops(),
        vec![Op::Open, Op::UploadArtifact, Op::UploadSymbols, Op::UpdateTrack, Op::Commit]
    );
    assert_eq!(receipt.package_identifier, "com.example.paid");
    assert_eq!(receipt.edit_id, "edit-1");
    assert_eq!(receipt.version_code, 101);
    assert_eq!(receipt.version_label.as_deref(), Some("2.4.0"));
    assert_eq!(receipt.display_name.as_deref(), Some("Example"));

    let releases = transactor.service().track_updates();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].name.as_deref(), Some("2.4.0"));
    assert_eq!(releases[0].version_codes, vec![101]);
    assert_eq!(releases[0].status, ReleaseStatus::Completed);
    assert_eq!(releases[0].country_targeting.as_ref().unwrap().countries, vec!["DE"]);
    assert_eq!(releases[0].release_notes.len(), 1);
    assert_eq!(reader.reads(), vec![apk]);
}

#[tokio::test]
async fn test_every_failure_after_open_deletes_the_edit_once() {
    for failing in [Op::UploadArtifact, Op::UploadSymbols, Op::UpdateTrack, Op::Commit] {
        let dir = tempfile::tempdir().unwrap();
        let apk = artifact(&dir, "app.apk");
        let mapping = artifact(&dir, "mapping.txt");

        let reader = StubReader::returning("com.example.app", 1, "1.0");
        let transactor = Transactor::new(RecordingService::new().failing(failing), &reader);

        let mut req = request("com.example.app", &apk);
        req.symbols_file_path = Some(mapping);

        let error = transactor.publish(req).await.unwrap_err();
        let calls = transactor.service().calls();

        assert_eq!(transactor.service().deleted_edits(), vec!["edit-1"], "{failing:?}");
        assert_eq!(calls.last(), Some(&Call::Delete("edit-1".to_string())), "{failing:?}");
        assert_eq!(error.compensation, Compensation::EditDeleted);
        assert!(error.edit_cleaned_up());
        assert!(error.to_string().contains(&format!("injected {failing:?} failure")));
    }
}

#[tokio::test]
async fn test_failed_step_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let apk = artifact(&dir, "app.apk");
    let reader = StubReader::returning("com.example.app", 1, "1.0");
    let transactor = Transactor::new(RecordingService::new().failing(Op::UpdateTrack), &reader);

    let error = transactor.publish(request("com.example.app", &apk)).await.unwrap_err();
    assert_eq!(error.step, TransactionStep::UpdateTrack);
    assert_eq!(error.package, "com.example.app");
    assert!(matches!(
        *error.source,
        ReleaseError::Service(ServiceError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_open_failure_never_deletes() {
    let dir = tempfile::tempdir().unwrap();
    let apk = artifact(&dir, "app.apk");
    let reader = StubReader::returning("com.example.app", 1, "1.0");
    let transactor = Transactor::new(RecordingService::new().failing(Op::Open), &reader);

    let error = transactor.publish(request("com.example.app", &apk)).await.unwrap_err();

    assert_eq!(transactor.service().ops(), vec![Op::Open]);
    assert_eq!(error.step, TransactionStep::Open);
    assert_eq!(error.compensation, Compensation::NotNeeded);
    assert_eq!(reader.reads(), vec![apk]);
}

#[tokio::test]
async fn test_delete_failure_is_appended_to_original_cause() {
    let dir = tempfile::tempdir().unwrap();
    let apk = artifact(&dir, "app.apk");
    let reader = StubReader::returning("com.example.app", 1, "1.0");
    let service = RecordingService::new()
        .failing(Op::Commit)
        .failing(Op::Delete);
    let transactor = Transactor::new(service, &reader);

    let error = transactor.publish(request("com.example.app", &apk)).await.unwrap_err();
    let message = error.to_string();

    assert_eq!(error.step, TransactionStep::Commit);
    assert!(matches!(error.compensation, Compensation::DeleteFailed(_)));
    assert!(!error.edit_cleaned_up());
    assert!(message.starts_with("Operation failed: Committing edit"));
    assert!(message.contains("injected Commit failure"));
    assert!(message.contains("\nFailed to delete edit: "));
    assert!(message.contains("injected Delete failure"));
    assert_eq!(transactor.service().deleted_edits().len(), 1);
}

#[tokio::test]
async fn test_unreadable_metadata_fails_before_open() {
    let dir = tempfile::tempdir().unwrap();
    let apk = artifact(&dir, "app.apk");
    let reader = StubReader::failing();
    let transactor = Transactor::new(RecordingService::new(), &reader);

    let error = transactor.publish(request("com.example.app", &apk)).await.unwrap_err();

    assert_eq!(error.step, TransactionStep::ResolveMetadata);
    assert_eq!(error.compensation, Compensation::NotNeeded);
    assert!(matches!(*error.source, ReleaseError::Metadata(MetadataError::Malformed(_))));
    assert!(transactor.service().calls().is_empty());
}

#[tokio::test]
async fn test_extracted_package_replaces_caller_package() {
    let dir = tempfile::tempdir().unwrap();
    let apk = artifact(&dir, "app.apk");
    let reader = StubReader::returning("com.example.other", 1, "1.0");
    let transactor = Transactor::new(RecordingService::new(), &reader);

    let receipt = transactor.publish(request("com.example.app", &apk)).await.unwrap();

    assert_eq!(transactor.service().opened_packages(), vec!["com.example.other"]);
    assert_eq!(receipt.package_identifier, "com.example.other");
    assert_eq!(transactor.service().deleted_edits(), Vec::<String>::new());
}

#[tokio::test]
async fn test_halted_release_without_fraction_reaches_track_update() {
    let dir = tempfile::tempdir().unwrap();
    let apk = artifact(&dir, "app.apk");
    let reader = StubReader::returning("com.example.app", 1, "1.0");
    let transactor = Transactor::new(RecordingService::new(), &reader);

    let mut req = request("com.example.app", &apk);
    req.release_status = ReleaseStatus::Halted;

    transactor.publish(req).await.unwrap();
    let release = &transactor.service().track_updates()[0];
    assert_eq!(release.status, ReleaseStatus::Halted);
    assert_eq!(release.user_fraction, None);
    assert_eq!(transactor.service().ops().last(), Some(&Op::Commit));
}

#[tokio::test]
async fn test_missing_mapping_file_is_not_uploaded() {
    let dir = tempfile::tempdir().unwrap();
    let apk = artifact(&dir, "app.apk");
    let reader = StubReader::returning("com.example.app", 1, "1.0");
    let transactor = Transactor::new(RecordingService::new(), &reader);

    let mut req = request("com.example.app", &apk);
    req.symbols_file_path = Some(dir.path().join("missing-mapping.txt"));

    transactor.publish(req).await.unwrap();
    assert_eq!(
        transactor.service().ops(),
        vec![Op::Open, Op::UploadArtifact, Op::UpdateTrack, Op::Commit]
    );
}

#[tokio::test]
async fn test_bundle_skips_metadata_and_may_be_unnamed() {
    let dir = tempfile::tempdir().unwrap();
    let aab = artifact(&dir, "app.aab");
    let reader = StubReader::failing();
    let transactor = Transactor::new(RecordingService::new(), &reader);

    let mut req = request("com.example.app", &aab);
    req.artifact_kind = ArtifactKind::Aab;

    let receipt = transactor.publish(req).await.unwrap();

    assert!(reader.reads().is_empty());
    assert_eq!(receipt.version_label, None);
    assert_eq!(transactor.service().track_updates()[0].name, None);
    assert!(matches!(
        &transactor.service().calls()[1],
        Call::UploadArtifact { kind: ArtifactKind::Aab, .. }
    ));
}

#[tokio::test]
async fn test_caller_values_override_extracted_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let apk = artifact(&dir, "app.apk");
    let reader = StubReader::returning("com.example.app", 1, "1.0");
    let transactor = Transactor::new(RecordingService::new(), &reader);

    let mut req = request("com.example.app", &apk);
    req.display_name = Some("Custom".to_string());
    req.version_label = Some("1.0-rc1".to_string());

    let receipt = transactor.publish(req).await.unwrap();
    assert_eq!(receipt.display_name.as_deref(), Some("Custom"));
    assert_eq!(transactor.service().track_updates()[0].name.as_deref(), Some("1.0-rc1"));
}

#[tokio::test]
async fn test_invalid_rollout_is_rejected_before_track_update() {
    let dir = tempfile::tempdir().unwrap();
    let apk = artifact(&dir, "app.apk");
    let reader = StubReader::returning("com.example.app", 1, "1.0");
    let transactor = Transactor::new(RecordingService::new(), &reader);

    let mut req = request("com.example.app", &apk);
    req.release_status = ReleaseStatus::InProgress;

    let error = transactor.publish(req).await.unwrap_err();

    assert_eq!(error.step, TransactionStep::UpdateTrack);
    assert!(matches!(*error.source, ReleaseError::Config(_)));
    assert_eq!(
        transactor.service().ops(),
        vec![Op::Open, Op::UploadArtifact, Op::Delete]
    );
}

#[tokio::test]
async fn test_staged_rollout_fraction_is_sent() {
    let dir = tempfile::tempdir().unwrap();
    let apk = artifact(&dir, "app.apk");
    let reader = StubReader::returning("com.example.app", 1, "1.0");
    let transactor = Transactor::new(RecordingService::new(), &reader);

    let mut req = request("com.example.app", &apk);
    req.release_status = ReleaseStatus::InProgress;
    req.user_fraction = Some(0.1);

    transactor.publish(req).await.unwrap();
    let release = &transactor.service().track_updates()[0];
    assert_eq!(release.status, ReleaseStatus::InProgress);
    assert_eq!(release.user_fraction, Some(0.1));
}
