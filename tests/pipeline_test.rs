//! Library scan pipeline tests.
//!
//! Exercise probe → compatibility → conversion → notification against a
//! stub media tool and real directories.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use common::*;
use playready::scanner::{FileOutcome, ScanSummary};
use playready::transcode::TEMP_FILE_NAME;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_converts_old_incompatible_file() {
    let dir = tempdir().unwrap();
    write_aged(
        dir.path(),
        "The.Show.S01E01.720p.HDTV.x264.mkv",
        INCOMPATIBLE,
        OLD,
    );

    let config = test_config(dir.path(), 2);
    let tool = StubTool::new();
    let notifier = RecordingNotifier::new();
    let scanner = scanner(&config, tool.clone(), notifier.clone());

    let summary = scanner.scan(dir.path(), 2).await.unwrap();

    assert_eq!(
        summary,
        ScanSummary {
            candidates: 1,
            converted: 1,
            ..ScanSummary::default()
        }
    );
    assert_eq!(file_names(dir.path()), vec!["The Show S01E01.mp4"]);
    assert_eq!(
        std::fs::read(dir.path().join("The Show S01E01.mp4")).unwrap(),
        COMPATIBLE
    );
    assert_eq!(notifier.sections(), vec![2]);
    assert_eq!(tool.encode_count(), 1);
}

#[tokio::test]
async fn test_encode_request_uses_source_channels() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "Movie.2019.avi", INCOMPATIBLE, OLD);

    let config = test_config(dir.path(), 1);
    let tool = StubTool::new();
    let scanner = scanner(&config, tool.clone(), RecordingNotifier::new());
    scanner.scan(dir.path(), 1).await.unwrap();

    let requests = tool.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.input, dir.path().join("Movie.2019.avi"));
    assert_eq!(request.output, dir.path().join(TEMP_FILE_NAME));
    assert_eq!(request.audio_channels, 6);
    assert_eq!(request.audio_bitrate, "384k");
    assert_eq!(request.video_encoder, "libx264");
    assert_eq!(request.crf, 23);
}

#[tokio::test]
async fn test_recent_file_is_left_alone() {
    let dir = tempdir().unwrap();
    write_aged(
        dir.path(),
        "Copying.mkv",
        INCOMPATIBLE,
        Duration::from_secs(60),
    );

    let config = test_config(dir.path(), 1);
    let tool = StubTool::new();
    let notifier = RecordingNotifier::new();
    let scanner = scanner(&config, tool.clone(), notifier.clone());

    let summary = scanner.scan(dir.path(), 1).await.unwrap();

    assert_eq!(summary.candidates, 1);
    assert_eq!(summary.skipped_recent, 1);
    assert_eq!(tool.probe_count(), 0);
    assert_eq!(tool.encode_count(), 0);
    assert_eq!(file_names(dir.path()), vec!["Copying.mkv"]);
    assert!(notifier.sections().is_empty());
}

#[tokio::test]
async fn test_failed_conversion_keeps_source() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "Broken.Movie.mkv", INCOMPATIBLE, OLD);

    let config = test_config(dir.path(), 1);
    let tool = StubTool::failing();
    let notifier = RecordingNotifier::new();
    let scanner = scanner(&config, tool.clone(), notifier.clone());

    let summary = scanner.scan(dir.path(), 1).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.converted, 0);
    assert_eq!(file_names(dir.path()), vec!["Broken.Movie.mkv"]);
    assert_eq!(
        std::fs::read(dir.path().join("Broken.Movie.mkv")).unwrap(),
        INCOMPATIBLE
    );
    assert!(!dir.path().join(TEMP_FILE_NAME).exists());
    assert!(notifier.sections().is_empty());
}

#[tokio::test]
async fn test_second_pass_converts_nothing() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "Show.S01E01.HDTV.mkv", INCOMPATIBLE, OLD);
    write_aged(dir.path(), "Show.S01E02.HDTV.mkv", INCOMPATIBLE, OLD);

    let mut config = test_config(dir.path(), 2);
    let tool = StubTool::new();
    let notifier = RecordingNotifier::new();

    let first = scanner(&config, tool.clone(), notifier.clone())
        .scan(dir.path(), 2)
        .await
        .unwrap();
    assert_eq!(first.converted, 2);

    // Converted files are brand new; drop the threshold so they get probed.
    config.scan.stability_secs = 0;
    let second = scanner(&config, tool.clone(), notifier.clone())
        .scan(dir.path(), 2)
        .await
        .unwrap();

    assert_eq!(second.candidates, 2);
    assert_eq!(second.converted, 0);
    assert_eq!(second.skipped_compatible, 2);
    assert_eq!(tool.encode_count(), 2);
    assert_eq!(notifier.sections(), vec![2, 2]);
    assert_eq!(
        file_names(dir.path()),
        vec!["Show S01E01.mp4", "Show S01E02.mp4"]
    );
}

#[tokio::test]
async fn test_compatible_file_is_not_renamed() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "Movie.1080p.mp4", COMPATIBLE, OLD);

    let config = test_config(dir.path(), 1);
    let tool = StubTool::new();
    let summary = scanner(&config, tool.clone(), RecordingNotifier::new())
        .scan(dir.path(), 1)
        .await
        .unwrap();

    assert_eq!(summary.skipped_compatible, 1);
    assert_eq!(tool.encode_count(), 0);
    assert_eq!(file_names(dir.path()), vec!["Movie.1080p.mp4"]);
}

#[tokio::test]
async fn test_unprobeable_file_is_skipped() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "Corrupt.mkv", UNPROBEABLE, OLD);

    let config = test_config(dir.path(), 1);
    let tool = StubTool::new();
    let notifier = RecordingNotifier::new();
    let summary = scanner(&config, tool.clone(), notifier.clone())
        .scan(dir.path(), 1)
        .await
        .unwrap();

    assert_eq!(summary.probe_failed, 1);
    assert_eq!(tool.encode_count(), 0);
    assert_eq!(file_names(dir.path()), vec!["Corrupt.mkv"]);
    assert!(notifier.sections().is_empty());
}

#[tokio::test]
async fn test_only_listed_extensions_are_candidates() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "Show.MKV", INCOMPATIBLE, OLD);
    write_aged(dir.path(), "Show.srt", INCOMPATIBLE, OLD);
    write_aged(dir.path(), "cover.jpg", INCOMPATIBLE, OLD);
    write_aged(dir.path(), "Show.m4v", INCOMPATIBLE, OLD);

    let config = test_config(dir.path(), 1);
    let tool = StubTool::new();
    let summary = scanner(&config, tool.clone(), RecordingNotifier::new())
        .scan(dir.path(), 1)
        .await
        .unwrap();

    assert_eq!(summary.candidates, 1);
    assert_eq!(summary.converted, 1);
    assert_eq!(
        file_names(dir.path()),
        vec!["Show.m4v", "Show.mp4", "Show.srt", "cover.jpg"]
    );
}

#[tokio::test]
async fn test_temp_file_is_not_a_candidate() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), TEMP_FILE_NAME, INCOMPATIBLE, OLD);

    let config = test_config(dir.path(), 1);
    let tool = StubTool::new();
    let summary = scanner(&config, tool.clone(), RecordingNotifier::new())
        .scan(dir.path(), 1)
        .await
        .unwrap();

    assert_eq!(summary.candidates, 0);
    assert_eq!(tool.probe_count(), 0);
}

#[tokio::test]
async fn test_stale_temp_is_replaced() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), TEMP_FILE_NAME, b"left over from a crash", OLD);
    write_aged(dir.path(), "Film.x265.mkv", INCOMPATIBLE, OLD);

    let config = test_config(dir.path(), 1);
    let summary = scanner(&config, StubTool::new(), RecordingNotifier::new())
        .scan(dir.path(), 1)
        .await
        .unwrap();

    assert_eq!(summary.converted, 1);
    assert_eq!(file_names(dir.path()), vec!["Film.mp4"]);
}

#[tokio::test]
async fn test_nested_files_convert_in_place() {
    let dir = tempdir().unwrap();
    write_aged(
        dir.path(),
        "Show/Season 1/Show.S01E01.WEB-DL.mkv",
        INCOMPATIBLE,
        OLD,
    );
    write_aged(dir.path(), "Other/Other.S02E05.mov", INCOMPATIBLE, OLD);

    let config = test_config(dir.path(), 2);
    let notifier = RecordingNotifier::new();
    let summary = scanner(&config, StubTool::new(), notifier.clone())
        .scan(dir.path(), 2)
        .await
        .unwrap();

    assert_eq!(summary.converted, 2);
    assert_eq!(
        file_names(&dir.path().join("Show/Season 1")),
        vec!["Show S01E01.mp4"]
    );
    assert_eq!(
        file_names(&dir.path().join("Other")),
        vec!["Other S02E05.mp4"]
    );
    assert_eq!(notifier.sections(), vec![2, 2]);
}

#[tokio::test]
async fn test_one_bad_file_does_not_stop_the_scan() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "A.Corrupt.mkv", UNPROBEABLE, OLD);
    write_aged(dir.path(), "B.Good.mkv", INCOMPATIBLE, OLD);

    let config = test_config(dir.path(), 1);
    let summary = scanner(&config, StubTool::new(), RecordingNotifier::new())
        .scan(dir.path(), 1)
        .await
        .unwrap();

    assert_eq!(summary.probe_failed, 1);
    assert_eq!(summary.converted, 1);
}

#[tokio::test]
async fn test_missing_root_is_an_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("not-here");

    let config = test_config(&missing, 1);
    let result = scanner(&config, StubTool::new(), RecordingNotifier::new())
        .scan(&missing, 1)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_process_file_reports_outcome() {
    let dir = tempdir().unwrap();
    let path = write_aged(dir.path(), "Clip.DVDRip.avi", INCOMPATIBLE, OLD);

    let config = test_config(dir.path(), 1);
    let outcome = scanner(&config, StubTool::new(), RecordingNotifier::new())
        .process_file(&path, 1, std::time::SystemTime::now())
        .await;

    assert_matches!(outcome, FileOutcome::Converted(p) if p == dir.path().join("Clip.mp4"));
}

#[tokio::test]
async fn test_settle_pause_follows_each_conversion() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "Movie.mkv", INCOMPATIBLE, OLD);

    let mut config = test_config(dir.path(), 1);
    config.scan.settle_secs = 1;

    let started = tokio::time::Instant::now();
    let summary = scanner(&config, StubTool::new(), RecordingNotifier::new())
        .scan(dir.path(), 1)
        .await
        .unwrap();

    assert_eq!(summary.converted, 1);
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_cancel_cuts_settle_pause_short() {
    let dir = tempdir().unwrap();
    write_aged(dir.path(), "A.Movie.mkv", INCOMPATIBLE, OLD);
    write_aged(dir.path(), "B.Movie.mkv", INCOMPATIBLE, OLD);

    let mut config = test_config(dir.path(), 1);
    config.scan.settle_secs = 3600;

    let cancel = CancellationToken::new();
    let tool = StubTool::new();
    let notifier = RecordingNotifier::new();
    let scanner = scanner(&config, tool.clone(), notifier.clone()).with_cancel(cancel.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();
    });

    let summary = tokio::time::timeout(Duration::from_secs(10), scanner.scan(dir.path(), 1))
        .await
        .expect("settle pause was not interrupted")
        .unwrap();

    // The first file converts and notifies; the pause is cut short and the
    // second file is never started.
    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.converted, 1);
    assert_eq!(tool.encode_count(), 1);
    assert_eq!(notifier.sections(), vec![1]);
    assert_eq!(file_names(dir.path()), vec!["A Movie.mp4", "B.Movie.mkv"]);
}
