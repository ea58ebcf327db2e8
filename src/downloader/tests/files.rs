use super::*;

#[tokio::test]
async fn test_delete_emits_event_only_when_file_removed() {
    let (downloader, _stand_in, _temp_dir) = create_test_downloader(PROGRESS_SCRIPT).await;
    let mut events = downloader.subscribe();

    let path = downloader.store().root().join("clip.mp4");
    tokio::fs::write(&path, b"data").await.unwrap();

    assert!(downloader.delete_file("clip.mp4").await.unwrap());
    assert!(!downloader.delete_file("clip.mp4").await.unwrap());

    match events.try_recv().unwrap() {
        Event::FileDeleted { name } => assert_eq!(name, "clip.mp4"),
        other => panic!("expected FileDeleted, got {other:?}"),
    }
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_delete_rejects_traversal() {
    let (downloader, _stand_in, temp_dir) = create_test_downloader(PROGRESS_SCRIPT).await;

    let outside = temp_dir.path().join("outside.txt");
    tokio::fs::write(&outside, b"keep").await.unwrap();

    let result = downloader.delete_file("../outside.txt").await;
    assert!(matches!(result, Err(Error::InvalidFileName { .. })));
    assert!(outside.exists());
}

#[tokio::test]
async fn test_clear_all_reports_count_and_emits_event() {
    let (downloader, _stand_in, _temp_dir) = create_test_downloader(PROGRESS_SCRIPT).await;
    let mut events = downloader.subscribe();

    for name in ["a.mp4", "b.m4a", "c.webm"] {
        tokio::fs::write(downloader.store().root().join(name), b"x")
            .await
            .unwrap();
    }

    assert_eq!(downloader.clear_all().await.unwrap(), 3);
    assert!(downloader.list_files().await.unwrap().is_empty());

    match events.try_recv().unwrap() {
        Event::FilesCleared { deleted } => assert_eq!(deleted, 3),
        other => panic!("expected FilesCleared, got {other:?}"),
    }
}

#[tokio::test]
async fn test_completed_job_output_is_listed() {
    let script = "\
out=''
while [ $# -gt 0 ]; do
  if [ \"$1\" = '-o' ]; then out=\"$2\"; fi
  shift
done
echo '[download] 100.0%'
printf 'media' > \"$(echo \"$out\" | sed 's/%(title)s/Test Clip/; s/%(ext)s/mp4/')\"
exit 0
";
    let (downloader, _stand_in, _temp_dir) = create_test_downloader(script).await;

    let status = downloader
        .run_to_completion("https://example.com/watch?v=7", FormatSelector::VideoCapped)
        .await
        .unwrap();
    assert_eq!(status.state, JobState::Succeeded);

    let files = downloader.list_files().await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "Test Clip.mp4");
    assert_eq!(files[0].size_bytes, 5);

    let served = downloader.open_file("Test Clip.mp4").await.unwrap();
    assert_eq!(served.content_type, "video/mp4");
    assert_eq!(served.len, 5);
}
