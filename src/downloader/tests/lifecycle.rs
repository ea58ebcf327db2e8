use super::*;

#[tokio::test]
async fn test_shutdown_refuses_new_jobs() {
    let (downloader, _stand_in, _temp_dir) = create_test_downloader(PROGRESS_SCRIPT).await;
    let mut events = downloader.subscribe();

    assert!(downloader.is_accepting_jobs());
    downloader.shutdown().await.unwrap();
    assert!(!downloader.is_accepting_jobs());

    let result = downloader
        .start_job("https://example.com/watch?v=1", FormatSelector::VideoCapped)
        .await;
    assert!(matches!(result, Err(Error::ShuttingDown)));

    assert!(matches!(events.try_recv().unwrap(), Event::Shutdown));
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let (downloader, _stand_in, _temp_dir) = create_test_downloader(PROGRESS_SCRIPT).await;

    downloader.shutdown().await.unwrap();
    downloader.shutdown().await.unwrap();
    assert_eq!(downloader.active_job_count().await, 0);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_shutdown_cancels_active_jobs() {
    let (downloader, stand_in, _temp_dir) = create_test_downloader(LONG_RUNNING_SCRIPT).await;

    let mut handle = downloader
        .start_job("https://example.com/slow", FormatSelector::VideoCapped)
        .await
        .unwrap();
    assert_eq!(handle.next().await, Some(percent("1.0")));
    let pid = stand_in.read_pid().await;
    assert_eq!(downloader.active_job_count().await, 1);

    tokio::time::timeout(Duration::from_secs(10), downloader.shutdown())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(downloader.active_job_count().await, 0);
    assert_eq!(handle.state(), JobState::Cancelled);
    assert!(wait_until_dead(pid, Duration::from_secs(5)).await);
    assert_eq!(handle.next().await, None);
}

#[tokio::test]
async fn test_shutdown_future_can_run_on_a_spawned_task() {
    fn assert_send<F: std::future::Future + Send>(future: F) -> F {
        future
    }

    let (downloader, _stand_in, _temp_dir) = create_test_downloader(PROGRESS_SCRIPT).await;
    let downloader = std::sync::Arc::new(downloader);

    let task = tokio::spawn({
        let downloader = downloader.clone();
        async move { assert_send(downloader.shutdown()).await }
    });
    task.await.unwrap().unwrap();
    assert!(!downloader.is_accepting_jobs());
}
