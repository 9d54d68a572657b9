//! Disk usage cache scenarios, including the scheduled full recompute.

use cubby_core::Owner;
use cubby_worker::TaskHandler;
use cubby_worker::jobs::DiskUsageTask;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_empty_directories_report_zero() {
    let app = TestApp::new();
    let alice = Owner::user("alice");
    app.state.files.add_directory(&alice, "/a/b/c").await.unwrap();

    let report = app.state.usage.get(&alice).await;
    assert_eq!(report.used, 0);
    assert_eq!(report.capacity, 10 << 30);
    for dir in ["/a", "/a/b", "/a/b/c"] {
        assert_eq!(app.state.usage.get_directory(&alice, dir), 0, "{dir}");
    }
    assert_eq!(app.state.files.get(&alice, "/a").await.unwrap().size, 0);
}

#[tokio::test]
async fn test_cross_owner_move_updates_both_owners() {
    let app = TestApp::new();
    let alice = Owner::user("alice");
    let bob = Owner::user("bob");
    app.write(&alice, "/out/data.bin", "0123456789").await;
    app.state.files.add_directory(&bob, "/in").await.unwrap();
    assert_eq!(app.state.usage.get(&alice).await.used, 10);
    assert_eq!(app.state.usage.get(&bob).await.used, 0);

    app.state
        .files
        .move_to(&alice, "/out/data.bin", &bob, "/in/data.bin")
        .await
        .unwrap();

    assert_eq!(app.state.usage.get(&alice).await.used, 0);
    assert_eq!(app.state.usage.get_directory(&alice, "/out"), 0);
    assert_eq!(app.state.usage.get(&bob).await.used, 10);
    assert_eq!(app.state.usage.get_directory(&bob, "/in"), 10);
}

#[tokio::test]
async fn test_scheduled_recompute_picks_up_out_of_band_changes() {
    let app = TestApp::new();
    app.create_user("alice").await;
    let alice = Owner::user("alice");
    app.write(&alice, "/docs/a.txt", "abc").await;
    assert_eq!(app.state.usage.get(&alice).await.used, 3);

    std::fs::write(app.users_root().join("alice/docs/b.txt"), b"written by hand").unwrap();
    assert_eq!(app.state.usage.get(&alice).await.used, 3);

    let task = DiskUsageTask::new(
        app.state.usage.clone(),
        app.state.stores.users.clone(),
        app.state.stores.group_folders.clone(),
    );
    let summary = task.run().await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(app.state.usage.get(&alice).await.used, 18);
    assert_eq!(app.state.usage.get_directory(&alice, "/docs"), 18);
}

#[tokio::test]
async fn test_removal_shrinks_every_ancestor() {
    let app = TestApp::new();
    let alice = Owner::user("alice");
    app.write(&alice, "/a/b/one.txt", "1").await;
    app.write(&alice, "/a/b/c/two.txt", "22").await;
    app.write(&alice, "/a/three.txt", "333").await;
    assert_eq!(app.state.usage.get(&alice).await.used, 6);

    app.state.files.remove(&alice, "/a/b").await.unwrap();

    let usage = &app.state.usage;
    assert_eq!(usage.get(&alice).await.used, 3);
    assert_eq!(usage.get_directory(&alice, "/a"), 3);
    assert_eq!(usage.get_directory(&alice, "/a/b"), 0);
    assert_eq!(usage.get_directory(&alice, "/a/b/c"), 0);
}
