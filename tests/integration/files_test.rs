//! Mutation engine scenarios across owners.

use cubby_core::{ErrorKind, Owner};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_escaping_paths_never_reach_another_owner() {
    let app = TestApp::new();
    let alice = Owner::user("alice");
    let bob = Owner::user("bob");
    app.write(&bob, "/secret.txt", "bob only").await;

    for path in ["/../bob/secret.txt", "../../users/bob/secret.txt", "a/../../bob"] {
        let err = app.state.files.get(&alice, path).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath, "{path}");
        let err = app.state.files.remove(&alice, path).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath, "{path}");
    }
    assert!(
        app.state
            .translator
            .translate(Some("alice"), "/home/../../users/bob/secret.txt")
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(app.read(&bob, "/secret.txt").await, "bob only");
}

#[tokio::test]
async fn test_overwrite_leaves_no_temporary_files() {
    let app = TestApp::new();
    let alice = Owner::user("alice");
    let files = &app.state.files;

    app.write(&alice, "/notes/today.md", "first draft").await;
    let err = files
        .add_or_overwrite_file_contents(&alice, "/notes/today.md", "clobber", None, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);

    files
        .add_or_overwrite_file_contents(&alice, "/notes/today.md", "final", None, true)
        .await
        .unwrap();
    assert_eq!(app.read(&alice, "/notes/today.md").await, "final");

    let leftovers: Vec<String> = std::fs::read_dir(app.users_root().join("alice/notes"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec!["today.md".to_string()]);
}

#[tokio::test]
async fn test_copy_move_and_listing_round_trip() {
    let app = TestApp::new();
    let alice = Owner::user("alice");
    let files = &app.state.files;

    files.add_directory(&alice, "/projects/cubby").await.unwrap();
    app.write(&alice, "/projects/cubby/readme.md", "# cubby").await;

    files
        .copy_to(&alice, "/projects", &alice, "/backup")
        .await
        .unwrap();
    files
        .move_to(&alice, "/projects/cubby", &alice, "/archive")
        .await
        .unwrap();

    assert_eq!(app.read(&alice, "/backup/cubby/readme.md").await, "# cubby");
    assert_eq!(app.read(&alice, "/archive/readme.md").await, "# cubby");

    let root = files.get(&alice, "/").await.unwrap();
    let names: Vec<&str> = root.files.iter().map(|e| e.file_name.as_str()).collect();
    assert_eq!(names, vec!["archive", "backup", "projects"]);
    let projects = files.get(&alice, "/projects").await.unwrap();
    assert!(projects.files.is_empty());
    assert_eq!(projects.size, 0);

    let err = files
        .move_to(&alice, "/archive", &alice, "/backup")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyExists);
    let err = files
        .move_to(&alice, "/backup", &alice, "/backup/cubby/nested")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadState);
    let err = files
        .copy_to(&alice, "/missing", &alice, "/elsewhere")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
