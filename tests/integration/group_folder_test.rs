//! Group folder lifecycle seen through the virtual path translator.

use cubby_core::{ErrorKind, Owner};
use cubby_entity::group_folder::CreateGroupFolder;
use cubby_entity::share::{CreateShare, ShareReceiver};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_members_work_in_the_group_tree() {
    let app = TestApp::new();
    let state = &app.state;
    state
        .group_folders
        .add(CreateGroupFolder {
            id: "eng".into(),
            name: "Engineering".into(),
            folder_path: None,
            members: vec!["alice".into()],
        })
        .await
        .unwrap();

    let translator = &state.translator;
    let resolved = translator
        .translate(Some("alice"), "/groupfolders/eng/specs/api.md")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.owner, Owner::group_folder("eng"));
    assert_eq!(resolved.relative_path, "/specs/api.md");
    assert_eq!(resolved.group.as_ref().map(|g| g.name.as_str()), Some("Engineering"));
    app.write(&resolved.owner, &resolved.relative_path, "v1 api").await;

    assert!(
        translator
            .translate(Some("bob"), "/groupfolders/eng/specs/api.md")
            .await
            .unwrap()
            .is_none()
    );
    state.group_folders.add_member("eng", "bob").await.unwrap();
    assert!(
        translator
            .translate(Some("bob"), "/groupfolders/eng/specs/api.md")
            .await
            .unwrap()
            .is_some()
    );

    let group = Owner::group_folder("eng");
    assert_eq!(state.usage.get(&group).await.used, 6);
    let entry = state.files.get(&group, "/specs").await.unwrap();
    assert_eq!(entry.group.map(|g| g.id), Some("eng".to_string()));
}

#[tokio::test]
async fn test_removing_a_group_folder_revokes_everything() {
    let app = TestApp::new();
    let state = &app.state;
    let group = Owner::group_folder("ops");
    state
        .group_folders
        .add(CreateGroupFolder {
            id: "ops".into(),
            name: "Operations".into(),
            folder_path: None,
            members: vec!["alice".into()],
        })
        .await
        .unwrap();
    app.write(&group, "/runbooks/restart.md", "turn it off and on").await;
    let share = state
        .shares
        .create(CreateShare {
            owner: group.clone(),
            file_path: "/runbooks".into(),
            receiver: ShareReceiver::Link,
            readonly: true,
            expires_at: None,
        })
        .await
        .unwrap();
    assert!(state.usage.get(&group).await.used > 0);

    state.group_folders.remove("ops").await.unwrap();

    assert!(!app.dir.path().join("groups/ops").exists());
    assert!(!state.usage.is_populated(&group));
    assert!(
        state
            .translator
            .translate(Some("alice"), "/groupfolders/ops/runbooks")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        state
            .translator
            .translate(None, &format!("/shares/{}", share.id))
            .await
            .unwrap()
            .is_none()
    );
    let err = state.group_folders.remove("ops").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
