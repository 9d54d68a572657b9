//! Shares seen through the virtual path translator.

use chrono::{Duration, Utc};

use cubby_core::{ErrorKind, Owner};
use cubby_entity::share::{CreateShare, ShareReceiver};
use cubby_service::Namespace;

use crate::helpers::TestApp;

fn share_of(owner: &Owner, path: &str, receiver: ShareReceiver) -> CreateShare {
    CreateShare {
        owner: owner.clone(),
        file_path: path.to_string(),
        receiver,
        readonly: true,
        expires_at: None,
    }
}

#[tokio::test]
async fn test_receiver_reads_through_share() {
    let app = TestApp::new();
    app.create_user("bob").await;
    let alice = Owner::user("alice");
    app.write(&alice, "/docs/report.txt", "quarterly numbers").await;
    app.write(&alice, "/private.txt", "not shared").await;

    let share = app
        .state
        .shares
        .create(share_of(&alice, "/docs", ShareReceiver::User("bob".into())))
        .await
        .unwrap();
    assert!(share.id.starts_with("sid-"));

    let translator = &app.state.translator;
    let virtual_path = format!("/shares/{}/report.txt", share.id);
    let resolved = translator
        .translate(Some("bob"), &virtual_path)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.namespace, Namespace::Shares);
    assert_eq!(resolved.owner, alice);
    assert_eq!(resolved.relative_path, "/docs/report.txt");
    assert!(resolved.readonly);
    assert_eq!(
        app.read(&resolved.owner, &resolved.relative_path).await,
        "quarterly numbers"
    );

    assert!(translator.translate(Some("carol"), &virtual_path).await.unwrap().is_none());
    assert!(translator.translate(None, &virtual_path).await.unwrap().is_none());
    let climbing = format!("/shares/{}/../../home/private.txt", share.id);
    let own_home = translator.translate(Some("bob"), &climbing).await.unwrap().unwrap();
    assert_eq!(own_home.namespace, Namespace::Home);
    assert_eq!(own_home.owner, Owner::user("bob"));

    let received = app.state.shares.list_received("bob").await.unwrap();
    assert_eq!(received.len(), 1);
    let docs = app.state.files.get(&alice, "/docs").await.unwrap();
    assert_eq!(docs.shared_with[0].id, share.id);
}

#[tokio::test]
async fn test_public_links_expire() {
    let app = TestApp::new();
    let alice = Owner::user("alice");
    app.write(&alice, "/pics/cat.jpg", "meow").await;

    let live = app
        .state
        .shares
        .create(share_of(&alice, "/pics", ShareReceiver::Link))
        .await
        .unwrap();
    let mut readonly = share_of(&alice, "/pics/", ShareReceiver::Link);
    readonly.readonly = true;
    let readonly = app.state.shares.create(readonly).await.unwrap();
    assert_ne!(live.id, readonly.id);
    assert!(readonly.readonly);
    assert!(!live.readonly);

    let resolved = app
        .state
        .translator
        .translate(None, &format!("/shares/{}", live.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.relative_path, "/pics");

    let mut expired = share_of(&alice, "/pics/cat.jpg", ShareReceiver::Email("eve@example.com".into()));
    expired.expires_at = Some(Utc::now() - Duration::hours(1));
    let expired = app.state.shares.create(expired).await.unwrap();
    assert!(
        app.state
            .translator
            .translate(None, &format!("/shares/{}", expired.id))
            .await
            .unwrap()
            .is_none()
    );

    app.state.shares.remove(&live.id).await.unwrap();
    assert!(
        app.state
            .translator
            .translate(None, &format!("/shares/{}", live.id))
            .await
            .unwrap()
            .is_none()
    );
    let err = app.state.shares.remove(&live.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
