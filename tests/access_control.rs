mod common;

use image_search_orchestrator::access::AccessControl;
use image_search_orchestrator::repo::{FolderRepo, ShareRepo};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn owner_may_read_own_folder() {
    let pool = common::setup_test_db().await;
    let alice = common::insert_test_user(&pool, "alice_owner").await;

    let folders = FolderRepo::new(pool.clone());
    let shares = ShareRepo::new(pool.clone());
    let access = AccessControl::new(folders.clone(), shares);

    let (folder, created) = folders.get_or_create(alice, "cats").await.unwrap();
    assert!(created);

    assert!(access.may_read(alice, folder.id).await.unwrap());
    assert!(access.is_owner(alice, folder.id).await.unwrap());
}

#[tokio::test]
#[serial]
async fn stranger_cannot_read_unshared_folder() {
    let pool = common::setup_test_db().await;
    let alice = common::insert_test_user(&pool, "alice_stranger").await;
    let bob = common::insert_test_user(&pool, "bob_stranger").await;

    let folders = FolderRepo::new(pool.clone());
    let shares = ShareRepo::new(pool.clone());
    let access = AccessControl::new(folders.clone(), shares);

    let (folder, _) = folders.get_or_create(alice, "private").await.unwrap();

    assert!(!access.may_read(bob, folder.id).await.unwrap());

    // spec.md §8: search(folder_ids=[folder]) silently filters, not 403.
    let readable = access.filter_readable(bob, &[folder.id]).await.unwrap();
    assert!(readable.is_empty());
}

#[tokio::test]
#[serial]
async fn sharing_grants_read_access_and_appears_in_accessible_list() {
    let pool = common::setup_test_db().await;
    let alice = common::insert_test_user(&pool, "alice_sharer").await;
    let bob = common::insert_test_user(&pool, "bob_sharer").await;

    let folders = FolderRepo::new(pool.clone());
    let shares = ShareRepo::new(pool.clone());
    let access = AccessControl::new(folders.clone(), shares.clone());

    let (folder, _) = folders.get_or_create(alice, "vacation").await.unwrap();
    shares.upsert(folder.id, alice, bob, "view").await.unwrap();

    assert!(access.may_read(bob, folder.id).await.unwrap());
    assert!(!access.is_owner(bob, folder.id).await.unwrap());

    let bobs_folders = folders.accessible_to_user(bob).await.unwrap();
    let shared = bobs_folders.iter().find(|f| f.id == folder.id).unwrap();
    assert!(shared.is_shared);
    assert!(!shared.is_owner);
    assert_eq!(shared.owner_username, "alice_sharer");
}
