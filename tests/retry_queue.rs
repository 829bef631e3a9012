mod common;

use image_search_orchestrator::domain::retry_record::PendingImage;
use image_search_orchestrator::repo::RetryQueueRepo;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn failed_embed_request_starts_pending_with_zero_retries() {
    let pool = common::setup_test_db().await;
    let user_id = common::insert_test_user(&pool, "embed_owner").await;
    let repo = RetryQueueRepo::new(pool);

    let images = vec![PendingImage {
        image_id: 1,
        relative_filepath: "images/1/1/a.jpg".to_string(),
    }];

    let id = repo
        .insert_failed_embed(user_id, 1, &images, "connection refused")
        .await
        .unwrap();

    let claimed = repo.claim_pending_embeds(10).await.unwrap();
    let row = claimed.iter().find(|r| r.id == id).unwrap();
    assert_eq!(row.retry_count, 0);
    assert_eq!(row.images.len(), 1);
}

#[tokio::test]
#[serial]
async fn claim_is_atomic_and_does_not_return_in_progress_rows_twice() {
    let pool = common::setup_test_db().await;
    let user_id = common::insert_test_user(&pool, "embed_claim").await;
    let repo = RetryQueueRepo::new(pool);

    repo.insert_failed_embed(user_id, 1, &[], "boom").await.unwrap();

    let first = repo.claim_pending_embeds(10).await.unwrap();
    assert_eq!(first.len(), 1);

    // Already IN_PROGRESS, so a second claim pass finds nothing to do.
    let second = repo.claim_pending_embeds(10).await.unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
#[serial]
async fn row_reaching_max_retries_becomes_failed_and_stops_retrying() {
    let pool = common::setup_test_db().await;
    let user_id = common::insert_test_user(&pool, "embed_exhaust").await;
    let repo = RetryQueueRepo::new(pool);

    let id = repo
        .insert_failed_embed(user_id, 1, &[], "boom")
        .await
        .unwrap();

    repo.claim_pending_embeds(10).await.unwrap();
    repo.mark_embed_failed_or_retry(id, 5, 5, "boom again").await.unwrap();

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.failed_embeds, 1);
    assert_eq!(stats.pending_embeds, 0);

    // FAILED rows are never reclaimed.
    let claimed_again = repo.claim_pending_embeds(10).await.unwrap();
    assert!(claimed_again.is_empty());
}

#[tokio::test]
#[serial]
async fn failure_below_max_retries_reverts_to_pending() {
    let pool = common::setup_test_db().await;
    let user_id = common::insert_test_user(&pool, "embed_retry").await;
    let repo = RetryQueueRepo::new(pool);

    let id = repo
        .insert_failed_embed(user_id, 1, &[], "boom")
        .await
        .unwrap();

    repo.claim_pending_embeds(10).await.unwrap();
    repo.mark_embed_failed_or_retry(id, 1, 5, "still down").await.unwrap();

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.pending_embeds, 1);
    assert_eq!(stats.failed_embeds, 0);

    let reclaimed = repo.claim_pending_embeds(10).await.unwrap();
    assert_eq!(reclaimed.len(), 1);
}
