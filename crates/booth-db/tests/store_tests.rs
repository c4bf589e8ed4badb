//! Integration tests for the transaction store.

use booth_db::{DbError, TransactionStore};
use booth_models::{AccessId, CounterField, ARTIST_COUNT};

async fn store() -> TransactionStore {
    TransactionStore::in_memory().await.unwrap()
}

#[tokio::test]
async fn create_access_inserts_zeroed_counters() {
    let store = store().await;
    let access = AccessId::new();

    store.create_access("U1", &access, 3).await.unwrap();
    assert_eq!(store.counters(&access).await.unwrap(), (0, 0, 0));
    assert_eq!(store.updated_at(&access).await.unwrap(), None);
}

#[tokio::test]
async fn duplicate_access_rejected() {
    let store = store().await;
    let access = AccessId::new();

    store.create_access("U1", &access, 3).await.unwrap();
    assert!(matches!(
        store.create_access("U1", &access, 3).await,
        Err(DbError::DuplicateAccess(_))
    ));
}

#[tokio::test]
async fn increment_bumps_exactly_one_column_and_stamps_updated_at() {
    let store = store().await;
    let access = AccessId::new();
    store.create_access("U1", &access, 1).await.unwrap();

    store
        .increment(&access, CounterField::TakePhoto)
        .await
        .unwrap();

    assert_eq!(store.counters(&access).await.unwrap(), (1, 0, 0));
    assert!(store.updated_at(&access).await.unwrap().is_some());

    store
        .increment(&access, CounterField::SaveAndShare)
        .await
        .unwrap();
    store
        .increment(&access, CounterField::SaveAndShare)
        .await
        .unwrap();
    assert_eq!(store.counters(&access).await.unwrap(), (1, 0, 2));
}

#[tokio::test]
async fn increment_unknown_access_mutates_nothing() {
    let store = store().await;
    let known = AccessId::new();
    store.create_access("U1", &known, 2).await.unwrap();

    let unknown = AccessId::new();
    assert!(matches!(
        store.increment(&unknown, CounterField::TakeVideo).await,
        Err(DbError::AccessNotFound(_))
    ));

    // The known row is untouched
    assert_eq!(store.counters(&known).await.unwrap(), (0, 0, 0));
}

#[tokio::test]
async fn empty_report_zero_fills_all_artists() {
    let store = store().await;
    let report = store.report(1, 10).await.unwrap();

    assert_eq!(report.total_records, 0);
    assert_eq!(report.total_pages, 0);
    assert!(report.data.is_empty());
    assert_eq!(report.sum_by_artist.len(), ARTIST_COUNT as usize);
    assert_eq!(report.save_share_by_artist.len(), ARTIST_COUNT as usize);
    for (i, artist) in report.sum_by_artist.iter().enumerate() {
        assert_eq!(artist.artist_id, i as u32 + 1);
        assert_eq!(artist.total_rows, 0);
    }
}

#[tokio::test]
async fn report_aggregates_by_day_and_artist() {
    let store = store().await;

    // Three visits today: two for artist 4, one for artist 9
    for (user, artist) in [("U1", 4), ("U2", 4), ("U1", 9)] {
        let access = AccessId::new();
        store.create_access(user, &access, artist).await.unwrap();
        if artist == 9 {
            store
                .increment(&access, CounterField::SaveAndShare)
                .await
                .unwrap();
        }
    }

    let report = store.report(1, 10).await.unwrap();
    assert_eq!(report.total_records, 3);
    assert_eq!(report.total_pages, 1);
    assert_eq!(report.data.len(), 1);

    let day = &report.data[0];
    assert_eq!(day.total_rows, 3);
    assert_eq!(day.unique_users, 2);
    assert_eq!(day.total_save_and_share, 1);

    let artist4 = &report.sum_by_artist[3];
    assert_eq!(artist4.artist_id, 4);
    assert_eq!(artist4.total_rows, 2);

    let share9 = &report.save_share_by_artist[8];
    assert_eq!(share9.artist_id, 9);
    assert_eq!(share9.total_save_and_share, 1);

    // Untouched artists stay zero-filled
    assert_eq!(report.sum_by_artist[0].total_rows, 0);
}

#[tokio::test]
async fn report_pagination_clamps_and_pages() {
    let store = store().await;
    for i in 0..5 {
        let access = AccessId::new();
        store
            .create_access(&format!("U{i}"), &access, 1)
            .await
            .unwrap();
    }

    // All rows share one day, so page 2 of size 10 is empty but counts hold
    let report = store.report(2, 10).await.unwrap();
    assert_eq!(report.total_records, 5);
    assert_eq!(report.current_page, 2);
    assert!(report.data.is_empty());

    // Page/limit below 1 are clamped
    let report = store.report(0, 0).await.unwrap();
    assert_eq!(report.current_page, 1);
    assert_eq!(report.page_size, 1);
}
