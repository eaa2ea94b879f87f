//! Integration tests for the player state slice


use cadence_core::{PersistedPlayerState, PlayerStateStore, PlayerStatus, TrackId};
use cadence_storage::{player_state, SqlitePlayerStateStore};
use test_helpers::TestDb;

fn sample_state() -> PersistedPlayerState {
    PersistedPlayerState {
        queue: vec![TrackId::from("b"), TrackId::from("a"), TrackId::from("c")],
        old_queue: vec![TrackId::from("a"), TrackId::from("b"), TrackId::from("c")],
        cursor: Some(1),
        status: PlayerStatus::Pause,
        origin: Some("/library".to_string()),
    }
}

#[tokio::test]
async fn test_load_without_saved_state() {
    let db = TestDb::new().await;

    assert_eq!(player_state::load(db.pool()).await.unwrap(), None);
}

#[tokio::test]
async fn test_save_and_load() {
    let db = TestDb::new().await;

    player_state::save(db.pool(), &sample_state()).await.unwrap();

    assert_eq!(player_state::load(db.pool()).await.unwrap(), Some(sample_state()));
}

#[tokio::test]
async fn test_save_replaces_previous_state() {
    let db = TestDb::new().await;
    player_state::save(db.pool(), &sample_state()).await.unwrap();

    let stopped = PersistedPlayerState::default();
    player_state::save(db.pool(), &stopped).await.unwrap();

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM player_state")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(player_state::load(db.pool()).await.unwrap(), Some(stopped));
}

#[tokio::test]
async fn test_clear() {
    let db = TestDb::new().await;
    player_state::save(db.pool(), &sample_state()).await.unwrap();

    player_state::clear(db.pool()).await.unwrap();

    assert_eq!(player_state::load(db.pool()).await.unwrap(), None);
}

#[tokio::test]
async fn test_store_adapter_drops_unreadable_state() {
    let db = TestDb::new().await;
    sqlx::query("INSERT INTO player_state (id, state, updated_at) VALUES (1, 'not json', 0)")
        .execute(db.pool())
        .await
        .unwrap();
    let store = SqlitePlayerStateStore::new(db.pool().clone());

    assert_eq!(store.load().await.unwrap(), None);

    store.save(&sample_state()).await.unwrap();
    assert_eq!(store.load().await.unwrap(), Some(sample_state()));
}
