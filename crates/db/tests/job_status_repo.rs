//! Integration tests for job status persistence against a real database.
//!
//! Exercises the SQL behind submission and refresh:
//! - Upsert and find of the JSONB map
//! - Compare-and-replace accepted and refused
//! - Corrupt persisted values
//! - Project input loading through `PgJobStore`

use assert_matches::assert_matches;
use reelforge_core::job_status::{JobStatus, JobStatusMap};
use reelforge_core::stage::GenerationStage;
use reelforge_db::repositories::GenerationJobStatusRepo;
use reelforge_db::{JobStore, PgJobStore, StoreError};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_project(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO projects (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn map(entries: &[(&str, JobStatus)]) -> JobStatusMap {
    let mut map = JobStatusMap::new();
    for (handle, status) in entries {
        map.insert(*handle, status.clone());
    }
    map
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_upsert_then_find(pool: PgPool) {
    let project_id = insert_project(&pool, "Upsert").await;
    let value = json!({"h1": "pending", "h2": "https://cdn/x.mp4"});

    GenerationJobStatusRepo::upsert(&pool, project_id, "clip", &value)
        .await
        .unwrap();

    let row = GenerationJobStatusRepo::find(&pool, project_id, "clip")
        .await
        .unwrap()
        .expect("row should exist");
    assert_eq!(row.project_id, project_id);
    assert_eq!(row.stage, "clip");
    assert_eq!(row.job_status, value);

    // The other stage is independent.
    assert!(GenerationJobStatusRepo::find(&pool, project_id, "keyframe")
        .await
        .unwrap()
        .is_none());

    // A second upsert replaces the map whole.
    let replaced = json!({"h9": "pending"});
    GenerationJobStatusRepo::upsert(&pool, project_id, "clip", &replaced)
        .await
        .unwrap();
    let row = GenerationJobStatusRepo::find(&pool, project_id, "clip")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.job_status, replaced);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_compare_and_replace_succeeds_on_match(pool: PgPool) {
    let project_id = insert_project(&pool, "Swap").await;
    let before = json!({"h1": "pending", "h2": "pending"});
    GenerationJobStatusRepo::upsert(&pool, project_id, "clip", &before)
        .await
        .unwrap();

    let after = json!({"h1": "https://cdn/x.mp4", "h2": "pending"});
    let swapped = GenerationJobStatusRepo::compare_and_replace(
        &pool,
        project_id,
        "clip",
        &json!({"h2": "pending", "h1": "pending"}),
        &after,
    )
    .await
    .unwrap();

    assert!(swapped);
    let row = GenerationJobStatusRepo::find(&pool, project_id, "clip")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.job_status, after);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_compare_and_replace_refused_after_other_write(pool: PgPool) {
    let project_id = insert_project(&pool, "Race").await;
    let read = json!({"h1": "pending", "h2": "pending"});
    GenerationJobStatusRepo::upsert(&pool, project_id, "clip", &read)
        .await
        .unwrap();

    // Another pass lands first.
    let concurrent = json!({"h1": "pending", "h2": "failed"});
    GenerationJobStatusRepo::upsert(&pool, project_id, "clip", &concurrent)
        .await
        .unwrap();

    let swapped = GenerationJobStatusRepo::compare_and_replace(
        &pool,
        project_id,
        "clip",
        &read,
        &json!({"h1": "https://cdn/x.mp4", "h2": "pending"}),
    )
    .await
    .unwrap();

    assert!(!swapped);
    let row = GenerationJobStatusRepo::find(&pool, project_id, "clip")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.job_status, concurrent);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_compare_and_replace_without_row_is_refused(pool: PgPool) {
    let project_id = insert_project(&pool, "Missing").await;

    let swapped = GenerationJobStatusRepo::compare_and_replace(
        &pool,
        project_id,
        "keyframe",
        &json!({}),
        &json!({"h1": "pending"}),
    )
    .await
    .unwrap();

    assert!(!swapped);
}

// ---------------------------------------------------------------------------
// PgJobStore
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_store_round_trips_typed_maps(pool: PgPool) {
    let project_id = insert_project(&pool, "Typed").await;
    let store = PgJobStore::new(pool);

    let initial = map(&[("h1", JobStatus::Pending), ("h2", JobStatus::Pending)]);
    store
        .replace_job_status(project_id, GenerationStage::Clip, &initial)
        .await
        .unwrap();

    let progressed = map(&[
        ("h1", JobStatus::completed("https://cdn/x.mp4")),
        ("h2", JobStatus::Pending),
    ]);
    assert!(store
        .compare_and_replace_job_status(project_id, GenerationStage::Clip, &initial, &progressed)
        .await
        .unwrap());

    // The stale copy no longer matches.
    assert!(!store
        .compare_and_replace_job_status(project_id, GenerationStage::Clip, &initial, &initial)
        .await
        .unwrap());

    let loaded = store
        .load_job_status(project_id, GenerationStage::Clip)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded, progressed);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_store_reports_corrupt_map(pool: PgPool) {
    let project_id = insert_project(&pool, "Corrupt").await;
    GenerationJobStatusRepo::upsert(&pool, project_id, "clip", &json!({"h1": 42}))
        .await
        .unwrap();
    let store = PgJobStore::new(pool);

    let result = store
        .load_job_status(project_id, GenerationStage::Clip)
        .await;

    assert_matches!(
        result,
        Err(StoreError::Corrupt { stage: GenerationStage::Clip, .. })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_store_loads_project_inputs_in_order(pool: PgPool) {
    let project_id = insert_project(&pool, "Inputs").await;
    for position in [1, 0] {
        sqlx::query(
            "INSERT INTO scenes (project_id, position, description) VALUES ($1, $2, $3)",
        )
        .bind(project_id)
        .bind(position)
        .bind(format!("Scene {position}"))
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO frame_pairs (project_id, position, first_frame_url, last_frame_url) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(project_id)
        .bind(position)
        .bind(format!("https://cdn/{position}a.png"))
        .bind(format!("https://cdn/{position}b.png"))
        .execute(&pool)
        .await
        .unwrap();
    }
    let store = PgJobStore::new(pool);

    let inputs = store.load_project(project_id).await.unwrap().unwrap();
    assert_eq!(inputs.project_id, project_id);
    let scene_positions: Vec<_> = inputs.scenes.iter().map(|s| s.position).collect();
    assert_eq!(scene_positions, vec![0, 1]);
    assert_eq!(inputs.frame_pairs[1].first_frame_url, "https://cdn/1a.png");

    assert!(store.load_project(project_id + 1000).await.unwrap().is_none());
}
