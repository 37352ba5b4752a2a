//! Integration tests for the PostgreSQL remote store
//!
//! These need a running database and are ignored by default:
//! `DATABASE_URL=postgresql://... cargo test -- --ignored`

use std::sync::Arc;

use conclave_api::context_store::{ContextStore, SyncOutcome};
use conclave_api::domain::project::{ProjectContext, ProjectVision, Requirement};
use conclave_api::domain::repositories::RemoteContextStore;
use conclave_api::domain::value_objects::Priority;
use conclave_api::infrastructure::repositories::{InMemoryContextRepository, PostgresRemoteStore};
use conclave_api::infrastructure::EventBus;
use sqlx::PgPool;
use uuid::Uuid;

/// Set up test database connection pool
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database")
}

async fn setup_store(pool: PgPool) -> PostgresRemoteStore {
    let store = PostgresRemoteStore::new(pool);
    store.ensure_schema().await.expect("create schema");
    store
}

/// Clean up test data
async fn cleanup_project(pool: &PgPool, project_id: &str) {
    sqlx::query("DELETE FROM project_contexts WHERE project_id = $1")
        .bind(project_id)
        .execute(pool)
        .await
        .expect("Failed to clean up project");
}

fn unique_project() -> String {
    format!("it-{}", Uuid::new_v4())
}

#[tokio::test]
#[ignore]
async fn test_push_then_pull_round_trips() {
    let pool = setup_test_db().await;
    let remote = setup_store(pool.clone()).await;
    let project_id = unique_project();

    let mut context = ProjectContext::new(
        project_id.clone(),
        ProjectVision::new("Storefront", "Online shop"),
        vec!["ada".to_string()],
    );
    context
        .requirements
        .functional
        .push(Requirement::new("Checkout with gift cards", Priority::High));

    remote.push(&context).await.expect("push");
    let mut pulled = remote
        .pull(&project_id)
        .await
        .expect("pull")
        .expect("project stored");

    pulled.active_context.last_sync = context.active_context.last_sync;
    assert_eq!(pulled, context);

    cleanup_project(&pool, &project_id).await;
}

#[tokio::test]
#[ignore]
async fn test_unknown_project_pulls_nothing() {
    let pool = setup_test_db().await;
    let remote = setup_store(pool).await;

    let pulled = remote.pull(&unique_project()).await.expect("pull");

    assert!(pulled.is_none());
}

#[tokio::test]
#[ignore]
async fn test_push_replaces_previous_copy() {
    let pool = setup_test_db().await;
    let remote = setup_store(pool.clone()).await;
    let project_id = unique_project();

    let mut context = ProjectContext::new(project_id.clone(), ProjectVision::new("Blog", ""), vec![]);
    remote.push(&context).await.expect("first push");
    context.bump_version();
    remote.push(&context).await.expect("second push");

    let pulled = remote.pull(&project_id).await.expect("pull").expect("stored");
    assert_eq!(pulled.version(), 2);

    cleanup_project(&pool, &project_id).await;
}

#[tokio::test]
#[ignore]
async fn test_store_reconciles_against_postgres() {
    let pool = setup_test_db().await;
    let remote: Arc<dyn RemoteContextStore> = Arc::new(setup_store(pool.clone()).await);
    let project_id = unique_project();

    let store = ContextStore::new(
        Arc::new(InMemoryContextRepository::new()),
        Some(remote.clone()),
        EventBus::new(16),
    );
    store
        .create_project(&project_id, ProjectVision::new("Shop", ""), vec![])
        .await
        .expect("create");

    let outcome = store.sync_with_remote(&project_id).await.expect("sync");
    assert_eq!(outcome, SyncOutcome::Pushed(1));

    let outcome = store.sync_with_remote(&project_id).await.expect("sync");
    assert_eq!(outcome, SyncOutcome::InSync(1));

    cleanup_project(&pool, &project_id).await;
}
