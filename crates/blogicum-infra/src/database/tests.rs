use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use blogicum_core::domain::{Category, Post};
use blogicum_core::error::RepoError;
use blogicum_core::ports::{BaseRepository, CategoryRepository};

use crate::database::entity::{category, post};
use crate::database::postgres_repo::{
    PostgresCategoryRepository, PostgresPostRepository, postgres_repositories,
};

fn post_model(id: Uuid, author_id: Uuid) -> post::Model {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    post::Model {
        id,
        author_id,
        category_id: None,
        location_id: None,
        title: "Test Post".to_owned(),
        text: "Content".to_owned(),
        pub_date: at.into(),
        is_published: true,
        image: None,
        created_at: at.into(),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(post_id, author_id)]])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.id, post_id);
    assert_eq!(post.author_id, author_id);
}

#[tokio::test]
async fn test_save_updates_existing_row() {
    let post_id = Uuid::new_v4();
    let author_id = Uuid::new_v4();
    let mut updated = post_model(post_id, author_id);
    updated.title = "Renamed".to_owned();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![updated.clone()]])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let saved: Post = repo.save(Post::from(updated)).await.unwrap();

    assert_eq!(saved.id, post_id);
    assert_eq!(saved.title, "Renamed");
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_find_category_by_slug() {
    let category_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![category::Model {
            id: category_id,
            title: "Travel".to_owned(),
            description: "Trips".to_owned(),
            slug: "travel".to_owned(),
            is_published: false,
            created_at: Utc::now().into(),
        }]])
        .into_connection();

    let repo = PostgresCategoryRepository::new(Arc::new(db));

    let found: Option<Category> = repo.find_by_slug("travel").await.unwrap();

    let found = found.unwrap();
    assert_eq!(found.id, category_id);
    assert!(!found.is_published);
}

#[tokio::test]
async fn test_find_missing_category_by_slug() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<category::Model>::new()])
        .into_connection();

    let repo = PostgresCategoryRepository::new(Arc::new(db));

    assert!(repo.find_by_slug("nowhere").await.unwrap().is_none());
}

#[tokio::test]
async fn test_repositories_share_one_connection() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<category::Model>::new()])
            .into_connection(),
    );

    let repos = postgres_repositories(&db);

    assert!(repos.categories.find_by_slug("nowhere").await.unwrap().is_none());
    assert_eq!(Arc::strong_count(&db), 6);
}
