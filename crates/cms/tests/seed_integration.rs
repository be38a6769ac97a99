//! Integration tests for demonstration-data seeding.
//!
//! These tests verify end-to-end seeding behavior: batch creation order,
//! relationship connect semantics, and the documented non-idempotency.
//!
//! To run them you need a PostgreSQL database and the DATABASE_URL
//! environment variable set; they are skipped otherwise.
//!
//! Run with: `DATABASE_URL=postgres://... cargo test -p cms --test seed_integration`

use cms::auth::verify_password;
use cms::database::Database;
use cms::models::NewUser;
use cms::seed::seed_demo_data;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::env;
use uuid::Uuid;

const SEED_TITLES: [&str; 4] = [
    "Hello Everyone",
    "Talking about React",
    "React is the Best",
    "GraphQL Rocks",
];

const SEED_EMAILS: [&str; 2] = ["john@duck.com", "bartduisters@bartduisters.com"];

/// Get database pool, skipping tests if DATABASE_URL is not set.
async fn get_test_pool() -> Option<PgPool> {
    let database_url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: DATABASE_URL not set");
            return None;
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: Failed to connect to database: {e}");
            return None;
        }
    };

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// Removes every record the seeder creates, in FK order.
async fn cleanup_seeded_data(pool: &PgPool) {
    let _ = sqlx::query(
        "DELETE FROM user_posts WHERE user_id IN (SELECT id FROM users WHERE email = ANY($1))",
    )
    .bind(&SEED_EMAILS[..])
    .execute(pool)
    .await;
    let _ = sqlx::query("DELETE FROM users WHERE email = ANY($1)")
        .bind(&SEED_EMAILS[..])
        .execute(pool)
        .await;
    let _ = sqlx::query("DELETE FROM posts WHERE title = ANY($1)")
        .bind(&SEED_TITLES[..])
        .execute(pool)
        .await;
}

async fn seeded_post_count(pool: &PgPool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE title = ANY($1)")
        .bind(&SEED_TITLES[..])
        .fetch_one(pool)
        .await
        .expect("Failed to count posts");
    count
}

#[tokio::test]
async fn test_seed_demo_dataset_end_to_end() {
    let Some(pool) = get_test_pool().await else {
        return;
    };
    cleanup_seeded_data(&pool).await;

    let db = Database::new(pool.clone());
    let summary = seed_demo_data(&db).await.expect("First seed run failed");
    assert_eq!(summary.posts, 4);
    assert_eq!(summary.users, 2);
    assert_eq!(seeded_post_count(&pool).await, 4);

    // John Duck references exactly the React posts and is not an admin.
    let john = db
        .get_user_by_email("john@duck.com")
        .await
        .expect("Failed to fetch user")
        .expect("John Duck was not seeded");
    assert_eq!(john.name, "John Duck");
    assert!(!john.is_admin);

    let mut john_titles: Vec<String> = db
        .posts_for_user(john.id)
        .await
        .expect("Failed to fetch posts")
        .into_iter()
        .map(|p| p.title)
        .collect();
    john_titles.sort();
    assert_eq!(john_titles, vec!["React is the Best", "Talking about React"]);

    // Barry is an admin with no post references.
    let barry = db
        .get_user_by_email("bartduisters@bartduisters.com")
        .await
        .expect("Failed to fetch user")
        .expect("Barry was not seeded");
    assert_eq!(barry.name, "Barry");
    assert!(barry.is_admin);
    assert!(
        db.posts_for_user(barry.id)
            .await
            .expect("Failed to fetch posts")
            .is_empty()
    );

    // No seeded post gained an author back-reference.
    let (authored,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM posts WHERE title = ANY($1) AND author_id IS NOT NULL",
    )
    .bind(&SEED_TITLES[..])
    .fetch_one(&pool)
    .await
    .expect("Failed to count authored posts");
    assert_eq!(authored, 0);

    // The stored credential is a verifiable hash, not the plaintext.
    let (_, hash) = db
        .get_user_with_password("john@duck.com")
        .await
        .expect("Failed to fetch credentials")
        .expect("John Duck was not seeded");
    let hash = hash.expect("Seeded user has no password hash");
    assert_ne!(hash, "dolphins");
    assert!(verify_password("dolphins", &hash).expect("Hash did not parse"));

    // A second run duplicates posts, then fails the user batch on the email
    // unique constraint.
    let err = seed_demo_data(&db)
        .await
        .expect_err("Second seed run should fail");
    assert!(err.is_unique_violation(), "unexpected error: {err}");
    assert_eq!(seeded_post_count(&pool).await, 8);

    cleanup_seeded_data(&pool).await;
}

#[tokio::test]
async fn test_create_posts_returns_one_row_per_title() {
    let Some(pool) = get_test_pool().await else {
        return;
    };
    let db = Database::new(pool.clone());

    let test_id = Uuid::new_v4();
    let titles: Vec<String> = (0..3).map(|i| format!("Batch {test_id} #{i}")).collect();

    let created = db.create_posts(&titles).await.expect("Batch create failed");
    assert_eq!(created.len(), 3);

    // One result per input item; no ordering guarantee is relied upon.
    let mut created_titles: Vec<&str> = created.iter().map(|p| p.title.as_str()).collect();
    created_titles.sort();
    assert_eq!(created_titles, titles.iter().map(String::as_str).collect::<Vec<_>>());
    for post in &created {
        assert!(post.author_id.is_none());
    }

    let _ = sqlx::query("DELETE FROM posts WHERE title LIKE $1")
        .bind(format!("Batch {test_id}%"))
        .execute(&pool)
        .await;
}

#[tokio::test]
async fn test_create_users_rejects_reference_to_missing_post() {
    let Some(pool) = get_test_pool().await else {
        return;
    };
    let db = Database::new(pool.clone());

    let email = format!("ghost-{}@example.com", Uuid::new_v4());
    let record = NewUser {
        name: "Ghost".to_string(),
        email: email.clone(),
        is_admin: false,
        password_hash: None,
        post_ids: vec![Uuid::new_v4()],
    };

    let err = db
        .create_users(std::slice::from_ref(&record))
        .await
        .expect_err("Connecting a nonexistent post id should fail");
    assert!(!err.is_unique_violation());

    // The transaction rolled back: no half-created user remains.
    let user = db
        .get_user_by_email(&email)
        .await
        .expect("Failed to fetch user");
    assert!(user.is_none());
}
