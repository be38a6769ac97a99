//! Demonstration data seeding.
//!
//! Populates empty storage with a small fixed dataset: four posts, then two
//! users, one of which holds relationship references to the posts whose
//! title mentions React. Posts must be created first; their assigned ids
//! feed the user batch.
//!
//! The routine is not idempotent. Re-running it against seeded storage
//! duplicates the posts and then fails the user batch on the unique email
//! constraint, so callers gate invocation rather than the routine itself.

use std::sync::LazyLock;

use regex::Regex;
use tracing::info;
use uuid::Uuid;

use crate::auth;
use crate::database::Database;
use crate::errors::AppError;
use crate::models::{NewUser, Post};

/// Case-insensitive whole-word match: "React is the Best" and "REACT rules"
/// qualify, "Reactor" does not.
static REACT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bReact\b").expect("valid title pattern"));

const DEMO_PASSWORD: &str = "dolphins";

/// Counts of records created by a seed run.
#[derive(Debug, Clone, Copy)]
pub struct SeedSummary {
    pub posts: usize,
    pub users: usize,
}

fn demo_post_titles() -> Vec<String> {
    [
        "Hello Everyone",
        "Talking about React",
        "React is the Best",
        "GraphQL Rocks",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn demo_users(react_post_ids: Vec<Uuid>, password_hash: String) -> Vec<NewUser> {
    vec![
        NewUser {
            name: "John Duck".to_string(),
            email: "john@duck.com".to_string(),
            is_admin: false,
            password_hash: Some(password_hash.clone()),
            post_ids: react_post_ids,
        },
        NewUser {
            name: "Barry".to_string(),
            email: "bartduisters@bartduisters.com".to_string(),
            is_admin: true,
            password_hash: Some(password_hash),
            post_ids: Vec::new(),
        },
    ]
}

fn react_post_ids(posts: &[Post]) -> Vec<Uuid> {
    posts
        .iter()
        .filter(|p| REACT_TITLE.is_match(&p.title))
        .map(|p| p.id)
        .collect()
}

/// Seeds the demonstration dataset.
///
/// Two phases with a hard ordering constraint: the post batch completes and
/// reports assigned ids before the user batch is submitted, because the user
/// records connect to those ids. A failure in the post batch aborts the run
/// before any user is created.
pub async fn seed_demo_data(db: &Database) -> Result<SeedSummary, AppError> {
    info!("Seeding posts...");
    let posts = db.create_posts(&demo_post_titles()).await?;
    info!("Seeded {} posts", posts.len());

    let connect = react_post_ids(&posts);
    let password_hash = auth::hash_password(DEMO_PASSWORD)?;

    info!("Seeding users...");
    let users = db.create_users(&demo_users(connect, password_hash)).await?;
    info!("Seeded {} users", users.len());

    Ok(SeedSummary {
        posts: posts.len(),
        users: users.len(),
    })
}
