use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn new(name: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            is_admin: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub author_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

impl Post {
    pub fn new(title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            author_id: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// One user record ready for batch creation, with its relationship
/// references. `post_ids` must name posts that already exist.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub password_hash: Option<String>,
    pub post_ids: Vec<Uuid>,
}
