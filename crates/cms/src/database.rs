use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{NewUser, Post, User};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Batch-creates posts and returns the created rows, ids included.
    ///
    /// One returned row per input title. Authors are left unset; the author
    /// relationship belongs to later editorial flows, not record creation.
    pub async fn create_posts(&self, titles: &[String]) -> Result<Vec<Post>, AppError> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<Post> = titles.iter().cloned().map(Post::new).collect();

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO posts (id, title, created_at) ");
        qb.push_values(&records, |mut row, post| {
            row.push_bind(post.id)
                .push_bind(&post.title)
                .push_bind(post.created_at);
        });
        qb.push(" RETURNING id, title, author_id, created_at");

        let posts = qb.build_query_as::<Post>().fetch_all(&self.pool).await?;

        Ok(posts)
    }

    /// Batch-creates users together with their post relationship rows.
    ///
    /// Runs in a single transaction: either every user and every connect row
    /// lands, or none do. Each `post_ids` entry must reference an existing
    /// post; the foreign key rejects anything else.
    pub async fn create_users(&self, users: &[NewUser]) -> Result<Vec<User>, AppError> {
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;

        let mut created = Vec::with_capacity(users.len());
        for user in users {
            let row: User = sqlx::query_as(
                r#"
                INSERT INTO users (id, name, email, is_admin, password_hash)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, name, email, is_admin, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.is_admin)
            .bind(&user.password_hash)
            .fetch_one(&mut *tx)
            .await?;

            for post_id in &user.post_ids {
                sqlx::query("INSERT INTO user_posts (user_id, post_id) VALUES ($1, $2)")
                    .bind(row.id)
                    .bind(post_id)
                    .execute(&mut *tx)
                    .await?;
            }

            created.push(row);
        }

        tx.commit().await?;

        Ok(created)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as(
            "SELECT id, name, email, is_admin, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as(
            "SELECT id, name, email, is_admin, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Fetches a user and their stored password hash for credential checks.
    pub async fn get_user_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(User, Option<String>)>, AppError> {
        let row: Option<(Uuid, String, String, bool, time::OffsetDateTime, Option<String>)> =
            sqlx::query_as(
                r#"
                SELECT id, name, email, is_admin, created_at, password_hash
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, name, email, is_admin, created_at, hash)| {
            (
                User {
                    id,
                    name,
                    email,
                    is_admin,
                    created_at,
                },
                hash,
            )
        }))
    }

    pub async fn all_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as(
            "SELECT id, name, email, is_admin, created_at FROM users ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        let post =
            sqlx::query_as("SELECT id, title, author_id, created_at FROM posts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(post)
    }

    pub async fn all_posts(&self) -> Result<Vec<Post>, AppError> {
        let posts =
            sqlx::query_as("SELECT id, title, author_id, created_at FROM posts ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;

        Ok(posts)
    }

    /// Posts referenced by a user's relationship field.
    pub async fn posts_for_user(&self, user_id: Uuid) -> Result<Vec<Post>, AppError> {
        let posts = sqlx::query_as(
            r#"
            SELECT p.id, p.title, p.author_id, p.created_at
            FROM posts p
            JOIN user_posts up ON up.post_id = p.id
            WHERE up.user_id = $1
            ORDER BY p.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Relationship reference count per user, for the admin record tables.
    pub async fn post_count_for_user(&self, user_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM user_posts WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn user_count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn post_count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
