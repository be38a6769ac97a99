//! GraphQL API over the User and Post collections.
//!
//! Query and Mutation resolve through the storage layer; the schema carries
//! the `Database` handle as context data.

use async_graphql::{
    Context, EmptySubscription, ID, InputObject, Object, Result, Schema, SimpleObject,
    http::GraphiQLSource,
};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Extension,
    response::{Html, IntoResponse},
};
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::{auth, database::Database, errors::AppError, models};

pub type CmsSchema = Schema<Query, Mutation, EmptySubscription>;

pub fn build_schema(db: Database, issuer: auth::TokenIssuer) -> CmsSchema {
    Schema::build(Query, Mutation, EmptySubscription)
        .data(db)
        .data(issuer)
        .finish()
}

fn to_graphql_error(err: AppError) -> async_graphql::Error {
    if err.is_unique_violation() {
        return async_graphql::Error::new("Duplicate value for a unique field");
    }
    match err {
        AppError::Database(e) => {
            tracing::error!("Database error: {e}");
            async_graphql::Error::new("Internal server error")
        }
        other => async_graphql::Error::new(other.to_string()),
    }
}

fn parse_id(id: &ID) -> Result<Uuid> {
    Uuid::parse_str(id.as_str()).map_err(|_| async_graphql::Error::new("Invalid id"))
}

/// User type
pub struct User(models::User);

#[Object]
impl User {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn is_admin(&self) -> bool {
        self.0.is_admin
    }

    async fn created_at(&self) -> String {
        self.0.created_at.format(&Rfc3339).unwrap_or_default()
    }

    /// Posts this user references.
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        let db = ctx.data_unchecked::<Database>();
        let posts = db
            .posts_for_user(self.0.id)
            .await
            .map_err(to_graphql_error)?;
        Ok(posts.into_iter().map(Post).collect())
    }
}

/// Post type
pub struct Post(models::Post);

#[Object]
impl Post {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    async fn created_at(&self) -> String {
        self.0.created_at.format(&Rfc3339).unwrap_or_default()
    }

    /// Resolve the author relationship, if set.
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let Some(author_id) = self.0.author_id else {
            return Ok(None);
        };
        let db = ctx.data_unchecked::<Database>();
        let user = db.get_user(author_id).await.map_err(to_graphql_error)?;
        Ok(user.map(User))
    }
}

/// Bearer token plus the authenticated user.
#[derive(SimpleObject)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

/// Reference existing post ids; nested creation is not supported.
#[derive(InputObject)]
pub struct PostRelateToManyInput {
    pub connect: Vec<ID>,
}

#[derive(InputObject)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub is_admin: Option<bool>,
    pub posts: Option<PostRelateToManyInput>,
}

#[derive(InputObject)]
pub struct CreatePostInput {
    pub title: String,
}

fn new_user_record(input: CreateUserInput) -> Result<models::NewUser> {
    let post_ids = input
        .posts
        .map(|rel| rel.connect.iter().map(parse_id).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    let password_hash = auth::hash_password(&input.password).map_err(to_graphql_error)?;

    Ok(models::NewUser {
        name: input.name,
        email: input.email,
        is_admin: input.is_admin.unwrap_or(false),
        password_hash: Some(password_hash),
        post_ids,
    })
}

pub struct Query;

#[Object]
impl Query {
    /// Get a user by ID
    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<Option<User>> {
        let db = ctx.data_unchecked::<Database>();
        let user = db
            .get_user(parse_id(&id)?)
            .await
            .map_err(to_graphql_error)?;
        Ok(user.map(User))
    }

    /// List all users
    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        let db = ctx.data_unchecked::<Database>();
        let users = db.all_users().await.map_err(to_graphql_error)?;
        Ok(users.into_iter().map(User).collect())
    }

    /// Get a post by ID
    async fn post(&self, ctx: &Context<'_>, id: ID) -> Result<Option<Post>> {
        let db = ctx.data_unchecked::<Database>();
        let post = db
            .get_post(parse_id(&id)?)
            .await
            .map_err(to_graphql_error)?;
        Ok(post.map(Post))
    }

    /// List all posts
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        let db = ctx.data_unchecked::<Database>();
        let posts = db.all_posts().await.map_err(to_graphql_error)?;
        Ok(posts.into_iter().map(Post).collect())
    }
}

pub struct Mutation;

#[Object]
impl Mutation {
    /// Create a single post
    async fn create_post(&self, ctx: &Context<'_>, input: CreatePostInput) -> Result<Post> {
        let db = ctx.data_unchecked::<Database>();
        let created = db
            .create_posts(&[input.title])
            .await
            .map_err(to_graphql_error)?;
        created
            .into_iter()
            .next()
            .map(Post)
            .ok_or_else(|| async_graphql::Error::new("Failed to create post"))
    }

    /// Create several posts in one batch
    async fn create_posts(
        &self,
        ctx: &Context<'_>,
        inputs: Vec<CreatePostInput>,
    ) -> Result<Vec<Post>> {
        let db = ctx.data_unchecked::<Database>();
        let titles: Vec<String> = inputs.into_iter().map(|i| i.title).collect();
        let created = db.create_posts(&titles).await.map_err(to_graphql_error)?;
        Ok(created.into_iter().map(Post).collect())
    }

    /// Create a single user, optionally connecting existing posts
    async fn create_user(&self, ctx: &Context<'_>, input: CreateUserInput) -> Result<User> {
        let db = ctx.data_unchecked::<Database>();
        let record = new_user_record(input)?;
        let created = db.create_users(&[record]).await.map_err(to_graphql_error)?;
        created
            .into_iter()
            .next()
            .map(User)
            .ok_or_else(|| async_graphql::Error::new("Failed to create user"))
    }

    /// Create several users in one batch
    async fn create_users(
        &self,
        ctx: &Context<'_>,
        inputs: Vec<CreateUserInput>,
    ) -> Result<Vec<User>> {
        let db = ctx.data_unchecked::<Database>();
        let records = inputs
            .into_iter()
            .map(new_user_record)
            .collect::<Result<Vec<_>>>()?;
        let created = db.create_users(&records).await.map_err(to_graphql_error)?;
        Ok(created.into_iter().map(User).collect())
    }

    /// Check credentials and issue a bearer token
    async fn authenticate(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> Result<AuthPayload> {
        let db = ctx.data_unchecked::<Database>();
        let issuer = ctx.data_unchecked::<auth::TokenIssuer>();
        let (token, user) = auth::authenticate(db, issuer, &email, &password)
            .await
            .map_err(to_graphql_error)?;
        Ok(AuthPayload {
            token,
            user: User(user),
        })
    }
}

pub async fn graphql_handler(
    Extension(schema): Extension<CmsSchema>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_accepts_uuids() {
        let uuid = Uuid::new_v4();
        assert_eq!(parse_id(&ID(uuid.to_string())).unwrap(), uuid);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id(&ID("not-a-uuid".to_string())).is_err());
    }
}
