pub mod admin;
pub mod auth;
pub mod database;
pub mod errors;
pub mod graphql;
pub mod models;
pub mod schema;
pub mod seed;

use axum::{
    Extension, Json, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

use crate::database::Database;

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_router(pool: PgPool) -> Router {
    let db = Database::new(pool);
    let issuer = auth::TokenIssuer::from_env();
    let gql = graphql::build_schema(db.clone(), issuer.clone());

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        // GraphQL endpoint with a GraphiQL page on GET
        .route(
            "/graphql",
            get(graphql::graphiql).post(graphql::graphql_handler),
        )
        // Auth routes
        .route("/auth/login", axum::routing::post(auth::login))
        .route("/auth/me", get(auth::me))
        // Admin UI
        .route("/admin", get(admin::dashboard))
        .route("/admin/api/schema", get(admin::schema_index))
        .route("/admin/{collection}", get(admin::collection))
        .layer(Extension(db))
        .layer(Extension(issuer))
        .layer(Extension(gql))
        .layer(cors)
        .layer(CompressionLayer::new())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
}

pub async fn run_server(pool: PgPool, port: u16) -> anyhow::Result<()> {
    let app = create_router(pool);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    tracing::info!("Server running on http://0.0.0.0:{}", port);
    tracing::info!("GraphiQL available at http://0.0.0.0:{}/graphql", port);

    axum::serve(listener, app).await?;

    Ok(())
}
