//! Server-rendered admin pages over the declared collections.
//!
//! Read-only: a dashboard listing every collection with its field schema and
//! record count, plus a record table per collection. All routes require an
//! admin token.

use axum::{
    Extension, Json,
    extract::Path,
    response::Html,
};

use crate::{
    auth::AdminSession,
    database::Database,
    errors::AppError,
    schema::{self, CollectionSchema, FieldKind},
};

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; margin: 2rem; color: #222; }}
table {{ border-collapse: collapse; margin-top: 1rem; }}
th, td {{ border: 1px solid #ccc; padding: 0.4rem 0.8rem; text-align: left; }}
th {{ background: #f5f5f5; }}
a {{ color: #2b6cb0; }}
</style>
</head>
<body>
<p><a href="/admin">Admin</a></p>
{body}
</body>
</html>"#
    ))
}

fn kind_label(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Text => "text".to_string(),
        FieldKind::Checkbox => "checkbox".to_string(),
        FieldKind::Password => "password".to_string(),
        FieldKind::Relationship {
            ref_collection,
            many,
        } => {
            if *many {
                format!("relationship → [{ref_collection}]")
            } else {
                format!("relationship → {ref_collection}")
            }
        }
    }
}

fn find_collection(name: &str) -> Option<&'static CollectionSchema> {
    schema::collections()
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Dashboard: one row per declared collection.
pub async fn dashboard(
    Extension(db): Extension<Database>,
    AdminSession(_): AdminSession,
) -> Result<Html<String>, AppError> {
    let mut rows = String::new();
    for collection in schema::collections() {
        let count = match collection.name {
            "User" => db.user_count().await?,
            "Post" => db.post_count().await?,
            _ => 0,
        };
        let fields: Vec<String> = collection
            .fields
            .iter()
            .map(|f| {
                let unique = if f.unique { ", unique" } else { "" };
                format!("{} ({}{unique})", f.name, kind_label(&f.kind))
            })
            .collect();
        rows.push_str(&format!(
            "<tr><td><a href=\"/admin/{name}\">{name}</a></td><td>{count}</td><td>{fields}</td></tr>\n",
            name = collection.name,
            fields = escape(&fields.join(", ")),
        ));
    }

    let body = format!(
        "<h1>Collections</h1>\n<table>\n<tr><th>Collection</th><th>Records</th><th>Fields</th></tr>\n{rows}</table>"
    );
    Ok(page("Admin", &body))
}

/// Declared collection schemas as JSON, for admin tooling.
pub async fn schema_index(AdminSession(_): AdminSession) -> Json<&'static [CollectionSchema]> {
    Json(schema::collections())
}

/// Record table for one collection.
pub async fn collection(
    Extension(db): Extension<Database>,
    AdminSession(_): AdminSession,
    Path(name): Path<String>,
) -> Result<Html<String>, AppError> {
    let collection = find_collection(&name).ok_or(AppError::NotFound)?;

    let body = match collection.name {
        "User" => {
            let users = db.all_users().await?;
            let mut rows = String::new();
            for user in &users {
                let posts = db.post_count_for_user(user.id).await?;
                rows.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    escape(&user.name),
                    escape(&user.email),
                    user.is_admin,
                    posts,
                ));
            }
            format!(
                "<h1>User</h1>\n<table>\n<tr><th>Name</th><th>Email</th><th>isAdmin</th><th>Posts</th></tr>\n{rows}</table>"
            )
        }
        "Post" => {
            let posts = db.all_posts().await?;
            let mut rows = String::new();
            for post in &posts {
                let author = match post.author_id {
                    Some(id) => db
                        .get_user(id)
                        .await?
                        .map(|u| escape(&u.name))
                        .unwrap_or_else(|| "-".to_string()),
                    None => "-".to_string(),
                };
                rows.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td></tr>\n",
                    escape(&post.title),
                    author,
                ));
            }
            format!(
                "<h1>Post</h1>\n<table>\n<tr><th>Title</th><th>Author</th></tr>\n{rows}</table>"
            )
        }
        _ => return Err(AppError::NotFound),
    };

    Ok(page(collection.name, &body))
}
