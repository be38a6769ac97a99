//! Declarative collection schemas.
//!
//! Collections and their fields are configuration data consumed by the admin
//! UI; persistence constraints themselves live in the SQL migrations.

use serde::Serialize;

/// Field kinds a collection can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldKind {
    Text,
    Checkbox,
    /// Stored as a secure hash, never rendered.
    Password,
    Relationship {
        ref_collection: &'static str,
        many: bool,
    },
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub unique: bool,
}

impl FieldSchema {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            unique: false,
        }
    }

    const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CollectionSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSchema],
}

pub const USER: CollectionSchema = CollectionSchema {
    name: "User",
    fields: &[
        FieldSchema::new("name", FieldKind::Text),
        FieldSchema::new("email", FieldKind::Text).unique(),
        FieldSchema::new("isAdmin", FieldKind::Checkbox),
        FieldSchema::new("password", FieldKind::Password),
        FieldSchema::new(
            "posts",
            FieldKind::Relationship {
                ref_collection: "Post",
                many: true,
            },
        ),
    ],
};

pub const POST: CollectionSchema = CollectionSchema {
    name: "Post",
    fields: &[
        FieldSchema::new("title", FieldKind::Text),
        FieldSchema::new(
            "author",
            FieldKind::Relationship {
                ref_collection: "User",
                many: false,
            },
        ),
    ],
};

/// All declared collections, in display order.
pub const COLLECTIONS: &[CollectionSchema] = &[USER, POST];

pub fn collections() -> &'static [CollectionSchema] {
    COLLECTIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_collections() {
        let names: Vec<&str> = collections().iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["User", "Post"]);
    }

    #[test]
    fn test_user_email_is_unique() {
        let email = USER
            .fields
            .iter()
            .find(|f| f.name == "email")
            .expect("User declares an email field");
        assert!(email.unique);
        assert_eq!(email.kind, FieldKind::Text);
    }

    #[test]
    fn test_relationships_point_at_each_other() {
        let posts = USER.fields.iter().find(|f| f.name == "posts").unwrap();
        assert_eq!(
            posts.kind,
            FieldKind::Relationship {
                ref_collection: "Post",
                many: true
            }
        );

        let author = POST.fields.iter().find(|f| f.name == "author").unwrap();
        assert_eq!(
            author.kind,
            FieldKind::Relationship {
                ref_collection: "User",
                many: false
            }
        );
    }
}
