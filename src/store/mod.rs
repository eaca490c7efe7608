//! Relational store contract consumed by the post lifecycle manager.
//!
//! The manager never talks to a database directly. It is handed an
//! `Arc<dyn PostStore>`, which production fills with [`postgres::PgPostStore`]
//! and tests fill with in-memory doubles.

pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::models::post::{Post, PostView};

/// Reference to an existing row, written as a foreign-key relation.
///
/// `category_id` is only ever written through this type so that the store
/// enforces the relation instead of copying a bare scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connect {
    pub id: String,
}

impl Connect {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Row data for `PostStore::create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub category: Connect,
}

/// Partial update for `PostStore::update`. `None` leaves the column as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<Connect>,
}

/// Which rows `find_many` should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Category(String),
    /// Case-insensitive substring match on title OR content.
    Search(String),
}

/// Relations to hydrate on a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostInclude {
    pub category: bool,
    /// Root comments plus one level of replies.
    pub comments: bool,
}

impl PostInclude {
    pub const NONE: Self = Self {
        category: false,
        comments: false,
    };
    pub const CATEGORY: Self = Self {
        category: true,
        comments: false,
    };
    pub const THREAD: Self = Self {
        category: true,
        comments: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrder {
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub filter: PostFilter,
    pub include: PostInclude,
    pub skip: Option<i64>,
    pub take: Option<i64>,
    pub order_by: Option<PostOrder>,
}

impl PostQuery {
    pub fn new(filter: PostFilter, include: PostInclude) -> Self {
        Self {
            filter,
            include,
            skip: None,
            take: None,
            order_by: None,
        }
    }
}

/// Failure reported by a store implementation.
#[derive(Debug)]
pub enum StoreError {
    /// The row addressed by a write does not exist.
    RowNotFound,
    /// A foreign key or unique constraint rejected the write.
    Constraint(String),
    /// Connection, protocol or any other backend failure.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::RowNotFound => write!(f, "row not found"),
            StoreError::Constraint(msg) => write!(f, "constraint violation: {}", msg),
            StoreError::Backend(msg) => write!(f, "store backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::RowNotFound,
            sqlx::Error::Database(db)
                if db.is_foreign_key_violation() || db.is_unique_violation() =>
            {
                StoreError::Constraint(db.message().to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Persistence operations for posts and their read-time relations.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Inserts a post and returns the stored row (store-generated id and timestamps).
    async fn create(&self, data: NewPost) -> Result<Post, StoreError>;

    async fn find_many(&self, query: PostQuery) -> Result<Vec<PostView>, StoreError>;

    /// Total number of posts, regardless of any filter.
    async fn count(&self) -> Result<i64, StoreError>;

    async fn find_unique(&self, id: &str, include: PostInclude)
    -> Result<Option<PostView>, StoreError>;

    /// Fails with `StoreError::RowNotFound` when no post has this id.
    async fn update(&self, id: &str, data: PostChanges) -> Result<Post, StoreError>;

    /// Fails with `StoreError::RowNotFound` when no post has this id.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
