use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::models::{
    category::CategorySummary,
    comment::{Comment, CommentThread},
    post::{Post, PostView},
};

use super::{NewPost, PostChanges, PostFilter, PostInclude, PostOrder, PostQuery, PostStore, StoreError};

const POST_COLUMNS: &str = "id, title, content, image_url, category_id, created_at, updated_at";

/// `PostStore` backed by the `posts`, `categories` and `comments` tables.
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the requested relations for `posts` with one query per relation.
    async fn hydrate(&self, posts: Vec<Post>, include: PostInclude) -> Result<Vec<PostView>, StoreError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let mut categories: HashMap<String, CategorySummary> = HashMap::new();
        if include.category {
            let ids: Vec<String> = posts.iter().map(|p| p.category_id.clone()).collect();
            let rows = sqlx::query_as::<_, CategorySummary>(
                "SELECT id, name FROM categories WHERE id = ANY($1)",
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
            categories = rows.into_iter().map(|c| (c.id.clone(), c)).collect();
        }

        let mut threads: HashMap<String, Vec<CommentThread>> = HashMap::new();
        if include.comments {
            let post_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
            let roots = sqlx::query_as::<_, Comment>(
                r#"
                SELECT id, name, email, content, post_id, parent_id, created_at
                FROM comments
                WHERE post_id = ANY($1) AND parent_id IS NULL
                ORDER BY created_at ASC
                "#,
            )
            .bind(&post_ids)
            .fetch_all(&self.pool)
            .await?;

            let root_ids: Vec<String> = roots.iter().map(|c| c.id.clone()).collect();
            let replies = if root_ids.is_empty() {
                Vec::new()
            } else {
                sqlx::query_as::<_, Comment>(
                    r#"
                    SELECT id, name, email, content, post_id, parent_id, created_at
                    FROM comments
                    WHERE parent_id = ANY($1)
                    ORDER BY created_at ASC
                    "#,
                )
                .bind(&root_ids)
                .fetch_all(&self.pool)
                .await?
            };

            for thread in CommentThread::assemble(roots, replies) {
                threads
                    .entry(thread.comment.post_id.clone())
                    .or_default()
                    .push(thread);
            }
        }

        Ok(posts
            .into_iter()
            .map(|post| {
                let category = include
                    .category
                    .then(|| categories.get(&post.category_id).cloned())
                    .flatten();
                let comments = include
                    .comments
                    .then(|| threads.remove(&post.id).unwrap_or_default());
                PostView {
                    post,
                    category,
                    comments,
                }
            })
            .collect())
    }
}

/// Escapes LIKE metacharacters so the query matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create(&self, data: NewPost) -> Result<Post, StoreError> {
        // category_id is a foreign key; an unknown category fails the insert.
        let post = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (title, content, image_url, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(&data.title)
        .bind(&data.content)
        .bind(&data.image_url)
        .bind(&data.category.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_many(&self, query: PostQuery) -> Result<Vec<PostView>, StoreError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM posts", POST_COLUMNS));

        match &query.filter {
            PostFilter::All => {}
            PostFilter::Category(category_id) => {
                builder.push(" WHERE category_id = ").push_bind(category_id.clone());
            }
            PostFilter::Search(text) => {
                let pattern = like_pattern(text);
                builder
                    .push(" WHERE (title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR content ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }

        match query.order_by {
            Some(PostOrder::NewestFirst) => {
                builder.push(" ORDER BY created_at DESC, id DESC");
            }
            Some(PostOrder::OldestFirst) => {
                builder.push(" ORDER BY created_at ASC, id ASC");
            }
            None => {}
        }

        if let Some(take) = query.take {
            builder.push(" LIMIT ").push_bind(take);
        }
        if let Some(skip) = query.skip {
            builder.push(" OFFSET ").push_bind(skip);
        }

        let posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(posts, query.include).await
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn find_unique(
        &self,
        id: &str,
        include: PostInclude,
    ) -> Result<Option<PostView>, StoreError> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match post {
            Some(post) => Ok(self.hydrate(vec![post], include).await?.pop()),
            None => Ok(None),
        }
    }

    async fn update(&self, id: &str, data: PostChanges) -> Result<Post, StoreError> {
        let category_id = data.category.map(|c| c.id);
        let sql = format!(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                image_url = COALESCE($4, image_url),
                category_id = COALESCE($5, category_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            POST_COLUMNS
        );

        sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(data.title)
            .bind(data.content)
            .bind(data.image_url)
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::RowNotFound)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        // Comments go with the post through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RowNotFound);
        }
        Ok(())
    }
}
