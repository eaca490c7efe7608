use std::sync::Arc;

use validator::Validate;

use crate::{
    config::MAX_PAGE_SIZE,
    error::AppError,
    media::{MediaStore, MediaUpload, UploadedMedia},
    models::post::{CreatePostRequest, Post, PostView, UpdatePostRequest},
    response::Pagination,
    store::{
        Connect, NewPost, PostChanges, PostFilter, PostInclude, PostOrder, PostQuery, PostStore,
        StoreError,
    },
    utils::html::clean_required,
};

/// One page of posts from `find_all`.
#[derive(Debug)]
pub struct PostPage {
    pub data: Vec<PostView>,
    pub pagination: Pagination,
}

/// Coordinates post persistence with the cover-image lifecycle.
///
/// Invariant: a post's `image_url` only ever points at an upload that
/// succeeded, and superseded uploads are removed only after the post stops
/// referencing them. Media deletes are best-effort: they are logged and
/// never fail the calling operation.
#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
    media: Arc<dyn MediaStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>, media: Arc<dyn MediaStore>) -> Self {
        Self { store, media }
    }

    /// Creates a post, uploading `image` first when present.
    pub async fn create(
        &self,
        input: CreatePostRequest,
        image: Option<MediaUpload>,
    ) -> Result<Post, AppError> {
        input.validate()?;
        let content = clean_required(&input.content, "Content")?;

        let uploaded = match image {
            Some(file) => Some(self.upload(file).await?),
            None => None,
        };

        let data = NewPost {
            title: input.title,
            content,
            image_url: uploaded.as_ref().map(|u| u.url.clone()).unwrap_or_default(),
            category: Connect::new(input.category_id),
        };

        match self.store.create(data).await {
            Ok(post) => {
                tracing::info!("Created post {}", post.id);
                Ok(post)
            }
            Err(e) => {
                tracing::error!("Failed to create post: {}", e);
                if let Some(uploaded) = uploaded {
                    self.discard_media(&uploaded.id).await;
                }
                Err(AppError::UpstreamWrite("Failed to create post".to_string()))
            }
        }
    }

    /// Lists posts newest first with their category.
    pub async fn find_all(&self, page: i64, limit: i64) -> Result<PostPage, AppError> {
        if page < 1 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if limit < 1 {
            return Err(AppError::Validation("limit must be at least 1".to_string()));
        }
        let limit = limit.min(MAX_PAGE_SIZE);

        // A page far past the end saturates to an empty page.
        let skip = (page - 1).checked_mul(limit).unwrap_or(i64::MAX);

        let query = PostQuery {
            filter: PostFilter::All,
            include: PostInclude::CATEGORY,
            skip: Some(skip),
            take: Some(limit),
            order_by: Some(PostOrder::NewestFirst),
        };

        let (data, total_posts) = tokio::try_join!(self.store.find_many(query), self.store.count())
            .map_err(|e| {
                tracing::error!("Failed to list posts: {}", e);
                AppError::UpstreamRead("Failed to fetch posts".to_string())
            })?;

        Ok(PostPage {
            data,
            pagination: Pagination {
                current_page: page,
                limit,
                total_posts,
                total_pages: total_pages(total_posts, limit),
            },
        })
    }

    pub async fn find_one(&self, id: &str) -> Result<PostView, AppError> {
        self.store
            .find_unique(id, PostInclude::THREAD)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch post {}: {}", id, e);
                AppError::UpstreamRead("Failed to fetch post".to_string())
            })?
            .ok_or(AppError::NotFound("Post not found".to_string()))
    }

    /// Posts of one category. An empty list is a valid answer.
    pub async fn find_by_category(&self, category_id: &str) -> Result<Vec<PostView>, AppError> {
        let query = PostQuery {
            order_by: Some(PostOrder::NewestFirst),
            ..PostQuery::new(PostFilter::Category(category_id.to_string()), PostInclude::THREAD)
        };

        self.store.find_many(query).await.map_err(|e| {
            tracing::error!("Failed to fetch posts of category {}: {}", category_id, e);
            AppError::UpstreamRead("Failed to fetch posts by category".to_string())
        })
    }

    /// Best-effort search: a store failure yields an empty list, not an error.
    pub async fn search_posts(&self, query: &str) -> Vec<PostView> {
        let query = PostQuery {
            order_by: Some(PostOrder::NewestFirst),
            ..PostQuery::new(PostFilter::Search(query.to_string()), PostInclude::THREAD)
        };

        match self.store.find_many(query).await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!("Post search failed, returning no results: {}", e);
                Vec::new()
            }
        }
    }

    /// Updates a post. A new `image` replaces the cover: it is uploaded
    /// before the row is written, and the previous cover is deleted after.
    pub async fn update(
        &self,
        id: &str,
        input: UpdatePostRequest,
        image: Option<MediaUpload>,
    ) -> Result<Post, AppError> {
        input.validate()?;
        let content = input
            .content
            .as_deref()
            .map(|c| clean_required(c, "Content"))
            .transpose()?;

        let existing = self
            .store
            .find_unique(id, PostInclude::NONE)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load post {} for update: {}", id, e);
                AppError::UpstreamWrite("Failed to update post".to_string())
            })?
            .ok_or(AppError::NotFound("Post not found".to_string()))?
            .post;

        let uploaded = match image {
            Some(file) => Some(self.upload(file).await?),
            None => None,
        };

        let image_url = match &uploaded {
            Some(u) => Some(u.url.clone()),
            None => input.image_url,
        };

        let changes = PostChanges {
            title: input.title,
            content,
            image_url,
            category: input
                .category_id
                .filter(|c| !c.is_empty())
                .map(Connect::new),
        };

        let updated = match self.store.update(id, changes).await {
            Ok(post) => post,
            Err(e) => {
                tracing::error!("Failed to update post {}: {}", id, e);
                if let Some(uploaded) = &uploaded {
                    self.discard_media(&uploaded.id).await;
                }
                return Err(match e {
                    StoreError::RowNotFound => {
                        AppError::NotFound("Post not found".to_string())
                    }
                    _ => AppError::UpstreamWrite("Failed to update post".to_string()),
                });
            }
        };

        if uploaded.is_some() && !existing.image_url.is_empty() {
            match self.media.extract_id(&existing.image_url) {
                Some(old_id) => self.discard_media(&old_id).await,
                None => tracing::warn!(
                    "Cannot derive media id from '{}', leaving old cover in place",
                    existing.image_url
                ),
            }
        }

        tracing::info!("Updated post {}", id);
        Ok(updated)
    }

    /// Deletes a post after checking it exists. The cover image is kept.
    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        self.store
            .find_unique(id, PostInclude::NONE)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load post {} for removal: {}", id, e);
                AppError::UpstreamRead("Failed to fetch post".to_string())
            })?
            .ok_or(AppError::NotFound("Post not found".to_string()))?;

        self.store.delete(id).await.map_err(|e| {
            tracing::error!("Failed to delete post {}: {}", id, e);
            AppError::UpstreamWrite("Failed to delete post".to_string())
        })?;

        tracing::info!("Deleted post {}", id);
        Ok(())
    }

    async fn upload(&self, file: MediaUpload) -> Result<UploadedMedia, AppError> {
        self.media.upload(file).await.map_err(|e| {
            tracing::error!("Cover image upload failed: {}", e);
            AppError::MediaUpload("Failed to upload image".to_string())
        })
    }

    async fn discard_media(&self, media_id: &str) {
        if let Err(e) = self.media.delete(media_id).await {
            tracing::warn!("Failed to delete media {}: {}", media_id, e);
        }
    }
}

/// `ceil(total / limit)`, zero when there are no posts.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
