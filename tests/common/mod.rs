// tests/common/mod.rs
//
// In-memory stand-ins for the relational and media stores, plus helpers to
// spin up the router without a database.

#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use blog_backend::{
    config::Config,
    media::{MediaError, MediaStore, MediaUpload, UploadedMedia},
    models::{
        category::CategorySummary,
        comment::{Comment, CommentThread},
        post::{Post, PostView},
    },
    services::post::PostService,
    state::AppState,
    store::{
        NewPost, PostChanges, PostFilter, PostInclude, PostOrder, PostQuery, PostStore, StoreError,
    },
};
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;

pub const TEST_SECRET: &str = "test_secret_for_integration_tests";

/// Posts, categories and comments kept in vectors.
/// Every `find_many` call records the query it received.
#[derive(Default)]
pub struct InMemoryPostStore {
    pub posts: Mutex<Vec<Post>>,
    pub categories: Mutex<Vec<CategorySummary>>,
    pub comments: Mutex<Vec<Comment>>,
    pub queries: Mutex<Vec<PostQuery>>,
    pub creates: Mutex<Vec<NewPost>>,
    pub updates: Mutex<Vec<(String, PostChanges)>>,
    pub delete_calls: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    next_id: AtomicUsize,
}

impl InMemoryPostStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_category(&self, id: &str, name: &str) {
        self.categories.lock().unwrap().push(CategorySummary {
            id: id.to_string(),
            name: name.to_string(),
        });
    }

    /// Inserts a post directly, bypassing the service.
    /// `age_minutes` pushes `created_at` into the past.
    pub fn seed_post(&self, id: &str, title: &str, category_id: &str, image_url: &str, age_minutes: i64) -> Post {
        let created_at = Utc::now() - chrono::Duration::minutes(age_minutes);
        let post = Post {
            id: id.to_string(),
            title: title.to_string(),
            content: format!("Body of {}", title),
            image_url: image_url.to_string(),
            category_id: category_id.to_string(),
            created_at,
            updated_at: created_at,
        };
        self.posts.lock().unwrap().push(post.clone());
        post
    }

    pub fn seed_comment(&self, id: &str, post_id: &str, parent_id: Option<&str>) {
        self.comments.lock().unwrap().push(Comment {
            id: id.to_string(),
            name: "reader".to_string(),
            email: "reader@example.com".to_string(),
            content: format!("comment {}", id),
            post_id: post_id.to_string(),
            parent_id: parent_id.map(str::to_string),
            created_at: Utc::now(),
        });
    }

    pub fn post(&self, id: &str) -> Option<Post> {
        self.posts.lock().unwrap().iter().find(|p| p.id == id).cloned()
    }

    fn view(&self, post: Post, include: PostInclude) -> PostView {
        let category = include
            .category
            .then(|| {
                self.categories
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|c| c.id == post.category_id)
                    .cloned()
            })
            .flatten();

        let comments = include.comments.then(|| {
            let all = self.comments.lock().unwrap();
            let roots = all
                .iter()
                .filter(|c| c.post_id == post.id && c.parent_id.is_none())
                .cloned()
                .collect();
            let replies = all.iter().filter(|c| c.parent_id.is_some()).cloned().collect();
            CommentThread::assemble(roots, replies)
        });

        PostView {
            post,
            category,
            comments,
        }
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn create(&self, data: NewPost) -> Result<Post, StoreError> {
        self.creates.lock().unwrap().push(data.clone());
        self.check_write()?;

        let known = self
            .categories
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.id == data.category.id);
        if !known {
            return Err(StoreError::Constraint("posts_category_id_fkey".to_string()));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let post = Post {
            id: format!("post-{}", n),
            title: data.title,
            content: data.content,
            image_url: data.image_url,
            category_id: data.category.id,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn find_many(&self, query: PostQuery) -> Result<Vec<PostView>, StoreError> {
        self.queries.lock().unwrap().push(query.clone());
        self.check_read()?;

        let mut matching: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| match &query.filter {
                PostFilter::All => true,
                PostFilter::Category(id) => &p.category_id == id,
                PostFilter::Search(text) => {
                    let needle = text.to_lowercase();
                    p.title.to_lowercase().contains(&needle)
                        || p.content.to_lowercase().contains(&needle)
                }
            })
            .cloned()
            .collect();

        match query.order_by {
            Some(PostOrder::NewestFirst) => matching.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Some(PostOrder::OldestFirst) => matching.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            None => {}
        }

        let skip = query.skip.unwrap_or(0).max(0) as usize;
        let take = query.take.map(|t| t.max(0) as usize).unwrap_or(usize::MAX);

        Ok(matching
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|p| self.view(p, query.include))
            .collect())
    }

    async fn count(&self) -> Result<i64, StoreError> {
        self.check_read()?;
        Ok(self.posts.lock().unwrap().len() as i64)
    }

    async fn find_unique(&self, id: &str, include: PostInclude) -> Result<Option<PostView>, StoreError> {
        self.check_read()?;
        Ok(self.post(id).map(|p| self.view(p, include)))
    }

    async fn update(&self, id: &str, data: PostChanges) -> Result<Post, StoreError> {
        self.updates.lock().unwrap().push((id.to_string(), data.clone()));
        self.check_write()?;

        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::RowNotFound)?;

        if let Some(title) = data.title {
            post.title = title;
        }
        if let Some(content) = data.content {
            post.content = content;
        }
        if let Some(image_url) = data.image_url {
            post.image_url = image_url;
        }
        if let Some(category) = data.category {
            post.category_id = category.id;
        }
        post.updated_at = Utc::now();

        Ok(post.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_write()?;

        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Err(StoreError::RowNotFound);
        }
        self.comments.lock().unwrap().retain(|c| c.post_id != id);
        Ok(())
    }
}

/// Media store that records every call and hands out
/// `http://media.test/covers/img-<n>.jpg` URLs.
#[derive(Default)]
pub struct RecordingMediaStore {
    pub uploads: Mutex<Vec<MediaUpload>>,
    pub deletes: Mutex<Vec<String>>,
    pub fail_upload: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl RecordingMediaStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for RecordingMediaStore {
    async fn upload(&self, file: MediaUpload) -> Result<UploadedMedia, MediaError> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(file);
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(MediaError::Backend("quota exceeded".to_string()));
        }
        let id = format!("img-{}", uploads.len());
        Ok(UploadedMedia {
            url: format!("http://media.test/covers/{}.jpg", id),
            id,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), MediaError> {
        self.deletes.lock().unwrap().push(id.to_string());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(MediaError::Backend("delete refused".to_string()));
        }
        Ok(())
    }
}

pub fn blob(name: &str) -> MediaUpload {
    MediaUpload {
        bytes: b"\x89PNG fake image bytes".to_vec(),
        file_name: Some(name.to_string()),
        content_type: Some("image/png".to_string()),
    }
}

pub fn service(store: &Arc<InMemoryPostStore>, media: &Arc<RecordingMediaStore>) -> PostService {
    PostService::new(store.clone(), media.clone())
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/unused".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        port: 0,
        media_root: std::env::temp_dir().join("blog-backend-test-media").display().to_string(),
        media_base_url: "http://media.test/covers".to_string(),
        max_upload_bytes: 1024 * 1024,
    }
}

/// Builds the router over in-memory stores. The pool is lazy and never
/// connects, so routes backed by SQL can only be driven up to their auth
/// and validation checks.
pub fn test_app(store: &Arc<InMemoryPostStore>, media: &Arc<RecordingMediaStore>) -> axum::Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(250))
        .connect_lazy(&config.database_url)
        .expect("lazy pool from a valid URL");

    let state = AppState {
        pool,
        config,
        posts: service(store, media),
    };

    blog_backend::create_router(state)
}
