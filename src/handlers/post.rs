use axum::{
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    response::IntoResponse,
};
use utoipa::ToSchema;

use crate::{
    config::DEFAULT_PAGE_SIZE,
    error::AppError,
    media::MediaUpload,
    models::post::{CreatePostRequest, Post, PostListParams, PostView, SearchParams, UpdatePostRequest},
    response::ApiResponse,
    services::post::PostService,
    utils::jwt::AdminUser,
};

/// Multipart body of `POST /post` and `PUT /post/{id}`.
#[derive(Debug, Default, ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct PostForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<String>,
    /// Only honored on update, and only when no `image` file is sent.
    pub image_url: Option<String>,
    /// Cover image file (field name `image` or `file`).
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<MediaUpload>,
}

impl PostForm {
    fn into_create(self) -> (CreatePostRequest, Option<MediaUpload>) {
        let input = CreatePostRequest {
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            category_id: self.category_id.unwrap_or_default(),
        };
        (input, self.image)
    }

    fn into_update(self) -> (UpdatePostRequest, Option<MediaUpload>) {
        let input = UpdatePostRequest {
            title: self.title,
            content: self.content,
            category_id: self.category_id,
            image_url: self.image_url,
        };
        (input, self.image)
    }
}

fn bad_form(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {}", e))
}

/// Collects the known fields of a post form. Unknown fields are ignored,
/// and an empty file part counts as no file.
async fn read_post_form(mut multipart: Multipart) -> Result<PostForm, AppError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" | "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad_form)?;
                if !bytes.is_empty() {
                    form.image = Some(MediaUpload {
                        bytes: bytes.to_vec(),
                        file_name,
                        content_type,
                    });
                }
            }
            "title" => form.title = Some(field.text().await.map_err(bad_form)?),
            "content" => form.content = Some(field.text().await.map_err(bad_form)?),
            "categoryId" => form.category_id = Some(field.text().await.map_err(bad_form)?),
            "imageUrl" => form.image_url = Some(field.text().await.map_err(bad_form)?),
            other => tracing::debug!("Ignoring unknown form field '{}'", other),
        }
    }

    Ok(form)
}

/// Create a post, optionally with a cover image.
#[utoipa::path(
    post,
    path = "/api/v1/post",
    tag = "post",
    request_body(content = PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Invalid input, upload or store failure"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn create(
    State(posts): State<PostService>,
    _admin: AdminUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (input, image) = read_post_form(multipart).await?.into_create();
    let post = posts.create(input, image).await?;

    Ok(ApiResponse::created(post).message("Post created successfully"))
}

/// List posts, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/post",
    tag = "post",
    params(PostListParams),
    responses(
        (status = 200, description = "A page of posts with pagination", body = [PostView]),
        (status = 400, description = "page or limit below 1")
    )
)]
pub async fn find_all(
    State(posts): State<PostService>,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = posts
        .find_all(
            params.page.unwrap_or(1),
            params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    Ok(ApiResponse::ok(page.data).pagination(page.pagination))
}

/// Get a post with its category and comment threads.
#[utoipa::path(
    get,
    path = "/api/v1/post/{id}",
    tag = "post",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post", body = PostView),
        (status = 404, description = "No such post")
    )
)]
pub async fn find_one(
    State(posts): State<PostService>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts.find_one(&id).await?;
    Ok(ApiResponse::ok(post))
}

/// List the posts of one category.
#[utoipa::path(
    get,
    path = "/api/v1/post/category/{category_id}",
    tag = "post",
    params(("category_id" = String, Path, description = "Category id")),
    responses((status = 200, description = "Posts of the category", body = [PostView]))
)]
pub async fn find_by_category(
    State(posts): State<PostService>,
    Path(category_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let list = posts.find_by_category(&category_id).await?;
    Ok(ApiResponse::ok(list))
}

/// Search titles and contents. Never fails; a broken backend yields `[]`.
#[utoipa::path(
    get,
    path = "/api/v1/post/search",
    tag = "post",
    params(SearchParams),
    responses((status = 200, description = "Matching posts", body = [PostView]))
)]
pub async fn search_posts(
    State(posts): State<PostService>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    ApiResponse::ok(posts.search_posts(&params.q).await)
}

/// Update a post; a new image replaces the cover.
#[utoipa::path(
    put,
    path = "/api/v1/post/{id}",
    tag = "post",
    params(("id" = String, Path, description = "Post id")),
    request_body(content = PostForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Post updated", body = Post),
        (status = 400, description = "Invalid input, upload or store failure"),
        (status = 404, description = "No such post")
    )
)]
pub async fn update(
    State(posts): State<PostService>,
    _admin: AdminUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (input, image) = read_post_form(multipart).await?.into_update();
    let post = posts.update(&id, input, image).await?;

    Ok(ApiResponse::ok(post).message("Post updated successfully"))
}

/// Delete a post.
#[utoipa::path(
    delete,
    path = "/api/v1/post/{id}",
    tag = "post",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 404, description = "No such post")
    )
)]
pub async fn remove(
    State(posts): State<PostService>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    posts.remove(&id).await?;
    Ok(ApiResponse::deleted("Post deleted successfully"))
}
