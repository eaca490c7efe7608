use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub name: String,
    pub email: String,
    pub content: String,
    pub post_id: String,
    /// `None` for a root comment.
    pub parent_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A comment with its immediate replies. Replies are never expanded further.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

impl CommentThread {
    /// Attaches to every root in `roots` the comments of `replies` whose
    /// parent it is. Replies whose parent is not among `roots` are dropped.
    pub fn assemble(roots: Vec<Comment>, replies: Vec<Comment>) -> Vec<CommentThread> {
        let mut threads: Vec<CommentThread> = roots
            .into_iter()
            .map(|comment| CommentThread {
                comment,
                replies: Vec::new(),
            })
            .collect();

        for reply in replies {
            let parent = reply.parent_id.as_deref();
            if let Some(thread) = threads
                .iter_mut()
                .find(|t| Some(t.comment.id.as_str()) == parent)
            {
                thread.replies.push(reply);
            }
        }

        threads
    }
}

/// DTO for creating a new comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Email is not valid"))]
    pub email: String,

    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub content: String,

    #[validate(length(min = 1, message = "postId is required"))]
    pub post_id: String,

    /// Optional: the ID of the comment being replied to.
    pub parent_id: Option<String>,
}

/// DTO for editing a comment. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 1000))]
    pub content: Option<String>,
}
