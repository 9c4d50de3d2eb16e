use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::auth::Identity;
use crate::db::{
    self,
    comment::{CommentId, CommentWithAuthor, InternalComment},
    poll::PollId,
    user::{InternalUser, UserId},
};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct IncomingComment {
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingComment {
    pub id: CommentId,
    pub content: String,
    pub author: String,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentWithAuthor> for OutgoingComment {
    fn from(comment: CommentWithAuthor) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            author: comment.author_nickname,
            author_id: comment.author_id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

impl OutgoingComment {
    fn from_new(comment: InternalComment, author: &InternalUser) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            author: author.nickname.clone(),
            author_id: comment.author_id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingCommentList {
    pub total: i64,
    pub comments: Vec<OutgoingComment>,
}

fn validate_comment_text(incoming: IncomingComment) -> Result<String, ApiError> {
    let text = incoming
        .text
        .map(|text| text.trim().to_string())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ApiError::Validation(
            "Comment text must not be empty.".to_string(),
        ));
    }
    Ok(text)
}

pub async fn list(
    pool: web::Data<PgPool>,
    path: web::Path<PollId>,
) -> Result<HttpResponse, ApiError> {
    let pool = pool.get_ref();
    let poll_id = path.into_inner();
    super::poll_or_404(pool, &poll_id).await?;

    let comments = db::comment::comments_for_poll(pool, &poll_id).await?;

    Ok(HttpResponse::Ok().json(OutgoingCommentList {
        total: comments.len() as i64,
        comments: comments.into_iter().map(OutgoingComment::from).collect(),
    }))
}

pub async fn create(
    pool: web::Data<PgPool>,
    identity: Identity,
    path: web::Path<PollId>,
    body: web::Json<IncomingComment>,
) -> Result<HttpResponse, ApiError> {
    let pool = pool.get_ref();
    let poll_id = path.into_inner();
    let text = validate_comment_text(body.into_inner())?;
    super::poll_or_404(pool, &poll_id).await?;

    // the token can outlive its account
    let author = db::user::user_by_id(pool, &identity.0)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let comment = db::comment::add_comment(pool, &poll_id, &identity.0, &text).await?;
    info!(
        id = comment.id.as_string().as_str(),
        poll_id = poll_id.as_string().as_str(),
        "Comment added"
    );

    Ok(HttpResponse::Created().json(OutgoingComment::from_new(comment, &author)))
}
