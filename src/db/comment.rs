use chrono::{DateTime, Utc};
use color_eyre::eyre::Report;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgPool;
use tracing::debug;

use super::poll::PollId;
use super::user::UserId;

#[derive(Clone, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct InternalComment {
    pub id: CommentId,
    pub poll_id: PollId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment row joined with its author's nickname for display.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: CommentId,
    pub poll_id: PollId,
    pub author_id: UserId,
    pub author_nickname: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn comments_for_poll(
    pool: &PgPool,
    poll_id: &PollId,
) -> Result<Vec<CommentWithAuthor>, Report> {
    debug!(
        poll_id = poll_id.as_string().as_str(),
        "Retrieving comments for poll"
    );
    let comments = sqlx::query_as::<_, CommentWithAuthor>(
        "SELECT c.id, c.poll_id, c.author_id, u.nickname AS author_nickname, \
                c.content, c.created_at, c.updated_at \
         FROM comments c \
         JOIN users u ON u.id = c.author_id \
         WHERE c.poll_id = $1 \
         ORDER BY c.created_at ASC, c.id ASC",
    )
    .bind(poll_id.0)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}

pub async fn add_comment(
    pool: &PgPool,
    poll_id: &PollId,
    author_id: &UserId,
    content: &str,
) -> Result<InternalComment, Report> {
    debug!(
        poll_id = poll_id.as_string().as_str(),
        author_id = author_id.as_string().as_str(),
        "Adding comment"
    );
    let comment = sqlx::query_as::<_, InternalComment>(
        "INSERT INTO comments (id, poll_id, author_id, content) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, poll_id, author_id, content, created_at, updated_at",
    )
    .bind(CommentId::new().0)
    .bind(poll_id.0)
    .bind(author_id.0)
    .bind(content)
    .fetch_one(pool)
    .await?;

    Ok(comment)
}
