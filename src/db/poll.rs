use chrono::{DateTime, Utc};
use color_eyre::eyre::Report;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgPool;
use tracing::debug;

use super::option::{InternalOption, OptionId};
use super::user::UserId;

#[derive(Clone, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct PollId(pub Uuid);

impl PollId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct InternalPoll {
    pub id: PollId,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub creator_id: UserId,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row: poll columns plus the creator nickname.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct PollListRow {
    pub id: PollId,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub creator_id: UserId,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub creator_nickname: String,
}

/// Validated input for poll creation; option texts in display order.
#[derive(Clone, Debug)]
pub struct NewPoll {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub options: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct PollChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

const POLL_COLUMNS: &str =
    "id, title, description, category, creator_id, expires_at, created_at, updated_at";

pub async fn poll_by_id(pool: &PgPool, poll_id: &PollId) -> Result<Option<InternalPoll>, Report> {
    debug!(id = poll_id.as_string().as_str(), "Retrieving poll by id");
    let poll = sqlx::query_as::<_, InternalPoll>(&format!(
        "SELECT {POLL_COLUMNS} FROM polls WHERE id = $1"
    ))
    .bind(poll_id.0)
    .fetch_optional(pool)
    .await?;

    Ok(poll)
}

/// Insert the poll and its options in one transaction.
pub async fn create_poll(
    pool: &PgPool,
    creator_id: &UserId,
    new_poll: NewPoll,
) -> Result<(InternalPoll, Vec<InternalOption>), Report> {
    let poll_id = PollId::new();
    debug!(
        id = poll_id.as_string().as_str(),
        creator = creator_id.as_string().as_str(),
        "Creating poll"
    );

    let mut tx = pool.begin().await?;

    let poll = sqlx::query_as::<_, InternalPoll>(&format!(
        "INSERT INTO polls (id, title, description, category, creator_id, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {POLL_COLUMNS}"
    ))
    .bind(poll_id.0)
    .bind(&new_poll.title)
    .bind(&new_poll.description)
    .bind(&new_poll.category)
    .bind(creator_id.0)
    .bind(new_poll.expires_at)
    .fetch_one(&mut *tx)
    .await?;

    let mut options = Vec::with_capacity(new_poll.options.len());
    for (position, option_text) in new_poll.options.iter().enumerate() {
        let option = sqlx::query_as::<_, InternalOption>(
            "INSERT INTO options (id, poll_id, option_text, position) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, poll_id, option_text, position",
        )
        .bind(OptionId::new().0)
        .bind(poll_id.0)
        .bind(option_text)
        .bind(position as i32)
        .fetch_one(&mut *tx)
        .await?;
        options.push(option);
    }

    tx.commit().await?;

    Ok((poll, options))
}

pub async fn polls_page(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<PollListRow>, Report> {
    debug!(limit, offset, "Listing polls");
    let polls = sqlx::query_as::<_, PollListRow>(
        "SELECT p.id, p.title, p.description, p.category, p.creator_id, p.expires_at, \
                p.created_at, p.updated_at, u.nickname AS creator_nickname \
         FROM polls p \
         JOIN users u ON u.id = p.creator_id \
         ORDER BY p.created_at DESC, p.id DESC \
         LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(polls)
}

pub async fn polls_total(pool: &PgPool) -> Result<i64, Report> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM polls")
        .fetch_one(pool)
        .await?;

    Ok(total)
}

/// Apply a partial update; absent fields keep their stored value.
pub async fn update_poll(
    pool: &PgPool,
    poll_id: &PollId,
    changes: PollChanges,
) -> Result<Option<InternalPoll>, Report> {
    debug!(id = poll_id.as_string().as_str(), "Updating poll");
    let poll = sqlx::query_as::<_, InternalPoll>(&format!(
        "UPDATE polls SET \
            title = COALESCE($2, title), \
            description = COALESCE($3, description), \
            category = COALESCE($4, category), \
            expires_at = COALESCE($5, expires_at), \
            updated_at = now() \
         WHERE id = $1 \
         RETURNING {POLL_COLUMNS}"
    ))
    .bind(poll_id.0)
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.category)
    .bind(changes.expires_at)
    .fetch_optional(pool)
    .await?;

    Ok(poll)
}

/// Options, responses and comments go with the poll via FK cascade.
pub async fn delete_poll(pool: &PgPool, poll_id: &PollId) -> Result<bool, Report> {
    debug!(id = poll_id.as_string().as_str(), "Deleting poll");
    let result = sqlx::query("DELETE FROM polls WHERE id = $1")
        .bind(poll_id.0)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
