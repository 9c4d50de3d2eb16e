use chrono::{DateTime, Utc};
use color_eyre::eyre::Report;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgPool;
use tracing::debug;

use super::option::OptionId;
use super::poll::PollId;
use super::user::UserId;

#[derive(Clone, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct ResponseId(pub Uuid);

impl ResponseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct InternalResponse {
    pub id: ResponseId,
    pub poll_id: PollId,
    pub option_id: OptionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// The option a user picked on a poll, for echoing back their own vote.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UserResponse {
    pub option_id: OptionId,
    pub option_text: String,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct PollRespondentCount {
    pub poll_id: PollId,
    pub count: i64,
}

/// Insert a response. Returns `None` when the (user, poll) uniqueness
/// constraint already holds a row, i.e. the user has voted.
pub async fn add_response(
    pool: &PgPool,
    poll_id: &PollId,
    option_id: &OptionId,
    user_id: &UserId,
) -> Result<Option<InternalResponse>, Report> {
    debug!(
        poll_id = poll_id.as_string().as_str(),
        user_id = user_id.as_string().as_str(),
        "Recording response"
    );
    let response = sqlx::query_as::<_, InternalResponse>(
        "INSERT INTO responses (id, poll_id, option_id, user_id) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, poll_id) DO NOTHING \
         RETURNING id, poll_id, option_id, user_id, created_at",
    )
    .bind(ResponseId::new().0)
    .bind(poll_id.0)
    .bind(option_id.0)
    .bind(user_id.0)
    .fetch_optional(pool)
    .await?;

    Ok(response)
}

pub async fn response_for_user(
    pool: &PgPool,
    poll_id: &PollId,
    user_id: &UserId,
) -> Result<Option<UserResponse>, Report> {
    let response = sqlx::query_as::<_, UserResponse>(
        "SELECT r.option_id, o.option_text \
         FROM responses r \
         JOIN options o ON o.id = r.option_id \
         WHERE r.poll_id = $1 AND r.user_id = $2",
    )
    .bind(poll_id.0)
    .bind(user_id.0)
    .fetch_optional(pool)
    .await?;

    Ok(response)
}

/// Number of respondents per poll, for the listing view.
pub async fn respondent_counts(
    pool: &PgPool,
    poll_ids: &[PollId],
) -> Result<Vec<PollRespondentCount>, Report> {
    let ids: Vec<Uuid> = poll_ids.iter().map(|id| id.0).collect();
    let counts = sqlx::query_as::<_, PollRespondentCount>(
        "SELECT poll_id, COUNT(id) AS count \
         FROM responses WHERE poll_id = ANY($1) \
         GROUP BY poll_id",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

/// Which of the given polls the user has responded to.
pub async fn participated_poll_ids(
    pool: &PgPool,
    user_id: &UserId,
    poll_ids: &[PollId],
) -> Result<Vec<PollId>, Report> {
    let ids: Vec<Uuid> = poll_ids.iter().map(|id| id.0).collect();
    let participated = sqlx::query_scalar::<_, PollId>(
        "SELECT DISTINCT poll_id FROM responses \
         WHERE user_id = $1 AND poll_id = ANY($2)",
    )
    .bind(user_id.0)
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(participated)
}
