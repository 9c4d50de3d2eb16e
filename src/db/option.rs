use color_eyre::eyre::Report;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgPool;
use tracing::debug;

use super::poll::PollId;

#[derive(Clone, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct OptionId(pub Uuid);

impl OptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct InternalOption {
    pub id: OptionId,
    pub poll_id: PollId,
    pub option_text: String,
    pub position: i32,
}

/// Option row plus its response count, for the poll detail view.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct OptionWithCount {
    pub id: OptionId,
    pub poll_id: PollId,
    pub option_text: String,
    pub position: i32,
    pub response_count: i64,
}

pub async fn options_for_poll(
    pool: &PgPool,
    poll_id: &PollId,
) -> Result<Vec<InternalOption>, Report> {
    debug!(
        poll_id = poll_id.as_string().as_str(),
        "Retrieving options for poll"
    );
    let options = sqlx::query_as::<_, InternalOption>(
        "SELECT id, poll_id, option_text, position \
         FROM options WHERE poll_id = $1 \
         ORDER BY position ASC, id ASC",
    )
    .bind(poll_id.0)
    .fetch_all(pool)
    .await?;

    Ok(options)
}

pub async fn options_for_polls(
    pool: &PgPool,
    poll_ids: &[PollId],
) -> Result<Vec<InternalOption>, Report> {
    let ids: Vec<Uuid> = poll_ids.iter().map(|id| id.0).collect();
    let options = sqlx::query_as::<_, InternalOption>(
        "SELECT id, poll_id, option_text, position \
         FROM options WHERE poll_id = ANY($1) \
         ORDER BY position ASC, id ASC",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(options)
}

pub async fn options_with_counts(
    pool: &PgPool,
    poll_id: &PollId,
) -> Result<Vec<OptionWithCount>, Report> {
    let options = sqlx::query_as::<_, OptionWithCount>(
        "SELECT o.id, o.poll_id, o.option_text, o.position, COUNT(r.id) AS response_count \
         FROM options o \
         LEFT JOIN responses r ON r.option_id = o.id \
         WHERE o.poll_id = $1 \
         GROUP BY o.id \
         ORDER BY o.position ASC, o.id ASC",
    )
    .bind(poll_id.0)
    .fetch_all(pool)
    .await?;

    Ok(options)
}

pub async fn option_in_poll(
    pool: &PgPool,
    option_id: &OptionId,
    poll_id: &PollId,
) -> Result<bool, Report> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM options WHERE id = $1 AND poll_id = $2",
    )
    .bind(option_id.0)
    .bind(poll_id.0)
    .fetch_one(pool)
    .await?;

    Ok(found > 0)
}
