use chrono::{DateTime, NaiveDate, Utc};
use color_eyre::eyre::Report;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use sqlx::PgPool;
use tracing::debug;

#[derive(Clone, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_string(&self) -> String {
        self.0.to_string()
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// A user row. Demographic attributes are grouping keys for result
/// aggregation; nothing in this crate ever writes them.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct InternalUser {
    pub id: UserId,
    pub nickname: String,
    pub gender: String,
    pub region: String,
    pub job: String,
    pub birth_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

pub async fn user_by_id(pool: &PgPool, user_id: &UserId) -> Result<Option<InternalUser>, Report> {
    debug!(id = user_id.as_string().as_str(), "Retrieving user by id");
    let user = sqlx::query_as::<_, InternalUser>(
        "SELECT id, nickname, gender, region, job, birth_date, created_at \
         FROM users WHERE id = $1",
    )
    .bind(user_id.0)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}
