pub mod comments;
pub mod polls;
pub mod results;
pub mod votes;

use sqlx::PgPool;

use crate::db::{
    self,
    poll::{InternalPoll, PollId},
};
use crate::error::ApiError;

pub(crate) async fn poll_or_404(pool: &PgPool, poll_id: &PollId) -> Result<InternalPoll, ApiError> {
    db::poll::poll_by_id(pool, poll_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Poll not found.".to_string()))
}
