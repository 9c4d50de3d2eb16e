use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::auth::Identity;
use crate::db::{
    self,
    option::OptionId,
    poll::PollId,
    response::{InternalResponse, ResponseId},
    user::UserId,
};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct IncomingResponse {
    pub option_id: Option<OptionId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingResponse {
    pub id: ResponseId,
    pub poll_id: PollId,
    pub option_id: OptionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<InternalResponse> for OutgoingResponse {
    fn from(response: InternalResponse) -> Self {
        Self {
            id: response.id,
            poll_id: response.poll_id,
            option_id: response.option_id,
            user_id: response.user_id,
            created_at: response.created_at,
        }
    }
}

pub async fn create(
    pool: web::Data<PgPool>,
    identity: Identity,
    path: web::Path<PollId>,
    body: web::Json<IncomingResponse>,
) -> Result<HttpResponse, ApiError> {
    let pool = pool.get_ref();
    let poll_id = path.into_inner();
    let option_id = body
        .into_inner()
        .option_id
        .ok_or_else(|| ApiError::Validation("option_id is required.".to_string()))?;

    let poll = super::poll_or_404(pool, &poll_id).await?;
    if let Some(expires_at) = poll.expires_at {
        if expires_at <= Utc::now() {
            return Err(ApiError::Forbidden("This poll has expired.".to_string()));
        }
    }
    if db::response::response_for_user(pool, &poll_id, &identity.0)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "You have already voted on this poll.".to_string(),
        ));
    }
    if !db::option::option_in_poll(pool, &option_id, &poll_id).await? {
        return Err(ApiError::Validation(
            "This option does not belong to the poll.".to_string(),
        ));
    }

    // Two concurrent first votes can both pass the check above; the
    // unique index decides the winner and the loser gets the same 409.
    let response = db::response::add_response(pool, &poll_id, &option_id, &identity.0)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("You have already voted on this poll.".to_string())
        })?;
    info!(
        poll_id = poll_id.as_string().as_str(),
        user_id = identity.0.as_string().as_str(),
        "Response recorded"
    );

    Ok(HttpResponse::Created().json(OutgoingResponse::from(response)))
}
