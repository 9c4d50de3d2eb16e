use std::collections::{HashMap, HashSet};

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use color_eyre::eyre::eyre;
use futures::try_join;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::auth::{Identity, OptionalIdentity};
use crate::db::{
    self,
    option::{InternalOption, OptionId, OptionWithCount},
    poll::{NewPoll, PollChanges, PollId},
    user::{InternalUser, UserId},
};
use crate::error::ApiError;
use crate::handlers::comments::OutgoingComment;
use crate::results;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct IncomingOption {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingNewPoll {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub options: Option<Vec<IncomingOption>>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingPollChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingOption {
    pub id: OptionId,
    pub option_text: String,
    pub position: i32,
}

impl From<InternalOption> for OutgoingOption {
    fn from(option: InternalOption) -> Self {
        Self {
            id: option.id,
            option_text: option.option_text,
            position: option.position,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingOptionWithCount {
    pub id: OptionId,
    pub option_text: String,
    pub position: i32,
    pub response_count: i64,
}

impl From<OptionWithCount> for OutgoingOptionWithCount {
    fn from(option: OptionWithCount) -> Self {
        Self {
            id: option.id,
            option_text: option.option_text,
            position: option.position,
            response_count: option.response_count,
        }
    }
}

/// A poll with its options, as returned from create and update.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingPoll {
    pub id: PollId,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub creator_id: UserId,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub options: Vec<OutgoingOption>,
}

/// A listing row. The participation flags are only present for
/// authenticated callers.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingPollSummary {
    pub id: PollId,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub creator_id: UserId,
    pub creator_nickname: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub options: Vec<OutgoingOption>,
    pub respondent_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_participated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mine: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingPollList {
    pub total: i64,
    pub polls: Vec<OutgoingPollSummary>,
}

/// Creator summary for the detail view. Age is computed from the birth
/// date; the date itself stays server-side.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingCreator {
    pub id: UserId,
    pub nickname: String,
    pub gender: String,
    pub region: String,
    pub job: String,
    pub age: i32,
}

impl OutgoingCreator {
    fn from_user(user: InternalUser, today: chrono::NaiveDate) -> Self {
        Self {
            age: results::age_on(user.birth_date, today),
            id: user.id,
            nickname: user.nickname,
            gender: user.gender,
            region: user.region,
            job: user.job,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingUserResponse {
    pub option_id: OptionId,
    pub option_text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingPollDetail {
    pub id: PollId,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub creator: OutgoingCreator,
    pub options: Vec<OutgoingOptionWithCount>,
    pub comments: Vec<OutgoingComment>,
    /// The caller's own response; null for anonymous callers and
    /// callers who have not voted.
    pub user_response: Option<OutgoingUserResponse>,
}

fn validate_new_poll(incoming: IncomingNewPoll) -> Result<NewPoll, ApiError> {
    let title = incoming
        .title
        .map(|title| title.trim().to_string())
        .unwrap_or_default();
    let options: Vec<String> = incoming
        .options
        .unwrap_or_default()
        .into_iter()
        .map(|option| {
            option
                .content
                .map(|content| content.trim().to_string())
                .unwrap_or_default()
        })
        .collect();

    if title.is_empty() || options.len() < 2 || options.iter().any(|option| option.is_empty()) {
        return Err(ApiError::Validation(
            "Title and at least two options with content are required.".to_string(),
        ));
    }

    Ok(NewPoll {
        title,
        description: incoming.description,
        category: incoming
            .category
            .unwrap_or_else(|| "General".to_string()),
        expires_at: incoming.deadline,
        options,
    })
}

pub async fn create(
    pool: web::Data<PgPool>,
    identity: Identity,
    body: web::Json<IncomingNewPoll>,
) -> Result<HttpResponse, ApiError> {
    let new_poll = validate_new_poll(body.into_inner())?;
    let (poll, options) = db::poll::create_poll(pool.get_ref(), &identity.0, new_poll).await?;
    info!(
        id = poll.id.as_string().as_str(),
        "Poll created with {} options",
        options.len()
    );

    Ok(HttpResponse::Created().json(OutgoingPoll {
        id: poll.id,
        title: poll.title,
        description: poll.description,
        category: poll.category,
        creator_id: poll.creator_id,
        expires_at: poll.expires_at,
        created_at: poll.created_at,
        updated_at: poll.updated_at,
        options: options.into_iter().map(OutgoingOption::from).collect(),
    }))
}

pub async fn list(
    pool: web::Data<PgPool>,
    identity: OptionalIdentity,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let pool = pool.get_ref();
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let (rows, total) = try_join!(
        db::poll::polls_page(pool, limit, offset),
        db::poll::polls_total(pool),
    )?;
    let poll_ids: Vec<PollId> = rows.iter().map(|row| row.id.clone()).collect();
    let (options, counts) = try_join!(
        db::option::options_for_polls(pool, &poll_ids),
        db::response::respondent_counts(pool, &poll_ids),
    )?;
    let participated: HashSet<PollId> = match &identity.0 {
        Some(user_id) => {
            db::response::participated_poll_ids(pool, user_id, &poll_ids)
                .await?
                .into_iter()
                .collect()
        }
        None => HashSet::new(),
    };

    let mut options_by_poll: HashMap<PollId, Vec<OutgoingOption>> = HashMap::new();
    for option in options {
        options_by_poll
            .entry(option.poll_id.clone())
            .or_default()
            .push(OutgoingOption::from(option));
    }
    let counts_by_poll: HashMap<PollId, i64> = counts
        .into_iter()
        .map(|count| (count.poll_id, count.count))
        .collect();

    let polls = rows
        .into_iter()
        .map(|row| OutgoingPollSummary {
            options: options_by_poll.remove(&row.id).unwrap_or_default(),
            respondent_count: counts_by_poll.get(&row.id).copied().unwrap_or(0),
            is_participated: identity.0.as_ref().map(|_| participated.contains(&row.id)),
            is_mine: identity
                .0
                .as_ref()
                .map(|user_id| *user_id == row.creator_id),
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            creator_id: row.creator_id,
            creator_nickname: row.creator_nickname,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(OutgoingPollList { total, polls }))
}

pub async fn detail(
    pool: web::Data<PgPool>,
    identity: OptionalIdentity,
    path: web::Path<PollId>,
) -> Result<HttpResponse, ApiError> {
    let pool = pool.get_ref();
    let poll_id = path.into_inner();
    let poll = super::poll_or_404(pool, &poll_id).await?;

    let creator = db::user::user_by_id(pool, &poll.creator_id)
        .await?
        .ok_or_else(|| eyre!("creator {} missing for poll {}", poll.creator_id.as_string(), poll_id.as_string()))?;
    let (options, comments) = try_join!(
        db::option::options_with_counts(pool, &poll_id),
        db::comment::comments_for_poll(pool, &poll_id),
    )?;
    let user_response = match &identity.0 {
        Some(user_id) => db::response::response_for_user(pool, &poll_id, user_id).await?,
        None => None,
    };

    Ok(HttpResponse::Ok().json(OutgoingPollDetail {
        id: poll.id,
        title: poll.title,
        description: poll.description,
        category: poll.category,
        expires_at: poll.expires_at,
        created_at: poll.created_at,
        updated_at: poll.updated_at,
        creator: OutgoingCreator::from_user(creator, Utc::now().date_naive()),
        options: options
            .into_iter()
            .map(OutgoingOptionWithCount::from)
            .collect(),
        comments: comments.into_iter().map(OutgoingComment::from).collect(),
        user_response: user_response.map(|response| OutgoingUserResponse {
            option_id: response.option_id,
            option_text: response.option_text,
        }),
    }))
}

pub async fn update(
    pool: web::Data<PgPool>,
    identity: Identity,
    path: web::Path<PollId>,
    body: web::Json<IncomingPollChanges>,
) -> Result<HttpResponse, ApiError> {
    let pool = pool.get_ref();
    let poll_id = path.into_inner();
    let poll = super::poll_or_404(pool, &poll_id).await?;
    if poll.creator_id != identity.0 {
        return Err(ApiError::Forbidden(
            "Only the creator can modify this poll.".to_string(),
        ));
    }

    let incoming = body.into_inner();
    if let Some(title) = &incoming.title {
        if title.trim().is_empty() {
            return Err(ApiError::Validation("Title must not be empty.".to_string()));
        }
    }
    let changes = PollChanges {
        title: incoming.title.map(|title| title.trim().to_string()),
        description: incoming.description,
        category: incoming.category,
        expires_at: incoming.deadline,
    };

    let updated = db::poll::update_poll(pool, &poll_id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Poll not found.".to_string()))?;
    let options = db::option::options_for_poll(pool, &poll_id).await?;

    Ok(HttpResponse::Ok().json(OutgoingPoll {
        id: updated.id,
        title: updated.title,
        description: updated.description,
        category: updated.category,
        creator_id: updated.creator_id,
        expires_at: updated.expires_at,
        created_at: updated.created_at,
        updated_at: updated.updated_at,
        options: options.into_iter().map(OutgoingOption::from).collect(),
    }))
}

pub async fn delete(
    pool: web::Data<PgPool>,
    identity: Identity,
    path: web::Path<PollId>,
) -> Result<HttpResponse, ApiError> {
    let pool = pool.get_ref();
    let poll_id = path.into_inner();
    let poll = super::poll_or_404(pool, &poll_id).await?;
    if poll.creator_id != identity.0 {
        return Err(ApiError::Forbidden(
            "Only the creator can delete this poll.".to_string(),
        ));
    }

    db::poll::delete_poll(pool, &poll_id).await?;
    info!(id = poll_id.as_string().as_str(), "Poll deleted");

    Ok(HttpResponse::NoContent().finish())
}
