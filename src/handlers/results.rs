use actix_web::{web, HttpResponse};
use futures::try_join;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{self, option::OptionId, poll::PollId, results::ValueCount};
use crate::error::ApiError;
use crate::results::{self, GroupDimension, OptionStats};

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub group_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingGroupCount {
    pub value: String,
    pub count: i64,
}

impl From<ValueCount> for OutgoingGroupCount {
    fn from(count: ValueCount) -> Self {
        Self {
            value: count.group_value,
            count: count.count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingOptionStats {
    pub option_id: OptionId,
    pub option_text: String,
    pub count: i64,
    pub percentage: i64,
    pub stats: Vec<OutgoingGroupCount>,
}

impl From<OptionStats> for OutgoingOptionStats {
    fn from(stats: OptionStats) -> Self {
        Self {
            option_id: stats.option_id,
            option_text: stats.option_text,
            count: stats.count,
            percentage: stats.percentage,
            stats: stats.stats.into_iter().map(OutgoingGroupCount::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingGroupedResults {
    pub poll_id: PollId,
    pub group_by: String,
    pub total_votes: i64,
    pub option_stats: Vec<OutgoingOptionStats>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingRegionCount {
    pub region: String,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingRegionStats {
    pub poll_id: PollId,
    pub region_stats: Vec<OutgoingRegionCount>,
}

/// Option-agnostic voter breakdowns over every dimension at once.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingDemographics {
    pub poll_id: PollId,
    pub total_votes: i64,
    pub gender: Vec<OutgoingGroupCount>,
    pub age: Vec<OutgoingGroupCount>,
    pub job: Vec<OutgoingGroupCount>,
    pub region: Vec<OutgoingGroupCount>,
}

fn parse_group_by(query: &ResultsQuery) -> Result<GroupDimension, ApiError> {
    query
        .group_by
        .as_deref()
        .and_then(GroupDimension::parse)
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "Invalid or missing group_by parameter. Allowed values: {}",
                GroupDimension::allowed()
            ))
        })
}

pub async fn grouped(
    pool: web::Data<PgPool>,
    path: web::Path<PollId>,
    query: web::Query<ResultsQuery>,
) -> Result<HttpResponse, ApiError> {
    let pool = pool.get_ref();
    let poll_id = path.into_inner();
    let dimension = parse_group_by(&query)?;
    super::poll_or_404(pool, &poll_id).await?;

    let (options, rows) = try_join!(
        db::option::options_for_poll(pool, &poll_id),
        db::results::option_group_counts(pool, &poll_id, dimension),
    )?;
    let (total_votes, stats) = results::option_stats(options, rows, dimension);

    Ok(HttpResponse::Ok().json(OutgoingGroupedResults {
        poll_id,
        group_by: dimension.as_str().to_string(),
        total_votes,
        option_stats: stats.into_iter().map(OutgoingOptionStats::from).collect(),
    }))
}

pub async fn region_stats(
    pool: web::Data<PgPool>,
    path: web::Path<PollId>,
) -> Result<HttpResponse, ApiError> {
    let pool = pool.get_ref();
    let poll_id = path.into_inner();
    super::poll_or_404(pool, &poll_id).await?;

    let counts = db::results::voter_counts(pool, &poll_id, GroupDimension::Region).await?;

    Ok(HttpResponse::Ok().json(OutgoingRegionStats {
        poll_id,
        region_stats: counts
            .into_iter()
            .map(|count| OutgoingRegionCount {
                region: count.group_value,
                count: count.count,
            })
            .collect(),
    }))
}

pub async fn demographics(
    pool: web::Data<PgPool>,
    path: web::Path<PollId>,
) -> Result<HttpResponse, ApiError> {
    let pool = pool.get_ref();
    let poll_id = path.into_inner();
    super::poll_or_404(pool, &poll_id).await?;

    let (gender, age, job, region) = try_join!(
        db::results::voter_counts(pool, &poll_id, GroupDimension::Gender),
        db::results::voter_counts(pool, &poll_id, GroupDimension::Age),
        db::results::voter_counts(pool, &poll_id, GroupDimension::Job),
        db::results::voter_counts(pool, &poll_id, GroupDimension::Region),
    )?;
    // every response has exactly one gender bucket, so this sums to
    // the poll's response count
    let total_votes = gender.iter().map(|count| count.count).sum();

    Ok(HttpResponse::Ok().json(OutgoingDemographics {
        poll_id,
        total_votes,
        gender: gender.into_iter().map(OutgoingGroupCount::from).collect(),
        age: results::fill_age_bands(age)
            .into_iter()
            .map(OutgoingGroupCount::from)
            .collect(),
        job: job.into_iter().map(OutgoingGroupCount::from).collect(),
        region: region.into_iter().map(OutgoingGroupCount::from).collect(),
    }))
}
