use color_eyre::eyre::Report;
use sqlx::PgPool;
use tracing::debug;

use super::option::OptionId;
use super::poll::PollId;
use crate::results::GroupDimension;

/// One aggregation cell: votes for an option from one demographic group.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct OptionGroupCount {
    pub option_id: OptionId,
    pub group_value: String,
    pub count: i64,
}

/// Votes on a poll from one demographic group, across all options.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct ValueCount {
    pub group_value: String,
    pub count: i64,
}

/// Vote counts for a poll grouped by option and by the voter attribute
/// the dimension selects. Grouping happens in SQL so the whole poll
/// aggregates in a single query.
pub async fn option_group_counts(
    pool: &PgPool,
    poll_id: &PollId,
    dimension: GroupDimension,
) -> Result<Vec<OptionGroupCount>, Report> {
    debug!(
        poll_id = poll_id.as_string().as_str(),
        group_by = dimension.as_str(),
        "Aggregating responses by option and group"
    );
    // group_expr() expands to a fixed column or CASE expression, never
    // to caller input.
    let query = format!(
        "SELECT o.id AS option_id, {expr} AS group_value, COUNT(r.id) AS count \
         FROM responses r \
         JOIN options o ON o.id = r.option_id \
         JOIN users u ON u.id = r.user_id \
         WHERE r.poll_id = $1 \
         GROUP BY o.id, o.position, group_value \
         ORDER BY o.position ASC, o.id ASC, group_value ASC",
        expr = dimension.group_expr()
    );
    let counts = sqlx::query_as::<_, OptionGroupCount>(&query)
        .bind(poll_id.0)
        .fetch_all(pool)
        .await?;

    Ok(counts)
}

/// Vote counts for a poll by voter attribute alone, ignoring which
/// option was picked.
pub async fn voter_counts(
    pool: &PgPool,
    poll_id: &PollId,
    dimension: GroupDimension,
) -> Result<Vec<ValueCount>, Report> {
    debug!(
        poll_id = poll_id.as_string().as_str(),
        group_by = dimension.as_str(),
        "Aggregating responses by group"
    );
    let query = format!(
        "SELECT {expr} AS group_value, COUNT(r.id) AS count \
         FROM responses r \
         JOIN users u ON u.id = r.user_id \
         WHERE r.poll_id = $1 \
         GROUP BY group_value \
         ORDER BY group_value ASC",
        expr = dimension.group_expr()
    );
    let counts = sqlx::query_as::<_, ValueCount>(&query)
        .bind(poll_id.0)
        .fetch_all(pool)
        .await?;

    Ok(counts)
}
