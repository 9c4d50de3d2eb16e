use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::db::option::{InternalOption, OptionId};
use crate::db::results::{OptionGroupCount, ValueCount};

/// Demographic attribute responses can be grouped by.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GroupDimension {
    Gender,
    Region,
    Job,
    Age,
}

/// Age bands in ascending order. Labels sort lexicographically in band
/// order, so SQL `ORDER BY group_value` needs no special casing.
pub const AGE_BANDS: [&str; 6] = ["10s", "20s", "30s", "40s", "50s", "60+"];

const AGE_BAND_SQL: &str = "CASE \
     WHEN date_part('year', age(u.birth_date)) < 20 THEN '10s' \
     WHEN date_part('year', age(u.birth_date)) < 30 THEN '20s' \
     WHEN date_part('year', age(u.birth_date)) < 40 THEN '30s' \
     WHEN date_part('year', age(u.birth_date)) < 50 THEN '40s' \
     WHEN date_part('year', age(u.birth_date)) < 60 THEN '50s' \
     ELSE '60+' END";

impl GroupDimension {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "gender" => Some(Self::Gender),
            "region" => Some(Self::Region),
            "job" => Some(Self::Job),
            "age" => Some(Self::Age),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gender => "gender",
            Self::Region => "region",
            Self::Job => "job",
            Self::Age => "age",
        }
    }

    pub fn allowed() -> &'static str {
        "gender, region, job, age"
    }

    /// SQL expression producing the group value for a joined user row
    /// `u`. Always a fixed column or CASE expression.
    pub fn group_expr(self) -> &'static str {
        match self {
            Self::Gender => "u.gender",
            Self::Region => "u.region",
            Self::Job => "u.job",
            Self::Age => AGE_BAND_SQL,
        }
    }
}

/// Per-option aggregate for one grouping dimension.
#[derive(Clone, Debug)]
pub struct OptionStats {
    pub option_id: OptionId,
    pub option_text: String,
    pub count: i64,
    pub percentage: i64,
    pub stats: Vec<ValueCount>,
}

/// Share of the poll's total votes, rounded to whole percent. Zero
/// when the poll has no votes at all.
pub fn percentage(count: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as i64
}

/// Full years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}

pub fn age_band(age: i32) -> &'static str {
    match age {
        a if a < 20 => "10s",
        a if a < 30 => "20s",
        a if a < 40 => "30s",
        a if a < 50 => "40s",
        a if a < 60 => "50s",
        _ => "60+",
    }
}

/// Expand sparse age counts to the complete band domain. The grouped
/// query omits bands nobody voted from; charts want every band.
pub fn fill_age_bands(counts: Vec<ValueCount>) -> Vec<ValueCount> {
    let by_band: HashMap<&str, i64> = counts
        .iter()
        .map(|c| (c.group_value.as_str(), c.count))
        .collect();
    AGE_BANDS
        .iter()
        .map(|band| ValueCount {
            group_value: (*band).to_string(),
            count: by_band.get(band).copied().unwrap_or(0),
        })
        .collect()
}

/// Assemble per-option stats from the grouped counts. Every option of
/// the poll appears in the output, including ones nobody picked; the
/// option order of the input is preserved. Returns the poll's total
/// vote count alongside the per-option breakdown.
pub fn option_stats(
    options: Vec<InternalOption>,
    rows: Vec<OptionGroupCount>,
    dimension: GroupDimension,
) -> (i64, Vec<OptionStats>) {
    let total: i64 = rows.iter().map(|row| row.count).sum();

    let mut by_option: HashMap<OptionId, Vec<ValueCount>> = HashMap::new();
    for row in rows {
        by_option
            .entry(row.option_id)
            .or_default()
            .push(ValueCount {
                group_value: row.group_value,
                count: row.count,
            });
    }

    let stats = options
        .into_iter()
        .map(|option| {
            let mut groups = by_option.remove(&option.id).unwrap_or_default();
            if dimension == GroupDimension::Age {
                groups = fill_age_bands(groups);
            }
            let count: i64 = groups.iter().map(|g| g.count).sum();
            OptionStats {
                option_id: option.id,
                option_text: option.option_text,
                count,
                percentage: percentage(count, total),
                stats: groups,
            }
        })
        .collect();

    (total, stats)
}
