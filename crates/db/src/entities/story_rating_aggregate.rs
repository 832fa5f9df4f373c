//! Story rating aggregate entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Star histogram stored in the aggregate row.
///
/// Serialized as a JSON object keyed by star value, `{"1": n, ..., "5": n}`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingHistogram {
    #[serde(rename = "1", default)]
    pub one: i64,
    #[serde(rename = "2", default)]
    pub two: i64,
    #[serde(rename = "3", default)]
    pub three: i64,
    #[serde(rename = "4", default)]
    pub four: i64,
    #[serde(rename = "5", default)]
    pub five: i64,
}

impl RatingHistogram {
    /// Count for one star bucket. Out-of-range stars read as 0.
    #[must_use]
    pub const fn get(&self, star: i32) -> i64 {
        match star {
            1 => self.one,
            2 => self.two,
            3 => self.three,
            4 => self.four,
            5 => self.five,
            _ => 0,
        }
    }

    /// Add one rating to a bucket. Out-of-range stars are ignored.
    pub const fn increment(&mut self, star: i32) {
        match star {
            1 => self.one += 1,
            2 => self.two += 1,
            3 => self.three += 1,
            4 => self.four += 1,
            5 => self.five += 1,
            _ => {}
        }
    }

    /// Remove one rating from a bucket. Buckets never go below zero.
    pub const fn decrement(&mut self, star: i32) {
        match star {
            1 => self.one = self.one.saturating_sub(1),
            2 => self.two = self.two.saturating_sub(1),
            3 => self.three = self.three.saturating_sub(1),
            4 => self.four = self.four.saturating_sub(1),
            5 => self.five = self.five.saturating_sub(1),
            _ => {}
        }
    }

    /// Total ratings across all buckets.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.one + self.two + self.three + self.four + self.five
    }

    /// Star-weighted sum across all buckets.
    #[must_use]
    pub const fn weighted_sum(&self) -> i64 {
        self.one + self.two * 2 + self.three * 3 + self.four * 4 + self.five * 5
    }

    /// Parse the stored JSON column. Malformed data reads as an empty histogram.
    #[must_use]
    pub fn from_json(value: &Json) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// Serialize for the JSON column.
    #[must_use]
    pub fn to_json(&self) -> Json {
        serde_json::json!({
            "1": self.one,
            "2": self.two,
            "3": self.three,
            "4": self.four,
            "5": self.five,
        })
    }
}

/// Mean star value rounded to 2 decimals, 0 when there are no ratings.
#[must_use]
#[allow(clippy::cast_precision_loss)] // counts stay far below 2^52
pub fn mean_of(sum: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (sum as f64 / total as f64 * 100.0).round() / 100.0
}

/// Denormalized rating summary, one row per story.
///
/// Created lazily on the first rating and kept in step with
/// `member_story_rating` rows inside the same transaction.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "story_rating_aggregate")]
pub struct Model {
    /// The summarized story (one-to-one).
    #[sea_orm(primary_key, auto_increment = false)]
    pub story_id: String,

    /// How many members have rated the story.
    pub total_count: i64,

    /// Sum of all star values.
    pub rating_sum: i64,

    /// Mean star value rounded to 2 decimals, 0 when `total_count` is 0.
    #[sea_orm(column_type = "Double")]
    pub mean: f64,

    /// Star histogram, `{"1": n, ..., "5": n}`.
    #[sea_orm(column_type = "JsonBinary")]
    pub histogram: Json,

    pub created_at: DateTime<Utc>,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Parsed histogram column.
    #[must_use]
    pub fn parsed_histogram(&self) -> RatingHistogram {
        RatingHistogram::from_json(&self.histogram)
    }

    /// Whether the denormalized counters agree with the histogram.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let histogram = self.parsed_histogram();
        histogram.total() == self.total_count
            && histogram.weighted_sum() == self.rating_sum
            && (self.mean - mean_of(self.rating_sum, self.total_count)).abs() < f64::EPSILON
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::story::Entity",
        from = "Column::StoryId",
        to = "super::story::Column::Id",
        on_delete = "Cascade"
    )]
    Story,
}

impl Related<super::story::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Story.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
