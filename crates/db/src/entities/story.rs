//! Story entity and the derived publishing state.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Publishing state derived from the lifecycle fields.
///
/// Never stored; computed from `active`, `active_from`, `active_until`
/// against a caller-supplied clock so listings, scanners, and tests agree
/// on the same instant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishingState {
    /// Not active, regardless of dates.
    Draft,
    /// Active with a publication window covering `now`.
    Published,
    /// Active but `active_from` is still in the future.
    Scheduled,
    /// Active but `active_until` has passed.
    Expired,
}

impl PublishingState {
    /// Stable lowercase label used in responses and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Scheduled => "scheduled",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for PublishingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Story model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "story")]
pub struct Model {
    /// Unique story ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Authoring member ID
    #[sea_orm(indexed)]
    pub author_id: String,

    /// Category ID
    #[sea_orm(indexed)]
    pub category_id: String,

    /// Story title.
    pub title: String,

    /// URL-safe identifier, unique across stories.
    #[sea_orm(unique, indexed)]
    pub slug: String,

    /// Short teaser shown in listings.
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,

    /// Full story body.
    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Cover image URL.
    #[sea_orm(nullable)]
    pub cover_image_url: Option<String>,

    /// Detail-page fetches (denormalized)
    #[sea_orm(default_value = 0)]
    pub view_count: i64,

    /// Estimated reading time in minutes, derived from the body.
    #[sea_orm(default_value = 1)]
    pub reading_time_minutes: i32,

    /// Lifecycle switch. Mutated only by the publishing service.
    #[sea_orm(default_value = false, indexed)]
    pub active: bool,

    /// Start of the publication window. Null = immediately once active.
    #[sea_orm(nullable)]
    pub active_from: Option<DateTime<Utc>>,

    /// End of the publication window. Null = no expiry.
    #[sea_orm(nullable, indexed)]
    pub active_until: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Derive the publishing state at `now`.
    #[must_use]
    pub fn publishing_state(&self, now: DateTime<Utc>) -> PublishingState {
        if !self.active {
            return PublishingState::Draft;
        }
        if self.active_from.is_some_and(|from| from > now) {
            return PublishingState::Scheduled;
        }
        if self.active_until.is_some_and(|until| until < now) {
            return PublishingState::Expired;
        }
        PublishingState::Published
    }

    /// Whether the story is visible to readers at `now`.
    #[must_use]
    pub fn is_effectively_published(&self, now: DateTime<Utc>) -> bool {
        self.publishing_state(now) == PublishingState::Published
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::AuthorId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Author,

    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,

    #[sea_orm(has_many = "super::story_publishing_history::Entity")]
    PublishingHistory,

    #[sea_orm(has_many = "super::member_story_rating::Entity")]
    Ratings,

    #[sea_orm(has_one = "super::story_rating_aggregate::Entity")]
    RatingAggregate,

    #[sea_orm(has_many = "super::story_tag::Entity")]
    StoryTags,

    #[sea_orm(has_many = "super::bookmark::Entity")]
    Bookmarks,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::story_rating_aggregate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RatingAggregate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn story(
        active: bool,
        active_from: Option<DateTime<Utc>>,
        active_until: Option<DateTime<Utc>>,
    ) -> Model {
        Model {
            id: "01story0000000000000000000".to_string(),
            author_id: "01member000000000000000000".to_string(),
            category_id: "01category0000000000000000".to_string(),
            title: "Title".to_string(),
            slug: "title".to_string(),
            summary: None,
            body: "Body".to_string(),
            cover_image_url: None,
            view_count: 0,
            reading_time_minutes: 1,
            active,
            active_from,
            active_until,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_inactive_is_draft_regardless_of_dates() {
        let now = Utc::now();
        let future = Some(now + Duration::hours(1));
        let past = Some(now - Duration::hours(1));

        assert_eq!(story(false, None, None).publishing_state(now), PublishingState::Draft);
        assert_eq!(story(false, past, future).publishing_state(now), PublishingState::Draft);
        assert_eq!(story(false, future, past).publishing_state(now), PublishingState::Draft);
    }

    #[test]
    fn test_active_with_open_window_is_published() {
        let now = Utc::now();
        let past = Some(now - Duration::hours(1));
        let future = Some(now + Duration::hours(1));

        assert_eq!(story(true, None, None).publishing_state(now), PublishingState::Published);
        assert_eq!(story(true, past, None).publishing_state(now), PublishingState::Published);
        assert_eq!(story(true, None, future).publishing_state(now), PublishingState::Published);
        assert_eq!(story(true, past, future).publishing_state(now), PublishingState::Published);
    }

    #[test]
    fn test_future_start_is_scheduled_even_with_past_end() {
        let now = Utc::now();
        let future = Some(now + Duration::hours(1));
        let past = Some(now - Duration::hours(1));

        assert_eq!(story(true, future, None).publishing_state(now), PublishingState::Scheduled);
        assert_eq!(story(true, future, past).publishing_state(now), PublishingState::Scheduled);
    }

    #[test]
    fn test_past_end_is_expired() {
        let now = Utc::now();
        let past = Some(now - Duration::hours(1));
        let earlier = Some(now - Duration::hours(2));

        assert_eq!(story(true, None, past).publishing_state(now), PublishingState::Expired);
        assert_eq!(story(true, earlier, past).publishing_state(now), PublishingState::Expired);
    }

    #[test]
    fn test_window_boundaries_are_inclusive() {
        let now = Utc::now();

        let starting = story(true, Some(now), None);
        assert!(starting.is_effectively_published(now));

        let ending = story(true, None, Some(now));
        assert!(ending.is_effectively_published(now));
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(PublishingState::Draft.to_string(), "draft");
        assert_eq!(PublishingState::Published.as_str(), "published");
        assert_eq!(PublishingState::Scheduled.as_str(), "scheduled");
        assert_eq!(PublishingState::Expired.as_str(), "expired");
    }
}
