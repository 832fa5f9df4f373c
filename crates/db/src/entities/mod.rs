//! Database entities.

pub mod app_settings;
pub mod bookmark;
pub mod category;
pub mod member;
pub mod member_story_rating;
pub mod reading_progress;
pub mod story;
pub mod story_publishing_history;
pub mod story_rating_aggregate;
pub mod story_tag;
pub mod tag;

pub use app_settings::Entity as AppSettings;
pub use bookmark::Entity as Bookmark;
pub use category::Entity as Category;
pub use member::Entity as Member;
pub use member_story_rating::Entity as MemberStoryRating;
pub use reading_progress::Entity as ReadingProgress;
pub use story::Entity as Story;
pub use story_publishing_history::Entity as StoryPublishingHistory;
pub use story_rating_aggregate::Entity as StoryRatingAggregate;
pub use story_tag::Entity as StoryTag;
pub use tag::Entity as Tag;
