//! Business logic services.

#![allow(missing_docs)]

pub mod analytics;
pub mod bookmark;
pub mod cache;
pub mod category;
pub mod expiry;
pub mod member;
pub mod publishing;
pub mod rating;
pub mod reading_progress;
pub mod settings;
pub mod story;
pub mod tag;

pub use analytics::{AnalyticsService, DashboardOverview, LeaderboardEntry};
pub use bookmark::{BookmarkService, BookmarkedStory};
pub use cache::CacheService;
pub use category::{CategoryService, CreateCategoryInput, UpdateCategoryInput};
pub use expiry::{ExpiringStory, ExpiryService};
pub use member::{
    AuthSession, LoginInput, MemberProfile, MemberService, RegisterInput, UpdateProfileInput,
};
pub use publishing::{
    BulkPublishReport, ExpirySweepReport, FailedItem, PublishOptions, PublishingService,
    RequestContext, can_update,
};
pub use rating::{RatingService, quality_score};
pub use reading_progress::{ProgressItem, ReadingProgressService};
pub use settings::{SettingsService, UpdateSettingsInput};
pub use story::{
    CreateStoryInput, RatingSnapshot, StoryDetail, StoryListItem, StoryService, UpdateStoryInput,
    reading_time_minutes, slugify,
};
pub use tag::TagService;
