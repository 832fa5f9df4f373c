//! Repository layer over the database entities.

pub mod bookmark;
pub mod category;
pub mod member;
pub mod publishing_history;
pub mod rating;
pub mod reading_progress;
pub mod story;
pub mod tag;

pub use bookmark::BookmarkRepository;
pub use category::CategoryRepository;
pub use member::MemberRepository;
pub use publishing_history::PublishingHistoryRepository;
pub use rating::RatingRepository;
pub use reading_progress::ReadingProgressRepository;
pub use story::StoryRepository;
pub use tag::TagRepository;
