//! Story publishing history entity (append-only audit trail).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What kind of lifecycle transition a history row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum PublishingAction {
    /// First activation, or activation of a story never live before.
    #[sea_orm(string_value = "published")]
    Published,
    /// One-click activation from the admin listing.
    #[sea_orm(string_value = "quick_published")]
    QuickPublished,
    /// Re-activation of a story that had been live before.
    #[sea_orm(string_value = "republished")]
    Republished,
    /// Manual deactivation.
    #[sea_orm(string_value = "unpublished")]
    Unpublished,
    /// Activation with a future start date.
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// Publication window lengthened.
    #[sea_orm(string_value = "extended")]
    Extended,
    /// Lifecycle fields edited through the general update form.
    #[sea_orm(string_value = "updated")]
    Updated,
    /// Deactivated by the expiry sweep.
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl PublishingAction {
    /// Stable label matching the stored string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::QuickPublished => "quick_published",
            Self::Republished => "republished",
            Self::Unpublished => "unpublished",
            Self::Scheduled => "scheduled",
            Self::Extended => "extended",
            Self::Updated => "updated",
            Self::Expired => "expired",
        }
    }
}

/// One audit row per accepted lifecycle transition.
///
/// Written in the same transaction as the story mutation, and only when at
/// least one lifecycle field changed. Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "story_publishing_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The story whose lifecycle changed
    #[sea_orm(indexed)]
    pub story_id: String,

    /// The acting member
    #[sea_orm(indexed)]
    pub member_id: String,

    /// Transition kind.
    pub action: PublishingAction,

    /// `active` before the transition.
    pub previous_active: bool,

    /// `active` after the transition.
    pub new_active: bool,

    /// `active_from` before the transition.
    #[sea_orm(nullable)]
    pub previous_active_from: Option<DateTime<Utc>>,

    /// `active_from` after the transition.
    #[sea_orm(nullable)]
    pub new_active_from: Option<DateTime<Utc>>,

    /// `active_until` before the transition.
    #[sea_orm(nullable)]
    pub previous_active_until: Option<DateTime<Utc>>,

    /// `active_until` after the transition.
    #[sea_orm(nullable)]
    pub new_active_until: Option<DateTime<Utc>>,

    /// Free-text note, e.g. the reason given for an extension.
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,

    /// Names of the lifecycle fields that changed (JSON array of strings).
    #[sea_orm(column_type = "JsonBinary")]
    pub changed_fields: Json,

    /// Client IP the request came from.
    #[sea_orm(nullable)]
    pub ip_address: Option<String>,

    /// Client user agent.
    #[sea_orm(nullable)]
    pub user_agent: Option<String>,

    pub created_at: DateTime<Utc>,
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

    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Member,
}

impl Related<super::story::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Story.def()
    }
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
