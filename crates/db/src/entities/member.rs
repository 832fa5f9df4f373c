//! Member entity (registered accounts).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Member account model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member")]
pub struct Model {
    /// Unique member ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Unique login name.
    #[sea_orm(unique, indexed)]
    pub username: String,

    /// Contact email, unique across members.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 password hash. Never serialized to clients.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Display name shown alongside stories and ratings.
    #[sea_orm(nullable)]
    pub display_name: Option<String>,

    /// Short self-description.
    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    /// Avatar image URL.
    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// Whether this member can administer stories and settings.
    #[sea_orm(default_value = false)]
    pub is_admin: bool,

    /// Opaque API token issued at login. Null until first login.
    #[sea_orm(nullable, unique, indexed)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    pub created_at: DateTime<Utc>,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::story::Entity")]
    Stories,

    #[sea_orm(has_many = "super::member_story_rating::Entity")]
    Ratings,

    #[sea_orm(has_many = "super::bookmark::Entity")]
    Bookmarks,

    #[sea_orm(has_many = "super::reading_progress::Entity")]
    ReadingProgress,
}

impl Related<super::story::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stories.def()
    }
}

impl Related<super::member_story_rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

impl Related<super::bookmark::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookmarks.def()
    }
}

impl Related<super::reading_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReadingProgress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
