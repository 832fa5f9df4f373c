//! Tag entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Free-form story tag model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    /// Unique tag ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Tag name, unique and stored lowercase.
    #[sea_orm(unique, indexed)]
    pub name: String,

    /// How many stories carry this tag (denormalized).
    #[sea_orm(default_value = 0)]
    pub usage_count: i32,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::story_tag::Entity")]
    StoryTags,
}

impl Related<super::story_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StoryTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
