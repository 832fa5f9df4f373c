//! Category entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Story category model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    /// Unique category ID.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Human-readable category name.
    pub name: String,

    /// URL-safe identifier, unique across categories.
    #[sea_orm(unique, indexed)]
    pub slug: String,

    /// Optional description shown on listing pages.
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Display order (lower = higher priority).
    #[sea_orm(default_value = 0)]
    pub display_order: i32,

    /// Inactive categories accept no new stories and are hidden from listings.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::story::Entity")]
    Stories,
}

impl Related<super::story::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
