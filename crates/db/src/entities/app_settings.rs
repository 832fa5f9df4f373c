//! Application settings entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Instance-wide runtime settings, stored as a single row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    // Cache
    /// TTL for cached story payloads and listings, in seconds.
    #[sea_orm(default_value = 300)]
    pub story_cache_ttl_seconds: i64,

    /// TTL for the cached dashboard overview, in seconds.
    #[sea_orm(default_value = 600)]
    pub dashboard_cache_ttl_seconds: i64,

    // Publishing
    /// Default publication window applied when publish gives no end date.
    #[sea_orm(default_value = 30)]
    pub default_active_days: i32,

    /// Default lookahead of the expiring-soon monitor, in hours.
    #[sea_orm(default_value = 48)]
    pub expiring_soon_window_hours: i32,

    // Feature toggles
    /// Whether new member registration is open.
    #[sea_orm(default_value = true)]
    pub registration_enabled: bool,

    /// Whether members can rate stories.
    #[sea_orm(default_value = true)]
    pub ratings_enabled: bool,

    /// Whether members can bookmark stories.
    #[sea_orm(default_value = true)]
    pub bookmarks_enabled: bool,

    pub created_at: DateTime<Utc>,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Singleton ID for the settings row
pub const APP_SETTINGS_ID: &str = "app";
