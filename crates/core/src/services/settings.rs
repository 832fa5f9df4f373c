//! Application settings service.

use fabula_common::{AppError, AppResult, PublishingConfig};
use fabula_db::entities::{app_settings, app_settings::APP_SETTINGS_ID};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Input for updating application settings.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateSettingsInput {
    pub story_cache_ttl_seconds: Option<i64>,
    pub dashboard_cache_ttl_seconds: Option<i64>,
    pub default_active_days: Option<i32>,
    pub expiring_soon_window_hours: Option<i32>,
    pub registration_enabled: Option<bool>,
    pub ratings_enabled: Option<bool>,
    pub bookmarks_enabled: Option<bool>,
}

/// Settings service managing the singleton `app_settings` row.
#[derive(Clone)]
pub struct SettingsService {
    db: Arc<DatabaseConnection>,
    initial_active_days: i32,
}

impl SettingsService {
    /// Create a new settings service.
    ///
    /// The configured publishing window length seeds the settings row
    /// when it is first created; afterwards the row is authoritative.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, publishing: &PublishingConfig) -> Self {
        Self {
            db,
            initial_active_days: i32::try_from(publishing.default_active_days).unwrap_or(30),
        }
    }

    /// Get settings, creating the default row if not exists.
    pub async fn get(&self) -> AppResult<app_settings::Model> {
        let settings = app_settings::Entity::find_by_id(APP_SETTINGS_ID)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match settings {
            Some(s) => Ok(s),
            None => {
                // Create default settings
                let now = chrono::Utc::now();
                let model = app_settings::ActiveModel {
                    id: Set(APP_SETTINGS_ID.to_string()),
                    story_cache_ttl_seconds: Set(300),
                    dashboard_cache_ttl_seconds: Set(600),
                    default_active_days: Set(self.initial_active_days),
                    expiring_soon_window_hours: Set(48),
                    registration_enabled: Set(true),
                    ratings_enabled: Set(true),
                    bookmarks_enabled: Set(true),
                    created_at: Set(now),
                    updated_at: Set(None),
                };

                let result = model
                    .insert(self.db.as_ref())
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                Ok(result)
            }
        }
    }

    /// Update settings.
    pub async fn update(&self, input: UpdateSettingsInput) -> AppResult<app_settings::Model> {
        Self::validate(&input)?;

        // Ensure settings exist
        let _ = self.get().await?;

        let now = chrono::Utc::now();
        let mut model = app_settings::ActiveModel {
            id: Set(APP_SETTINGS_ID.to_string()),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        if let Some(ttl) = input.story_cache_ttl_seconds {
            model.story_cache_ttl_seconds = Set(ttl);
        }
        if let Some(ttl) = input.dashboard_cache_ttl_seconds {
            model.dashboard_cache_ttl_seconds = Set(ttl);
        }
        if let Some(days) = input.default_active_days {
            model.default_active_days = Set(days);
        }
        if let Some(hours) = input.expiring_soon_window_hours {
            model.expiring_soon_window_hours = Set(hours);
        }
        if let Some(enabled) = input.registration_enabled {
            model.registration_enabled = Set(enabled);
        }
        if let Some(enabled) = input.ratings_enabled {
            model.ratings_enabled = Set(enabled);
        }
        if let Some(enabled) = input.bookmarks_enabled {
            model.bookmarks_enabled = Set(enabled);
        }

        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn validate(input: &UpdateSettingsInput) -> AppResult<()> {
        if let Some(ttl) = input.story_cache_ttl_seconds {
            if ttl < 1 {
                return Err(AppError::Validation(
                    "story_cache_ttl_seconds must be at least 1".to_string(),
                ));
            }
        }
        if let Some(ttl) = input.dashboard_cache_ttl_seconds {
            if ttl < 1 {
                return Err(AppError::Validation(
                    "dashboard_cache_ttl_seconds must be at least 1".to_string(),
                ));
            }
        }
        if let Some(days) = input.default_active_days {
            if !(1..=365).contains(&days) {
                return Err(AppError::Validation(
                    "default_active_days must be between 1 and 365".to_string(),
                ));
            }
        }
        if let Some(hours) = input.expiring_soon_window_hours {
            if !(1..=168).contains(&hours) {
                return Err(AppError::Validation(
                    "expiring_soon_window_hours must be between 1 and 168".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn default_settings() -> app_settings::Model {
        app_settings::Model {
            id: APP_SETTINGS_ID.to_string(),
            story_cache_ttl_seconds: 300,
            dashboard_cache_ttl_seconds: 600,
            default_active_days: 30,
            expiring_soon_window_hours: 48,
            registration_enabled: true,
            ratings_enabled: true,
            bookmarks_enabled: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_existing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[default_settings()]])
                .into_connection(),
        );

        let service = SettingsService::new(db, &PublishingConfig::default());
        let settings = service.get().await.unwrap();

        assert_eq!(settings.default_active_days, 30);
    }

    #[tokio::test]
    async fn test_update_rejects_out_of_range_days() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = SettingsService::new(db, &PublishingConfig::default());
        let result = service
            .update(UpdateSettingsInput {
                default_active_days: Some(0),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_out_of_range_window() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = SettingsService::new(db, &PublishingConfig::default());
        let result = service
            .update(UpdateSettingsInput {
                expiring_soon_window_hours: Some(200),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
