//! Expiry scanner for the monitoring endpoint.

use chrono::{DateTime, Duration, Utc};
use fabula_common::AppResult;
use fabula_db::repositories::{CategoryRepository, RatingRepository, StoryRepository};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::settings::SettingsService;

/// Maximum rows returned by one scan.
const MAX_EXPIRING_ROWS: u64 = 50;

/// Narrowest accepted scan window in hours.
const MIN_WINDOW_HOURS: i64 = 1;

/// Widest accepted scan window in hours (one week).
const MAX_WINDOW_HOURS: i64 = 168;

/// One active story whose window ends soon, enriched for display.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiringStory {
    pub story_id: String,
    pub title: String,
    pub slug: String,
    pub active_until: DateTime<Utc>,
    pub hours_remaining: i64,
    pub category_name: Option<String>,
    pub view_count: i64,
    pub rating_mean: f64,
    pub rating_count: i64,
}

fn clamp_window(hours: i64) -> i64 {
    hours.clamp(MIN_WINDOW_HOURS, MAX_WINDOW_HOURS)
}

/// Read-only scanner over active stories approaching their end date.
#[derive(Clone)]
pub struct ExpiryService {
    story_repo: StoryRepository,
    category_repo: CategoryRepository,
    rating_repo: RatingRepository,
    settings: SettingsService,
}

impl ExpiryService {
    /// Create a new expiry service.
    #[must_use]
    pub const fn new(
        story_repo: StoryRepository,
        category_repo: CategoryRepository,
        rating_repo: RatingRepository,
        settings: SettingsService,
    ) -> Self {
        Self {
            story_repo,
            category_repo,
            rating_repo,
            settings,
        }
    }

    /// Active stories expiring within the window, soonest first.
    ///
    /// The window falls back to the configured default and is clamped
    /// to `[1, 168]` hours. Returns at most 50 rows.
    pub async fn find_expiring_soon(
        &self,
        within_hours: Option<i64>,
    ) -> AppResult<Vec<ExpiringStory>> {
        let hours = match within_hours {
            Some(h) => h,
            None => i64::from(self.settings.get().await?.expiring_soon_window_hours),
        };
        let hours = clamp_window(hours);

        let now = Utc::now();
        let stories = self
            .story_repo
            .find_expiring_between(now, now + Duration::hours(hours), MAX_EXPIRING_ROWS)
            .await?;

        debug!(window_hours = hours, found = stories.len(), "Scanned for expiring stories");
        if stories.is_empty() {
            return Ok(Vec::new());
        }

        let story_ids: Vec<String> = stories.iter().map(|s| s.id.clone()).collect();
        let aggregates: HashMap<String, (f64, i64)> = self
            .rating_repo
            .find_aggregates(&story_ids)
            .await?
            .into_iter()
            .map(|a| (a.story_id, (a.mean, a.total_count)))
            .collect();
        let categories: HashMap<String, String> = self
            .category_repo
            .find_all()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut results = Vec::with_capacity(stories.len());
        for story in stories {
            let Some(active_until) = story.active_until else {
                continue;
            };
            let (rating_mean, rating_count) = aggregates
                .get(&story.id)
                .copied()
                .unwrap_or((0.0, 0));

            results.push(ExpiringStory {
                category_name: categories.get(&story.category_id).cloned(),
                hours_remaining: (active_until - now).num_hours(),
                story_id: story.id,
                title: story.title,
                slug: story.slug,
                active_until,
                view_count: story.view_count,
                rating_mean,
                rating_count,
            });
        }

        Ok(results)
    }
}
