//! Admin dashboard analytics.
//!
//! Aggregate counters and story leaderboards for the admin overview.
//! The whole snapshot is cached under one key and recomputed on miss;
//! publishing and rating writes evict it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fabula_common::{AppError, AppResult};
use fabula_db::entities::{member, story, story_rating_aggregate};
use fabula_db::repositories::{MemberRepository, RatingRepository, StoryRepository};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cache::CacheService;
use super::settings::SettingsService;
use super::story::RatingSnapshot;

/// How many stories each leaderboard carries.
const LEADERBOARD_SIZE: u64 = 10;

/// One story on a dashboard leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub story_id: String,
    pub title: String,
    pub slug: String,
    pub view_count: i64,
    pub rating: RatingSnapshot,
}

/// Counters and leaderboards served to the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub story_count: u64,
    pub published_count: u64,
    pub member_count: u64,
    pub rating_count: u64,
    pub total_views: i64,
    pub top_by_views: Vec<LeaderboardEntry>,
    pub top_by_quality: Vec<LeaderboardEntry>,
    pub generated_at: DateTime<Utc>,
}

/// Analytics service for the admin dashboard.
#[derive(Clone)]
pub struct AnalyticsService {
    story_repo: StoryRepository,
    member_repo: MemberRepository,
    rating_repo: RatingRepository,
    settings: SettingsService,
    cache: CacheService,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(
        story_repo: StoryRepository,
        member_repo: MemberRepository,
        rating_repo: RatingRepository,
        settings: SettingsService,
        cache: CacheService,
    ) -> Self {
        Self {
            story_repo,
            member_repo,
            rating_repo,
            settings,
            cache,
        }
    }

    /// Dashboard overview, served from the cache when fresh.
    pub async fn overview(&self, actor: &member::Model) -> AppResult<DashboardOverview> {
        if !actor.is_admin {
            return Err(AppError::Forbidden(
                "only admins can view the dashboard".to_string(),
            ));
        }

        let key = self.cache.dashboard_key();
        if let Some(cached) = self.cache.get_json::<DashboardOverview>(&key).await {
            return Ok(cached);
        }

        let overview = self.compute().await?;
        if self.cache.is_enabled() {
            let ttl = self.settings.get().await?.dashboard_cache_ttl_seconds;
            self.cache.set_json(&key, &overview, ttl).await;
        }
        Ok(overview)
    }

    async fn compute(&self) -> AppResult<DashboardOverview> {
        let now = Utc::now();

        let story_count = self.story_repo.count().await?;
        let published_count = self.story_repo.count_published_at(now).await?;
        let member_count = self.member_repo.count().await?;
        let rating_count = self.rating_repo.count().await?;
        let total_views = self.story_repo.sum_views().await?;

        let most_viewed = self
            .story_repo
            .find_most_viewed(now, LEADERBOARD_SIZE)
            .await?;
        let ids: Vec<String> = most_viewed.iter().map(|s| s.id.clone()).collect();
        let aggregates: HashMap<String, story_rating_aggregate::Model> = self
            .rating_repo
            .find_aggregates(&ids)
            .await?
            .into_iter()
            .map(|a| (a.story_id.clone(), a))
            .collect();
        let top_by_views = most_viewed
            .into_iter()
            .map(|story| {
                let aggregate = aggregates.get(&story.id);
                leaderboard_entry(story, aggregate)
            })
            .collect();

        let top_by_quality = self
            .story_repo
            .find_top_rated(now, LEADERBOARD_SIZE)
            .await?
            .into_iter()
            .map(|(story, aggregate)| leaderboard_entry(story, aggregate.as_ref()))
            .collect();

        debug!(story_count, member_count, "Computed dashboard overview");

        Ok(DashboardOverview {
            story_count,
            published_count,
            member_count,
            rating_count,
            total_views,
            top_by_views,
            top_by_quality,
            generated_at: now,
        })
    }
}

fn leaderboard_entry(
    story: story::Model,
    aggregate: Option<&story_rating_aggregate::Model>,
) -> LeaderboardEntry {
    LeaderboardEntry {
        rating: RatingSnapshot::from_aggregate(aggregate),
        story_id: story.id,
        title: story.title,
        slug: story.slug,
        view_count: story.view_count,
    }
}
