//! Reading progress service.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fabula_common::{id::IdGenerator, AppError, AppResult};
use fabula_db::entities::reading_progress;
use fabula_db::repositories::{ReadingProgressRepository, StoryRepository};
use sea_orm::Set;
use serde::Serialize;

/// A progress row joined with its story for the continue-reading list.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressItem {
    pub story_id: String,
    pub title: String,
    pub slug: String,
    pub percent: i32,
    pub reading_time_minutes: i32,
    pub last_read_at: DateTime<Utc>,
}

/// Service tracking how far members have read each story.
#[derive(Clone)]
pub struct ReadingProgressService {
    progress_repo: ReadingProgressRepository,
    story_repo: StoryRepository,
    id_gen: IdGenerator,
}

impl ReadingProgressService {
    /// Create a new reading progress service.
    #[must_use]
    pub const fn new(
        progress_repo: ReadingProgressRepository,
        story_repo: StoryRepository,
    ) -> Self {
        Self {
            progress_repo,
            story_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record how far a member has read a story. Last write wins.
    pub async fn record(
        &self,
        member_id: &str,
        story_id: &str,
        percent: i32,
    ) -> AppResult<reading_progress::Model> {
        if !(0..=100).contains(&percent) {
            return Err(AppError::Validation(
                "percent must be between 0 and 100".to_string(),
            ));
        }

        if self.story_repo.find_by_id(story_id).await?.is_none() {
            return Err(AppError::StoryNotFound(story_id.to_string()));
        }

        let now = Utc::now();
        let existing = self
            .progress_repo
            .find_by_member_and_story(member_id, story_id)
            .await?;

        match existing {
            Some(progress) => {
                let mut active: reading_progress::ActiveModel = progress.into();
                active.percent = Set(percent);
                active.last_read_at = Set(now);
                active.updated_at = Set(Some(now));
                self.progress_repo.update(active).await
            }
            None => {
                let model = reading_progress::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    member_id: Set(member_id.to_string()),
                    story_id: Set(story_id.to_string()),
                    percent: Set(percent),
                    last_read_at: Set(now),
                    created_at: Set(now),
                    updated_at: Set(None),
                };
                self.progress_repo.create(model).await
            }
        }
    }

    /// A member's progress on one story, if any.
    pub async fn get(
        &self,
        member_id: &str,
        story_id: &str,
    ) -> AppResult<Option<reading_progress::Model>> {
        self.progress_repo
            .find_by_member_and_story(member_id, story_id)
            .await
    }

    /// Unfinished stories for the continue-reading list, most recent first.
    pub async fn list_in_progress(
        &self,
        member_id: &str,
        limit: u64,
    ) -> AppResult<Vec<ProgressItem>> {
        let rows = self
            .progress_repo
            .find_in_progress_by_member(member_id, limit)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let story_ids: Vec<String> = rows.iter().map(|p| p.story_id.clone()).collect();
        let stories: HashMap<String, _> = self
            .story_repo
            .find_by_ids(&story_ids)
            .await?
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();

        let mut items = Vec::with_capacity(rows.len());
        for progress in rows {
            let Some(story) = stories.get(&progress.story_id) else {
                continue;
            };
            items.push(ProgressItem {
                story_id: progress.story_id,
                title: story.title.clone(),
                slug: story.slug.clone(),
                percent: progress.percent,
                reading_time_minutes: story.reading_time_minutes,
                last_read_at: progress.last_read_at,
            });
        }
        Ok(items)
    }
}
