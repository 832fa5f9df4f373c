//! Publishing lifecycle service.
//!
//! All story lifecycle mutations flow through here. Each accepted
//! transition updates the story and appends one audit row in the same
//! transaction, with the story row locked. A transition that would not
//! change any lifecycle field is rejected before anything is written.

use chrono::{DateTime, Duration, Utc};
use fabula_common::{AppError, AppResult, id::IdGenerator};
use fabula_db::entities::story_publishing_history::PublishingAction;
use fabula_db::entities::{member, story, story_publishing_history};
use fabula_db::repositories::{PublishingHistoryRepository, StoryRepository};
use sea_orm::{DatabaseConnection, DatabaseTransaction, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::cache::CacheService;
use super::settings::SettingsService;

/// Options for publishing a story.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PublishOptions {
    /// Window length in days; falls back to the configured default.
    pub active_until_days: Option<i64>,
    /// Free-text note stored on the audit row.
    pub note: Option<String>,
    /// One-click admin path; tags the audit row as `quick_published`.
    #[serde(default)]
    pub quick: bool,
}

/// Request provenance recorded on audit rows.
#[derive(Debug, Default, Clone)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// A single failed item in a bulk operation.
#[derive(Debug, Clone, Serialize)]
pub struct FailedItem {
    pub story_id: String,
    pub error: String,
}

/// Outcome of a bulk publish.
#[derive(Debug, Serialize)]
pub struct BulkPublishReport {
    pub success_count: usize,
    pub failed: Vec<FailedItem>,
}

/// Outcome of an expiry sweep.
#[derive(Debug, Serialize)]
pub struct ExpirySweepReport {
    pub deactivated_count: usize,
    pub failed: Vec<FailedItem>,
}

/// Target lifecycle values for one transition.
struct Transition {
    action: PublishingAction,
    active: bool,
    active_from: Option<DateTime<Utc>>,
    active_until: Option<DateTime<Utc>>,
    note: Option<String>,
}

/// Whether a member may change a story's lifecycle.
#[must_use]
pub fn can_update(actor: &member::Model, story: &story::Model) -> bool {
    actor.is_admin || story.author_id == actor.id
}

fn validate_window_days(days: i64) -> AppResult<()> {
    if !(1..=365).contains(&days) {
        return Err(AppError::Validation(
            "days must be between 1 and 365".to_string(),
        ));
    }
    Ok(())
}

/// Lifecycle fields whose value would change, in a stable order.
fn changed_fields(
    story: &story::Model,
    active: bool,
    active_from: Option<DateTime<Utc>>,
    active_until: Option<DateTime<Utc>>,
) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if story.active != active {
        changed.push("active");
    }
    if story.active_from != active_from {
        changed.push("active_from");
    }
    if story.active_until != active_until {
        changed.push("active_until");
    }
    changed
}

/// Audit tag for an activation.
const fn publish_action(story: &story::Model, quick: bool) -> PublishingAction {
    if quick {
        PublishingAction::QuickPublished
    } else if !story.active && story.active_from.is_some() {
        // The story had been live before and is coming back.
        PublishingAction::Republished
    } else {
        PublishingAction::Published
    }
}

/// Service for story lifecycle transitions.
#[derive(Clone)]
pub struct PublishingService {
    db: Arc<DatabaseConnection>,
    story_repo: StoryRepository,
    history_repo: PublishingHistoryRepository,
    settings: SettingsService,
    cache: CacheService,
    id_gen: IdGenerator,
}

impl PublishingService {
    /// Create a new publishing service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        story_repo: StoryRepository,
        history_repo: PublishingHistoryRepository,
        settings: SettingsService,
        cache: CacheService,
    ) -> Self {
        Self {
            db,
            story_repo,
            history_repo,
            settings,
            cache,
            id_gen: IdGenerator::new(),
        }
    }

    /// Activate a story, filling in missing window bounds.
    ///
    /// `active_from` defaults to now and `active_until` to now plus the
    /// requested (or configured) number of days; bounds that are already
    /// set are kept.
    pub async fn publish(
        &self,
        story_id: &str,
        actor: &member::Model,
        options: PublishOptions,
        ctx: &RequestContext,
    ) -> AppResult<story::Model> {
        let days = match options.active_until_days {
            Some(days) => {
                validate_window_days(days)?;
                days
            }
            None => i64::from(self.settings.get().await?.default_active_days),
        };
        let PublishOptions { note, quick, .. } = options;

        self.run_transition(story_id, actor, ctx, move |story, now| {
            Ok(Transition {
                action: publish_action(story, quick),
                active: true,
                active_from: story.active_from.or(Some(now)),
                active_until: story
                    .active_until
                    .or_else(|| Some(now + Duration::days(days))),
                note,
            })
        })
        .await
    }

    /// Deactivate a story, leaving the window bounds untouched.
    pub async fn unpublish(
        &self,
        story_id: &str,
        actor: &member::Model,
        ctx: &RequestContext,
    ) -> AppResult<story::Model> {
        self.run_transition(story_id, actor, ctx, |story, _now| {
            Ok(Transition {
                action: PublishingAction::Unpublished,
                active: false,
                active_from: story.active_from,
                active_until: story.active_until,
                note: None,
            })
        })
        .await
    }

    /// Push `active_until` out by the given number of days.
    ///
    /// A story without an end date gets one counted from now. The reason
    /// is stored as the audit note.
    pub async fn extend(
        &self,
        story_id: &str,
        actor: &member::Model,
        days: i64,
        reason: Option<String>,
        ctx: &RequestContext,
    ) -> AppResult<story::Model> {
        validate_window_days(days)?;

        self.run_transition(story_id, actor, ctx, move |story, now| {
            let base = story.active_until.unwrap_or(now);
            Ok(Transition {
                action: PublishingAction::Extended,
                active: story.active,
                active_from: story.active_from,
                active_until: Some(base + Duration::days(days)),
                note: reason,
            })
        })
        .await
    }

    /// Activate a story with a future start date.
    ///
    /// `from` must lie in the future. The end date, given or inherited,
    /// must come after `from`.
    pub async fn schedule(
        &self,
        story_id: &str,
        actor: &member::Model,
        from: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
        ctx: &RequestContext,
    ) -> AppResult<story::Model> {
        if from <= Utc::now() {
            return Err(AppError::Validation(
                "active_from must be in the future".to_string(),
            ));
        }
        if let Some(u) = until {
            if u <= from {
                return Err(AppError::Validation(
                    "active_until must be after active_from".to_string(),
                ));
            }
        }

        self.run_transition(story_id, actor, ctx, move |story, _now| {
            let active_until = until.or(story.active_until);
            if let Some(u) = active_until {
                if u <= from {
                    return Err(AppError::Validation(
                        "active_until must be after active_from".to_string(),
                    ));
                }
            }
            Ok(Transition {
                action: PublishingAction::Scheduled,
                active: true,
                active_from: Some(from),
                active_until,
                note: None,
            })
        })
        .await
    }

    /// Set the window bounds directly from the admin update form.
    ///
    /// Passing `None` clears the corresponding bound.
    pub async fn update_window(
        &self,
        story_id: &str,
        actor: &member::Model,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
        ctx: &RequestContext,
    ) -> AppResult<story::Model> {
        if let (Some(f), Some(u)) = (from, until) {
            if u <= f {
                return Err(AppError::Validation(
                    "active_until must be after active_from".to_string(),
                ));
            }
        }

        self.run_transition(story_id, actor, ctx, move |story, _now| {
            Ok(Transition {
                action: PublishingAction::Updated,
                active: story.active,
                active_from: from,
                active_until: until,
                note: None,
            })
        })
        .await
    }

    /// Audit trail of a story, newest first.
    ///
    /// Restricted to callers who may modify the story.
    pub async fn history(
        &self,
        story_id: &str,
        actor: &member::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<story_publishing_history::Model>> {
        self.authorize(story_id, actor).await?;
        self.history_repo
            .find_by_story(story_id, limit, offset)
            .await
    }

    /// Number of audit entries for a story.
    pub async fn history_count(&self, story_id: &str) -> AppResult<u64> {
        self.history_repo.count_by_story(story_id).await
    }

    /// Publish several stories, each in its own transaction.
    ///
    /// One item failing never rolls back the others; failures are
    /// reported per story.
    pub async fn bulk_publish(
        &self,
        story_ids: &[String],
        actor: &member::Model,
        active_until_days: Option<i64>,
        ctx: &RequestContext,
    ) -> AppResult<BulkPublishReport> {
        let days = match active_until_days {
            Some(days) => {
                validate_window_days(days)?;
                days
            }
            None => i64::from(self.settings.get().await?.default_active_days),
        };

        let mut report = BulkPublishReport {
            success_count: 0,
            failed: Vec::new(),
        };

        for story_id in story_ids {
            let options = PublishOptions {
                active_until_days: Some(days),
                note: None,
                quick: false,
            };
            match self.publish(story_id, actor, options, ctx).await {
                Ok(_) => report.success_count += 1,
                Err(e) => {
                    warn!(story_id = %story_id, error = %e, "Bulk publish item failed");
                    report.failed.push(FailedItem {
                        story_id: story_id.clone(),
                        error: e.public_message(),
                    });
                }
            }
        }

        info!(
            succeeded = report.success_count,
            failed = report.failed.len(),
            "Bulk publish finished"
        );
        Ok(report)
    }

    /// Deactivate every story whose window has ended, each in its own
    /// transaction.
    ///
    /// Stories are re-checked under the row lock; anything no longer
    /// expired by then is skipped.
    pub async fn deactivate_expired(
        &self,
        actor: &member::Model,
        ctx: &RequestContext,
    ) -> AppResult<ExpirySweepReport> {
        if !actor.is_admin {
            return Err(AppError::Forbidden(
                "only admins can run the expiry sweep".to_string(),
            ));
        }

        let expired = self.story_repo.find_expired(Utc::now()).await?;

        let mut report = ExpirySweepReport {
            deactivated_count: 0,
            failed: Vec::new(),
        };

        for story in expired {
            match self.deactivate_one(&story.id, actor, ctx).await {
                Ok(true) => report.deactivated_count += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(story_id = %story.id, error = %e, "Expiry sweep item failed");
                    report.failed.push(FailedItem {
                        story_id: story.id.clone(),
                        error: e.public_message(),
                    });
                }
            }
        }

        info!(
            deactivated = report.deactivated_count,
            failed = report.failed.len(),
            "Expiry sweep finished"
        );
        Ok(report)
    }

    /// Deactivate one expired story. Returns false when the story is
    /// gone or no longer expired under the lock.
    async fn deactivate_one(
        &self,
        story_id: &str,
        actor: &member::Model,
        ctx: &RequestContext,
    ) -> AppResult<bool> {
        let now = Utc::now();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(story) = self.story_repo.find_by_id_for_update(&txn, story_id).await? else {
            return Ok(false);
        };

        let still_expired = story.active && story.active_until.is_some_and(|until| until < now);
        if !still_expired {
            return Ok(false);
        }

        let transition = Transition {
            action: PublishingAction::Expired,
            active: false,
            active_from: story.active_from,
            active_until: story.active_until,
            note: None,
        };
        self.write_transition(&txn, &story, actor, transition, ctx, now)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.cache.invalidate_story(story_id).await;
        info!(story_id = %story_id, "Deactivated expired story");
        Ok(true)
    }

    /// Lock the story, apply the transition, and append the audit row.
    async fn run_transition<F>(
        &self,
        story_id: &str,
        actor: &member::Model,
        ctx: &RequestContext,
        build: F,
    ) -> AppResult<story::Model>
    where
        F: FnOnce(&story::Model, DateTime<Utc>) -> AppResult<Transition>,
    {
        self.authorize(story_id, actor).await?;

        let now = Utc::now();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let story = self
            .story_repo
            .find_by_id_for_update(&txn, story_id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(story_id.to_string()))?;

        let transition = build(&story, now)?;
        if changed_fields(
            &story,
            transition.active,
            transition.active_from,
            transition.active_until,
        )
        .is_empty()
        {
            return Err(AppError::Validation(
                "no lifecycle fields would change".to_string(),
            ));
        }

        let action = transition.action;
        let updated = self
            .write_transition(&txn, &story, actor, transition, ctx, now)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.cache.invalidate_story(story_id).await;
        info!(story_id = %story_id, action = action.as_str(), "Publishing transition applied");

        Ok(updated)
    }

    /// Story update plus audit insert, on the caller's transaction.
    async fn write_transition(
        &self,
        txn: &DatabaseTransaction,
        story: &story::Model,
        actor: &member::Model,
        transition: Transition,
        ctx: &RequestContext,
        now: DateTime<Utc>,
    ) -> AppResult<story::Model> {
        let changed = changed_fields(
            story,
            transition.active,
            transition.active_from,
            transition.active_until,
        );

        let update = story::ActiveModel {
            id: Set(story.id.clone()),
            active: Set(transition.active),
            active_from: Set(transition.active_from),
            active_until: Set(transition.active_until),
            updated_at: Set(Some(now)),
            ..Default::default()
        };
        let updated = self.story_repo.update_on(txn, update).await?;

        let entry = story_publishing_history::ActiveModel {
            id: Set(self.id_gen.generate()),
            story_id: Set(story.id.clone()),
            member_id: Set(actor.id.clone()),
            action: Set(transition.action),
            previous_active: Set(story.active),
            new_active: Set(transition.active),
            previous_active_from: Set(story.active_from),
            new_active_from: Set(transition.active_from),
            previous_active_until: Set(story.active_until),
            new_active_until: Set(transition.active_until),
            note: Set(transition.note),
            changed_fields: Set(serde_json::json!(changed)),
            ip_address: Set(ctx.ip_address.clone()),
            user_agent: Set(ctx.user_agent.clone()),
            created_at: Set(now),
        };
        self.history_repo.insert_on(txn, entry).await?;

        Ok(updated)
    }

    async fn authorize(&self, story_id: &str, actor: &member::Model) -> AppResult<()> {
        let story = self
            .story_repo
            .find_by_id(story_id)
            .await?
            .ok_or_else(|| AppError::StoryNotFound(story_id.to_string()))?;

        if !can_update(actor, &story) {
            return Err(AppError::Forbidden(
                "cannot modify this story".to_string(),
            ));
        }
        Ok(())
    }
}
