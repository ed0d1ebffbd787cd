//! Notification feed reads.

use crate::config::WorkflowLimits;
use crate::model::notification::NotificationFeedPage;
use crate::model::user::UserId;
use crate::repo::notification_repo::NotificationRepository;
use crate::service::ServiceResult;
use log::debug;

/// Read side of the notification store.
pub struct NotificationFeed<N: NotificationRepository> {
    repo: N,
    limits: WorkflowLimits,
}

impl<N: NotificationRepository> NotificationFeed<N> {
    pub fn new(repo: N) -> Self {
        Self {
            repo,
            limits: WorkflowLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: WorkflowLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Newest notifications plus the feed-wide unread count.
    pub fn notifications_for(&self, user_id: UserId) -> ServiceResult<NotificationFeedPage> {
        let items = self
            .repo
            .list_for(user_id, self.limits.notification_feed_limit)?;
        let unread_count = self.repo.unread_count(user_id)?;
        Ok(NotificationFeedPage {
            items,
            unread_count,
        })
    }

    /// Returns how many rows flipped to read.
    pub fn mark_all_read(&self, user_id: UserId) -> ServiceResult<u32> {
        let changed = self.repo.mark_all_read(user_id)?;
        debug!(
            "event=notification_mark_read module=notify status=ok user_id={} changed={}",
            user_id, changed
        );
        Ok(changed)
    }
}
