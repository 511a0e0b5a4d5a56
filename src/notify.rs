//! Side-effect collaborators of the feed controller.
//!
//! Both calls are fire-and-forget: implementations swallow their own
//! failures so that navigation is never blocked by them.

use crate::model::ItemId;
use std::sync::Arc;

/// User-visible informational notice (toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn end_of_content() -> Self {
        Self {
            title: "End of content".into(),
            description: "You've reached the end of the available content.".into(),
        }
    }
}

/// An advertisement became the current item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdImpression {
    pub id: ItemId,
    pub title: String,
}

pub trait Notifier {
    fn notify(&self, notice: &Notice);
}

pub trait ImpressionSink {
    fn record(&self, impression: &AdImpression);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, notice: &Notice) {
        (**self).notify(notice)
    }
}

impl<T: ImpressionSink + ?Sized> ImpressionSink for Arc<T> {
    fn record(&self, impression: &AdImpression) {
        (**self).record(impression)
    }
}

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        tracing::info!("{}: {}", notice.title, notice.description);
    }
}

/// Records impressions in the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogImpressions;

impl ImpressionSink for LogImpressions {
    fn record(&self, impression: &AdImpression) {
        tracing::info!(
            "Ad impression tracked: {} ({})",
            impression.title,
            impression.id
        );
    }
}
