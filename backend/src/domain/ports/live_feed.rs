//! Port for the admin live activity feed.

use futures_util::stream::BoxStream;
use serde::Serialize;
use utoipa::ToSchema;

/// Event pushed to live feed subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum LiveEvent {
    /// A visit was newly stored.
    Visit(VisitNotice),
}

/// Summary of a new visit for the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct VisitNotice {
    /// Display name of the author.
    pub user_name: Option<String>,
    /// Visit day, `YYYY-MM-DD`.
    pub date: String,
    /// Target visited.
    pub doctor: String,
    /// `brand — name` of the promoted product.
    pub product_name: Option<String>,
}

/// Fan-out channel for live events.
///
/// Publishing never fails from the caller's point of view; events published
/// while nobody listens are discarded, and slow subscribers skip what they
/// missed.
#[cfg_attr(test, mockall::automock)]
pub trait LiveFeed: Send + Sync {
    /// Deliver `event` to every current subscriber.
    fn publish(&self, event: LiveEvent);

    /// Stream of events published from now on.
    fn subscribe(&self) -> BoxStream<'static, LiveEvent>;
}
