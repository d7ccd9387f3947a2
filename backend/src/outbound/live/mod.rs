//! In-process live feed backed by a Tokio broadcast channel.

use futures_util::StreamExt as _;
use futures_util::stream::{self, BoxStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::domain::ports::{LiveEvent, LiveFeed};

/// Events buffered per subscriber before it starts skipping.
pub const DEFAULT_CAPACITY: usize = 64;

/// Fan-out of live events to every connected subscriber.
///
/// Subscribers that fall more than the channel capacity behind skip the
/// events they missed; dropped subscribers leave the channel on their own.
#[derive(Debug, Clone)]
pub struct BroadcastLiveFeed {
    sender: broadcast::Sender<LiveEvent>,
}

impl BroadcastLiveFeed {
    /// Feed buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Number of connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastLiveFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LiveFeed for BroadcastLiveFeed {
    fn publish(&self, event: LiveEvent) {
        if self.sender.send(event).is_err() {
            debug!("live event dropped: no subscribers");
        }
    }

    fn subscribe(&self) -> BoxStream<'static, LiveEvent> {
        let receiver = self.sender.subscribe();
        stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => return Some((event, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "live subscriber lagged");
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use crate::domain::ports::VisitNotice;
    use rstest::rstest;

    fn notice(doctor: &str) -> LiveEvent {
        LiveEvent::Visit(VisitNotice {
            user_name: Some("Sara".into()),
            date: "2024-04-02".into(),
            doctor: doctor.into(),
            product_name: None,
        })
    }

    #[rstest]
    #[tokio::test]
    async fn every_subscriber_receives_events() {
        let feed = BroadcastLiveFeed::default();
        let mut first = feed.subscribe();
        let mut second = feed.subscribe();

        feed.publish(notice("Dr. A"));

        assert_eq!(first.next().await, Some(notice("Dr. A")));
        assert_eq!(second.next().await, Some(notice("Dr. A")));
    }

    #[rstest]
    fn publishing_without_subscribers_is_silent() {
        let feed = BroadcastLiveFeed::default();

        feed.publish(notice("Dr. A"));

        assert_eq!(feed.subscriber_count(), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn lagging_subscribers_skip_missed_events() {
        let feed = BroadcastLiveFeed::new(2);
        let mut slow = feed.subscribe();

        for doctor in ["Dr. A", "Dr. B", "Dr. C", "Dr. D"] {
            feed.publish(notice(doctor));
        }

        assert_eq!(slow.next().await, Some(notice("Dr. C")));
        assert_eq!(slow.next().await, Some(notice("Dr. D")));
    }

    #[rstest]
    #[tokio::test]
    async fn dropped_subscribers_leave_the_channel() {
        let feed = BroadcastLiveFeed::default();
        let stream = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 1);

        drop(stream);

        assert_eq!(feed.subscriber_count(), 0);
    }
}
