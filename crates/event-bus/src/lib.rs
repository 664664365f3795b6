use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tracing::warn;

use webstate_core_types::CoreError;

/// Trait implemented by payload types that can be carried on the bus.
pub trait Event: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Event for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

pub trait EventBus<E>: Send + Sync
where
    E: Event,
{
    /// Delivers `event` to every current subscriber and returns how many
    /// received it. Publishing with no subscribers is not an error.
    fn publish(&self, event: E) -> Result<usize, CoreError>;
    fn subscribe(&self) -> broadcast::Receiver<E>;
}

/// In-memory broadcast bus. Subscribers see events in publish order.
pub struct InMemoryBus<E>
where
    E: Event,
{
    sender: broadcast::Sender<E>,
}

impl<E> InMemoryBus<E>
where
    E: Event,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<E> EventBus<E> for InMemoryBus<E>
where
    E: Event,
{
    fn publish(&self, event: E) -> Result<usize, CoreError> {
        if self.sender.receiver_count() == 0 {
            return Ok(0);
        }
        self.sender
            .send(event)
            .map_err(|err| CoreError::new(err.to_string()))
    }

    fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

/// Helper to materialise an mpsc receiver from the bus subscription
/// so callers can await events without handling broadcast semantics directly.
/// Lagged receivers skip the overwritten events and keep going.
pub fn to_mpsc<E>(bus: Arc<dyn EventBus<E>>, capacity: usize) -> mpsc::Receiver<E>
where
    E: Event,
{
    let mut rx = bus.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    if tx.send(ev).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event bus subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
    out_rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_ok() {
        let bus = InMemoryBus::<u32>::new(4);
        assert_eq!(bus.publish(7).unwrap(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = InMemoryBus::<u32>::new(8);
        let mut rx = bus.subscribe();
        bus.publish(1).unwrap();
        bus.publish(2).unwrap();
        assert_eq!(rx.recv().await.unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn mpsc_bridge_forwards_events() {
        let bus = InMemoryBus::<&'static str>::new(8);
        let mut rx = to_mpsc(bus.clone(), 4);
        bus.publish("start").unwrap();
        assert_eq!(rx.recv().await, Some("start"));
    }
}
