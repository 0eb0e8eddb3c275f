//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{FightEvent, RoundEvent, WarEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Accepted fight actions (high volume)
    Fight,
    /// Round closures
    Round,
    /// War creation and termination
    War,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Fight, Topic::Round, Topic::War];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Fight(FightEvent),
    Round(RoundEvent),
    War(WarEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Fight(_) => Topic::Fight,
            Event::Round(_) => Topic::Round,
            Event::War(_) => Topic::War,
        }
    }
}

impl From<FightEvent> for Event {
    fn from(event: FightEvent) -> Self {
        Event::Fight(event)
    }
}

impl From<RoundEvent> for Event {
    fn from(event: RoundEvent) -> Self {
        Event::Round(event)
    }
}

impl From<WarEvent> for Event {
    fn from(event: WarEvent) -> Self {
        Event::War(event)
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Channels are created up front, one per topic.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity).0))
            .collect();

        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publish an event to its corresponding topic
    ///
    /// Best-effort: an event nobody listens to is dropped.
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();

        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Every topic is registered in `with_capacity`.
            None => broadcast::channel(1).1,
        }
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use war_core::{WarId, WarOutcome};

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut wars = bus.subscribe(Topic::War);
        let mut rounds = bus.subscribe(Topic::Round);

        bus.publish(WarEvent::WarCreated {
            war: WarId(1),
            belligerents: war_core::Belligerents::new("Spain", "Portugal", "Porto"),
            deadline: war_core::Timestamp(10),
        });

        let event = wars.recv().await.unwrap();
        assert_eq!(event.topic(), Topic::War);
        assert!(rounds.try_recv().is_err());
    }

    #[tokio::test]
    async fn multiple_subscriptions_route_by_topic() {
        let bus = EventBus::with_capacity(8);
        let mut receivers = bus.subscribe_multiple(&[Topic::Round, Topic::War]);
        assert_eq!(receivers.len(), 2);

        bus.publish(WarEvent::WarCreated {
            war: WarId(4),
            belligerents: war_core::Belligerents::new("Italy", "Switzerland", "Ticino"),
            deadline: war_core::Timestamp(10),
        });

        let wars = receivers.get_mut(&Topic::War).unwrap();
        assert_eq!(wars.recv().await.unwrap().topic(), Topic::War);
        let rounds = receivers.get_mut(&Topic::Round).unwrap();
        assert!(rounds.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(WarEvent::WarTerminated {
            war: WarId(2),
            outcome: WarOutcome {
                winner: war_core::Side::Defender,
                totals: war_core::DamageTotals::ZERO,
                attacker_percentage: 50.0,
                reason: war_core::TerminationReason::ForceClosed,
                rounds_fought: 0,
                attacker_rounds_won: 0,
                defender_rounds_won: 0,
                ended_at: war_core::Timestamp(0),
            },
        });
    }
}
