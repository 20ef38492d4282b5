use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::MatchResult;
use crate::look::types::{CanonicalLook, FilterType};
use crate::render::applicator::FilterState;
use crate::utils::logging::EVENTS_TARGET;

/// Notifications for UI collaborators. Every event carries the generation of the
/// submission that produced it so listeners can ignore superseded work.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LookEvent {
    #[serde(rename_all = "camelCase")]
    FilterApplied {
        generation: u64,
        filter_type: FilterType,
        state: FilterState,
        color_hex: String,
        intensity: f64,
    },
    #[serde(rename_all = "camelCase")]
    LookApplied {
        generation: u64,
        look: Arc<CanonicalLook>,
    },
    #[serde(rename_all = "camelCase")]
    ProductsRecommended {
        generation: u64,
        filter_type: FilterType,
        matches: Vec<MatchResult>,
    },
}

impl LookEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LookEvent::FilterApplied { .. } => "filterApplied",
            LookEvent::LookApplied { .. } => "lookApplied",
            LookEvent::ProductsRecommended { .. } => "productsRecommended",
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            LookEvent::FilterApplied { generation, .. }
            | LookEvent::LookApplied { generation, .. }
            | LookEvent::ProductsRecommended { generation, .. } => *generation,
        }
    }
}

/// In-process publish/subscribe. Publishing never blocks; slow subscribers lag and
/// lose the oldest events.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LookEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        EventBus { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LookEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: LookEvent) {
        debug!(
            target: EVENTS_TARGET,
            event = event.name(),
            generation = event.generation(),
            "Publishing event"
        );
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }

    /// Mirrors every event into the log as one JSON object.
    pub fn spawn_event_logger(&self) -> JoinHandle<()> {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(line) => info!(target: EVENTS_TARGET, "{}", line),
                        Err(err) => warn!(target: EVENTS_TARGET, "Failed to serialize event: {}", err),
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(target: EVENTS_TARGET, "Event logger lagged; skipped {} event(s)", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        EventBus::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_type_tag_and_camel_case() {
        let event = LookEvent::FilterApplied {
            generation: 3,
            filter_type: FilterType::Lipstick,
            state: FilterState::Approximated,
            color_hex: "#E8A9A9".to_string(),
            intensity: 0.6,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "filterApplied",
                "generation": 3,
                "filterType": "lipstick",
                "state": "approximated",
                "colorHex": "#E8A9A9",
                "intensity": 0.6
            })
        );
        assert_eq!(event.name(), "filterApplied");
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut receiver = bus.subscribe();
        bus.publish(LookEvent::ProductsRecommended {
            generation: 1,
            filter_type: FilterType::Blush,
            matches: Vec::new(),
        });

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name(), "productsRecommended");
        assert_eq!(event.generation(), 1);
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        EventBus::default().publish(LookEvent::ProductsRecommended {
            generation: 0,
            filter_type: FilterType::Contour,
            matches: Vec::new(),
        });
    }
}
