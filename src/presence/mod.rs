pub mod gateway;
pub mod peers;
pub mod types;

use log::debug;
use rand::Rng;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::engine::game::{ChangeSet, ProgressObserver};
use types::PresencePayload;

/// Random id that tells our own echoes apart from other players.
pub fn new_client_id() -> String {
    let mut rng = rand::thread_rng();
    (0..8).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

pub struct PresenceRelay {
    tx: UnboundedSender<PresencePayload>,
}

impl PresenceRelay {
    pub fn channel() -> (Self, UnboundedReceiver<PresencePayload>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressObserver for PresenceRelay {
    fn on_change(&self, change: &ChangeSet<'_>) {
        if !change.touches_presence() {
            return;
        }
        if self.tx.send(PresencePayload::from_change(change)).is_err() {
            debug!("Presence broadcaster is not running");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::game::SessionView;
    use crate::engine::game_data::Catalog;
    use crate::engine::state::{PlayerProgress, ProgressEvent};

    #[test]
    fn test_relay_forwards_only_visible_changes() {
        let catalog = Catalog::default();
        let progress = PlayerProgress::new(&catalog);
        let session = SessionView { is_fishing: true, boat_position: 42, last_caught: None };
        let (relay, mut rx) = PresenceRelay::channel();

        let hidden = [ProgressEvent::EmailRead { id: "a".into() }];
        relay.on_change(&ChangeSet { events: &hidden, progress: &progress, catalog: &catalog, session: &session, now_ms: 7 });
        assert!(rx.try_recv().is_err());

        let visible = [ProgressEvent::MoneyChanged];
        relay.on_change(&ChangeSet { events: &visible, progress: &progress, catalog: &catalog, session: &session, now_ms: 7 });
        let payload = rx.try_recv().unwrap();
        assert!(payload.is_fishing);
        assert_eq!(payload.boat_position, 42);
        assert_eq!(payload.last_online, 7);
        assert_eq!(payload.active_location_id, "pond");
    }

    #[test]
    fn test_client_ids_are_hex() {
        let id = new_client_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
