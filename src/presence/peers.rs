use std::collections::HashMap;

use crate::engine::resolver::LastCatch;
use crate::presence::types::PresencePayload;

/// Catches younger than this are announced.
pub const RECENT_CATCH_MS: i64 = 2_000;

#[derive(Debug, Clone)]
pub struct Peer {
    pub client_id: String,
    pub data: PresencePayload,
    pub seen_at: i64,
}

#[derive(Debug, Default)]
pub struct PeerRoster {
    peers: HashMap<String, Peer>,
}

impl PeerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, client_id: &str, data: PresencePayload, now_ms: i64) {
        self.peers.insert(
            client_id.to_string(),
            Peer { client_id: client_id.to_string(), data, seen_at: now_ms },
        );
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn peers(&self) -> Vec<&Peer> {
        let mut peers: Vec<&Peer> = self.peers.values().collect();
        peers.sort_by(|a, b| b.data.money.cmp(&a.data.money).then_with(|| a.client_id.cmp(&b.client_id)));
        peers
    }

    pub fn recent_catches(&self, now_ms: i64) -> Vec<(&str, &LastCatch)> {
        let mut catches: Vec<(&str, &LastCatch)> = self
            .peers
            .values()
            .filter_map(|p| p.data.last_caught_fish.as_ref().map(|c| (p.client_id.as_str(), c)))
            .filter(|(_, c)| now_ms - c.timestamp <= RECENT_CATCH_MS)
            .collect();
        catches.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
        catches
    }

    pub fn prune(&mut self, now_ms: i64, max_age_ms: i64) -> usize {
        let before = self.peers.len();
        self.peers.retain(|_, p| now_ms - p.seen_at <= max_age_ms);
        before - self.peers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(money: u64, caught_at: Option<i64>) -> PresencePayload {
        PresencePayload {
            money,
            last_caught_fish: caught_at.map(|t| LastCatch { fish_name: "Tuna".into(), value: 30, timestamp: t }),
            ..PresencePayload::default()
        }
    }

    #[test]
    fn test_update_replaces_previous_presence() {
        let mut roster = PeerRoster::new();
        roster.update("a", payload(1, None), 0);
        roster.update("a", payload(9, None), 10);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.peers()[0].data.money, 9);
    }

    #[test]
    fn test_recent_catches_filter_by_age() {
        let mut roster = PeerRoster::new();
        roster.update("old", payload(1, Some(1_000)), 1_000);
        roster.update("new", payload(2, Some(4_500)), 4_500);
        roster.update("idle", payload(3, None), 4_500);

        let recent = roster.recent_catches(5_000);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].0, "new");
    }

    #[test]
    fn test_prune_and_order() {
        let mut roster = PeerRoster::new();
        roster.update("poor", payload(1, None), 0);
        roster.update("rich", payload(100, None), 50_000);
        let order: Vec<&str> = roster.peers().iter().map(|p| p.client_id.as_str()).collect();
        assert_eq!(order, vec!["rich", "poor"]);

        assert_eq!(roster.prune(60_000, 30_000), 1);
        assert_eq!(roster.peers()[0].client_id, "rich");
        assert_eq!(roster.prune(100_000, 30_000), 1);
        assert!(roster.is_empty());
    }
}
