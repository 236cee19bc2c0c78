use serde::{Deserialize, Serialize};

use crate::engine::game::ChangeSet;
use crate::engine::resolver::LastCatch;

pub const PRESENCE_TYPE: &str = "presence";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PresencePayload {
    pub money: u64,
    pub total_fish_caught: u64,
    pub fishing_power: f64,
    pub auto_fishing_rate: f64,
    pub active_location_id: String,
    pub is_fishing: bool,
    pub boat_position: u32,
    pub prestige_level: u32,
    pub last_online: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_caught_fish: Option<LastCatch>,
}

impl PresencePayload {
    pub fn from_change(change: &ChangeSet<'_>) -> Self {
        let p = change.progress;
        Self {
            money: p.money(),
            total_fish_caught: p.total_fish_caught(),
            fishing_power: p.fishing_power(),
            auto_fishing_rate: p.auto_fishing_rate(),
            active_location_id: p.active_location_id().to_string(),
            is_fishing: change.session.is_fishing,
            boat_position: change.session.boat_position,
            prestige_level: p.prestige_level(),
            last_online: change.now_ms,
            last_caught_fish: change.session.last_caught.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub room: String,
    #[serde(rename = "clientId", default)]
    pub client_id: String,
    #[serde(default)]
    pub data: PresencePayload,
}

impl PresenceEnvelope {
    pub fn new(room: &str, client_id: &str, data: PresencePayload) -> Self {
        Self {
            kind: PRESENCE_TYPE.to_string(),
            room: room.to_string(),
            client_id: client_id.to_string(),
            data,
        }
    }

    pub fn is_presence(&self) -> bool {
        self.kind == PRESENCE_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_shape() {
        let payload = PresencePayload {
            money: 10,
            active_location_id: "pond".into(),
            last_caught_fish: Some(LastCatch { fish_name: "Bluegill".into(), value: 2, timestamp: 5 }),
            ..PresencePayload::default()
        };
        let json = serde_json::to_value(PresenceEnvelope::new("room", "abc", payload)).unwrap();
        assert_eq!(json["type"], "presence");
        assert_eq!(json["clientId"], "abc");
        assert_eq!(json["data"]["activeLocationId"], "pond");
        assert_eq!(json["data"]["lastCaughtFish"]["fishName"], "Bluegill");
    }

    #[test]
    fn test_sparse_incoming_payload_parses() {
        let text = r#"{"type":"presence","clientId":"x","data":{"money":5}}"#;
        let env: PresenceEnvelope = serde_json::from_str(text).unwrap();
        assert!(env.is_presence());
        assert_eq!(env.data.money, 5);
        assert!(env.data.last_caught_fish.is_none());
        assert_eq!(env.room, "");
    }
}
