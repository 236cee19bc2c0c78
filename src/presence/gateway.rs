use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::interval;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::config::PresenceConfig;
use crate::presence::peers::{PeerRoster, RECENT_CATCH_MS};
use crate::presence::types::{PresenceEnvelope, PresencePayload};

const RECONNECT_DELAY: Duration = Duration::from_secs(15);

/// Mirrors our presence to a room on a websocket relay and records everyone
/// else's. Nothing here is allowed to hold up the game: failures are logged
/// and the connection is retried.
pub struct PresenceGateway {
    config: PresenceConfig,
    client_id: String,
    outgoing: UnboundedReceiver<PresencePayload>,
    roster: Arc<Mutex<PeerRoster>>,
    last_sent: Option<PresencePayload>,
}

impl PresenceGateway {
    pub fn new(
        config: PresenceConfig,
        client_id: String,
        outgoing: UnboundedReceiver<PresencePayload>,
        roster: Arc<Mutex<PeerRoster>>,
    ) -> Self {
        Self { config, client_id, outgoing, roster, last_sent: None }
    }

    async fn connect(&self) -> Result<WebSocketStream<MaybeTlsStream<TcpStream>>> {
        info!("Connecting to presence server {}...", self.config.url);
        let url = Url::parse(&self.config.url)?;
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        info!("Connected to presence server!");
        Ok(ws_stream)
    }

    /// Runs until the game drops its sender.
    pub async fn run_loop(mut self) {
        loop {
            match self.run_session().await {
                Ok(true) => break,
                Ok(false) => info!("Presence connection closed"),
                Err(e) => warn!("Presence unavailable: {}", e),
            }

            // Keep the newest payload while waiting to reconnect
            let wait = tokio::time::sleep(RECONNECT_DELAY);
            tokio::pin!(wait);
            loop {
                tokio::select! {
                    _ = &mut wait => break,
                    payload = self.outgoing.recv() => match payload {
                        Some(p) => self.last_sent = Some(p),
                        None => return,
                    },
                }
            }
        }
        info!("Presence broadcaster stopped");
    }

    /// One connection's lifetime. `Ok(true)` means the game side hung up.
    async fn run_session(&mut self) -> Result<bool> {
        let ws_stream = self.connect().await?;
        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = mpsc::channel::<Message>(32);
        let writer_handle = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = write.send(msg).await {
                    error!("Failed to send presence: {}", e);
                    break;
                }
            }
        });

        let (incoming_tx, mut incoming_rx) = mpsc::channel::<PresenceEnvelope>(100);
        let reader_handle = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => match serde_json::from_str::<PresenceEnvelope>(&text) {
                        Ok(envelope) => {
                            if incoming_tx.send(envelope).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => debug!("Ignoring presence message: {}", e),
                    },
                    Ok(Message::Close(_)) => {
                        info!("Presence server closed connection");
                        break;
                    }
                    Err(e) => {
                        warn!("Presence websocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        if let Some(last) = self.last_sent.clone() {
            send_presence(&tx, &self.config.room, &self.client_id, last).await?;
        }

        let mut heartbeat = interval(Duration::from_secs(self.config.heartbeat_secs.max(1)));
        heartbeat.tick().await;

        let hung_up = loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if let Some(last) = self.last_sent.clone() {
                        if send_presence(&tx, &self.config.room, &self.client_id, last).await.is_err() {
                            break false;
                        }
                    }
                }
                payload = self.outgoing.recv() => match payload {
                    Some(payload) => {
                        self.last_sent = Some(payload.clone());
                        if send_presence(&tx, &self.config.room, &self.client_id, payload).await.is_err() {
                            break false;
                        }
                    }
                    None => break true,
                },
                incoming = incoming_rx.recv() => match incoming {
                    Some(envelope) => self.on_envelope(envelope),
                    None => break false,
                },
            }
        };

        writer_handle.abort();
        reader_handle.abort();
        Ok(hung_up)
    }

    fn on_envelope(&self, envelope: PresenceEnvelope) {
        if !accepts(&envelope, &self.config.room, &self.client_id) {
            return;
        }
        let now = chrono::Utc::now().timestamp_millis();
        if let Some(catch) = &envelope.data.last_caught_fish {
            if now - catch.timestamp <= RECENT_CATCH_MS {
                info!("Another trawler caught a {} (${})", catch.fish_name, catch.value);
            }
        }
        self.roster.lock().update(&envelope.client_id, envelope.data, now);
    }
}

fn accepts(envelope: &PresenceEnvelope, room: &str, own_id: &str) -> bool {
    envelope.is_presence()
        && envelope.client_id != own_id
        && !envelope.client_id.is_empty()
        && (envelope.room.is_empty() || envelope.room == room)
}

async fn send_presence(tx: &mpsc::Sender<Message>, room: &str, client_id: &str, payload: PresencePayload) -> Result<()> {
    let envelope = PresenceEnvelope::new(room, client_id, payload);
    let text = serde_json::to_string(&envelope)?;
    tx.send(Message::Text(text)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_only_foreign_presence_in_room() {
        let other = PresenceEnvelope::new("harbor", "peer", PresencePayload::default());
        assert!(accepts(&other, "harbor", "me"));
        assert!(!accepts(&other, "elsewhere", "me"));

        let own = PresenceEnvelope::new("harbor", "me", PresencePayload::default());
        assert!(!accepts(&own, "harbor", "me"));

        let mut chat = other.clone();
        chat.kind = "chat".into();
        assert!(!accepts(&chat, "harbor", "me"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error_not_a_panic() {
        let config = PresenceConfig { enabled: true, url: "ws://127.0.0.1:1/presence".into(), ..PresenceConfig::default() };
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut gateway = PresenceGateway::new(config, "me".into(), rx, Arc::new(Mutex::new(PeerRoster::new())));
        assert!(gateway.run_session().await.is_err());
    }
}
