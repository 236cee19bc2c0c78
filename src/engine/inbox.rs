use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::config::InboxConfig;
use crate::engine::state::PlayerProgress;

pub const WELCOME_ID: &str = "welcome-1";
pub const SPECIES_UPDATE_ID: &str = "fish-update-1";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Email {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub sender_email: String,
    pub date: String,
    pub content: String,
    pub read: bool,
}

impl Email {
    pub fn new(id: &str, subject: &str, sender: &str, sender_email: &str, date: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            subject: subject.to_string(),
            sender: sender.to_string(),
            sender_email: sender_email.to_string(),
            date: date.to_string(),
            content: content.to_string(),
            read: false,
        }
    }
}

pub fn seed_welcome(progress: &mut PlayerProgress, config: &InboxConfig) -> usize {
    if !config.enabled || config.welcome_message_sent {
        return 0;
    }
    if progress.emails().iter().any(|e| e.id == WELCOME_ID) {
        return 0;
    }

    let date = Local::now().format("%Y-%m-%d").to_string();
    let welcome = Email::new(
        WELCOME_ID,
        "Welcome to Trawler's Empire!",
        &config.default_sender,
        &config.sender_email,
        &date,
        "Ahoy, Captain!\n\n\
         Cast your line to start fishing, upgrade your equipment to catch more fish per cast, \
         and unlock new locations for rarer species. Auto-fishers keep working while you are away.\n\n\
         Happy fishing!",
    );
    let species = Email::new(
        SPECIES_UPDATE_ID,
        "New Fish Species Discovered!",
        &config.default_sender,
        &config.sender_email,
        &date,
        "Our marine biologists report new species in every location: the Mystic Goldfish in the pond, \
         the Crystal Salmon in the mountain lake, the Ghost Catfish in the river, and the Anglerfish \
         and Electric Eel in the deep ocean. Fill in your encyclopedia to work toward prestige!",
    );

    // Pushed oldest first so the welcome ends up below the announcement
    progress.push_email(welcome);
    progress.push_email(species);
    2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::game_data::Catalog;

    #[test]
    fn test_seed_welcome_is_idempotent() {
        let catalog = Catalog::default();
        let mut progress = PlayerProgress::new(&catalog);
        let config = InboxConfig::default();

        assert_eq!(seed_welcome(&mut progress, &config), 2);
        assert_eq!(seed_welcome(&mut progress, &config), 0);
        assert_eq!(progress.emails().len(), 2);
        assert_eq!(progress.emails()[0].id, SPECIES_UPDATE_ID);
        assert_eq!(progress.unread_email_count(), 2);
    }

    #[test]
    fn test_disabled_inbox_stays_empty() {
        let catalog = Catalog::default();
        let mut progress = PlayerProgress::new(&catalog);
        let config = InboxConfig { enabled: false, ..InboxConfig::default() };
        assert_eq!(seed_welcome(&mut progress, &config), 0);
        assert!(progress.emails().is_empty());
    }
}
