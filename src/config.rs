use serde::{Deserialize, Serialize};
use std::path::Path;
use anyhow::Result;
use std::fs;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub loading_screen: LoadingScreenConfig,
    #[serde(default)]
    pub offline_progress: OfflineProgressConfig,
    #[serde(default)]
    pub inbox: InboxConfig,
    #[serde(default)]
    pub prestige: PrestigeConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoadingScreenConfig {
    pub min_duration_ms: u64,
    pub max_duration_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OfflineProgressConfig {
    pub enabled: bool,
    pub max_hours: f64,
    /// Fraction of the live auto-fishing rate earned while away.
    pub efficiency_rate: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InboxConfig {
    pub enabled: bool,
    pub welcome_message_sent: bool,
    pub default_sender: String,
    pub sender_email: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrestigeConfig {
    pub requirements: PrestigeRequirements,
    pub benefits: PrestigeBenefits,
    pub ranks: Vec<PrestigeRank>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrestigeRequirements {
    pub min_money: u64,
    pub min_fish_caught: u64,
    pub min_locations_unlocked: usize,
    /// Percent, 0-100.
    pub min_encyclopedia_completion: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrestigeBenefits {
    pub fishing_power_multiplier: f64,
    pub auto_fishing_bonus: f64,
    pub fish_value_multiplier: f64,
    pub starting_money_base: f64,
    pub starting_money_multiplier: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrestigeRank {
    pub level: u32,
    pub title: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    pub cast_duration_ms: i64,
    pub auto_fish_secs: u64,
    pub auto_sell_secs: u64,
    /// How often the front end polls the game clock.
    pub tick_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    pub database_path: String,
    pub save_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PresenceConfig {
    pub enabled: bool,
    pub url: String,
    pub room: String,
    pub heartbeat_secs: u64,
}

impl Default for LoadingScreenConfig {
    fn default() -> Self {
        Self { min_duration_ms: 2000, max_duration_ms: 4000 }
    }
}

impl Default for OfflineProgressConfig {
    fn default() -> Self {
        Self { enabled: true, max_hours: 24.0, efficiency_rate: 0.5 }
    }
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            welcome_message_sent: false,
            default_sender: "Harbor Master".to_string(),
            sender_email: "harbormaster@trawlers-empire.example".to_string(),
        }
    }
}

impl Default for PrestigeConfig {
    fn default() -> Self {
        let rank = |level, title: &str| PrestigeRank { level, title: title.to_string() };
        Self {
            requirements: PrestigeRequirements {
                min_money: 100_000,
                min_fish_caught: 5_000,
                min_locations_unlocked: 4,
                min_encyclopedia_completion: 75,
            },
            benefits: PrestigeBenefits {
                fishing_power_multiplier: 0.1,
                auto_fishing_bonus: 0.05,
                fish_value_multiplier: 0.1,
                starting_money_base: 100.0,
                starting_money_multiplier: 2.0,
            },
            ranks: vec![
                rank(0, "Novice Fisherman"),
                rank(1, "Apprentice Angler"),
                rank(3, "Seasoned Sailor"),
                rank(5, "Master Trawler"),
                rank(10, "Legendary Captain"),
                rank(20, "Ocean Tycoon"),
            ],
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { cast_duration_ms: 2500, auto_fish_secs: 5, auto_sell_secs: 10, tick_ms: 250 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "trawler.db".to_string(),
            save_key: "fishingTycoonSave".to_string(),
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "ws://127.0.0.1:8787/presence".to_string(),
            room: "trawlers-empire".to_string(),
            heartbeat_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            loading_screen: LoadingScreenConfig::default(),
            offline_progress: OfflineProgressConfig::default(),
            inbox: InboxConfig::default(),
            prestige: PrestigeConfig::default(),
            session: SessionConfig::default(),
            storage: StorageConfig::default(),
            presence: PresenceConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut config: Config = toml::from_str(&content)?;

        config.presence.url = config.presence.url.trim().to_string();

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Loads `path`, writing the defaults there first if it does not exist yet.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            let cfg = Config::default();
            cfg.save(path)?;
            Ok(cfg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_survive_toml_round_trip() {
        let cfg = Config::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.prestige.ranks.len(), cfg.prestige.ranks.len());
        assert_eq!(parsed.session.auto_fish_secs, 5);
        assert_eq!(parsed.storage.save_key, "fishingTycoonSave");
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("version = \"9.9.9\"\n").unwrap();
        assert_eq!(parsed.version, "9.9.9");
        assert!(parsed.offline_progress.enabled);
        assert_eq!(parsed.offline_progress.max_hours, 24.0);
        assert_eq!(parsed.session.auto_sell_secs, 10);
    }

    #[test]
    fn test_load_trims_presence_url() {
        let dir = std::env::temp_dir().join(format!("trawler-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut cfg = Config::default();
        cfg.presence.url = "  ws://localhost:9001/presence \n".to_string();
        cfg.loading_screen.min_duration_ms = 5000;
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.presence.url, "ws://localhost:9001/presence");
        assert_eq!(loaded.loading_screen.min_duration_ms, 5000);
        std::fs::remove_dir_all(&dir).ok();
    }
}
