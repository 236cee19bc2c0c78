use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::engine::database::Database;
use crate::engine::game::{ChangeSet, ProgressObserver};
use crate::engine::game_data::{BoatSlot, Catalog};
use crate::engine::inbox::Email;
use crate::engine::state::{CatchRecord, PlayerProgress, ProgressEvent, UpgradeProgress};

// --- Snapshot shape ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedLocation {
    pub id: String,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedBoatOption {
    pub id: String,
    pub unlocked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedBoatSlot {
    pub current: String,
    pub options: Vec<SavedBoatOption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedEncyclopediaEntry {
    pub id: String,
    pub name: String,
    pub color: String,
    pub location: String,
    pub rarity: String,
    pub value: u64,
    pub discovered: bool,
    pub caught: u64,
    pub record: CatchRecord,
}

/// Everything written to storage, one blob per player. Missing fields fall
/// back to fresh-profile values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveData {
    pub money: u64,
    pub inventory: BTreeMap<String, u64>,
    pub total_fish_caught: u64,
    pub fishing_power: f64,
    pub auto_fishing_rate: f64,
    pub upgrades: Vec<UpgradeProgress>,
    pub fishing_locations: Vec<SavedLocation>,
    pub active_location_id: String,
    pub boat_customization: BTreeMap<String, SavedBoatSlot>,
    pub encyclopedia: BTreeMap<String, SavedEncyclopediaEntry>,
    pub encyclopedia_unlocked: bool,
    pub last_online_time: i64,
    pub prestige_level: u32,
    pub emails: Vec<Email>,
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            money: 0,
            inventory: BTreeMap::new(),
            total_fish_caught: 0,
            fishing_power: 1.0,
            auto_fishing_rate: 0.0,
            upgrades: Vec::new(),
            fishing_locations: Vec::new(),
            active_location_id: String::new(),
            boat_customization: BTreeMap::new(),
            encyclopedia: BTreeMap::new(),
            encyclopedia_unlocked: false,
            last_online_time: 0,
            prestige_level: 0,
            emails: Vec::new(),
        }
    }
}

impl SaveData {
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str(text) {
            Ok(data) => data,
            Err(e) => {
                warn!("Save data is unreadable ({}), starting fresh", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub fn capture(progress: &PlayerProgress, catalog: &Catalog, now_ms: i64) -> SaveData {
    let fishing_locations = catalog
        .locations
        .iter()
        .map(|l| SavedLocation { id: l.id.to_string(), unlocked: progress.is_location_unlocked(l.id) })
        .collect();

    let boat_customization = catalog
        .boat_parts
        .iter()
        .map(|part| {
            let slot = SavedBoatSlot {
                current: progress.boat_current(part.slot).unwrap_or_default().to_string(),
                options: part
                    .options
                    .iter()
                    .map(|o| SavedBoatOption { id: o.id.to_string(), unlocked: progress.owns_boat_option(part.slot, o.id) })
                    .collect(),
            };
            (part.slot.as_str().to_string(), slot)
        })
        .collect();

    let encyclopedia = progress
        .encyclopedia()
        .iter()
        .map(|(id, e)| {
            let entry = SavedEncyclopediaEntry {
                id: e.id.clone(),
                name: e.name.clone(),
                color: e.color.clone(),
                location: e.location.clone(),
                rarity: e.rarity.as_str().to_string(),
                value: e.value,
                discovered: e.discovered,
                caught: e.caught,
                record: e.record,
            };
            (id.clone(), entry)
        })
        .collect();

    SaveData {
        money: progress.money(),
        inventory: progress.inventory().clone(),
        total_fish_caught: progress.total_fish_caught(),
        fishing_power: progress.fishing_power(),
        auto_fishing_rate: progress.auto_fishing_rate(),
        upgrades: progress.upgrades().to_vec(),
        fishing_locations,
        active_location_id: progress.active_location_id().to_string(),
        boat_customization,
        encyclopedia,
        encyclopedia_unlocked: progress.encyclopedia_unlocked(),
        last_online_time: now_ms,
        prestige_level: progress.prestige_level(),
        emails: progress.emails().to_vec(),
    }
}

/// Rebuilds a profile from a snapshot. Ids the catalog no longer knows are
/// dropped; upgrade costs are recomputed from the saved level.
pub fn restore(save: &SaveData, catalog: &Catalog) -> PlayerProgress {
    let mut progress = PlayerProgress::new(catalog);

    progress.set_money(save.money);
    for (name, count) in &save.inventory {
        if catalog.fish_by_name(name).is_none() {
            debug!("Ignoring unknown fish '{}' in inventory", name);
            continue;
        }
        progress.add_fish(name, *count);
    }
    progress.set_total_fish_caught(save.total_fish_caught);
    progress.set_rates(save.fishing_power, save.auto_fishing_rate);

    for saved in &save.upgrades {
        if let Some(def) = catalog.upgrade(&saved.id) {
            let level = def.max_level.map_or(saved.level, |max| saved.level.min(max));
            progress.set_upgrade(def.id, level, def.cost_at(level));
        }
    }

    for saved in save.fishing_locations.iter().filter(|l| l.unlocked) {
        if catalog.location(&saved.id).is_some() {
            progress.unlock_location(&saved.id);
        }
    }
    if progress.is_location_unlocked(&save.active_location_id) {
        progress.set_active_location(&save.active_location_id);
    }

    for (slot_name, saved) in &save.boat_customization {
        let Some(slot) = BoatSlot::from_str(slot_name) else {
            debug!("Ignoring unknown boat slot '{}'", slot_name);
            continue;
        };
        for option in saved.options.iter().filter(|o| o.unlocked) {
            if catalog.boat_option(slot, &option.id).is_some() {
                progress.own_boat_option(slot, &option.id);
            }
        }
        if progress.owns_boat_option(slot, &saved.current) {
            progress.set_boat_current(slot, &saved.current);
        }
    }

    for (id, entry) in &save.encyclopedia {
        progress.restore_encyclopedia_entry(id, entry.discovered, entry.caught, entry.record);
    }
    let any_discovered = progress.discovered_count() > 0;
    progress.set_encyclopedia_unlocked(save.encyclopedia_unlocked || any_discovered);

    progress.set_prestige_level(save.prestige_level);
    progress.set_last_online_ms(save.last_online_time);
    progress.replace_emails(save.emails.clone());

    progress.drain_events();
    progress
}

// --- Background writer ---

#[derive(Debug)]
pub enum SaveCommand {
    Write(Box<SaveData>),
    Delete,
}

pub struct SaveWriter {
    tx: UnboundedSender<SaveCommand>,
}

impl SaveWriter {
    pub fn new(tx: UnboundedSender<SaveCommand>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, UnboundedReceiver<SaveCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressObserver for SaveWriter {
    fn on_change(&self, change: &ChangeSet<'_>) {
        let command = if change.contains(&ProgressEvent::ProgressReset) {
            SaveCommand::Delete
        } else if change.touches_save() {
            SaveCommand::Write(Box::new(capture(change.progress, change.catalog, change.now_ms)))
        } else {
            return;
        };
        if self.tx.send(command).is_err() {
            warn!("Save writer is gone, progress is not being stored");
        }
    }
}

/// Drains save commands into the database. Only the newest queued command is
/// applied, older ones are superseded. Ends when every sender is dropped.
pub async fn run_save_writer(db: Database, key: String, mut rx: UnboundedReceiver<SaveCommand>) {
    info!("Save writer started");
    while let Some(mut command) = rx.recv().await {
        while let Ok(newer) = rx.try_recv() {
            command = newer;
        }
        if let Err(e) = apply_command(&db, &key, command).await {
            error!("Failed to store save: {}", e);
        }
    }
    info!("Save writer stopped");
}

async fn apply_command(db: &Database, key: &str, command: SaveCommand) -> anyhow::Result<()> {
    match command {
        SaveCommand::Write(data) => {
            let json = data.to_json()?;
            db.save_snapshot(key, &json).await?;
        }
        SaveCommand::Delete => {
            db.delete_snapshot(key).await?;
            info!("Stored save deleted");
        }
    }
    Ok(())
}

/// Reads the stored save, falling back to a fresh profile when there is none
/// or it cannot be read.
pub async fn load_progress(db: &Database, key: &str, catalog: &Catalog) -> PlayerProgress {
    match db.load_snapshot(key).await {
        Ok(Some(text)) => restore(&SaveData::parse(&text), catalog),
        Ok(None) => {
            info!("No save found, starting a new game");
            PlayerProgress::new(catalog)
        }
        Err(e) => {
            warn!("Could not read save: {}", e);
            PlayerProgress::new(catalog)
        }
    }
}
