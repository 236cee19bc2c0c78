use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::engine::game_data::{BoatSlot, Catalog, FishDef, Rarity, UpgradeEffect};
use crate::engine::inbox::Email;

/// Rates are kept at two decimals so repeated fractional bonuses never drift
/// across a `ceil` boundary.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Something that changed in [`PlayerProgress`]. Coarse "changed" variants are
/// recorded at most once per flush; the rest are recorded every time.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    MoneyChanged,
    InventoryChanged,
    CatchCountChanged,
    EncyclopediaChanged,
    RatesChanged,
    FishCaught { name: String, value: u64, timestamp: i64 },
    FishDiscovered { fish_id: String },
    EncyclopediaUnlocked,
    UpgradePurchased { id: String, level: u32 },
    LocationUnlocked { id: String },
    LocationChanged { id: String },
    BoatPartChanged { slot: BoatSlot, option_id: String },
    CastStarted,
    CastFinished,
    OfflineEarnings { money: u64, fish: u64, time_away: String },
    Prestiged { level: u32 },
    ProgressReset,
    EmailReceived { id: String },
    EmailRead { id: String },
}

impl ProgressEvent {
    fn is_coarse(&self) -> bool {
        matches!(
            self,
            ProgressEvent::MoneyChanged
                | ProgressEvent::InventoryChanged
                | ProgressEvent::CatchCountChanged
                | ProgressEvent::EncyclopediaChanged
                | ProgressEvent::RatesChanged
        )
    }

    pub fn touches_save(&self) -> bool {
        !matches!(self, ProgressEvent::CastStarted | ProgressEvent::CastFinished)
    }

    pub fn touches_presence(&self) -> bool {
        matches!(
            self,
            ProgressEvent::MoneyChanged
                | ProgressEvent::CatchCountChanged
                | ProgressEvent::RatesChanged
                | ProgressEvent::FishCaught { .. }
                | ProgressEvent::LocationChanged { .. }
                | ProgressEvent::CastStarted
                | ProgressEvent::CastFinished
                | ProgressEvent::Prestiged { .. }
                | ProgressEvent::ProgressReset
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatchRecord {
    pub weight: f64,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncyclopediaEntry {
    pub id: String,
    pub name: String,
    pub color: String,
    pub location: String,
    pub rarity: Rarity,
    pub value: u64,
    pub discovered: bool,
    pub caught: u64,
    pub record: CatchRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeProgress {
    pub id: String,
    pub level: u32,
    pub cost: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoatSlotState {
    pub current: String,
    pub owned: BTreeSet<String>,
}

/// Everything a player owns. Owned by one game session; every write goes
/// through a named method so observers can be told what changed.
#[derive(Debug, Clone)]
pub struct PlayerProgress {
    money: u64,
    inventory: BTreeMap<String, u64>,
    total_fish_caught: u64,
    fishing_power: f64,
    auto_fishing_rate: f64,
    upgrades: Vec<UpgradeProgress>,
    unlocked_locations: BTreeSet<String>,
    active_location_id: String,
    boat: BTreeMap<BoatSlot, BoatSlotState>,
    encyclopedia: BTreeMap<String, EncyclopediaEntry>,
    encyclopedia_unlocked: bool,
    prestige_level: u32,
    last_online_ms: i64,
    emails: Vec<Email>,
    events: Vec<ProgressEvent>,
}

impl PlayerProgress {
    pub fn new(catalog: &Catalog) -> Self {
        let mut progress = Self {
            money: 0,
            inventory: BTreeMap::new(),
            total_fish_caught: 0,
            fishing_power: 1.0,
            auto_fishing_rate: 0.0,
            upgrades: Vec::new(),
            unlocked_locations: BTreeSet::new(),
            active_location_id: String::new(),
            boat: BTreeMap::new(),
            encyclopedia: BTreeMap::new(),
            encyclopedia_unlocked: false,
            prestige_level: 0,
            last_online_ms: 0,
            emails: Vec::new(),
            events: Vec::new(),
        };
        progress.reset_upgrades(catalog);
        progress.reset_locations(catalog);
        progress.reset_boat(catalog);

        for (location, fish) in catalog.all_fish() {
            // First definition wins if a catalog ever repeats an id
            progress.encyclopedia.entry(fish.id.to_string()).or_insert_with(|| EncyclopediaEntry {
                id: fish.id.to_string(),
                name: fish.name.to_string(),
                color: fish.color.to_string(),
                location: location.name.to_string(),
                rarity: Rarity::from_chance(fish.chance),
                value: fish.value,
                discovered: false,
                caught: 0,
                record: CatchRecord::default(),
            });
        }
        progress
    }

    // --- Events ---

    fn emit(&mut self, event: ProgressEvent) {
        if event.is_coarse() && self.events.contains(&event) {
            return;
        }
        self.events.push(event);
    }

    pub(crate) fn note(&mut self, event: ProgressEvent) {
        self.emit(event);
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn has_pending(&self, event: &ProgressEvent) -> bool {
        self.events.contains(event)
    }

    pub fn drain_events(&mut self) -> Vec<ProgressEvent> {
        std::mem::take(&mut self.events)
    }

    // --- Money ---

    pub fn money(&self) -> u64 {
        self.money
    }

    pub fn credit(&mut self, amount: u64) {
        if amount == 0 {
            return;
        }
        self.money = self.money.saturating_add(amount);
        self.emit(ProgressEvent::MoneyChanged);
    }

    pub fn try_debit(&mut self, amount: u64) -> bool {
        if self.money < amount {
            return false;
        }
        if amount > 0 {
            self.money -= amount;
            self.emit(ProgressEvent::MoneyChanged);
        }
        true
    }

    pub fn set_money(&mut self, amount: u64) {
        if self.money != amount {
            self.money = amount;
            self.emit(ProgressEvent::MoneyChanged);
        }
    }

    // --- Inventory ---

    pub fn inventory(&self) -> &BTreeMap<String, u64> {
        &self.inventory
    }

    pub fn held(&self, name: &str) -> u64 {
        self.inventory.get(name).copied().unwrap_or(0)
    }

    pub fn inventory_total(&self) -> u64 {
        self.inventory.values().sum()
    }

    pub fn add_fish(&mut self, name: &str, count: u64) {
        if count == 0 {
            return;
        }
        *self.inventory.entry(name.to_string()).or_insert(0) += count;
        self.emit(ProgressEvent::InventoryChanged);
    }

    /// Removes up to `count` units and returns how many were removed. Emptied
    /// entries are pruned.
    pub fn remove_fish(&mut self, name: &str, count: u64) -> u64 {
        let Some(held) = self.inventory.get_mut(name) else {
            return 0;
        };
        let removed = count.min(*held);
        *held -= removed;
        if *held == 0 {
            self.inventory.remove(name);
        }
        if removed > 0 {
            self.emit(ProgressEvent::InventoryChanged);
        }
        removed
    }

    // --- Catches ---

    pub fn total_fish_caught(&self) -> u64 {
        self.total_fish_caught
    }

    pub fn set_total_fish_caught(&mut self, total: u64) {
        if self.total_fish_caught != total {
            self.total_fish_caught = total;
            self.emit(ProgressEvent::CatchCountChanged);
        }
    }

    /// Books one caught fish: inventory, lifetime counter, encyclopedia. A
    /// measurement updates the best weight/length records when it beats them.
    pub fn record_catch(&mut self, fish: &FishDef, measurement: Option<CatchRecord>) {
        *self.inventory.entry(fish.name.to_string()).or_insert(0) += 1;
        self.total_fish_caught += 1;
        self.emit(ProgressEvent::InventoryChanged);
        self.emit(ProgressEvent::CatchCountChanged);

        let mut discovered = false;
        if let Some(entry) = self.encyclopedia.get_mut(fish.id) {
            entry.caught += 1;
            if !entry.discovered {
                entry.discovered = true;
                discovered = true;
            }
            if let Some(m) = measurement {
                if m.weight > entry.record.weight {
                    entry.record.weight = m.weight;
                }
                if m.length > entry.record.length {
                    entry.record.length = m.length;
                }
            }
        }
        self.emit(ProgressEvent::EncyclopediaChanged);

        if discovered {
            self.emit(ProgressEvent::FishDiscovered { fish_id: fish.id.to_string() });
            if !self.encyclopedia_unlocked {
                self.encyclopedia_unlocked = true;
                self.emit(ProgressEvent::EncyclopediaUnlocked);
            }
        }
    }

    // --- Rates ---

    pub fn fishing_power(&self) -> f64 {
        self.fishing_power
    }

    pub fn auto_fishing_rate(&self) -> f64 {
        self.auto_fishing_rate
    }

    pub fn add_fishing_power(&mut self, delta: f64) {
        self.fishing_power = round2(self.fishing_power + delta);
        self.emit(ProgressEvent::RatesChanged);
    }

    pub fn add_auto_fishing_rate(&mut self, delta: f64) {
        self.auto_fishing_rate = round2((self.auto_fishing_rate + delta).max(0.0));
        self.emit(ProgressEvent::RatesChanged);
    }

    pub fn set_rates(&mut self, fishing_power: f64, auto_fishing_rate: f64) {
        self.fishing_power = round2(fishing_power);
        self.auto_fishing_rate = round2(auto_fishing_rate.max(0.0));
        self.emit(ProgressEvent::RatesChanged);
    }

    // --- Upgrades ---

    pub fn upgrades(&self) -> &[UpgradeProgress] {
        &self.upgrades
    }

    pub fn upgrade(&self, id: &str) -> Option<&UpgradeProgress> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    pub fn upgrade_level(&self, id: &str) -> u32 {
        self.upgrade(id).map_or(0, |u| u.level)
    }

    pub fn set_upgrade(&mut self, id: &str, level: u32, cost: u64) {
        if let Some(upgrade) = self.upgrades.iter_mut().find(|u| u.id == id) {
            upgrade.level = level;
            upgrade.cost = cost;
            self.emit(ProgressEvent::UpgradePurchased { id: id.to_string(), level });
        }
    }

    pub fn auto_sell_enabled(&self, catalog: &Catalog) -> bool {
        catalog
            .upgrades
            .iter()
            .filter(|def| def.effect == UpgradeEffect::EnableAutoSell)
            .any(|def| self.upgrade_level(def.id) > 0)
    }

    fn reset_upgrades(&mut self, catalog: &Catalog) {
        self.upgrades = catalog
            .upgrades
            .iter()
            .map(|def| UpgradeProgress {
                id: def.id.to_string(),
                level: def.initial_level,
                cost: def.cost_at(def.initial_level),
            })
            .collect();
    }

    // --- Locations ---

    pub fn active_location_id(&self) -> &str {
        &self.active_location_id
    }

    pub fn is_location_unlocked(&self, id: &str) -> bool {
        self.unlocked_locations.contains(id)
    }

    pub fn unlocked_location_count(&self) -> usize {
        self.unlocked_locations.len()
    }

    pub fn unlock_location(&mut self, id: &str) {
        if self.unlocked_locations.insert(id.to_string()) {
            self.emit(ProgressEvent::LocationUnlocked { id: id.to_string() });
        }
    }

    pub fn set_active_location(&mut self, id: &str) {
        if self.active_location_id != id {
            self.active_location_id = id.to_string();
            self.emit(ProgressEvent::LocationChanged { id: id.to_string() });
        }
    }

    fn reset_locations(&mut self, catalog: &Catalog) {
        let first = catalog.starting_location().id;
        self.unlocked_locations.clear();
        self.unlocked_locations.insert(first.to_string());
        self.active_location_id = first.to_string();
    }

    // --- Boat ---

    pub fn boat(&self) -> &BTreeMap<BoatSlot, BoatSlotState> {
        &self.boat
    }

    pub fn boat_current(&self, slot: BoatSlot) -> Option<&str> {
        self.boat.get(&slot).map(|s| s.current.as_str())
    }

    pub fn owns_boat_option(&self, slot: BoatSlot, option_id: &str) -> bool {
        self.boat.get(&slot).map_or(false, |s| s.owned.contains(option_id))
    }

    pub fn own_boat_option(&mut self, slot: BoatSlot, option_id: &str) {
        if let Some(state) = self.boat.get_mut(&slot) {
            state.owned.insert(option_id.to_string());
        }
    }

    pub fn set_boat_current(&mut self, slot: BoatSlot, option_id: &str) {
        if let Some(state) = self.boat.get_mut(&slot) {
            state.current = option_id.to_string();
            self.emit(ProgressEvent::BoatPartChanged { slot, option_id: option_id.to_string() });
        }
    }

    fn reset_boat(&mut self, catalog: &Catalog) {
        self.boat = catalog
            .boat_parts
            .iter()
            .filter_map(|part| {
                let basic = part.options.first()?;
                Some((
                    part.slot,
                    BoatSlotState {
                        current: basic.id.to_string(),
                        owned: BTreeSet::from([basic.id.to_string()]),
                    },
                ))
            })
            .collect();
    }

    // --- Encyclopedia ---

    pub fn encyclopedia(&self) -> &BTreeMap<String, EncyclopediaEntry> {
        &self.encyclopedia
    }

    pub fn encyclopedia_entry(&self, fish_id: &str) -> Option<&EncyclopediaEntry> {
        self.encyclopedia.get(fish_id)
    }

    pub fn encyclopedia_unlocked(&self) -> bool {
        self.encyclopedia_unlocked
    }

    pub fn discovered_count(&self) -> usize {
        self.encyclopedia.values().filter(|e| e.discovered).count()
    }

    pub fn encyclopedia_completion(&self) -> u32 {
        let total = self.encyclopedia.len();
        if total == 0 {
            return 0;
        }
        ((self.discovered_count() as f64 / total as f64) * 100.0).round() as u32
    }

    pub fn restore_encyclopedia_entry(&mut self, fish_id: &str, discovered: bool, caught: u64, record: CatchRecord) {
        if let Some(entry) = self.encyclopedia.get_mut(fish_id) {
            entry.discovered = discovered;
            entry.caught = caught;
            entry.record = record;
            self.emit(ProgressEvent::EncyclopediaChanged);
        }
    }

    pub fn set_encyclopedia_unlocked(&mut self, unlocked: bool) {
        self.encyclopedia_unlocked = unlocked;
    }

    fn clear_encyclopedia(&mut self) {
        for entry in self.encyclopedia.values_mut() {
            entry.discovered = false;
            entry.caught = 0;
            entry.record = CatchRecord::default();
        }
        self.encyclopedia_unlocked = false;
        self.emit(ProgressEvent::EncyclopediaChanged);
    }

    // --- Prestige ---

    pub fn prestige_level(&self) -> u32 {
        self.prestige_level
    }

    pub fn set_prestige_level(&mut self, level: u32) {
        self.prestige_level = level;
    }

    /// Starts a fresh run: everything but the encyclopedia, inbox and prestige
    /// level goes back to its catalog default, with the given baseline.
    pub fn reset_run(&mut self, catalog: &Catalog, starting_money: u64, fishing_power: f64, auto_fishing_rate: f64) {
        self.money = starting_money;
        self.inventory.clear();
        self.total_fish_caught = 0;
        self.fishing_power = round2(fishing_power);
        self.auto_fishing_rate = round2(auto_fishing_rate.max(0.0));
        self.reset_upgrades(catalog);
        self.reset_locations(catalog);
        self.reset_boat(catalog);
        for event in [
            ProgressEvent::MoneyChanged,
            ProgressEvent::InventoryChanged,
            ProgressEvent::CatchCountChanged,
            ProgressEvent::RatesChanged,
        ] {
            self.emit(event);
        }
    }

    /// Wipes the run and the encyclopedia. Prestige level is left to the caller.
    pub fn reset_everything(&mut self, catalog: &Catalog) {
        self.reset_run(catalog, 0, 1.0, 0.0);
        self.clear_encyclopedia();
    }

    // --- Session bookkeeping ---

    pub fn last_online_ms(&self) -> i64 {
        self.last_online_ms
    }

    pub fn set_last_online_ms(&mut self, ms: i64) {
        self.last_online_ms = ms;
    }

    // --- Inbox ---

    pub fn emails(&self) -> &[Email] {
        &self.emails
    }

    pub fn unread_email_count(&self) -> usize {
        self.emails.iter().filter(|e| !e.read).count()
    }

    pub fn push_email(&mut self, email: Email) {
        let id = email.id.clone();
        self.emails.insert(0, email);
        self.emit(ProgressEvent::EmailReceived { id });
    }

    pub fn replace_emails(&mut self, emails: Vec<Email>) {
        self.emails = emails;
    }

    pub fn mark_email_read(&mut self, id: &str) -> bool {
        match self.emails.iter_mut().find(|e| e.id == id) {
            Some(email) if !email.read => {
                email.read = true;
                self.emit(ProgressEvent::EmailRead { id: id.to_string() });
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (Catalog, PlayerProgress) {
        let catalog = Catalog::default();
        let progress = PlayerProgress::new(&catalog);
        (catalog, progress)
    }

    #[test]
    fn test_new_profile_defaults() {
        let (catalog, progress) = fresh();
        assert_eq!(progress.money(), 0);
        assert_eq!(progress.fishing_power(), 1.0);
        assert_eq!(progress.auto_fishing_rate(), 0.0);
        assert_eq!(progress.active_location_id(), "pond");
        assert_eq!(progress.unlocked_location_count(), 1);
        assert_eq!(progress.encyclopedia().len(), catalog.fish_count());
        assert_eq!(progress.upgrade_level("rod"), 1);
        assert_eq!(progress.upgrade("rod").unwrap().cost, 10);
        assert_eq!(progress.upgrade_level("auto"), 0);
        assert_eq!(progress.boat_current(BoatSlot::Engine), Some("basic"));
        assert!(!progress.auto_sell_enabled(&catalog));
    }

    #[test]
    fn test_debit_rejects_overdraft() {
        let (_, mut progress) = fresh();
        progress.credit(50);
        assert!(!progress.try_debit(51));
        assert_eq!(progress.money(), 50);
        assert!(progress.try_debit(50));
        assert_eq!(progress.money(), 0);
    }

    #[test]
    fn test_remove_fish_prunes_empty_entries() {
        let (_, mut progress) = fresh();
        progress.add_fish("Bluegill", 3);
        assert_eq!(progress.remove_fish("Bluegill", 10), 3);
        assert!(!progress.inventory().contains_key("Bluegill"));
        assert_eq!(progress.remove_fish("Bluegill", 1), 0);
    }

    #[test]
    fn test_record_catch_latches_discovery_and_keeps_best_record() {
        let (catalog, mut progress) = fresh();
        let bluegill = catalog.fish_by_name("Bluegill").unwrap().clone();

        progress.record_catch(&bluegill, Some(CatchRecord { weight: 2.0, length: 0.6 }));
        progress.record_catch(&bluegill, Some(CatchRecord { weight: 1.5, length: 0.8 }));

        let entry = progress.encyclopedia_entry("common2").unwrap();
        assert!(entry.discovered);
        assert_eq!(entry.caught, 2);
        assert_eq!(entry.record, CatchRecord { weight: 2.0, length: 0.8 });
        assert!(progress.encyclopedia_unlocked());
        assert_eq!(progress.held("Bluegill"), 2);
        assert_eq!(progress.total_fish_caught(), 2);

        let events = progress.drain_events();
        let discoveries = events.iter().filter(|e| matches!(e, ProgressEvent::FishDiscovered { .. })).count();
        assert_eq!(discoveries, 1);
        assert_eq!(events.iter().filter(|e| **e == ProgressEvent::InventoryChanged).count(), 1);
        assert!(events.contains(&ProgressEvent::EncyclopediaUnlocked));
    }

    #[test]
    fn test_rates_do_not_drift() {
        let (_, mut progress) = fresh();
        for _ in 0..5 {
            progress.add_auto_fishing_rate(0.2);
        }
        assert_eq!(progress.auto_fishing_rate(), 1.0);
        assert_eq!(progress.auto_fishing_rate().ceil(), 1.0);
    }

    #[test]
    fn test_completion_percentage_rounds() {
        let (catalog, mut progress) = fresh();
        for (_, fish) in catalog.all_fish().take(11) {
            progress.record_catch(fish, None);
        }
        // 11 of 44
        assert_eq!(progress.encyclopedia_completion(), 25);
    }

    #[test]
    fn test_email_read_only_once() {
        let (_, mut progress) = fresh();
        progress.push_email(Email::new("a", "Hi", "Harbor Master", "hm@example", "today", "body"));
        assert_eq!(progress.unread_email_count(), 1);
        assert!(progress.mark_email_read("a"));
        assert!(!progress.mark_email_read("a"));
        assert!(!progress.mark_email_read("missing"));
        assert_eq!(progress.unread_email_count(), 0);
    }
}
