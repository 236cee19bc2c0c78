use anyhow::{bail, Result};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoatSlot {
    Hull,
    Engine,
    Equipment,
    Storage,
}

impl BoatSlot {
    pub const ALL: [BoatSlot; 4] = [BoatSlot::Hull, BoatSlot::Engine, BoatSlot::Equipment, BoatSlot::Storage];

    pub fn as_str(&self) -> &'static str {
        match self {
            BoatSlot::Hull => "hull",
            BoatSlot::Engine => "engine",
            BoatSlot::Equipment => "equipment",
            BoatSlot::Storage => "storage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hull" => Some(BoatSlot::Hull),
            "engine" => Some(BoatSlot::Engine),
            "equipment" => Some(BoatSlot::Equipment),
            "storage" => Some(BoatSlot::Storage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    pub fn from_chance(chance: f64) -> Self {
        if chance <= 0.02 {
            Rarity::Mythic
        } else if chance <= 0.05 {
            Rarity::Legendary
        } else if chance <= 0.1 {
            Rarity::Epic
        } else if chance <= 0.2 {
            Rarity::Rare
        } else {
            Rarity::Common
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "Mythic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpgradeEffect {
    FishingPower(f64),
    AutoFishingRate(f64),
    EnableAutoSell,
    /// Level and cost progress, but nothing numeric changes.
    Cosmetic,
}

// --- Structs ---

#[derive(Debug, Clone, PartialEq)]
pub struct FishDef {
    pub id: &'static str,
    pub name: &'static str,
    /// Catch weight in (0, 1]. Tables are not normalized.
    pub chance: f64,
    pub value: u64,
    pub color: &'static str,
    pub min_depth: u32,
    pub max_depth: u32,
}

#[derive(Debug, Clone)]
pub struct Location {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: u64,
    pub fish: Vec<FishDef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartBonuses {
    pub speed: f64,
    pub storage: f64,
    pub auto_fish: f64,
    pub rarity: f64,
    pub capacity: f64,
}

#[derive(Debug, Clone)]
pub struct BoatOption {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u64,
    pub bonuses: PartBonuses,
}

#[derive(Debug, Clone)]
pub struct BoatPartDef {
    pub slot: BoatSlot,
    pub name: &'static str,
    /// First option is the free default.
    pub options: Vec<BoatOption>,
}

#[derive(Debug, Clone)]
pub struct UpgradeDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub initial_level: u32,
    pub base_cost: f64,
    pub growth: f64,
    pub level_offset: i32,
    pub max_level: Option<u32>,
    pub effect: UpgradeEffect,
}

impl UpgradeDef {
    /// `floor(base * growth^(level - offset))`
    pub fn cost_at(&self, level: u32) -> u64 {
        let exponent = level as i32 - self.level_offset;
        (self.base_cost * self.growth.powi(exponent)).floor() as u64
    }

    pub fn is_maxed(&self, level: u32) -> bool {
        self.max_level.map_or(false, |max| level >= max)
    }
}

// --- Data Loading ---

fn fish(id: &'static str, name: &'static str, chance: f64, value: u64, color: &'static str, min_depth: u32, max_depth: u32) -> FishDef {
    FishDef { id, name, chance, value, color, min_depth, max_depth }
}

lazy_static! {
    pub static ref LOCATION_DATA: Vec<Location> = vec![
        Location {
            id: "pond",
            name: "Local Pond",
            description: "A peaceful fishing spot with common fish",
            price: 0,
            fish: vec![
                fish("common1", "Common Fish", 0.4, 1, "#6495ED", 20, 50),
                fish("common2", "Bluegill", 0.2, 2, "#4682B4", 15, 40),
                fish("rare1", "Rare Fish", 0.15, 5, "#FFD700", 40, 70),
                fish("rare2", "Smallmouth Bass", 0.15, 8, "#DAA520", 30, 60),
                fish("epic1", "Epic Fish", 0.06, 25, "#9932CC", 60, 90),
                fish("epic2", "Albino Catfish", 0.03, 35, "#F5F5F5", 50, 80),
                fish("legendary1", "Legendary Fish", 0.006, 150, "#FF4500", 80, 100),
                fish("legendary2", "Crowned Koi", 0.004, 200, "#FFA07A", 70, 100),
                fish("mythic1", "Mystic Goldfish", 0.002, 300, "#FFD700", 85, 100),
                fish("special1", "Spotted Sunfish", 0.08, 12, "#E6A817", 25, 55),
            ],
        },
        Location {
            id: "lake",
            name: "Mountain Lake",
            description: "Deeper waters with better fish variety",
            price: 1000,
            fish: vec![
                fish("common3", "Lake Trout", 0.3, 3, "#20B2AA", 20, 50),
                fish("common4", "Yellow Perch", 0.2, 4, "#FFEB3B", 15, 40),
                fish("rare3", "Mountain Bass", 0.15, 8, "#DAA520", 40, 70),
                fish("rare4", "Brook Trout", 0.15, 12, "#8BC34A", 35, 65),
                fish("epic3", "Rainbow Trout", 0.1, 40, "#BA55D3", 60, 90),
                fish("epic4", "Arctic Char", 0.05, 50, "#E91E63", 55, 85),
                fish("legendary3", "Golden Carp", 0.03, 200, "#FFA500", 80, 100),
                fish("legendary4", "Ancient Sturgeon", 0.02, 250, "#607D8B", 75, 100),
                fish("mythic2", "Crystal Salmon", 0.01, 350, "#90CAF9", 85, 100),
                fish("special2", "Albino Trout", 0.05, 30, "#F0F0F0", 45, 70),
            ],
        },
        Location {
            id: "river",
            name: "Rushing River",
            description: "Fast moving water with unique fish species",
            price: 5000,
            fish: vec![
                fish("common5", "River Perch", 0.25, 5, "#4682B4", 20, 50),
                fish("common6", "Brown Bullhead", 0.2, 7, "#795548", 15, 45),
                fish("rare5", "Silver Salmon", 0.15, 15, "#C0C0C0", 40, 70),
                fish("rare6", "Cutthroat Trout", 0.15, 18, "#FF5722", 35, 65),
                fish("epic5", "River Sturgeon", 0.1, 60, "#9370DB", 60, 90),
                fish("epic6", "Striped Bass", 0.05, 80, "#455A64", 55, 85),
                fish("legendary5", "Royal Salmon", 0.05, 250, "#CD5C5C", 80, 100),
                fish("legendary6", "River Dragon", 0.05, 350, "#00BCD4", 75, 100),
                fish("mythic3", "Ghost Catfish", 0.01, 400, "#E0E0E0", 85, 100),
                fish("special3", "Glowing Carp", 0.07, 45, "#76FF03", 50, 80),
            ],
        },
        Location {
            id: "ocean",
            name: "Deep Ocean",
            description: "Vast ocean with rare exotic catches",
            price: 25000,
            fish: vec![
                fish("common7", "Mackerel", 0.2, 10, "#4169E1", 20, 50),
                fish("common8", "Herring", 0.2, 12, "#90CAF9", 15, 45),
                fish("rare7", "Tuna", 0.15, 30, "#1E90FF", 40, 70),
                fish("rare8", "Mahi-Mahi", 0.15, 35, "#FFC107", 35, 65),
                fish("epic7", "Swordfish", 0.1, 100, "#8A2BE2", 60, 90),
                fish("epic8", "Hammerhead Shark", 0.05, 150, "#757575", 55, 85),
                fish("legendary7", "Blue Marlin", 0.05, 500, "#0000CD", 80, 100),
                fish("legendary8", "Colossal Squid", 0.05, 800, "#D32F2F", 75, 100),
                // Renumbered so they no longer share ids with the pond and lake mythics
                fish("mythic5", "Kraken Spawn", 0.03, 1200, "#311B92", 90, 100),
                fish("mythic6", "Abyssal Leviathan", 0.02, 2000, "#880E4F", 95, 100),
                fish("mythic4", "Anglerfish", 0.03, 700, "#37474F", 85, 100),
                fish("special4", "Electric Eel", 0.07, 90, "#FFEB3B", 60, 90),
                fish("legendary9", "Giant Manta Ray", 0.04, 600, "#37474F", 70, 95),
                fish("special5", "Moonfish", 0.06, 120, "#E0E0E0", 60, 85),
            ],
        },
    ];

    pub static ref BOAT_PART_DATA: Vec<BoatPartDef> = {
        let basic = PartBonuses::default();
        vec![
            BoatPartDef {
                slot: BoatSlot::Hull,
                name: "Hull",
                options: vec![
                    BoatOption { id: "basic", name: "Basic Hull", price: 0, bonuses: basic },
                    BoatOption { id: "reinforced", name: "Reinforced Hull", price: 500, bonuses: PartBonuses { speed: 1.0, storage: 2.0, ..basic } },
                    BoatOption { id: "premium", name: "Premium Hull", price: 2500, bonuses: PartBonuses { speed: 2.0, storage: 5.0, ..basic } },
                ],
            },
            BoatPartDef {
                slot: BoatSlot::Engine,
                name: "Engine",
                options: vec![
                    BoatOption { id: "basic", name: "Basic Engine", price: 0, bonuses: basic },
                    BoatOption { id: "improved", name: "Improved Engine", price: 750, bonuses: PartBonuses { speed: 2.0, auto_fish: 0.1, ..basic } },
                    BoatOption { id: "advanced", name: "Advanced Engine", price: 3500, bonuses: PartBonuses { speed: 5.0, auto_fish: 0.3, ..basic } },
                ],
            },
            BoatPartDef {
                slot: BoatSlot::Equipment,
                name: "Equipment",
                options: vec![
                    BoatOption { id: "basic", name: "Basic Equipment", price: 0, bonuses: basic },
                    BoatOption { id: "sonar", name: "Sonar System", price: 1000, bonuses: PartBonuses { rarity: 0.05, ..basic } },
                    BoatOption { id: "advanced", name: "Advanced Sonar", price: 5000, bonuses: PartBonuses { rarity: 0.15, ..basic } },
                ],
            },
            BoatPartDef {
                slot: BoatSlot::Storage,
                name: "Storage",
                options: vec![
                    BoatOption { id: "basic", name: "Basic Storage", price: 0, bonuses: basic },
                    BoatOption { id: "medium", name: "Medium Storage", price: 650, bonuses: PartBonuses { capacity: 10.0, ..basic } },
                    BoatOption { id: "large", name: "Large Storage", price: 3000, bonuses: PartBonuses { capacity: 25.0, ..basic } },
                ],
            },
        ]
    };

    pub static ref UPGRADE_DATA: Vec<UpgradeDef> = vec![
        UpgradeDef { id: "rod", name: "Better Fishing Rod", description: "Catch more fish per cast", initial_level: 1, base_cost: 10.0, growth: 1.5, level_offset: 1, max_level: None, effect: UpgradeEffect::FishingPower(1.0) },
        UpgradeDef { id: "boat", name: "Boat Upgrade", description: "Improves fishing speed", initial_level: 1, base_cost: 50.0, growth: 1.6, level_offset: 1, max_level: Some(5), effect: UpgradeEffect::Cosmetic },
        UpgradeDef { id: "auto", name: "Auto-Fisher", description: "Automatically catches fish over time", initial_level: 0, base_cost: 200.0, growth: 2.0, level_offset: 0, max_level: None, effect: UpgradeEffect::AutoFishingRate(0.2) },
        UpgradeDef { id: "lure", name: "Better Lures", description: "Increases chance of rare fish", initial_level: 1, base_cost: 100.0, growth: 1.7, level_offset: 1, max_level: None, effect: UpgradeEffect::Cosmetic },
        UpgradeDef { id: "merchant", name: "Fish Merchant", description: "Automatically sells 5% of your fish every 10 seconds", initial_level: 0, base_cost: 1500.0, growth: 2.0, level_offset: 0, max_level: Some(1), effect: UpgradeEffect::EnableAutoSell },
    ];
}

/// All static definitions the game runs against. Built once and handed to the
/// game session; tests construct their own.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub locations: Vec<Location>,
    pub boat_parts: Vec<BoatPartDef>,
    pub upgrades: Vec<UpgradeDef>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            locations: LOCATION_DATA.clone(),
            boat_parts: BOAT_PART_DATA.clone(),
            upgrades: UPGRADE_DATA.clone(),
        }
    }
}

impl Catalog {
    /// Rejects catalogs the encyclopedia cannot index unambiguously.
    pub fn validate(&self) -> Result<()> {
        if self.locations.is_empty() {
            bail!("catalog has no locations");
        }
        let mut ids = HashSet::new();
        for location in &self.locations {
            if location.fish.is_empty() {
                bail!("location '{}' has an empty fish table", location.id);
            }
            for fish in &location.fish {
                if !ids.insert(fish.id) {
                    bail!("fish id '{}' is defined more than once (second time in '{}')", fish.id, location.id);
                }
            }
        }
        for part in &self.boat_parts {
            if part.options.is_empty() {
                bail!("boat part '{}' has no options", part.slot.as_str());
            }
        }
        Ok(())
    }

    pub fn starting_location(&self) -> &Location {
        &self.locations[0]
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn upgrade(&self, id: &str) -> Option<&UpgradeDef> {
        self.upgrades.iter().find(|u| u.id == id)
    }

    pub fn boat_part(&self, slot: BoatSlot) -> Option<&BoatPartDef> {
        self.boat_parts.iter().find(|p| p.slot == slot)
    }

    pub fn boat_option(&self, slot: BoatSlot, option_id: &str) -> Option<&BoatOption> {
        self.boat_part(slot)?.options.iter().find(|o| o.id == option_id)
    }

    pub fn all_fish(&self) -> impl Iterator<Item = (&Location, &FishDef)> {
        self.locations.iter().flat_map(|l| l.fish.iter().map(move |f| (l, f)))
    }

    /// Inventory is keyed by display name, so selling looks fish up by name.
    pub fn fish_by_name(&self, name: &str) -> Option<&FishDef> {
        self.all_fish().map(|(_, f)| f).find(|f| f.name == name)
    }

    pub fn fish_count(&self) -> usize {
        self.locations.iter().map(|l| l.fish.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = Catalog::default();
        catalog.validate().unwrap();
        assert_eq!(catalog.fish_count(), 44);
        assert_eq!(catalog.starting_location().id, "pond");
    }

    #[test]
    fn test_duplicate_fish_ids_are_rejected() {
        let mut catalog = Catalog::default();
        let dup = catalog.locations[0].fish[0].clone();
        catalog.locations[3].fish.push(dup);
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("common1"));
    }

    #[test]
    fn test_rarity_thresholds() {
        assert_eq!(Rarity::from_chance(0.002), Rarity::Mythic);
        assert_eq!(Rarity::from_chance(0.02), Rarity::Mythic);
        assert_eq!(Rarity::from_chance(0.03), Rarity::Legendary);
        assert_eq!(Rarity::from_chance(0.1), Rarity::Epic);
        assert_eq!(Rarity::from_chance(0.15), Rarity::Rare);
        assert_eq!(Rarity::from_chance(0.4), Rarity::Common);
    }

    #[test]
    fn test_upgrade_cost_curves() {
        let catalog = Catalog::default();
        let rod = catalog.upgrade("rod").unwrap();
        assert_eq!(rod.cost_at(1), 10);
        assert_eq!(rod.cost_at(3), 22);
        assert_eq!(rod.cost_at(4), 33);

        let auto = catalog.upgrade("auto").unwrap();
        assert_eq!(auto.cost_at(0), 200);
        assert_eq!(auto.cost_at(2), 800);

        let merchant = catalog.upgrade("merchant").unwrap();
        assert!(!merchant.is_maxed(0));
        assert!(merchant.is_maxed(1));
    }

    #[test]
    fn test_fish_lookup_by_name_spans_locations() {
        let catalog = Catalog::default();
        assert_eq!(catalog.fish_by_name("Moonfish").unwrap().value, 120);
        assert_eq!(catalog.fish_by_name("Bluegill").unwrap().id, "common2");
        assert!(catalog.fish_by_name("Boot").is_none());
    }

    #[test]
    fn test_boat_slot_names() {
        for slot in BoatSlot::ALL {
            assert_eq!(BoatSlot::from_str(slot.as_str()), Some(slot));
        }
        assert_eq!(BoatSlot::from_str("ENGINE"), Some(BoatSlot::Engine));
        assert_eq!(BoatSlot::from_str("sail"), None);
    }
}
