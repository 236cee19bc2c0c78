use log::info;

use crate::config::{PrestigeBenefits, PrestigeConfig};
use crate::engine::game_data::Catalog;
use crate::engine::state::{round2, PlayerProgress, ProgressEvent};

/// Permanent bonuses earned by prestiging, derived from the level alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrestigeBonuses {
    pub fishing_power: f64,
    pub auto_fishing: f64,
    pub fish_value: f64,
    pub starting_money: u64,
}

impl PrestigeBonuses {
    pub fn for_level(level: u32, benefits: &PrestigeBenefits) -> Self {
        let l = level as f64;
        Self {
            fishing_power: round2(l * benefits.fishing_power_multiplier),
            auto_fishing: round2(l * benefits.auto_fishing_bonus),
            fish_value: round2(l * benefits.fish_value_multiplier),
            starting_money: (benefits.starting_money_base * benefits.starting_money_multiplier.powi(level as i32)).floor()
                as u64,
        }
    }
}

pub fn can_prestige(progress: &PlayerProgress, config: &PrestigeConfig) -> bool {
    let reqs = &config.requirements;
    progress.money() >= reqs.min_money
        && progress.total_fish_caught() >= reqs.min_fish_caught
        && progress.unlocked_location_count() >= reqs.min_locations_unlocked
        && progress.encyclopedia_completion() >= reqs.min_encyclopedia_completion
}

pub fn rank_title(level: u32, config: &PrestigeConfig) -> &str {
    config
        .ranks
        .iter()
        .filter(|rank| rank.level <= level)
        .max_by_key(|rank| rank.level)
        .or_else(|| config.ranks.first())
        .map_or("", |rank| rank.title.as_str())
}

pub fn perform_prestige(progress: &mut PlayerProgress, catalog: &Catalog, config: &PrestigeConfig) -> bool {
    if !can_prestige(progress, config) {
        return false;
    }
    let level = progress.prestige_level() + 1;
    progress.set_prestige_level(level);

    let bonuses = PrestigeBonuses::for_level(level, &config.benefits);
    progress.reset_run(catalog, bonuses.starting_money, 1.0 + bonuses.fishing_power, bonuses.auto_fishing);
    progress.note(ProgressEvent::Prestiged { level });
    info!("Prestiged to level {} ({})", level, rank_title(level, config));
    true
}

/// Wipes everything except the inbox, prestige included.
pub fn reset_progress(progress: &mut PlayerProgress, catalog: &Catalog) {
    progress.set_prestige_level(0);
    progress.reset_everything(catalog);
    progress.note(ProgressEvent::ProgressReset);
    info!("Progress reset");
}
