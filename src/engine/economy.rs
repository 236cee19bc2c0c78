use log::{debug, info};

use crate::engine::game_data::{BoatSlot, Catalog, UpgradeEffect};
use crate::engine::state::PlayerProgress;

pub const AUTO_SELL_FRACTION: f64 = 0.05;

/// `floor(value * count * (1 + multiplier))`
pub fn sale_price(value: u64, count: u64, sell_multiplier: f64) -> u64 {
    (value as f64 * count as f64 * (1.0 + sell_multiplier)).floor() as u64
}

/// Buys the next level of an upgrade. Unknown, maxed out or unaffordable
/// upgrades are refused without touching anything.
pub fn purchase_upgrade(progress: &mut PlayerProgress, catalog: &Catalog, id: &str) -> bool {
    let Some(def) = catalog.upgrade(id) else {
        debug!("Unknown upgrade '{}'", id);
        return false;
    };
    let Some(current) = progress.upgrade(id) else {
        return false;
    };
    let (level, cost) = (current.level, current.cost);

    if def.is_maxed(level) {
        debug!("{} is already at max level {}", def.name, level);
        return false;
    }
    if !progress.try_debit(cost) {
        return false;
    }

    let new_level = level + 1;
    match def.effect {
        UpgradeEffect::FishingPower(delta) => progress.add_fishing_power(delta),
        UpgradeEffect::AutoFishingRate(delta) => progress.add_auto_fishing_rate(delta),
        UpgradeEffect::EnableAutoSell | UpgradeEffect::Cosmetic => {}
    }
    progress.set_upgrade(id, new_level, def.cost_at(new_level));
    info!("Bought {} level {} for ${}", def.name, new_level, cost);
    true
}

pub fn unlock_location(progress: &mut PlayerProgress, catalog: &Catalog, id: &str) -> bool {
    let Some(location) = catalog.location(id) else {
        return false;
    };
    if progress.is_location_unlocked(id) {
        return false;
    }
    if !progress.try_debit(location.price) {
        return false;
    }
    progress.unlock_location(id);
    progress.set_active_location(id);
    info!("Unlocked {} for ${}", location.name, location.price);
    true
}

pub fn change_location(progress: &mut PlayerProgress, catalog: &Catalog, id: &str) -> bool {
    if catalog.location(id).is_none() || !progress.is_location_unlocked(id) {
        return false;
    }
    progress.set_active_location(id);
    true
}

/// Selects a boat option, buying it first if it is not owned yet. The auto-fish
/// bonus of the option being replaced is taken off before the new one applies.
pub fn upgrade_boat_part(progress: &mut PlayerProgress, catalog: &Catalog, slot: BoatSlot, option_id: &str) -> bool {
    let Some(option) = catalog.boat_option(slot, option_id) else {
        return false;
    };
    let Some(current_id) = progress.boat_current(slot).map(str::to_string) else {
        return false;
    };
    if current_id == option_id {
        return true;
    }

    if !progress.owns_boat_option(slot, option_id) {
        if !progress.try_debit(option.price) {
            return false;
        }
        progress.own_boat_option(slot, option_id);
        info!("Bought {} for ${}", option.name, option.price);
    }

    let previous_bonus = catalog
        .boat_option(slot, &current_id)
        .map_or(0.0, |o| o.bonuses.auto_fish);
    let delta = option.bonuses.auto_fish - previous_bonus;
    if delta != 0.0 {
        progress.add_auto_fishing_rate(delta);
    }
    progress.set_boat_current(slot, option_id);
    true
}

/// Sells a whole stack. Returns the money earned; 0 when nothing was sold.
pub fn sell_fish(progress: &mut PlayerProgress, catalog: &Catalog, name: &str, sell_multiplier: f64) -> u64 {
    let Some(fish) = catalog.fish_by_name(name) else {
        return 0;
    };
    let count = progress.held(name);
    if count == 0 {
        return 0;
    }
    progress.remove_fish(name, count);
    let earned = sale_price(fish.value, count, sell_multiplier);
    progress.credit(earned);
    earned
}

pub fn sell_all(progress: &mut PlayerProgress, catalog: &Catalog, sell_multiplier: f64) -> u64 {
    let names: Vec<String> = progress.inventory().keys().cloned().collect();
    let earned: u64 = names
        .iter()
        .map(|name| sell_fish(progress, catalog, name, sell_multiplier))
        .sum();
    if earned > 0 {
        info!("Sold everything for ${}", earned);
    }
    earned
}

/// One merchant run: a small slice of every stack, at least one fish each.
pub fn auto_sell(progress: &mut PlayerProgress, catalog: &Catalog, sell_multiplier: f64) -> u64 {
    let stacks: Vec<(String, u64)> = progress.inventory().iter().map(|(n, c)| (n.clone(), *c)).collect();
    let mut earned = 0;
    for (name, count) in stacks {
        let Some(fish) = catalog.fish_by_name(&name) else {
            continue;
        };
        let batch = ((count as f64 * AUTO_SELL_FRACTION).ceil() as u64).max(1).min(count);
        let sold = progress.remove_fish(&name, batch);
        earned += sale_price(fish.value, sold, sell_multiplier);
    }
    progress.credit(earned);
    if earned > 0 {
        debug!("Merchant sold fish for ${}", earned);
    }
    earned
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
    fn test_purchase_debits_and_recomputes_cost() {
        let (catalog, mut progress) = fresh();
        progress.credit(100);
        assert!(purchase_upgrade(&mut progress, &catalog, "rod"));
        assert_eq!(progress.money(), 90);
        assert_eq!(progress.upgrade_level("rod"), 2);
        assert_eq!(progress.upgrade("rod").unwrap().cost, 15);
        assert_eq!(progress.fishing_power(), 2.0);

        assert!(purchase_upgrade(&mut progress, &catalog, "rod"));
        assert_eq!(progress.upgrade("rod").unwrap().cost, 22);
    }

    #[test]
    fn test_refused_purchases_change_nothing() {
        let (catalog, mut progress) = fresh();
        progress.credit(5);
        assert!(!purchase_upgrade(&mut progress, &catalog, "rod"));
        assert!(!purchase_upgrade(&mut progress, &catalog, "harpoon"));
        assert_eq!(progress.money(), 5);
        assert_eq!(progress.upgrade_level("rod"), 1);

        progress.credit(10_000);
        assert!(purchase_upgrade(&mut progress, &catalog, "merchant"));
        let money = progress.money();
        assert!(!purchase_upgrade(&mut progress, &catalog, "merchant"));
        assert_eq!(progress.money(), money);
        assert!(progress.auto_sell_enabled(&catalog));
    }

    #[test]
    fn test_auto_upgrade_adds_rate() {
        let (catalog, mut progress) = fresh();
        progress.credit(1_000_000);
        for _ in 0..5 {
            assert!(purchase_upgrade(&mut progress, &catalog, "auto"));
        }
        assert_eq!(progress.auto_fishing_rate(), 1.0);
        assert_eq!(progress.upgrade("auto").unwrap().cost, 6400);
    }

    #[test]
    fn test_locations_must_be_unlocked_before_use() {
        let (catalog, mut progress) = fresh();
        assert!(!change_location(&mut progress, &catalog, "lake"));
        assert!(!unlock_location(&mut progress, &catalog, "lake"));

        progress.credit(1_500);
        assert!(unlock_location(&mut progress, &catalog, "lake"));
        assert_eq!(progress.money(), 500);
        assert_eq!(progress.active_location_id(), "lake");
        assert!(!unlock_location(&mut progress, &catalog, "lake"));

        assert!(change_location(&mut progress, &catalog, "pond"));
        assert_eq!(progress.active_location_id(), "pond");
        assert!(!change_location(&mut progress, &catalog, "atlantis"));
    }

    #[test]
    fn test_boat_engine_swap_never_double_applies() {
        let (catalog, mut progress) = fresh();
        progress.credit(10_000);

        assert!(upgrade_boat_part(&mut progress, &catalog, BoatSlot::Engine, "improved"));
        assert_eq!(progress.auto_fishing_rate(), 0.1);
        assert!(upgrade_boat_part(&mut progress, &catalog, BoatSlot::Engine, "advanced"));
        assert_eq!(progress.auto_fishing_rate(), 0.3);
        assert_eq!(progress.money(), 10_000 - 750 - 3_500);

        // Owned options are re-selected for free
        assert!(upgrade_boat_part(&mut progress, &catalog, BoatSlot::Engine, "improved"));
        assert_eq!(progress.auto_fishing_rate(), 0.1);
        assert!(upgrade_boat_part(&mut progress, &catalog, BoatSlot::Engine, "basic"));
        assert_eq!(progress.auto_fishing_rate(), 0.0);
        assert_eq!(progress.money(), 10_000 - 750 - 3_500);
    }

    #[test]
    fn test_unaffordable_boat_option_is_refused() {
        let (catalog, mut progress) = fresh();
        assert!(!upgrade_boat_part(&mut progress, &catalog, BoatSlot::Hull, "premium"));
        assert_eq!(progress.boat_current(BoatSlot::Hull), Some("basic"));
        assert!(!upgrade_boat_part(&mut progress, &catalog, BoatSlot::Hull, "golden"));
    }

    #[test]
    fn test_sell_uses_catalog_value_from_any_location() {
        let (catalog, mut progress) = fresh();
        progress.add_fish("Moonfish", 3);
        assert_eq!(sell_fish(&mut progress, &catalog, "Moonfish", 0.0), 360);
        assert_eq!(progress.money(), 360);
        assert!(progress.inventory().is_empty());
        assert_eq!(sell_fish(&mut progress, &catalog, "Moonfish", 0.0), 0);
    }

    #[test]
    fn test_sell_all_applies_multiplier() {
        let (catalog, mut progress) = fresh();
        progress.add_fish("Common Fish", 7);
        progress.add_fish("Bluegill", 1);
        // floor(7 * 1.1) + floor(2 * 1.1)
        assert_eq!(sell_all(&mut progress, &catalog, 0.1), 9);
        assert!(progress.inventory().is_empty());
    }

    #[test]
    fn test_auto_sell_takes_at_least_one_of_each() {
        let (catalog, mut progress) = fresh();
        progress.add_fish("Common Fish", 100);
        progress.add_fish("Bluegill", 3);
        progress.add_fish("Rare Fish", 1);

        let earned = auto_sell(&mut progress, &catalog, 0.0);
        assert_eq!(progress.held("Common Fish"), 95);
        assert_eq!(progress.held("Bluegill"), 2);
        assert_eq!(progress.held("Rare Fish"), 0);
        assert!(!progress.inventory().contains_key("Rare Fish"));
        assert_eq!(earned, 5 + 2 + 5);
    }
}
